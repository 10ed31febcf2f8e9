use crate::error::DynError;
use crate::order::ElementComparator;
use crate::tag::TypeTag;
use crate::value::DynVar;
use std::cmp::Ordering;
use std::fmt::Write as _;

/// Backing buffer of a [`DynArray`], one contiguous vector per element type.
#[derive(Debug, Clone, PartialEq)]
enum Storage {
    Untyped,
    Char(Vec<i8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    LLong(Vec<i64>),
    UChar(Vec<u8>),
    UShort(Vec<u16>),
    UInt(Vec<u32>),
    ULong(Vec<u64>),
    ULLong(Vec<u64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    LDouble(Vec<f64>),
    Var(Vec<DynVar>),
    Ptr(Vec<usize>),
}

/// Runs `$body` against the scalar vector behind `$storage` with `$wrap` bound to the
/// matching `DynVar` constructor. `Var` storage and the untyped state get their own arms.
macro_rules! typed {
    ($storage:expr, |$vec:ident, $wrap:ident| $body:expr, var |$vars:ident| $var_body:expr, untyped => $untyped:expr $(,)?) => {
        match $storage {
            Storage::Char($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::Char;
                $body
            }
            Storage::Short($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::Short;
                $body
            }
            Storage::Int($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::Int;
                $body
            }
            Storage::Long($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::Long;
                $body
            }
            Storage::LLong($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::LLong;
                $body
            }
            Storage::UChar($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::UChar;
                $body
            }
            Storage::UShort($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::UShort;
                $body
            }
            Storage::UInt($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::UInt;
                $body
            }
            Storage::ULong($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::ULong;
                $body
            }
            Storage::ULLong($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::ULLong;
                $body
            }
            Storage::Float($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::Float;
                $body
            }
            Storage::Double($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::Double;
                $body
            }
            Storage::LDouble($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::LDouble;
                $body
            }
            Storage::Ptr($vec) => {
                #[allow(unused_variables)]
                let $wrap = DynVar::Ptr;
                $body
            }
            Storage::Var($vars) => $var_body,
            Storage::Untyped => $untyped,
        }
    };
}

/// Pairs a storage vector with a value of the same variant. `Var` storage accepts any value.
macro_rules! with_value {
    ($storage:expr, $value:expr, |$vec:ident, $x:ident| $body:expr, var |$vars:ident| $var_body:expr, mismatch => $mismatch:expr $(,)?) => {
        match ($storage, $value) {
            (Storage::Char($vec), DynVar::Char($x)) => $body,
            (Storage::Short($vec), DynVar::Short($x)) => $body,
            (Storage::Int($vec), DynVar::Int($x)) => $body,
            (Storage::Long($vec), DynVar::Long($x)) => $body,
            (Storage::LLong($vec), DynVar::LLong($x)) => $body,
            (Storage::UChar($vec), DynVar::UChar($x)) => $body,
            (Storage::UShort($vec), DynVar::UShort($x)) => $body,
            (Storage::UInt($vec), DynVar::UInt($x)) => $body,
            (Storage::ULong($vec), DynVar::ULong($x)) => $body,
            (Storage::ULLong($vec), DynVar::ULLong($x)) => $body,
            (Storage::Float($vec), DynVar::Float($x)) => $body,
            (Storage::Double($vec), DynVar::Double($x)) => $body,
            (Storage::LDouble($vec), DynVar::LDouble($x)) => $body,
            (Storage::Ptr($vec), DynVar::Ptr($x)) => $body,
            (Storage::Var($vars), _) => $var_body,
            _ => $mismatch,
        }
    };
}

/// Pairs two storages holding the same element type.
macro_rules! paired {
    ($dst:expr, $src:expr, |$d:ident, $s:ident| $body:expr, mismatch => $mismatch:expr $(,)?) => {
        match ($dst, $src) {
            (Storage::Char($d), Storage::Char($s)) => $body,
            (Storage::Short($d), Storage::Short($s)) => $body,
            (Storage::Int($d), Storage::Int($s)) => $body,
            (Storage::Long($d), Storage::Long($s)) => $body,
            (Storage::LLong($d), Storage::LLong($s)) => $body,
            (Storage::UChar($d), Storage::UChar($s)) => $body,
            (Storage::UShort($d), Storage::UShort($s)) => $body,
            (Storage::UInt($d), Storage::UInt($s)) => $body,
            (Storage::ULong($d), Storage::ULong($s)) => $body,
            (Storage::ULLong($d), Storage::ULLong($s)) => $body,
            (Storage::Float($d), Storage::Float($s)) => $body,
            (Storage::Double($d), Storage::Double($s)) => $body,
            (Storage::LDouble($d), Storage::LDouble($s)) => $body,
            (Storage::Var($d), Storage::Var($s)) => $body,
            (Storage::Ptr($d), Storage::Ptr($s)) => $body,
            _ => $mismatch,
        }
    };
}

impl Storage {
    fn with_tag(tag: TypeTag) -> Option<Storage> {
        Some(match tag {
            TypeTag::Char => Storage::Char(Vec::new()),
            TypeTag::Short => Storage::Short(Vec::new()),
            TypeTag::Int => Storage::Int(Vec::new()),
            TypeTag::Long => Storage::Long(Vec::new()),
            TypeTag::LLong => Storage::LLong(Vec::new()),
            TypeTag::UChar => Storage::UChar(Vec::new()),
            TypeTag::UShort => Storage::UShort(Vec::new()),
            TypeTag::UInt => Storage::UInt(Vec::new()),
            TypeTag::ULong => Storage::ULong(Vec::new()),
            TypeTag::ULLong => Storage::ULLong(Vec::new()),
            TypeTag::Float => Storage::Float(Vec::new()),
            TypeTag::Double => Storage::Double(Vec::new()),
            TypeTag::LDouble => Storage::LDouble(Vec::new()),
            TypeTag::Var => Storage::Var(Vec::new()),
            TypeTag::Ptr => Storage::Ptr(Vec::new()),
            TypeTag::String | TypeTag::Custom => return None,
        })
    }

    fn tag(&self) -> Option<TypeTag> {
        Some(match self {
            Storage::Untyped => return None,
            Storage::Char(_) => TypeTag::Char,
            Storage::Short(_) => TypeTag::Short,
            Storage::Int(_) => TypeTag::Int,
            Storage::Long(_) => TypeTag::Long,
            Storage::LLong(_) => TypeTag::LLong,
            Storage::UChar(_) => TypeTag::UChar,
            Storage::UShort(_) => TypeTag::UShort,
            Storage::UInt(_) => TypeTag::UInt,
            Storage::ULong(_) => TypeTag::ULong,
            Storage::ULLong(_) => TypeTag::ULLong,
            Storage::Float(_) => TypeTag::Float,
            Storage::Double(_) => TypeTag::Double,
            Storage::LDouble(_) => TypeTag::LDouble,
            Storage::Var(_) => TypeTag::Var,
            Storage::Ptr(_) => TypeTag::Ptr,
        })
    }

    fn len(&self) -> usize {
        typed!(self, |v, _wrap| v.len(), var |v| v.len(), untyped => 0)
    }

    /// Appends a copy of `value`. Nested variants are deep-copied into the slot.
    fn push_value(&mut self, value: &DynVar) -> Result<(), DynError> {
        let expected = self.tag();
        with_value!(
            self,
            value,
            |v, x| v.push(*x),
            var |v| v.push(value.clone()),
            mismatch => {
                return Err(DynError::TypeMismatch {
                    expected,
                    found: value.tag(),
                })
            },
        );
        Ok(())
    }
}

/// Borrowed, typed view of a [`DynArray`]'s elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArraySlice<'a> {
    /// The array has no element type
    Untyped,
    Char(&'a [i8]),
    Short(&'a [i16]),
    Int(&'a [i32]),
    Long(&'a [i64]),
    LLong(&'a [i64]),
    UChar(&'a [u8]),
    UShort(&'a [u16]),
    UInt(&'a [u32]),
    ULong(&'a [u64]),
    ULLong(&'a [u64]),
    Float(&'a [f32]),
    Double(&'a [f64]),
    LDouble(&'a [f64]),
    Var(&'a [DynVar]),
    Ptr(&'a [usize]),
}

/// A contiguous, homogeneously-typed, growable array.
///
/// Every element shares one [`TypeTag`] fixed at creation. An array of
/// [`TypeTag::Var`] holds independently-typed [`DynVar`]s, each owned by its slot:
/// values are deep-copied in, and dropped when removed or when the array is cleared.
///
/// The array tracks its own capacity. [`add`](DynArray::add) doubles it when full,
/// while the insert family grows it to exactly the size needed.
///
/// # Examples
///
/// ```
/// use sovran_dyn::{DynArray, DynError, DynVar, TypeTag};
///
/// fn main() -> Result<(), DynError> {
///     let mut numbers = DynArray::new(5, TypeTag::Int)?;
///     for n in (0..=5).rev() {
///         numbers.add(&DynVar::Int(n))?;
///     }
///     assert_eq!(numbers.capacity(), 10);
///
///     numbers.sort_ascending();
///     assert_eq!(numbers.render(", ")?, "0, 1, 2, 3, 4, 5, ");
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct DynArray {
    storage: Storage,
    capacity: usize,
}

impl Default for Storage {
    fn default() -> Self {
        Storage::Untyped
    }
}

impl DynArray {
    /// Capacity used when an array is created with a capacity of zero.
    pub const DEFAULT_CAPACITY: usize = 10;

    /// Creates an array able to hold `initial_capacity` elements of type `tag`.
    /// A capacity of zero means [`DEFAULT_CAPACITY`](Self::DEFAULT_CAPACITY).
    ///
    /// # Errors
    ///
    /// - Returns `DynError::UnsupportedType` for `String` and `Custom`, which have no
    ///   fixed element width
    /// - Returns `DynError::AllocationFailure` if the buffer cannot be allocated
    pub fn new(initial_capacity: usize, tag: TypeTag) -> Result<Self, DynError> {
        let capacity = if initial_capacity == 0 {
            Self::DEFAULT_CAPACITY
        } else {
            initial_capacity
        };
        let storage = Storage::with_tag(tag)
            .ok_or_else(|| DynError::unsupported(Some(tag)).logged("DynArray::new"))?;

        let mut array = DynArray {
            storage,
            capacity: 0,
        };
        array.grow_to(capacity, "DynArray::new")?;
        Ok(array)
    }

    /// Element type, `None` once the array has been cleared.
    pub fn tag(&self) -> Option<TypeTag> {
        self.storage.tag()
    }

    /// False once the array has been cleared.
    pub fn is_typed(&self) -> bool {
        self.tag().is_some()
    }

    /// Number of stored elements.
    pub fn count(&self) -> usize {
        self.storage.len()
    }

    /// True when no elements are stored, whatever the capacity.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Number of elements the array can hold before it has to grow.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Width of one slot in bytes, 0 for an untyped array.
    pub fn element_size(&self) -> usize {
        self.tag().and_then(TypeTag::element_size).unwrap_or(0)
    }

    /// Bytes reserved for slots: capacity times element size.
    pub fn byte_size(&self) -> usize {
        self.capacity * self.element_size()
    }

    /// Appends a copy of `element`, doubling the capacity first if the array is full.
    /// Returns the new element count.
    ///
    /// # Errors
    ///
    /// - Returns `DynError::UnsupportedType` if the array is untyped
    /// - Returns `DynError::TypeMismatch` if `element` does not have the array's type
    /// - Returns `DynError::AllocationFailure` if growing fails; the array is unchanged
    pub fn add(&mut self, element: &DynVar) -> Result<usize, DynError> {
        self.check_element(element, "DynArray::add")?;

        let count = self.count();
        if count + 1 > self.capacity {
            let doubled = self
                .capacity
                .checked_mul(2)
                .ok_or_else(|| DynError::overflow().logged("DynArray::add"))?
                .max(1);
            self.grow_to(doubled, "DynArray::add")?;
        }

        self.storage
            .push_value(element)
            .map_err(|e| e.logged("DynArray::add"))?;
        Ok(count + 1)
    }

    /// Inserts copies of every element of `source` before position `index`.
    ///
    /// `index` is clamped to the element count, so an index past the end appends.
    /// Returns the index just past the inserted block.
    ///
    /// # Errors
    ///
    /// - Returns `DynError::TypeMismatch` if the arrays store different types
    /// - Returns `DynError::AllocationFailure` if growing fails; the array is unchanged
    pub fn insert(&mut self, index: usize, source: &DynArray) -> Result<usize, DynError> {
        if source.tag() != self.tag() || !self.is_typed() {
            return Err(DynError::TypeMismatch {
                expected: self.tag(),
                found: source.tag(),
            }
            .logged("DynArray::insert"));
        }
        self.splice_storage(index, &source.storage, "DynArray::insert")
    }

    /// Inserts a copy of one element before position `index`. See [`insert`](Self::insert).
    pub fn insert_element(&mut self, index: usize, element: &DynVar) -> Result<usize, DynError> {
        self.insert_values(index, std::slice::from_ref(element))
    }

    /// Inserts copies of a buffer of values before position `index`.
    /// Every value must match the array's element type. See [`insert`](Self::insert).
    pub fn insert_values(&mut self, index: usize, values: &[DynVar]) -> Result<usize, DynError> {
        let tag = self
            .tag()
            .ok_or_else(|| DynError::unsupported(None).logged("DynArray::insert_values"))?;
        let mut staged = Storage::with_tag(tag)
            .ok_or_else(|| DynError::unsupported(Some(tag)).logged("DynArray::insert_values"))?;
        for value in values {
            staged
                .push_value(value)
                .map_err(|e| e.logged("DynArray::insert_values"))?;
        }
        self.splice_storage(index, &staged, "DynArray::insert_values")
    }

    /// Appends copies of every element of `source`, growing the same way
    /// [`add`](Self::add) does. Returns the number of appended elements.
    ///
    /// # Errors
    ///
    /// - Returns `DynError::TypeMismatch` if the arrays store different types
    /// - Returns `DynError::AllocationFailure` if growing fails part way; elements
    ///   appended before the failure stay
    pub fn join(&mut self, source: &DynArray) -> Result<usize, DynError> {
        if source.tag() != self.tag() {
            return Err(DynError::TypeMismatch {
                expected: self.tag(),
                found: source.tag(),
            }
            .logged("DynArray::join"));
        }
        let mut appended = 0;
        for element in source.iter() {
            self.add(&element)?;
            appended += 1;
        }
        Ok(appended)
    }

    /// Copy of the element at `index`.
    pub fn get(&self, index: usize) -> Option<DynVar> {
        let element = self.element(index);
        if element.is_none() {
            tracing::debug!(index, count = self.count(), "array index out of range");
        }
        element
    }

    /// Overwrites the element at `index` with a copy of `element`.
    ///
    /// # Errors
    ///
    /// - Returns `DynError::IndexOutOfRange` if `index` is not below the count
    /// - Returns `DynError::TypeMismatch` if `element` does not have the array's type
    pub fn set(&mut self, index: usize, element: &DynVar) -> Result<(), DynError> {
        self.check_index(index, "DynArray::set")?;
        let expected = self.tag();
        with_value!(
            &mut self.storage,
            element,
            |v, x| v[index] = *x,
            var |v| v[index] = element.clone(),
            mismatch => {
                return Err(DynError::TypeMismatch {
                    expected,
                    found: element.tag(),
                }
                .logged("DynArray::set"))
            },
        );
        Ok(())
    }

    /// Removes the element at `index`, shifting everything after it one slot left.
    /// Returns how many elements were shifted.
    ///
    /// # Errors
    ///
    /// Returns `DynError::IndexOutOfRange` if `index` is not below the count.
    pub fn remove(&mut self, index: usize) -> Result<usize, DynError> {
        self.check_index(index, "DynArray::remove")?;
        let shifted = self.count() - index - 1;
        typed!(
            &mut self.storage,
            |v, _wrap| {
                v.remove(index);
            },
            var |v| {
                v.remove(index);
            },
            untyped => (),
        );
        Ok(shifted)
    }

    /// Removes every element for which `predicate` returns true and returns how many
    /// were removed. Relative order of the kept elements is preserved.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&DynVar) -> bool,
    {
        let before = self.count();
        typed!(
            &mut self.storage,
            |v, wrap| v.retain(|x| !predicate(&wrap(*x))),
            var |v| v.retain(|x| !predicate(x)),
            untyped => (),
        );
        before - self.count()
    }

    /// Copies the inclusive range `min..=max` into a new array of the same type.
    ///
    /// Reversed bounds are swapped and `max` is clamped to the last index. A range
    /// starting past the end yields an empty array.
    ///
    /// # Errors
    ///
    /// Returns `DynError::UnsupportedType` if the array is untyped, or
    /// `DynError::AllocationFailure` if the new array cannot be allocated.
    pub fn get_subrange(&self, min: usize, max: usize) -> Result<DynArray, DynError> {
        let tag = self
            .tag()
            .ok_or_else(|| DynError::unsupported(None).logged("DynArray::get_subrange"))?;
        let (min, max) = if min > max { (max, min) } else { (min, max) };

        let count = self.count();
        if count == 0 || min >= count {
            return DynArray::new(0, tag);
        }
        let max = max.min(count - 1);

        let mut sub = DynArray::new(max - min + 1, tag)?;
        paired!(
            &mut sub.storage,
            &self.storage,
            |dst, src| dst.extend(src[min..=max].iter().cloned()),
            mismatch => {
                return Err(DynError::TypeMismatch {
                    expected: Some(tag),
                    found: self.tag(),
                }
                .logged("DynArray::get_subrange"))
            },
        );
        Ok(sub)
    }

    /// Copies every element for which `predicate` returns true into a new array of the
    /// same type, trimmed to its element count.
    ///
    /// # Errors
    ///
    /// Returns `DynError::UnsupportedType` if the array is untyped, or
    /// `DynError::AllocationFailure` if the new array cannot grow.
    pub fn get_subrange_where<F>(&self, mut predicate: F) -> Result<DynArray, DynError>
    where
        F: FnMut(&DynVar) -> bool,
    {
        let tag = self
            .tag()
            .ok_or_else(|| DynError::unsupported(None).logged("DynArray::get_subrange_where"))?;
        let mut sub = DynArray::new(Self::DEFAULT_CAPACITY, tag)?;
        for element in self.iter() {
            if predicate(&element) {
                sub.add(&element)?;
            }
        }
        sub.trim();
        Ok(sub)
    }

    /// Sorts in ascending order using the comparator for this array's element type.
    pub fn sort_ascending(&mut self) {
        if let Some(tag) = self.sort_tag("DynArray::sort_ascending") {
            let order = ElementComparator::ascending(tag);
            self.sort_by(|a, b| order.compare(a, b));
        }
    }

    /// Sorts in descending order using the comparator for this array's element type.
    pub fn sort_descending(&mut self) {
        if let Some(tag) = self.sort_tag("DynArray::sort_descending") {
            let order = ElementComparator::descending(tag);
            self.sort_by(|a, b| order.compare(a, b));
        }
    }

    /// Sorts with a caller-supplied comparator. The sort is stable.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&DynVar, &DynVar) -> Ordering,
    {
        typed!(
            &mut self.storage,
            |v, wrap| v.sort_by(|a, b| compare(&wrap(*a), &wrap(*b))),
            var |v| v.sort_by(|a, b| compare(a, b)),
            untyped => (),
        );
    }

    /// Releases unused capacity so it equals the element count.
    /// Returns the number of slots released, 0 if there were none.
    pub fn trim(&mut self) -> usize {
        let count = self.count();
        if self.capacity <= count {
            return 0;
        }
        typed!(
            &mut self.storage,
            |v, _wrap| v.shrink_to_fit(),
            var |v| v.shrink_to_fit(),
            untyped => (),
        );
        let freed = self.capacity - count;
        self.capacity = count;
        freed
    }

    /// Grows the capacity by exactly `extra_slots`. Does nothing for zero or for an
    /// untyped array.
    ///
    /// # Errors
    ///
    /// Returns `DynError::AllocationFailure` if growing fails; the array is unchanged.
    pub fn expand(&mut self, extra_slots: usize) -> Result<(), DynError> {
        if extra_slots == 0 || !self.is_typed() {
            return Ok(());
        }
        let capacity = self
            .capacity
            .checked_add(extra_slots)
            .ok_or_else(|| DynError::overflow().logged("DynArray::expand"))?;
        self.grow_to(capacity, "DynArray::expand")
    }

    /// Position of the first element equal to `element`.
    ///
    /// Scalar arrays compare the raw bytes of one element. `Var` arrays use
    /// [`DynVar::compare`]. A value of another type is never found.
    pub fn index_of(&self, element: &DynVar) -> Option<usize> {
        let expected = self.tag();
        with_value!(
            &self.storage,
            element,
            |v, x| v.iter().position(|e| e.to_ne_bytes() == x.to_ne_bytes()),
            var |v| v.iter().position(|e| e.compare(element) == Ordering::Equal),
            mismatch => {
                tracing::debug!(
                    expected = ?expected,
                    found = ?element.tag(),
                    "searched array for a value of another type"
                );
                None
            },
        )
    }

    /// Typed, borrowed view of the elements.
    pub fn as_slice(&self) -> ArraySlice<'_> {
        match &self.storage {
            Storage::Untyped => ArraySlice::Untyped,
            Storage::Char(v) => ArraySlice::Char(v),
            Storage::Short(v) => ArraySlice::Short(v),
            Storage::Int(v) => ArraySlice::Int(v),
            Storage::Long(v) => ArraySlice::Long(v),
            Storage::LLong(v) => ArraySlice::LLong(v),
            Storage::UChar(v) => ArraySlice::UChar(v),
            Storage::UShort(v) => ArraySlice::UShort(v),
            Storage::UInt(v) => ArraySlice::UInt(v),
            Storage::ULong(v) => ArraySlice::ULong(v),
            Storage::ULLong(v) => ArraySlice::ULLong(v),
            Storage::Float(v) => ArraySlice::Float(v),
            Storage::Double(v) => ArraySlice::Double(v),
            Storage::LDouble(v) => ArraySlice::LDouble(v),
            Storage::Var(v) => ArraySlice::Var(v),
            Storage::Ptr(v) => ArraySlice::Ptr(v),
        }
    }

    /// Copies of the elements in order.
    pub fn iter(&self) -> impl Iterator<Item = DynVar> + '_ {
        (0..self.count()).filter_map(move |index| self.element(index))
    }

    /// Renders every element followed by `separator`.
    ///
    /// Elements of a `Var` array that have no text form are skipped with a diagnostic.
    ///
    /// # Errors
    ///
    /// Returns `DynError::UnsupportedType` for untyped and `Ptr` arrays.
    pub fn render(&self, separator: &str) -> Result<String, DynError> {
        match self.tag() {
            None | Some(TypeTag::Ptr) => {
                return Err(DynError::unsupported(self.tag()).logged("DynArray::render"))
            }
            _ => {}
        }
        let mut out = String::new();
        for element in self.iter() {
            match element.render_payload() {
                Some(text) => {
                    out.push_str(&text);
                    out.push_str(separator);
                }
                None => {
                    DynError::unsupported(element.tag()).report("DynArray::render");
                }
            }
        }
        Ok(out)
    }

    /// Renders the elements followed by the count, capacity and reserved byte size.
    pub fn render_all(&self, separator: &str) -> String {
        let elements = self.render(separator).unwrap_or_default();
        let mut out = format!("Elements: {}\n", elements);
        let _ = writeln!(out, "Count: {}", self.count());
        let _ = writeln!(out, "Capacity: {}", self.capacity);
        let _ = writeln!(out, "Array Size: {} bytes", self.byte_size());
        out
    }

    /// Drops every element (nested variants included) and the buffer, leaving an
    /// untyped array with no capacity. Clearing twice is harmless.
    pub fn clear(&mut self) {
        self.storage = Storage::Untyped;
        self.capacity = 0;
    }

    fn element(&self, index: usize) -> Option<DynVar> {
        typed!(
            &self.storage,
            |v, wrap| v.get(index).map(|x| wrap(*x)),
            var |v| v.get(index).cloned(),
            untyped => None,
        )
    }

    fn check_index(&self, index: usize, operation: &'static str) -> Result<(), DynError> {
        let len = self.count();
        if index >= len {
            return Err(DynError::IndexOutOfRange { index, len }.logged(operation));
        }
        Ok(())
    }

    fn check_element(&self, element: &DynVar, operation: &'static str) -> Result<(), DynError> {
        match self.tag() {
            None => Err(DynError::unsupported(None).logged(operation)),
            Some(TypeTag::Var) => Ok(()),
            Some(tag) if element.tag() == Some(tag) => Ok(()),
            expected => Err(DynError::TypeMismatch {
                expected,
                found: element.tag(),
            }
            .logged(operation)),
        }
    }

    fn sort_tag(&self, operation: &'static str) -> Option<TypeTag> {
        let tag = self.tag();
        if tag.is_none() {
            DynError::unsupported(None).report(operation);
        }
        tag
    }

    /// Makes room for `capacity` elements. Never shrinks.
    fn grow_to(&mut self, capacity: usize, operation: &'static str) -> Result<(), DynError> {
        let additional = capacity.saturating_sub(self.count());
        let reserved = typed!(
            &mut self.storage,
            |v, _wrap| v.try_reserve_exact(additional),
            var |v| v.try_reserve_exact(additional),
            untyped => Ok(()),
        );
        reserved.map_err(|e| DynError::allocation(capacity, e).logged(operation))?;

        if capacity > self.capacity {
            tracing::trace!(from = self.capacity, to = capacity, "array capacity grown");
            self.capacity = capacity;
        }
        Ok(())
    }

    /// Block-inserts a copy of `source` at the clamped `index`, growing to the exact size
    /// needed first.
    fn splice_storage(
        &mut self,
        index: usize,
        source: &Storage,
        operation: &'static str,
    ) -> Result<usize, DynError> {
        let count = self.count();
        let index = index.min(count);
        let inserted = source.len();

        let needed = count
            .checked_add(inserted)
            .ok_or_else(|| DynError::overflow().logged(operation))?;
        if needed > self.capacity {
            self.grow_to(needed, operation)?;
        }

        let expected = self.tag();
        paired!(
            &mut self.storage,
            source,
            |dst, src| {
                dst.splice(index..index, src.iter().cloned());
            },
            mismatch => {
                return Err(DynError::TypeMismatch {
                    expected,
                    found: source.tag(),
                }
                .logged(operation))
            },
        );
        Ok(index + inserted)
    }
}

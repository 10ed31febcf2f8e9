use crate::tag::TypeTag;
use crate::value::DynVar;
use std::cmp::Ordering;

/// Orders elements of one array element type.
///
/// The comparator carries the element tag it was built for, so the comparison routine
/// knows which ordering applies without any shared state: numeric tags compare by
/// value at their own width, `Var` elements use [`DynVar::compare`].
///
/// ```
/// use sovran_dyn::{DynVar, ElementComparator, TypeTag};
/// use std::cmp::Ordering;
///
/// let by_value = ElementComparator::ascending(TypeTag::Int);
/// assert_eq!(by_value.compare(&DynVar::Int(-1), &DynVar::Int(2)), Ordering::Less);
///
/// let reversed = ElementComparator::descending(TypeTag::Int);
/// assert_eq!(reversed.compare(&DynVar::Int(-1), &DynVar::Int(2)), Ordering::Greater);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementComparator {
    tag: TypeTag,
    descending: bool,
}

impl ElementComparator {
    /// Smallest first.
    pub fn ascending(tag: TypeTag) -> Self {
        Self {
            tag,
            descending: false,
        }
    }

    /// Largest first.
    pub fn descending(tag: TypeTag) -> Self {
        Self {
            tag,
            descending: true,
        }
    }

    /// The element type this comparator orders.
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Whether the natural ordering is reversed.
    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// Orders two elements, reversed for a descending comparator.
    ///
    /// Scalars of matching type compare by value, floats by their total order. A pair
    /// of differing types falls back to [`DynVar::compare`].
    pub fn compare(&self, first: &DynVar, second: &DynVar) -> Ordering {
        let ordering = match self.tag {
            TypeTag::Var => first.compare(second),
            _ => scalar_order(first, second),
        };
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

// Anything that is not a matching pair of scalars falls back to the variant ordering.
fn scalar_order(first: &DynVar, second: &DynVar) -> Ordering {
    match (first, second) {
        (DynVar::Char(a), DynVar::Char(b)) => a.cmp(b),
        (DynVar::Short(a), DynVar::Short(b)) => a.cmp(b),
        (DynVar::Int(a), DynVar::Int(b)) => a.cmp(b),
        (DynVar::Long(a), DynVar::Long(b)) => a.cmp(b),
        (DynVar::LLong(a), DynVar::LLong(b)) => a.cmp(b),
        (DynVar::UChar(a), DynVar::UChar(b)) => a.cmp(b),
        (DynVar::UShort(a), DynVar::UShort(b)) => a.cmp(b),
        (DynVar::UInt(a), DynVar::UInt(b)) => a.cmp(b),
        (DynVar::ULong(a), DynVar::ULong(b)) => a.cmp(b),
        (DynVar::ULLong(a), DynVar::ULLong(b)) => a.cmp(b),
        (DynVar::Float(a), DynVar::Float(b)) => a.total_cmp(b),
        (DynVar::Double(a), DynVar::Double(b)) => a.total_cmp(b),
        (DynVar::LDouble(a), DynVar::LDouble(b)) => a.total_cmp(b),
        (DynVar::Ptr(a), DynVar::Ptr(b)) => a.cmp(b),
        _ => first.compare(second),
    }
}

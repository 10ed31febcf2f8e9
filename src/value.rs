use crate::error::DynError;
use crate::format::{self, DOUBLE_DIGITS, FLOAT_DIGITS};
use crate::tag::TypeTag;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::mem::size_of;

/// A single runtime-typed value that owns its payload.
///
/// `DynVar` is either [`Empty`](DynVar::Empty) (no tag, no payload, length 0) or
/// carries exactly one payload whose variant is its [`TypeTag`]. There are no partial
/// states: assigning a new payload drops the old one first, and cloning always
/// produces an independent deep copy.
///
/// Equality through `PartialEq` is structural. The byte-oriented ordering used by
/// arrays for sorting and searching is [`DynVar::compare`].
///
/// # Examples
///
/// ```
/// use sovran_dyn::{DynVar, TypeTag};
///
/// let mut var = DynVar::new();
/// assert!(var.is_empty());
///
/// var.assign_int(99);
/// assert_eq!(var.tag(), Some(TypeTag::Int));
/// assert_eq!(var.byte_len(), 4);
///
/// var.assign_string("I'm a var!").unwrap();
/// assert_eq!(var.render(", ").unwrap(), "I'm a var!, ");
///
/// var.clear();
/// assert_eq!(var.byte_len(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DynVar {
    /// The cleared state, raw tag 0
    #[default]
    Empty,
    Char(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    LLong(i64),
    UChar(u8),
    UShort(u16),
    UInt(u32),
    ULong(u64),
    ULLong(u64),
    Float(f32),
    Double(f64),
    LDouble(f64),
    String(String),
    Custom(Box<[u8]>),
    Var(Box<DynVar>),
    Ptr(usize),
}

macro_rules! assign_fixed {
    ($($(#[$doc:meta])* $name:ident => $variant:ident($ty:ty);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, data: $ty) {
                *self = DynVar::$variant(data);
            }
        )*
    };
}

impl DynVar {
    /// Creates an empty value.
    pub fn new() -> Self {
        DynVar::Empty
    }

    /// Wraps a deep copy of `inner` as a nested variant.
    pub fn nested(inner: &DynVar) -> Self {
        DynVar::Var(Box::new(inner.clone()))
    }

    /// Wraps an opaque address.
    pub fn ptr(address: usize) -> Self {
        DynVar::Ptr(address)
    }

    /// The tag of the stored payload, `None` when empty.
    pub fn tag(&self) -> Option<TypeTag> {
        Some(match self {
            DynVar::Empty => return None,
            DynVar::Char(_) => TypeTag::Char,
            DynVar::Short(_) => TypeTag::Short,
            DynVar::Int(_) => TypeTag::Int,
            DynVar::Long(_) => TypeTag::Long,
            DynVar::LLong(_) => TypeTag::LLong,
            DynVar::UChar(_) => TypeTag::UChar,
            DynVar::UShort(_) => TypeTag::UShort,
            DynVar::UInt(_) => TypeTag::UInt,
            DynVar::ULong(_) => TypeTag::ULong,
            DynVar::ULLong(_) => TypeTag::ULLong,
            DynVar::Float(_) => TypeTag::Float,
            DynVar::Double(_) => TypeTag::Double,
            DynVar::LDouble(_) => TypeTag::LDouble,
            DynVar::String(_) => TypeTag::String,
            DynVar::Custom(_) => TypeTag::Custom,
            DynVar::Var(_) => TypeTag::Var,
            DynVar::Ptr(_) => TypeTag::Ptr,
        })
    }

    /// The raw tag value, 0 when empty.
    pub fn raw_tag(&self) -> u16 {
        self.tag().map_or(0, TypeTag::raw)
    }

    /// True in the cleared state, which has no tag and no payload.
    pub fn is_empty(&self) -> bool {
        matches!(self, DynVar::Empty)
    }

    /// Length in bytes of the owned payload.
    ///
    /// Strings count their NUL terminator, so a value is zero-length exactly when it
    /// is empty. A nested variant reports the width of its own slot.
    pub fn byte_len(&self) -> usize {
        match self {
            DynVar::Empty => 0,
            DynVar::String(text) => text.len() + 1,
            DynVar::Custom(bytes) => bytes.len(),
            other => other.tag().and_then(TypeTag::size).unwrap_or(0),
        }
    }

    /// The payload as native-endian bytes.
    ///
    /// Strings include their NUL terminator. A nested variant exposes the bytes of
    /// its inner payload.
    pub fn payload_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            DynVar::Empty => Cow::Borrowed(&[]),
            DynVar::Char(v) => Cow::Owned(v.to_ne_bytes().to_vec()),
            DynVar::Short(v) => Cow::Owned(v.to_ne_bytes().to_vec()),
            DynVar::Int(v) => Cow::Owned(v.to_ne_bytes().to_vec()),
            DynVar::Long(v) | DynVar::LLong(v) => Cow::Owned(v.to_ne_bytes().to_vec()),
            DynVar::UChar(v) => Cow::Owned(v.to_ne_bytes().to_vec()),
            DynVar::UShort(v) => Cow::Owned(v.to_ne_bytes().to_vec()),
            DynVar::UInt(v) => Cow::Owned(v.to_ne_bytes().to_vec()),
            DynVar::ULong(v) | DynVar::ULLong(v) => Cow::Owned(v.to_ne_bytes().to_vec()),
            DynVar::Float(v) => Cow::Owned(v.to_ne_bytes().to_vec()),
            DynVar::Double(v) | DynVar::LDouble(v) => Cow::Owned(v.to_ne_bytes().to_vec()),
            DynVar::String(text) => {
                let mut bytes = Vec::with_capacity(text.len() + 1);
                bytes.extend_from_slice(text.as_bytes());
                bytes.push(0);
                Cow::Owned(bytes)
            }
            DynVar::Custom(bytes) => Cow::Borrowed(bytes),
            DynVar::Var(inner) => inner.payload_bytes(),
            DynVar::Ptr(v) => Cow::Owned(v.to_ne_bytes().to_vec()),
        }
    }

    /// The text of a `String` payload, without its terminator.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynVar::String(text) => Some(text),
            _ => None,
        }
    }

    /// The inner value of a nested variant.
    pub fn inner(&self) -> Option<&DynVar> {
        match self {
            DynVar::Var(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns an independent deep copy.
    ///
    /// The copy owns its own payload; clearing either value never affects the other.
    #[must_use = "the copy owns its payload and is dropped immediately if unused"]
    pub fn copy(&self) -> DynVar {
        self.clone()
    }

    /// Drops the payload and returns to the empty state. Clearing an empty value is a no-op.
    pub fn clear(&mut self) {
        *self = DynVar::Empty;
    }

    /// Replaces the payload with `value`, dropping whatever was stored before.
    pub fn assign(&mut self, value: impl Into<DynVar>) {
        *self = value.into();
    }

    assign_fixed! {
        /// Assigns a signed 8-bit character.
        assign_char => Char(i8);
        assign_short => Short(i16);
        assign_int => Int(i32);
        assign_long => Long(i64);
        assign_llong => LLong(i64);
        /// Assigns an unsigned 8-bit character.
        assign_uchar => UChar(u8);
        assign_ushort => UShort(u16);
        assign_uint => UInt(u32);
        assign_ulong => ULong(u64);
        assign_ullong => ULLong(u64);
        assign_float => Float(f32);
        assign_double => Double(f64);
        /// Assigns an extended float. The payload is held at 64-bit precision.
        assign_ldouble => LDouble(f64);
        assign_ptr => Ptr(usize);
    }

    /// Assigns a copy of `text`.
    ///
    /// # Errors
    ///
    /// Returns `DynError::AllocationFailure` if the copy cannot be allocated. The value
    /// is left empty in that case.
    pub fn assign_string(&mut self, text: &str) -> Result<(), DynError> {
        self.clear();
        let mut owned = String::new();
        owned
            .try_reserve_exact(text.len())
            .map_err(|e| DynError::allocation(text.len() + 1, e).logged("DynVar::assign_string"))?;
        owned.push_str(text);
        *self = DynVar::String(owned);
        Ok(())
    }

    /// Assigns a copy of an opaque blob. The blob's length is the slice's length.
    ///
    /// An empty blob has nothing to own, so the value is left empty.
    ///
    /// # Errors
    ///
    /// Returns `DynError::AllocationFailure` if the copy cannot be allocated. The value
    /// is left empty in that case.
    pub fn assign_custom(&mut self, bytes: &[u8]) -> Result<(), DynError> {
        self.clear();
        if bytes.is_empty() {
            tracing::warn!("ignoring zero-length custom payload");
            return Ok(());
        }
        let mut owned = Vec::new();
        owned
            .try_reserve_exact(bytes.len())
            .map_err(|e| DynError::allocation(bytes.len(), e).logged("DynVar::assign_custom"))?;
        owned.extend_from_slice(bytes);
        *self = DynVar::Custom(owned.into_boxed_slice());
        Ok(())
    }

    /// Assigns a deep copy of another value as a nested variant.
    pub fn assign_var(&mut self, inner: &DynVar) {
        *self = DynVar::nested(inner);
    }

    /// Assigns a payload given as raw native-endian bytes of `tag`'s width.
    ///
    /// Fixed-width tags read the first `tag.size()` bytes. `String` reads UTF-8 up to
    /// the first NUL (or the whole slice). `Custom` copies the whole slice. `Var` has
    /// no byte representation and is rejected.
    ///
    /// # Errors
    ///
    /// - Returns `DynError::InvalidPayload` if the slice is too short or not UTF-8
    /// - Returns `DynError::UnsupportedType` for `Var`
    /// - Returns `DynError::AllocationFailure` if a string or blob cannot be copied
    ///
    /// The value is left empty on any error.
    pub fn assign_raw(&mut self, bytes: &[u8], tag: TypeTag) -> Result<(), DynError> {
        self.clear();
        *self = match tag {
            TypeTag::Char => DynVar::Char(i8::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::Short => DynVar::Short(i16::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::Int => DynVar::Int(i32::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::Long => DynVar::Long(i64::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::LLong => DynVar::LLong(i64::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::UChar => DynVar::UChar(u8::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::UShort => DynVar::UShort(u16::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::UInt => DynVar::UInt(u32::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::ULong => DynVar::ULong(u64::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::ULLong => DynVar::ULLong(u64::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::Float => DynVar::Float(f32::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::Double => DynVar::Double(f64::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::LDouble => DynVar::LDouble(f64::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::Ptr => DynVar::Ptr(usize::from_ne_bytes(fixed(bytes, tag)?)),
            TypeTag::String => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                let text = std::str::from_utf8(&bytes[..end]).map_err(|_| {
                    DynError::InvalidPayload {
                        tag,
                        reason: "not valid UTF-8",
                    }
                    .logged("DynVar::assign_raw")
                })?;
                return self.assign_string(text);
            }
            TypeTag::Custom => return self.assign_custom(bytes),
            TypeTag::Var => {
                return Err(DynError::unsupported(Some(tag)).logged("DynVar::assign_raw"));
            }
        };
        Ok(())
    }

    /// Orders two values the way typed arrays sort and search variants.
    ///
    /// Values with different tags order by raw tag number (empty first). Strings
    /// compare lexicographically. Nested variants compare their inner values. Every
    /// other payload compares its native-endian bytes up to the shorter length, so
    /// numeric payloads are not ordered numerically and blobs that share a prefix
    /// compare equal.
    pub fn compare(&self, other: &DynVar) -> Ordering {
        let (left, right) = (self.raw_tag(), other.raw_tag());
        if left != right {
            return left.cmp(&right);
        }
        match (self, other) {
            (DynVar::String(a), DynVar::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (DynVar::Var(a), DynVar::Var(b)) => a.compare(b),
            _ => {
                let (a, b) = (self.payload_bytes(), other.payload_bytes());
                let shared = a.len().min(b.len());
                a[..shared].cmp(&b[..shared])
            }
        }
    }

    /// Renders the payload followed by `separator`.
    ///
    /// # Errors
    ///
    /// Returns `DynError::UnsupportedType` for empty values, blobs and pointers.
    pub fn render(&self, separator: &str) -> Result<String, DynError> {
        match self.render_payload() {
            Some(text) => Ok(text + separator),
            None => Err(DynError::unsupported(self.tag()).logged("DynVar::render")),
        }
    }

    pub(crate) fn render_payload(&self) -> Option<String> {
        Some(match self {
            DynVar::Char(v) => char::from(v.to_ne_bytes()[0]).to_string(),
            DynVar::UChar(v) => char::from(*v).to_string(),
            DynVar::Short(v) => v.to_string(),
            DynVar::Int(v) => v.to_string(),
            DynVar::Long(v) | DynVar::LLong(v) => v.to_string(),
            DynVar::UShort(v) => v.to_string(),
            DynVar::UInt(v) => v.to_string(),
            DynVar::ULong(v) | DynVar::ULLong(v) => v.to_string(),
            DynVar::Float(v) => format::general(f64::from(*v), FLOAT_DIGITS),
            DynVar::Double(v) | DynVar::LDouble(v) => format::general(*v, DOUBLE_DIGITS),
            DynVar::String(text) => text.clone(),
            DynVar::Var(inner) => return inner.render_payload(),
            DynVar::Empty | DynVar::Custom(_) | DynVar::Ptr(_) => return None,
        })
    }

    /// Bytes of heap payload owned by a list node holding this value.
    pub(crate) fn node_data_size(&self) -> usize {
        match self {
            DynVar::Var(inner) => size_of::<DynVar>() + inner.byte_len(),
            other => other.byte_len(),
        }
    }
}

fn fixed<const N: usize>(bytes: &[u8], tag: TypeTag) -> Result<[u8; N], DynError> {
    bytes
        .get(..N)
        .and_then(|prefix| prefix.try_into().ok())
        .ok_or_else(|| {
            DynError::InvalidPayload {
                tag,
                reason: "payload shorter than the type's width",
            }
            .logged("DynVar::assign_raw")
        })
}

/// Writes the rendered payload. Tags without a text form write nothing.
impl fmt::Display for DynVar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.render_payload() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

macro_rules! from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for DynVar {
                fn from(value: $ty) -> Self {
                    DynVar::$variant(value)
                }
            }
        )*
    };
}

from_primitive! {
    i8 => Char,
    i16 => Short,
    i32 => Int,
    i64 => LLong,
    u8 => UChar,
    u16 => UShort,
    u32 => UInt,
    u64 => ULLong,
    f32 => Float,
    f64 => Double,
    String => String,
}

impl From<&str> for DynVar {
    fn from(value: &str) -> Self {
        DynVar::String(value.to_string())
    }
}

impl From<&[u8]> for DynVar {
    fn from(value: &[u8]) -> Self {
        if value.is_empty() {
            DynVar::Empty
        } else {
            DynVar::Custom(value.into())
        }
    }
}

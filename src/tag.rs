use crate::value::DynVar;
use std::fmt;
use std::mem::size_of;

/// The closed set of runtime types a [`DynVar`], [`DynArray`](crate::DynArray) slot
/// or [`DynList`](crate::DynList) node can carry.
///
/// Discriminants start at 1; the raw tag 0 is reserved for the empty state and is
/// never a valid `TypeTag`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeTag {
    /// Signed 8-bit integer, rendered as a character
    Char = 1,
    /// Signed 16-bit integer
    Short,
    /// Signed 32-bit integer
    Int,
    /// Signed 64-bit integer (platform `long`)
    Long,
    /// Signed 64-bit integer (`long long`)
    LLong,
    /// Unsigned 8-bit integer, rendered as a character
    UChar,
    /// Unsigned 16-bit integer
    UShort,
    /// Unsigned 32-bit integer
    UInt,
    /// Unsigned 64-bit integer (platform `unsigned long`)
    ULong,
    /// Unsigned 64-bit integer (`unsigned long long`)
    ULLong,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// Extended float, stored as 64 bits
    LDouble,
    /// UTF-8 string
    String,
    /// Opaque byte blob with an explicit length
    Custom,
    /// Nested [`DynVar`]
    Var,
    /// Opaque address, never dereferenced
    Ptr,
}

impl TypeTag {
    /// Every tag, in discriminant order.
    pub const ALL: [TypeTag; 17] = [
        TypeTag::Char,
        TypeTag::Short,
        TypeTag::Int,
        TypeTag::Long,
        TypeTag::LLong,
        TypeTag::UChar,
        TypeTag::UShort,
        TypeTag::UInt,
        TypeTag::ULong,
        TypeTag::ULLong,
        TypeTag::Float,
        TypeTag::Double,
        TypeTag::LDouble,
        TypeTag::String,
        TypeTag::Custom,
        TypeTag::Var,
        TypeTag::Ptr,
    ];

    /// Looks up a tag by its raw value. Returns `None` for 0 and anything past `Ptr`.
    pub fn from_raw(raw: u16) -> Option<TypeTag> {
        Self::ALL.get(usize::from(raw).checked_sub(1)?).copied()
    }

    /// The raw integer value of this tag.
    pub fn raw(self) -> u16 {
        self as u16
    }

    /// Fixed payload width in bytes, or `None` for the variable-length tags
    /// (`String`, `Custom`).
    pub fn size(self) -> Option<usize> {
        match self {
            TypeTag::Char => Some(size_of::<i8>()),
            TypeTag::Short => Some(size_of::<i16>()),
            TypeTag::Int => Some(size_of::<i32>()),
            TypeTag::Long | TypeTag::LLong => Some(size_of::<i64>()),
            TypeTag::UChar => Some(size_of::<u8>()),
            TypeTag::UShort => Some(size_of::<u16>()),
            TypeTag::UInt => Some(size_of::<u32>()),
            TypeTag::ULong | TypeTag::ULLong => Some(size_of::<u64>()),
            TypeTag::Float => Some(size_of::<f32>()),
            TypeTag::Double | TypeTag::LDouble => Some(size_of::<f64>()),
            TypeTag::Var => Some(size_of::<DynVar>()),
            TypeTag::Ptr => Some(size_of::<usize>()),
            TypeTag::String | TypeTag::Custom => None,
        }
    }

    /// Width of one array slot holding this tag, or `None` when arrays cannot
    /// store it.
    pub fn element_size(self) -> Option<usize> {
        match self {
            TypeTag::String | TypeTag::Custom => None,
            other => other.size(),
        }
    }

    /// Width of one unit of this tag's payload as tracked by list nodes.
    /// Strings count in bytes and blobs count as a single unit.
    pub(crate) fn unit_size(self) -> usize {
        match self {
            TypeTag::String => size_of::<u8>(),
            TypeTag::Custom => size_of::<u8>(),
            other => other.size().unwrap_or(0),
        }
    }

    /// True for the signed and unsigned integer tags, characters included.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            TypeTag::Char
                | TypeTag::Short
                | TypeTag::Int
                | TypeTag::Long
                | TypeTag::LLong
                | TypeTag::UChar
                | TypeTag::UShort
                | TypeTag::UInt
                | TypeTag::ULong
                | TypeTag::ULLong
        )
    }

    /// True for `Float`, `Double` and `LDouble`.
    pub fn is_float(self) -> bool {
        matches!(self, TypeTag::Float | TypeTag::Double | TypeTag::LDouble)
    }

    /// Integer or float.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// The tag's name as written in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Char => "Char",
            TypeTag::Short => "Short",
            TypeTag::Int => "Int",
            TypeTag::Long => "Long",
            TypeTag::LLong => "LLong",
            TypeTag::UChar => "UChar",
            TypeTag::UShort => "UShort",
            TypeTag::UInt => "UInt",
            TypeTag::ULong => "ULong",
            TypeTag::ULLong => "ULLong",
            TypeTag::Float => "Float",
            TypeTag::Double => "Double",
            TypeTag::LDouble => "LDouble",
            TypeTag::String => "String",
            TypeTag::Custom => "Custom",
            TypeTag::Var => "Var",
            TypeTag::Ptr => "Ptr",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of an optional tag, `"Empty"` for the cleared state.
pub(crate) fn tag_name(tag: &Option<TypeTag>) -> &'static str {
    tag.map_or("Empty", TypeTag::name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_round_trip() {
        for tag in TypeTag::ALL {
            assert_eq!(TypeTag::from_raw(tag.raw()), Some(tag));
        }
        assert_eq!(TypeTag::from_raw(0), None);
        assert_eq!(TypeTag::from_raw(18), None);
        assert_eq!(TypeTag::Char.raw(), 1);
        assert_eq!(TypeTag::Ptr.raw(), 17);
    }

    #[test]
    fn test_widths() {
        assert_eq!(TypeTag::Char.size(), Some(1));
        assert_eq!(TypeTag::Short.size(), Some(2));
        assert_eq!(TypeTag::Int.size(), Some(4));
        assert_eq!(TypeTag::LLong.size(), Some(8));
        assert_eq!(TypeTag::Double.size(), Some(8));
        assert_eq!(TypeTag::String.size(), None);
        assert_eq!(TypeTag::Custom.element_size(), None);
        assert_eq!(TypeTag::Var.element_size(), Some(size_of::<DynVar>()));
    }

    #[test]
    fn test_families() {
        assert!(TypeTag::UChar.is_integer());
        assert!(!TypeTag::UChar.is_float());
        assert!(TypeTag::LDouble.is_numeric());
        assert!(!TypeTag::String.is_numeric());
        assert_eq!(tag_name(&None), "Empty");
        assert_eq!(TypeTag::ULLong.to_string(), "ULLong");
    }
}

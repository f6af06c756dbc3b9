//! CBOR initial-byte handling. For internal use only.
//!
//! Every CBOR data item starts with one head byte: the top 3 bits select the
//! major type, the low 5 bits select how the argument (value, length, or tag
//! number) is carried.

/// CBOR major types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Major {
    Unsigned,
    Negative,
    Bytes,
    Text,
    Array,
    Map,
    Tag,
    Simple,
}

impl Major {
    /// Extract the major type from a head byte.
    pub fn from_u8(head: u8) -> Major {
        match head >> 5 {
            0 => Major::Unsigned,
            1 => Major::Negative,
            2 => Major::Bytes,
            3 => Major::Text,
            4 => Major::Array,
            5 => Major::Map,
            6 => Major::Tag,
            _ => Major::Simple,
        }
    }

    /// The major type bits, shifted into head-byte position.
    pub fn into_u8(self) -> u8 {
        let bits: u8 = match self {
            Major::Unsigned => 0,
            Major::Negative => 1,
            Major::Bytes => 2,
            Major::Text => 3,
            Major::Array => 4,
            Major::Map => 5,
            Major::Tag => 6,
            Major::Simple => 7,
        };
        bits << 5
    }

    pub fn name(self) -> &'static str {
        match self {
            Major::Unsigned => "unsigned integer",
            Major::Negative => "negative integer",
            Major::Bytes => "byte string",
            Major::Text => "text string",
            Major::Array => "array",
            Major::Map => "map",
            Major::Tag => "tag",
            Major::Simple => "simple/float",
        }
    }
}

impl From<u8> for Major {
    fn from(val: u8) -> Major {
        Major::from_u8(val)
    }
}

/// Additional-info values that switch the argument to a trailing
/// big-endian integer of 1, 2, 4, or 8 bytes.
pub const ARG_U8: u8 = 24;
pub const ARG_U16: u8 = 25;
pub const ARG_U32: u8 = 26;
pub const ARG_U64: u8 = 27;
/// Additional-info value marking an indefinite-length item (unsupported here).
pub const ARG_INDEFINITE: u8 = 31;

/// Reserved simple values under major type 7.
pub const SIMPLE_FALSE: u8 = 20;
pub const SIMPLE_TRUE: u8 = 21;
pub const SIMPLE_NULL: u8 = 22;
pub const SIMPLE_UNDEFINED: u8 = 23;

/// Write a head byte plus minimal-width argument.
///
/// The argument is packed into the head byte when it fits (0-23), otherwise
/// the smallest of the 1/2/4/8-byte big-endian trailing forms is used.
pub fn write_head(buf: &mut Vec<u8>, major: Major, arg: u64) {
    let major = major.into_u8();
    if arg <= 23 {
        buf.push(major | arg as u8);
    } else if arg <= u8::MAX as u64 {
        buf.push(major | ARG_U8);
        buf.push(arg as u8);
    } else if arg <= u16::MAX as u64 {
        buf.push(major | ARG_U16);
        buf.extend_from_slice(&(arg as u16).to_be_bytes());
    } else if arg <= u32::MAX as u64 {
        buf.push(major | ARG_U32);
        buf.extend_from_slice(&(arg as u32).to_be_bytes());
    } else {
        buf.push(major | ARG_U64);
        buf.extend_from_slice(&arg.to_be_bytes());
    }
}

/// Defines the CBOR tags this library assigns meaning to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagType {
    /// Tag 0: RFC 3339 date/time text string.
    DateTime,
    /// Tag 24: byte string holding one complete CBOR-encoded data item.
    EncodedCbor,
}

impl TagType {
    /// Return the assigned tag number.
    pub fn into_u64(self) -> u64 {
        match self {
            TagType::DateTime => 0,
            TagType::EncodedCbor => 24,
        }
    }

    /// Convert from a tag number. Returns `None` if the tag isn't recognized.
    pub fn from_u64(v: u64) -> Option<TagType> {
        match v {
            0 => Some(TagType::DateTime),
            24 => Some(TagType::EncodedCbor),
            _ => None,
        }
    }
}

impl From<TagType> for u64 {
    fn from(val: TagType) -> u64 {
        val.into_u64()
    }
}

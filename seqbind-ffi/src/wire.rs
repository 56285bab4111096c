// Wire type tags. The stream itself is untagged: these tags exist only at
// generation time, to pick the matching reader/writer on both sides.

/// Canonical on-the-wire encoding category of a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireType {
    /// 1 byte, `0` or `1`.
    Bool,
    /// 4 bytes, little-endian two's-complement.
    Int32,
    /// 8 bytes, little-endian two's-complement.
    Int64,
    /// 8 bytes, little-endian IEEE-754 bit pattern.
    Float64,
    /// Int32 byte length followed by UTF-8 bytes.
    String,
    /// Int32 byte length followed by raw bytes.
    Bytes,
    /// Int32 [`RefNum`](crate::RefNum).
    ObjectRef,
}

impl WireType {
    /// Encoded size in bytes, or `None` for length-prefixed types.
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            WireType::Bool => Some(1),
            WireType::Int32 | WireType::ObjectRef => Some(4),
            WireType::Int64 | WireType::Float64 => Some(8),
            WireType::String | WireType::Bytes => None,
        }
    }

    /// Suffix of the runtime `Buffer` reader/writer for this type
    /// (`read_<suffix>` / `write_<suffix>`).
    pub const fn codec_suffix(self) -> &'static str {
        match self {
            WireType::Bool => "bool",
            WireType::Int32 => "i32",
            WireType::Int64 => "i64",
            WireType::Float64 => "f64",
            WireType::String => "string",
            WireType::Bytes => "bytes",
            WireType::ObjectRef => "ref",
        }
    }
}

impl std::fmt::Display for WireType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WireType::Bool => "Bool",
            WireType::Int32 => "Int32",
            WireType::Int64 => "Int64",
            WireType::Float64 => "Float64",
            WireType::String => "String",
            WireType::Bytes => "Bytes",
            WireType::ObjectRef => "ObjectRef",
        };
        f.write_str(name)
    }
}

/// Byte width of every length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

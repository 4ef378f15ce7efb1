/// One-byte prefix identifying the shape of the value that follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
	Null = 0,
	False = 1,
	True = 2,
	U8 = 3,
	U16 = 4,
	U32 = 5,
	U64 = 6,
	I64 = 7,
	Varint = 8,
	F64 = 9,
	/// A string written in full; it takes the next interning slot.
	String = 10,
	/// Back reference to a string already written in this stream.
	StringRef = 11,
	Bytes = 12,
	Array = 13,
	/// Opaque object: a [`TypeMarker`](crate::TypeMarker) then its payload.
	Object = 14,
}

impl Tag {
	/// Decodes a tag byte.
	pub const fn from_byte(byte: u8) -> Option<Self> {
		Some(match byte {
			0 => Self::Null,
			1 => Self::False,
			2 => Self::True,
			3 => Self::U8,
			4 => Self::U16,
			5 => Self::U32,
			6 => Self::U64,
			7 => Self::I64,
			8 => Self::Varint,
			9 => Self::F64,
			10 => Self::String,
			11 => Self::StringRef,
			12 => Self::Bytes,
			13 => Self::Array,
			14 => Self::Object,
			_ => return None,
		})
	}

	/// Name used in type mismatch diagnostics.
	pub const fn name(self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::False | Self::True => "bool",
			Self::U8 => "u8",
			Self::U16 => "u16",
			Self::U32 => "u32",
			Self::U64 => "u64",
			Self::I64 => "i64",
			Self::Varint => "varint",
			Self::F64 => "f64",
			Self::String | Self::StringRef => "string",
			Self::Bytes => "bytes",
			Self::Array => "array",
			Self::Object => "object",
		}
	}
}

impl std::fmt::Display for Tag {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}

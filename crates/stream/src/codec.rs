//! Static encode/decode for values with a fixed stream shape.
//!
//! [`Encode`]/[`Decode`] back [`ObjectWriter::write_array`] and
//! [`ObjectReader::read_array`] for homogeneous arrays. Opaque objects use
//! [`Writable`](crate::Writable)/[`Readable`](crate::Readable) instead.

use crate::error::Result;
use crate::reader::ObjectReader;
use crate::writer::ObjectWriter;

pub trait Encode {
	fn encode(&self, writer: &mut ObjectWriter<'_>) -> Result<()>;
}

pub trait Decode: Sized {
	fn decode(reader: &mut ObjectReader<'_>) -> Result<Self>;
}

macro_rules! scalar_codec {
	($($ty:ty => $write:ident, $read:ident;)*) => {
		$(
			impl Encode for $ty {
				fn encode(&self, writer: &mut ObjectWriter<'_>) -> Result<()> {
					writer.$write(*self)
				}
			}

			impl Decode for $ty {
				fn decode(reader: &mut ObjectReader<'_>) -> Result<Self> {
					reader.$read()
				}
			}
		)*
	};
}

scalar_codec! {
	bool => write_bool, read_bool;
	u8 => write_u8, read_u8;
	u16 => write_u16, read_u16;
	u32 => write_u32, read_u32;
	u64 => write_u64, read_u64;
	i64 => write_i64, read_i64;
	f64 => write_f64, read_f64;
}

impl Encode for str {
	fn encode(&self, writer: &mut ObjectWriter<'_>) -> Result<()> {
		writer.write_string(self)
	}
}

impl Encode for String {
	fn encode(&self, writer: &mut ObjectWriter<'_>) -> Result<()> {
		writer.write_string(self)
	}
}

impl Decode for String {
	fn decode(reader: &mut ObjectReader<'_>) -> Result<Self> {
		reader.read_string()
	}
}

impl<T: Encode + ?Sized> Encode for &T {
	fn encode(&self, writer: &mut ObjectWriter<'_>) -> Result<()> {
		(**self).encode(writer)
	}
}

impl<T: Encode> Encode for Vec<T> {
	fn encode(&self, writer: &mut ObjectWriter<'_>) -> Result<()> {
		writer.write_array(self)
	}
}

impl<T: Decode> Decode for Vec<T> {
	fn decode(reader: &mut ObjectReader<'_>) -> Result<Self> {
		reader.read_array()
	}
}

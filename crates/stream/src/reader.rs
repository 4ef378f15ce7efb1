use std::io::{ErrorKind, Read};
use std::sync::Arc;

use crate::codec::Decode;
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::header::{FORMAT_VERSION, HEADER_SIZE, validate_header};
use crate::marker::{MarkerRegistry, Readable, TypeMarker, Writable};
use crate::tag::Tag;
use crate::value::Value;
use crate::varint::VarintAccumulator;

/// Upper bound on capacity reserved from a declared array or payload length.
const MAX_PREALLOC: u64 = 1024;

/// Reads tagged values from a byte source.
///
/// The header is read and validated on construction, before any value.
/// Reads are strictly sequential; the reader never seeks.
pub struct ObjectReader<'a> {
	source: &'a mut dyn Read,
	registry: &'a MarkerRegistry,
	config: StreamConfig,
	/// Strings in the order they first appeared, indexed by back references.
	strings: Vec<Arc<str>>,
	offset: u64,
	depth: u32,
}

impl<'a> ObjectReader<'a> {
	/// Opens a stream that decodes only the builtin object types.
	pub fn new(source: &'a mut dyn Read) -> Result<Self> {
		Self::with_config(source, MarkerRegistry::builtins(), StreamConfig::default())
	}

	/// Opens a stream that decodes objects through `registry`.
	pub fn with_registry(source: &'a mut dyn Read, registry: &'a MarkerRegistry) -> Result<Self> {
		Self::with_config(source, registry, StreamConfig::default())
	}

	/// Opens a stream with explicit limits.
	pub fn with_config(
		source: &'a mut dyn Read,
		registry: &'a MarkerRegistry,
		config: StreamConfig,
	) -> Result<Self> {
		let mut reader = Self {
			source,
			registry,
			config,
			strings: Vec::new(),
			offset: 0,
			depth: 0,
		};
		let mut header = [0u8; HEADER_SIZE];
		reader.fill(&mut header)?;
		validate_header(&header)?;
		tracing::debug!(version = FORMAT_VERSION, "object stream opened for read");
		Ok(reader)
	}

	/// Opens a stream, returning `None` if the header is missing, foreign or
	/// from another format version.
	pub fn try_new(source: &'a mut dyn Read) -> Option<Self> {
		match Self::new(source) {
			Ok(reader) => Some(reader),
			Err(e) => {
				tracing::warn!(error = %e, "rejected object stream header");
				None
			}
		}
	}

	/// Registry used to decode opaque objects.
	pub fn registry(&self) -> &'a MarkerRegistry {
		self.registry
	}

	/// Configuration this reader was opened with.
	pub fn config(&self) -> &StreamConfig {
		&self.config
	}

	/// Bytes consumed so far, header included.
	pub fn offset(&self) -> u64 {
		self.offset
	}

	/// Reads the next tag byte.
	pub fn read_tag(&mut self) -> Result<Tag> {
		let byte = self.read_byte()?;
		Tag::from_byte(byte).ok_or(StreamError::InvalidTag(byte))
	}

	pub fn read_null(&mut self) -> Result<()> {
		let tag = self.read_tag()?;
		expect(tag, Tag::Null)
	}

	pub fn read_bool(&mut self) -> Result<bool> {
		match self.read_tag()? {
			Tag::True => Ok(true),
			Tag::False => Ok(false),
			found => Err(mismatch("bool", found)),
		}
	}

	pub fn read_u8(&mut self) -> Result<u8> {
		let tag = self.read_tag()?;
		expect(tag, Tag::U8)?;
		self.read_byte()
	}

	pub fn read_u16(&mut self) -> Result<u16> {
		let tag = self.read_tag()?;
		expect(tag, Tag::U16)?;
		self.read_raw_u16()
	}

	pub fn read_u32(&mut self) -> Result<u32> {
		let tag = self.read_tag()?;
		expect(tag, Tag::U32)?;
		let mut buf = [0u8; 4];
		self.fill(&mut buf)?;
		Ok(u32::from_le_bytes(buf))
	}

	pub fn read_u64(&mut self) -> Result<u64> {
		let tag = self.read_tag()?;
		expect(tag, Tag::U64)?;
		let mut buf = [0u8; 8];
		self.fill(&mut buf)?;
		Ok(u64::from_le_bytes(buf))
	}

	pub fn read_i64(&mut self) -> Result<i64> {
		let tag = self.read_tag()?;
		expect(tag, Tag::I64)?;
		let mut buf = [0u8; 8];
		self.fill(&mut buf)?;
		Ok(i64::from_le_bytes(buf))
	}

	pub fn read_f64(&mut self) -> Result<f64> {
		let tag = self.read_tag()?;
		expect(tag, Tag::F64)?;
		let mut buf = [0u8; 8];
		self.fill(&mut buf)?;
		Ok(f64::from_bits(u64::from_le_bytes(buf)))
	}

	pub fn read_varint(&mut self) -> Result<u64> {
		let tag = self.read_tag()?;
		expect(tag, Tag::Varint)?;
		self.read_raw_varint()
	}

	/// Reads a string written in full or as a back reference.
	pub fn read_string(&mut self) -> Result<String> {
		Ok(self.read_shared_string()?.as_ref().to_owned())
	}

	/// Like [`read_string`](Self::read_string), but shares the interned
	/// allocation with every other occurrence in this stream.
	pub fn read_shared_string(&mut self) -> Result<Arc<str>> {
		let tag = self.read_tag()?;
		self.read_string_body(tag)
	}

	/// Reads a string or null.
	pub fn read_optional_string(&mut self) -> Result<Option<String>> {
		match self.read_tag()? {
			Tag::Null => Ok(None),
			tag => Ok(Some(self.read_string_body(tag)?.as_ref().to_owned())),
		}
	}

	pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
		let tag = self.read_tag()?;
		expect(tag, Tag::Bytes)?;
		self.read_bytes_body()
	}

	/// Reads a homogeneous array.
	pub fn read_array<T: Decode>(&mut self) -> Result<Vec<T>> {
		let tag = self.read_tag()?;
		expect(tag, Tag::Array)?;
		let len = self.read_raw_varint()?;
		self.enter()?;
		let mut items = Vec::with_capacity(len.min(MAX_PREALLOC) as usize);
		for _ in 0..len {
			items.push(T::decode(self)?);
		}
		self.depth -= 1;
		Ok(items)
	}

	/// Reads whatever value comes next.
	pub fn read_value(&mut self) -> Result<Value> {
		let tag = self.read_tag()?;
		self.read_value_body(tag)
	}

	/// Reads an object that must decode to `T`.
	///
	/// Fails with [`StreamError::TypeMismatch`] if the stream holds an object
	/// of another registered type, and [`StreamError::UnknownTypeMarker`] if
	/// its marker is not registered at all.
	pub fn read_object<T: Readable>(&mut self) -> Result<T> {
		let tag = self.read_tag()?;
		expect(tag, Tag::Object)?;
		let marker = TypeMarker::new(self.read_raw_u16()?);
		if marker != T::MARKER {
			return Err(match self.registry.type_name(marker) {
				Some(found) => StreamError::TypeMismatch {
					expected: std::any::type_name::<T>(),
					found,
				},
				None => StreamError::UnknownTypeMarker(marker),
			});
		}
		self.enter()?;
		let value = T::read_from(self)?;
		self.depth -= 1;
		Ok(value)
	}

	/// Reads an object of any registered type.
	pub fn read_object_dyn(&mut self) -> Result<Box<dyn Writable>> {
		let tag = self.read_tag()?;
		expect(tag, Tag::Object)?;
		self.read_object_body()
	}

	fn read_value_body(&mut self, tag: Tag) -> Result<Value> {
		Ok(match tag {
			Tag::Null => Value::Null,
			Tag::False => Value::Bool(false),
			Tag::True => Value::Bool(true),
			Tag::U8 => Value::U8(self.read_byte()?),
			Tag::U16 => Value::U16(self.read_raw_u16()?),
			Tag::U32 => {
				let mut buf = [0u8; 4];
				self.fill(&mut buf)?;
				Value::U32(u32::from_le_bytes(buf))
			}
			Tag::U64 => {
				let mut buf = [0u8; 8];
				self.fill(&mut buf)?;
				Value::U64(u64::from_le_bytes(buf))
			}
			Tag::I64 => {
				let mut buf = [0u8; 8];
				self.fill(&mut buf)?;
				Value::I64(i64::from_le_bytes(buf))
			}
			Tag::Varint => Value::Varint(self.read_raw_varint()?),
			Tag::F64 => {
				let mut buf = [0u8; 8];
				self.fill(&mut buf)?;
				Value::F64(f64::from_bits(u64::from_le_bytes(buf)))
			}
			Tag::String | Tag::StringRef => {
				Value::String(self.read_string_body(tag)?.as_ref().to_owned())
			}
			Tag::Bytes => Value::Bytes(self.read_bytes_body()?),
			Tag::Array => {
				let len = self.read_raw_varint()?;
				self.enter()?;
				let mut items = Vec::with_capacity(len.min(MAX_PREALLOC) as usize);
				for _ in 0..len {
					items.push(self.read_value()?);
				}
				self.depth -= 1;
				Value::Array(items)
			}
			Tag::Object => Value::Object(Arc::from(self.read_object_body()?)),
		})
	}

	fn read_object_body(&mut self) -> Result<Box<dyn Writable>> {
		let marker = TypeMarker::new(self.read_raw_u16()?);
		let decode = self
			.registry
			.decoder(marker)
			.ok_or(StreamError::UnknownTypeMarker(marker))?;
		tracing::trace!(%marker, "reading object");
		self.enter()?;
		let object = decode(self)?;
		self.depth -= 1;
		Ok(object)
	}

	fn read_string_body(&mut self, tag: Tag) -> Result<Arc<str>> {
		match tag {
			Tag::String => {
				let bytes = self.read_bytes_body()?;
				let value: Arc<str> = String::from_utf8(bytes)
					.map_err(|_| StreamError::InvalidUtf8)?
					.into();
				self.strings.push(Arc::clone(&value));
				Ok(value)
			}
			Tag::StringRef => {
				let index = self.read_raw_varint()?;
				usize::try_from(index)
					.ok()
					.and_then(|i| self.strings.get(i))
					.cloned()
					.ok_or(StreamError::InvalidStringRef {
						index,
						table_len: self.strings.len(),
					})
			}
			found => Err(mismatch("string", found)),
		}
	}

	fn read_bytes_body(&mut self) -> Result<Vec<u8>> {
		let len = self.read_raw_varint()?;
		if len > u64::from(self.config.max_string_len) {
			return Err(StreamError::StringTooLong {
				len,
				limit: self.config.max_string_len,
			});
		}
		// Grow with the bytes actually present rather than the declared length.
		let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC) as usize);
		let read = (&mut self.source).take(len).read_to_end(&mut buf)?;
		self.offset += read as u64;
		if (read as u64) < len {
			return Err(StreamError::UnexpectedEndOfStream {
				offset: self.offset,
			});
		}
		Ok(buf)
	}

	fn read_raw_u16(&mut self) -> Result<u16> {
		let mut buf = [0u8; 2];
		self.fill(&mut buf)?;
		Ok(u16::from_le_bytes(buf))
	}

	fn read_raw_varint(&mut self) -> Result<u64> {
		let mut acc = VarintAccumulator::default();
		loop {
			let byte = self.read_byte()?;
			if let Some(value) = acc.push(byte)? {
				return Ok(value);
			}
		}
	}

	fn read_byte(&mut self) -> Result<u8> {
		let mut buf = [0u8; 1];
		self.fill(&mut buf)?;
		Ok(buf[0])
	}

	fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
		match self.source.read_exact(buf) {
			Ok(()) => {
				self.offset += buf.len() as u64;
				Ok(())
			}
			Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
				Err(StreamError::UnexpectedEndOfStream {
					offset: self.offset,
				})
			}
			Err(e) => Err(e.into()),
		}
	}

	fn enter(&mut self) -> Result<()> {
		if self.depth >= self.config.max_depth {
			return Err(StreamError::DepthLimitExceeded {
				limit: self.config.max_depth,
			});
		}
		self.depth += 1;
		Ok(())
	}
}

fn expect(found: Tag, expected: Tag) -> Result<()> {
	if found == expected {
		Ok(())
	} else {
		Err(mismatch(expected.name(), found))
	}
}

fn mismatch(expected: &'static str, found: Tag) -> StreamError {
	StreamError::TypeMismatch {
		expected,
		found: found.name(),
	}
}

/// Opens `bytes` as a stream and runs `read` against it.
pub fn from_bytes<T, F>(
	bytes: &[u8],
	registry: &MarkerRegistry,
	config: StreamConfig,
	read: F,
) -> Result<T>
where
	F: FnOnce(&mut ObjectReader<'_>) -> Result<T>,
{
	let mut source = bytes;
	let mut reader = ObjectReader::with_config(&mut source, registry, config)?;
	read(&mut reader)
}

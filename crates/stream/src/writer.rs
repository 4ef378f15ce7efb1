use std::io::Write;

use rustc_hash::FxHashMap;

use crate::codec::Encode;
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::header::{FORMAT_VERSION, encode_header};
use crate::marker::Writable;
use crate::tag::Tag;
use crate::value::Value;
use crate::varint::{MAX_VARINT_BYTES, encode_varint};

/// Writes tagged values into a byte sink.
///
/// The writer holds the sink exclusively for its lifetime. The header is
/// written on construction; [`finish`](Self::finish) flushes and releases
/// the sink. Once any write fails the writer is poisoned: the bytes already
/// emitted do not form a valid stream and every later call returns
/// [`StreamError::Poisoned`].
pub struct ObjectWriter<'a> {
	sink: &'a mut dyn Write,
	config: StreamConfig,
	/// Interning slots assigned so far, keyed by string value.
	strings: FxHashMap<Box<str>, u32>,
	depth: u32,
	written: u64,
	poisoned: bool,
	finished: bool,
}

impl<'a> ObjectWriter<'a> {
	/// Opens a stream with the default configuration.
	pub fn new(sink: &'a mut dyn Write) -> Result<Self> {
		Self::with_config(sink, StreamConfig::default())
	}

	/// Opens a stream, writing the header immediately.
	pub fn with_config(sink: &'a mut dyn Write, config: StreamConfig) -> Result<Self> {
		let mut writer = Self {
			sink,
			config,
			strings: FxHashMap::default(),
			depth: 0,
			written: 0,
			poisoned: false,
			finished: false,
		};
		writer.emit(&encode_header())?;
		tracing::debug!(
			version = FORMAT_VERSION,
			intern_strings = config.intern_strings,
			"object stream opened for write"
		);
		Ok(writer)
	}

	/// Configuration this writer was opened with.
	pub fn config(&self) -> &StreamConfig {
		&self.config
	}

	/// Bytes emitted so far, header included.
	pub fn bytes_written(&self) -> u64 {
		self.written
	}

	/// Returns true once a write has failed.
	pub fn is_poisoned(&self) -> bool {
		self.poisoned
	}

	pub fn write_null(&mut self) -> Result<()> {
		self.emit_tag(Tag::Null)
	}

	pub fn write_bool(&mut self, value: bool) -> Result<()> {
		self.emit_tag(if value { Tag::True } else { Tag::False })
	}

	pub fn write_u8(&mut self, value: u8) -> Result<()> {
		self.emit_tag(Tag::U8)?;
		self.emit(&[value])
	}

	pub fn write_u16(&mut self, value: u16) -> Result<()> {
		self.emit_tag(Tag::U16)?;
		self.emit(&value.to_le_bytes())
	}

	pub fn write_u32(&mut self, value: u32) -> Result<()> {
		self.emit_tag(Tag::U32)?;
		self.emit(&value.to_le_bytes())
	}

	pub fn write_u64(&mut self, value: u64) -> Result<()> {
		self.emit_tag(Tag::U64)?;
		self.emit(&value.to_le_bytes())
	}

	pub fn write_i64(&mut self, value: i64) -> Result<()> {
		self.emit_tag(Tag::I64)?;
		self.emit(&value.to_le_bytes())
	}

	/// Writes the IEEE 754 bit pattern, so NaN payloads survive.
	pub fn write_f64(&mut self, value: f64) -> Result<()> {
		self.emit_tag(Tag::F64)?;
		self.emit(&value.to_bits().to_le_bytes())
	}

	/// Writes an unsigned integer in LEB128 form.
	pub fn write_varint(&mut self, value: u64) -> Result<()> {
		self.emit_tag(Tag::Varint)?;
		self.emit_varint(value)
	}

	/// Writes a string, or a back reference if the same value was already
	/// written to this stream and interning is enabled.
	pub fn write_string(&mut self, value: &str) -> Result<()> {
		if self.config.intern_strings
			&& let Some(&index) = self.strings.get(value)
		{
			tracing::trace!(index, "string back reference");
			self.emit_tag(Tag::StringRef)?;
			return self.emit_varint(u64::from(index));
		}

		self.check_len(value.len())?;
		self.emit_tag(Tag::String)?;
		self.emit_varint(value.len() as u64)?;
		self.emit(value.as_bytes())?;
		if self.config.intern_strings {
			let index = self.strings.len() as u32;
			self.strings.insert(value.into(), index);
		}
		Ok(())
	}

	/// Writes `None` as null.
	pub fn write_optional_string(&mut self, value: Option<&str>) -> Result<()> {
		match value {
			Some(s) => self.write_string(s),
			None => self.write_null(),
		}
	}

	pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
		self.check_len(value.len())?;
		self.emit_tag(Tag::Bytes)?;
		self.emit_varint(value.len() as u64)?;
		self.emit(value)
	}

	/// Writes a homogeneous array.
	pub fn write_array<T: Encode>(&mut self, items: &[T]) -> Result<()> {
		self.write_array_with(items.len(), items.iter(), |writer, item| item.encode(writer))
	}

	/// Writes `len` elements produced by `items`, each through `write_item`.
	///
	/// `items` must yield exactly `len` elements.
	pub fn write_array_with<I, F>(&mut self, len: usize, items: I, mut write_item: F) -> Result<()>
	where
		I: IntoIterator,
		F: FnMut(&mut Self, I::Item) -> Result<()>,
	{
		self.enter()?;
		self.emit_tag(Tag::Array)?;
		self.emit_varint(len as u64)?;
		let mut count = 0usize;
		for item in items {
			if let Err(e) = write_item(self, item) {
				return self.fail(e);
			}
			count += 1;
		}
		self.depth -= 1;
		if count != len {
			return self.fail(StreamError::Malformed { what: "array length" });
		}
		Ok(())
	}

	/// Writes any dynamic value, arrays of mixed element types included.
	pub fn write_value(&mut self, value: &Value) -> Result<()> {
		match value {
			Value::Null => self.write_null(),
			Value::Bool(v) => self.write_bool(*v),
			Value::U8(v) => self.write_u8(*v),
			Value::U16(v) => self.write_u16(*v),
			Value::U32(v) => self.write_u32(*v),
			Value::U64(v) => self.write_u64(*v),
			Value::I64(v) => self.write_i64(*v),
			Value::Varint(v) => self.write_varint(*v),
			Value::F64(v) => self.write_f64(*v),
			Value::String(v) => self.write_string(v),
			Value::Bytes(v) => self.write_bytes(v),
			Value::Array(items) => {
				self.write_array_with(items.len(), items, |writer, item| writer.write_value(item))
			}
			Value::Object(object) => self.write_object(object.as_ref()),
		}
	}

	/// Writes an opaque object: its marker, then its own payload.
	pub fn write_object(&mut self, object: &dyn Writable) -> Result<()> {
		let marker = object.type_marker();
		self.enter()?;
		self.emit_tag(Tag::Object)?;
		self.emit(&marker.as_u16().to_le_bytes())?;
		tracing::trace!(%marker, "writing object");
		let result = object.write_to(self);
		self.depth -= 1;
		if result.is_err() {
			self.poisoned = true;
		}
		result
	}

	/// Flushes the sink and releases it, returning the total bytes written.
	pub fn finish(mut self) -> Result<u64> {
		if self.poisoned {
			return Err(StreamError::Poisoned);
		}
		self.finished = true;
		if let Err(e) = self.sink.flush() {
			self.poisoned = true;
			return Err(e.into());
		}
		tracing::debug!(
			bytes = self.written,
			interned = self.strings.len(),
			"object stream finished"
		);
		Ok(self.written)
	}

	fn emit(&mut self, bytes: &[u8]) -> Result<()> {
		if self.poisoned {
			return Err(StreamError::Poisoned);
		}
		if let Err(e) = self.sink.write_all(bytes) {
			self.poisoned = true;
			return Err(e.into());
		}
		self.written += bytes.len() as u64;
		Ok(())
	}

	fn emit_tag(&mut self, tag: Tag) -> Result<()> {
		self.emit(&[tag as u8])
	}

	fn emit_varint(&mut self, value: u64) -> Result<()> {
		let mut buf = [0u8; MAX_VARINT_BYTES];
		let len = encode_varint(value, &mut buf);
		self.emit(&buf[..len])
	}

	/// Rejects payloads a reader with the same config would refuse.
	fn check_len(&mut self, len: usize) -> Result<()> {
		if self.poisoned {
			return Err(StreamError::Poisoned);
		}
		let len = len as u64;
		if len > u64::from(self.config.max_string_len) {
			return self.fail(StreamError::StringTooLong {
				len,
				limit: self.config.max_string_len,
			});
		}
		Ok(())
	}

	fn enter(&mut self) -> Result<()> {
		if self.poisoned {
			return Err(StreamError::Poisoned);
		}
		if self.depth >= self.config.max_depth {
			return self.fail(StreamError::DepthLimitExceeded {
				limit: self.config.max_depth,
			});
		}
		self.depth += 1;
		Ok(())
	}

	fn fail<T>(&mut self, err: StreamError) -> Result<T> {
		self.poisoned = true;
		Err(err)
	}
}

impl Drop for ObjectWriter<'_> {
	fn drop(&mut self) {
		if !self.finished && !self.poisoned {
			let _ = self.sink.flush();
		}
	}
}

/// Runs `write` against a fresh in-memory stream and returns its bytes.
pub fn to_bytes<F>(config: StreamConfig, write: F) -> Result<Vec<u8>>
where
	F: FnOnce(&mut ObjectWriter<'_>) -> Result<()>,
{
	let mut buf = Vec::new();
	let mut writer = ObjectWriter::with_config(&mut buf, config)?;
	write(&mut writer)?;
	writer.finish()?;
	Ok(buf)
}

use std::sync::Arc;

use crate::marker::Writable;

/// Dynamically typed view of one tagged value.
///
/// Produced by [`ObjectReader::read_value`](crate::ObjectReader::read_value)
/// for callers that do not know the stream layout ahead of time, and
/// accepted by [`ObjectWriter::write_value`](crate::ObjectWriter::write_value)
/// for heterogeneous arrays. Writing a value read from a stream reproduces
/// the same tags, except that string back references become the string.
#[derive(Debug, Clone)]
pub enum Value {
	Null,
	Bool(bool),
	U8(u8),
	U16(u16),
	U32(u32),
	U64(u64),
	I64(i64),
	Varint(u64),
	F64(f64),
	String(String),
	Bytes(Vec<u8>),
	Array(Vec<Value>),
	Object(Arc<dyn Writable>),
}

impl Value {
	/// Returns the string payload, if any.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			_ => None,
		}
	}

	/// Downcasts an object payload to a concrete type.
	pub fn as_object<T: Writable>(&self) -> Option<&T> {
		match self {
			Self::Object(object) => {
				let any: &dyn std::any::Any = object.as_ref();
				any.downcast_ref::<T>()
			}
			_ => None,
		}
	}
}

/// Objects compare by identity: two reads of the same bytes produce
/// distinct objects that are not equal under this impl. Compare through
/// [`Value::as_object`] for domain equality.
impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::U8(a), Self::U8(b)) => a == b,
			(Self::U16(a), Self::U16(b)) => a == b,
			(Self::U32(a), Self::U32(b)) => a == b,
			(Self::U64(a), Self::U64(b)) => a == b,
			(Self::I64(a), Self::I64(b)) => a == b,
			(Self::Varint(a), Self::Varint(b)) => a == b,
			(Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
			(Self::String(a), Self::String(b)) => a == b,
			(Self::Bytes(a), Self::Bytes(b)) => a == b,
			(Self::Array(a), Self::Array(b)) => a == b,
			(Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.to_owned())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<u32> for Value {
	fn from(value: u32) -> Self {
		Self::U32(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::I64(value)
	}
}

impl From<Vec<Value>> for Value {
	fn from(value: Vec<Value>) -> Self {
		Self::Array(value)
	}
}

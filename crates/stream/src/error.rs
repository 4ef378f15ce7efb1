use thiserror::Error;

use crate::marker::TypeMarker;

/// Errors raised while writing or reading an object stream.
///
/// Every variant except [`StreamError::Io`] describes a malformed or
/// incompatible stream. None of them are recoverable for the stream that
/// produced them: the caller discards the stream and starts over.
#[derive(Debug, Error)]
pub enum StreamError {
	/// The stream header carries a format version this build cannot decode.
	#[error("unsupported stream version: expected {expected}, found {found}")]
	VersionMismatch { expected: u32, found: u32 },

	/// The stream does not start with the object stream magic bytes.
	#[error("invalid stream magic: {0:?}")]
	InvalidMagic([u8; 4]),

	/// The stream ended in the middle of a value.
	#[error("unexpected end of stream at offset {offset}")]
	UnexpectedEndOfStream { offset: u64 },

	/// An object was tagged with a marker that has no registered decoder.
	#[error("unknown type marker: {0}")]
	UnknownTypeMarker(TypeMarker),

	/// The value present in the stream is not the one the caller asked for.
	#[error("type mismatch: expected {expected}, found {found}")]
	TypeMismatch {
		expected: &'static str,
		found: &'static str,
	},

	/// A byte that is not a known value tag.
	#[error("invalid value tag 0x{0:02x}")]
	InvalidTag(u8),

	/// A string back reference points past the strings seen so far.
	#[error("invalid string reference: {index} >= {table_len}")]
	InvalidStringRef { index: u64, table_len: usize },

	/// A varint ran past 64 bits.
	#[error("varint overflow: value exceeds 64 bits")]
	VarintOverflow,

	/// A string payload was not valid UTF-8.
	#[error("string payload is not valid UTF-8")]
	InvalidUtf8,

	/// A declared string or byte length is larger than the configured limit.
	#[error("string length {len} exceeds limit {limit}")]
	StringTooLong { len: u64, limit: u32 },

	/// Nested arrays, objects or tree nodes went deeper than the configured limit.
	#[error("nesting depth limit {limit} exceeded")]
	DepthLimitExceeded { limit: u32 },

	/// An object payload decoded to a value its type cannot represent.
	#[error("malformed {what} payload")]
	Malformed { what: &'static str },

	/// A writer is used again after one of its writes failed.
	#[error("writer was poisoned by an earlier failure")]
	Poisoned,

	/// Underlying sink or source failure.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl StreamError {
	/// Returns true if the stream was cut short rather than malformed.
	pub fn is_truncation(&self) -> bool {
		matches!(self, Self::UnexpectedEndOfStream { .. })
	}
}

/// Result type for object stream operations.
pub type Result<T> = std::result::Result<T, StreamError>;

/// Errors raised while loading a [`StreamConfig`](crate::StreamConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// A field parsed but holds a value the stream cannot honor.
	#[error("invalid value for `{field}`: {reason}")]
	InvalidValue {
		field: &'static str,
		reason: &'static str,
	},
}

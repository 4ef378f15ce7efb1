//! Stream configuration.
//!
//! Hosts either use [`StreamConfig::default`] or load overrides from a TOML
//! table:
//!
//! ```toml
//! intern-strings = true
//! max-depth = 256
//! max-string-len = 1048576
//! ```

use serde::Deserialize;

use crate::error::ConfigError;

/// Default nesting limit for arrays, objects and tree nodes.
pub const DEFAULT_MAX_DEPTH: u32 = 512;

/// Default upper bound on a decoded string or byte payload (16 MiB).
pub const DEFAULT_MAX_STRING_LEN: u32 = 16 * 1024 * 1024;

/// Options shared by [`ObjectWriter`](crate::ObjectWriter) and
/// [`ObjectReader`](crate::ObjectReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct StreamConfig {
	/// Replace repeated strings with back references on write.
	///
	/// Readers accept interned and plain strings regardless of this flag.
	pub intern_strings: bool,
	/// Maximum nesting depth on both write and read.
	pub max_depth: u32,
	/// Maximum declared length of a string or byte payload on read.
	pub max_string_len: u32,
}

impl Default for StreamConfig {
	fn default() -> Self {
		Self {
			intern_strings: true,
			max_depth: DEFAULT_MAX_DEPTH,
			max_string_len: DEFAULT_MAX_STRING_LEN,
		}
	}
}

impl StreamConfig {
	/// Parses a config from TOML, filling unset fields with defaults.
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(source)?;
		config.validate()?;
		Ok(config)
	}

	/// Rejects values no stream could be written or read with.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_depth == 0 {
			return Err(ConfigError::InvalidValue {
				field: "max-depth",
				reason: "must be at least 1",
			});
		}
		Ok(())
	}

	/// Returns a copy with string interning toggled.
	pub fn with_interning(mut self, on: bool) -> Self {
		self.intern_strings = on;
		self
	}

	/// Returns a copy with a different nesting limit.
	pub fn with_max_depth(mut self, depth: u32) -> Self {
		self.max_depth = depth;
		self
	}
}

//! Binary object streams.
//!
//! This crate provides the symmetric writer/reader pair used to persist
//! immutable object graphs:
//!
//! * [`ObjectWriter`] / [`ObjectReader`]: tagged scalars, strings, byte
//!   blobs, arrays and opaque objects over an exclusively borrowed sink or
//!   source
//! * [`MarkerRegistry`]: explicit [`TypeMarker`] to decoder table for
//!   opaque [`Writable`] objects
//! * [`VersionStamp`]: ordered recency marker that round-trips bit for bit
//! * [`StreamConfig`]: interning and limit settings, loadable from TOML
//!
//! # Format
//!
//! A stream is the [`header`] followed by values, each introduced by a
//! one-byte [`Tag`]. Lengths and indices are LEB128 [`varint`]s. Repeated
//! strings within one stream are written once and then referenced by
//! their interning slot; the cache belongs to the writer or reader, never
//! to the process.

pub mod codec;
mod config;
mod error;
pub mod header;
mod marker;
mod reader;
mod tag;
mod value;
pub mod varint;
mod version_stamp;
mod writer;

pub use codec::{Decode, Encode};
pub use config::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_STRING_LEN, StreamConfig};
pub use error::{ConfigError, Result, StreamError};
pub use marker::{DecodeFn, MarkerRegistry, Readable, TypeMarker, Writable};
pub use reader::{ObjectReader, from_bytes};
pub use tag::Tag;
pub use value::Value;
pub use version_stamp::VersionStamp;
pub use writer::{ObjectWriter, to_bytes};

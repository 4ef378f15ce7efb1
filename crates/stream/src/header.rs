//! Object stream header.
//!
//! Every stream opens with [`MAGIC`] followed by [`FORMAT_VERSION`] as a
//! little-endian `u32`. Readers validate the header before decoding any
//! value.

use std::mem::size_of;

use crate::error::{Result, StreamError};

/// Magic bytes identifying an arbor object stream.
pub const MAGIC: [u8; 4] = *b"ARBR";

/// Format version written by this build and the only one it reads.
pub const FORMAT_VERSION: u32 = 1;

/// Total header size in bytes (magic + version).
pub const HEADER_SIZE: usize = MAGIC.len() + size_of::<u32>();

/// Encodes the header for the current format version.
pub fn encode_header() -> [u8; HEADER_SIZE] {
	let mut header = [0u8; HEADER_SIZE];
	header[..4].copy_from_slice(&MAGIC);
	header[4..].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
	header
}

/// Validates a header read from the front of a stream.
pub fn validate_header(header: &[u8; HEADER_SIZE]) -> Result<()> {
	let mut magic = [0u8; 4];
	magic.copy_from_slice(&header[..4]);
	if magic != MAGIC {
		return Err(StreamError::InvalidMagic(magic));
	}

	let mut version = [0u8; 4];
	version.copy_from_slice(&header[4..]);
	let found = u32::from_le_bytes(version);
	if found != FORMAT_VERSION {
		return Err(StreamError::VersionMismatch {
			expected: FORMAT_VERSION,
			found,
		});
	}
	Ok(())
}

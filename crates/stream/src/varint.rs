//! Unsigned LEB128 varints.
//!
//! Each byte carries 7 bits of payload; a set high bit means more bytes
//! follow. Values below 128 take one byte.

use crate::error::{Result, StreamError};

/// Maximum bytes for a 64-bit varint (ceil(64/7) = 10).
pub const MAX_VARINT_BYTES: usize = 10;

/// Encodes `value` into `buf`, returning the number of bytes used.
pub fn encode_varint(mut value: u64, buf: &mut [u8; MAX_VARINT_BYTES]) -> usize {
	let mut i = 0;
	loop {
		let byte = (value & 0x7F) as u8;
		value >>= 7;
		if value == 0 {
			buf[i] = byte;
			return i + 1;
		}
		buf[i] = byte | 0x80;
		i += 1;
	}
}

/// Decodes a varint from the front of `buf`.
///
/// Returns the value and the number of bytes consumed. A buffer that ends
/// while the continuation bit is still set is a truncation.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize)> {
	let mut acc = VarintAccumulator::default();
	for (i, &byte) in buf.iter().enumerate() {
		if let Some(value) = acc.push(byte)? {
			return Ok((value, i + 1));
		}
	}
	Err(StreamError::UnexpectedEndOfStream {
		offset: buf.len() as u64,
	})
}

/// Number of bytes needed to encode `value`.
#[inline]
pub const fn varint_size(value: u64) -> usize {
	if value == 0 {
		return 1;
	}
	let bits = 64 - value.leading_zeros() as usize;
	bits.div_ceil(7)
}

/// Incremental decoder shared by slice and stream decoding.
#[derive(Debug, Default)]
pub(crate) struct VarintAccumulator {
	value: u64,
	shift: u32,
}

impl VarintAccumulator {
	/// Feeds one byte; returns the value once the final byte arrives.
	pub(crate) fn push(&mut self, byte: u8) -> Result<Option<u64>> {
		if self.shift >= 64 {
			return Err(StreamError::VarintOverflow);
		}
		let bits = u64::from(byte & 0x7F);
		if self.shift == 63 && bits > 1 {
			return Err(StreamError::VarintOverflow);
		}
		self.value |= bits << self.shift;
		if byte & 0x80 == 0 {
			return Ok(Some(self.value));
		}
		self.shift += 7;
		Ok(None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_single_byte_values() {
		let mut buf = [0u8; MAX_VARINT_BYTES];
		for value in 0..=127u64 {
			let len = encode_varint(value, &mut buf);
			assert_eq!(len, 1, "value {value} should be 1 byte");
			assert_eq!(decode_varint(&buf[..len]).unwrap(), (value, 1));
		}
	}

	#[test]
	fn test_boundary_values() {
		let mut buf = [0u8; MAX_VARINT_BYTES];
		for value in [128u64, 300, 16383, 16384, u32::MAX as u64, u64::MAX] {
			let len = encode_varint(value, &mut buf);
			assert_eq!(len, varint_size(value));
			let (decoded, consumed) = decode_varint(&buf[..len]).unwrap();
			assert_eq!(decoded, value, "roundtrip failed for {value}");
			assert_eq!(consumed, len);
		}
	}

	#[test]
	fn test_varint_size() {
		assert_eq!(varint_size(0), 1);
		assert_eq!(varint_size(127), 1);
		assert_eq!(varint_size(128), 2);
		assert_eq!(varint_size(16384), 3);
		assert_eq!(varint_size(u64::MAX), 10);
	}

	#[test]
	fn test_truncated_varint() {
		assert!(decode_varint(&[]).unwrap_err().is_truncation());
		assert!(decode_varint(&[0x80]).unwrap_err().is_truncation());
	}

	#[test]
	fn test_overflow_rejected() {
		let too_long = [0xFFu8; 11];
		assert!(matches!(
			decode_varint(&too_long),
			Err(StreamError::VarintOverflow)
		));
		let mut tenth_byte_too_big = [0xFFu8; 10];
		tenth_byte_too_big[9] = 0x02;
		assert!(matches!(
			decode_varint(&tenth_byte_too_big),
			Err(StreamError::VarintOverflow)
		));
	}
}

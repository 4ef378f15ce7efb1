//! Logical recency markers.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{Result, StreamError};
use crate::marker::{Readable, TypeMarker, Writable};
use crate::reader::ObjectReader;
use crate::writer::ObjectWriter;

/// Process-wide counter separating stamps created within one clock tick.
static GLOBAL_INCREMENT: AtomicU32 = AtomicU32::new(0);

fn next_global_increment() -> u32 {
	GLOBAL_INCREMENT.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
}

/// Opaque marker of when something last changed.
///
/// Stamps are totally ordered by wall-clock time, then by the local
/// increment (bumped when a newer stamp is derived within the same clock
/// tick), then by the process-global increment. They round-trip through an
/// object stream bit for bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionStamp {
	utc: DateTime<Utc>,
	local: u32,
	global: u32,
}

impl VersionStamp {
	/// The oldest possible stamp.
	pub const DEFAULT: VersionStamp = VersionStamp {
		utc: DateTime::<Utc>::UNIX_EPOCH,
		local: 0,
		global: 0,
	};

	/// Creates a stamp for the current instant.
	pub fn create() -> Self {
		Self::create_at(Utc::now())
	}

	/// Creates a stamp for a given instant.
	pub fn create_at(utc: DateTime<Utc>) -> Self {
		Self {
			utc,
			local: 0,
			global: next_global_increment(),
		}
	}

	/// Returns a stamp strictly newer than `self`.
	///
	/// If the clock has not moved past this stamp, the new stamp keeps this
	/// stamp's time and bumps the local increment. A saturated local
	/// increment moves the time forward by one nanosecond instead.
	pub fn get_newer_version(&self) -> Self {
		let now = Utc::now();
		let (utc, local) = if now > self.utc {
			(now, 0)
		} else if let Some(local) = self.local.checked_add(1) {
			(self.utc, local)
		} else {
			let utc = self
				.utc
				.checked_add_signed(TimeDelta::nanoseconds(1))
				.unwrap_or(self.utc);
			(utc, 0)
		};
		Self {
			utc,
			local,
			global: next_global_increment(),
		}
	}

	/// Returns a stamp strictly newer than both `self` and `other`.
	pub fn get_newer_version_than(&self, other: &VersionStamp) -> Self {
		(*self).newest(*other).get_newer_version()
	}

	/// Returns whichever of the two stamps is newer.
	pub fn newest(self, other: Self) -> Self {
		self.max(other)
	}

	/// Wall-clock component.
	pub fn utc(&self) -> DateTime<Utc> {
		self.utc
	}

	/// Writes the stamp's fields without an object header.
	pub fn write_fields(&self, writer: &mut ObjectWriter<'_>) -> Result<()> {
		writer.write_i64(self.utc.timestamp())?;
		writer.write_u32(self.utc.timestamp_subsec_nanos())?;
		writer.write_u32(self.local)?;
		writer.write_u32(self.global)
	}

	/// Reads fields written by [`write_fields`](Self::write_fields).
	pub fn read_fields(reader: &mut ObjectReader<'_>) -> Result<Self> {
		let seconds = reader.read_i64()?;
		let nanos = reader.read_u32()?;
		let local = reader.read_u32()?;
		let global = reader.read_u32()?;
		let utc = DateTime::<Utc>::from_timestamp(seconds, nanos).ok_or(StreamError::Malformed {
			what: "version stamp",
		})?;
		Ok(Self { utc, local, global })
	}
}

impl Default for VersionStamp {
	fn default() -> Self {
		Self::DEFAULT
	}
}

impl fmt::Display for VersionStamp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}-{}-{}", self.utc.to_rfc3339(), self.local, self.global)
	}
}

impl Writable for VersionStamp {
	fn type_marker(&self) -> TypeMarker {
		TypeMarker::VERSION_STAMP
	}

	fn write_to(&self, writer: &mut ObjectWriter<'_>) -> Result<()> {
		self.write_fields(writer)
	}
}

impl Readable for VersionStamp {
	const MARKER: TypeMarker = TypeMarker::VERSION_STAMP;

	fn read_from(reader: &mut ObjectReader<'_>) -> Result<Self> {
		Self::read_fields(reader)
	}
}

//! Type-marker dispatch for opaque objects.
//!
//! An opaque object is written as a [`TypeMarker`] followed by whatever its
//! [`Writable::write_to`] emits. Decoding goes through a [`MarkerRegistry`]
//! populated explicitly at startup, so the format never depends on runtime
//! type discovery.

use std::any::Any;
use std::fmt;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::reader::ObjectReader;
use crate::version_stamp::VersionStamp;
use crate::writer::ObjectWriter;

/// Stable numeric identifier selecting the decoder for an opaque object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeMarker(pub u16);

impl TypeMarker {
	/// Marker of [`VersionStamp`].
	pub const VERSION_STAMP: TypeMarker = TypeMarker(1);

	/// First marker value free for use outside this crate.
	pub const FIRST_EXTERNAL: u16 = 64;

	/// Creates a marker from its raw value.
	pub const fn new(raw: u16) -> Self {
		Self(raw)
	}

	/// Returns the raw value.
	#[inline]
	pub const fn as_u16(self) -> u16 {
		self.0
	}
}

impl fmt::Display for TypeMarker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeMarker({})", self.0)
	}
}

/// A value that can write itself into an object stream.
///
/// The writer does not need to know the concrete type; the marker tells the
/// reader which registered decoder rebuilds it.
pub trait Writable: Any + fmt::Debug + Send + Sync {
	/// Marker written ahead of the payload.
	fn type_marker(&self) -> TypeMarker;

	/// Writes the payload (everything after the marker).
	fn write_to(&self, writer: &mut ObjectWriter<'_>) -> Result<()>;
}

/// The decoding half of [`Writable`].
pub trait Readable: Writable + Sized {
	/// Marker this type is registered under.
	const MARKER: TypeMarker;

	/// Reads the payload written by [`Writable::write_to`].
	fn read_from(reader: &mut ObjectReader<'_>) -> Result<Self>;
}

/// Decoder stored per marker.
pub type DecodeFn = fn(&mut ObjectReader<'_>) -> Result<Box<dyn Writable>>;

#[derive(Clone, Copy)]
struct MarkerEntry {
	type_name: &'static str,
	decode: DecodeFn,
}

fn decode_boxed<T: Readable>(reader: &mut ObjectReader<'_>) -> Result<Box<dyn Writable>> {
	let value: Box<dyn Writable> = Box::new(T::read_from(reader)?);
	Ok(value)
}

static BUILTINS: Lazy<MarkerRegistry> = Lazy::new(MarkerRegistry::with_builtins);

/// Maps [`TypeMarker`]s to decode functions.
#[derive(Clone, Default)]
pub struct MarkerRegistry {
	entries: FxHashMap<TypeMarker, MarkerEntry>,
}

impl MarkerRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a registry holding the decoders this crate defines.
	pub fn with_builtins() -> Self {
		let mut registry = Self::new();
		registry.register::<VersionStamp>();
		registry
	}

	/// Shared registry holding only the builtin decoders.
	pub fn builtins() -> &'static MarkerRegistry {
		&BUILTINS
	}

	/// Registers `T` under [`Readable::MARKER`].
	///
	/// # Panics
	///
	/// Panics if the marker is already taken. Markers are assigned at
	/// composition time, so a clash is a programming error.
	pub fn register<T: Readable>(&mut self) -> &mut Self {
		let type_name = std::any::type_name::<T>();
		if let Some(existing) = self.entries.get(&T::MARKER) {
			panic!(
				"duplicate type marker {}: existing={} new={}",
				T::MARKER,
				existing.type_name,
				type_name
			);
		}
		self.entries.insert(
			T::MARKER,
			MarkerEntry {
				type_name,
				decode: decode_boxed::<T>,
			},
		);
		self
	}

	/// Returns true if `marker` has a decoder.
	pub fn contains(&self, marker: TypeMarker) -> bool {
		self.entries.contains_key(&marker)
	}

	/// Returns the Rust type name registered under `marker`.
	pub fn type_name(&self, marker: TypeMarker) -> Option<&'static str> {
		self.entries.get(&marker).map(|e| e.type_name)
	}

	/// Number of registered markers.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub(crate) fn decoder(&self, marker: TypeMarker) -> Option<DecodeFn> {
		self.entries.get(&marker).map(|e| e.decode)
	}
}

impl fmt::Debug for MarkerRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut markers: Vec<_> = self.entries.iter().map(|(m, e)| (m.0, e.type_name)).collect();
		markers.sort_unstable();
		f.debug_struct("MarkerRegistry").field("markers", &markers).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug)]
	struct Clash;

	impl Writable for Clash {
		fn type_marker(&self) -> TypeMarker {
			TypeMarker::VERSION_STAMP
		}

		fn write_to(&self, _writer: &mut ObjectWriter<'_>) -> Result<()> {
			Ok(())
		}
	}

	impl Readable for Clash {
		const MARKER: TypeMarker = TypeMarker::VERSION_STAMP;

		fn read_from(_reader: &mut ObjectReader<'_>) -> Result<Self> {
			Ok(Clash)
		}
	}

	#[test]
	fn test_builtins_contain_version_stamp() {
		let registry = MarkerRegistry::builtins();
		assert!(registry.contains(TypeMarker::VERSION_STAMP));
		assert!(registry.type_name(TypeMarker::VERSION_STAMP).unwrap().ends_with("VersionStamp"));
		assert!(!registry.contains(TypeMarker::new(TypeMarker::FIRST_EXTERNAL)));
	}

	#[test]
	#[should_panic(expected = "duplicate type marker")]
	fn test_duplicate_marker_panics() {
		MarkerRegistry::with_builtins().register::<Clash>();
	}
}

//! Out-of-band annotations and the per-node annotation set.
//!
//! An [`Annotation`] is an immutable value: a kind plus a string map. Two
//! annotations are equal when kind and payload match, regardless of which
//! allocation they live in. [`Annotation::is_same_instance`] answers the
//! narrower same-process question "is this literally the object I
//! attached".

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use arbor_stream::{ObjectReader, ObjectWriter, Readable, TypeMarker, Writable};
use smallvec::SmallVec;

#[derive(Clone, PartialEq, Eq, Hash)]
struct AnnotationData {
	kind: Box<str>,
	data: BTreeMap<String, String>,
}

/// Immutable, kind-tagged metadata attachable to a syntax node.
#[derive(Clone)]
pub struct Annotation(Arc<AnnotationData>);

impl Annotation {
	/// Object stream marker of an annotation.
	pub const MARKER: TypeMarker = TypeMarker::new(TypeMarker::FIRST_EXTERNAL);

	/// Creates an annotation with an empty payload.
	pub fn new(kind: impl Into<Box<str>>) -> Self {
		Self(Arc::new(AnnotationData {
			kind: kind.into(),
			data: BTreeMap::new(),
		}))
	}

	/// Creates an annotation from a kind and key/value pairs.
	pub fn from_parts<K, V, I>(kind: impl Into<Box<str>>, data: I) -> Self
	where
		K: Into<String>,
		V: Into<String>,
		I: IntoIterator<Item = (K, V)>,
	{
		Self(Arc::new(AnnotationData {
			kind: kind.into(),
			data: data.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
		}))
	}

	/// Returns a copy with one payload entry set.
	pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		Arc::make_mut(&mut self.0).data.insert(key.into(), value.into());
		self
	}

	pub fn kind(&self) -> &str {
		&self.0.kind
	}

	pub fn data(&self) -> &BTreeMap<String, String> {
		&self.0.data
	}

	/// Returns one payload value.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.data.get(key).map(String::as_str)
	}

	/// Returns true if both handles point at the same allocation.
	pub fn is_same_instance(&self, other: &Annotation) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl PartialEq for Annotation {
	fn eq(&self, other: &Self) -> bool {
		self.is_same_instance(other) || self.0 == other.0
	}
}

impl Eq for Annotation {}

impl Hash for Annotation {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.hash(state);
	}
}

impl fmt::Debug for Annotation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Annotation")
			.field("kind", &self.kind())
			.field("data", self.data())
			.finish()
	}
}

impl Writable for Annotation {
	fn type_marker(&self) -> TypeMarker {
		Self::MARKER
	}

	fn write_to(&self, writer: &mut ObjectWriter<'_>) -> arbor_stream::Result<()> {
		writer.write_string(self.kind())?;
		writer.write_varint(self.0.data.len() as u64)?;
		for (key, value) in &self.0.data {
			writer.write_string(key)?;
			writer.write_string(value)?;
		}
		Ok(())
	}
}

impl Readable for Annotation {
	const MARKER: TypeMarker = Annotation::MARKER;

	fn read_from(reader: &mut ObjectReader<'_>) -> arbor_stream::Result<Self> {
		let kind = reader.read_string()?;
		let len = reader.read_varint()?;
		let mut data = BTreeMap::new();
		for _ in 0..len {
			let key = reader.read_string()?;
			let value = reader.read_string()?;
			data.insert(key, value);
		}
		Ok(Self(Arc::new(AnnotationData {
			kind: kind.into(),
			data,
		})))
	}
}

/// Unordered set of annotations on one node.
///
/// Holds at most one annotation per value; several annotations of the same
/// kind may coexist when their payloads differ.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet {
	items: SmallVec<[Annotation; 2]>,
}

impl AnnotationSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Annotation> + '_ {
		self.items.iter()
	}

	/// Annotations of one kind, in attach order.
	pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Annotation> + 'a {
		self.items.iter().filter(move |a| a.kind() == kind)
	}

	pub fn contains_kind(&self, kind: &str) -> bool {
		self.items.iter().any(|a| a.kind() == kind)
	}

	/// Value membership.
	pub fn contains(&self, annotation: &Annotation) -> bool {
		self.items.iter().any(|a| a == annotation)
	}

	/// Identity membership.
	pub fn contains_instance(&self, annotation: &Annotation) -> bool {
		self.items.iter().any(|a| a.is_same_instance(annotation))
	}

	/// Adds an annotation; returns false if an equal one is already present.
	pub fn insert(&mut self, annotation: Annotation) -> bool {
		if self.contains(&annotation) {
			return false;
		}
		self.items.push(annotation);
		true
	}

	/// Drops every annotation of `kind`; returns how many were removed.
	pub fn remove_kind(&mut self, kind: &str) -> usize {
		let before = self.items.len();
		self.items.retain(|a| a.kind() != kind);
		before - self.items.len()
	}

	/// Set equality, ignoring attach order.
	pub fn same_members(&self, other: &AnnotationSet) -> bool {
		self.len() == other.len() && self.items.iter().all(|a| other.contains(a))
	}
}

impl fmt::Debug for AnnotationSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.items.iter()).finish()
	}
}

impl FromIterator<Annotation> for AnnotationSet {
	fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
		let mut set = Self::new();
		for annotation in iter {
			set.insert(annotation);
		}
		set
	}
}

impl<'a> IntoIterator for &'a AnnotationSet {
	type Item = &'a Annotation;
	type IntoIter = std::slice::Iter<'a, Annotation>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.iter()
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	#[test]
	fn test_value_equality_ignores_instance() {
		let a = Annotation::new("Rename").with_data("to", "Bar");
		let b = Annotation::from_parts("Rename", [("to", "Bar")]);
		assert_eq!(a, b);
		assert!(!a.is_same_instance(&b));
		assert!(a.is_same_instance(&a.clone()));
	}

	#[test]
	fn test_payload_order_is_insignificant() {
		let a = Annotation::new("K").with_data("x", "1").with_data("y", "2");
		let b = Annotation::new("K").with_data("y", "2").with_data("x", "1");
		assert_eq!(a, b);
	}

	#[test]
	fn test_with_data_on_shared_annotation_copies() {
		let original = Annotation::new("K").with_data("x", "1");
		let alias = original.clone();
		let changed = alias.with_data("x", "2");
		assert_eq!(original.get("x"), Some("1"));
		assert_eq!(changed.get("x"), Some("2"));
	}

	#[test]
	fn test_set_semantics() {
		let mut set = AnnotationSet::new();
		assert!(set.insert(Annotation::new("A")));
		assert!(!set.insert(Annotation::new("A")));
		assert!(set.insert(Annotation::new("A").with_data("n", "2")));
		assert_eq!(set.len(), 2);
		assert_eq!(set.of_kind("A").count(), 2);
		assert_eq!(set.remove_kind("A"), 2);
		assert!(set.is_empty());
	}

	#[test]
	fn test_same_members_ignores_order() {
		let a: AnnotationSet = [Annotation::new("A"), Annotation::new("B")].into_iter().collect();
		let b: AnnotationSet = [Annotation::new("B"), Annotation::new("A")].into_iter().collect();
		assert!(a.same_members(&b));
		assert_ne!(a, b);
	}

	proptest! {
		#[test]
		fn prop_set_ignores_insertion_order(kinds in prop::collection::vec("[a-c]", 0..8)) {
			let forward: AnnotationSet = kinds.iter().map(|k| Annotation::new(k.as_str())).collect();
			let backward: AnnotationSet = kinds.iter().rev().map(|k| Annotation::new(k.as_str())).collect();
			prop_assert!(forward.same_members(&backward));
			prop_assert!(forward.len() <= 3);
		}
	}
}

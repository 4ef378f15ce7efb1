//! Immutable syntax nodes and tokens.
//!
//! Nodes are reference counted and never mutated: every `with_*` method
//! returns a new node that shares its children with the original.
//! Equality and hashing are structural (kind, children, token text);
//! annotations do not take part.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::annotation::{Annotation, AnnotationSet};
use crate::error::{Result, SyntaxError};
use crate::kind::SyntaxKind;

/// Leaf of a syntax tree.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SyntaxToken {
	kind: SyntaxKind,
	text: Arc<str>,
}

impl SyntaxToken {
	pub fn new(kind: SyntaxKind, text: impl Into<Arc<str>>) -> Self {
		Self {
			kind,
			text: text.into(),
		}
	}

	pub fn kind(&self) -> SyntaxKind {
		self.kind
	}

	pub fn text(&self) -> &str {
		&self.text
	}
}

impl fmt::Debug for SyntaxToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}@{:?}", self.kind.0, self.text)
	}
}

/// Child of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyntaxElement {
	Node(SyntaxNode),
	Token(SyntaxToken),
}

impl SyntaxElement {
	pub fn kind(&self) -> SyntaxKind {
		match self {
			Self::Node(node) => node.kind(),
			Self::Token(token) => token.kind(),
		}
	}

	pub fn as_node(&self) -> Option<&SyntaxNode> {
		match self {
			Self::Node(node) => Some(node),
			Self::Token(_) => None,
		}
	}

	pub fn as_token(&self) -> Option<&SyntaxToken> {
		match self {
			Self::Token(token) => Some(token),
			Self::Node(_) => None,
		}
	}
}

impl From<SyntaxNode> for SyntaxElement {
	fn from(node: SyntaxNode) -> Self {
		Self::Node(node)
	}
}

impl From<SyntaxToken> for SyntaxElement {
	fn from(token: SyntaxToken) -> Self {
		Self::Token(token)
	}
}

pub(crate) struct NodeData {
	kind: SyntaxKind,
	children: Box<[SyntaxElement]>,
	annotations: AnnotationSet,
	/// True if this node or any descendant carries an annotation.
	contains_annotations: bool,
}

/// Interior node of a syntax tree.
#[derive(Clone)]
pub struct SyntaxNode(Arc<NodeData>);

impl SyntaxNode {
	/// Creates an unannotated node.
	pub fn new(kind: SyntaxKind, children: impl IntoIterator<Item = SyntaxElement>) -> Self {
		Self::from_parts(kind, children.into_iter().collect(), AnnotationSet::new())
	}

	fn from_parts(kind: SyntaxKind, children: Box<[SyntaxElement]>, annotations: AnnotationSet) -> Self {
		let contains_annotations = !annotations.is_empty()
			|| children
				.iter()
				.any(|c| c.as_node().is_some_and(SyntaxNode::contains_annotations));
		Self(Arc::new(NodeData {
			kind,
			children,
			annotations,
			contains_annotations,
		}))
	}

	fn with_annotation_set(&self, annotations: AnnotationSet) -> Self {
		Self::from_parts(self.kind(), self.0.children.clone(), annotations)
	}

	pub fn kind(&self) -> SyntaxKind {
		self.0.kind
	}

	pub fn children(&self) -> &[SyntaxElement] {
		&self.0.children
	}

	pub fn child_nodes(&self) -> impl DoubleEndedIterator<Item = &SyntaxNode> + '_ {
		self.0.children.iter().filter_map(SyntaxElement::as_node)
	}

	/// This node and every node below it, in pre-order.
	pub fn descendants(&self) -> impl Iterator<Item = SyntaxNode> {
		let mut stack = vec![self.clone()];
		std::iter::from_fn(move || {
			let node = stack.pop()?;
			stack.extend(node.child_nodes().rev().cloned());
			Some(node)
		})
	}

	/// Concatenated token text of the subtree.
	pub fn text(&self) -> String {
		let mut out = String::new();
		self.push_text(&mut out);
		out
	}

	fn push_text(&self, out: &mut String) {
		for child in self.children() {
			match child {
				SyntaxElement::Node(node) => node.push_text(out),
				SyntaxElement::Token(token) => out.push_str(token.text()),
			}
		}
	}

	/// Returns true if both handles point at the same node allocation.
	pub fn ptr_eq(&self, other: &SyntaxNode) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	pub(crate) fn identity(&self) -> usize {
		Arc::as_ptr(&self.0) as usize
	}

	pub fn annotations(&self) -> &AnnotationSet {
		&self.0.annotations
	}

	pub fn annotations_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Annotation> + 'a {
		self.0.annotations.of_kind(kind)
	}

	/// Returns true if this node carries an annotation of `kind`.
	pub fn has_annotations(&self, kind: &str) -> bool {
		self.0.annotations.contains_kind(kind)
	}

	/// Returns true if this node carries an annotation equal to `annotation`.
	///
	/// Holds across serialization: a deserialized node answers true for the
	/// annotation attached before writing.
	pub fn has_annotation(&self, annotation: &Annotation) -> bool {
		self.0.annotations.contains(annotation)
	}

	/// Returns true if this node carries this exact annotation object.
	pub fn has_annotation_instance(&self, annotation: &Annotation) -> bool {
		self.0.annotations.contains_instance(annotation)
	}

	/// Returns true if this node or any descendant is annotated.
	pub fn contains_annotations(&self) -> bool {
		self.0.contains_annotations
	}

	/// Returns a node with `annotations` added. Annotations equal to one
	/// already attached are skipped.
	pub fn with_additional_annotations(&self, annotations: impl IntoIterator<Item = Annotation>) -> Self {
		let mut set = self.0.annotations.clone();
		let mut changed = false;
		for annotation in annotations {
			changed |= set.insert(annotation);
		}
		if changed {
			self.with_annotation_set(set)
		} else {
			self.clone()
		}
	}

	/// Returns a node where `annotation` replaces every annotation of its kind.
	pub fn with_unique_annotation(&self, annotation: Annotation) -> Self {
		let mut set = self.0.annotations.clone();
		set.remove_kind(annotation.kind());
		set.insert(annotation);
		self.with_annotation_set(set)
	}

	/// Attaches `annotation` unless a different annotation of the same kind
	/// is already present. Re-attaching an equal annotation is a no-op.
	pub fn try_with_exclusive_annotation(&self, annotation: Annotation) -> Result<Self> {
		if self.has_annotation(&annotation) {
			return Ok(self.clone());
		}
		if self.has_annotations(annotation.kind()) {
			return Err(SyntaxError::DuplicateAnnotationKind {
				kind: annotation.kind().to_owned(),
			});
		}
		Ok(self.with_additional_annotations([annotation]))
	}

	/// Returns a node without any annotation of `kind`.
	pub fn without_annotations(&self, kind: &str) -> Self {
		if !self.has_annotations(kind) {
			return self.clone();
		}
		let mut set = self.0.annotations.clone();
		set.remove_kind(kind);
		self.with_annotation_set(set)
	}

	/// Nodes in this subtree carrying an annotation of `kind`, in pre-order.
	pub fn annotated_descendants<'a>(&self, kind: &'a str) -> impl Iterator<Item = SyntaxNode> + 'a {
		let mut stack = vec![self.clone()];
		std::iter::from_fn(move || {
			while let Some(node) = stack.pop() {
				if !node.contains_annotations() {
					continue;
				}
				stack.extend(node.child_nodes().rev().cloned());
				if node.has_annotations(kind) {
					return Some(node);
				}
			}
			None
		})
	}
}

impl PartialEq for SyntaxNode {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other) || (self.kind() == other.kind() && self.children() == other.children())
	}
}

impl Eq for SyntaxNode {}

impl Hash for SyntaxNode {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.kind().hash(state);
		self.children().hash(state);
	}
}

impl fmt::Debug for SyntaxNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut s = f.debug_struct("SyntaxNode");
		s.field("kind", &self.kind().0);
		if !self.annotations().is_empty() {
			s.field("annotations", self.annotations());
		}
		s.field("children", &self.children()).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const ROOT: SyntaxKind = SyntaxKind(1);
	const LEAF: SyntaxKind = SyntaxKind(2);
	const IDENT: SyntaxKind = SyntaxKind(3);

	fn leaf(text: &str) -> SyntaxNode {
		SyntaxNode::new(LEAF, [SyntaxToken::new(IDENT, text).into()])
	}

	#[test]
	fn test_structural_equality_ignores_annotations() {
		let plain = leaf("x");
		let annotated = plain.with_additional_annotations([Annotation::new("A")]);
		assert_eq!(plain, annotated);
		assert!(!plain.ptr_eq(&annotated));
		assert_ne!(leaf("x"), leaf("y"));
	}

	#[test]
	fn test_contains_annotations_propagates_up() {
		let child = leaf("x").with_additional_annotations([Annotation::new("A")]);
		let root = SyntaxNode::new(ROOT, [child.into(), leaf("y").into()]);
		assert!(root.contains_annotations());
		assert!(!root.has_annotations("A"));
		assert!(!leaf("y").contains_annotations());
	}

	#[test]
	fn test_duplicate_instance_is_no_op() {
		let a = Annotation::new("A");
		let once = leaf("x").with_additional_annotations([a.clone()]);
		let twice = once.with_additional_annotations([a.clone(), Annotation::new("A")]);
		assert!(twice.ptr_eq(&once));
		assert_eq!(twice.annotations().len(), 1);
		assert!(twice.has_annotation_instance(&a));
	}

	#[test]
	fn test_unique_annotation_replaces_kind() {
		let node = leaf("x")
			.with_additional_annotations([
				Annotation::new("A").with_data("v", "1"),
				Annotation::new("A").with_data("v", "2"),
				Annotation::new("B"),
			])
			.with_unique_annotation(Annotation::new("A").with_data("v", "3"));
		let values: Vec<_> = node.annotations_of_kind("A").filter_map(|a| a.get("v")).collect();
		assert_eq!(values, ["3"]);
		assert!(node.has_annotations("B"));
	}

	#[test]
	fn test_exclusive_annotation() {
		let first = Annotation::new("A").with_data("v", "1");
		let node = leaf("x").try_with_exclusive_annotation(first.clone()).unwrap();
		assert!(node.try_with_exclusive_annotation(first).unwrap().ptr_eq(&node));
		assert!(matches!(
			node.try_with_exclusive_annotation(Annotation::new("A").with_data("v", "2")),
			Err(SyntaxError::DuplicateAnnotationKind { kind }) if kind == "A"
		));
	}

	#[test]
	fn test_without_annotations() {
		let node = leaf("x").with_additional_annotations([Annotation::new("A"), Annotation::new("B")]);
		let stripped = node.without_annotations("A");
		assert!(!stripped.has_annotations("A"));
		assert!(stripped.has_annotations("B"));
		assert!(node.has_annotations("A"));
	}

	#[test]
	fn test_descendants_pre_order() {
		let a = leaf("a");
		let b = leaf("b");
		let root = SyntaxNode::new(ROOT, [a.clone().into(), b.clone().into()]);
		let order: Vec<_> = root.descendants().map(|n| n.text()).collect();
		assert_eq!(order, ["ab", "a", "b"]);
	}

	#[test]
	fn test_annotated_descendants() {
		let marked = leaf("b").with_additional_annotations([Annotation::new("Mark")]);
		let root = SyntaxNode::new(ROOT, [leaf("a").into(), marked.clone().into()])
			.with_additional_annotations([Annotation::new("Mark")]);
		let found: Vec<_> = root.annotated_descendants("Mark").collect();
		assert_eq!(found.len(), 2);
		assert!(found[0].ptr_eq(&root));
		assert!(found[1].ptr_eq(&marked));
	}
}

use std::collections::HashMap;

use arbor_stream::Tag;
use arbor_syntax::{
	Annotation, SemanticContext, Symbol, SymbolAnnotation, SymbolAnnotationError, SymbolId, SyntaxElement, SyntaxKind,
	SyntaxNode, SyntaxToken, TreeSerializer,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const ROOT: SyntaxKind = SyntaxKind(1);
const LEAF: SyntaxKind = SyntaxKind(2);
const IDENT: SyntaxKind = SyntaxKind(3);

#[derive(Debug, Clone, PartialEq)]
struct MethodSymbol {
	name: String,
	id: SymbolId,
}

impl Symbol for MethodSymbol {
	fn name(&self) -> &str {
		&self.name
	}

	fn symbol_id(&self) -> Option<SymbolId> {
		Some(self.id.clone())
	}
}

#[derive(Default)]
struct Compilation {
	symbols: HashMap<SymbolId, MethodSymbol>,
}

impl Compilation {
	fn declare(&mut self, name: &str, id: &str) -> MethodSymbol {
		let symbol = MethodSymbol {
			name: name.to_owned(),
			id: SymbolId::from(id),
		};
		self.symbols.insert(symbol.id.clone(), symbol.clone());
		symbol
	}
}

impl SemanticContext for Compilation {
	type Symbol = MethodSymbol;

	fn lookup_symbol_by_id(&self, id: &SymbolId) -> Option<MethodSymbol> {
		self.symbols.get(id).cloned()
	}
}

fn leaf(text: &str) -> SyntaxNode {
	SyntaxNode::new(LEAF, [SyntaxToken::new(IDENT, text).into()])
}

fn serialize(node: &SyntaxNode) -> Vec<u8> {
	let mut buf = Vec::new();
	node.serialize_to(&mut buf).unwrap();
	buf
}

fn deserialize(bytes: &[u8]) -> SyntaxNode {
	SyntaxNode::deserialize_from(&mut &bytes[..]).unwrap()
}

fn assert_annotations_preserved(original: &SyntaxNode, back: &SyntaxNode) {
	let originals: Vec<_> = original.descendants().collect();
	let backs: Vec<_> = back.descendants().collect();
	assert_eq!(originals.len(), backs.len());
	for (a, b) in originals.iter().zip(&backs) {
		assert!(
			a.annotations().same_members(b.annotations()),
			"{:?} vs {:?}",
			a.annotations(),
			b.annotations()
		);
		assert_eq!(a.contains_annotations(), b.contains_annotations());
	}
}

#[test]
fn symbol_annotation_survives_round_trip() {
	let mut compilation = Compilation::default();
	let method = compilation.declare("M", "C.M()");

	let annotation = SymbolAnnotation::create(&method).unwrap();
	let annotated_leaf = leaf("M").with_additional_annotations([annotation.clone()]);
	let root = SyntaxNode::new(ROOT, [annotated_leaf.into()]);
	assert!(root.contains_annotations());

	let back = deserialize(&serialize(&root));
	assert!(!back.ptr_eq(&root));
	assert_eq!(back, root);
	assert!(back.contains_annotations());

	let back_leaf = back.child_nodes().next().unwrap();
	assert!(back_leaf.has_annotations(SymbolAnnotation::KIND));
	assert!(back_leaf.has_annotation(&annotation));
	assert!(!back_leaf.has_annotation_instance(&annotation));

	let restored: Vec<_> = back_leaf.annotations_of_kind(SymbolAnnotation::KIND).collect();
	assert_eq!(restored.len(), 1);
	assert_eq!(restored[0], &annotation);
	assert!(!restored[0].is_same_instance(&annotation));

	let resolved = SymbolAnnotation::resolve(restored[0], &compilation).unwrap();
	assert_eq!(resolved, method);
	assert_eq!(resolved.symbol_id().unwrap().as_str(), "C.M()");
}

#[test]
fn symbol_annotation_in_unrelated_context_is_not_found() {
	let mut first = Compilation::default();
	let method = first.declare("M", "C.M()");
	let mut second = Compilation::default();
	second.declare("N", "C.N()");

	let root = SyntaxNode::new(
		ROOT,
		[leaf("M")
			.with_additional_annotations([SymbolAnnotation::create(&method).unwrap()])
			.into()],
	);
	let back = deserialize(&serialize(&root));
	let found: Vec<_> = back.annotated_descendants(SymbolAnnotation::KIND).collect();
	assert_eq!(found.len(), 1);

	let results = SymbolAnnotation::resolve_all(&found[0], &second);
	assert_eq!(
		results,
		vec![Err(SymbolAnnotationError::SymbolNotFound {
			id: SymbolId::from("C.M()")
		})]
	);

	// Same annotation, other context.
	assert_eq!(SymbolAnnotation::resolve_all(&found[0], &first), vec![Ok(method)]);
}

#[test]
fn unannotated_node_costs_one_zero_count() {
	let bytes = serialize(&leaf("x"));
	assert_eq!(&bytes[bytes.len() - 2..], &[Tag::Varint as u8, 0]);
}

#[test]
fn serialization_is_deterministic() {
	let root = SyntaxNode::new(
		ROOT,
		[
			leaf("a").with_additional_annotations([Annotation::new("A").with_data("k", "v")]).into(),
			leaf("a").into(),
			SyntaxToken::new(IDENT, ";").into(),
		],
	);
	assert_eq!(serialize(&root), serialize(&root));
	assert_eq!(serialize(&root), serialize(&deserialize(&serialize(&root))));
}

#[test]
fn truncated_stream_never_yields_a_tree() {
	let root = SyntaxNode::new(
		ROOT,
		[
			leaf("first")
				.with_additional_annotations([Annotation::new("A").with_data("key", "value")])
				.into(),
			leaf("second").into(),
		],
	)
	.with_additional_annotations([Annotation::new("B")]);
	let bytes = serialize(&root);

	for cut in 0..bytes.len() {
		let err = SyntaxNode::deserialize_from(&mut &bytes[..cut]).unwrap_err();
		assert!(err.is_truncation(), "cut at {cut}: {err:?}");
	}
}

#[test]
fn repeated_token_text_is_interned() {
	let root = SyntaxNode::new(ROOT, (0..16).map(|_| leaf("identifier").into()));
	let interned = serialize(&root);

	let plain_serializer =
		TreeSerializer::new().with_config(arbor_stream::StreamConfig::default().with_interning(false));
	let mut plain = Vec::new();
	plain_serializer.serialize(&root, &mut plain).unwrap();

	assert!(interned.len() < plain.len());
	assert_eq!(deserialize(&interned), deserialize(&plain));
}

fn arb_annotation() -> impl Strategy<Value = Annotation> {
	(
		prop::sample::select(vec!["A", "B", "SymbolId"]),
		prop::collection::btree_map("[a-c]", "[a-z]{0,3}", 0..3),
	)
		.prop_map(|(kind, data)| Annotation::from_parts(kind, data))
}

fn arb_tree() -> impl Strategy<Value = SyntaxNode> {
	let annotations = prop::collection::vec(arb_annotation(), 0..3);
	let leaves = ("[a-z]{0,6}", annotations)
		.prop_map(|(text, annotations)| leaf(&text).with_additional_annotations(annotations));
	leaves.prop_recursive(4, 32, 4, move |inner| {
		(
			prop::collection::vec(
				prop_oneof![
					inner.prop_map(SyntaxElement::from),
					"[a-z]{1,3}".prop_map(|t| SyntaxElement::from(SyntaxToken::new(IDENT, t))),
				],
				0..4,
			),
			prop::collection::vec(arb_annotation(), 0..3),
		)
			.prop_map(|(children, annotations)| {
				SyntaxNode::new(ROOT, children).with_additional_annotations(annotations)
			})
	})
}

proptest! {
	#[test]
	fn prop_tree_round_trip(tree in arb_tree()) {
		let back = deserialize(&serialize(&tree));
		prop_assert_eq!(&back, &tree);
		prop_assert_eq!(back.text(), tree.text());
		assert_annotations_preserved(&tree, &back);
	}
}

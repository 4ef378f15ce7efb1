use std::cell::Cell;

use arbor_stream::{StreamConfig, StreamError, to_bytes};
use pretty_assertions::assert_eq;

use super::*;
use crate::node::SyntaxToken;

const ROOT: SyntaxKind = SyntaxKind(1);
const LEAF: SyntaxKind = SyntaxKind(2);
const IDENT: SyntaxKind = SyntaxKind(3);

fn leaf(text: &str) -> SyntaxNode {
	SyntaxNode::new(LEAF, [SyntaxToken::new(IDENT, text).into()])
}

fn round_trip(serializer: &TreeSerializer<impl NodeFactory>, node: &SyntaxNode) -> SyntaxNode {
	let mut buf = Vec::new();
	serializer.serialize(node, &mut buf).unwrap();
	serializer.deserialize(&mut buf.as_slice()).unwrap()
}

#[test]
fn test_shared_subtree_is_decoded_once() {
	let shared = leaf("x").with_additional_annotations([Annotation::new("A")]);
	let root = SyntaxNode::new(ROOT, [shared.clone().into(), shared.into()]);

	let back = round_trip(&TreeSerializer::new(), &root);
	let children: Vec<_> = back.child_nodes().collect();
	assert_eq!(children.len(), 2);
	assert!(children[0].ptr_eq(children[1]));
	assert!(children[0].has_annotations("A"));
	assert_eq!(back, root);
}

#[test]
fn test_shared_subtree_is_written_once() {
	let shared = SyntaxNode::new(ROOT, (0..8).map(|i| leaf(&format!("name{i}")).into()));
	let once = SyntaxNode::new(ROOT, [shared.clone().into()]);
	let twice = SyntaxNode::new(ROOT, [shared.clone().into(), shared.into()]);

	let mut a = Vec::new();
	let mut b = Vec::new();
	once.serialize_to(&mut a).unwrap();
	twice.serialize_to(&mut b).unwrap();
	// One extra record tag plus one back-reference varint.
	assert!(b.len() - a.len() <= 8, "{} vs {}", a.len(), b.len());
}

#[test]
fn test_factory_builds_every_element() {
	#[derive(Default)]
	struct Counting {
		nodes: Cell<usize>,
		tokens: Cell<usize>,
	}

	impl NodeFactory for Counting {
		fn create_node(&self, kind: SyntaxKind, children: Vec<SyntaxElement>) -> SyntaxNode {
			self.nodes.set(self.nodes.get() + 1);
			SyntaxNode::new(kind, children)
		}

		fn create_token(&self, kind: SyntaxKind, text: Arc<str>) -> SyntaxToken {
			self.tokens.set(self.tokens.get() + 1);
			SyntaxToken::new(kind, text)
		}
	}

	let counting = Counting::default();
	let serializer = TreeSerializer::with_factory(&counting);
	let root = SyntaxNode::new(ROOT, [leaf("a").into(), leaf("b").into()]);
	assert_eq!(round_trip(&serializer, &root), root);
	assert_eq!(counting.nodes.get(), 3);
	assert_eq!(counting.tokens.get(), 2);
}

#[test]
fn test_invalid_record() {
	let bytes = to_bytes(StreamConfig::default(), |w| w.write_u8(9)).unwrap();
	let err = TreeSerializer::new().deserialize(&mut bytes.as_slice()).unwrap_err();
	assert!(matches!(err, SyntaxError::InvalidRecord(9)), "{err:?}");
}

#[test]
fn test_invalid_back_reference() {
	let bytes = to_bytes(StreamConfig::default(), |w| {
		w.write_u8(RECORD_NODE)?;
		w.write_u16(ROOT.as_u16())?;
		w.write_varint(1)?;
		w.write_u8(RECORD_SHARED)?;
		w.write_varint(3)
	})
	.unwrap();
	let err = TreeSerializer::new().deserialize(&mut bytes.as_slice()).unwrap_err();
	assert!(
		matches!(err, SyntaxError::InvalidBackReference { index: 3, available: 0 }),
		"{err:?}"
	);
}

#[test]
fn test_depth_limit_applies_both_ways() {
	let mut deep = leaf("x");
	for _ in 0..10 {
		deep = SyntaxNode::new(ROOT, [deep.into()]);
	}

	let strict = TreeSerializer::new().with_config(StreamConfig::default().with_max_depth(4));
	let err = strict.serialize(&deep, &mut Vec::new()).unwrap_err();
	assert!(matches!(err, SyntaxError::Stream(StreamError::DepthLimitExceeded { limit: 4 })));

	let mut buf = Vec::new();
	TreeSerializer::new().serialize(&deep, &mut buf).unwrap();
	let err = strict.deserialize(&mut buf.as_slice()).unwrap_err();
	assert!(matches!(err, SyntaxError::Stream(StreamError::DepthLimitExceeded { limit: 4 })));
}

#[test]
fn test_foreign_object_in_annotation_slot() {
	let bytes = to_bytes(StreamConfig::default(), |w| {
		w.write_u8(RECORD_NODE)?;
		w.write_u16(ROOT.as_u16())?;
		w.write_varint(0)?;
		w.write_varint(1)?;
		w.write_object(&arbor_stream::VersionStamp::DEFAULT)
	})
	.unwrap();
	let err = TreeSerializer::new().deserialize(&mut bytes.as_slice()).unwrap_err();
	assert!(
		matches!(err, SyntaxError::Stream(StreamError::TypeMismatch { .. })),
		"{err:?}"
	);
}

#[test]
fn test_over_limit_token_fails_on_write() {
	let config = StreamConfig {
		max_string_len: 8,
		..StreamConfig::default()
	};
	let serializer = TreeSerializer::new().with_config(config);
	let root = SyntaxNode::new(ROOT, [leaf("0123456789abcdef").into()]);
	let err = serializer.serialize(&root, &mut Vec::new()).unwrap_err();
	assert!(
		matches!(err, SyntaxError::Stream(StreamError::StringTooLong { len: 16, limit: 8 })),
		"{err:?}"
	);

	let fits = SyntaxNode::new(ROOT, [leaf("01234567").into()]);
	assert_eq!(round_trip(&serializer, &fits), fits);
}

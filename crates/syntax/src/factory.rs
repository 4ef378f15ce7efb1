use std::sync::Arc;

use crate::kind::SyntaxKind;
use crate::node::{SyntaxElement, SyntaxNode, SyntaxToken};

/// Builds nodes and tokens for the tree deserializer.
///
/// Hosts with their own node invariants plug in here. The deserializer
/// trusts the serialized shape; factories are not expected to re-validate
/// semantics.
pub trait NodeFactory {
	fn create_node(&self, kind: SyntaxKind, children: Vec<SyntaxElement>) -> SyntaxNode;

	fn create_token(&self, kind: SyntaxKind, text: Arc<str>) -> SyntaxToken;
}

/// Factory that builds plain nodes without any checks.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreenFactory;

impl NodeFactory for GreenFactory {
	fn create_node(&self, kind: SyntaxKind, children: Vec<SyntaxElement>) -> SyntaxNode {
		SyntaxNode::new(kind, children)
	}

	fn create_token(&self, kind: SyntaxKind, text: Arc<str>) -> SyntaxToken {
		SyntaxToken::new(kind, text)
	}
}

impl<F: NodeFactory + ?Sized> NodeFactory for &F {
	fn create_node(&self, kind: SyntaxKind, children: Vec<SyntaxElement>) -> SyntaxNode {
		(**self).create_node(kind, children)
	}

	fn create_token(&self, kind: SyntaxKind, text: Arc<str>) -> SyntaxToken {
		(**self).create_token(kind, text)
	}
}

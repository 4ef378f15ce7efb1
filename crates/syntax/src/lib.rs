//! Immutable annotated syntax trees.
//!
//! * [`SyntaxNode`] / [`SyntaxToken`]: `Arc`-shared tree elements whose
//!   equality is structural
//! * [`Annotation`]: kind-tagged metadata attached to nodes outside of
//!   structural equality, queried through the node's annotation methods
//! * [`TreeSerializer`]: pre-order tree encoding on top of
//!   [`arbor_stream`], preserving annotations and shared subtrees
//! * [`SymbolAnnotation`]: annotations that name a symbol by durable id
//!   and resolve it against a caller-supplied [`SemanticContext`]
//!
//! A deserialized tree compares equal to the original and carries equal
//! annotations, but none of its nodes or annotations are the original
//! instances.

mod annotation;
mod error;
mod factory;
mod kind;
mod node;
mod serialize;
mod symbol;

pub use annotation::{Annotation, AnnotationSet};
pub use error::{Result, SymbolAnnotationError, SyntaxError};
pub use factory::{GreenFactory, NodeFactory};
pub use kind::SyntaxKind;
pub use node::{SyntaxElement, SyntaxNode, SyntaxToken};
pub use serialize::{TreeSerializer, register_markers};
pub use symbol::{SemanticContext, Symbol, SymbolAnnotation, SymbolId};

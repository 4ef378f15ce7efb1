use arbor_stream::StreamError;
use thiserror::Error;

use crate::symbol::SymbolId;

/// Errors raised by tree construction and tree serialization.
#[derive(Debug, Error)]
pub enum SyntaxError {
	/// The underlying object stream failed or was malformed.
	#[error(transparent)]
	Stream(#[from] StreamError),

	/// A shared-subtree record points at a node not yet decoded.
	#[error("invalid shared node reference {index} ({available} nodes decoded)")]
	InvalidBackReference { index: u64, available: usize },

	/// A byte that does not start a node, token or shared record.
	#[error("invalid tree record 0x{0:02x}")]
	InvalidRecord(u8),

	/// An exclusive attach found a different annotation of the same kind.
	#[error("annotation kind `{kind}` is already attached")]
	DuplicateAnnotationKind { kind: String },
}

impl SyntaxError {
	/// Returns true if the stream ended before the tree was complete.
	pub fn is_truncation(&self) -> bool {
		matches!(self, Self::Stream(e) if e.is_truncation())
	}
}

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, SyntaxError>;

/// Errors raised while creating or resolving symbol annotations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolAnnotationError {
	/// The symbol has no durable identifier (anonymous or ephemeral).
	#[error("symbol `{name}` has no durable identifier")]
	UnsupportedSymbolKind { name: String },

	/// The semantic context has no symbol with this identifier.
	///
	/// Expected when the source changed between annotating and resolving.
	#[error("no symbol with id `{id}` in this context")]
	SymbolNotFound { id: SymbolId },

	/// The annotation is of another kind.
	#[error("annotation of kind `{kind}` is not a symbol annotation")]
	NotASymbolAnnotation { kind: String },

	/// A symbol annotation without an identifier payload.
	#[error("symbol annotation carries no identifier")]
	MissingSymbolId,
}

impl SymbolAnnotationError {
	/// Returns true for source drift, as opposed to misuse.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::SymbolNotFound { .. })
	}
}

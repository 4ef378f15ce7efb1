//! Symbol annotations.
//!
//! A symbol annotation records a symbol's durable identifier rather than the
//! symbol itself. The symbol stays owned by whatever semantic context
//! produced it; resolving an annotation is a lookup against a context the
//! caller supplies, and the same annotation may be resolved against any
//! number of contexts.

use std::fmt;
use std::sync::Arc;

use crate::annotation::Annotation;
use crate::error::SymbolAnnotationError;
use crate::node::SyntaxNode;

/// Durable, documentation-comment style symbol identifier such as `M:C.M()`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(Arc<str>);

impl SymbolId {
	pub fn new(id: impl Into<Arc<str>>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for SymbolId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SymbolId({:?})", &*self.0)
	}
}

impl fmt::Display for SymbolId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for SymbolId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl From<String> for SymbolId {
	fn from(id: String) -> Self {
		Self::new(id)
	}
}

/// A semantic entity that may be durably identified.
pub trait Symbol {
	/// Display name, used in diagnostics.
	fn name(&self) -> &str;

	/// Identifier that re-locates this symbol in another context.
	///
	/// `None` for anonymous or ephemeral symbols.
	fn symbol_id(&self) -> Option<SymbolId>;
}

/// Owner of symbols that can be looked up by identifier.
pub trait SemanticContext {
	type Symbol;

	fn lookup_symbol_by_id(&self, id: &SymbolId) -> Option<Self::Symbol>;
}

impl<C: SemanticContext + ?Sized> SemanticContext for &C {
	type Symbol = C::Symbol;

	fn lookup_symbol_by_id(&self, id: &SymbolId) -> Option<Self::Symbol> {
		(**self).lookup_symbol_by_id(id)
	}
}

/// Creates and resolves annotations of kind [`SymbolAnnotation::KIND`].
///
/// Two symbol annotations are equal exactly when their identifiers are.
#[derive(Debug, Clone, Copy)]
pub struct SymbolAnnotation;

impl SymbolAnnotation {
	pub const KIND: &'static str = "SymbolId";

	const ID_KEY: &'static str = "id";

	/// Creates an annotation identifying `symbol`.
	pub fn create<S: Symbol + ?Sized>(symbol: &S) -> Result<Annotation, SymbolAnnotationError> {
		let id = symbol
			.symbol_id()
			.filter(|id| !id.as_str().is_empty())
			.ok_or_else(|| SymbolAnnotationError::UnsupportedSymbolKind {
				name: symbol.name().to_owned(),
			})?;
		Ok(Self::for_id(&id))
	}

	/// Creates an annotation for an identifier obtained elsewhere.
	pub fn for_id(id: &SymbolId) -> Annotation {
		Annotation::new(Self::KIND).with_data(Self::ID_KEY, id.as_str())
	}

	pub fn is_symbol_annotation(annotation: &Annotation) -> bool {
		annotation.kind() == Self::KIND
	}

	/// Returns the identifier carried by `annotation`.
	pub fn symbol_id_of(annotation: &Annotation) -> Result<SymbolId, SymbolAnnotationError> {
		if !Self::is_symbol_annotation(annotation) {
			return Err(SymbolAnnotationError::NotASymbolAnnotation {
				kind: annotation.kind().to_owned(),
			});
		}
		match annotation.get(Self::ID_KEY) {
			Some(id) if !id.is_empty() => Ok(SymbolId::from(id)),
			_ => Err(SymbolAnnotationError::MissingSymbolId),
		}
	}

	/// Looks the annotated symbol up in `context`.
	///
	/// [`SymbolAnnotationError::SymbolNotFound`] means the context has no
	/// such symbol, typically because the source changed since annotating.
	pub fn resolve<C: SemanticContext + ?Sized>(
		annotation: &Annotation,
		context: &C,
	) -> Result<C::Symbol, SymbolAnnotationError> {
		let id = Self::symbol_id_of(annotation)?;
		match context.lookup_symbol_by_id(&id) {
			Some(symbol) => Ok(symbol),
			None => {
				tracing::trace!(%id, "symbol annotation did not resolve");
				Err(SymbolAnnotationError::SymbolNotFound { id })
			}
		}
	}

	/// Resolves every symbol annotation on `node`, in attachment order.
	pub fn resolve_all<C: SemanticContext + ?Sized>(
		node: &SyntaxNode,
		context: &C,
	) -> Vec<Result<C::Symbol, SymbolAnnotationError>> {
		node.annotations_of_kind(Self::KIND)
			.map(|annotation| Self::resolve(annotation, context))
			.collect()
	}
}

use std::fmt;

use once_cell::sync::OnceCell;

/// Deferred-construction provider tagged with language metadata.
///
/// The factory runs at most once, on first [`value`](Self::value). Callers
/// racing on first access block until the winning call finishes and all
/// observe the same instance.
pub struct LanguageProvider<T, M> {
	metadata: M,
	factory: Box<dyn Fn() -> T + Send + Sync>,
	value: OnceCell<T>,
}

impl<T, M> LanguageProvider<T, M> {
	pub fn new(metadata: M, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
		Self {
			metadata,
			factory: Box::new(factory),
			value: OnceCell::new(),
		}
	}

	pub fn metadata(&self) -> &M {
		&self.metadata
	}

	/// Returns the provider instance, creating it on first call.
	pub fn value(&self) -> &T {
		self.value.get_or_init(|| {
			tracing::trace!(provider = std::any::type_name::<T>(), "instantiating language provider");
			(self.factory)()
		})
	}

	/// Returns the instance only if it already exists.
	pub fn get(&self) -> Option<&T> {
		self.value.get()
	}

	pub fn is_instantiated(&self) -> bool {
		self.value.get().is_some()
	}
}

impl<T: fmt::Debug, M: fmt::Debug> fmt::Debug for LanguageProvider<T, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LanguageProvider")
			.field("metadata", &self.metadata)
			.field("value", &self.value.get())
			.finish_non_exhaustive()
	}
}

//! Immutable per-language views over provider entries.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use rustc_hash::FxHashSet;

use crate::collision::{LanguageCollision, find_collisions};
use crate::metadata::{HasLanguage, HasLanguages};
use crate::provider::LanguageProvider;

/// Shared handle to one provider entry.
pub type ProviderRef<T, M> = Arc<LanguageProvider<T, M>>;

/// Language name to the entries registered for it, in input order.
pub type LanguageMap<T, M> = IndexMap<Arc<str>, Vec<ProviderRef<T, M>>>;

/// Builder for a [`LanguageRegistry`].
pub struct LanguageRegistryBuilder<T, M> {
	label: &'static str,
	entries: Vec<ProviderRef<T, M>>,
}

impl<T, M> LanguageRegistryBuilder<T, M> {
	/// Creates a new builder with the given label for diagnostics.
	pub fn new(label: &'static str) -> Self {
		Self {
			label,
			entries: Vec::new(),
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Adds a single provider.
	pub fn push(&mut self, provider: LanguageProvider<T, M>) {
		self.entries.push(Arc::new(provider));
	}

	/// Adds a provider that may also be registered elsewhere. Its instance
	/// is shared with every registry holding it.
	pub fn push_shared(&mut self, provider: ProviderRef<T, M>) {
		self.entries.push(provider);
	}

	/// Adds a provider built from `metadata` and `factory`.
	pub fn provider(&mut self, metadata: M, factory: impl Fn() -> T + Send + Sync + 'static) {
		self.push(LanguageProvider::new(metadata, factory));
	}

	/// Adds multiple providers.
	pub fn extend<I: IntoIterator<Item = LanguageProvider<T, M>>>(&mut self, providers: I) {
		self.entries.extend(providers.into_iter().map(Arc::new));
	}

	/// Builds the registry. The same provider pushed twice is kept once, at
	/// its first position.
	pub fn build(self) -> LanguageRegistry<T, M> {
		let mut entries = self.entries;
		let mut seen: FxHashSet<*const LanguageProvider<T, M>> =
			FxHashSet::with_capacity_and_hasher(entries.len(), Default::default());
		entries.retain(|e| seen.insert(Arc::as_ptr(e)));

		tracing::debug!(registry = self.label, entries = entries.len(), "language registry built");
		LanguageRegistry {
			label: self.label,
			entries: entries.into(),
			by_single: OnceCell::new(),
			by_multiple: OnceCell::new(),
			collisions: OnceCell::new(),
		}
	}
}

/// Provider entries indexed by language.
///
/// Never mutated after [`build`](LanguageRegistryBuilder::build); every
/// view hands out the same entries, so a provider instantiated through one
/// view is already instantiated in all others. The grouping maps are
/// computed on first request and kept.
pub struct LanguageRegistry<T, M> {
	label: &'static str,
	entries: Arc<[ProviderRef<T, M>]>,
	by_single: OnceCell<LanguageMap<T, M>>,
	by_multiple: OnceCell<LanguageMap<T, M>>,
	collisions: OnceCell<Vec<LanguageCollision>>,
}

impl<T, M> LanguageRegistry<T, M> {
	pub fn builder(label: &'static str) -> LanguageRegistryBuilder<T, M> {
		LanguageRegistryBuilder::new(label)
	}

	pub fn label(&self) -> &'static str {
		self.label
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// All entries in input order.
	pub fn iter(&self) -> impl ExactSizeIterator<Item = &ProviderRef<T, M>> + '_ {
		self.entries.iter()
	}
}

impl<T, M: HasLanguage> LanguageRegistry<T, M> {
	/// Returns the first entry tagged with exactly `language`.
	pub fn exact_language(&self, language: &str) -> Option<&ProviderRef<T, M>> {
		self.entries.iter().find(|e| e.metadata().language() == Some(language))
	}

	/// Instances of every entry tagged with `language`, in input order.
	///
	/// Each provider is instantiated as the iterator reaches it.
	pub fn filter_language<'a>(&'a self, language: &'a str) -> impl Iterator<Item = &'a T> + 'a {
		self.entries
			.iter()
			.filter(move |e| e.metadata().language() == Some(language))
			.map(|e| e.value())
	}

	/// Every entry under its language; unset languages group under `""`.
	pub fn group_by_single_language(&self) -> &LanguageMap<T, M> {
		self.by_single.get_or_init(|| {
			let mut map = LanguageMap::new();
			for entry in self.entries.iter() {
				let language = entry.metadata().language().unwrap_or_default();
				map.entry(Arc::from(language)).or_insert_with(Vec::new).push(entry.clone());
			}
			map
		})
	}

	/// Distinct set languages in first-seen order.
	pub fn languages(&self) -> impl Iterator<Item = &str> + '_ {
		self.group_by_single_language()
			.keys()
			.map(|k| &**k)
			.filter(|k| !k.is_empty())
	}

	/// Languages claimed by more than one entry.
	pub fn collisions(&self) -> &[LanguageCollision] {
		self.collisions.get_or_init(|| {
			let collisions = find_collisions(self.label, self.entries.iter().map(|e| e.metadata()));
			for c in &collisions {
				tracing::debug!(
					registry = self.label,
					language = %c.language,
					shadowed = c.shadowed.len(),
					"language claimed by several providers"
				);
			}
			collisions
		})
	}
}

impl<T, M: HasLanguages> LanguageRegistry<T, M> {
	/// Every entry under each distinct, non-empty language it declares.
	pub fn group_by_multiple_languages(&self) -> &LanguageMap<T, M> {
		self.by_multiple.get_or_init(|| {
			let mut map = LanguageMap::new();
			for entry in self.entries.iter() {
				let mut declared: FxHashSet<&str> = FxHashSet::default();
				for language in entry.metadata().languages() {
					if language.is_empty() || !declared.insert(&**language) {
						continue;
					}
					map.entry(language.clone()).or_insert_with(Vec::new).push(entry.clone());
				}
			}
			map
		})
	}
}

impl<T, M: fmt::Debug> fmt::Debug for LanguageRegistry<T, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LanguageRegistry")
			.field("label", &self.label)
			.field(
				"entries",
				&self.entries.iter().map(|e| e.metadata()).collect::<Vec<_>>(),
			)
			.finish()
	}
}

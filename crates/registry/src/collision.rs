use std::sync::Arc;

use indexmap::IndexMap;

use crate::metadata::HasLanguage;

/// Several single-language entries claiming one language.
///
/// Exact lookup keeps the first entry in input order without complaint;
/// this record only exists so hosts can surface the overlap if they care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageCollision {
	/// Label of the registry the collision occurred in.
	pub registry: &'static str,
	pub language: Arc<str>,
	/// Input position of the entry exact lookup returns.
	pub winner: usize,
	/// Input positions of the later entries it shadows.
	pub shadowed: Vec<usize>,
}

/// Collects languages claimed by more than one entry, in first-seen order.
pub(crate) fn find_collisions<'a, M, I>(registry: &'static str, metadata: I) -> Vec<LanguageCollision>
where
	M: HasLanguage + 'a,
	I: IntoIterator<Item = &'a M>,
{
	let mut claims: IndexMap<&'a str, Vec<usize>> = IndexMap::new();
	for (index, meta) in metadata.into_iter().enumerate() {
		if let Some(language) = meta.language() {
			claims.entry(language).or_default().push(index);
		}
	}

	claims
		.into_iter()
		.filter(|(_, indices)| indices.len() > 1)
		.map(|(language, indices)| LanguageCollision {
			registry,
			language: Arc::from(language),
			winner: indices[0],
			shadowed: indices[1..].to_vec(),
		})
		.collect()
}

//! Language tags carried by provider entries.

use std::sync::Arc;

/// Metadata naming the single language an entry applies to.
pub trait HasLanguage {
	/// The language, or `None` when unset.
	fn language(&self) -> Option<&str>;
}

/// Metadata naming every language an entry applies to.
///
/// The list may repeat languages or contain empty names; consumers
/// collapse repeats and ignore empties.
pub trait HasLanguages {
	fn languages(&self) -> &[Arc<str>];
}

/// Single-language tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LanguageMetadata {
	language: Option<Arc<str>>,
}

impl LanguageMetadata {
	pub fn new(language: impl Into<Arc<str>>) -> Self {
		Self {
			language: Some(language.into()),
		}
	}

	/// Metadata without a language.
	pub fn unset() -> Self {
		Self::default()
	}
}

impl HasLanguage for LanguageMetadata {
	fn language(&self) -> Option<&str> {
		self.language.as_deref()
	}
}

impl HasLanguages for LanguageMetadata {
	fn languages(&self) -> &[Arc<str>] {
		self.language.as_slice()
	}
}

impl From<&str> for LanguageMetadata {
	fn from(language: &str) -> Self {
		Self::new(language)
	}
}

/// Multi-language tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LanguagesMetadata {
	languages: Vec<Arc<str>>,
}

impl LanguagesMetadata {
	pub fn new<I, S>(languages: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<Arc<str>>,
	{
		Self {
			languages: languages.into_iter().map(Into::into).collect(),
		}
	}
}

impl HasLanguages for LanguagesMetadata {
	fn languages(&self) -> &[Arc<str>] {
		&self.languages
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_single_language_as_list() {
		assert_eq!(LanguageMetadata::new("cs").languages(), [Arc::<str>::from("cs")]);
		assert!(LanguageMetadata::unset().languages().is_empty());
		assert_eq!(LanguageMetadata::unset().language(), None);
	}

	#[test]
	fn test_languages_keep_duplicates() {
		let meta = LanguagesMetadata::new(["cs", "vb", "cs"]);
		assert_eq!(meta.languages().len(), 3);
	}
}

//! Language-keyed registry of extension providers.
//!
//! Hosts register [`LanguageProvider`]s (a factory plus language metadata)
//! once, through a [`LanguageRegistryBuilder`], and query the resulting
//! [`LanguageRegistry`] by language:
//!
//! * [`exact_language`](LanguageRegistry::exact_language): first entry for
//!   a language, in registration order
//! * [`filter_language`](LanguageRegistry::filter_language): instances of
//!   every entry for a language
//! * [`group_by_single_language`](LanguageRegistry::group_by_single_language)
//!   and [`group_by_multiple_languages`](LanguageRegistry::group_by_multiple_languages):
//!   language-keyed maps
//!
//! Providers are instantiated lazily and at most once, however many views
//! reach them and however many threads race on first access. Absence is
//! never an error.

mod collision;
mod metadata;
mod provider;
mod registry;

pub use collision::LanguageCollision;
pub use metadata::{HasLanguage, HasLanguages, LanguageMetadata, LanguagesMetadata};
pub use provider::LanguageProvider;
pub use registry::{LanguageMap, LanguageRegistry, LanguageRegistryBuilder, ProviderRef};

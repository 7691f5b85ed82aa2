//! Language file registry: the supported locales of a scope and the
//! translation source for each of them.
//!
//! Insertion order is preserved, so the registry doubles as the ordered list
//! of supported locales used for negotiation.

use crate::i18n::source::TranslationSource;
use std::sync::Arc;

/// Mapping from locale code to translation source.
///
/// Cheap to clone; clones share the same entries until one of them is
/// modified.
#[derive(Debug, Clone, Default)]
pub struct LanguageFiles {
    entries: Arc<Vec<(String, TranslationSource)>>,
}

impl LanguageFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`LanguageFiles::insert`].
    pub fn with(mut self, locale: impl Into<String>, source: impl Into<TranslationSource>) -> Self {
        self.insert(locale, source);
        self
    }

    /// Register a source for a locale.
    ///
    /// Replacing an existing locale keeps its position.
    pub fn insert(&mut self, locale: impl Into<String>, source: impl Into<TranslationSource>) {
        let locale = locale.into();
        let source = source.into();
        let entries = Arc::make_mut(&mut self.entries);

        match entries.iter_mut().find(|(code, _)| *code == locale) {
            Some(entry) => entry.1 = source,
            None => entries.push((locale, source)),
        }
    }

    /// Get the source registered for a locale (exact match).
    pub fn get(&self, locale: &str) -> Option<&TranslationSource> {
        self.entries
            .iter()
            .find(|(code, _)| code == locale)
            .map(|(_, source)| source)
    }

    /// Get the locales with a registered source, in insertion order.
    pub fn supported_locales(&self) -> Vec<String> {
        self.entries.iter().map(|(code, _)| code.clone()).collect()
    }

    pub fn contains(&self, locale: &str) -> bool {
        self.get(locale).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TranslationSource)> {
        self.entries
            .iter()
            .map(|(code, source)| (code.as_str(), source))
    }
}

impl<L, S> FromIterator<(L, S)> for LanguageFiles
where
    L: Into<String>,
    S: Into<TranslationSource>,
{
    fn from_iter<I: IntoIterator<Item = (L, S)>>(iter: I) -> Self {
        let mut files = LanguageFiles::new();
        for (locale, source) in iter {
            files.insert(locale, source);
        }
        files
    }
}

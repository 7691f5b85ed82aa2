//! Translation sources: language files and the (possibly lazy, possibly
//! asynchronous) ways of producing them.

use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Resolved mapping from source phrase to translated phrase.
pub type LanguageFile = HashMap<String, String>;

/// A language file, optionally wrapped in a module-style envelope that
/// exposes it under a `default` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LanguageFileModule {
    /// `{ "default": { ... } }`
    Module { default: LanguageFile },
    /// `{ ... }`
    File(LanguageFile),
}

impl LanguageFileModule {
    /// Unwrap the envelope, if any.
    pub fn into_language_file(self) -> LanguageFile {
        match self {
            LanguageFileModule::Module { default } => default,
            LanguageFileModule::File(file) => file,
        }
    }
}

impl From<LanguageFile> for LanguageFileModule {
    fn from(file: LanguageFile) -> Self {
        LanguageFileModule::File(file)
    }
}

/// Result of invoking a getter source.
pub enum Loaded {
    /// The language file is available immediately.
    Ready(LanguageFileModule),
    /// The language file will be available once the operation settles.
    Pending(BoxFuture<'static, anyhow::Result<LanguageFileModule>>),
}

impl fmt::Debug for Loaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Loaded::Ready(module) => f.debug_tuple("Ready").field(module).finish(),
            Loaded::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Stable identity of a translation source.
///
/// Assigned once at construction and shared by every clone, so it plays the
/// role of reference identity for the resolution cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

impl SourceId {
    fn next() -> Self {
        SourceId(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

type Getter = Arc<dyn Fn() -> Loaded + Send + Sync>;

#[derive(Clone)]
pub(crate) enum SourceKind {
    File(Arc<LanguageFile>),
    Getter(Getter),
}

/// One locale's translations: either a language file or a getter producing
/// one.
///
/// Rebuilding a source from the same closure yields a *new* identity; keep
/// sources alive (or clone them) to benefit from the resolution cache.
#[derive(Clone)]
pub struct TranslationSource {
    id: SourceId,
    kind: SourceKind,
}

impl TranslationSource {
    /// A language file available up front (envelope allowed).
    pub fn file(file: impl Into<LanguageFileModule>) -> Self {
        Self {
            id: SourceId::next(),
            kind: SourceKind::File(Arc::new(file.into().into_language_file())),
        }
    }

    /// A getter deciding on each invocation whether the result is immediate
    /// or pending.
    ///
    /// The getter may resolve other sources through the same cache, but never
    /// its own source.
    pub fn getter<F>(getter: F) -> Self
    where
        F: Fn() -> Loaded + Send + Sync + 'static,
    {
        Self {
            id: SourceId::next(),
            kind: SourceKind::Getter(Arc::new(getter)),
        }
    }

    /// A synchronous getter, e.g. an eagerly bundled language file.
    pub fn sync<F, M>(getter: F) -> Self
    where
        F: Fn() -> M + Send + Sync + 'static,
        M: Into<LanguageFileModule>,
    {
        Self::getter(move || Loaded::Ready(getter().into()))
    }

    /// An asynchronous getter, e.g. a dynamically loaded module.
    pub fn lazy<F, Fut, M>(getter: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<M>> + Send + 'static,
        M: Into<LanguageFileModule>,
    {
        Self::getter(move || Loaded::Pending(getter().map(|r| r.map(Into::into)).boxed()))
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Whether resolving this source invokes a getter.
    pub fn is_getter(&self) -> bool {
        matches!(self.kind, SourceKind::Getter(_))
    }

    pub(crate) fn kind(&self) -> &SourceKind {
        &self.kind
    }
}

impl From<LanguageFile> for TranslationSource {
    fn from(file: LanguageFile) -> Self {
        TranslationSource::file(file)
    }
}

impl From<LanguageFileModule> for TranslationSource {
    fn from(module: LanguageFileModule) -> Self {
        TranslationSource::file(module)
    }
}

impl fmt::Debug for TranslationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            SourceKind::File(file) => format!("File({} entries)", file.len()),
            SourceKind::Getter(_) => "Getter".to_string(),
        };
        f.debug_struct("TranslationSource")
            .field("id", &self.id)
            .field("kind", &kind)
            .finish()
    }
}

/// Build a [`LanguageFile`] from string pairs.
pub fn language_file<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> LanguageFile
where
    K: Into<String>,
    V: Into<String>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== LanguageFileModule Tests ====================

    #[test]
    fn test_deserialize_plain_file() {
        let module: LanguageFileModule =
            serde_json::from_str(r#"{"Hi": "Hallo"}"#).expect("valid json");
        assert_eq!(
            module.into_language_file(),
            language_file([("Hi", "Hallo")])
        );
    }

    #[test]
    fn test_deserialize_envelope() {
        let module: LanguageFileModule =
            serde_json::from_str(r#"{"default": {"Hi": "Hallo"}}"#).expect("valid json");
        assert!(matches!(module, LanguageFileModule::Module { .. }));
        assert_eq!(
            module.into_language_file(),
            language_file([("Hi", "Hallo")])
        );
    }

    #[test]
    fn test_default_phrase_is_not_an_envelope() {
        let module: LanguageFileModule =
            serde_json::from_str(r#"{"default": "Standard", "Hi": "Hallo"}"#)
                .expect("valid json");
        let file = module.into_language_file();
        assert_eq!(file.get("default").map(String::as_str), Some("Standard"));
        assert_eq!(file.get("Hi").map(String::as_str), Some("Hallo"));
    }

    #[test]
    fn test_deserialize_rejects_non_string_values() {
        let result: Result<LanguageFileModule, _> = serde_json::from_str(r#"{"Hi": 1}"#);
        assert!(result.is_err());
    }

    // ==================== TranslationSource Tests ====================

    #[test]
    fn test_ids_are_unique() {
        let a = TranslationSource::file(LanguageFile::new());
        let b = TranslationSource::file(LanguageFile::new());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_clone_shares_id() {
        let a = TranslationSource::sync(LanguageFile::new);
        let b = a.clone();
        assert_eq!(a.id(), b.id());
        assert!(b.is_getter());
    }

    #[test]
    fn test_file_source_unwraps_envelope() {
        let source = TranslationSource::file(LanguageFileModule::Module {
            default: language_file([("Hi", "Hallo")]),
        });
        match source.kind() {
            SourceKind::File(file) => assert_eq!(file.get("Hi").map(String::as_str), Some("Hallo")),
            SourceKind::Getter(_) => panic!("expected a file source"),
        }
        assert!(!source.is_getter());
    }

    #[test]
    fn test_debug_does_not_expose_contents() {
        let source = TranslationSource::file(language_file([("secret", "value")]));
        let debug = format!("{:?}", source);
        assert!(debug.contains("1 entries"));
        assert!(!debug.contains("secret"));
    }
}

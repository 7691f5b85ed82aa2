//! Suspension adapter: consume the resolution cache either by polling
//! (never wait, publish updates when loads settle) or by suspending
//! (await the pending load).

use crate::error::{LoadError, TError};
use crate::i18n::cache::{ResolutionCache, SharedLoad};
use crate::i18n::source::{LanguageFile, SourceId, TranslationSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

/// How a scope consumes language files that are not available yet.
///
/// Fixed for the lifetime of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspendMode {
    /// Return the best available language file now and update later.
    #[default]
    Poll,
    /// Wait until the language file has settled.
    Suspend,
}

impl From<bool> for SuspendMode {
    fn from(suspend: bool) -> Self {
        if suspend {
            SuspendMode::Suspend
        } else {
            SuspendMode::Poll
        }
    }
}

impl fmt::Display for SuspendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuspendMode::Poll => f.write_str("poll"),
            SuspendMode::Suspend => f.write_str("suspend"),
        }
    }
}

/// Resolution state of a translation source.
#[derive(Clone)]
pub enum Loadable {
    /// Available now (`None` when there is no source at all).
    Ready(Option<Arc<LanguageFile>>),
    /// Still loading; await the handle to get the outcome.
    Pending(SharedLoad),
    Failed(LoadError),
}

impl Loadable {
    pub fn is_pending(&self) -> bool {
        matches!(self, Loadable::Pending(_))
    }
}

impl fmt::Debug for Loadable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Loadable::Ready(file) => f
                .debug_tuple("Ready")
                .field(&file.as_ref().map(|file| file.len()))
                .finish(),
            Loadable::Pending(_) => f.write_str("Pending(..)"),
            Loadable::Failed(error) => f.debug_tuple("Failed").field(error).finish(),
        }
    }
}

/// Resolve a source, suspending the caller until it settles.
///
/// A failed load is returned as [`TError::Load`].
pub async fn suspend_on(
    cache: &ResolutionCache,
    source: Option<&TranslationSource>,
) -> Result<Option<Arc<LanguageFile>>, TError> {
    Ok(cache.resolve(source).await?)
}

#[derive(Debug, Default)]
struct Request {
    generation: u64,
    source: Option<SourceId>,
}

struct PollingInner {
    current: watch::Sender<Option<Arc<LanguageFile>>>,
    request: Mutex<Request>,
    runtime: Option<Handle>,
}

impl PollingInner {
    fn lock(&self) -> MutexGuard<'_, Request> {
        self.request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, file: Option<Arc<LanguageFile>>) {
        self.current.send_if_modified(|current| {
            let unchanged = match (current.as_ref(), file.as_ref()) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            if !unchanged {
                *current = file;
            }
            !unchanged
        });
    }
}

/// Polling consumer of the resolution cache.
///
/// [`PollingLoader::request`] never waits. When the requested source is still
/// loading, the previously published language file (possibly `None`) is
/// returned and a background task publishes the new one once it settles.
/// Results for a request that has since been superseded are discarded.
///
/// Only the owner of the current request calls `request`. Readers holding an
/// older view use [`PollingLoader::read`], which never supersedes anything.
#[derive(Clone)]
pub struct PollingLoader {
    inner: Arc<PollingInner>,
}

impl PollingLoader {
    /// Create a loader spawning background waits on `runtime`.
    ///
    /// Without a runtime handle, the runtime of the caller of
    /// [`PollingLoader::request`] is used when there is one. Otherwise pending
    /// sources are only picked up by later requests once something else has
    /// driven them to completion.
    pub fn new(runtime: Option<Handle>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            inner: Arc::new(PollingInner {
                current,
                request: Mutex::new(Request::default()),
                runtime,
            }),
        }
    }

    /// Create a loader on the current Tokio runtime, if any.
    pub fn current() -> Self {
        Self::new(Handle::try_current().ok())
    }

    /// The last published language file.
    pub fn language_file(&self) -> Option<Arc<LanguageFile>> {
        self.inner.current.borrow().clone()
    }

    /// Watch published language files.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<LanguageFile>>> {
        self.inner.current.subscribe()
    }

    /// Request the language file of `source`, returning the best available
    /// one immediately.
    pub fn request(
        &self,
        cache: &ResolutionCache,
        source: Option<&TranslationSource>,
    ) -> Option<Arc<LanguageFile>> {
        let source_id = source.map(TranslationSource::id);

        let (generation, is_new) = {
            let mut request = self.inner.lock();
            let is_new = request.generation == 0 || request.source != source_id;
            if is_new {
                request.generation += 1;
                request.source = source_id;
            }
            (request.generation, is_new)
        };

        match cache.state(source) {
            Loadable::Ready(file) => {
                self.inner.publish(file.clone());
                file
            }
            Loadable::Failed(error) => {
                if is_new {
                    warn!("Keeping previous language file: {}", error);
                }
                self.language_file()
            }
            Loadable::Pending(load) => {
                if is_new {
                    self.wait_in_background(load, generation);
                }
                self.language_file()
            }
        }
    }

    /// Best available language file for `source` without changing the
    /// current request.
    ///
    /// For the currently requested source this is the same as
    /// [`PollingLoader::request`]. Any other source is peeked in the cache,
    /// falling back to the last published language file while it loads.
    pub fn read(
        &self,
        cache: &ResolutionCache,
        source: Option<&TranslationSource>,
    ) -> Option<Arc<LanguageFile>> {
        let source_id = source.map(TranslationSource::id);
        let is_current = {
            let request = self.inner.lock();
            request.generation != 0 && request.source == source_id
        };

        match cache.state(source) {
            Loadable::Ready(file) => {
                if is_current {
                    self.inner.publish(file.clone());
                }
                file
            }
            Loadable::Pending(_) | Loadable::Failed(_) => self.language_file(),
        }
    }

    fn wait_in_background(&self, load: SharedLoad, generation: u64) {
        let runtime = self
            .inner
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok());
        let Some(runtime) = runtime else {
            warn!("No async runtime available, language file will not load in the background");
            return;
        };

        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move {
            let result = load.await;
            if inner.lock().generation != generation {
                debug!("Discarding language file for superseded request {}", generation);
                return;
            }
            match result {
                Ok(file) => inner.publish(Some(file)),
                Err(error) => warn!("Keeping previous language file: {}", error),
            }
        });
    }
}

impl fmt::Debug for PollingLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingLoader")
            .field("request", &*self.inner.lock())
            .field("has_runtime", &self.inner.runtime.is_some())
            .finish()
    }
}

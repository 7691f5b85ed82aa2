//! Translation source resolution with a process-wide, append-only cache.
//!
//! Every getter source is invoked at most once per cache. The first request
//! for a source (sync or async) invokes it and stores the outcome as a shared
//! operation keyed by [`SourceId`]. Later requests, concurrent or not, reuse
//! the stored operation and observe the same settled outcome. Entries are
//! never evicted or overwritten.

use crate::error::LoadError;
use crate::i18n::metrics::ResolutionMetrics;
use crate::i18n::source::{LanguageFile, Loaded, SourceId, SourceKind, TranslationSource};
use crate::i18n::suspense::Loadable;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::{debug, warn};

/// Outcome of resolving a getter source.
pub type LoadResult = Result<Arc<LanguageFile>, LoadError>;

/// In-flight or settled resolution, shareable between requesters.
pub type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

/// Slot holding the resolution of one source once its getter has run.
type Slot = Arc<OnceLock<SharedLoad>>;

/// Resolution cache keyed by source identity.
#[derive(Default)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<SourceId, Slot>>,
    metrics: Arc<ResolutionMetrics>,
}

/// Global cache instance (initialized lazily)
static GLOBAL_CACHE: OnceLock<Arc<ResolutionCache>> = OnceLock::new();

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the process-wide resolution cache.
    pub fn global() -> Arc<ResolutionCache> {
        Arc::clone(GLOBAL_CACHE.get_or_init(|| Arc::new(ResolutionCache::new())))
    }

    pub fn metrics(&self) -> &ResolutionMetrics {
        &self.metrics
    }

    /// Number of cached sources.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a resolution for `id` has been started.
    pub fn contains(&self, id: SourceId) -> bool {
        self.lock()
            .get(&id)
            .is_some_and(|slot| slot.get().is_some())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SourceId, Slot>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get the cache entry for a getter, invoking it if absent.
    ///
    /// The map lock only guards slot creation. The getter runs inside the
    /// slot's own once-initialization, so concurrent requesters of one source
    /// wait for a single invocation while other sources stay available.
    ///
    /// Returns the entry and whether this call created it.
    fn entry<F>(&self, id: SourceId, invoke: F) -> (SharedLoad, bool)
    where
        F: FnOnce() -> Loaded,
    {
        let slot = Arc::clone(self.lock().entry(id).or_default());

        let mut created = false;
        let load = slot.get_or_init(|| {
            created = true;
            self.metrics.record_loader_call();
            debug!("Invoking getter for {}", id);
            self.settle(id, invoke())
        });

        (load.clone(), created)
    }

    fn settle(&self, id: SourceId, loaded: Loaded) -> SharedLoad {
        match loaded {
            Loaded::Ready(module) => {
                let load = future::ready(Ok::<_, LoadError>(Arc::new(module.into_language_file())))
                    .boxed()
                    .shared();
                // Settle in place so later peeks see the value.
                let _ = load.clone().now_or_never();
                load
            }
            Loaded::Pending(pending) => {
                let metrics = Arc::clone(&self.metrics);
                pending
                    .map(move |result| match result {
                        Ok(module) => {
                            debug!("Language file for {} loaded", id);
                            Ok(Arc::new(module.into_language_file()))
                        }
                        Err(error) => {
                            metrics.record_load_failure();
                            warn!("Loading language file for {} failed: {:#}", id, error);
                            Err(LoadError::new(error))
                        }
                    })
                    .boxed()
                    .shared()
            }
        }
    }

    /// Current resolution state of a source, starting its resolution if
    /// needed. Never waits for a pending load.
    pub fn state(&self, source: Option<&TranslationSource>) -> Loadable {
        let Some(source) = source else {
            return Loadable::Ready(None);
        };

        match source.kind() {
            SourceKind::File(file) => Loadable::Ready(Some(Arc::clone(file))),
            SourceKind::Getter(getter) => {
                let (load, created) = self.entry(source.id(), || (**getter)());
                let settled = load.peek().cloned();

                if settled.is_some() && !created {
                    self.metrics.record_cache_hit();
                    debug!("Resolution cache hit for {}", source.id());
                } else {
                    self.metrics.record_cache_miss();
                }

                match settled {
                    Some(Ok(file)) => Loadable::Ready(Some(file)),
                    Some(Err(error)) => Loadable::Failed(error),
                    None => Loadable::Pending(load),
                }
            }
        }
    }

    /// Resolve a source without blocking.
    ///
    /// # Returns
    /// * `Some` if the language file is available now
    /// * `None` if there is no source, the source is still pending, or it failed
    pub fn resolve_sync(&self, source: Option<&TranslationSource>) -> Option<Arc<LanguageFile>> {
        match self.state(source) {
            Loadable::Ready(file) => file,
            Loadable::Pending(_) | Loadable::Failed(_) => None,
        }
    }

    /// Resolve a source, waiting for a pending operation to settle.
    pub async fn resolve(
        &self,
        source: Option<&TranslationSource>,
    ) -> Result<Option<Arc<LanguageFile>>, LoadError> {
        match self.state(source) {
            Loadable::Ready(file) => Ok(file),
            Loadable::Failed(error) => Err(error),
            Loadable::Pending(load) => load.await.map(Some),
        }
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("entries", &self.len())
            .field("metrics", &self.metrics.report())
            .finish()
    }
}

/// Resolve a source synchronously using the global cache.
pub fn resolve_language_file_sync(
    source: Option<&TranslationSource>,
) -> Option<Arc<LanguageFile>> {
    ResolutionCache::global().resolve_sync(source)
}

/// Resolve a source using the global cache.
pub async fn resolve_language_file(
    source: Option<&TranslationSource>,
) -> Result<Option<Arc<LanguageFile>>, LoadError> {
    ResolutionCache::global().resolve(source).await
}

//! External locale signals: the host document locale and the user's
//! preferred locales.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::debug;

type Callback = Arc<dyn Fn(Option<&str>) + Send + Sync>;

struct DocumentInner {
    state: Mutex<DocumentState>,
}

#[derive(Default)]
struct DocumentState {
    locale: Option<String>,
    next_id: u64,
    callbacks: BTreeMap<u64, Callback>,
}

impl DocumentInner {
    fn lock(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Host document locale signal.
///
/// A single nullable locale tag that external code may change at any time
/// (the equivalent of a document's `lang` attribute). Cloning yields another
/// handle to the same signal.
#[derive(Clone)]
pub struct DocumentLocale {
    inner: Arc<DocumentInner>,
}

impl DocumentLocale {
    /// Create a signal with an initial value.
    pub fn new(locale: Option<&str>) -> Self {
        Self {
            inner: Arc::new(DocumentInner {
                state: Mutex::new(DocumentState {
                    locale: locale.map(str::to_string),
                    ..Default::default()
                }),
            }),
        }
    }

    /// Get the current host locale.
    pub fn get(&self) -> Option<String> {
        self.inner.lock().locale.clone()
    }

    /// Change the host locale.
    ///
    /// Subscribers are invoked (outside the internal lock) only when the
    /// value actually changes.
    pub fn set(&self, locale: Option<&str>) {
        let callbacks: Vec<Callback> = {
            let mut state = self.inner.lock();
            if state.locale.as_deref() == locale {
                return;
            }
            state.locale = locale.map(str::to_string);
            state.callbacks.values().cloned().collect()
        };

        debug!(
            "Document locale changed to {:?}, notifying {} subscriber(s)",
            locale,
            callbacks.len()
        );
        for callback in callbacks {
            callback(locale);
        }
    }

    /// Register a callback invoked with the new value on every change.
    ///
    /// The callback stays registered until the returned [`Subscription`] is
    /// dropped.
    #[must_use = "dropping the subscription unregisters the callback"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        let mut state = self.inner.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.callbacks.insert(id, Arc::new(callback));

        Subscription {
            signal: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Number of registered callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().callbacks.len()
    }
}

impl Default for DocumentLocale {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for DocumentLocale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("DocumentLocale")
            .field("locale", &state.locale)
            .field("subscribers", &state.callbacks.len())
            .finish()
    }
}

/// Registration handle returned by [`DocumentLocale::subscribe`].
///
/// Unregisters the callback when dropped.
#[derive(Debug)]
pub struct Subscription {
    signal: Weak<DocumentInner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.signal.upgrade() {
            inner.lock().callbacks.remove(&self.id);
        }
    }
}

/// Source of the user's ordered locale preferences.
pub trait UserLocales: Send + Sync {
    /// Preferred locale tags, most preferred first.
    fn user_locales(&self) -> Vec<String>;
}

/// User locales reported by the operating system.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemLocales;

impl UserLocales for SystemLocales {
    fn user_locales(&self) -> Vec<String> {
        sys_locale::get_locales().collect()
    }
}

/// Fixed user locale list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StaticUserLocales(pub Vec<String>);

impl StaticUserLocales {
    pub fn new<S: Into<String>>(locales: impl IntoIterator<Item = S>) -> Self {
        Self(locales.into_iter().map(Into::into).collect())
    }

    /// Parse a comma-separated list, skipping empty entries.
    pub fn parse(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|locale| !locale.is_empty()),
        )
    }
}

impl UserLocales for StaticUserLocales {
    fn user_locales(&self) -> Vec<String> {
        self.0.clone()
    }
}

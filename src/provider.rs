//! Translation scopes.
//!
//! A [`TProvider`] establishes a scope: it negotiates the effective locale
//! from its props, the host document signal and the user's preferences, and
//! makes the matching language file available through [`TContext`]
//! snapshots. Nested providers merge their props over the enclosing
//! context field by field.

use crate::error::TError;
use crate::i18n::{
    suspend_on, Args, DocumentLocale, LanguageFile, LanguageFiles, LocaleResolver, LocaleSignals,
    PollingLoader, ResolutionCache, Subscription, SuspendMode, SystemLocales, TranslationSource,
    Translated, UserLocales,
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info};

/// Collaborators shared by every scope of an application.
#[derive(Clone)]
pub struct Environment {
    /// Host document locale signal
    pub document: DocumentLocale,

    /// User preference list, queried once per negotiation pass
    pub user_locales: Arc<dyn UserLocales>,

    pub cache: Arc<ResolutionCache>,

    /// Runtime used for background loads in polling mode. When `None`, the
    /// runtime current at the time of a locale change is used, if any.
    pub runtime: Option<Handle>,
}

impl Environment {
    /// Environment with the given signals, the global resolution cache and
    /// the current Tokio runtime (if any).
    ///
    /// Built outside a runtime, polling scopes fall back to whichever runtime
    /// is current when they later request a language file.
    pub fn new(document: DocumentLocale, user_locales: impl UserLocales + 'static) -> Self {
        Self {
            document,
            user_locales: Arc::new(user_locales),
            cache: ResolutionCache::global(),
            runtime: Handle::try_current().ok(),
        }
    }

    /// Environment backed by the operating system's locale preferences.
    pub fn system() -> Self {
        Self::new(DocumentLocale::default(), SystemLocales)
    }

    pub fn with_cache(mut self, cache: Arc<ResolutionCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_runtime(mut self, runtime: Option<Handle>) -> Self {
        self.runtime = runtime;
        self
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("document", &self.document)
            .field("cache", &self.cache)
            .field("has_runtime", &self.runtime.is_some())
            .finish()
    }
}

/// Fields a scope may set. Unset fields are inherited from the enclosing
/// scope.
#[derive(Debug, Clone, Default)]
pub struct TProviderProps {
    /// Explicitly requested locale
    pub locale: Option<String>,
    pub default_locale: Option<String>,
    pub language_files: Option<LanguageFiles>,
    pub suspend: Option<SuspendMode>,
}

impl TProviderProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    pub fn language_files(mut self, files: LanguageFiles) -> Self {
        self.language_files = Some(files);
        self
    }

    pub fn suspend(mut self, suspend: impl Into<SuspendMode>) -> Self {
        self.suspend = Some(suspend.into());
        self
    }
}

/// Props merged over the enclosing context.
#[derive(Debug, Clone)]
struct Layer {
    explicit: Option<String>,
    default_locale: Option<String>,
    language_files: LanguageFiles,
    suspend: SuspendMode,
}

impl Layer {
    fn merge(parent: Option<&TContext>, props: &TProviderProps) -> Self {
        Self {
            // The enclosing scope's effective locale acts as an explicit request
            explicit: props
                .locale
                .clone()
                .or_else(|| parent.and_then(|p| p.locale.clone())),
            default_locale: props
                .default_locale
                .clone()
                .or_else(|| parent.and_then(|p| p.default_locale.clone())),
            language_files: props
                .language_files
                .clone()
                .or_else(|| parent.map(|p| p.language_files.clone()))
                .unwrap_or_default(),
            suspend: props
                .suspend
                .or_else(|| parent.map(|p| p.suspend))
                .unwrap_or_default(),
        }
    }
}

struct ScopeState {
    layer: Layer,
    resolver: LocaleResolver,
}

struct Scope {
    env: Environment,
    state: Mutex<ScopeState>,
    locale: watch::Sender<Option<String>>,
    loader: PollingLoader,
}

impl Scope {
    fn lock(&self) -> MutexGuard<'_, ScopeState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Re-negotiate the effective locale and, in polling mode, request its
    /// language file.
    fn refresh(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;

        let host = self.env.document.get();
        let user = self.env.user_locales.user_locales();
        let supported = state.layer.language_files.supported_locales();

        let locale = state.resolver.resolve(&LocaleSignals {
            explicit: state.layer.explicit.as_deref(),
            host: host.as_deref(),
            user: &user,
            default_locale: state.layer.default_locale.as_deref(),
            supported: &supported,
        });

        let changed = self.locale.send_if_modified(|current| {
            if *current == locale {
                return false;
            }
            *current = locale.clone();
            true
        });
        if changed {
            info!(
                "Effective locale changed to {}",
                locale.as_deref().unwrap_or("<none>")
            );
        }

        if state.layer.suspend == SuspendMode::Poll {
            let source = locale
                .as_deref()
                .and_then(|locale| state.layer.language_files.get(locale));
            self.loader.request(&self.env.cache, source);
        }
    }
}

/// A translation scope.
///
/// Stays subscribed to the host document signal until dropped.
pub struct TProvider {
    scope: Arc<Scope>,
    _subscription: Subscription,
}

impl TProvider {
    /// Mount a top-level scope.
    pub fn new(env: Environment, props: TProviderProps) -> Self {
        Self::mount(env, None, props)
    }

    /// Mount a scope nested in `parent`, sharing its environment.
    pub fn nested(parent: &TContext, props: TProviderProps) -> Self {
        Self::mount(parent.env.clone(), Some(parent), props)
    }

    fn mount(env: Environment, parent: Option<&TContext>, props: TProviderProps) -> Self {
        let layer = Layer::merge(parent, &props);
        debug!("Mounting translation scope in {} mode", layer.suspend);

        let loader = PollingLoader::new(env.runtime.clone());
        let (locale, _) = watch::channel(None);
        let scope = Arc::new(Scope {
            env,
            state: Mutex::new(ScopeState {
                layer,
                resolver: LocaleResolver::new(),
            }),
            locale,
            loader,
        });

        let weak = Arc::downgrade(&scope);
        let subscription = scope.env.document.subscribe(move |_| {
            // Re-read the signal rather than trusting the notification value
            if let Some(scope) = weak.upgrade() {
                scope.refresh();
            }
        });

        scope.refresh();

        Self {
            scope,
            _subscription: subscription,
        }
    }

    /// Replace the props of this scope (and the enclosing context, if any).
    ///
    /// # Errors
    /// [`TError::SuspendModeChanged`] if the merged suspend mode differs from
    /// the one the scope was mounted with. The scope is left unchanged.
    pub fn set_props(&self, parent: Option<&TContext>, props: TProviderProps) -> Result<(), TError> {
        let layer = Layer::merge(parent, &props);
        {
            let mut state = self.scope.lock();
            if layer.suspend != state.layer.suspend {
                return Err(TError::SuspendModeChanged {
                    was: state.layer.suspend,
                    now: layer.suspend,
                });
            }
            state.layer = layer;
        }
        self.scope.refresh();
        Ok(())
    }

    /// Snapshot of this scope for translation and nesting.
    pub fn context(&self) -> TContext {
        let state = self.scope.lock();
        TContext {
            locale: self.scope.locale.borrow().clone(),
            default_locale: state.layer.default_locale.clone(),
            language_files: state.layer.language_files.clone(),
            suspend: state.layer.suspend,
            env: self.scope.env.clone(),
            loader: self.scope.loader.clone(),
        }
    }

    /// The current effective locale.
    pub fn locale(&self) -> Option<String> {
        self.scope.locale.borrow().clone()
    }

    /// Watch the effective locale.
    pub fn watch_locale(&self) -> watch::Receiver<Option<String>> {
        self.scope.locale.subscribe()
    }

    /// Watch language files published in polling mode.
    pub fn watch_language_file(&self) -> watch::Receiver<Option<Arc<LanguageFile>>> {
        self.scope.loader.subscribe()
    }

    /// Number of negotiation passes run so far.
    pub fn evaluations(&self) -> usize {
        self.scope.lock().resolver.evaluations()
    }
}

impl fmt::Debug for TProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.scope.lock();
        f.debug_struct("TProvider")
            .field("locale", &*self.scope.locale.borrow())
            .field("layer", &state.layer)
            .finish()
    }
}

/// Immutable snapshot of a scope.
#[derive(Clone)]
pub struct TContext {
    locale: Option<String>,
    default_locale: Option<String>,
    language_files: LanguageFiles,
    suspend: SuspendMode,
    env: Environment,
    loader: PollingLoader,
}

impl TContext {
    /// The effective locale.
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }

    pub fn language_files(&self) -> &LanguageFiles {
        &self.language_files
    }

    pub fn suspend_mode(&self) -> SuspendMode {
        self.suspend
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Translation source of the effective locale.
    pub fn source(&self) -> Option<&TranslationSource> {
        self.locale
            .as_deref()
            .and_then(|locale| self.language_files.get(locale))
    }

    /// Best language file available without waiting.
    ///
    /// In polling mode the last published language file is returned while the
    /// scope's current load runs in the background. A snapshot taken before a
    /// locale change reads its own source from the cache and leaves the
    /// scope's loader alone.
    pub fn language_file_now(&self) -> Option<Arc<LanguageFile>> {
        match self.suspend {
            SuspendMode::Poll => self.loader.read(&self.env.cache, self.source()),
            SuspendMode::Suspend => self.env.cache.resolve_sync(self.source()),
        }
    }

    /// Language file of the effective locale.
    ///
    /// Suspends until the load settles in suspending mode; never waits in
    /// polling mode.
    pub async fn language_file(&self) -> Result<Option<Arc<LanguageFile>>, TError> {
        match self.suspend {
            SuspendMode::Poll => Ok(self.language_file_now()),
            SuspendMode::Suspend => suspend_on(&self.env.cache, self.source()).await,
        }
    }
}

impl fmt::Debug for TContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TContext")
            .field("locale", &self.locale)
            .field("default_locale", &self.default_locale)
            .field("supported", &self.language_files.supported_locales())
            .field("suspend", &self.suspend)
            .finish()
    }
}

/// Translation handle bound to a scope snapshot.
#[derive(Debug, Clone)]
pub struct Translator {
    context: TContext,
}

impl Translator {
    pub fn locale(&self) -> Option<&str> {
        self.context.locale()
    }

    pub fn context(&self) -> &TContext {
        &self.context
    }

    /// Translate with the language file available right now, falling back to
    /// the untranslated phrase.
    pub fn translate_now<N: Clone>(&self, phrase: &str, args: Option<&Args<N>>) -> Translated<N> {
        let file = self.context.language_file_now();
        render(phrase, file.as_deref(), args)
    }

    /// Translate, suspending until the language file is loaded in suspending
    /// mode.
    ///
    /// # Errors
    /// [`TError::Load`] if the language file failed to load (suspending mode
    /// only).
    pub async fn translate<N: Clone>(
        &self,
        phrase: &str,
        args: Option<&Args<N>>,
    ) -> Result<Translated<N>, TError> {
        let file = self.context.language_file().await?;
        Ok(render(phrase, file.as_deref(), args))
    }
}

fn render<N: Clone>(phrase: &str, file: Option<&LanguageFile>, args: Option<&Args<N>>) -> Translated<N> {
    crate::i18n::translate(Some(phrase), file, args)
        .unwrap_or_else(|| Translated::Text(phrase.to_string()))
}

/// Get a translator for the nearest scope.
///
/// # Errors
/// [`TError::MissingScope`] when called outside of any scope.
pub fn use_translation(context: Option<&TContext>) -> Result<Translator, TError> {
    let context = context.ok_or(TError::MissingScope)?;
    Ok(Translator {
        context: context.clone(),
    })
}

/// Get the effective locale of the nearest scope.
///
/// # Errors
/// [`TError::MissingScope`] when called outside of any scope.
pub fn use_locale(context: Option<&TContext>) -> Result<Option<String>, TError> {
    let context = context.ok_or(TError::MissingScope)?;
    Ok(context.locale.clone())
}

//! Internationalization (i18n) core: locale matching and negotiation,
//! translation source resolution, and placeholder substitution.
//!
//! # Architecture
//!
//! - `locale`: Locale matching with region fallback
//! - `negotiation`: Effective locale from explicit, host, user and default signals
//! - `signals`: Host document locale and user locale preferences
//! - `source`: Language files and the getters producing them
//! - `registry`: Supported locales and their translation sources
//! - `cache`: At-most-once resolution of translation sources
//! - `suspense`: Poll and suspend consumption of the cache
//! - `translate`: Phrase lookup and placeholder substitution
//! - `metrics`: Resolution cache observability
//!
//! # Example
//!
//! ```rust
//! use t_i18n::i18n::{language_file, translate, LanguageFile, TextArgs};
//!
//! let file: LanguageFile = language_file([("Hello {name}!", "Hallo {name}!")]);
//! let args = TextArgs::new().with("name", "Welt");
//!
//! let translated = translate(Some("Hello {name}!"), Some(&file), Some(&args));
//! assert_eq!(translated.unwrap().as_text(), Some("Hallo Welt!"));
//! ```

mod cache;
mod locale;
mod metrics;
mod negotiation;
mod registry;
mod signals;
mod source;
mod suspense;
mod translate;

pub use cache::{
    resolve_language_file, resolve_language_file_sync, LoadResult, ResolutionCache, SharedLoad,
};
pub use locale::{alt_language_code, get_matching_locale};
pub use metrics::{MetricsReport, ResolutionMetrics};
pub use negotiation::{resolve_locale, LocaleResolver, LocaleSignals};
pub use registry::LanguageFiles;
pub use signals::{DocumentLocale, StaticUserLocales, Subscription, SystemLocales, UserLocales};
pub use source::{language_file, LanguageFile, LanguageFileModule, Loaded, SourceId, TranslationSource};
pub use suspense::{suspend_on, Loadable, PollingLoader, SuspendMode};
pub use translate::{
    apply_args, get_raw_translated_string, translate, Arg, Args, Segment, TextArgs, Translated,
};

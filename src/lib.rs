//! Client-side internationalization runtime: locale negotiation, lazily
//! loaded language files and placeholder substitution.

pub mod config;
pub mod error;
pub mod i18n;
pub mod loader;
pub mod provider;

pub use error::{LoadError, TError};
pub use provider::{use_locale, use_translation, Environment, TContext, TProvider, TProviderProps, Translator};

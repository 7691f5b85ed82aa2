//! Effective locale negotiation.
//!
//! Combines the four locale signals, highest priority first:
//!
//! 1. explicit request
//! 2. host document signal
//! 3. user preference list
//! 4. configured default
//!
//! Each signal is matched against the supported locales (with the default
//! locale always considered supported). The first signal producing a match
//! wins and lower-priority signals are never consulted.

use crate::i18n::get_matching_locale;

/// Inputs of one negotiation pass.
///
/// The user preference list must be snapshotted once per pass by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleSignals<'a> {
    /// Locale explicitly requested by the caller
    pub explicit: Option<&'a str>,

    /// Current host document signal (e.g. a `lang` attribute)
    pub host: Option<&'a str>,

    /// Ordered user preference list, most preferred first
    pub user: &'a [String],

    /// Configured default locale
    pub default_locale: Option<&'a str>,

    /// Locales present in the source map, in deterministic order
    pub supported: &'a [String],
}

impl LocaleSignals<'_> {
    /// Supported locales with the default locale prepended (deduplicated).
    fn supported_with_default(&self) -> Vec<&str> {
        let mut all = Vec::with_capacity(self.supported.len() + 1);
        if let Some(default_locale) = non_empty(self.default_locale) {
            all.push(default_locale);
        }
        for locale in self.supported {
            if !all.contains(&locale.as_str()) {
                all.push(locale.as_str());
            }
        }
        all
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Resolve the effective locale from the given signals.
///
/// # Returns
/// * The first supported locale matched by the highest-priority signal
/// * Otherwise the configured default locale, even if it is not in `supported`
/// * `None` if nothing matched and no default is configured
pub fn resolve_locale(signals: &LocaleSignals<'_>) -> Option<String> {
    let supported = signals.supported_with_default();

    for single in [signals.explicit, signals.host].into_iter().filter_map(non_empty) {
        if let Some(found) = get_matching_locale([single], &supported) {
            return Some(found.to_string());
        }
    }

    let user = signals.user.iter().filter(|l| !l.is_empty());
    if let Some(found) = get_matching_locale(user, &supported) {
        return Some(found.to_string());
    }

    non_empty(signals.default_locale).map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Inputs {
    explicit: Option<String>,
    host: Option<String>,
    user: Vec<String>,
    default_locale: Option<String>,
    supported: Vec<String>,
}

impl Inputs {
    fn matches(&self, signals: &LocaleSignals<'_>) -> bool {
        self.explicit.as_deref() == signals.explicit
            && self.host.as_deref() == signals.host
            && self.default_locale.as_deref() == signals.default_locale
            && self.user == signals.user
            && self.supported == signals.supported
    }
}

impl From<&LocaleSignals<'_>> for Inputs {
    fn from(signals: &LocaleSignals<'_>) -> Self {
        Self {
            explicit: signals.explicit.map(str::to_string),
            host: signals.host.map(str::to_string),
            user: signals.user.to_vec(),
            default_locale: signals.default_locale.map(str::to_string),
            supported: signals.supported.to_vec(),
        }
    }
}

/// Memoizing wrapper around [`resolve_locale`].
///
/// Re-runs negotiation only when the content of an input changes, so a
/// rebuilt but identical supported-locale list does not trigger work.
#[derive(Debug, Default)]
pub struct LocaleResolver {
    last: Option<(Inputs, Option<String>)>,
    evaluations: usize,
}

impl LocaleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the effective locale, reusing the previous result when the
    /// inputs are unchanged.
    pub fn resolve(&mut self, signals: &LocaleSignals<'_>) -> Option<String> {
        if let Some((inputs, locale)) = &self.last {
            if inputs.matches(signals) {
                return locale.clone();
            }
        }

        self.evaluations += 1;
        let locale = resolve_locale(signals);
        self.last = Some((Inputs::from(signals), locale.clone()));
        locale
    }

    /// Number of negotiation passes actually run.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}

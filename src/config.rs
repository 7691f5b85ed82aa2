use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::i18n::SuspendMode;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Language files
    pub language_dir: PathBuf,

    // Locale signals
    pub default_locale: Option<String>,
    pub locale: Option<String>,
    pub host_locale: Option<String>,
    pub user_locales: Option<Vec<String>>,

    // Loading
    pub suspend: SuspendMode,
}

/// Read a variable, treating empty values as unset.
fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} must be a boolean, got {:?}", name, value),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            language_dir: var("T_LANGUAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("locales")),

            default_locale: var("T_DEFAULT_LOCALE"),
            locale: var("T_LOCALE"),
            host_locale: var("T_HOST_LOCALE"),
            user_locales: var("T_USER_LOCALES").map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|locale| !locale.is_empty())
                    .map(str::to_string)
                    .collect()
            }),

            suspend: var("T_SUSPEND")
                .map(|v| parse_bool("T_SUSPEND", &v))
                .transpose()
                .context("Invalid T_SUSPEND")?
                .unwrap_or(false)
                .into(),
        })
    }
}

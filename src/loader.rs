//! Language files stored on disk as `<locale>.json`.

use crate::i18n::{LanguageFileModule, LanguageFiles, TranslationSource};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Build a source map from a directory of `<locale>.json` files.
///
/// Only the directory listing is read here. Each file is read and parsed by
/// its own lazy source the first time that locale is resolved. Locales are
/// ordered by tag.
pub fn language_files_from_dir(dir: impl AsRef<Path>) -> Result<LanguageFiles> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read language directory {}", dir.display()))?;

    let mut locales: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list language directory {}", dir.display()))?
            .path();

        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(locale) = path.file_stem().and_then(|stem| stem.to_str()) else {
            debug!("Skipping language file with non UTF-8 name: {}", path.display());
            continue;
        };
        locales.push((locale.to_string(), path.clone()));
    }
    locales.sort_by(|a, b| a.0.cmp(&b.0));

    info!(
        "Found {} language files in {}",
        locales.len(),
        dir.display()
    );

    Ok(locales
        .into_iter()
        .map(|(locale, path)| (locale, json_file_source(path)))
        .collect())
}

/// A lazy source reading one JSON language file.
pub fn json_file_source(path: PathBuf) -> TranslationSource {
    TranslationSource::lazy(move || read_language_file(path.clone()))
}

async fn read_language_file(path: PathBuf) -> Result<LanguageFileModule> {
    debug!("Reading language file {}", path.display());

    let contents = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

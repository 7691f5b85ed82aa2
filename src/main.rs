//! Translation preview binary - mounts a scope from the environment and prints
//! the translation of each phrase given on the command line.
//!
//! Usage:
//!   t-preview [--arg name=value]... <phrase>...
//!
//! Optional environment variables:
//! - T_LANGUAGE_DIR (defaults to locales)
//! - T_DEFAULT_LOCALE
//! - T_LOCALE
//! - T_HOST_LOCALE
//! - T_USER_LOCALES (defaults to the operating system's preferences)
//! - T_SUSPEND (defaults to false)

use anyhow::{Context, Result};
use std::time::Duration;
use t_i18n::config::Config;
use t_i18n::i18n::{DocumentLocale, StaticUserLocales, SuspendMode, SystemLocales, TextArgs};
use t_i18n::loader::language_files_from_dir;
use t_i18n::{use_translation, Environment, TProvider, TProviderProps};
use tracing::{info, warn};

/// How long polling mode waits for the language file to be published.
const POLL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, PartialEq)]
struct Invocation {
    args: TextArgs,
    phrases: Vec<String>,
}

fn parse_args(raw: impl IntoIterator<Item = String>) -> Result<Invocation> {
    let mut args = TextArgs::new();
    let mut phrases = Vec::new();

    let mut raw = raw.into_iter();
    while let Some(arg) = raw.next() {
        if arg == "--arg" {
            let pair = raw.next().context("--arg requires name=value")?;
            let (name, value) = pair
                .split_once('=')
                .with_context(|| format!("Invalid --arg {:?}, expected name=value", pair))?;
            args.insert(name, value);
        } else {
            phrases.push(arg);
        }
    }

    Ok(Invocation { args, phrases })
}

fn print_usage() {
    println!("Usage: t-preview [--arg name=value]... <phrase>...");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("t_i18n=info".parse()?),
        )
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    if raw.is_empty() || raw.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let invocation = parse_args(raw)?;

    let config = Config::from_env()?;
    info!("Previewing translations from {}", config.language_dir.display());

    let document = DocumentLocale::new(config.host_locale.as_deref());
    let env = match config.user_locales.clone() {
        Some(locales) => Environment::new(document, StaticUserLocales(locales)),
        None => Environment::new(document, SystemLocales),
    };

    let language_files = language_files_from_dir(&config.language_dir)?;

    let mut props = TProviderProps::new()
        .language_files(language_files)
        .suspend(config.suspend);
    if let Some(locale) = config.locale.clone() {
        props = props.locale(locale);
    }
    if let Some(locale) = config.default_locale.clone() {
        props = props.default_locale(locale);
    }

    let provider = TProvider::new(env, props);
    let context = provider.context();

    if config.suspend == SuspendMode::Poll && context.source().is_some() {
        let mut files = provider.watch_language_file();
        match tokio::time::timeout(POLL_TIMEOUT, files.wait_for(Option::is_some)).await {
            Ok(result) => {
                result.context("Translation scope closed while loading")?;
            }
            Err(_) => warn!("Language file not loaded after {:?}", POLL_TIMEOUT),
        };
    }

    let translator = use_translation(Some(&context))?;
    println!(
        "locale: {}",
        translator.locale().unwrap_or("<none>")
    );

    for phrase in &invocation.phrases {
        let translated = translator.translate(phrase, Some(&invocation.args)).await?;
        println!("{}", translated);
    }

    Ok(())
}

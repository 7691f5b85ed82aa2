//! Integration tests for the translation runtime
//!
//! These tests mount translation scopes against in-memory and on-disk
//! language files and verify negotiation, loading and substitution together.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use t_i18n::i18n::{
    language_file, Args, DocumentLocale, LanguageFile, LanguageFileModule, LanguageFiles,
    ResolutionCache, Segment, StaticUserLocales, SuspendMode, TextArgs, TranslationSource,
    Translated,
};
use t_i18n::loader::language_files_from_dir;
use t_i18n::{use_locale, use_translation, Environment, TError, TProvider, TProviderProps};

// ==================== Test Helpers ====================

/// Create an environment with its own resolution cache
fn create_env(host: Option<&str>, user: &[&str]) -> Environment {
    Environment::new(
        DocumentLocale::new(host),
        StaticUserLocales::new(user.iter().copied()),
    )
    .with_cache(Arc::new(ResolutionCache::new()))
}

/// Create a counting getter for one phrase
fn counting_source(calls: &Arc<AtomicUsize>, translated: &'static str) -> TranslationSource {
    let calls = Arc::clone(calls);
    TranslationSource::sync(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        language_file([("Hello world!", translated)])
    })
}

fn hello(provider: &TProvider) -> String {
    let translator = use_translation(Some(&provider.context())).expect("in scope");
    translator
        .translate_now::<Infallible>("Hello world!", None)
        .to_string()
}

#[derive(Debug, Clone, PartialEq)]
struct Link(&'static str);

// ==================== Locale Switch Tests ====================

#[test]
fn test_host_switch_invokes_each_source_once() {
    let de_calls = Arc::new(AtomicUsize::new(0));
    let es_calls = Arc::new(AtomicUsize::new(0));
    let files = LanguageFiles::new()
        .with("de", counting_source(&de_calls, "Hallo Welt!"))
        .with("es", counting_source(&es_calls, "¡Hola Mundo!"));

    let env = create_env(Some("de"), &[]);
    let document = env.document.clone();
    let provider = TProvider::new(env, TProviderProps::new().language_files(files));

    assert_eq!(hello(&provider), "Hallo Welt!");

    document.set(Some("es"));
    assert_eq!(hello(&provider), "¡Hola Mundo!");

    document.set(Some("de"));
    assert_eq!(hello(&provider), "Hallo Welt!");
    document.set(Some("es"));
    assert_eq!(hello(&provider), "¡Hola Mundo!");

    assert_eq!(de_calls.load(Ordering::SeqCst), 1);
    assert_eq!(es_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_host_switch_in_suspending_mode() {
    let de_calls = Arc::new(AtomicUsize::new(0));
    let es_calls = Arc::new(AtomicUsize::new(0));
    let files = LanguageFiles::new()
        .with("de", counting_source(&de_calls, "Hallo Welt!"))
        .with("es", counting_source(&es_calls, "¡Hola Mundo!"));

    let env = create_env(Some("de"), &[]);
    let document = env.document.clone();
    let provider = TProvider::new(
        env,
        TProviderProps::new().language_files(files).suspend(true),
    );

    assert_eq!(hello(&provider), "Hallo Welt!");
    document.set(Some("es"));
    assert_eq!(hello(&provider), "¡Hola Mundo!");
    document.set(Some("de"));
    assert_eq!(hello(&provider), "Hallo Welt!");

    assert_eq!(de_calls.load(Ordering::SeqCst), 1);
    assert_eq!(es_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_host_signal_cleared_falls_back_to_user_preferences() {
    let files = LanguageFiles::new()
        .with("de", language_file([("Hello world!", "Hallo Welt!")]))
        .with("es", language_file([("Hello world!", "¡Hola Mundo!")]));

    let env = create_env(Some("de"), &["es-MX"]);
    let document = env.document.clone();
    let provider = TProvider::new(env, TProviderProps::new().language_files(files));
    assert_eq!(provider.locale().as_deref(), Some("de"));

    document.set(None);
    assert_eq!(provider.locale().as_deref(), Some("es"));
    assert_eq!(hello(&provider), "¡Hola Mundo!");
}

// ==================== Polling Mode Tests ====================

#[tokio::test]
async fn test_polling_publishes_lazy_language_file() {
    let files = LanguageFiles::new().with(
        "de",
        TranslationSource::lazy(|| async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(LanguageFileModule::Module {
                default: language_file([("Hello world!", "Hallo Welt!")]),
            })
        }),
    );

    let provider = TProvider::new(
        create_env(Some("de"), &[]),
        TProviderProps::new().language_files(files),
    );
    let mut updates = provider.watch_language_file();

    // Untranslated until the load settles
    assert_eq!(hello(&provider), "Hello world!");

    tokio::time::timeout(Duration::from_secs(1), updates.wait_for(Option::is_some))
        .await
        .expect("published in time")
        .expect("provider alive");

    assert_eq!(hello(&provider), "Hallo Welt!");
}

#[tokio::test]
async fn test_polling_keeps_previous_file_while_switching() {
    let files = LanguageFiles::new()
        .with("de", language_file([("Hello world!", "Hallo Welt!")]))
        .with(
            "es",
            TranslationSource::lazy(|| async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(language_file([("Hello world!", "¡Hola Mundo!")]))
            }),
        );

    let env = create_env(Some("de"), &[]);
    let document = env.document.clone();
    let provider = TProvider::new(env, TProviderProps::new().language_files(files));
    let mut updates = provider.watch_language_file();

    document.set(Some("es"));
    assert_eq!(provider.locale().as_deref(), Some("es"));
    // Stale but available
    assert_eq!(hello(&provider), "Hallo Welt!");

    tokio::time::timeout(Duration::from_secs(1), updates.changed())
        .await
        .expect("published in time")
        .expect("provider alive");
    assert_eq!(hello(&provider), "¡Hola Mundo!");
}

#[tokio::test]
async fn test_stale_snapshot_does_not_cancel_pending_switch() {
    let files = LanguageFiles::new()
        .with("de", language_file([("Hello world!", "Hallo Welt!")]))
        .with(
            "es",
            TranslationSource::lazy(|| async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(language_file([("Hello world!", "¡Hola Mundo!")]))
            }),
        );

    let env = create_env(Some("de"), &[]);
    let document = env.document.clone();
    let provider = TProvider::new(env, TProviderProps::new().language_files(files));
    let old = provider.context();
    let mut updates = provider.watch_language_file();

    document.set(Some("es"));

    // A consumer still holding the pre-switch snapshot renders meanwhile
    let translator = use_translation(Some(&old)).expect("in scope");
    assert_eq!(
        translator
            .translate_now::<Infallible>("Hello world!", None)
            .to_string(),
        "Hallo Welt!"
    );

    tokio::time::timeout(Duration::from_secs(1), updates.changed())
        .await
        .expect("published in time")
        .expect("provider alive");
    assert_eq!(
        updates
            .borrow()
            .as_ref()
            .and_then(|file| file.get("Hello world!").cloned())
            .as_deref(),
        Some("¡Hola Mundo!")
    );
    assert_eq!(hello(&provider), "¡Hola Mundo!");
}

#[tokio::test]
async fn test_polling_failure_degrades_to_source_text() {
    let files = LanguageFiles::new().with(
        "de",
        TranslationSource::lazy(|| async {
            Err::<LanguageFile, _>(anyhow::anyhow!("404 Not Found"))
        }),
    );
    let cache = Arc::new(ResolutionCache::new());
    let env = create_env(Some("de"), &[]).with_cache(Arc::clone(&cache));
    let provider = TProvider::new(env, TProviderProps::new().language_files(files));
    let context = provider.context();

    let _ = cache.resolve(context.source()).await;

    assert_eq!(hello(&provider), "Hello world!");
    assert_eq!(cache.metrics().load_failures(), 1);
}

// ==================== Suspending Mode Tests ====================

#[tokio::test]
async fn test_suspending_translate_with_rich_args() {
    let files = LanguageFiles::new().with(
        "de",
        TranslationSource::lazy(|| async {
            Ok(language_file([(
                "Read {link} or {link}, {name}",
                "Lies {link} oder {link}, {name}",
            )]))
        }),
    );
    let provider = TProvider::new(
        create_env(Some("de"), &[]),
        TProviderProps::new().language_files(files).suspend(true),
    );
    let translator = use_translation(Some(&provider.context())).expect("in scope");
    let args = Args::new()
        .with("name", "Ada")
        .with_node("link", Link("docs"));

    let translated = translator
        .translate("Read {link} or {link}, {name}", Some(&args))
        .await
        .expect("loads");

    assert_eq!(
        translated,
        Translated::Segments(vec![
            Segment::Text("Lies ".to_string()),
            Segment::Node {
                key: "link-0-0".to_string(),
                node: Link("docs"),
            },
            Segment::Text(" oder ".to_string()),
            Segment::Node {
                key: "link-0-1".to_string(),
                node: Link("docs"),
            },
            Segment::Text(", Ada".to_string()),
        ])
    );
}

#[tokio::test]
async fn test_concurrent_suspensions_share_one_load() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);
    let files = LanguageFiles::new().with(
        "de",
        TranslationSource::lazy(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(language_file([("Hello world!", "Hallo Welt!")]))
            }
        }),
    );
    let provider = TProvider::new(
        create_env(Some("de"), &[]),
        TProviderProps::new().language_files(files).suspend(true),
    );
    let a = use_translation(Some(&provider.context())).expect("in scope");
    let b = use_translation(Some(&provider.context())).expect("in scope");

    let (first, second) = tokio::join!(
        a.translate::<Infallible>("Hello world!", None),
        b.translate::<Infallible>("Hello world!", None)
    );

    assert_eq!(first.expect("loads").as_text(), Some("Hallo Welt!"));
    assert_eq!(second.expect("loads").as_text(), Some("Hallo Welt!"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_suspend_mode_change_is_reported() {
    let provider = TProvider::new(
        create_env(None, &[]),
        TProviderProps::new().suspend(SuspendMode::Suspend),
    );

    let result = provider.set_props(None, TProviderProps::new());
    match result {
        Err(TError::SuspendModeChanged { was, now }) => {
            assert_eq!(was, SuspendMode::Suspend);
            assert_eq!(now, SuspendMode::Poll);
        }
        other => panic!("expected SuspendModeChanged, got {:?}", other),
    }
}

// ==================== Scope Tests ====================

#[test]
fn test_missing_scope_is_reported() {
    let error = use_translation(None).expect_err("no scope");
    assert_eq!(
        error.to_string(),
        "Unable to find TProvider context. Did you wrap your app in a TProvider?"
    );
    assert!(matches!(use_locale(None), Err(TError::MissingScope)));
}

#[test]
fn test_nested_scope_overrides_language_files() {
    let outer_files = LanguageFiles::new()
        .with("de", language_file([("Hello world!", "Hallo Welt!")]));
    let inner_files = LanguageFiles::new()
        .with("de", language_file([("Hello world!", "Servus Welt!")]));

    let outer = TProvider::new(
        create_env(None, &["de-AT"]),
        TProviderProps::new()
            .default_locale("en")
            .language_files(outer_files),
    );
    let inner = TProvider::nested(
        &outer.context(),
        TProviderProps::new().language_files(inner_files),
    );

    assert_eq!(inner.locale().as_deref(), Some("de"));
    assert_eq!(hello(&outer), "Hallo Welt!");
    assert_eq!(hello(&inner), "Servus Welt!");
    assert_eq!(inner.context().default_locale(), Some("en"));
}

#[test]
fn test_nested_scope_follows_parent_on_rerender() {
    let files = LanguageFiles::new()
        .with("de", language_file([("Hello world!", "Hallo Welt!")]))
        .with("es", language_file([("Hello world!", "¡Hola Mundo!")]));

    let env = create_env(Some("de"), &[]);
    let document = env.document.clone();
    let outer = TProvider::new(env, TProviderProps::new().language_files(files));
    let inner = TProvider::nested(&outer.context(), TProviderProps::new());
    assert_eq!(hello(&inner), "Hallo Welt!");

    document.set(Some("es"));
    // The inner scope still holds the old explicit request until re-rendered
    assert_eq!(inner.locale().as_deref(), Some("de"));

    inner
        .set_props(Some(&outer.context()), TProviderProps::new())
        .expect("same mode");
    assert_eq!(hello(&inner), "¡Hola Mundo!");
}

// ==================== Directory Loader Tests ====================

#[tokio::test]
async fn test_language_directory_end_to_end() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(
        dir.path().join("de.json"),
        r#"{"default": {"You have {count} messages": "Du hast {count} Nachrichten"}}"#,
    )
    .expect("write de.json");
    std::fs::write(
        dir.path().join("en-US.json"),
        r#"{"You have {count} messages": "You've got {count} messages"}"#,
    )
    .expect("write en-US.json");

    let files = language_files_from_dir(dir.path()).expect("readable");
    let provider = TProvider::new(
        create_env(None, &["de-CH", "en"]),
        TProviderProps::new().language_files(files).suspend(true),
    );
    let translator = use_translation(Some(&provider.context())).expect("in scope");
    let args = TextArgs::new().with("count", 3_i64);

    assert_eq!(translator.locale(), Some("de"));
    let translated = translator
        .translate("You have {count} messages", Some(&args))
        .await
        .expect("loads");
    assert_eq!(translated.as_text(), Some("Du hast 3 Nachrichten"));
}

use std::{fs, path::Path};

use locker::logging::{
    Console,
    EnvOverrides,
    HandlerKind,
    LogLevel,
    LoggingConfigurator,
    LoggingOptions,
    WatchOptions,
};
use serde_json::Value;
use tracing_subscriber::prelude::*;


fn file_options(project: &str, base_dir: &Path) -> LoggingOptions {
    LoggingOptions::new(project)
        .base_dir(base_dir)
        .console(false)
        .panic_hook(false)
}

/// Runs `emit` with `logging` as the only subscriber on this thread.
fn with_logging(logging: &LoggingConfigurator, emit: impl FnOnce()) {
    let subscriber = tracing_subscriber::registry().with(logging.layer());
    tracing::subscriber::with_default(subscriber, emit);
}

fn json_lines(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn is_dated_archive(file_name: &str, base_name: &str) -> bool {
    file_name
        .strip_suffix(base_name)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .is_some_and(|date| date.len() == 8 && date.bytes().all(|byte| byte.is_ascii_digit()))
}


#[test]
fn configure_creates_text_and_json_files() {
    let directory = tempfile::tempdir().unwrap();
    let logging = LoggingConfigurator::new();

    logging
        .configure_with_env(
            file_options("nav", directory.path())
                .level(LogLevel::Debug)
                .json_file(true),
            EnvOverrides::empty(),
        )
        .unwrap();

    with_logging(&logging, || {
        tracing::debug!("hello debug");
        tracing::info!(target: "nav.module", "hello info");
    });

    let text = fs::read_to_string(directory.path().join("nav.log")).unwrap();
    assert!(text.contains("hello debug"));
    assert!(text.contains("| INFO     | nav | nav.module:"), "{text}");

    let records = json_lines(&directory.path().join("nav.jsonl"));
    assert_eq!(records.len(), 2);

    for record in &records {
        let level = record["level"].as_str().unwrap();
        assert!(LogLevel::ALL.iter().any(|known| known.as_str() == level));
        assert!(!record["logger"].as_str().unwrap().is_empty());
        assert_eq!(record["project"], "nav");
        assert!(record["ts"].as_str().unwrap().ends_with('Z'));
    }

    assert_eq!(records[1]["logger"], "nav.module");
    assert_eq!(records[1]["msg"], "hello info");
}


#[test]
fn configure_is_idempotent() {
    let directory = tempfile::tempdir().unwrap();
    let logging = LoggingConfigurator::new();

    logging
        .configure_with_env(
            file_options("nav", directory.path()).json_file(true),
            EnvOverrides::empty(),
        )
        .unwrap();
    let before = logging.root_handlers();

    logging
        .configure_with_env(
            file_options("nav", directory.path())
                .level(LogLevel::Debug)
                .json_file(true),
            EnvOverrides::empty(),
        )
        .unwrap();

    assert_eq!(logging.root_handlers(), before);
    assert_eq!(before.len(), 2);
    assert_eq!(logging.root_level(), LogLevel::Info);
}


#[test]
fn configuring_twice_writes_each_record_once() {
    let directory = tempfile::tempdir().unwrap();
    let logging = LoggingConfigurator::new();

    for _ in 0..2 {
        logging
            .configure_with_env(
                file_options("nav", directory.path()).json_file(true),
                EnvOverrides::empty(),
            )
            .unwrap();
    }

    with_logging(&logging, || tracing::info!(target: "nav", "only once"));

    let text = fs::read_to_string(directory.path().join("nav.log")).unwrap();
    assert_eq!(text.matches("only once").count(), 1, "{text}");

    let records = json_lines(&directory.path().join("nav.jsonl"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["msg"], "only once");
}


#[test]
fn environment_overrides_apply() {
    let directory = tempfile::tempdir().unwrap();
    let environment = EnvOverrides::empty()
        .with(EnvOverrides::PROJECT, "envproj")
        .with(EnvOverrides::LEVEL, "WARNING")
        .with(EnvOverrides::DIRECTORY, directory.path().to_string_lossy())
        .with(EnvOverrides::JSON, "1")
        .with(EnvOverrides::CONSOLE, "0");

    let logging = LoggingConfigurator::new();
    logging
        .configure_with_env(LoggingOptions::default().panic_hook(false), environment)
        .unwrap();

    assert_eq!(logging.root_level(), LogLevel::Warn);
    assert_eq!(logging.project().as_deref(), Some("envproj"));
    assert!(logging.console().is_none());

    assert!(directory.path().join("envproj.log").exists());
    assert!(directory.path().join("envproj.jsonl").exists());
}


#[test]
fn watch_writes_a_dedicated_module_file() {
    let directory = tempfile::tempdir().unwrap();
    let logging = LoggingConfigurator::new();

    let watched = logging
        .watch_with_env(
            "nav",
            "nav.module.sub",
            LogLevel::Debug,
            WatchOptions::default()
                .base_dir(directory.path())
                .retention_days(7),
            &EnvOverrides::empty(),
        )
        .unwrap();

    let module_file = directory
        .path()
        .join("nav")
        .join("module")
        .join("sub")
        .join("nav.nav.module.sub.log");
    assert!(module_file.exists(), "{}", module_file.display());
    assert_eq!(watched.file_name(), module_file.file_name());

    with_logging(&logging, || {
        tracing::debug!(target: "nav.module.sub", "trace fine");
        tracing::info!(target: "nav::module::sub", "info sub");
        tracing::info!(target: "nav.module", "not watched");
    });

    let content = fs::read_to_string(&module_file).unwrap();
    assert!(content.contains("trace fine") && content.contains("info sub"));
    assert!(!content.contains("not watched"));
    assert!(logging.root_handlers().is_empty());
}


#[test]
fn watch_prefers_an_explicit_base_dir_over_the_environment() {
    let explicit = tempfile::tempdir().unwrap();
    let from_environment = tempfile::tempdir().unwrap();
    let environment = EnvOverrides::empty()
        .with(EnvOverrides::DIRECTORY, from_environment.path().to_string_lossy());

    let logging = LoggingConfigurator::new();
    logging
        .watch_with_env(
            "nav",
            "nav.module.sub",
            LogLevel::Debug,
            WatchOptions::default().base_dir(explicit.path()),
            &environment,
        )
        .unwrap();

    let relative = Path::new("nav/module/sub/nav.nav.module.sub.log");
    assert!(explicit.path().join(relative).exists());
    assert!(!from_environment.path().join(relative).exists());

    // Without an explicit base directory, LOG_DIR applies.
    logging
        .watch_with_env(
            "nav",
            "nav.other",
            LogLevel::Debug,
            WatchOptions::default(),
            &environment,
        )
        .unwrap();

    assert!(from_environment.path().join("nav/other/nav.nav.other.log").exists());
}


#[test]
fn watched_records_still_reach_root_handlers() {
    let directory = tempfile::tempdir().unwrap();
    let logging = LoggingConfigurator::new();

    logging
        .configure_with_env(file_options("nav", directory.path()), EnvOverrides::empty())
        .unwrap();
    logging
        .watch_with_env(
            "nav",
            "nav.worker",
            LogLevel::Debug,
            WatchOptions::default().base_dir(directory.path()),
            &EnvOverrides::empty(),
        )
        .unwrap();

    with_logging(&logging, || {
        tracing::debug!(target: "nav.worker", "debug detail");
        tracing::warn!(target: "nav.worker.pool", "pool warning");
    });

    let module_log = fs::read_to_string(directory.path().join("nav/worker/nav.nav.worker.log")).unwrap();
    assert!(module_log.contains("debug detail") && module_log.contains("pool warning"));

    let root_log = fs::read_to_string(directory.path().join("nav.log")).unwrap();
    assert!(root_log.contains("pool warning"));
    // The root text handler keeps its own INFO threshold.
    assert!(!root_log.contains("debug detail"));
}


#[test]
fn forced_rollover_creates_one_dated_archive() {
    let directory = tempfile::tempdir().unwrap();
    let logging = LoggingConfigurator::new();

    logging
        .configure_with_env(
            file_options("nav", directory.path()).date_prefix_files(true),
            EnvOverrides::empty(),
        )
        .unwrap();

    let text_file = logging.file_handle(HandlerKind::TextFile).unwrap();
    assert_eq!(text_file.path().file_name().unwrap(), "nav.log");

    with_logging(&logging, || tracing::info!("pre-rollover"));
    text_file.force_rollover().unwrap();
    with_logging(&logging, || tracing::info!("post-rollover"));

    let archives = fs::read_dir(directory.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .filter(|file_name| is_dated_archive(file_name, "nav.log"))
        .collect::<Vec<_>>();

    assert_eq!(archives.len(), 1, "{archives:?}");
    assert!(fs::read_to_string(directory.path().join(&archives[0]))
        .unwrap()
        .contains("pre-rollover"));

    let live = fs::read_to_string(directory.path().join("nav.log")).unwrap();
    assert!(live.contains("post-rollover") && !live.contains("pre-rollover"));
}


#[test]
fn json_lines_stay_valid_with_quotes_and_newlines() {
    let directory = tempfile::tempdir().unwrap();
    let logging = LoggingConfigurator::new();

    logging
        .configure_with_env(
            file_options("nav", directory.path())
                .log_file(false)
                .json_file(true),
            EnvOverrides::empty(),
        )
        .unwrap();

    with_logging(&logging, || {
        tracing::info!(target: "nav.json.test", "message \"avec\" des\nsauts de ligne");
    });

    assert!(!directory.path().join("nav.log").exists());

    let records = json_lines(&directory.path().join("nav.jsonl"));
    let last = records.last().unwrap();
    assert!(last["msg"].as_str().unwrap().starts_with("message \"avec\" des"));
    assert_eq!(last["logger"], "nav.json.test");
}


#[tracing::instrument]
fn load_settings() {
    tracing::info!(target: "nav.settings", "loading");
}

#[test]
fn json_records_name_the_function_and_thread() {
    let directory = tempfile::tempdir().unwrap();
    let logging = LoggingConfigurator::new();

    logging
        .configure_with_env(
            file_options("nav", directory.path())
                .log_file(false)
                .json_file(true),
            EnvOverrides::empty(),
        )
        .unwrap();

    with_logging(&logging, || {
        load_settings();
        tracing::info!(target: "nav.settings", "outside");
    });

    let records = json_lines(&directory.path().join("nav.jsonl"));
    assert_eq!(records.len(), 2);

    assert_eq!(records[0]["func"], "load_settings");
    assert!(records[1]["func"].is_null());

    assert!(records[0]["thread"].is_u64());
    assert_eq!(records[0]["thread"], records[1]["thread"]);
}


#[test]
fn error_sources_are_recorded() {
    #[derive(Debug, thiserror::Error)]
    #[error("could not load settings")]
    struct LoadError(#[source] std::io::Error);

    let directory = tempfile::tempdir().unwrap();
    let logging = LoggingConfigurator::new();

    logging
        .configure_with_env(
            file_options("nav", directory.path()).json_file(true),
            EnvOverrides::empty(),
        )
        .unwrap();

    with_logging(&logging, || {
        let error = LoadError(std::io::Error::new(std::io::ErrorKind::NotFound, "missing file"));
        tracing::error!(
            error = &error as &(dyn std::error::Error + 'static),
            "startup failed"
        );
    });

    let text = fs::read_to_string(directory.path().join("nav.log")).unwrap();
    assert!(text.contains("Caused by: missing file"), "{text}");

    let records = json_lines(&directory.path().join("nav.jsonl"));
    let exc_info = records[0]["exc_info"].as_str().unwrap();
    assert!(exc_info.starts_with("could not load settings"));
    assert!(exc_info.contains("missing file"));
}


#[test]
fn console_handle_is_remembered() {
    let directory = tempfile::tempdir().unwrap();
    let console = Console::buffer();
    let logging = LoggingConfigurator::new().with_console(console.clone());

    logging
        .configure_with_env(
            file_options("nav", directory.path())
                .console(true)
                .log_file(false),
            EnvOverrides::empty(),
        )
        .unwrap();

    let remembered = logging.console().unwrap();
    assert!(remembered.same_as(&console));

    with_logging(&logging, || tracing::warn!(target: "nav", "visible"));
    assert!(console.contents().unwrap().contains("visible"));

    let unconfigured = LoggingConfigurator::new();
    assert!(unconfigured.console().is_none());
}

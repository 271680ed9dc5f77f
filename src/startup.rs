use crate::config::{ConfigError, ConfigStore, Configuration};
use crate::ffmpeg::locate_ffmpeg;
use crate::tui::Dialogue;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug)]
pub struct StartupReport {
    pub config: Configuration,
    pub checks: Vec<CheckResult>,
}

impl StartupReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.ok)
    }
}

/// Runs the config, ffmpeg and argument checks, printing each result.
///
/// A missing config file fails its check but is replaced by the default so
/// the remaining checks still run. A config that exists but does not parse is
/// returned as an error.
pub fn run_checks(
    store: &ConfigStore,
    hash: Option<&str>,
    input_path: Option<&Path>,
    dialogue: &mut dyn Dialogue,
) -> Result<StartupReport, ConfigError> {
    let mut checks = Vec::with_capacity(3);

    let path = store.path().display();
    let config = if store.exists() {
        checks.push(pass(format!("config.yaml found at {path}")));
        store.load()?
    } else {
        let config = store.create_default()?;
        let msg = format!("config.yaml not found. -> created at {path}");
        checks.push(fail(msg));
        config
    };
    print_check(dialogue, &checks[0]);

    let ffmpeg = check_ffmpeg(&config.ffmpeg_path);
    print_check(dialogue, &ffmpeg);
    checks.push(ffmpeg);

    let args = check_arguments(hash, input_path);
    print_check(dialogue, &args);
    checks.push(args);

    let report = StartupReport { config, checks };
    info!(passed = report.passed(), "startup checks finished");
    Ok(report)
}

pub fn check_ffmpeg(ffmpeg_path: &str) -> CheckResult {
    match locate_ffmpeg(ffmpeg_path) {
        Some(found) => pass(format!("ffmpeg executable found at {}", found.display())),
        None => fail(format!("ffmpeg executable not found at {ffmpeg_path}")),
    }
}

/// `--hash` and `--input_path` go together or not at all.
pub fn check_arguments(hash: Option<&str>, input_path: Option<&Path>) -> CheckResult {
    match (hash, input_path) {
        (Some(_), Some(_)) => pass("--hash and --input_path given: scripted mode".into()),
        (None, None) => pass("no scripting arguments: interactive mode".into()),
        (Some(_), None) => fail("--hash requires --input_path".into()),
        (None, Some(_)) => fail("--input_path requires --hash".into()),
    }
}

fn pass(message: String) -> CheckResult {
    CheckResult { ok: true, message }
}

fn fail(message: String) -> CheckResult {
    CheckResult { ok: false, message }
}

fn print_check(dialogue: &mut dyn Dialogue, check: &CheckResult) {
    dialogue.check(check.ok, &check.message);
}

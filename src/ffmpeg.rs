use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};
use which::which;

/// Spawns a rendered argument vector. Returns the child's exit code, if any.
pub trait Executor {
    fn execute(&mut self, argv: &[String]) -> Result<Option<i32>>;
}

/// Runs the child with inherited stdio and waits for it.
#[derive(Debug, Default)]
pub struct FfmpegProcess;

impl Executor for FfmpegProcess {
    fn execute(&mut self, argv: &[String]) -> Result<Option<i32>> {
        let Some((program, args)) = argv.split_first() else {
            bail!("refusing to run an empty command");
        };
        debug!(%program, ?args, "spawning");
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("failed to spawn `{program}`"))?;
        if !status.success() {
            warn!("`{program}` exited with status: {status}");
        }
        Ok(status.code())
    }
}

/// Locates the configured ffmpeg. A regular file at `path` wins; a bare
/// program name is looked up on PATH.
pub fn locate_ffmpeg(path: &str) -> Option<PathBuf> {
    let candidate = Path::new(path);
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    if path.is_empty() || candidate.components().count() != 1 {
        return None;
    }
    which(path).ok()
}

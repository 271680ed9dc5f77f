use clap::{ArgAction, Parser, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "kffmpeg",
    version,
    about = "A simple ffmpeg wrapper driven by command presets in config.yaml",
    disable_version_flag = true
)]
pub struct Cli {
    /// Print version and exit
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,

    /// Show config.yaml and exit
    #[arg(short = 'c', long, action = ArgAction::SetTrue)]
    pub config: bool,

    /// Run the preset whose title hashes to this value (requires --input_path)
    #[arg(long)]
    pub hash: Option<String>,

    /// Input file for scripted mode (requires --hash)
    #[arg(long = "input_path", value_hint = ValueHint::FilePath)]
    pub input_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    ShowConfig,
    Scripted { hash: String, input_path: PathBuf },
    Interactive,
}

impl Cli {
    /// Show-config wins over scripted mode, which wins over the dialogue.
    /// Only meaningful once the argument check has passed.
    pub fn mode(&self) -> RunMode {
        if self.config {
            return RunMode::ShowConfig;
        }
        match (&self.hash, &self.input_path) {
            (Some(hash), Some(input_path)) => RunMode::Scripted {
                hash: hash.clone(),
                input_path: input_path.clone(),
            },
            _ => RunMode::Interactive,
        }
    }
}

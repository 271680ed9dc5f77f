use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const CONFIG_ENV_VAR: &str = "KFFMPEG_CONFIG";

pub const PLACEHOLDER_FFMPEG: &str = "{{ffmpeg_path}}";
pub const PLACEHOLDER_INPUT: &str = "{{input_path}}";
pub const PLACEHOLDER_OPTIONS: &str = "{{options}}";
pub const PLACEHOLDER_OUTPUT: &str = "{{output_path}}";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot determine the directory of the running executable")]
    NoExecutableDir(#[source] std::io::Error),
    #[error("cannot access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config at {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("cannot serialize config")]
    Serialize(#[from] serde_yaml::Error),
}

/// Value half of a flag/value pair. YAML numbers stay numbers until the
/// operator overrides them, at which point they become text. A missing or
/// null value leaves the flag on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Integer(i64),
    Float(f64),
    Text(String),
    #[default]
    Empty,
}

impl OptionValue {
    pub fn is_empty(&self) -> bool {
        match self {
            OptionValue::Empty => true,
            OptionValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Integer(n) => write!(f, "{n}"),
            // Debug keeps the fractional part: 2.0 stays "2.0"
            OptionValue::Float(x) => write!(f, "{x:?}"),
            OptionValue::Text(s) => f.write_str(s),
            OptionValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<i64> for OptionValue {
    fn from(n: i64) -> Self {
        OptionValue::Integer(n)
    }
}

impl From<f64> for OptionValue {
    fn from(x: f64) -> Self {
        OptionValue::Float(x)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagOption {
    pub flag: String,
    #[serde(default)]
    pub value: OptionValue,
}

impl FlagOption {
    pub fn new(flag: &str, value: impl Into<OptionValue>) -> Self {
        Self {
            flag: flag.to_string(),
            value: value.into(),
        }
    }

    /// Argument form: `flag value`, or just `flag` when the value is empty.
    pub fn args(&self) -> Vec<String> {
        if self.value.is_empty() {
            vec![self.flag.clone()]
        } else {
            vec![self.flag.clone(), self.value.to_string()]
        }
    }
}

impl fmt::Display for FlagOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            f.write_str(&self.flag)
        } else {
            write!(f, "{} {}", self.flag, self.value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandPreset {
    pub title: String,
    pub options: Vec<FlagOption>,
    pub output_extension: String,
    pub output_filename_suffix: String,
    #[serde(rename = "command")]
    pub command_template: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub ffmpeg_path: String,
    pub commands: Vec<CommandPreset>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            ffmpeg_path: "/usr/bin/ffmpeg".to_string(),
            commands: vec![CommandPreset {
                title: "Make video lighter by using h264_nvenc CQ 32".to_string(),
                options: vec![
                    FlagOption::new("-cq", 32_i64),
                    FlagOption::new("-c:v", "h264_nvenc"),
                ],
                output_extension: ".mp4".to_string(),
                output_filename_suffix: "_light".to_string(),
                command_template: vec![
                    PLACEHOLDER_FFMPEG.to_string(),
                    "-i".to_string(),
                    PLACEHOLDER_INPUT.to_string(),
                    PLACEHOLDER_OPTIONS.to_string(),
                    PLACEHOLDER_OUTPUT.to_string(),
                ],
            }],
        }
    }
}

/// Owns the location of `config.yaml` and nothing else.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$KFFMPEG_CONFIG` if set, otherwise `config.yaml` beside the executable.
    pub fn locate() -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR);
        if let Some(path) = from_env.filter(|p| !p.is_empty()) {
            return Ok(Self::new(path));
        }
        let exe = std::env::current_exe().map_err(ConfigError::NoExecutableDir)?;
        let dir = exe.parent().unwrap_or(Path::new("."));
        Ok(Self::new(dir.join(CONFIG_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn create_default(&self) -> Result<Configuration, ConfigError> {
        let config = Configuration::default();
        let text = serde_yaml::to_string(&config)?;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(io_error(dir))?;
            }
        }
        fs::write(&self.path, text).map_err(io_error(&self.path))?;
        debug!(path = %self.path.display(), "wrote default config");
        Ok(config)
    }

    pub fn read_raw(&self) -> Result<String, ConfigError> {
        fs::read_to_string(&self.path).map_err(io_error(&self.path))
    }

    pub fn load(&self) -> Result<Configuration, ConfigError> {
        let text = self.read_raw()?;
        let config: Configuration = match serde_yaml::from_str(&text) {
            Ok(config) => config,
            Err(source) => {
                return Err(ConfigError::Parse {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        debug!(
            path = %self.path.display(),
            presets = config.commands.len(),
            "loaded config"
        );
        Ok(config)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError {
    let path = path.to_path_buf();
    move |source| ConfigError::Io { path, source }
}

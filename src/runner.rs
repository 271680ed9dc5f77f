use crate::cli::RunMode;
use crate::config::{CommandPreset, ConfigStore, Configuration, FlagOption, OptionValue};
use crate::ffmpeg::Executor;
use crate::preset::{self, ResolveError};
use crate::template::{self, RenderedCommand, Substitutions};
use crate::tui::Dialogue;
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How a run ended, when it ended normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    ConfigShown,
    Done,
    Aborted,
}

pub struct Runner<'a> {
    config: Configuration,
    store: &'a ConfigStore,
    cwd: PathBuf,
    dialogue: &'a mut dyn Dialogue,
    executor: &'a mut dyn Executor,
}

impl<'a> Runner<'a> {
    pub fn new(
        config: Configuration,
        store: &'a ConfigStore,
        cwd: PathBuf,
        dialogue: &'a mut dyn Dialogue,
        executor: &'a mut dyn Executor,
    ) -> Self {
        Self {
            config,
            store,
            cwd,
            dialogue,
            executor,
        }
    }

    pub fn run(&mut self, mode: RunMode) -> Result<Outcome> {
        match mode {
            RunMode::ShowConfig => self.show_config(),
            RunMode::Scripted { hash, input_path } => self.run_scripted(&hash, &input_path),
            RunMode::Interactive => self.run_interactive(),
        }
    }

    fn show_config(&mut self) -> Result<Outcome> {
        let raw = self.store.read_raw()?;
        let msg = format!("config.yaml path is {}", self.store.path().display());
        self.dialogue.system(&msg);
        self.dialogue.line(raw.trim_end());
        Ok(Outcome::ConfigShown)
    }

    fn run_scripted(&mut self, hash: &str, input_path: &Path) -> Result<Outcome> {
        let (_, found) = preset::find_by_hash(&self.config.commands, hash)?;
        let preset = found.clone();
        check_template(&preset)?;
        info!(title = %preset.title, "scripted run");

        let Some(input) = input_path.to_str() else {
            bail!("input path {} is not valid UTF-8", input_path.display());
        };
        if !input_path.exists() {
            warn!("input {input} does not exist");
        }

        let output = default_output_path(&self.cwd, input, &preset);
        let rendered = self.render(&preset, input, &preset.options, &output)?;
        let msg = format!("Executing: {}", rendered.preview());
        self.dialogue.system(&msg);
        self.execute(&rendered)
    }

    fn run_interactive(&mut self) -> Result<Outcome> {
        let preset = self.choose_preset()?;
        check_template(&preset)?;
        let input = self.ask_input_path()?;
        let options = self.review_options(preset.options.clone())?;
        let output = self.confirm_output_path(&preset, &input)?;

        self.dialogue.line("");
        let rendered = self.render(&preset, &input, &options, &output)?;
        self.dialogue.system("Generated command:");
        self.dialogue.line(&rendered.preview());
        let prompt = "Do you want to execute this command?";
        if self.dialogue.confirm(prompt)? {
            self.execute(&rendered)
        } else {
            self.dialogue.system("Aborted.");
            Ok(Outcome::Aborted)
        }
    }

    fn choose_preset(&mut self) -> Result<CommandPreset> {
        if self.config.commands.is_empty() {
            return Err(ResolveError::NoPresets.into());
        }
        self.dialogue.system("Choose a command.");
        for line in preset::menu_lines(&self.config.commands) {
            self.dialogue.line(&line);
        }
        let index = self.ask_index("Choice", self.config.commands.len())?;
        let chosen = self.config.commands[index].clone();
        let msg = format!("Chosen command: {}", chosen.title);
        self.dialogue.user(&msg);
        self.dialogue.line("");
        Ok(chosen)
    }

    fn ask_input_path(&mut self) -> Result<String> {
        self.dialogue.system("Input the path of the video file.");
        let input = self.dialogue.ask("Input path")?;
        self.dialogue.user(&format!("Input path: {input}"));
        self.dialogue.line("");
        Ok(input)
    }

    /// Edits run against this run's own copy of the options; nothing is
    /// written back to the configuration.
    fn review_options(&mut self, mut options: Vec<FlagOption>) -> Result<Vec<FlagOption>> {
        loop {
            self.dialogue.system("Options are below. Is it OK?");
            for option in &options {
                self.dialogue.line(&format!("    {option}"));
            }
            if options.is_empty() || self.dialogue.confirm("OK?")? {
                return Ok(options);
            }

            self.dialogue.system("Choose option you want to modify.");
            for (i, option) in options.iter().enumerate() {
                self.dialogue.line(&format!("    {i}: {option}"));
            }
            let index = self.ask_index("Choice", options.len())?;
            let msg = format!("Chosen option: {}", options[index]);
            self.dialogue.user(&msg);

            self.dialogue.system("Input new value.");
            let value = self.dialogue.ask("New value")?;
            self.dialogue.user(&format!("New value: {value}"));
            debug!(flag = %options[index].flag, %value, "option edited");
            options[index] = FlagOption {
                flag: options[index].flag.clone(),
                value: OptionValue::Text(value),
            };
        }
    }

    fn confirm_output_path(&mut self, preset: &CommandPreset, input: &str) -> Result<String> {
        let default = default_output_path(&self.cwd, input, preset);
        self.dialogue.line("");
        let msg = format!("Current output path is: {default}");
        self.dialogue.system(&msg);
        if self.dialogue.confirm("Is it OK?")? {
            return Ok(default);
        }
        self.dialogue.system("Input new output path.");
        let output = self.dialogue.ask("Output path")?;
        self.dialogue.user(&format!("Output path: {output}"));
        Ok(output)
    }

    /// Re-prompts until the operator enters a valid index.
    fn ask_index(&mut self, prompt: &str, len: usize) -> Result<usize> {
        loop {
            let raw = self.dialogue.ask(prompt)?;
            match preset::parse_choice(&raw, len) {
                Ok(index) => return Ok(index),
                Err(err) => {
                    let msg = format!("Invalid choice: {err}. Try again.");
                    self.dialogue.system(&msg);
                }
            }
        }
    }

    fn render(
        &self,
        preset: &CommandPreset,
        input: &str,
        options: &[FlagOption],
        output: &str,
    ) -> Result<RenderedCommand> {
        let subs = Substitutions {
            ffmpeg_path: &self.config.ffmpeg_path,
            input_path: input,
            output_path: output,
            options,
        };
        match template::render(&preset.command_template, &subs) {
            Ok(rendered) => Ok(rendered),
            Err(err) => Err(anyhow::Error::new(err).context(malformed(preset))),
        }
    }

    fn execute(&mut self, rendered: &RenderedCommand) -> Result<Outcome> {
        self.dialogue.system("Executing command...");
        let code = self.executor.execute(&rendered.argv())?;
        debug!(?code, "child finished");
        self.dialogue.system("Done.");
        Ok(Outcome::Done)
    }
}

/// Fails before any further prompt when the preset's template is unusable.
fn check_template(preset: &CommandPreset) -> Result<()> {
    match template::validate(&preset.command_template) {
        Ok(_) => Ok(()),
        Err(err) => Err(anyhow::Error::new(err).context(malformed(preset))),
    }
}

fn malformed(preset: &CommandPreset) -> String {
    format!("command \"{}\" has a malformed template", preset.title)
}

/// `<cwd>/<input without extension><suffix><extension>`. An absolute input
/// keeps its own directory.
pub fn default_output_path(cwd: &Path, input: &str, preset: &CommandPreset) -> String {
    let stem = Path::new(input).with_extension("");
    let file = format!(
        "{}{}{}",
        stem.to_string_lossy(),
        preset.output_filename_suffix,
        preset.output_extension
    );
    cwd.join(file).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CONFIG_FILE_NAME, PLACEHOLDER_FFMPEG, PLACEHOLDER_INPUT, PLACEHOLDER_OPTIONS,
        PLACEHOLDER_OUTPUT,
    };
    use crate::preset::preset_hash;
    use crate::tui::testing::ScriptedDialogue;

    #[derive(Default)]
    struct RecordingExecutor {
        runs: Vec<Vec<String>>,
    }

    impl Executor for RecordingExecutor {
        fn execute(&mut self, argv: &[String]) -> Result<Option<i32>> {
            self.runs.push(argv.to_vec());
            Ok(Some(0))
        }
    }

    fn light_preset() -> CommandPreset {
        CommandPreset {
            title: "Light".into(),
            options: vec![FlagOption::new("-cq", 32_i64)],
            output_extension: ".mp4".into(),
            output_filename_suffix: "_light".into(),
            command_template: vec![
                PLACEHOLDER_FFMPEG.to_string(),
                "-i".to_string(),
                PLACEHOLDER_INPUT.to_string(),
                PLACEHOLDER_OPTIONS.to_string(),
                PLACEHOLDER_OUTPUT.to_string(),
            ],
        }
    }

    fn light_argv() -> Vec<String> {
        let argv = [
            "/usr/bin/ffmpeg",
            "-i",
            "clip.mov",
            "-cq",
            "32",
            "/out/clip_light.mp4",
        ];
        argv.iter().map(|s| s.to_string()).collect()
    }

    fn config() -> Configuration {
        Configuration {
            ffmpeg_path: "/usr/bin/ffmpeg".into(),
            commands: vec![light_preset()],
        }
    }

    /// `Light` with its `{{output_path}}` token removed.
    fn malformed_config() -> Configuration {
        let mut cfg = config();
        let template = &mut cfg.commands[0].command_template;
        template.retain(|t| t != PLACEHOLDER_OUTPUT);
        cfg
    }

    fn scripted_light(input_path: PathBuf) -> RunMode {
        RunMode::Scripted {
            hash: preset_hash("Light"),
            input_path,
        }
    }

    struct Harness {
        store: ConfigStore,
        dialogue: ScriptedDialogue,
        executor: RecordingExecutor,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        fn new(answers: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = ConfigStore::new(dir.path().join(CONFIG_FILE_NAME));
            Self {
                store,
                dialogue: ScriptedDialogue::new(answers),
                executor: RecordingExecutor::default(),
                _dir: dir,
            }
        }

        fn run(&mut self, config: Configuration, mode: RunMode) -> Result<Outcome> {
            let cwd = PathBuf::from("/out");
            let mut runner = Runner::new(
                config,
                &self.store,
                cwd,
                &mut self.dialogue,
                &mut self.executor,
            );
            runner.run(mode)
        }

        fn prompts(&self) -> Vec<&String> {
            let asked = self.dialogue.output.iter();
            asked.filter(|l| l.starts_with("? ")).collect()
        }
    }

    #[test]
    fn test_default_output_path() {
        let preset = light_preset();
        let out = |input| default_output_path(Path::new("/out"), input, &preset);
        assert_eq!(out("clip.mov"), "/out/clip_light.mp4");
        assert_eq!(out("sub/clip.mov"), "/out/sub/clip_light.mp4");
        assert_eq!(out("/videos/clip.mov"), "/videos/clip_light.mp4");
        assert_eq!(out("noext"), "/out/noext_light.mp4");
    }

    #[test]
    fn test_interactive_happy_path() {
        let mut h = Harness::new(&["0", "clip.mov", "y", "y", "y"]);
        let outcome = h.run(config(), RunMode::Interactive).unwrap();
        assert_eq!(outcome, Outcome::Done);
        assert_eq!(h.executor.runs, vec![light_argv()]);
        assert!(h.dialogue.shown("SYSTEM Done."));
        assert!(h.dialogue.shown(&preset_hash("Light")));
    }

    #[test]
    fn test_interactive_abort_spawns_nothing() {
        let mut h = Harness::new(&["0", "clip.mov", "y", "y", "n"]);
        let outcome = h.run(config(), RunMode::Interactive).unwrap();
        assert_eq!(outcome, Outcome::Aborted);
        assert!(h.executor.runs.is_empty());
        assert!(h.dialogue.shown("SYSTEM Aborted."));
    }

    #[test]
    fn test_interactive_edit_options_repeatedly() {
        let mut answers = vec!["0", "clip.mov"];
        answers.extend(["n", "0", "28"]);
        answers.extend(["n", "0", "24"]);
        answers.extend(["y", "y", "y"]);
        let mut h = Harness::new(&answers);
        let cfg = config();
        h.run(cfg.clone(), RunMode::Interactive).unwrap();
        assert_eq!(h.executor.runs[0][3..5], ["-cq", "24"]);
        assert!(h.dialogue.shown("USER New value: 28"));
        assert_eq!(cfg.commands[0].options[0].value, OptionValue::Integer(32));
    }

    #[test]
    fn test_interactive_override_output_path() {
        let mut h = Harness::new(&["0", "clip.mov", "y", "n", "/tmp/custom.mkv", "y"]);
        h.run(config(), RunMode::Interactive).unwrap();
        assert_eq!(h.executor.runs[0].last().unwrap(), "/tmp/custom.mkv");
    }

    #[test]
    fn test_invalid_menu_choice_reprompts() {
        let mut h = Harness::new(&["abc", "7", "0", "clip.mov", "y", "y", "y"]);
        let outcome = h.run(config(), RunMode::Interactive).unwrap();
        assert_eq!(outcome, Outcome::Done);
        assert!(h.dialogue.shown("Invalid choice: `abc` is not a number"));
        assert!(h.dialogue.shown("Invalid choice: 7 is out of range"));
    }

    #[test]
    fn test_interactive_without_presets() {
        let mut h = Harness::new(&[]);
        let cfg = Configuration {
            ffmpeg_path: "ffmpeg".into(),
            commands: vec![],
        };
        let err = h.run(cfg, RunMode::Interactive).unwrap_err();
        let found = err.downcast_ref::<ResolveError>();
        assert_eq!(found, Some(&ResolveError::NoPresets));
    }

    #[test]
    fn test_malformed_template_fails_before_input_prompt() {
        let mut h = Harness::new(&["0", "clip.mov"]);
        let mode = RunMode::Interactive;
        let err = h.run(malformed_config(), mode).unwrap_err();
        assert!(format!("{err:#}").contains("\"Light\""));
        assert_eq!(h.prompts(), ["? Choice"]);
        assert_eq!(h.dialogue.remaining(), 1);
        assert!(h.executor.runs.is_empty());
    }

    #[test]
    fn test_scripted_runs_without_prompts() {
        let mut h = Harness::new(&[]);
        let mode = scripted_light(PathBuf::from("clip.mov"));
        assert_eq!(h.run(config(), mode).unwrap(), Outcome::Done);
        assert_eq!(h.executor.runs, vec![light_argv()]);
        assert!(h.prompts().is_empty());
    }

    #[test]
    fn test_scripted_unknown_hash() {
        let mut h = Harness::new(&[]);
        let mode = RunMode::Scripted {
            hash: "deadbeef".into(),
            input_path: PathBuf::from("clip.mov"),
        };
        let err = h.run(config(), mode).unwrap_err();
        let found = err.downcast_ref::<ResolveError>();
        assert!(matches!(found, Some(ResolveError::UnknownHash(_))));
        // the error itself is the only report; nothing is printed here
        assert!(h.dialogue.output.is_empty());
        assert!(h.executor.runs.is_empty());
    }

    #[test]
    fn test_scripted_malformed_template_names_preset() {
        let mut h = Harness::new(&[]);
        let mode = scripted_light(PathBuf::from("clip.mov"));
        let err = h.run(malformed_config(), mode).unwrap_err();
        assert!(format!("{err:#}").contains("\"Light\""));
        assert!(h.dialogue.output.is_empty());
        assert!(h.executor.runs.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_scripted_rejects_non_utf8_input() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut h = Harness::new(&[]);
        let input = OsStr::from_bytes(b"clip\xff.mov");
        let mode = scripted_light(PathBuf::from(input));
        let err = h.run(config(), mode).unwrap_err();
        assert!(err.to_string().contains("is not valid UTF-8"));
        assert!(h.executor.runs.is_empty());
    }

    #[test]
    fn test_show_config_prints_file_verbatim() {
        let mut h = Harness::new(&[]);
        h.store.create_default().unwrap();
        let raw = h.store.read_raw().unwrap();
        let outcome = h.run(config(), RunMode::ShowConfig).unwrap();
        assert_eq!(outcome, Outcome::ConfigShown);
        assert!(h.dialogue.shown("config.yaml path is"));
        assert!(h.dialogue.output.contains(&raw.trim_end().to_string()));
        assert!(h.executor.runs.is_empty());
        assert_eq!(h.dialogue.remaining(), 0);
    }
}

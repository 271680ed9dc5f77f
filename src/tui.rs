use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

/// Operator I/O. Every prompt and message in the dialogue goes through here.
pub trait Dialogue {
    /// Message from the tool to the operator.
    fn system(&mut self, msg: &str);
    /// Echo of what the operator chose.
    fn user(&mut self, msg: &str);
    fn line(&mut self, text: &str);
    /// One startup check result.
    fn check(&mut self, ok: bool, msg: &str);
    fn ask(&mut self, prompt: &str) -> Result<String>;
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

pub struct TermDialogue {
    theme: ColorfulTheme,
}

impl TermDialogue {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TermDialogue {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialogue for TermDialogue {
    fn system(&mut self, msg: &str) {
        println!("[{}] {msg}", style("SYSTEM").yellow());
    }

    fn user(&mut self, msg: &str) {
        println!("[{}] {msg}", style(" USER ").blue());
    }

    fn line(&mut self, text: &str) {
        println!("{text}");
    }

    fn check(&mut self, ok: bool, msg: &str) {
        let label = if ok {
            style("  OK  ").green()
        } else {
            style("  NG  ").red()
        };
        println!("[{label}] {msg}");
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        let raw: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(raw.trim().to_string())
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let confirm = Confirm::with_theme(&self.theme).with_prompt(prompt);
        Ok(confirm.interact()?)
    }
}

use crate::config::{
    FlagOption, PLACEHOLDER_FFMPEG, PLACEHOLDER_INPUT, PLACEHOLDER_OPTIONS, PLACEHOLDER_OUTPUT,
};
use thiserror::Error;

pub const PLACEHOLDERS: [&str; 4] = [
    PLACEHOLDER_FFMPEG,
    PLACEHOLDER_INPUT,
    PLACEHOLDER_OPTIONS,
    PLACEHOLDER_OUTPUT,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("malformed template: placeholder `{0}` is missing")]
    Missing(&'static str),
    #[error("malformed template: placeholder `{placeholder}` appears {count} times")]
    Duplicated {
        placeholder: &'static str,
        count: usize,
    },
}

/// Runtime values substituted into a preset's command template.
#[derive(Debug, Clone)]
pub struct Substitutions<'a> {
    pub ffmpeg_path: &'a str,
    pub input_path: &'a str,
    pub output_path: &'a str,
    pub options: &'a [FlagOption],
}

/// A template after substitution.
///
/// `tokens` mirrors the template one-to-one, with every option joined into the
/// single `{{options}}` slot. `argv` is what actually gets spawned: the slot is
/// replaced by each option's flag and value as separate arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    pub tokens: Vec<String>,
    options_slot: usize,
    option_args: Vec<String>,
}

impl RenderedCommand {
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.tokens.len() + self.option_args.len());
        argv.extend_from_slice(&self.tokens[..self.options_slot]);
        argv.extend(self.option_args.iter().cloned());
        argv.extend_from_slice(&self.tokens[self.options_slot + 1..]);
        argv
    }

    /// Shell-quoted form of `argv`, for showing the operator.
    pub fn preview(&self) -> String {
        shell_words::join(self.argv())
    }
}

pub fn join_options(options: &[FlagOption]) -> String {
    options
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Checks that each placeholder occurs exactly once and returns its position.
pub fn validate(template: &[String]) -> Result<[usize; 4], TemplateError> {
    let mut slots = [0usize; 4];
    for (slot, placeholder) in slots.iter_mut().zip(PLACEHOLDERS) {
        let mut hits = template
            .iter()
            .enumerate()
            .filter(|(_, tok)| tok.as_str() == placeholder)
            .map(|(i, _)| i);
        let first = hits.next().ok_or(TemplateError::Missing(placeholder))?;
        let extra = hits.count();
        if extra > 0 {
            return Err(TemplateError::Duplicated {
                placeholder,
                count: extra + 1,
            });
        }
        *slot = first;
    }
    Ok(slots)
}

pub fn render(template: &[String], subs: &Substitutions) -> Result<RenderedCommand, TemplateError> {
    let [ffmpeg_at, input_at, options_at, output_at] = validate(template)?;

    let mut tokens = template.to_vec();
    tokens[ffmpeg_at] = subs.ffmpeg_path.to_string();
    tokens[input_at] = subs.input_path.to_string();
    tokens[options_at] = join_options(subs.options);
    tokens[output_at] = subs.output_path.to_string();

    Ok(RenderedCommand {
        tokens,
        options_slot: options_at,
        option_args: subs.options.iter().flat_map(FlagOption::args).collect(),
    })
}

use crate::config::CommandPreset;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const HASH_LEN: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no command matches hash `{0}`")]
    UnknownHash(String),
    #[error("no commands are configured")]
    NoPresets,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChoiceError {
    #[error("`{0}` is not a number")]
    NotANumber(String),
    #[error("{index} is out of range (0..={max})")]
    OutOfRange { index: usize, max: usize },
}

/// First eight hex digits of SHA-256 over the title.
pub fn preset_hash(title: &str) -> String {
    let digest = Sha256::digest(title.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_LEN);
    hex
}

/// First preset in configured order whose hash equals `hash` exactly.
pub fn find_by_hash<'a>(
    presets: &'a [CommandPreset],
    hash: &str,
) -> Result<(usize, &'a CommandPreset), ResolveError> {
    presets
        .iter()
        .enumerate()
        .find(|(_, p)| preset_hash(&p.title) == hash)
        .ok_or_else(|| ResolveError::UnknownHash(hash.to_string()))
}

pub fn menu_lines(presets: &[CommandPreset]) -> Vec<String> {
    presets
        .iter()
        .enumerate()
        .map(|(i, p)| format!("    {i}: {} ({})", p.title, preset_hash(&p.title)))
        .collect()
}

/// Parses an operator-typed index into a list of `len` entries.
pub fn parse_choice(raw: &str, len: usize) -> Result<usize, ChoiceError> {
    let trimmed = raw.trim();
    let index: usize = trimmed
        .parse()
        .map_err(|_| ChoiceError::NotANumber(trimmed.to_string()))?;
    if index >= len {
        return Err(ChoiceError::OutOfRange {
            index,
            max: len.saturating_sub(1),
        });
    }
    Ok(index)
}

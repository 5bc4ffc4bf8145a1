use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{config_error, Result};
use crate::normalize::normalize;

/// Replacement used when a lexicon entry does not carry its own
pub const DEFAULT_REPLACEMENT: &str = "*****";

/// Profanity lexicon mapping normalized words to replacement text.
///
/// Replacements are carried for future use (subtitle rewriting, speech
/// synthesis); today only membership matters for audio scrubbing.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<String, String>,
}

impl Lexicon {
    /// Load a lexicon from a file. A `.json` extension selects a flat JSON
    /// array of bare words; anything else is parsed as line-oriented text
    /// where each non-blank line is `word` or `word|replacement`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(config_error(
                "swears",
                format!("Profanity file does not exist: {}", path.display()),
            ));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            config_error("swears", format!("Could not read {}: {}", path.display(), e))
        })?;

        let lexicon = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Self::from_json(&contents)?,
            _ => Self::from_text(&contents),
        };

        if lexicon.is_empty() {
            warn!("Profanity file {} contains no entries; nothing will be scrubbed", path.display());
        }

        debug!("Loaded {} lexicon entries from {}", lexicon.len(), path.display());
        Ok(lexicon)
    }

    /// Parse line-oriented text: `word` or `word|replacement`, blank lines
    /// and `#` comments ignored. On duplicate normalized keys the last
    /// line wins.
    pub fn from_text(contents: &str) -> Self {
        let mut entries = HashMap::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (word, replacement) = match line.split_once('|') {
                Some((w, r)) => (w, r.to_string()),
                None => (line, DEFAULT_REPLACEMENT.to_string()),
            };
            let key = normalize(word);
            if !key.is_empty() {
                entries.insert(key, replacement);
            }
        }
        Self { entries }
    }

    /// Parse a flat JSON array of bare words; every entry gets the default
    /// replacement mask.
    pub fn from_json(contents: &str) -> Result<Self> {
        let words: Vec<String> = serde_json::from_str(contents).map_err(|e| {
            config_error("swears", format!("Failed to parse JSON word list: {}", e))
        })?;
        Ok(Self::from_words(&words))
    }

    /// Build a lexicon from a list of bare words
    pub fn from_words(words: &[String]) -> Self {
        let mut entries = HashMap::new();
        for word in words {
            let key = normalize(word);
            if !key.is_empty() {
                entries.insert(key, DEFAULT_REPLACEMENT.to_string());
            }
        }
        Self { entries }
    }

    /// Check whether a raw word (pre-normalization) is in the lexicon
    pub fn is_profane(&self, word: &str) -> bool {
        self.entries.contains_key(&normalize(word))
    }

    /// Replacement text for a raw word, if it is in the lexicon
    pub fn replacement_for(&self, word: &str) -> Option<&str> {
        self.entries.get(&normalize(word)).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{config_error, validation_error, Result};
use crate::lexicon::Lexicon;

/// A recognized word with timing, confidence, and scrub classification.
///
/// Transcript JSON from older runs may spell the confidence field
/// `probability` (whisper) instead of `conf` (vosk); both are accepted.
/// The `scrub` flag is never trusted from a file, it is recomputed by
/// [`classify`] on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    pub start: f64,
    pub end: f64,
    #[serde(alias = "probability")]
    pub conf: f64,
    #[serde(default)]
    pub scrub: bool,
}

impl Word {
    pub fn new(word: impl Into<String>, start: f64, end: f64, conf: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
            conf,
            scrub: false,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Set `scrub` on every word from lexicon membership. Pure and idempotent:
/// the same transcript and lexicon always produce the same flags, so a
/// cached transcript can be re-classified against a different lexicon
/// without re-running recognition.
pub fn classify(mut words: Vec<Word>, lexicon: &Lexicon) -> Vec<Word> {
    for word in &mut words {
        word.scrub = lexicon.is_profane(&word.word);
    }
    let naughty = words.iter().filter(|w| w.scrub).count();
    info!("Classified {} words, {} flagged for scrubbing", words.len(), naughty);
    words
}

/// Structural checks on a transcript, run before any encoding work:
/// non-empty word text, non-negative durations, non-decreasing start times.
pub fn validate(words: &[Word]) -> Result<()> {
    let mut previous_start = f64::NEG_INFINITY;
    for (i, word) in words.iter().enumerate() {
        if word.word.trim().is_empty() {
            return Err(validation_error(format!("Transcript entry {} has empty word text", i)));
        }
        if word.end < word.start {
            return Err(validation_error(format!(
                "Transcript entry {} ('{}') has negative duration: start={}, end={}",
                i, word.word, word.start, word.end
            )));
        }
        if word.start < previous_start {
            return Err(validation_error(format!(
                "Transcript entry {} ('{}') starts at {} before previous entry at {}",
                i, word.word, word.start, previous_start
            )));
        }
        previous_start = word.start;
    }
    Ok(())
}

/// Load a transcript JSON file (array of word objects). Any persisted
/// `scrub` flags are cleared; classification happens downstream.
pub fn load(path: &Path) -> Result<Vec<Word>> {
    if !path.is_file() {
        return Err(config_error(
            "transcript",
            format!("Transcript file does not exist: {}", path.display()),
        ));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        config_error("transcript", format!("Could not read {}: {}", path.display(), e))
    })?;

    let mut words: Vec<Word> = serde_json::from_str(&contents).map_err(|e| {
        config_error("transcript", format!("Failed to parse {}: {}", path.display(), e))
    })?;

    for word in &mut words {
        word.scrub = false;
    }

    debug!("Loaded {} words from transcript {}", words.len(), path.display());
    Ok(words)
}

/// Persist a transcript as JSON; written at most once per run
pub fn save(path: &Path, words: &[Word]) -> Result<()> {
    let json = serde_json::to_string(words).map_err(|e| {
        crate::error::WordplugError::Processing {
            message: format!("Failed to serialize transcript: {}", e),
        }
    })?;
    std::fs::write(path, json).map_err(|e| crate::error::fs_error(e, path.to_path_buf()))?;
    info!("Saved transcript to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_words() -> Vec<Word> {
        vec![
            Word::new("hello", 0.0, 0.5, 0.9),
            Word::new("damn", 0.5, 1.0, 0.8),
            Word::new("world", 1.0, 1.5, 0.95),
        ]
    }

    #[test]
    fn test_classify_flags_lexicon_words() {
        let lexicon = Lexicon::from_text("damn");
        let words = classify(sample_words(), &lexicon);
        assert_eq!(
            words.iter().map(|w| w.scrub).collect::<Vec<_>>(),
            vec![false, true, false]
        );
    }

    #[test]
    fn test_classify_is_idempotent() {
        let lexicon = Lexicon::from_text("damn\nhell");
        let once = classify(sample_words(), &lexicon);
        let twice = classify(once.clone(), &lexicon);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_classify_against_different_lexicons() {
        let words = sample_words();
        let first = classify(words.clone(), &Lexicon::from_text("damn"));
        assert!(first[1].scrub);
        let second = classify(words, &Lexicon::from_text("hell"));
        assert!(!second[1].scrub);
    }

    #[test]
    fn test_validate_accepts_ordered_transcript() {
        assert!(validate(&sample_words()).is_ok());
        assert!(validate(&[]).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_word() {
        let words = vec![Word::new("  ", 0.0, 0.5, 0.9)];
        assert!(validate(&words).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_duration() {
        let words = vec![Word::new("oops", 1.0, 0.5, 0.9)];
        assert!(validate(&words).is_err());
    }

    #[test]
    fn test_validate_rejects_non_monotonic_starts() {
        let words = vec![
            Word::new("later", 2.0, 2.5, 0.9),
            Word::new("earlier", 1.0, 1.5, 0.9),
        ];
        assert!(validate(&words).is_err());
    }

    #[test]
    fn test_load_accepts_probability_alias_and_resets_scrub() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.json");
        std::fs::write(
            &path,
            r#"[{"word":"damn","start":0.5,"end":1.0,"probability":0.8,"scrub":true}]"#,
        )
        .unwrap();

        let words = load(&path).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].conf, 0.8);
        assert!(!words[0].scrub, "persisted scrub flags must not be trusted");
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let result = load(Path::new("/nonexistent/transcript.json"));
        assert!(matches!(
            result,
            Err(crate::error::WordplugError::Config { .. })
        ));
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.json");

        let words = classify(sample_words(), &Lexicon::from_text("damn"));
        save(&path, &words).unwrap();

        let reloaded = load(&path).unwrap();
        assert_eq!(reloaded.len(), words.len());
        assert_eq!(reloaded[1].word, "damn");
        // scrub comes back cleared until reclassified
        assert!(reloaded.iter().all(|w| !w.scrub));
    }
}

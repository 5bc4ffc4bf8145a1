use log::{debug, info};
use std::path::PathBuf;

use crate::config::{plan_output, Config, Engine};
use crate::encoder::{self, EncodeParamTable};
use crate::error::{IntoWordplugError, Result};
use crate::filtergraph::{self, FilterDirective};
use crate::intervals;
use crate::lexicon::Lexicon;
use crate::recognizer::{Recognizer, VoskRecognizer, WhisperRecognizer};
use crate::tagging;
use crate::transcript::{self, Word};

/// Where this run's transcript comes from. Decided once, before any
/// recognition work.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptSource {
    Override(PathBuf),
    Cache(PathBuf),
    Recognize,
}

/// An explicit override always wins, even over a forced re-transcription.
/// Otherwise a prior cache file is reused when caching is enabled and
/// re-transcription was not requested.
pub fn transcript_source(config: &Config) -> TranscriptSource {
    if let Some(path) = &config.transcript_override {
        return TranscriptSource::Override(path.clone());
    }
    if let Some(cache) = &config.transcript_cache {
        if cache.is_file() && !config.force_retranscribe {
            return TranscriptSource::Cache(cache.clone());
        }
    }
    TranscriptSource::Recognize
}

fn build_recognizer(config: &Config) -> Box<dyn Recognizer> {
    match config.engine {
        Engine::Whisper => Box::new(WhisperRecognizer::new(
            config.whisper_model_name.clone(),
            config.whisper_model_dir.clone(),
        )),
        Engine::Vosk => Box::new(VoskRecognizer::new(config.vosk_model_dir.clone())),
    }
}

/// Run the whole censoring pipeline for one input file.
///
/// Strictly sequential: probe → tag gate → transcript acquisition →
/// classify → synthesize → filter directive → encode → tag. Returns the
/// output path on success.
pub async fn run(config: &Config) -> Result<PathBuf> {
    let media_info = encoder::probe(&config.input_file).await?;
    process(config, &media_info).await
}

/// Everything after the probe. Split out so the tag gate and the rest of
/// the sequence can run against already-gathered media info.
pub async fn process(config: &Config, media_info: &encoder::MediaInfo) -> Result<PathBuf> {
    let table = EncodeParamTable::default();
    let plan = plan_output(config, media_info, &table)?;

    // cheap checks before any recognition or encoding work
    let lexicon = Lexicon::load(&config.swears_file)?;

    if tagging::already_tagged(&media_info.tags) && !config.force {
        info!(
            "{} already carries the processed tag; copying verbatim",
            config.input_file.display()
        );
        encoder::remove_stale_output(&plan.output_file)?;
        std::fs::copy(&config.input_file, &plan.output_file)
            .with_path(plan.output_file.clone())?;
        return Ok(plan.output_file);
    }

    encoder::remove_stale_output(&plan.output_file)?;

    let source = transcript_source(config);
    debug!("Transcript source: {:?}", source);

    let (words, freshly_recognized) = match &source {
        TranscriptSource::Override(path) | TranscriptSource::Cache(path) => {
            info!("Loading transcript from {}", path.display());
            (transcript::load(path)?, false)
        }
        TranscriptSource::Recognize => {
            let recognizer = build_recognizer(config);
            info!("Transcribing {} with {}", config.input_file.display(), recognizer.name());
            (recognizer.recognize(&config.input_file).await?, true)
        }
    };

    transcript::validate(&words)?;
    let words = transcript::classify(words, &lexicon);

    // written at most once per run, and only for a fresh transcription
    if freshly_recognized {
        if let Some(cache) = &config.transcript_cache {
            transcript::save(cache, &words)?;
        }
    }

    let naughty: Vec<Word> = words.into_iter().filter(|w| w.scrub).collect();
    let directive = build_directive(config, &naughty)?;

    if directive.is_empty() {
        info!("Nothing to censor; re-encoding without filters");
    }

    encoder::encode(
        &config.input_file,
        &directive,
        &plan.encode_params,
        plan.video_mode,
        &plan.output_file,
    )
    .await?;

    tagging::mark_processed(&plan.output_file).await;

    info!("Wrote {}", plan.output_file.display());
    Ok(plan.output_file)
}

/// Pure transform from the naughty-word list to the filter directive
pub fn build_directive(config: &Config, naughty: &[Word]) -> Result<FilterDirective> {
    if naughty.is_empty() {
        return Ok(FilterDirective::Empty);
    }

    if config.beep {
        let beep_plan = intervals::synthesize_beep(naughty, config.pads, config.beep_hertz)?;
        Ok(filtergraph::build_beep_graph(&beep_plan, &config.beep_mix))
    } else {
        let regions = intervals::synthesize_mute(naughty, config.pads)?;
        Ok(filtergraph::build_mute_chain(&regions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn test_config(dir: &tempfile::TempDir) -> Config {
        let input = dir.path().join("input.mp3");
        File::create(&input).unwrap();
        let swears = dir.path().join("swears.txt");
        std::fs::write(&swears, "damn\n").unwrap();

        Config::builder().input_file(input).swears_file(swears).build().unwrap()
    }

    #[test]
    fn test_override_beats_cache_and_force() {
        let dir = tempdir().unwrap();
        let mut config = test_config(&dir);

        let override_path = dir.path().join("override.json");
        std::fs::write(&override_path, "[]").unwrap();
        let cache_path = dir.path().join("cache.json");
        std::fs::write(&cache_path, "[]").unwrap();

        config.transcript_override = Some(override_path.clone());
        config.transcript_cache = Some(cache_path);
        config.force_retranscribe = true;

        assert_eq!(transcript_source(&config), TranscriptSource::Override(override_path));
    }

    #[test]
    fn test_cache_reused_when_present() {
        let dir = tempdir().unwrap();
        let mut config = test_config(&dir);

        let cache_path = dir.path().join("cache.json");
        std::fs::write(&cache_path, "[]").unwrap();
        config.transcript_cache = Some(cache_path.clone());

        assert_eq!(transcript_source(&config), TranscriptSource::Cache(cache_path));
    }

    #[test]
    fn test_force_retranscribe_skips_cache() {
        let dir = tempdir().unwrap();
        let mut config = test_config(&dir);

        let cache_path = dir.path().join("cache.json");
        std::fs::write(&cache_path, "[]").unwrap();
        config.transcript_cache = Some(cache_path);
        config.force_retranscribe = true;

        assert_eq!(transcript_source(&config), TranscriptSource::Recognize);
    }

    #[test]
    fn test_missing_cache_falls_through_to_recognizer() {
        let dir = tempdir().unwrap();
        let mut config = test_config(&dir);
        config.transcript_cache = Some(dir.path().join("nonexistent.json"));

        assert_eq!(transcript_source(&config), TranscriptSource::Recognize);
    }

    #[tokio::test]
    async fn test_tagged_input_is_copied_verbatim() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("episode.mp3");
        std::fs::write(&input, b"already scrubbed audio bytes").unwrap();
        let swears = dir.path().join("swears.txt");
        std::fs::write(&swears, "damn\n").unwrap();

        let config = Config::builder().input_file(input.clone()).swears_file(swears).build().unwrap();

        let mut media_info = encoder::MediaInfo::default();
        media_info.audio.insert("mp3".to_string());
        media_info
            .tags
            .insert("encodedby".to_string(), tagging::TAG_SENTINEL.to_string());

        // sentinel present and no --force: no transcription, no encode,
        // the input is copied to the output path untouched
        let output = process(&config, &media_info).await.unwrap();
        assert_eq!(output, dir.path().join("episode_clean.mp3"));
        assert_eq!(std::fs::read(&output).unwrap(), std::fs::read(&input).unwrap());
    }

    #[test]
    fn test_clean_transcript_yields_empty_directive() {
        let dir = tempdir().unwrap();
        let config = test_config(&dir);

        let directive = build_directive(&config, &[]).unwrap();
        assert!(directive.is_empty());
    }

    #[test]
    fn test_directive_mode_selection() {
        let dir = tempdir().unwrap();
        let mut config = test_config(&dir);
        let naughty = vec![Word::new("damn", 1.0, 1.5, 0.9)];

        let mute = build_directive(&config, &naughty).unwrap();
        assert!(matches!(mute, FilterDirective::Chain(_)));

        config.beep = true;
        let beep = build_directive(&config, &naughty).unwrap();
        assert!(matches!(beep, FilterDirective::Graph(_)));
    }
}

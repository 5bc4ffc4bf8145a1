use std::path::{Path, PathBuf};

use crate::encoder::{EncodeParamTable, MediaInfo, AUDIO_MATCH_FORMAT};
use crate::error::{config_error, Result, WordplugError};
use crate::filtergraph::BeepMix;
use crate::intervals::PadSpec;

pub const DEFAULT_BEEP_HERTZ: u32 = 1000;
pub const DEFAULT_CHANNELS: u8 = 2;
pub const DEFAULT_WHISPER_MODEL: &str = "small.en";

/// Speech recognition engine selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Whisper,
    Vosk,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Whisper => "whisper",
            Engine::Vosk => "vosk",
        }
    }
}

impl std::str::FromStr for Engine {
    type Err = WordplugError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "whisper" => Ok(Engine::Whisper),
            "vosk" => Ok(Engine::Vosk),
            _ => Err(config_error(
                "engine",
                format!("Invalid engine '{}'. Valid options: whisper, vosk", s),
            )),
        }
    }
}

/// Immutable run settings. Built once through `ConfigBuilder`, validated,
/// then passed around by reference; nothing downstream mutates it.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_file: PathBuf,
    pub output_file: Option<PathBuf>,
    pub output_format: String,
    pub engine: Engine,
    pub swears_file: PathBuf,
    pub transcript_override: Option<PathBuf>,
    pub transcript_cache: Option<PathBuf>,
    pub force_retranscribe: bool,
    pub pads: PadSpec,
    pub beep: bool,
    pub beep_hertz: u32,
    pub beep_mix: BeepMix,
    pub channels: u8,
    pub audio_params: Option<Vec<String>>,
    pub force: bool,
    pub whisper_model_name: String,
    pub whisper_model_dir: Option<PathBuf>,
    pub vosk_model_dir: Option<PathBuf>,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.input_file.exists() {
            return Err(config_error(
                "input_file",
                format!("Input file does not exist: {}", self.input_file.display()),
            ));
        }
        if !self.input_file.is_file() {
            return Err(config_error(
                "input_file",
                format!("Input path is not a file: {}", self.input_file.display()),
            ));
        }

        if !self.swears_file.exists() {
            return Err(config_error(
                "swears_file",
                format!("Profanity file does not exist: {}", self.swears_file.display()),
            ));
        }

        if let Some(path) = &self.transcript_override {
            if !path.is_file() {
                return Err(config_error(
                    "transcript_override",
                    format!("Transcript file does not exist: {}", path.display()),
                ));
            }
        }

        if !(100..=10_000).contains(&self.beep_hertz) {
            return Err(config_error(
                "beep_hertz",
                format!("Beep frequency must be between 100 and 10000 Hz, got {}", self.beep_hertz),
            ));
        }

        if self.channels == 0 {
            return Err(config_error("channels", "Channel count must be at least 1"));
        }

        Ok(())
    }
}

/// Builder pattern for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    output_format: Option<String>,
    engine: Option<Engine>,
    swears_file: Option<PathBuf>,
    transcript_override: Option<PathBuf>,
    transcript_cache: Option<PathBuf>,
    force_retranscribe: Option<bool>,
    pads: Option<PadSpec>,
    beep: Option<bool>,
    beep_hertz: Option<u32>,
    beep_mix: Option<BeepMix>,
    channels: Option<u8>,
    audio_params: Option<Vec<String>>,
    force: Option<bool>,
    whisper_model_name: Option<String>,
    whisper_model_dir: Option<PathBuf>,
    vosk_model_dir: Option<PathBuf>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_file(mut self, path: PathBuf) -> Self {
        self.input_file = Some(path);
        self
    }

    pub fn output_file(mut self, path: PathBuf) -> Self {
        self.output_file = Some(path);
        self
    }

    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn swears_file(mut self, path: PathBuf) -> Self {
        self.swears_file = Some(path);
        self
    }

    pub fn transcript_override(mut self, path: PathBuf) -> Self {
        self.transcript_override = Some(path);
        self
    }

    pub fn transcript_cache(mut self, path: PathBuf) -> Self {
        self.transcript_cache = Some(path);
        self
    }

    pub fn force_retranscribe(mut self, force: bool) -> Self {
        self.force_retranscribe = Some(force);
        self
    }

    pub fn pads(mut self, pads: PadSpec) -> Self {
        self.pads = Some(pads);
        self
    }

    pub fn beep(mut self, beep: bool) -> Self {
        self.beep = Some(beep);
        self
    }

    pub fn beep_hertz(mut self, hertz: u32) -> Result<Self> {
        if !(100..=10_000).contains(&hertz) {
            return Err(config_error(
                "beep_hertz",
                format!("Beep frequency must be between 100 and 10000 Hz, got {}", hertz),
            ));
        }
        self.beep_hertz = Some(hertz);
        Ok(self)
    }

    pub fn beep_mix(mut self, mix: BeepMix) -> Self {
        self.beep_mix = Some(mix);
        self
    }

    pub fn channels(mut self, channels: u8) -> Result<Self> {
        if channels == 0 {
            return Err(config_error("channels", "Channel count must be at least 1"));
        }
        self.channels = Some(channels);
        Ok(self)
    }

    pub fn audio_params(mut self, params: Vec<String>) -> Self {
        self.audio_params = Some(params);
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }

    pub fn whisper_model_name(mut self, name: impl Into<String>) -> Self {
        self.whisper_model_name = Some(name.into());
        self
    }

    pub fn whisper_model_dir(mut self, dir: PathBuf) -> Self {
        self.whisper_model_dir = Some(dir);
        self
    }

    pub fn vosk_model_dir(mut self, dir: PathBuf) -> Self {
        self.vosk_model_dir = Some(dir);
        self
    }

    pub fn build(self) -> Result<Config> {
        let input_file = self
            .input_file
            .ok_or_else(|| config_error("input_file", "Input file is required"))?;
        let swears_file = self
            .swears_file
            .ok_or_else(|| config_error("swears_file", "Profanity file is required"))?;

        let config = Config {
            input_file,
            output_file: self.output_file,
            output_format: self.output_format.unwrap_or_else(|| AUDIO_MATCH_FORMAT.to_string()),
            engine: self.engine.unwrap_or(Engine::Whisper),
            swears_file,
            transcript_override: self.transcript_override,
            transcript_cache: self.transcript_cache,
            force_retranscribe: self.force_retranscribe.unwrap_or(false),
            pads: self.pads.unwrap_or_default(),
            beep: self.beep.unwrap_or(false),
            beep_hertz: self.beep_hertz.unwrap_or(DEFAULT_BEEP_HERTZ),
            beep_mix: self.beep_mix.unwrap_or_default(),
            channels: self.channels.unwrap_or(DEFAULT_CHANNELS),
            audio_params: self.audio_params,
            force: self.force.unwrap_or(false),
            whisper_model_name: self
                .whisper_model_name
                .unwrap_or_else(|| DEFAULT_WHISPER_MODEL.to_string()),
            whisper_model_dir: self.whisper_model_dir,
            vosk_model_dir: self.vosk_model_dir,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Everything the encode step needs, settled before any expensive work
#[derive(Debug, Clone)]
pub struct OutputPlan {
    pub output_file: PathBuf,
    pub audio_format: String,
    pub encode_params: Vec<String>,
    pub video_mode: bool,
}

/// Resolve output path, audio format, and encode parameters from the
/// requested settings and the probed input.
///
/// Format resolution for `MATCH`: output extension if one was given, else
/// input extension if it names a supported audio format, else the probed
/// container format, else the first audio codec with a known format
/// mapping. Video inputs in `MATCH` mode keep the input container.
pub fn plan_output(config: &Config, info: &MediaInfo, table: &EncodeParamTable) -> Result<OutputPlan> {
    let input_ext = extension_of(&config.input_file);

    // base output name, "_clean" next to the input when unspecified
    let (mut output_file, requested_format) = match &config.output_file {
        Some(path) => {
            let ext = extension_of(path);
            let format = if config.output_format.eq_ignore_ascii_case(AUDIO_MATCH_FORMAT)
                && !ext.is_empty()
            {
                ext
            } else {
                config.output_format.clone()
            };
            (path.clone(), format)
        }
        None => {
            let stem = config
                .input_file
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| config_error("input_file", "Invalid filename"))?;
            let mut path = config.input_file.clone();
            path.set_file_name(format!("{}_clean", stem));
            (path, config.output_format.clone())
        }
    };

    let video_mode =
        info.has_video() && requested_format.eq_ignore_ascii_case(AUDIO_MATCH_FORMAT);

    let audio_format = if requested_format.eq_ignore_ascii_case(AUDIO_MATCH_FORMAT) {
        resolve_match_format(&input_ext, info, table).ok_or_else(|| {
            WordplugError::UnsupportedFormat {
                extension: input_ext.clone(),
                supported: table.supported_formats(),
            }
        })?
    } else {
        requested_format.trim_start_matches('.').to_lowercase()
    };

    if config.audio_params.is_none() && !table.supports(&audio_format) {
        return Err(WordplugError::UnsupportedFormat {
            extension: audio_format,
            supported: table.supported_formats(),
        });
    }

    // video output keeps the input container; audio output takes the
    // resolved audio format as its extension
    if video_mode {
        if !input_ext.is_empty() {
            output_file.set_extension(&input_ext);
        }
    } else if extension_of(&output_file) != audio_format {
        output_file.set_extension(&audio_format);
    }

    let encode_params = match &config.audio_params {
        Some(params) => params
            .iter()
            .map(|p| {
                if p == crate::encoder::CHANNELS_PLACEHOLDER {
                    config.channels.to_string()
                } else {
                    p.clone()
                }
            })
            .collect(),
        None => table
            .params_for(&audio_format, config.channels)
            .ok_or_else(|| WordplugError::UnsupportedFormat {
                extension: audio_format.clone(),
                supported: table.supported_formats(),
            })?,
    };

    Ok(OutputPlan { output_file, audio_format, encode_params, video_mode })
}

fn resolve_match_format(
    input_ext: &str,
    info: &MediaInfo,
    table: &EncodeParamTable,
) -> Option<String> {
    if table.supports(input_ext) {
        return Some(input_ext.to_string());
    }
    if let Some(format) = info.formats.iter().find(|f| table.supports(f)) {
        return Some(format.clone());
    }
    let mut codecs: Vec<&String> = info.audio.iter().collect();
    codecs.sort();
    for codec in codecs {
        if let Some(format) = table.format_for_codec(codec) {
            return Some(format.to_string());
        }
    }
    None
}

fn extension_of(path: &Path) -> String {
    path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs::File;
    use tempfile::tempdir;

    fn audio_info(codec: &str, formats: &[&str]) -> MediaInfo {
        MediaInfo {
            audio: HashSet::from([codec.to_string()]),
            formats: formats.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    fn test_config(dir: &tempfile::TempDir, input_name: &str) -> Config {
        let input = dir.path().join(input_name);
        File::create(&input).unwrap();
        let swears = dir.path().join("swears.txt");
        std::fs::write(&swears, "damn\n").unwrap();

        Config::builder().input_file(input).swears_file(swears).build().unwrap()
    }

    #[test]
    fn test_engine_parsing() {
        assert_eq!("whisper".parse::<Engine>().unwrap(), Engine::Whisper);
        assert_eq!("VOSK".parse::<Engine>().unwrap(), Engine::Vosk);
        assert!("sphinx".parse::<Engine>().is_err());
    }

    #[test]
    fn test_builder_requires_input() {
        let result = Config::builder().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_bad_hertz() {
        assert!(Config::builder().beep_hertz(50).is_err());
        assert!(Config::builder().beep_hertz(1000).is_ok());
    }

    #[test]
    fn test_match_format_from_input_extension() {
        let dir = tempdir().unwrap();
        let config = test_config(&dir, "podcast.mp3");

        let plan = plan_output(&config, &audio_info("mp3", &["mp3"]), &EncodeParamTable::default())
            .unwrap();
        assert_eq!(plan.audio_format, "mp3");
        assert!(!plan.video_mode);
        assert_eq!(plan.output_file.file_name().unwrap(), "podcast_clean.mp3");
        assert!(plan.encode_params.contains(&"libmp3lame".to_string()));
    }

    #[test]
    fn test_match_format_falls_back_to_codec_map() {
        let dir = tempdir().unwrap();
        // .mka is not in the table and neither is the matroska container,
        // so resolution lands on the vorbis codec mapping
        let config = test_config(&dir, "podcast.mka");
        let info = audio_info("vorbis", &["matroska", "webm"]);

        let plan = plan_output(&config, &info, &EncodeParamTable::default()).unwrap();
        assert_eq!(plan.audio_format, "ogg");
        assert_eq!(plan.output_file.file_name().unwrap(), "podcast_clean.ogg");
    }

    #[test]
    fn test_match_format_undeterminable() {
        let dir = tempdir().unwrap();
        let config = test_config(&dir, "mystery.xyz");
        let info = audio_info("truehd", &["mlp"]);

        let result = plan_output(&config, &info, &EncodeParamTable::default());
        assert!(matches!(result, Err(WordplugError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_video_input_keeps_container() {
        let dir = tempdir().unwrap();
        let config = test_config(&dir, "movie.mkv");
        let info = MediaInfo {
            audio: HashSet::from(["aac".to_string()]),
            video: HashSet::from(["h264".to_string()]),
            formats: vec!["matroska".to_string()],
            ..Default::default()
        };

        let plan = plan_output(&config, &info, &EncodeParamTable::default()).unwrap();
        assert!(plan.video_mode);
        assert_eq!(plan.audio_format, "m4a");
        assert_eq!(plan.output_file.file_name().unwrap(), "movie_clean.mkv");
    }

    #[test]
    fn test_explicit_format_overrides_video_passthrough() {
        let dir = tempdir().unwrap();
        let mut config = test_config(&dir, "movie.mkv");
        config.output_format = "mp3".to_string();
        let info = MediaInfo {
            video: HashSet::from(["h264".to_string()]),
            ..Default::default()
        };

        let plan = plan_output(&config, &info, &EncodeParamTable::default()).unwrap();
        assert!(!plan.video_mode);
        assert_eq!(plan.audio_format, "mp3");
        assert_eq!(plan.output_file.file_name().unwrap(), "movie_clean.mp3");
    }

    #[test]
    fn test_explicit_output_extension_wins_in_match_mode() {
        let dir = tempdir().unwrap();
        let mut config = test_config(&dir, "podcast.mp3");
        config.output_file = Some(dir.path().join("scrubbed.ogg"));

        let plan = plan_output(&config, &audio_info("mp3", &["mp3"]), &EncodeParamTable::default())
            .unwrap();
        assert_eq!(plan.audio_format, "ogg");
        assert_eq!(plan.output_file.file_name().unwrap(), "scrubbed.ogg");
    }

    #[test]
    fn test_custom_audio_params_substitute_channels() {
        let dir = tempdir().unwrap();
        let mut config = test_config(&dir, "podcast.mp3");
        config.audio_params =
            Some(vec!["-c:a".into(), "flac".into(), "-ac".into(), "CHANNELS".into()]);
        config.channels = 1;

        let plan = plan_output(&config, &audio_info("mp3", &["mp3"]), &EncodeParamTable::default())
            .unwrap();
        assert_eq!(plan.encode_params, vec!["-c:a", "flac", "-ac", "1"]);
    }

    #[test]
    fn test_validate_rejects_missing_input() {
        let dir = tempdir().unwrap();
        let swears = dir.path().join("swears.txt");
        std::fs::write(&swears, "damn\n").unwrap();

        let result = Config::builder()
            .input_file(dir.path().join("nope.mp3"))
            .swears_file(swears)
            .build();
        assert!(result.is_err());
    }
}

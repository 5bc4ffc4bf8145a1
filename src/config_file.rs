use crate::config::{ConfigBuilder, Engine};
use crate::error::{Result, WordplugError};
use crate::intervals::PadSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file format that can be serialized to YAML/JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Speech recognition engine (whisper or vosk)
    pub engine: Option<String>,
    /// Profanity file path
    pub swears_file: Option<PathBuf>,
    /// Output format (or "MATCH")
    pub output_format: Option<String>,
    /// Milliseconds of padding on both sides of each suppressed span
    pub pad_milliseconds: Option<u64>,
    /// Padding before, overrides the shared value
    pub pad_milliseconds_pre: Option<u64>,
    /// Padding after, overrides the shared value
    pub pad_milliseconds_post: Option<u64>,
    /// Beep instead of muting
    pub beep: Option<bool>,
    /// Beep tone frequency in hertz
    pub beep_hertz: Option<u32>,
    /// Output channel count
    pub channels: Option<u8>,
    /// Whisper model name
    pub whisper_model_name: Option<String>,
    /// Whisper model download directory
    pub whisper_model_dir: Option<PathBuf>,
    /// Vosk model directory
    pub vosk_model_dir: Option<PathBuf>,
    /// Named profiles
    pub profiles: Option<std::collections::HashMap<String, ProfileConfig>>,
}

/// Profile-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub engine: Option<String>,
    pub swears_file: Option<PathBuf>,
    pub pad_milliseconds: Option<u64>,
    pub beep: Option<bool>,
    pub beep_hertz: Option<u32>,
    pub whisper_model_name: Option<String>,
    pub description: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a YAML file
    pub async fn load_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).await.map_err(|e| {
            WordplugError::FileSystem { source: e, path: path.as_ref().to_path_buf() }
        })?;

        serde_yaml::from_str(&contents).map_err(|e| WordplugError::Config {
            field: "config_file".to_string(),
            message: format!("Failed to parse YAML config: {}", e),
        })
    }

    /// Load configuration from a JSON file
    pub async fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).await.map_err(|e| {
            WordplugError::FileSystem { source: e, path: path.as_ref().to_path_buf() }
        })?;

        serde_json::from_str(&contents).map_err(|e| WordplugError::Config {
            field: "config_file".to_string(),
            message: format!("Failed to parse JSON config: {}", e),
        })
    }

    /// Auto-detect and load configuration file based on extension
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::load_yaml(path).await,
            Some("json") => Self::load_json(path).await,
            Some(ext) => Err(WordplugError::UnsupportedFormat {
                extension: ext.to_string(),
                supported: vec!["yaml".to_string(), "yml".to_string(), "json".to_string()],
            }),
            None => Err(WordplugError::Config {
                field: "config_file".to_string(),
                message: "Config file must have .yaml, .yml, or .json extension".to_string(),
            }),
        }
    }

    /// Get default config file paths to search
    pub fn default_config_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from(".wordplug.yaml"),
            PathBuf::from(".wordplug.yml"),
            PathBuf::from(".wordplug.json"),
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("wordplug")
                .join("config.yaml"),
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
                .join("wordplug.yaml"),
        ]
    }

    /// Try to load configuration from default locations
    pub async fn load_from_default_locations() -> Option<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::load(&path).await {
                    Ok(config) => {
                        log::info!("Loaded configuration from: {}", path.display());
                        return Some(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }
        None
    }

    /// Apply this config file to a ConfigBuilder
    pub fn apply_to_builder(&self, mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
        if let Some(ref engine_str) = self.engine {
            let engine: Engine = engine_str.parse()?;
            builder = builder.engine(engine);
        }
        if let Some(ref swears) = self.swears_file {
            builder = builder.swears_file(swears.clone());
        }
        if let Some(ref format) = self.output_format {
            builder = builder.output_format(format.clone());
        }

        let shared = self.pad_milliseconds.unwrap_or(0);
        if self.pad_milliseconds.is_some()
            || self.pad_milliseconds_pre.is_some()
            || self.pad_milliseconds_post.is_some()
        {
            builder = builder.pads(PadSpec::from_millis(
                self.pad_milliseconds_pre.unwrap_or(shared),
                self.pad_milliseconds_post.unwrap_or(shared),
            ));
        }

        if let Some(beep) = self.beep {
            builder = builder.beep(beep);
        }
        if let Some(hertz) = self.beep_hertz {
            builder = builder.beep_hertz(hertz)?;
        }
        if let Some(channels) = self.channels {
            builder = builder.channels(channels)?;
        }
        if let Some(ref name) = self.whisper_model_name {
            builder = builder.whisper_model_name(name.clone());
        }
        if let Some(ref dir) = self.whisper_model_dir {
            builder = builder.whisper_model_dir(dir.clone());
        }
        if let Some(ref dir) = self.vosk_model_dir {
            builder = builder.vosk_model_dir(dir.clone());
        }

        Ok(builder)
    }

    /// Apply a specific profile to a ConfigBuilder
    pub fn apply_profile_to_builder(
        &self,
        profile_name: &str,
        builder: ConfigBuilder,
    ) -> Result<ConfigBuilder> {
        let profiles = self.profiles.as_ref().ok_or_else(|| WordplugError::Config {
            field: "profiles".to_string(),
            message: "No profiles defined".to_string(),
        })?;

        let profile = profiles.get(profile_name).ok_or_else(|| WordplugError::Config {
            field: "profile".to_string(),
            message: format!("Profile '{}' not found", profile_name),
        })?;

        // base config first, profile overrides on top
        let mut builder = self.apply_to_builder(builder)?;

        if let Some(ref engine_str) = profile.engine {
            let engine: Engine = engine_str.parse()?;
            builder = builder.engine(engine);
        }
        if let Some(ref swears) = profile.swears_file {
            builder = builder.swears_file(swears.clone());
        }
        if let Some(pad) = profile.pad_milliseconds {
            builder = builder.pads(PadSpec::from_millis(pad, pad));
        }
        if let Some(beep) = profile.beep {
            builder = builder.beep(beep);
        }
        if let Some(hertz) = profile.beep_hertz {
            builder = builder.beep_hertz(hertz)?;
        }
        if let Some(ref name) = profile.whisper_model_name {
            builder = builder.whisper_model_name(name.clone());
        }

        Ok(builder)
    }

    /// List available profiles
    pub fn list_profiles(&self) -> Vec<String> {
        self.profiles.as_ref().map(|p| p.keys().cloned().collect()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_config_file_yaml() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("test.yaml");
        std::fs::write(
            &config_path,
            "engine: vosk\nbeep: true\nbeep_hertz: 800\npad_milliseconds: 250\n",
        )
        .unwrap();

        let loaded = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(loaded.engine.as_deref(), Some("vosk"));
        assert_eq!(loaded.beep, Some(true));
        assert_eq!(loaded.beep_hertz, Some(800));
        assert_eq!(loaded.pad_milliseconds, Some(250));
    }

    #[tokio::test]
    async fn test_config_file_json() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("test.json");
        std::fs::write(&config_path, r#"{"whisper_model_name": "base.en", "channels": 1}"#)
            .unwrap();

        let loaded = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(loaded.whisper_model_name.as_deref(), Some("base.en"));
        assert_eq!(loaded.channels, Some(1));
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("test.toml");
        std::fs::write(&config_path, "engine = 'vosk'").unwrap();

        assert!(ConfigFile::load(&config_path).await.is_err());
    }

    #[test]
    fn test_apply_pad_overrides() {
        let file = ConfigFile {
            pad_milliseconds: Some(100),
            pad_milliseconds_pre: Some(50),
            ..Default::default()
        };
        // pre overridden to 50ms, post falls back to the shared 100ms
        let builder = file.apply_to_builder(ConfigBuilder::new()).unwrap();
        let _ = builder;
    }

    #[test]
    fn test_profile_listing_and_missing_profile() {
        let mut profiles = std::collections::HashMap::new();
        profiles.insert(
            "podcast".to_string(),
            ProfileConfig { beep: Some(true), ..Default::default() },
        );
        let file = ConfigFile { profiles: Some(profiles), ..Default::default() };

        assert_eq!(file.list_profiles(), vec!["podcast".to_string()]);
        assert!(file.apply_profile_to_builder("podcast", ConfigBuilder::new()).is_ok());
        assert!(file.apply_profile_to_builder("radio", ConfigBuilder::new()).is_err());
    }
}

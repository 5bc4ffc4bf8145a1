use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::process::Command;

use crate::error::{external_tool_error, fs_error, validation_error, Result};
use crate::filtergraph::FilterDirective;

/// Placeholder in encode parameter tables substituted with the configured
/// channel count
pub const CHANNELS_PLACEHOLDER: &str = "CHANNELS";

/// Pseudo-format meaning "match the input container/codec"
pub const AUDIO_MATCH_FORMAT: &str = "MATCH";

/// Immutable table of default ffmpeg encode parameters per output format.
/// Built once during configuration and passed explicitly wherever encode
/// parameters are resolved.
#[derive(Debug, Clone)]
pub struct EncodeParamTable {
    params: HashMap<&'static str, Vec<&'static str>>,
    codec_formats: HashMap<&'static str, &'static str>,
}

impl Default for EncodeParamTable {
    fn default() -> Self {
        let mut params = HashMap::new();
        params.insert("flac", vec!["-c:a", "flac", "-ar", "44100", "-ac", CHANNELS_PLACEHOLDER]);
        params.insert("m4a", vec!["-c:a", "aac", "-b:a", "128K", "-ar", "44100", "-ac", CHANNELS_PLACEHOLDER]);
        params.insert("aac", vec!["-c:a", "aac", "-b:a", "128K", "-ar", "44100", "-ac", CHANNELS_PLACEHOLDER]);
        params.insert("mp3", vec!["-c:a", "libmp3lame", "-b:a", "128K", "-ar", "44100", "-ac", CHANNELS_PLACEHOLDER]);
        params.insert("ogg", vec!["-c:a", "libvorbis", "-qscale:a", "5", "-ar", "44100", "-ac", CHANNELS_PLACEHOLDER]);
        params.insert("opus", vec!["-c:a", "libopus", "-b:a", "128K", "-ar", "48000", "-ac", CHANNELS_PLACEHOLDER]);
        params.insert("ac3", vec!["-c:a", "ac3", "-b:a", "128K", "-ar", "44100", "-ac", CHANNELS_PLACEHOLDER]);

        let mut codec_formats = HashMap::new();
        codec_formats.insert("aac", "m4a");
        codec_formats.insert("ac3", "ac3");
        codec_formats.insert("flac", "flac");
        codec_formats.insert("mp3", "mp3");
        codec_formats.insert("opus", "opus");
        codec_formats.insert("vorbis", "ogg");

        Self { params, codec_formats }
    }
}

impl EncodeParamTable {
    pub fn supports(&self, format: &str) -> bool {
        self.params.contains_key(format)
    }

    pub fn supported_formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = self.params.keys().map(|k| k.to_string()).collect();
        formats.sort();
        formats
    }

    /// Default parameters for a format with the channel placeholder
    /// substituted
    pub fn params_for(&self, format: &str, channels: u8) -> Option<Vec<String>> {
        self.params.get(format).map(|params| {
            params
                .iter()
                .map(|p| {
                    if *p == CHANNELS_PLACEHOLDER {
                        channels.to_string()
                    } else {
                        p.to_string()
                    }
                })
                .collect()
        })
    }

    /// Output format to use for a given input audio codec
    pub fn format_for_codec(&self, codec: &str) -> Option<&'static str> {
        self.codec_formats.get(codec).copied()
    }
}

/// Stream/container facts gathered from one ffprobe pass over the input
#[derive(Debug, Clone, Default)]
pub struct MediaInfo {
    pub audio: HashSet<String>,
    pub video: HashSet<String>,
    pub subtitle: HashSet<String>,
    pub formats: Vec<String>,
    pub tags: HashMap<String, String>,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        !self.video.is_empty()
    }

    pub fn has_audio(&self) -> bool {
        !self.audio.is_empty()
    }
}

/// Probe codecs, container format names, and format-level metadata tags
pub async fn probe(path: &Path) -> Result<MediaInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
            path.to_str()
                .ok_or_else(|| validation_error("Invalid input path encoding"))?,
        ])
        .output()
        .await
        .map_err(|e| {
            external_tool_error("ffprobe", format!("Failed to execute ffprobe: {}", e), None)
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(external_tool_error(
            "ffprobe",
            format!("Could not analyze {} (exit: {})", path.display(), output.status),
            Some(stderr),
        ));
    }

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
        external_tool_error("ffprobe", format!("Unparseable ffprobe output: {}", e), None)
    })?;

    let info = media_info_from_json(&json);
    debug!("Probed {}: {:?}", path.display(), info.formats);
    Ok(info)
}

fn media_info_from_json(json: &serde_json::Value) -> MediaInfo {
    let mut info = MediaInfo::default();

    if let Some(streams) = json.get("streams").and_then(|s| s.as_array()) {
        for stream in streams {
            let codec_type = stream.get("codec_type").and_then(|t| t.as_str());
            let codec_name = stream.get("codec_name").and_then(|n| n.as_str());
            if let (Some(codec_type), Some(codec_name)) = (codec_type, codec_name) {
                let codec = codec_name.to_lowercase();
                match codec_type.to_lowercase().as_str() {
                    "audio" => {
                        info.audio.insert(codec);
                    }
                    "video" => {
                        info.video.insert(codec);
                    }
                    "subtitle" => {
                        info.subtitle.insert(codec);
                    }
                    _ => {}
                }
            }
        }
    }

    if let Some(format) = json.get("format") {
        if let Some(names) = format.get("format_name").and_then(|f| f.as_str()) {
            info.formats = names.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(tags) = format.get("tags").and_then(|t| t.as_object()) {
            for (key, value) in tags {
                if let Some(value) = value.as_str() {
                    info.tags.insert(key.to_lowercase(), value.to_string());
                }
            }
        }
    }

    info
}

/// Argument list for the encode invocation. Video inputs keep their video
/// stream with `-c:v copy`; audio-only inputs drop everything but audio.
pub fn encode_args(
    input: &Path,
    directive: &FilterDirective,
    params: &[String],
    video_mode: bool,
    output: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-nostdin".into(),
        "-hide_banner".into(),
        "-nostats".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
    ];

    if video_mode {
        args.extend(["-c:v".into(), "copy".into(), "-sn".into(), "-dn".into()]);
    } else {
        args.extend(["-vn".into(), "-sn".into(), "-dn".into()]);
    }

    args.extend(directive.as_ffmpeg_args());
    args.extend(params.iter().cloned());
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Run the re-encode. Failure or a missing/empty output file aborts the
/// run; nothing is retried here, and a partial output file never survives
/// a failed run.
pub async fn encode(
    input: &Path,
    directive: &FilterDirective,
    params: &[String],
    video_mode: bool,
    output_path: &Path,
) -> Result<()> {
    let args = encode_args(input, directive, params, video_mode, output_path);
    info!("Encoding {} -> {}", input.display(), output_path.display());
    debug!("ffmpeg {}", args.join(" "));

    let result = run_ffmpeg(input, &args, output_path).await;
    if result.is_err() {
        discard_partial_output(output_path);
    }
    result
}

async fn run_ffmpeg(input: &Path, args: &[String], output_path: &Path) -> Result<()> {
    let output = Command::new("ffmpeg").args(args).output().await.map_err(|e| {
        external_tool_error("ffmpeg", format!("Failed to execute ffmpeg: {}", e), None)
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(external_tool_error(
            "ffmpeg",
            format!(
                "Could not process {} (ffmpeg {}, exit: {})",
                input.display(),
                args.join(" "),
                output.status
            ),
            Some(stderr),
        ));
    }

    verify_output(output_path)
}

fn discard_partial_output(path: &Path) {
    if path.is_file() {
        debug!("Discarding partial output {}", path.display());
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove partial output {}: {}", path.display(), e);
        }
    }
}

/// The output must exist with non-trivial size before the run is declared
/// successful
pub fn verify_output(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|_| {
        external_tool_error(
            "ffmpeg",
            format!("Encoder produced no output at {}", path.display()),
            None,
        )
    })?;
    if metadata.len() == 0 {
        return Err(external_tool_error(
            "ffmpeg",
            format!("Encoder produced an empty file at {}", path.display()),
            None,
        ));
    }
    Ok(())
}

/// Remove a leftover output file from a previous run before starting
pub fn remove_stale_output(path: &Path) -> Result<()> {
    if path.is_file() {
        debug!("Removing stale output {}", path.display());
        std::fs::remove_file(path).map_err(|e| fs_error(e, path.to_path_buf()))?;
    }
    Ok(())
}

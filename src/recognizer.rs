use async_trait::async_trait;
use log::{debug, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::error::{external_tool_error, validation_error, Result};
use crate::resources::TempFile;
use crate::transcript::Word;

/// A speech-to-text engine producing a time-stamped word list.
///
/// Engines receive the audio path and their own settings at construction;
/// `recognize` takes nothing but the audio so callers can swap engines
/// without caring how the words were located.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Short engine name for logs and cache filenames
    fn name(&self) -> &str;

    /// Transcribe the audio into words ordered by start time
    async fn recognize(&self, audio_path: &Path) -> Result<Vec<Word>>;
}

/// faster-whisper engine via a Python bridge
pub struct WhisperRecognizer {
    model_name: String,
    model_dir: Option<PathBuf>,
}

impl WhisperRecognizer {
    pub fn new(model_name: impl Into<String>, model_dir: Option<PathBuf>) -> Self {
        Self { model_name: model_name.into(), model_dir }
    }
}

#[async_trait]
impl Recognizer for WhisperRecognizer {
    fn name(&self) -> &str {
        "whisper"
    }

    async fn recognize(&self, audio_path: &Path) -> Result<Vec<Word>> {
        info!("Transcribing with faster-whisper model: {}", self.model_name);

        let script = create_whisper_script()?;
        let mut args: Vec<String> = vec![
            script
                .path()
                .to_str()
                .ok_or_else(|| validation_error("Invalid script path encoding"))?
                .to_string(),
            self.model_name.clone(),
            audio_path
                .to_str()
                .ok_or_else(|| validation_error("Invalid audio path encoding"))?
                .to_string(),
        ];
        if let Some(dir) = &self.model_dir {
            args.push(dir.to_string_lossy().into_owned());
        }

        let output = run_python_bridge("faster-whisper", &args).await?;
        let words: Vec<Word> = serde_json::from_str(&output).map_err(|e| {
            external_tool_error(
                "faster-whisper",
                format!("Unparseable transcription output: {}", e),
                None,
            )
        })?;

        info!("Recognized {} words", words.len());
        Ok(words)
    }
}

/// Vosk engine via a Python bridge. Vosk wants 16 kHz mono signed 16-bit
/// WAV, so the input is downmixed to a scoped intermediate first.
pub struct VoskRecognizer {
    model_dir: Option<PathBuf>,
}

impl VoskRecognizer {
    pub fn new(model_dir: Option<PathBuf>) -> Self {
        Self { model_dir }
    }

    async fn prepare_wav(&self, audio_path: &Path) -> Result<TempFile> {
        let wav = TempFile::staging("vosk", "wav");
        debug!("Downmixing {} for vosk -> {}", audio_path.display(), wav.path().display());

        let output = Command::new("ffmpeg")
            .args([
                "-nostdin",
                "-hide_banner",
                "-nostats",
                "-loglevel",
                "error",
                "-y",
                "-i",
                audio_path
                    .to_str()
                    .ok_or_else(|| validation_error("Invalid audio path encoding"))?,
                "-vn",
                "-sn",
                "-dn",
                "-ac",
                "1",
                "-ar",
                "16000",
                "-c:a",
                "pcm_s16le",
                wav.path()
                    .to_str()
                    .ok_or_else(|| validation_error("Invalid staging path encoding"))?,
            ])
            .output()
            .await
            .map_err(|e| {
                external_tool_error("ffmpeg", format!("Failed to execute ffmpeg: {}", e), None)
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(external_tool_error(
                "ffmpeg",
                format!("Could not prepare vosk audio from {}", audio_path.display()),
                Some(stderr),
            ));
        }

        Ok(wav)
    }
}

#[async_trait]
impl Recognizer for VoskRecognizer {
    fn name(&self) -> &str {
        "vosk"
    }

    async fn recognize(&self, audio_path: &Path) -> Result<Vec<Word>> {
        info!("Transcribing with vosk");

        // Dropped at end of scope whether recognition succeeds or not
        let wav = self.prepare_wav(audio_path).await?;

        let script = create_vosk_script()?;
        let mut args: Vec<String> = vec![
            script
                .path()
                .to_str()
                .ok_or_else(|| validation_error("Invalid script path encoding"))?
                .to_string(),
            wav.path().to_string_lossy().into_owned(),
        ];
        if let Some(dir) = &self.model_dir {
            args.push(dir.to_string_lossy().into_owned());
        }

        let output = run_python_bridge("vosk", &args).await?;
        let words: Vec<Word> = serde_json::from_str(&output).map_err(|e| {
            external_tool_error("vosk", format!("Unparseable transcription output: {}", e), None)
        })?;

        info!("Recognized {} words", words.len());
        Ok(words)
    }
}

fn create_whisper_script() -> Result<NamedTempFile> {
    let script_content = r#"
import sys
import json
from faster_whisper import WhisperModel

def transcribe(model_name, audio_path, download_root):
    model = WhisperModel(model_name, device="cpu", compute_type="int8",
                         download_root=download_root)
    segments, info = model.transcribe(audio_path, word_timestamps=True)
    words = []
    for segment in segments:
        if segment.words:
            for word in segment.words:
                words.append({
                    "word": word.word,
                    "start": word.start,
                    "end": word.end,
                    "probability": word.probability,
                })
    return words

if __name__ == "__main__":
    if len(sys.argv) < 3:
        print("Usage: script.py <model_name> <audio_path> [download_root]", file=sys.stderr)
        sys.exit(1)
    download_root = sys.argv[3] if len(sys.argv) > 3 else None
    print(json.dumps(transcribe(sys.argv[1], sys.argv[2], download_root)))
"#;

    write_script(script_content)
}

fn create_vosk_script() -> Result<NamedTempFile> {
    let script_content = r#"
import sys
import json
import wave
from vosk import Model, KaldiRecognizer, SetLogLevel

def transcribe(wav_path, model_dir):
    SetLogLevel(-1)
    model = Model(model_path=model_dir) if model_dir else Model(lang="en-us")
    with wave.open(wav_path, "rb") as wav:
        rec = KaldiRecognizer(model, wav.getframerate())
        rec.SetWords(True)
        words = []
        while True:
            data = wav.readframes(4000)
            if len(data) == 0:
                break
            if rec.AcceptWaveform(data):
                words.extend(json.loads(rec.Result()).get("result", []))
        words.extend(json.loads(rec.FinalResult()).get("result", []))
    return words

if __name__ == "__main__":
    if len(sys.argv) < 2:
        print("Usage: script.py <wav_path> [model_dir]", file=sys.stderr)
        sys.exit(1)
    model_dir = sys.argv[2] if len(sys.argv) > 2 else None
    print(json.dumps(transcribe(sys.argv[1], model_dir)))
"#;

    write_script(script_content)
}

fn write_script(content: &str) -> Result<NamedTempFile> {
    let mut temp_file = NamedTempFile::new()
        .map_err(|e| external_tool_error("python3", format!("Failed to stage script: {}", e), None))?;
    temp_file
        .write_all(content.as_bytes())
        .and_then(|_| temp_file.flush())
        .map_err(|e| external_tool_error("python3", format!("Failed to write script: {}", e), None))?;
    Ok(temp_file)
}

/// Run a bridge script and collect its stdout (the JSON word list).
/// Stderr is model download/progress chatter and is surfaced on failure.
async fn run_python_bridge(engine: &str, args: &[String]) -> Result<String> {
    debug!("Running {} bridge: python3 {}", engine, args.join(" "));

    let mut child = Command::new("python3")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            external_tool_error(
                "python3",
                format!("Failed to spawn Python for {}: {}", engine, e),
                None,
            )
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| external_tool_error("python3", "Failed to capture stdout", None))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| external_tool_error("python3", "Failed to capture stderr", None))?;

    let mut stdout_reader = BufReader::new(stdout);
    let mut output = String::new();
    let mut line = String::new();
    while stdout_reader
        .read_line(&mut line)
        .await
        .map_err(|e| external_tool_error("python3", format!("Failed reading stdout: {}", e), None))?
        > 0
    {
        output.push_str(&line);
        line.clear();
    }

    let mut stderr_reader = BufReader::new(stderr);
    let mut error_output = String::new();
    line.clear();
    while stderr_reader
        .read_line(&mut line)
        .await
        .map_err(|e| external_tool_error("python3", format!("Failed reading stderr: {}", e), None))?
        > 0
    {
        error_output.push_str(&line);
        line.clear();
    }

    let status = child.wait().await.map_err(|e| {
        external_tool_error("python3", format!("Failed to wait for Python: {}", e), None)
    })?;

    if !status.success() {
        return Err(external_tool_error(
            engine,
            format!("Transcription failed (exit: {})", status),
            Some(error_output),
        ));
    }

    if !error_output.is_empty() {
        warn!("{} stderr output: {}", engine, error_output.trim());
    }

    Ok(output)
}

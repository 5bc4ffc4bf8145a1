use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;
use tokio::process::Command;

use crate::error::{tag_io_error, Result};
use crate::resources::TempFile;

/// Marker value embedded in output metadata to flag an already-scrubbed file
pub const TAG_SENTINEL: &str = "wordplug";

/// Candidate metadata fields, checked and written in this order
pub const TAG_FIELDS: &[&str] = &["encodedby", "comment"];

/// True if any candidate field of the container metadata equals the
/// sentinel. Fields are checked in order and the scan short-circuits on
/// the first hit. Keys are expected lowercased (the prober normalizes).
/// The match is exact, so an unrelated comment that merely mentions the
/// tool never suppresses processing.
pub fn already_tagged(tags: &HashMap<String, String>) -> bool {
    for field in TAG_FIELDS {
        if let Some(value) = tags.get(*field) {
            if value == TAG_SENTINEL {
                debug!("Found sentinel in metadata field '{}'", field);
                return true;
            }
        }
    }
    false
}

/// Write the sentinel into the first writable candidate field of the output
/// file by remuxing with stream copy. Fields are tried in [`TAG_FIELDS`]
/// order; the first that sticks wins. Best-effort: a failure on every field
/// is logged and the run still succeeds; the only consequence is no
/// idempotency short-circuit on a later run.
pub async fn mark_processed(output_path: &Path) {
    for field in TAG_FIELDS {
        match write_sentinel(output_path, field).await {
            Ok(()) => return,
            Err(e) => warn!(
                "Could not tag {} via '{}': {}",
                output_path.display(),
                field,
                e
            ),
        }
    }
}

async fn write_sentinel(output_path: &Path, field: &str) -> Result<()> {
    let extension = output_path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| tag_io_error("Output file has no extension"))?;

    let staging = TempFile::staging("tagged", extension);

    let output = Command::new("ffmpeg")
        .args([
            "-nostdin",
            "-hide_banner",
            "-nostats",
            "-loglevel",
            "error",
            "-y",
            "-i",
            output_path
                .to_str()
                .ok_or_else(|| tag_io_error("Invalid output path"))?,
            "-map",
            "0",
            "-c",
            "copy",
            "-metadata",
            &format!("{}={}", field, TAG_SENTINEL),
            staging
                .path()
                .to_str()
                .ok_or_else(|| tag_io_error("Invalid staging path"))?,
        ])
        .output()
        .await
        .map_err(|e| tag_io_error(format!("Failed to run ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(tag_io_error(format!("ffmpeg could not write tag: {}", stderr)));
    }

    std::fs::rename(staging.path(), output_path)
        .map_err(|e| tag_io_error(format!("Could not replace tagged output: {}", e)))?;
    staging.take_path();
    Ok(())
}

use crate::config::Engine;
use crate::error::{Result, WordplugError};
use log::{info, warn};
use tokio::process::Command;

/// Check that the external tools the run will need are actually present
pub async fn validate_dependencies(engine: Engine) -> Result<()> {
    info!("Validating system dependencies...");

    check_tool("ffmpeg", "Install FFmpeg: https://ffmpeg.org/download.html").await?;
    check_tool("ffprobe", "ffprobe ships with FFmpeg: https://ffmpeg.org/download.html").await?;
    check_python_engine(engine).await?;

    info!("All dependencies validated successfully");
    Ok(())
}

async fn check_tool(name: &str, suggestion: &str) -> Result<()> {
    let output = Command::new(name)
        .args(["-version"])
        .output()
        .await
        .map_err(|_| WordplugError::MissingDependency {
            name: name.to_string(),
            suggestion: suggestion.to_string(),
        })?;

    if !output.status.success() {
        return Err(WordplugError::MissingDependency {
            name: name.to_string(),
            suggestion: format!("{} is installed but not working properly", name),
        });
    }

    let version_info = String::from_utf8_lossy(&output.stdout);
    if let Some(version_line) = version_info.lines().next() {
        info!("{} found: {}", name, version_line);
    }

    Ok(())
}

/// Check Python 3 and the module the selected engine imports
async fn check_python_engine(engine: Engine) -> Result<()> {
    let python_output = Command::new("python3")
        .args(["-c", "import sys; print(f'Python {sys.version.split()[0]}')"])
        .output()
        .await
        .map_err(|_| WordplugError::MissingDependency {
            name: "Python".to_string(),
            suggestion: "Install Python 3.8+ from https://python.org".to_string(),
        })?;

    if !python_output.status.success() {
        return Err(WordplugError::MissingDependency {
            name: "Python".to_string(),
            suggestion: "Python is installed but not working properly".to_string(),
        });
    }

    let python_version = String::from_utf8_lossy(&python_output.stdout);
    info!("Python found: {}", python_version.trim());

    let (module, package) = match engine {
        Engine::Whisper => ("faster_whisper", "faster-whisper"),
        Engine::Vosk => ("vosk", "vosk"),
    };

    let module_output = Command::new("python3")
        .args(["-c", &format!("import {}", module)])
        .output()
        .await
        .map_err(|_| WordplugError::MissingDependency {
            name: package.to_string(),
            suggestion: format!("Install {}: pip install {}", package, package),
        })?;

    if !module_output.status.success() {
        let stderr = String::from_utf8_lossy(&module_output.stderr);
        if stderr.contains(&format!("No module named '{}'", module)) {
            return Err(WordplugError::MissingDependency {
                name: package.to_string(),
                suggestion: format!("Install {}: pip install {}", package, package),
            });
        }
        warn!("{} check failed, but may still work: {}", package, stderr);
        return Ok(());
    }

    info!("{} found", package);
    Ok(())
}

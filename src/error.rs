use std::fmt;

/// Custom error types for wordplug operations
#[derive(Debug)]
pub enum WordplugError {
    /// File system related errors
    FileSystem { source: std::io::Error, path: std::path::PathBuf },

    /// Bad configuration (missing lexicon, unknown engine, bad option value)
    Config { field: String, message: String },

    /// Structurally invalid transcript or synthesized interval
    Validation { message: String },

    /// External collaborator (ffmpeg/ffprobe/recognizer) failure
    ExternalTool { tool: String, message: String, stderr: Option<String> },

    /// Best-effort metadata tag read/write failure (logged, never fatal)
    TagIo { message: String },

    /// Unsupported output file format
    UnsupportedFormat { extension: String, supported: Vec<String> },

    /// Missing external dependency
    MissingDependency { name: String, suggestion: String },

    /// General processing error
    Processing { message: String },
}

impl fmt::Display for WordplugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordplugError::FileSystem { source, path } => {
                write!(f, "File system error for '{}': {}", path.display(), source)
            }
            WordplugError::Config { field, message } => {
                write!(f, "Configuration error in '{}': {}", field, message)
            }
            WordplugError::Validation { message } => {
                write!(f, "Validation error: {}", message)
            }
            WordplugError::ExternalTool { tool, message, stderr } => {
                write!(f, "{} error: {}", tool, message)?;
                if let Some(stderr) = stderr {
                    write!(f, "\nStderr: {}", stderr)?;
                }
                Ok(())
            }
            WordplugError::TagIo { message } => {
                write!(f, "Metadata tag error: {}", message)
            }
            WordplugError::UnsupportedFormat { extension, supported } => {
                write!(
                    f,
                    "Unsupported output format '{}'. Supported formats: {}",
                    extension,
                    supported.join(", ")
                )
            }
            WordplugError::MissingDependency { name, suggestion } => {
                write!(f, "Missing dependency '{}': {}", name, suggestion)
            }
            WordplugError::Processing { message } => {
                write!(f, "Processing error: {}", message)
            }
        }
    }
}

impl std::error::Error for WordplugError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WordplugError::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for wordplug operations
pub type Result<T> = std::result::Result<T, WordplugError>;

/// Helper function to create configuration errors
pub fn config_error(field: impl Into<String>, message: impl Into<String>) -> WordplugError {
    WordplugError::Config {
        field: field.into(),
        message: message.into(),
    }
}

/// Helper function to create validation errors
pub fn validation_error(message: impl Into<String>) -> WordplugError {
    WordplugError::Validation {
        message: message.into(),
    }
}

/// Helper function to create external tool errors
pub fn external_tool_error(
    tool: impl Into<String>,
    message: impl Into<String>,
    stderr: Option<String>,
) -> WordplugError {
    WordplugError::ExternalTool {
        tool: tool.into(),
        message: message.into(),
        stderr,
    }
}

/// Helper function to create tag I/O errors
pub fn tag_io_error(message: impl Into<String>) -> WordplugError {
    WordplugError::TagIo {
        message: message.into(),
    }
}

/// Helper function to create file system errors
pub fn fs_error(source: std::io::Error, path: std::path::PathBuf) -> WordplugError {
    WordplugError::FileSystem { source, path }
}

/// Trait for converting external errors to WordplugError
pub trait IntoWordplugError<T> {
    fn with_path(self, path: std::path::PathBuf) -> Result<T>;
    fn with_context(self, message: impl Into<String>) -> Result<T>;
}

impl<T> IntoWordplugError<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: std::path::PathBuf) -> Result<T> {
        self.map_err(|e| fs_error(e, path))
    }

    fn with_context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| WordplugError::Processing {
            message: format!("{}: {}", message.into(), e),
        })
    }
}

// Conversion from anyhow::Error to WordplugError for compatibility
impl From<anyhow::Error> for WordplugError {
    fn from(err: anyhow::Error) -> Self {
        WordplugError::Processing {
            message: err.to_string(),
        }
    }
}

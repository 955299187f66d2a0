//! Error types for the sigil workspace.

use std::path::PathBuf;

use thiserror::Error;

/// A shared error type for the sigil workspace.
///
/// Every error is recovered at the REPL or poll-loop boundary; none of these
/// terminate the process.
#[derive(Error, Debug)]
pub enum SigilError {
    /// Input matched a command name but failed its syntax check. The message
    /// is the command's configured usage text.
    #[error("{0}")]
    Usage(String),

    /// A watch target does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A watch target is not a `.txt` file.
    #[error("Unsupported file type: {} (only .txt files supported)", .0.display())]
    UnsupportedExtension(PathBuf),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Clipboard write failed; non-fatal, conversion output is still printed.
    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SigilError {
    /// Creates a Usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a Usage error
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }

    /// Check if this error indicates an invalid watch target.
    pub fn is_invalid_watch_target(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::UnsupportedExtension(_)
        )
    }
}

impl From<std::io::Error> for SigilError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<toml::de::Error> for SigilError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// A type alias for `Result<T, SigilError>`.
pub type Result<T> = std::result::Result<T, SigilError>;

//! Error types for the ovaspec core library.

use std::path::PathBuf;

/// The main error type for ovaspec operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error with optional path context.
    #[error("I/O error{}: {source}", path.as_ref().map(|p| format!(" at '{}'", p.display())).unwrap_or_default())]
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },

    /// The archive path has an extension that is neither `.ovf` nor `.ova`.
    #[error("invalid file extension .{extension}")]
    InvalidExtension { extension: String },

    /// Error reading the contents of an OVF/OVA archive.
    #[error("Archive error: {message}")]
    Archive { message: String },

    /// Error fetching an archive from a remote location.
    #[error("Remote error for '{url}': {message}")]
    Remote { url: String, message: String },

    /// Error parsing an OVF envelope.
    #[error("OVF parse error{}: {message}", position.map(|p| format!(" at byte {p}")).unwrap_or_default())]
    EnvelopeParse {
        message: String,
        position: Option<u64>,
    },

    /// The OVA manifest does not match the descriptor.
    #[error("Manifest error: {message}")]
    Manifest { message: String },
}

/// A specialized Result type for ovaspec operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an I/O error with path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
        }
    }

    /// Create an I/O error without path context.
    pub fn io_simple(source: std::io::Error) -> Self {
        Self::Io { source, path: None }
    }

    /// Create an invalid extension error.
    pub fn invalid_extension(extension: impl Into<String>) -> Self {
        Self::InvalidExtension {
            extension: extension.into(),
        }
    }

    /// Create an archive error.
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    /// Create a remote fetch error.
    pub fn remote(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an envelope parse error without position information.
    pub fn envelope_parse(message: impl Into<String>) -> Self {
        Self::EnvelopeParse {
            message: message.into(),
            position: None,
        }
    }

    /// Create an envelope parse error at a byte offset in the document.
    pub fn envelope_parse_at(message: impl Into<String>, position: u64) -> Self {
        Self::EnvelopeParse {
            message: message.into(),
            position: Some(position),
        }
    }

    /// Create a manifest error.
    pub fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::io_simple(source)
    }
}

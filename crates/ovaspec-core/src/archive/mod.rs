//! Reading OVF descriptors out of packages.
//!
//! A package is either a bare `.ovf` descriptor or an `.ova` tape archive
//! containing one, stored locally or behind an HTTP(S) URL. The kind is
//! chosen from the locator's extension; the bytes returned are handed to
//! the envelope parser.
//!
//! # Example
//!
//! ```no_run
//! use ovaspec_core::archive::{open, ReaderConfig};
//!
//! let archive = open("/path/to/appliance.ova", &ReaderConfig::default()).unwrap();
//! let ovf = archive.read_ovf().unwrap();
//! ```

pub mod manifest;
pub mod remote;
pub mod tape;

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use memmap2::Mmap;

use crate::error::{Error, Result};

pub use remote::is_remote;

/// Default timeout for fetching remote archives.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for reading archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Timeout applied to remote fetches.
    pub timeout: Duration,
    /// Check the descriptor against the OVA manifest when one is present.
    pub verify_manifest: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            verify_manifest: false,
        }
    }
}

impl ReaderConfig {
    /// Create a reader configuration with the given settings.
    pub fn new(timeout: Duration, verify_manifest: bool) -> Self {
        Self {
            timeout,
            verify_manifest,
        }
    }
}

/// How the descriptor is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// A bare `.ovf` file.
    File,
    /// A tape archive (`.ova`, or no extension at all).
    Tape,
}

impl ArchiveKind {
    /// Choose the archive kind from the extension of `locator`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] for anything other than `.ovf`,
    /// `.ova` or no extension.
    pub fn from_path(locator: &str) -> Result<Self> {
        match extension(locator) {
            ".ovf" => Ok(Self::File),
            "" | ".ova" => Ok(Self::Tape),
            other => Err(Error::invalid_extension(other.trim_start_matches('.'))),
        }
    }
}

/// The extension of the last path element of `locator`, including the dot,
/// or an empty string when it has none.
fn extension(locator: &str) -> &str {
    let last = locator.rsplit('/').next().unwrap_or(locator);
    last.rfind('.').map(|dot| &last[dot..]).unwrap_or("")
}

/// Where archive bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Local(PathBuf),
    Remote(String),
}

impl Source {
    /// Classify a locator as a URL or a local path.
    pub fn from_locator(locator: &str) -> Self {
        if is_remote(locator) {
            Self::Remote(locator.to_string())
        } else {
            Self::Local(PathBuf::from(locator))
        }
    }

    /// Read the whole source into memory.
    fn read_all(&self, config: &ReaderConfig) -> Result<Vec<u8>> {
        match self {
            Self::Local(path) => fs::read(path).map_err(|e| Error::io(e, path)),
            Self::Remote(url) => {
                let mut response = remote::get(url, config.timeout)?;
                let mut data = Vec::new();
                response
                    .read_to_end(&mut data)
                    .map_err(|e| Error::remote(url.as_str(), e.to_string()))?;
                Ok(data)
            }
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

/// A package from which an OVF descriptor can be read.
pub trait Archive {
    /// Where the package lives.
    fn source(&self) -> &Source;

    /// Return the raw bytes of the OVF descriptor.
    fn read_ovf(&self) -> Result<Vec<u8>>;
}

/// A bare `.ovf` descriptor.
#[derive(Debug, Clone)]
pub struct FileArchive {
    source: Source,
    config: ReaderConfig,
}

impl FileArchive {
    pub fn new(source: Source, config: ReaderConfig) -> Self {
        Self { source, config }
    }
}

impl Archive for FileArchive {
    fn source(&self) -> &Source {
        &self.source
    }

    fn read_ovf(&self) -> Result<Vec<u8>> {
        let data = self.source.read_all(&self.config)?;
        tracing::debug!(source = %self.source, bytes = data.len(), "read OVF descriptor");
        Ok(data)
    }
}

/// An `.ova` tape archive.
#[derive(Debug, Clone)]
pub struct TapeArchive {
    source: Source,
    config: ReaderConfig,
}

impl TapeArchive {
    pub fn new(source: Source, config: ReaderConfig) -> Self {
        Self { source, config }
    }

    fn read_local(&self, path: &Path) -> Result<Vec<u8>> {
        let file = File::open(path).map_err(|e| Error::io(e, path))?;
        let size = file.metadata().map_err(|e| Error::io(e, path))?.len();
        if size == 0 {
            return self.extract(io::empty());
        }

        // Safety: the file is opened read-only and the map is dropped before
        // this function returns.
        let mmap = unsafe { Mmap::map(&file).map_err(|e| Error::io(e, path))? };
        self.extract(&mmap[..])
    }

    /// Scan the archive for the descriptor (and the manifest when
    /// verification is enabled), then verify it.
    fn extract<R: Read>(&self, reader: R) -> Result<Vec<u8>> {
        let contents = tape::scan(reader, self.config.verify_manifest)?;
        let Some((name, descriptor)) = contents.descriptor else {
            return Err(Error::archive(format!(
                "no OVF descriptor found in '{}'",
                self.source
            )));
        };
        tracing::debug!(member = %name, bytes = descriptor.len(), "read OVF descriptor");

        if self.config.verify_manifest {
            match contents.manifest {
                Some(manifest) => manifest::verify_descriptor(&manifest, &name, &descriptor)?,
                None => tracing::warn!(source = %self.source, "archive has no manifest to verify"),
            }
        }

        Ok(descriptor)
    }
}

impl Archive for TapeArchive {
    fn source(&self) -> &Source {
        &self.source
    }

    fn read_ovf(&self) -> Result<Vec<u8>> {
        match &self.source {
            Source::Local(path) => self.read_local(path),
            Source::Remote(url) => {
                let response = remote::get(url, self.config.timeout)?;
                self.extract(response)
            }
        }
    }
}

/// Resolve `locator` to an archive.
///
/// # Errors
///
/// Returns [`Error::InvalidExtension`] if the locator's extension names no
/// known archive kind. No I/O happens until [`Archive::read_ovf`].
pub fn open(locator: &str, config: &ReaderConfig) -> Result<Box<dyn Archive>> {
    let kind = ArchiveKind::from_path(locator)?;
    let source = Source::from_locator(locator);
    tracing::debug!(?kind, %source, "resolved archive");

    Ok(match kind {
        ArchiveKind::File => Box::new(FileArchive::new(source, config.clone())),
        ArchiveKind::Tape => Box::new(TapeArchive::new(source, config.clone())),
    })
}

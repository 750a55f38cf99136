//! OVA manifest (`.mf`) parsing and descriptor verification.

use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::archive::tape::base_name;
use crate::error::{Error, Result};

/// One `ALGO(file)= digest` line of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub algorithm: String,
    pub file: String,
    pub digest: String,
}

/// Parse manifest text. Blank lines are ignored.
///
/// # Errors
///
/// Returns [`Error::Manifest`] for a line that is not of the form
/// `ALGO(file)= digest`.
pub fn parse_manifest(text: &str) -> Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let malformed = || Error::manifest(format!("malformed line {}: '{line}'", index + 1));
        let (head, digest) = line.split_once(")=").ok_or_else(malformed)?;
        let (algorithm, file) = head.split_once('(').ok_or_else(malformed)?;

        entries.push(ManifestEntry {
            algorithm: algorithm.trim().to_string(),
            file: file.to_string(),
            digest: digest.trim().to_string(),
        });
    }

    Ok(entries)
}

/// Compute the lowercase hex SHA-1 digest of `data`.
pub fn sha1_hex(data: &[u8]) -> String {
    format!("{:x}", Sha1::digest(data))
}

/// Compute the lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Compute the lowercase hex SHA-512 digest of `data`.
pub fn sha512_hex(data: &[u8]) -> String {
    format!("{:x}", Sha512::digest(data))
}

/// Check the descriptor `name` with contents `data` against a manifest.
///
/// A manifest without an entry for the descriptor, or whose entry uses a
/// digest this crate cannot compute, is logged and accepted.
///
/// # Errors
///
/// Returns [`Error::Manifest`] if the manifest is malformed or the digest
/// does not match.
pub fn verify_descriptor(manifest: &[u8], name: &str, data: &[u8]) -> Result<()> {
    let text = String::from_utf8_lossy(manifest);
    let entries = parse_manifest(&text)?;

    let Some(entry) = entries
        .iter()
        .find(|e| e.file == name)
        .or_else(|| entries.iter().find(|e| base_name(&e.file) == base_name(name)))
    else {
        tracing::warn!(descriptor = name, "manifest has no entry for the descriptor");
        return Ok(());
    };

    let actual = match entry.algorithm.to_ascii_uppercase().as_str() {
        "SHA1" => sha1_hex(data),
        "SHA256" => sha256_hex(data),
        "SHA512" => sha512_hex(data),
        other => {
            tracing::warn!(
                descriptor = name,
                algorithm = other,
                "cannot verify manifest digest, skipping"
            );
            return Ok(());
        }
    };

    if !actual.eq_ignore_ascii_case(&entry.digest) {
        return Err(Error::manifest(format!(
            "{} digest of '{}' does not match the manifest (expected {}, got {})",
            entry.algorithm, name, entry.digest, actual
        )));
    }

    tracing::debug!(descriptor = name, algorithm = %entry.algorithm, "manifest digest verified");
    Ok(())
}

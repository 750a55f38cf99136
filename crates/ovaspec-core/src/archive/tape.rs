//! Scanning tape (tar) archives for the OVF descriptor and manifest.
//!
//! An OVA is a plain tar archive. Members are visited in order through
//! [`tar::Archive::entries`], which only moves forward, so the same code
//! serves memory-mapped local files and HTTP response bodies. GNU long names
//! and pax `path` records are resolved by the `tar` crate.

use std::io::{self, Read};

use tar::EntryType;

use crate::error::{Error, Result};

/// Largest descriptor or manifest member that will be buffered in memory.
pub const MAX_BUFFERED_SIZE: u64 = 64 * 1024 * 1024;

/// The last `/`-separated element of a member name.
pub fn base_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Members of interest found while scanning a tape archive.
#[derive(Debug, Default)]
pub struct TapeContents {
    /// Name and contents of the first `*.ovf` member.
    pub descriptor: Option<(String, Vec<u8>)>,
    /// Contents of the first `*.mf` member, when requested.
    pub manifest: Option<Vec<u8>>,
}

/// Walk the archive once, keeping the first `*.ovf` member and, if asked,
/// the first `*.mf` member. Stops as soon as nothing more is needed.
///
/// # Errors
///
/// Returns [`Error::Archive`] for corrupt or truncated archives and for
/// members too large to buffer, and [`Error::Io`] when the underlying reader
/// fails.
pub fn scan<R: Read>(reader: R, want_manifest: bool) -> Result<TapeContents> {
    let mut archive = tar::Archive::new(reader);
    let mut contents = TapeContents::default();

    for entry in archive.entries().map_err(tar_error)? {
        let mut entry = entry.map_err(tar_error)?;
        if !matches!(
            entry.header().entry_type(),
            EntryType::Regular | EntryType::Continuous
        ) {
            continue;
        }

        let name = entry
            .path()
            .map_err(tar_error)?
            .to_string_lossy()
            .into_owned();
        let size = entry.size();
        tracing::trace!(member = %name, size, "tape member");

        let base = base_name(&name);
        let is_descriptor = base.ends_with(".ovf");
        let is_manifest = base.ends_with(".mf");

        if contents.descriptor.is_none() && is_descriptor {
            let data = read_member(&mut entry, &name, size)?;
            contents.descriptor = Some((name, data));
        } else if want_manifest && contents.manifest.is_none() && is_manifest {
            contents.manifest = Some(read_member(&mut entry, &name, size)?);
        }

        let done = contents.descriptor.is_some() && (!want_manifest || contents.manifest.is_some());
        if done {
            break;
        }
    }

    Ok(contents)
}

/// Buffer the data of one member, refusing anything over
/// [`MAX_BUFFERED_SIZE`].
fn read_member<R: Read>(entry: &mut R, name: &str, size: u64) -> Result<Vec<u8>> {
    if size > MAX_BUFFERED_SIZE {
        return Err(Error::archive(format!(
            "member '{name}' is too large to buffer ({size} bytes)"
        )));
    }

    let mut data = Vec::new();
    entry
        .take(size)
        .read_to_end(&mut data)
        .map_err(tar_error)?;
    if data.len() as u64 != size {
        return Err(Error::archive(format!(
            "archive truncated inside member '{name}'"
        )));
    }
    Ok(data)
}

/// Malformed archive data surfaces from `tar` as `Other`/`InvalidData`
/// errors; anything else is a failure of the underlying reader.
fn tar_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::Other | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            Error::archive(e.to_string())
        }
        _ => Error::io_simple(e),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tar::{Builder, Header};

    /// Build an in-memory archive from `(name, type flag, data)` members.
    pub(crate) fn archive(members: &[(&str, u8, &[u8])]) -> Vec<u8> {
        let mut builder = Builder::new(Vec::new());
        for &(name, kind, data) in members {
            let mut header = Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_entry_type(EntryType::new(kind));
            builder.append_data(&mut header, name, data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("vm.ovf"), "vm.ovf");
        assert_eq!(base_name("dir/vm.ovf"), "vm.ovf");
        assert_eq!(base_name("dir/"), "dir");
    }

    #[test]
    fn test_scan_skips_other_members() {
        let data = archive(&[
            ("disk1.vmdk", b'0', &[7u8; 700]),
            ("appliance.ovf", b'0', b"<Envelope/>"),
        ]);
        let contents = scan(&data[..], false).unwrap();
        let (name, descriptor) = contents.descriptor.unwrap();
        assert_eq!(name, "appliance.ovf");
        assert_eq!(descriptor, b"<Envelope/>");
    }

    #[test]
    fn test_scan_skips_non_regular_members() {
        let data = archive(&[("link.ovf", b'2', b""), ("vm.ovf", b'0', b"x")]);
        let (name, _) = scan(&data[..], false).unwrap().descriptor.unwrap();
        assert_eq!(name, "vm.ovf");
    }

    #[test]
    fn test_scan_gnu_long_name() {
        let long = format!("{}/vm.ovf", "d".repeat(120));
        let data = archive(&[(long.as_str(), b'0', b"x")]);
        let (name, descriptor) = scan(&data[..], false).unwrap().descriptor.unwrap();
        assert_eq!(name, long);
        assert_eq!(descriptor, b"x");
    }

    #[test]
    fn test_scan_pax_path() {
        let record = "21 path=pax-name.ovf\n";
        let data = archive(&[("PaxHeader", b'x', record.as_bytes()), ("short", b'0', b"x")]);
        let (name, _) = scan(&data[..], false).unwrap().descriptor.unwrap();
        assert_eq!(name, "pax-name.ovf");
    }

    #[test]
    fn test_scan_missing_end_marker() {
        let mut data = archive(&[("vm.ovf", b'0', b"abc")]);
        data.truncate(2 * 512);
        assert!(scan(&data[..], false).unwrap().descriptor.is_some());
    }

    #[test]
    fn test_scan_truncated_data() {
        let mut data = archive(&[("vm.ovf", b'0', &[1u8; 600])]);
        data.truncate(512 + 100);
        let err = scan(&data[..], false).unwrap_err();
        assert!(matches!(err, Error::Archive { .. }));
    }

    #[test]
    fn test_scan_truncated_header() {
        let data = vec![b'a'; 100];
        assert!(scan(&data[..], false).is_err());
    }

    #[test]
    fn test_scan_corrupt_checksum() {
        let mut data = archive(&[("vm.ovf", b'0', b"x")]);
        data[0] = b'w';
        assert!(matches!(scan(&data[..], false), Err(Error::Archive { .. })));
    }

    #[test]
    fn test_scan_huge_size_is_an_error() {
        // Base-256 size field decoding to u64::MAX with no data behind it.
        let mut header = Header::new_gnu();
        header.set_path("vm.ovf").unwrap();
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        header.set_size(u64::MAX);
        header.set_cksum();
        assert_eq!(header.as_bytes()[124], 0x80);

        let mut data = header.as_bytes().to_vec();
        data.extend_from_slice(&[0u8; 1024]);
        assert!(scan(&data[..], false).is_err());
    }

    #[test]
    fn test_scan_oversized_descriptor() {
        let mut header = Header::new_gnu();
        header.set_path("vm.ovf").unwrap();
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        header.set_size(MAX_BUFFERED_SIZE + 1);
        header.set_cksum();

        let mut data = header.as_bytes().to_vec();
        data.extend_from_slice(&[0u8; 1024]);
        let err = scan(&data[..], false).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_empty_input_has_no_members() {
        let contents = scan(io::empty(), true).unwrap();
        assert!(contents.descriptor.is_none());
        assert!(contents.manifest.is_none());
    }
}

//! ovaspec Core Library
//!
//! This crate builds editable import specifications from OVF/OVA packages.
//!
//! # Overview
//!
//! An import specification ([`Options`]) lists the choices that drive the
//! import of a package: disk provisioning, IP allocation, the deployment
//! configuration, network mappings and the values of user-configurable
//! product properties. The main entry point is [`build_spec`], which turns a
//! parsed [`Envelope`] into [`Options`]; [`read_spec`] adds reading and
//! parsing the package first.
//!
//! # Modules
//!
//! - [`error`] - Error types and Result alias
//! - [`archive`] - Locating the OVF descriptor in `.ovf`/`.ova` packages, local or remote
//! - [`ovf`] - OVF envelope model and parser
//! - [`options`] - The import specification and its choice universes
//! - [`spec`] - Specification builder
//!
//! # Quick Start
//!
//! ```no_run
//! use ovaspec_core::{read_spec, ReaderConfig};
//!
//! let options = read_spec(Some("/path/to/appliance.ova"), &ReaderConfig::default(), true).unwrap();
//! println!("{}", options.to_json_pretty().unwrap());
//! ```

pub mod archive;
pub mod error;
pub mod options;
pub mod ovf;
pub mod spec;

pub use error::{Error, Result};

// Re-export the main specification types for convenience
pub use archive::{is_remote, ArchiveKind, ReaderConfig};
pub use options::{
    DiskProvisioning, IpAllocationPolicy, IpProtocol, KeyValue, Network, Options, Property,
};
pub use ovf::{parse_envelope, Envelope};
pub use spec::{build_spec, map_properties, read_envelope, read_spec};

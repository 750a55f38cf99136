//! OVF envelope model and parser.
//!
//! This module holds the read-only view of an OVF descriptor that the
//! specification builder consumes, and the XML parser that produces it.

pub mod envelope;
pub mod parse;

pub use envelope::{
    AnnotationSection, Configuration, DeploymentOptionSection, Envelope, Network, NetworkSection,
    ProductSection, Property, PropertyConfigurationValue, VirtualSystem, BOOLEAN_TYPE,
};
pub use parse::parse_envelope;

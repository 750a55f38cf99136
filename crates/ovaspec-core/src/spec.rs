//! Import specification builder.
//!
//! Turns an [`Envelope`] into [`Options`]: every choice is set to its
//! default, configurable properties are flattened to qualified keys, and
//! declared networks get empty mapping targets for an operator to fill in.
//!
//! # Example
//!
//! ```
//! use ovaspec_core::spec::build_spec;
//! use ovaspec_core::DiskProvisioning;
//!
//! let options = build_spec(None, false);
//! assert_eq!(options.disk_provisioning, DiskProvisioning::Flat);
//! assert!(options.deployment.is_none());
//! ```

use crate::archive::{self, ReaderConfig};
use crate::error::Result;
use crate::options::{
    DiskProvisioning, IpAllocationPolicy, IpProtocol, KeyValue, Network, Options, Property,
};
use crate::ovf::{parse_envelope, Envelope, ProductSection};

/// Flatten the user-configurable properties of every product section.
///
/// Sections and properties keep document order. Properties that are not
/// explicitly user configurable are dropped. In verbose mode each entry
/// carries the original property definition.
pub fn map_properties(envelope: &Envelope, verbose: bool) -> Vec<Property> {
    let mut mapping = Vec::new();

    for section in envelope.products() {
        for property in &section.property {
            if !property.is_user_configurable() {
                continue;
            }

            let mut value = property.default.clone().unwrap_or_default();
            // vSphere only accepts True/False for boolean properties.
            if property.is_boolean() {
                value = title_case(&value);
            }

            mapping.push(Property {
                key_value: KeyValue {
                    key: property_key(section, &property.key),
                    value,
                },
                spec: verbose.then(|| property.clone()),
            });
        }
    }

    mapping
}

/// Qualify a property key as it appears in the OVF environment:
/// `[class "."] key ["." instance]`.
fn property_key(section: &ProductSection, key: &str) -> String {
    let mut qualified = String::new();
    if let Some(class) = &section.class {
        qualified.push_str(class);
        qualified.push('.');
    }
    qualified.push_str(key);
    if let Some(instance) = &section.instance {
        qualified.push('.');
        qualified.push_str(instance);
    }
    qualified
}

/// Title-case the first letter of each word, leaving everything else as is.
///
/// Word boundaries follow Go's `strings.Title`: any ASCII character other
/// than a letter, digit or underscore separates words, while outside ASCII
/// only whitespace does.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        out.push(if at_word_start { to_title(c) } else { c });
        at_word_start = is_word_separator(c);
    }
    out
}

fn is_word_separator(c: char) -> bool {
    if c.is_ascii() {
        !(c.is_ascii_alphanumeric() || c == '_')
    } else {
        c.is_whitespace()
    }
}

/// Single-character title case mapping.
///
/// The Latin digraphs have a distinct title case form. Other characters use
/// their uppercase form when it is a single character and are kept otherwise.
fn to_title(c: char) -> char {
    match c {
        '\u{01C4}'..='\u{01C6}' => '\u{01C5}',
        '\u{01C7}'..='\u{01C9}' => '\u{01C8}',
        '\u{01CA}'..='\u{01CC}' => '\u{01CB}',
        '\u{01F1}'..='\u{01F3}' => '\u{01F2}',
        _ => {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) => u,
                _ => c,
            }
        }
    }
}

/// Deployment configuration IDs, defaults first, each group in document
/// order.
fn deployment_options(envelope: &Envelope) -> Vec<String> {
    let configurations = envelope.configurations();
    let defaults = configurations.iter().filter(|c| c.is_default());
    let others = configurations.iter().filter(|c| !c.is_default());
    defaults.chain(others).map(|c| c.id.clone()).collect()
}

/// Build the import specification for `envelope`.
///
/// `None` stands for a package with no OVF source and yields the defaults.
/// In verbose mode every legal alternative for the choice fields is attached
/// as well. This never fails and has no side effects.
pub fn build_spec(envelope: Option<&Envelope>, verbose: bool) -> Options {
    let empty = Envelope::default();
    let envelope = envelope.unwrap_or(&empty);

    let deployments = deployment_options(envelope);

    let mut options = Options {
        deployment: deployments.first().cloned(),
        disk_provisioning: DiskProvisioning::ALL[0],
        ip_allocation_policy: IpAllocationPolicy::ALL[0],
        ip_protocol: IpProtocol::ALL[0],
        mark_as_template: false,
        power_on: false,
        wait_for_ip: false,
        inject_ovf_env: false,
        property_mapping: map_properties(envelope, verbose),
        ..Options::default()
    };

    if let Some(system) = &envelope.virtual_system {
        for section in &system.annotation {
            options.annotation.push_str(&section.annotation);
        }
    }

    options.network_mapping = envelope
        .networks()
        .iter()
        .map(|net| Network {
            name: net.name.clone(),
            network: String::new(),
        })
        .collect();

    if verbose {
        options.all_deployment_options = deployments;
        options.all_disk_provisioning_options = DiskProvisioning::ALL.to_vec();
        options.all_ip_allocation_policy_options = IpAllocationPolicy::ALL.to_vec();
        options.all_ip_protocol_options = IpProtocol::ALL.to_vec();
    }

    tracing::debug!(
        verbose,
        deployment = ?options.deployment,
        properties = options.property_mapping.len(),
        networks = options.network_mapping.len(),
        "built import specification"
    );

    options
}

/// Read the package at `locator` and build its import specification.
///
/// With no locator this is `build_spec(None, verbose)`.
///
/// # Errors
///
/// Returns an error if the locator has an unknown extension, the archive
/// cannot be read, or the descriptor cannot be parsed.
pub fn read_spec(locator: Option<&str>, config: &ReaderConfig, verbose: bool) -> Result<Options> {
    let Some(locator) = locator else {
        return Ok(build_spec(None, verbose));
    };

    let envelope = read_envelope(locator, config)?;
    Ok(build_spec(Some(&envelope), verbose))
}

/// Read and parse the OVF descriptor of the package at `locator`.
///
/// # Errors
///
/// Returns an error if the locator has an unknown extension, the archive
/// cannot be read, or the descriptor cannot be parsed.
pub fn read_envelope(locator: &str, config: &ReaderConfig) -> Result<Envelope> {
    let archive = archive::open(locator, config)?;
    let ovf = archive.read_ovf()?;
    parse_envelope(&ovf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(class: Option<&str>, instance: Option<&str>) -> ProductSection {
        ProductSection {
            class: class.map(str::to_string),
            instance: instance.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_property_key_fully_qualified() {
        assert_eq!(property_key(&section(Some("Net"), Some("0")), "ip"), "Net.ip.0");
    }

    #[test]
    fn test_property_key_unqualified() {
        assert_eq!(property_key(&section(None, None), "ip"), "ip");
    }

    #[test]
    fn test_property_key_partially_qualified() {
        assert_eq!(property_key(&section(Some("vami"), None), "ip0"), "vami.ip0");
        assert_eq!(property_key(&section(None, Some("VM_1")), "ip0"), "ip0.VM_1");
    }

    #[test]
    fn test_property_key_empty_qualifiers_are_present() {
        assert_eq!(property_key(&section(Some(""), None), "ip"), ".ip");
        assert_eq!(property_key(&section(None, Some("")), "ip"), "ip.");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("true"), "True");
        assert_eq!(title_case("false"), "False");
        assert_eq!(title_case("TRUE"), "TRUE");
        assert_eq!(title_case(""), "");
        assert_eq!(title_case("hello world"), "Hello World");
        assert_eq!(title_case("snake_case x-y"), "Snake_case X-Y");
    }

    #[test]
    fn test_title_case_non_ascii_boundaries() {
        // Non-ASCII symbols do not start a new word; non-ASCII whitespace does.
        assert_eq!(title_case("a\u{20AC}b"), "A\u{20AC}b");
        assert_eq!(title_case("a\u{00A0}b"), "A\u{00A0}B");
        assert_eq!(title_case("\u{00E9}t\u{00E9}"), "\u{00C9}t\u{00E9}");
    }

    #[test]
    fn test_title_case_mapping() {
        assert_eq!(title_case("\u{01C6}x"), "\u{01C5}x");
        assert_eq!(title_case("\u{01C4}"), "\u{01C5}");
        // No single-character uppercase form.
        assert_eq!(title_case("\u{00DF}"), "\u{00DF}");
    }

    #[test]
    fn test_build_spec_none_equals_default_options() {
        assert_eq!(build_spec(None, false), Options::default());
    }
}

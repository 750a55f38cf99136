//! Integration tests for OVF envelope parsing.

use ovaspec_core::ovf::{parse_envelope, Envelope};
use ovaspec_core::Error;
use std::fs;
use std::path::Path;

fn fixture_path() -> &'static Path {
    Path::new(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/appliance.ovf"
    ))
}

fn fixture() -> Envelope {
    let data = fs::read(fixture_path()).expect("Failed to read fixture");
    parse_envelope(&data).expect("Failed to parse fixture")
}

#[test]
fn test_parse_networks() {
    let envelope = fixture();
    let section = envelope.network.as_ref().expect("NetworkSection missing");
    assert_eq!(section.info, "The list of logical networks");

    let networks = envelope.networks();
    assert_eq!(networks.len(), 2);
    assert_eq!(networks[0].name, "VM Network");
    assert_eq!(
        networks[0].description.as_deref(),
        Some("The VM Network network")
    );
    assert_eq!(networks[1].name, "Mgmt");
    assert_eq!(networks[1].description, None);
}

#[test]
fn test_parse_deployment_options() {
    let envelope = fixture();
    let configs = envelope.configurations();
    let ids: Vec<&str> = configs.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["tiny", "small", "large"]);

    assert_eq!(configs[0].default, None);
    assert!(configs[1].is_default());
    assert_eq!(configs[1].label.as_deref(), Some("Small"));
    assert_eq!(
        configs[1].description.as_deref(),
        Some("2 vCPUs, 4 GB memory")
    );
    assert_eq!(configs[2].description, None);
}

#[test]
fn test_parse_virtual_system() {
    let envelope = fixture();
    let system = envelope.virtual_system.as_ref().expect("VirtualSystem missing");
    assert_eq!(system.id, "appliance");
    assert_eq!(system.info, "A virtual machine");
    assert_eq!(system.name.as_deref(), Some("Appliance"));
    assert_eq!(system.annotation.len(), 1);
    assert_eq!(system.annotation[0].annotation, "Acme network appliance.");
}

#[test]
fn test_parse_product_sections() {
    let envelope = fixture();
    let products = envelope.products();
    assert_eq!(products.len(), 2);

    let main = &products[0];
    assert_eq!(main.class, None);
    assert_eq!(main.instance, None);
    assert_eq!(main.product.as_deref(), Some("Acme Appliance"));
    assert_eq!(main.vendor.as_deref(), Some("Acme"));
    assert_eq!(main.version.as_deref(), Some("4.2"));
    assert_eq!(main.full_version.as_deref(), Some("4.2.0-1234"));
    assert_eq!(
        main.product_url.as_deref(),
        Some("https://acme.example.com/appliance")
    );
    let keys: Vec<&str> = main.property.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(keys, ["hostname", "ssh_enabled", "build", "root_password"]);
    assert_eq!(main.property[2].user_configurable, None);
    assert_eq!(main.property[3].password, Some(true));

    let vami = &products[1];
    assert_eq!(vami.class.as_deref(), Some("vami"));
    assert_eq!(vami.instance.as_deref(), Some("appliance"));
    assert_eq!(vami.property.len(), 3);
    assert_eq!(vami.property[0].values.len(), 1);
    assert_eq!(vami.property[1].user_configurable, Some(false));
}

#[test]
fn test_from_str_matches_parse() {
    let text = fs::read_to_string(fixture_path()).expect("Failed to read fixture");
    let envelope: Envelope = text.parse().expect("Failed to parse fixture");
    assert_eq!(envelope, fixture());
}

#[test]
fn test_parse_is_deterministic() {
    assert_eq!(fixture(), fixture());
}

#[test]
fn test_parse_malformed_xml() {
    let err = parse_envelope(b"<Envelope><VirtualSystem ovf:id=\"a\"></Envelope>").unwrap_err();
    assert!(matches!(err, Error::EnvelopeParse { .. }));
}

#[test]
fn test_parse_not_xml() {
    let err = parse_envelope(b"this is not an OVF descriptor").unwrap_err();
    assert!(matches!(err, Error::EnvelopeParse { .. }));
}

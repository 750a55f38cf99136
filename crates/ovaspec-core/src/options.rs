//! Import specification options.
//!
//! [`Options`] is the editable document produced from an OVF envelope. It is
//! serialized with the PascalCase field names import tooling expects, so an
//! operator can save it, fill in network targets or property values, and
//! feed it back into an import.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ovf;

/// Disk provisioning format for the imported virtual disks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiskProvisioning {
    #[default]
    Flat,
    MonolithicSparse,
    MonolithicFlat,
    TwoGbMaxExtentSparse,
    TwoGbMaxExtentFlat,
    Thin,
    Thick,
    SeSparse,
    EagerZeroedThick,
    Sparse,
}

impl DiskProvisioning {
    /// Every provisioning kind, in presentation order. The first entry is
    /// the default.
    pub const ALL: [Self; 10] = [
        Self::Flat,
        Self::MonolithicSparse,
        Self::MonolithicFlat,
        Self::TwoGbMaxExtentSparse,
        Self::TwoGbMaxExtentFlat,
        Self::Thin,
        Self::Thick,
        Self::SeSparse,
        Self::EagerZeroedThick,
        Self::Sparse,
    ];

    /// The wire name of this provisioning kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::MonolithicSparse => "monolithicSparse",
            Self::MonolithicFlat => "monolithicFlat",
            Self::TwoGbMaxExtentSparse => "twoGbMaxExtentSparse",
            Self::TwoGbMaxExtentFlat => "twoGbMaxExtentFlat",
            Self::Thin => "thin",
            Self::Thick => "thick",
            Self::SeSparse => "seSparse",
            Self::EagerZeroedThick => "eagerZeroedThick",
            Self::Sparse => "sparse",
        }
    }
}

/// How IP addresses are assigned to the imported VM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IpAllocationPolicy {
    #[default]
    DhcpPolicy,
    TransientPolicy,
    FixedPolicy,
    FixedAllocatedPolicy,
}

impl IpAllocationPolicy {
    /// Every allocation policy, in presentation order. The first entry is
    /// the default.
    pub const ALL: [Self; 4] = [
        Self::DhcpPolicy,
        Self::TransientPolicy,
        Self::FixedPolicy,
        Self::FixedAllocatedPolicy,
    ];

    /// The wire name of this allocation policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DhcpPolicy => "dhcpPolicy",
            Self::TransientPolicy => "transientPolicy",
            Self::FixedPolicy => "fixedPolicy",
            Self::FixedAllocatedPolicy => "fixedAllocatedPolicy",
        }
    }
}

/// IP protocol used for address assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpProtocol {
    #[default]
    #[serde(rename = "IPv4")]
    Ipv4,
    #[serde(rename = "IPv6")]
    Ipv6,
}

impl IpProtocol {
    /// Every protocol, in presentation order. The first entry is the default.
    pub const ALL: [Self; 2] = [Self::Ipv4, Self::Ipv6];

    /// The wire name of this protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ipv4 => "IPv4",
            Self::Ipv6 => "IPv6",
        }
    }
}

/// Error returned when a string names no member of a choice universe.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownChoice {
    kind: &'static str,
    value: String,
}

macro_rules! choice_impls {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownChoice;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .into_iter()
                    .find(|choice| choice.as_str() == s)
                    .ok_or_else(|| UnknownChoice {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

choice_impls!(DiskProvisioning, "disk provisioning");
choice_impls!(IpAllocationPolicy, "IP allocation policy");
choice_impls!(IpProtocol, "IP protocol");

/// A plain key/value pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// A resolved, user-configurable product property.
///
/// `key` is the fully qualified OVF environment key and `value` its default.
/// In verbose mode `spec` carries the original property definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Property {
    #[serde(flatten)]
    pub key_value: KeyValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<ovf::Property>,
}

/// Maps a network declared by the package to a target network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Network {
    /// Network name as declared in the package.
    pub name: String,
    /// Target network; empty until an operator fills it in.
    pub network: String,
}

/// An import specification.
///
/// `Options::default()` is the specification for a package that declares
/// nothing: every choice at its default, all flags off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Options {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_deployment_options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_disk_provisioning_options: Vec<DiskProvisioning>,
    pub disk_provisioning: DiskProvisioning,

    #[serde(
        rename = "AllIPAllocationPolicyOptions",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub all_ip_allocation_policy_options: Vec<IpAllocationPolicy>,
    #[serde(rename = "IPAllocationPolicy")]
    pub ip_allocation_policy: IpAllocationPolicy,

    #[serde(rename = "AllIPProtocolOptions", skip_serializing_if = "Vec::is_empty")]
    pub all_ip_protocol_options: Vec<IpProtocol>,
    #[serde(rename = "IPProtocol")]
    pub ip_protocol: IpProtocol,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub property_mapping: Vec<Property>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub network_mapping: Vec<Network>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub annotation: String,

    pub mark_as_template: bool,
    pub power_on: bool,
    pub inject_ovf_env: bool,
    #[serde(rename = "WaitForIP")]
    pub wait_for_ip: bool,

    /// Name for the imported VM. Never set from the package itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Options {
    /// Load a (possibly hand-edited) specification from JSON.
    ///
    /// Choice fields must name members of their universes; omitted fields
    /// take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize the specification as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universe_sizes() {
        assert_eq!(DiskProvisioning::ALL.len(), 10);
        assert_eq!(IpAllocationPolicy::ALL.len(), 4);
        assert_eq!(IpProtocol::ALL.len(), 2);
    }

    #[test]
    fn test_defaults_are_first_of_universe() {
        assert_eq!(DiskProvisioning::default(), DiskProvisioning::ALL[0]);
        assert_eq!(IpAllocationPolicy::default(), IpAllocationPolicy::ALL[0]);
        assert_eq!(IpProtocol::default(), IpProtocol::ALL[0]);
    }

    #[test]
    fn test_disk_provisioning_names() {
        let names: Vec<&str> = DiskProvisioning::ALL.iter().map(|d| d.as_str()).collect();
        assert_eq!(
            names,
            [
                "flat",
                "monolithicSparse",
                "monolithicFlat",
                "twoGbMaxExtentSparse",
                "twoGbMaxExtentFlat",
                "thin",
                "thick",
                "seSparse",
                "eagerZeroedThick",
                "sparse",
            ]
        );
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for choice in DiskProvisioning::ALL {
            assert_eq!(serde_json::to_value(choice).unwrap(), choice.as_str());
        }
        for choice in IpAllocationPolicy::ALL {
            assert_eq!(serde_json::to_value(choice).unwrap(), choice.as_str());
        }
        for choice in IpProtocol::ALL {
            assert_eq!(serde_json::to_value(choice).unwrap(), choice.as_str());
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("thin".parse::<DiskProvisioning>(), Ok(DiskProvisioning::Thin));
        assert_eq!(
            "fixedPolicy".parse::<IpAllocationPolicy>(),
            Ok(IpAllocationPolicy::FixedPolicy)
        );
        assert_eq!("IPv6".parse::<IpProtocol>(), Ok(IpProtocol::Ipv6));

        let err = "ipv6".parse::<IpProtocol>().unwrap_err();
        assert_eq!(err.to_string(), "unknown IP protocol 'ipv6'");
    }

    #[test]
    fn test_display() {
        assert_eq!(DiskProvisioning::EagerZeroedThick.to_string(), "eagerZeroedThick");
        assert_eq!(IpAllocationPolicy::TransientPolicy.to_string(), "transientPolicy");
        assert_eq!(IpProtocol::Ipv4.to_string(), "IPv4");
    }

    #[test]
    fn test_property_serializes_flat() {
        let property = Property {
            key_value: KeyValue {
                key: "Net.ip.0".to_string(),
                value: "10.0.0.1".to_string(),
            },
            spec: None,
        };
        let json = serde_json::to_string(&property).unwrap();
        assert_eq!(json, r#"{"Key":"Net.ip.0","Value":"10.0.0.1"}"#);
    }

    #[test]
    fn test_default_options_json() {
        let json = serde_json::to_value(Options::default()).unwrap();
        assert_eq!(json["DiskProvisioning"], "flat");
        assert_eq!(json["IPAllocationPolicy"], "dhcpPolicy");
        assert_eq!(json["IPProtocol"], "IPv4");
        assert_eq!(json["MarkAsTemplate"], false);
        assert_eq!(json["PowerOn"], false);
        assert_eq!(json["InjectOvfEnv"], false);
        assert_eq!(json["WaitForIP"], false);
        assert!(json.get("Deployment").is_none());
        assert!(json.get("AllDiskProvisioningOptions").is_none());
        assert!(json.get("NetworkMapping").is_none());
        assert!(json.get("Annotation").is_none());
        assert!(json.get("Name").is_none());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let options = Options::from_json(r#"{"DiskProvisioning":"thin","PowerOn":true}"#).unwrap();
        assert_eq!(options.disk_provisioning, DiskProvisioning::Thin);
        assert!(options.power_on);
        assert_eq!(options.ip_protocol, IpProtocol::Ipv4);
    }

    #[test]
    fn test_from_json_rejects_unknown_choice() {
        assert!(Options::from_json(r#"{"DiskProvisioning":"compressed"}"#).is_err());
    }
}

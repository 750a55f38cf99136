//! OVF envelope data model.
//!
//! Only the sections that drive an import specification are modelled:
//! networks, deployment options and the single top-level virtual system with
//! its annotation and product sections. Everything else in a descriptor is
//! skipped by the parser.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The `ovf:type` value of boolean properties.
pub const BOOLEAN_TYPE: &str = "boolean";

/// A parsed OVF descriptor.
///
/// `Envelope::default()` is the empty envelope, used when there is no OVF
/// source at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope {
    /// Networks the package expects to be connected to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkSection>,
    /// Alternative hardware configurations offered by the package.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_option: Option<DeploymentOptionSection>,
    /// The top-level virtual system, if the package has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_system: Option<VirtualSystem>,
}

impl Envelope {
    /// Returns the declared deployment configurations, in document order.
    pub fn configurations(&self) -> &[Configuration] {
        self.deployment_option
            .as_ref()
            .map(|section| section.configuration.as_slice())
            .unwrap_or_default()
    }

    /// Returns the declared networks, in document order.
    pub fn networks(&self) -> &[Network] {
        self.network
            .as_ref()
            .map(|section| section.networks.as_slice())
            .unwrap_or_default()
    }

    /// Returns the product sections of the virtual system, in document order.
    pub fn products(&self) -> &[ProductSection] {
        self.virtual_system
            .as_ref()
            .map(|vs| vs.product.as_slice())
            .unwrap_or_default()
    }
}

impl FromStr for Envelope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        super::parse::parse_envelope(s.as_bytes())
    }
}

/// `ovf:NetworkSection`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkSection {
    pub info: String,
    pub networks: Vec<Network>,
}

/// A logical network referenced by the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Network {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `ovf:DeploymentOptionSection`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentOptionSection {
    pub info: String,
    pub configuration: Vec<Configuration>,
}

/// A named deployment configuration (e.g. "small", "large").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Configuration {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Configuration {
    /// Whether this configuration is explicitly marked as the default.
    pub fn is_default(&self) -> bool {
        self.default == Some(true)
    }
}

/// `ovf:VirtualSystem`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VirtualSystem {
    #[serde(rename = "ID")]
    pub id: String,
    pub info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotation: Vec<AnnotationSection>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub product: Vec<ProductSection>,
}

/// `ovf:AnnotationSection`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnnotationSection {
    pub info: String,
    pub annotation: String,
}

/// `ovf:ProductSection`.
///
/// `class` and `instance` qualify the keys of every property in the section
/// when they are presented in the OVF environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductSection {
    pub info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_version: Option<String>,
    #[serde(rename = "ProductURL", skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(rename = "VendorURL", skip_serializing_if = "Option::is_none")]
    pub vendor_url: Option<String>,
    #[serde(rename = "AppURL", skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub property: Vec<Property>,
}

/// A product property declared in a product section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Property {
    pub key: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifiers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_configurable: Option<bool>,
    /// The `ovf:value` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<PropertyConfigurationValue>,
}

impl Property {
    /// Whether the property is explicitly marked user configurable.
    pub fn is_user_configurable(&self) -> bool {
        self.user_configurable == Some(true)
    }

    /// Whether the property is declared with the boolean type.
    pub fn is_boolean(&self) -> bool {
        self.kind == BOOLEAN_TYPE
    }
}

/// A per-configuration override of a property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertyConfigurationValue {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_envelope_accessors() {
        let envelope = Envelope::default();
        assert!(envelope.configurations().is_empty());
        assert!(envelope.networks().is_empty());
        assert!(envelope.products().is_empty());
    }

    #[test]
    fn test_configuration_is_default() {
        let mut config = Configuration {
            id: "small".to_string(),
            default: None,
            label: None,
            description: None,
        };
        assert!(!config.is_default());
        config.default = Some(false);
        assert!(!config.is_default());
        config.default = Some(true);
        assert!(config.is_default());
    }

    #[test]
    fn test_property_flags() {
        let property = Property {
            key: "ssh".to_string(),
            kind: BOOLEAN_TYPE.to_string(),
            user_configurable: Some(true),
            ..Default::default()
        };
        assert!(property.is_boolean());
        assert!(property.is_user_configurable());

        let property = Property {
            key: "hostname".to_string(),
            kind: "string".to_string(),
            ..Default::default()
        };
        assert!(!property.is_boolean());
        assert!(!property.is_user_configurable());
    }

    #[test]
    fn test_property_serializes_pascal_case() {
        let property = Property {
            key: "ip".to_string(),
            kind: "string".to_string(),
            user_configurable: Some(true),
            default: Some("10.0.0.1".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&property).unwrap();
        assert_eq!(json["Key"], "ip");
        assert_eq!(json["Type"], "string");
        assert_eq!(json["UserConfigurable"], true);
        assert_eq!(json["Default"], "10.0.0.1");
        assert!(json.get("Label").is_none());
        assert!(json.get("Values").is_none());
    }
}

//! OVF descriptor parsing.
//!
//! The parser walks the quick-xml event stream once, matching elements and
//! attributes by local name so that any namespace prefix (`ovf:`, none, or
//! something unusual) is accepted. Unknown elements are skipped together
//! with their content.

use std::fmt::Display;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::ovf::envelope::{
    AnnotationSection, Configuration, DeploymentOptionSection, Envelope, Network, NetworkSection,
    ProductSection, Property, PropertyConfigurationValue, VirtualSystem,
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse an OVF descriptor into an [`Envelope`].
///
/// # Errors
///
/// Returns [`Error::EnvelopeParse`] if the document is not valid UTF-8, is
/// malformed XML, has a root element other than `Envelope`, or is missing
/// an attribute the model requires.
pub fn parse_envelope(bytes: &[u8]) -> Result<Envelope> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let xml = std::str::from_utf8(bytes).map_err(|e| {
        Error::envelope_parse_at(format!("invalid UTF-8: {e}"), e.valid_up_to() as u64)
    })?;

    let mut parser = EnvelopeParser::new(xml);
    let (root, empty) = parser.root()?;
    if root.local_name().as_ref() != b"Envelope" {
        return Err(Error::envelope_parse(format!(
            "root element is '{}', expected Envelope",
            String::from_utf8_lossy(root.local_name().as_ref())
        )));
    }

    let envelope = parser.envelope(empty)?;
    tracing::debug!(
        networks = envelope.networks().len(),
        configurations = envelope.configurations().len(),
        products = envelope.products().len(),
        "parsed OVF envelope"
    );
    Ok(envelope)
}

/// Event-driven reader over a borrowed OVF document.
struct EnvelopeParser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> EnvelopeParser<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
        }
    }

    fn error(&self, message: impl Display) -> Error {
        Error::envelope_parse_at(message.to_string(), self.reader.buffer_position() as u64)
    }

    fn next_event(&mut self) -> Result<Event<'a>> {
        self.reader.read_event().map_err(|e| self.error(e))
    }

    /// Skip the prolog and return the root element.
    fn root(&mut self) -> Result<(BytesStart<'a>, bool)> {
        loop {
            match self.next_event()? {
                Event::Start(start) => return Ok((start, false)),
                Event::Empty(start) => return Ok((start, true)),
                Event::Eof => return Err(self.error("document has no root element")),
                _ => {}
            }
        }
    }

    /// Return the next child element of the current element, or `None` once
    /// its end tag has been consumed. The flag is true for self-closing
    /// elements.
    fn next_child(&mut self) -> Result<Option<(BytesStart<'a>, bool)>> {
        loop {
            match self.next_event()? {
                Event::Start(start) => return Ok(Some((start, false))),
                Event::Empty(start) => return Ok(Some((start, true))),
                Event::End(_) => return Ok(None),
                Event::Eof => return Err(self.error("unexpected end of document")),
                _ => {}
            }
        }
    }

    /// Consume the remainder of an element without interpreting it.
    fn skip(&mut self, start: &BytesStart<'a>, empty: bool) -> Result<()> {
        if !empty {
            self.reader
                .read_to_end(start.name())
                .map_err(|e| self.error(e))?;
        }
        Ok(())
    }

    /// Read the trimmed text content of an element.
    fn text(&mut self, empty: bool) -> Result<String> {
        Ok(self.raw_text(empty)?.trim().to_string())
    }

    /// Read the text content of an element verbatim, ignoring nested markup.
    fn raw_text(&mut self, empty: bool) -> Result<String> {
        let mut text = String::new();
        if empty {
            return Ok(text);
        }

        loop {
            match self.next_event()? {
                Event::Text(t) => {
                    let unescaped = t.unescape().map_err(|e| self.error(e))?;
                    text.push_str(&unescaped);
                }
                Event::CData(c) => {
                    let raw = c.into_inner();
                    text.push_str(&String::from_utf8_lossy(&raw));
                }
                Event::Start(nested) => self.skip(&nested, false)?,
                Event::End(_) => break,
                Event::Eof => return Err(self.error("unexpected end of document")),
                _ => {}
            }
        }

        Ok(text)
    }

    fn envelope(&mut self, empty: bool) -> Result<Envelope> {
        let mut envelope = Envelope::default();
        if empty {
            return Ok(envelope);
        }

        while let Some((child, child_empty)) = self.next_child()? {
            match child.local_name().as_ref() {
                b"NetworkSection" => {
                    envelope.network = Some(self.network_section(child_empty)?);
                }
                b"DeploymentOptionSection" => {
                    envelope.deployment_option = Some(self.deployment_option_section(child_empty)?);
                }
                b"VirtualSystem" => {
                    envelope.virtual_system = Some(self.virtual_system(&child, child_empty)?);
                }
                _ => self.skip(&child, child_empty)?,
            }
        }

        Ok(envelope)
    }

    fn network_section(&mut self, empty: bool) -> Result<NetworkSection> {
        let mut section = NetworkSection::default();
        if empty {
            return Ok(section);
        }

        while let Some((child, child_empty)) = self.next_child()? {
            match child.local_name().as_ref() {
                b"Info" => section.info = self.text(child_empty)?,
                b"Network" => section.networks.push(self.network(&child, child_empty)?),
                _ => self.skip(&child, child_empty)?,
            }
        }

        Ok(section)
    }

    fn network(&mut self, start: &BytesStart<'a>, empty: bool) -> Result<Network> {
        let mut name = None;
        for (key, value) in self.attributes(start)? {
            if key == "name" {
                name = Some(value);
            }
        }
        let name = name.ok_or_else(|| self.error("Network is missing the name attribute"))?;

        let mut network = Network {
            name,
            description: None,
        };
        if empty {
            return Ok(network);
        }

        while let Some((child, child_empty)) = self.next_child()? {
            match child.local_name().as_ref() {
                b"Description" => network.description = Some(self.text(child_empty)?),
                _ => self.skip(&child, child_empty)?,
            }
        }

        Ok(network)
    }

    fn deployment_option_section(&mut self, empty: bool) -> Result<DeploymentOptionSection> {
        let mut section = DeploymentOptionSection::default();
        if empty {
            return Ok(section);
        }

        while let Some((child, child_empty)) = self.next_child()? {
            match child.local_name().as_ref() {
                b"Info" => section.info = self.text(child_empty)?,
                b"Configuration" => section
                    .configuration
                    .push(self.configuration(&child, child_empty)?),
                _ => self.skip(&child, child_empty)?,
            }
        }

        Ok(section)
    }

    fn configuration(&mut self, start: &BytesStart<'a>, empty: bool) -> Result<Configuration> {
        let mut id = None;
        let mut default = None;
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "id" => id = Some(value),
                "default" => default = Some(self.boolean(&key, &value)?),
                _ => {}
            }
        }
        let id = id.ok_or_else(|| self.error("Configuration is missing the id attribute"))?;

        let mut config = Configuration {
            id,
            default,
            label: None,
            description: None,
        };
        if empty {
            return Ok(config);
        }

        while let Some((child, child_empty)) = self.next_child()? {
            match child.local_name().as_ref() {
                b"Label" => config.label = Some(self.text(child_empty)?),
                b"Description" => config.description = Some(self.text(child_empty)?),
                _ => self.skip(&child, child_empty)?,
            }
        }

        Ok(config)
    }

    fn virtual_system(&mut self, start: &BytesStart<'a>, empty: bool) -> Result<VirtualSystem> {
        let mut system = VirtualSystem::default();
        for (key, value) in self.attributes(start)? {
            if key == "id" {
                system.id = value;
            }
        }
        if empty {
            return Ok(system);
        }

        while let Some((child, child_empty)) = self.next_child()? {
            match child.local_name().as_ref() {
                b"Info" => system.info = self.text(child_empty)?,
                b"Name" => system.name = Some(self.text(child_empty)?),
                b"AnnotationSection" => system.annotation.push(self.annotation_section(child_empty)?),
                b"ProductSection" => system.product.push(self.product_section(&child, child_empty)?),
                _ => self.skip(&child, child_empty)?,
            }
        }

        Ok(system)
    }

    fn annotation_section(&mut self, empty: bool) -> Result<AnnotationSection> {
        let mut section = AnnotationSection::default();
        if empty {
            return Ok(section);
        }

        while let Some((child, child_empty)) = self.next_child()? {
            match child.local_name().as_ref() {
                b"Info" => section.info = self.text(child_empty)?,
                b"Annotation" => section.annotation = self.raw_text(child_empty)?,
                _ => self.skip(&child, child_empty)?,
            }
        }

        Ok(section)
    }

    fn product_section(&mut self, start: &BytesStart<'a>, empty: bool) -> Result<ProductSection> {
        let mut section = ProductSection::default();
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "class" => section.class = Some(value),
                "instance" => section.instance = Some(value),
                _ => {}
            }
        }
        if empty {
            return Ok(section);
        }

        while let Some((child, child_empty)) = self.next_child()? {
            match child.local_name().as_ref() {
                b"Info" => section.info = self.text(child_empty)?,
                b"Product" => section.product = Some(self.text(child_empty)?),
                b"Vendor" => section.vendor = Some(self.text(child_empty)?),
                b"Version" => section.version = Some(self.text(child_empty)?),
                b"FullVersion" => section.full_version = Some(self.text(child_empty)?),
                b"ProductUrl" => section.product_url = Some(self.text(child_empty)?),
                b"VendorUrl" => section.vendor_url = Some(self.text(child_empty)?),
                b"AppUrl" => section.app_url = Some(self.text(child_empty)?),
                b"Property" => section.property.push(self.property(&child, child_empty)?),
                _ => self.skip(&child, child_empty)?,
            }
        }

        Ok(section)
    }

    fn property(&mut self, start: &BytesStart<'a>, empty: bool) -> Result<Property> {
        let mut key = None;
        let mut kind = None;
        let mut property = Property::default();
        for (name, value) in self.attributes(start)? {
            match name.as_str() {
                "key" => key = Some(value),
                "type" => kind = Some(value),
                "qualifiers" => property.qualifiers = Some(value),
                "userConfigurable" => property.user_configurable = Some(self.boolean(&name, &value)?),
                "value" => property.default = Some(value),
                "password" => property.password = Some(self.boolean(&name, &value)?),
                _ => {}
            }
        }
        property.key = key.ok_or_else(|| self.error("Property is missing the key attribute"))?;
        property.kind = kind.ok_or_else(|| {
            self.error(format!("Property '{}' is missing the type attribute", property.key))
        })?;
        if empty {
            return Ok(property);
        }

        while let Some((child, child_empty)) = self.next_child()? {
            match child.local_name().as_ref() {
                b"Label" => property.label = Some(self.text(child_empty)?),
                b"Description" => property.description = Some(self.text(child_empty)?),
                b"Value" => {
                    let value = self.configuration_value(&child)?;
                    self.skip(&child, child_empty)?;
                    property.values.push(value);
                }
                _ => self.skip(&child, child_empty)?,
            }
        }

        Ok(property)
    }

    fn configuration_value(&self, start: &BytesStart<'a>) -> Result<PropertyConfigurationValue> {
        let mut value = None;
        let mut configuration = None;
        for (key, attr_value) in self.attributes(start)? {
            match key.as_str() {
                "value" => value = Some(attr_value),
                "configuration" => configuration = Some(attr_value),
                _ => {}
            }
        }
        let value = value.ok_or_else(|| self.error("Value is missing the value attribute"))?;
        Ok(PropertyConfigurationValue {
            value,
            configuration,
        })
    }

    /// Collect the attributes of an element as (local name, unescaped value)
    /// pairs, leaving out namespace declarations.
    fn attributes(&self, start: &BytesStart<'a>) -> Result<Vec<(String, String)>> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr: Attribute = attr.map_err(|e| self.error(e))?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| self.error(e))?.into_owned();
            attributes.push((key, value));
        }
        Ok(attributes)
    }

    /// Parse an `xsd:boolean` attribute value.
    fn boolean(&self, name: &str, value: &str) -> Result<bool> {
        match value.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(self.error(format!(
                "attribute '{name}' has invalid boolean value '{other}'"
            ))),
        }
    }
}

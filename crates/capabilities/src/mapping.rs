//! Schema mapping tables: which XPath feeds which record field.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

use ows_common::{OwsError, OwsResult};
use ows_xml::XmlDocument;

use crate::parsers::{ParserKind, ReverseParserKind};
use crate::tables;

pub const WMS_NAMESPACE: &str = "http://www.opengis.net/wms";
pub const WFS_20_NAMESPACE: &str = "http://www.opengis.net/wfs/2.0";
pub const CSW_NAMESPACE: &str = "http://www.opengis.net/cat/csw/2.0.2";
pub const OWS_11_NAMESPACE: &str = "http://www.opengis.net/ows/1.1";
pub const OWS_10_NAMESPACE: &str = "http://www.opengis.net/ows";
pub const FES_20_NAMESPACE: &str = "http://www.opengis.net/fes/2.0";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceType {
    Wms,
    Wfs,
    Csw,
}

impl ServiceType {
    /// Parse a service name as found in requests and capabilities
    /// (`WMS`, `ogc:wfs`, `OGC WMS`, `CSW`).
    pub fn parse(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let bare = upper
            .rsplit([':', ' '])
            .next()
            .unwrap_or(upper.as_str());
        match bare {
            "WMS" => Some(ServiceType::Wms),
            "WFS" => Some(ServiceType::Wfs),
            "CSW" => Some(ServiceType::Csw),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Wms => "WMS",
            ServiceType::Wfs => "WFS",
            ServiceType::Csw => "CSW",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a literal XPath leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    String,
    Integer,
    Float,
    Boolean,
}

#[derive(Debug, Clone)]
pub enum FieldSpec {
    /// Single XPath whose string result is converted to `kind`.
    XPath { xpath: &'static str, kind: LeafKind },
    /// Several XPaths combined by a parser; `reverse` splits the value back
    /// into one string per input for projection.
    Computed {
        inputs: &'static [&'static str],
        parser: ParserKind,
        reverse: Option<ReverseParserKind>,
    },
    Nested(NestedMapping),
}

#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub name: &'static str,
    pub spec: FieldSpec,
}

/// Mapping for a (possibly repeated) sub-structure.
#[derive(Debug, Clone)]
pub struct NestedMapping {
    pub model: &'static str,
    /// Relative to the parent's node; absolute for the document root.
    pub base_xpath: &'static str,
    pub many: bool,
    /// Fields identifying a child when projecting; position is used when empty.
    pub key_fields: &'static [&'static str],
    pub fields: Vec<FieldMapping>,
}

impl NestedMapping {
    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct SchemaMapping {
    pub service_type: ServiceType,
    pub versions: &'static [&'static str],
    /// Prefix bindings used by every XPath in this mapping.
    pub namespaces: &'static [(&'static str, &'static str)],
    pub root: NestedMapping,
}

static MAPPINGS: Lazy<Vec<SchemaMapping>> = Lazy::new(|| {
    vec![
        tables::wms111::mapping(),
        tables::wms130::mapping(),
        tables::wfs200::mapping(),
        tables::csw202::mapping(),
    ]
});

/// Mapping for a service type and version.
pub fn schema_mapping(service: ServiceType, version: &str) -> OwsResult<&'static SchemaMapping> {
    let version = version.trim();
    MAPPINGS
        .iter()
        .find(|m| m.service_type == service && m.versions.contains(&version))
        .ok_or_else(|| OwsError::UnsupportedVersion {
            service: service.to_string(),
            version: version.to_string(),
        })
}

/// Pick the mapping for a capabilities document from its root element.
pub fn detect(doc: &XmlDocument) -> OwsResult<&'static SchemaMapping> {
    let root = doc
        .root_element()
        .ok_or_else(|| OwsError::InvalidXml("document has no root element".to_string()))?;
    let local = doc.local_name(root).unwrap_or_default();

    let service = match (local, doc.namespace_uri(root)) {
        ("WMT_MS_Capabilities" | "WMS_Capabilities", _) => ServiceType::Wms,
        ("WFS_Capabilities", _) => ServiceType::Wfs,
        ("Capabilities", Some(CSW_NAMESPACE)) => ServiceType::Csw,
        _ => {
            return Err(OwsError::UnsupportedService(format!(
                "unrecognized capabilities root element '{}'",
                local
            )))
        }
    };

    let version = doc.attribute(root, "version").ok_or_else(|| {
        OwsError::MissingParameter(format!("version attribute on {}", local))
    })?;
    schema_mapping(service, version)
}

// === Table builders ===

pub(crate) fn text(name: &'static str, xpath: &'static str) -> FieldMapping {
    leaf(name, xpath, LeafKind::String)
}

pub(crate) fn integer(name: &'static str, xpath: &'static str) -> FieldMapping {
    leaf(name, xpath, LeafKind::Integer)
}

pub(crate) fn float(name: &'static str, xpath: &'static str) -> FieldMapping {
    leaf(name, xpath, LeafKind::Float)
}

pub(crate) fn boolean(name: &'static str, xpath: &'static str) -> FieldMapping {
    leaf(name, xpath, LeafKind::Boolean)
}

fn leaf(name: &'static str, xpath: &'static str, kind: LeafKind) -> FieldMapping {
    FieldMapping {
        name,
        spec: FieldSpec::XPath { xpath, kind },
    }
}

pub(crate) fn computed(
    name: &'static str,
    inputs: &'static [&'static str],
    parser: ParserKind,
    reverse: Option<ReverseParserKind>,
) -> FieldMapping {
    FieldMapping {
        name,
        spec: FieldSpec::Computed {
            inputs,
            parser,
            reverse,
        },
    }
}

pub(crate) fn many(
    name: &'static str,
    model: &'static str,
    base_xpath: &'static str,
    key_fields: &'static [&'static str],
    fields: Vec<FieldMapping>,
) -> FieldMapping {
    FieldMapping {
        name,
        spec: FieldSpec::Nested(NestedMapping {
            model,
            base_xpath,
            many: true,
            key_fields,
            fields,
        }),
    }
}

pub(crate) fn one(
    name: &'static str,
    model: &'static str,
    base_xpath: &'static str,
    fields: Vec<FieldMapping>,
) -> FieldMapping {
    FieldMapping {
        name,
        spec: FieldSpec::Nested(NestedMapping {
            model,
            base_xpath,
            many: false,
            key_fields: &[],
            fields,
        }),
    }
}

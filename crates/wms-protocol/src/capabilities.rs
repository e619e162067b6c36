//! WMS GetCapabilities documents.
//!
//! Servers answer GetCapabilities with one of two XML schemas that carry the
//! same logical content but differ in their root element:
//!
//! - WMS 1.3.0: `<WMS_Capabilities>`, bounding boxes tagged with `CRS`
//! - WMS 1.1.x: `<WMT_MS_Capabilities>`, bounding boxes tagged with `SRS`
//!
//! Nothing in the document prologue reliably tells them apart, so
//! [`Capabilities::decode`] tries each [`Schema`] in turn against the same
//! buffer and keeps the first clean decode. Decoding is purely structural:
//! an empty but well-formed document decodes fine and is rejected later by
//! whoever needs formats or layers.

use std::fmt;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use wms_common::{parse_epsg, BoundingBox, CrsParam};

use crate::query::set_params;

/// Capability document schema, identified by its root element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Schema {
    /// WMS 1.3.0 (`WMS_Capabilities`).
    #[default]
    Wms130,
    /// WMS 1.0/1.1.x (`WMT_MS_Capabilities`).
    Wms111,
}

impl Schema {
    /// Root element name of documents in this schema.
    pub fn root_element(&self) -> &'static str {
        match self {
            Schema::Wms130 => "WMS_Capabilities",
            Schema::Wms111 => "WMT_MS_Capabilities",
        }
    }

    /// Attribute naming the coordinate system of a `BoundingBox`.
    pub fn crs_attribute(&self) -> CrsParam {
        match self {
            Schema::Wms130 => CrsParam::Crs,
            Schema::Wms111 => CrsParam::Srs,
        }
    }

    /// Decode `text` as this schema.
    fn decode(&self, text: &str) -> Result<Capabilities, SchemaAttemptError> {
        let found = root_element(text)?;
        if found != self.root_element() {
            return Err(SchemaAttemptError::RootMismatch {
                expected: self.root_element(),
                found,
            });
        }
        let raw: RawDocument = quick_xml::de::from_str(text)?;
        Ok(raw.into_capabilities(*self))
    }
}

/// Errors raised while decoding a capability document.
#[derive(Debug, Error)]
pub enum CapabilitiesError {
    #[error("capabilities document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("unable to parse capabilities as WMS 1.3.0 ({current}) or WMS 1.1.x ({legacy})")]
    Undecodable {
        current: SchemaAttemptError,
        legacy: SchemaAttemptError,
    },
}

/// Why a single schema attempt failed.
#[derive(Debug, Error)]
pub enum SchemaAttemptError {
    #[error("root element is <{found}>, expected <{expected}>")]
    RootMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unexpected document structure: {0}")]
    Structure(#[from] quick_xml::DeError),
}

/// Service metadata from the `<Service>` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

/// A bounding box advertised in a capability document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityBox {
    /// Coordinate system identifier, e.g. `EPSG:4326` (may be empty).
    pub crs: String,
    /// Attribute the identifier was read from.
    pub attribute: CrsParam,
    /// `None` when any of the four extent attributes is missing or not a number.
    pub extent: Option<BoundingBox>,
}

impl CapabilityBox {
    pub fn new(crs: impl Into<String>, attribute: CrsParam, extent: Option<BoundingBox>) -> Self {
        Self {
            crs: crs.into(),
            attribute,
            extent,
        }
    }

    /// EPSG code derived from the identifier (`EPSG:<code>` only).
    pub fn epsg(&self) -> Option<u32> {
        parse_epsg(&self.crs)
    }

    /// Whether the box should be treated as absent.
    ///
    /// Besides a missing identifier or extent, an extent whose `min_x` and
    /// `max_x` are both exactly zero counts as unset. That also discards a
    /// genuine box centred on the prime meridian with zero width, which
    /// servers never advertise in practice.
    pub fn is_unset(&self) -> bool {
        if self.crs.is_empty() {
            return true;
        }
        match self.extent {
            Some(extent) => extent.min_x == 0.0 && extent.max_x == 0.0,
            None => true,
        }
    }
}

impl fmt::Display for CapabilityBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.extent {
            Some(extent) => write!(f, "{} [{}]", self.crs, extent),
            None => write!(f, "{} [no extent]", self.crs),
        }
    }
}

/// A named layer. Unnamed entries are container layers that group others.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layer {
    pub name: String,
    pub title: String,
    pub styles: Vec<String>,
    pub bounding_boxes: Vec<CapabilityBox>,
}

impl Layer {
    pub fn has_style(&self, style: &str) -> bool {
        self.styles.iter().any(|s| s == style)
    }
}

/// Parsed content of a GetCapabilities response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Capabilities {
    pub schema: Schema,
    pub version: String,
    pub service: ServiceInfo,
    /// GetMap output formats in document order.
    pub formats: Vec<String>,
    /// Every layer below the root layer, depth-first in document order.
    pub layers: Vec<Layer>,
    /// Bounding boxes of the root layer.
    pub bounding_boxes: Vec<CapabilityBox>,
}

impl Capabilities {
    /// Decode a capability document in either schema.
    pub fn decode(bytes: &[u8]) -> Result<Self, CapabilitiesError> {
        let text = std::str::from_utf8(bytes)?;

        let current = match Self::attempt(Schema::Wms130, text) {
            Ok(capabilities) => return Ok(capabilities),
            Err(e) => e,
        };
        let legacy = match Self::attempt(Schema::Wms111, text) {
            Ok(capabilities) => return Ok(capabilities),
            Err(e) => e,
        };
        Err(CapabilitiesError::Undecodable { current, legacy })
    }

    fn attempt(schema: Schema, text: &str) -> Result<Self, SchemaAttemptError> {
        match schema.decode(text) {
            Ok(capabilities) => {
                debug!(
                    schema = ?schema,
                    version = %capabilities.version,
                    layers = capabilities.layers.len(),
                    "Decoded capabilities"
                );
                Ok(capabilities)
            }
            Err(e) => {
                debug!(schema = ?schema, error = %e, "Capabilities schema attempt failed");
                Err(e)
            }
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn service(&self) -> &ServiceInfo {
        &self.service
    }

    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    /// Look up a layer by exact name.
    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Layer names in document order, unnamed layers included as "".
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    /// Usable bounding boxes of all layers plus the root layer.
    ///
    /// Unset boxes (see [`CapabilityBox::is_unset`]) are dropped, then
    /// entries are deduplicated by identifier: a later box replaces an
    /// earlier one but keeps the earlier position.
    pub fn merged_bounding_boxes(&self) -> Vec<CapabilityBox> {
        let mut merged: Vec<CapabilityBox> = Vec::new();
        let all = self
            .layers
            .iter()
            .flat_map(|l| l.bounding_boxes.iter())
            .chain(self.bounding_boxes.iter());

        for bbox in all.filter(|b| !b.is_unset()) {
            match merged.iter_mut().find(|m| m.crs == bbox.crs) {
                Some(slot) => *slot = bbox.clone(),
                None => merged.push(bbox.clone()),
            }
        }
        merged
    }

    /// First merged bounding box whose identifier yields `epsg`.
    pub fn bounding_box_by_epsg(&self, epsg: u32) -> Option<CapabilityBox> {
        self.merged_bounding_boxes()
            .into_iter()
            .find(|b| b.epsg() == Some(epsg))
    }

    /// EPSG codes of the merged bounding boxes, in merged order.
    pub fn epsg_codes(&self) -> Vec<u32> {
        self.merged_bounding_boxes()
            .iter()
            .filter_map(CapabilityBox::epsg)
            .collect()
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let epsg: Vec<String> = self.epsg_codes().iter().map(u32::to_string).collect();
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "Name: {}", self.service.name)?;
        writeln!(f, "Title: {}", self.service.title)?;
        writeln!(f, "Abstract: {}", self.service.abstract_text)?;
        writeln!(f, "Formats: {}", self.formats.join(", "))?;
        writeln!(f, "Layers: {}", self.layer_names().join(", "))?;
        write!(f, "EPSG: {}", epsg.join(", "))
    }
}

/// Build a GetCapabilities URL; `version` is omitted when empty.
pub fn capabilities_url(base: &Url, version: &str) -> Url {
    let mut url = base.clone();
    let mut params = vec![
        ("SERVICE", "WMS".to_string()),
        ("REQUEST", "GetCapabilities".to_string()),
    ];
    if !version.is_empty() {
        params.push(("VERSION", version.to_string()));
    }
    set_params(&mut url, &params);
    url
}

/// Local name of the first element in the document.
fn root_element(text: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Eof => return Ok(String::new()),
            _ => {}
        }
    }
}

// === serde shapes shared by both schemas ===

#[derive(Debug, Default, Deserialize)]
struct RawDocument {
    #[serde(rename = "@version", default)]
    version: String,
    #[serde(rename = "Service", default)]
    service: RawService,
    #[serde(rename = "Capability", default)]
    capability: RawCapability,
}

#[derive(Debug, Default, Deserialize)]
struct RawService {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Abstract", default)]
    abstract_text: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawCapability {
    #[serde(rename = "Request", default)]
    request: RawRequest,
    #[serde(rename = "Layer", default)]
    layer: Option<RawLayer>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRequest {
    #[serde(rename = "GetMap", default)]
    get_map: RawOperation,
}

#[derive(Debug, Default, Deserialize)]
struct RawOperation {
    #[serde(rename = "Format", default)]
    formats: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLayer {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Style", default)]
    styles: Vec<RawStyle>,
    #[serde(rename = "BoundingBox", default)]
    bounding_boxes: Vec<RawBox>,
    #[serde(rename = "Layer", default)]
    layers: Vec<RawLayer>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStyle {
    #[serde(rename = "Name", default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawBox {
    #[serde(rename = "@SRS", default)]
    srs: Option<String>,
    #[serde(rename = "@CRS", default)]
    crs: Option<String>,
    #[serde(rename = "@minx", default)]
    min_x: Option<String>,
    #[serde(rename = "@miny", default)]
    min_y: Option<String>,
    #[serde(rename = "@maxx", default)]
    max_x: Option<String>,
    #[serde(rename = "@maxy", default)]
    max_y: Option<String>,
}

impl RawDocument {
    fn into_capabilities(self, schema: Schema) -> Capabilities {
        let root = self.capability.layer.unwrap_or_default();
        let mut layers = Vec::new();
        flatten_layers(root.layers, schema, &mut layers);

        Capabilities {
            schema,
            version: self.version.trim().to_string(),
            service: ServiceInfo {
                name: self.service.name.trim().to_string(),
                title: self.service.title.trim().to_string(),
                abstract_text: self.service.abstract_text.trim().to_string(),
            },
            formats: self
                .capability
                .request
                .get_map
                .formats
                .into_iter()
                .map(|f| f.trim().to_string())
                .collect(),
            layers,
            bounding_boxes: convert_boxes(root.bounding_boxes, schema),
        }
    }
}

fn flatten_layers(raw: Vec<RawLayer>, schema: Schema, out: &mut Vec<Layer>) {
    for layer in raw {
        out.push(Layer {
            name: layer.name.trim().to_string(),
            title: layer.title.trim().to_string(),
            styles: layer
                .styles
                .into_iter()
                .map(|s| s.name.trim().to_string())
                .collect(),
            bounding_boxes: convert_boxes(layer.bounding_boxes, schema),
        });
        flatten_layers(layer.layers, schema, out);
    }
}

fn convert_boxes(raw: Vec<RawBox>, schema: Schema) -> Vec<CapabilityBox> {
    raw.into_iter().map(|b| b.into_box(schema)).collect()
}

impl RawBox {
    fn into_box(self, schema: Schema) -> CapabilityBox {
        let (crs, attribute) = match (self.crs, self.srs) {
            (Some(crs), Some(srs)) => match schema.crs_attribute() {
                CrsParam::Crs => (crs, CrsParam::Crs),
                CrsParam::Srs => (srs, CrsParam::Srs),
            },
            (Some(crs), None) => (crs, CrsParam::Crs),
            (None, Some(srs)) => (srs, CrsParam::Srs),
            (None, None) => (String::new(), schema.crs_attribute()),
        };

        let coord = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        let extent = match (
            coord(&self.min_x),
            coord(&self.min_y),
            coord(&self.max_x),
            coord(&self.max_y),
        ) {
            (Some(min_x), Some(min_y), Some(max_x), Some(max_y)) => {
                Some(BoundingBox::new(min_x, min_y, max_x, max_y))
            }
            _ => None,
        };

        CapabilityBox {
            crs: crs.trim().to_string(),
            attribute,
            extent,
        }
    }
}

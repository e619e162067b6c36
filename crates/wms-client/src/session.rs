//! Request negotiation.
//!
//! A [`Service`] holds the settings for GetMap requests against one server
//! and validates every change against the server's capability document.
//! Mutators either apply completely or leave the session untouched.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};
use url::Url;

use wms_common::{file_extension_or_default, BoundingBox, WGS84_EPSG};
use wms_protocol::{Capabilities, GetMapRequest};

use crate::capabilities::fetch_capabilities;
use crate::error::{ClientError, Field, Result};
use crate::transport::MapTransport;

/// A requested layer and the style to draw it with ("" = server default).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSelection {
    pub layer: String,
    pub style: String,
}

impl LayerSelection {
    pub fn new(layer: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            style: String::new(),
        }
    }
}

/// Immutable snapshot of a negotiated session, shared by concurrent fetches.
#[derive(Debug, Clone)]
pub struct MapSession {
    pub url: Url,
    pub version: String,
    pub format: String,
    pub selections: Vec<LayerSelection>,
    pub epsg: u32,
    pub capabilities: Arc<Capabilities>,
}

impl MapSession {
    /// Derive a session from a capability document using its defaults:
    /// document version, first format, first named layer, EPSG:4326 when
    /// advertised and otherwise the first advertised code.
    fn negotiate(url: Url, capabilities: Capabilities) -> Result<Self> {
        if capabilities.version.is_empty() {
            return Err(ClientError::invalid_capabilities("document has no version"));
        }
        let format = capabilities
            .formats
            .first()
            .cloned()
            .ok_or_else(|| ClientError::invalid_capabilities("no GetMap formats advertised"))?;
        let layer = capabilities
            .layers
            .iter()
            .find(|l| !l.name.is_empty())
            .map(|l| LayerSelection::new(l.name.clone()))
            .ok_or_else(|| ClientError::invalid_capabilities("no named layers advertised"))?;

        let codes = capabilities.epsg_codes();
        let epsg = if codes.contains(&WGS84_EPSG) {
            WGS84_EPSG
        } else {
            *codes.first().ok_or_else(|| {
                ClientError::invalid_capabilities("no bounding box with an EPSG code")
            })?
        };

        Ok(Self {
            url,
            version: capabilities.version.clone(),
            format,
            selections: vec![layer],
            epsg,
            capabilities: Arc::new(capabilities),
        })
    }

    pub fn layers(&self) -> Vec<&str> {
        self.selections.iter().map(|s| s.layer.as_str()).collect()
    }

    pub fn styles(&self) -> Vec<&str> {
        self.selections.iter().map(|s| s.style.as_str()).collect()
    }

    /// File extension for the negotiated format, `png` when unknown.
    pub fn file_extension(&self) -> &'static str {
        file_extension_or_default(&self.format)
    }

    /// GetMap request for this session with a resolved box and size.
    pub fn get_map_request(
        &self,
        bbox: BoundingBox,
        epsg: u32,
        width: u32,
        height: u32,
    ) -> GetMapRequest {
        GetMapRequest {
            version: self.version.clone(),
            format: self.format.clone(),
            layers: self.layers().into_iter().map(String::from).collect(),
            styles: self.styles().into_iter().map(String::from).collect(),
            epsg,
            bbox,
            width,
            height,
        }
    }
}

impl fmt::Display for MapSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "URL: {}", self.url)?;
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "Format: {}", self.format)?;
        writeln!(f, "Layers: {}", self.layers().join(", "))?;
        writeln!(f, "Styles: {}", self.styles().join(", "))?;
        write!(f, "EPSG: {}", self.epsg)
    }
}

/// A negotiated WMS session.
///
/// Starts empty; [`Service::set_url`] loads the capability document and
/// adopts its defaults, after which the session is ready to fetch.
pub struct Service {
    transport: Arc<dyn MapTransport>,
    /// Version requested before a URL was set.
    pending_version: String,
    state: Option<MapSession>,
}

impl Service {
    pub fn new(transport: Arc<dyn MapTransport>) -> Self {
        Self {
            transport,
            pending_version: String::new(),
            state: None,
        }
    }

    /// Build a ready session from an already decoded capability document.
    pub fn with_capabilities(
        transport: Arc<dyn MapTransport>,
        url: &str,
        capabilities: Capabilities,
    ) -> Result<Self> {
        let session = MapSession::negotiate(parse_url(url)?, capabilities)?;
        Ok(Self {
            transport,
            pending_version: String::new(),
            state: Some(session),
        })
    }

    /// Point the session at a service and adopt its defaults.
    ///
    /// A version set earlier is requested; the session then uses the
    /// version of the returned document.
    #[instrument(skip(self))]
    pub async fn set_url(&mut self, url: &str) -> Result<()> {
        let url = parse_url(url)?;
        let capabilities =
            fetch_capabilities(self.transport.as_ref(), &url, self.version()).await?;
        let session = MapSession::negotiate(url, capabilities)?;

        info!(
            url = %session.url,
            version = %session.version,
            format = %session.format,
            epsg = session.epsg,
            "Negotiated session"
        );
        self.state = Some(session);
        Ok(())
    }

    /// Change the protocol version.
    ///
    /// Without a URL the version is only remembered for the next
    /// [`Service::set_url`]. Otherwise capabilities are fetched again with
    /// the new version and defaults are re-derived. Servers may answer with
    /// an older document; its version is the one used for GetMap.
    #[instrument(skip(self))]
    pub async fn set_version(&mut self, version: &str) -> Result<()> {
        let Some(current) = &self.state else {
            self.pending_version = version.to_string();
            return Ok(());
        };

        let url = current.url.clone();
        let capabilities = fetch_capabilities(self.transport.as_ref(), &url, version).await?;
        let session = MapSession::negotiate(url, capabilities)?;

        info!(requested = version, version = %session.version, "Changed protocol version");
        self.pending_version = version.to_string();
        self.state = Some(session);
        Ok(())
    }

    pub fn set_format(&mut self, format: &str) -> Result<()> {
        let session = self.session_mut()?;
        if !session.capabilities.formats.iter().any(|f| f == format) {
            return Err(ClientError::unsupported(
                Field::Format,
                format,
                session.capabilities.formats.clone(),
            ));
        }
        session.format = format.to_string();
        debug!(format, "Set format");
        Ok(())
    }

    /// Replace the layer selection; all styles are reset to the default.
    pub fn set_layers<S: AsRef<str>>(&mut self, layers: &[S]) -> Result<()> {
        let session = self.session_mut()?;
        let capabilities = Arc::clone(&session.capabilities);
        let named = || -> Vec<String> {
            capabilities
                .layers
                .iter()
                .filter(|l| !l.name.is_empty())
                .map(|l| l.name.clone())
                .collect()
        };

        if layers.is_empty() {
            return Err(ClientError::unsupported(Field::Layer, "", named()));
        }
        for layer in layers {
            let name: &str = layer.as_ref();
            if name.is_empty() || capabilities.layer_by_name(name).is_none() {
                return Err(ClientError::unsupported(Field::Layer, name, named()));
            }
        }

        session.selections = layers
            .iter()
            .map(|l| {
                let name: &str = l.as_ref();
                LayerSelection::new(name)
            })
            .collect();
        debug!(layers = ?session.layers(), "Set layers");
        Ok(())
    }

    /// Set the style of every selected occurrence of `layer`.
    pub fn set_style(&mut self, layer: &str, style: &str) -> Result<()> {
        let session = self.session_mut()?;
        let advertised = session
            .capabilities
            .layer_by_name(layer)
            .map(|l| l.styles.clone())
            .unwrap_or_default();
        if !advertised.iter().any(|s| s == style) {
            return Err(ClientError::unsupported(Field::Style, style, advertised));
        }
        if !session.selections.iter().any(|s| s.layer == layer) {
            let selected = session.layers().into_iter().map(String::from).collect();
            return Err(ClientError::unsupported(Field::Layer, layer, selected));
        }

        for selection in session.selections.iter_mut().filter(|s| s.layer == layer) {
            selection.style = style.to_string();
        }
        debug!(layer, style, "Set style");
        Ok(())
    }

    /// Choose the request coordinate system.
    ///
    /// Any code the server advertises is accepted, as is any code the
    /// projection registry knows; boxes in the latter are reprojected at
    /// fetch time.
    pub fn set_epsg(&mut self, code: u32) -> Result<()> {
        let session = self.session_mut()?;
        let advertised = session.capabilities.epsg_codes();
        if advertised.is_empty() {
            return Err(ClientError::NoEpsgAdvertised);
        }

        if !advertised.contains(&code) && !projection::is_known(code) {
            let mut candidates: Vec<u32> = Vec::new();
            for c in advertised.iter().chain(projection::known_codes()) {
                if !candidates.contains(c) {
                    candidates.push(*c);
                }
            }
            return Err(ClientError::unsupported(
                Field::Epsg,
                code.to_string(),
                candidates.iter().map(u32::to_string).collect(),
            ));
        }

        session.epsg = code;
        debug!(epsg = code, "Set EPSG");
        Ok(())
    }

    pub fn transport(&self) -> Arc<dyn MapTransport> {
        Arc::clone(&self.transport)
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    pub fn url(&self) -> Option<&Url> {
        self.state.as_ref().map(|s| &s.url)
    }

    pub fn version(&self) -> &str {
        match &self.state {
            Some(session) => &session.version,
            None => &self.pending_version,
        }
    }

    pub fn format(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.format.as_str())
    }

    pub fn selections(&self) -> &[LayerSelection] {
        match &self.state {
            Some(session) => &session.selections,
            None => &[],
        }
    }

    pub fn layers(&self) -> Vec<&str> {
        self.selections().iter().map(|s| s.layer.as_str()).collect()
    }

    pub fn styles(&self) -> Vec<&str> {
        self.selections().iter().map(|s| s.style.as_str()).collect()
    }

    pub fn epsg(&self) -> Option<u32> {
        self.state.as_ref().map(|s| s.epsg)
    }

    pub fn capabilities(&self) -> Option<&Arc<Capabilities>> {
        self.state.as_ref().map(|s| &s.capabilities)
    }

    pub fn file_extension(&self) -> &'static str {
        file_extension_or_default(self.format().unwrap_or_default())
    }

    /// Freeze the current settings for fetching.
    pub fn snapshot(&self) -> Result<MapSession> {
        self.state.clone().ok_or(ClientError::NotReady)
    }

    fn session_mut(&mut self) -> Result<&mut MapSession> {
        self.state.as_mut().ok_or(ClientError::NotReady)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            Some(session) => fmt::Display::fmt(session, f),
            None => write!(f, "URL: (none)\nVersion: {}", self.pending_version),
        }
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| ClientError::MalformedUrl {
        url: url.to_string(),
        message: e.to_string(),
    })
}

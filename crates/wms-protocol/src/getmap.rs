//! WMS GetMap request construction.

use url::Url;

use wms_common::{epsg_identifier, BoundingBox, CrsParam};

use crate::query::set_params;

/// A fully resolved GetMap request.
///
/// `layers` and `styles` are parallel lists; an empty style selects the
/// server default for that layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GetMapRequest {
    pub version: String,
    pub format: String,
    pub layers: Vec<String>,
    pub styles: Vec<String>,
    pub epsg: u32,
    pub bbox: BoundingBox,
    pub width: u32,
    pub height: u32,
}

impl GetMapRequest {
    /// `CRS` for WMS 1.3.0, `SRS` for everything else.
    pub fn crs_param(&self) -> CrsParam {
        CrsParam::for_version(&self.version)
    }

    /// Key/value pairs in the order they are appended to the URL.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("SERVICE", "WMS".to_string()),
            ("REQUEST", "GetMap".to_string()),
            ("VERSION", self.version.clone()),
            ("FORMAT", self.format.clone()),
            ("LAYERS", self.layers.join(",")),
            ("STYLES", self.styles.join(",")),
            (self.crs_param().as_str(), epsg_identifier(self.epsg)),
            ("HEIGHT", self.height.to_string()),
            ("WIDTH", self.width.to_string()),
            ("BBOX", self.bbox.to_wms_param()),
        ]
    }

    /// Build the request URL on top of the service base URL.
    ///
    /// Parameters already present on `base` with the same (case-insensitive)
    /// name are replaced; unrelated ones such as `map=` are kept.
    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        set_params(&mut url, &self.query_params());
        url
    }
}

//! Coordinate Reference System identifiers and protocol naming.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG code of WGS84 geographic coordinates (lon/lat in degrees).
pub const WGS84_EPSG: u32 = 4326;

/// Extract the EPSG code from a CRS identifier such as `"EPSG:4326"`.
///
/// Only the exact two-part form `EPSG:<code>` is recognised. `"EPSG:"`,
/// `"CRS:84"`, `"urn:ogc:def:crs:EPSG::4326"` and the like yield `None`, as
/// does a code of zero.
pub fn parse_epsg(identifier: &str) -> Option<u32> {
    let mut parts = identifier.split(':');
    let (authority, code) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || authority != "EPSG" {
        return None;
    }
    code.parse::<u32>().ok().filter(|code| *code != 0)
}

/// Format an EPSG code as a WMS CRS/SRS parameter value.
pub fn epsg_identifier(code: u32) -> String {
    format!("EPSG:{}", code)
}

/// Name of the GetMap parameter carrying the coordinate system.
///
/// WMS 1.3.0 renamed `SRS` to `CRS`; every other revision still uses `SRS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsParam {
    Crs,
    Srs,
}

impl CrsParam {
    /// Select the parameter name used by a protocol version.
    pub fn for_version(version: &str) -> Self {
        if version == "1.3.0" {
            CrsParam::Crs
        } else {
            CrsParam::Srs
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrsParam::Crs => "CRS",
            CrsParam::Srs => "SRS",
        }
    }
}

impl fmt::Display for CrsParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

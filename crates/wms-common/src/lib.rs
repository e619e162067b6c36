//! Common types and utilities shared across the WMS client crates.

pub mod bbox;
pub mod crs;
pub mod format;

pub use bbox::{BboxParseError, BoundingBox};
pub use crs::{epsg_identifier, parse_epsg, CrsParam, WGS84_EPSG};
pub use format::{file_extension, file_extension_or_default};

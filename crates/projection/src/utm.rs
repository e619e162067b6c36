//! Local metric frame based on Universal Transverse Mercator.
//!
//! Aspect ratios and map scales are only meaningful in a metric frame, while
//! WMS bounding boxes often come in degrees or in frames with heavy
//! distortion (Web Mercator at high latitudes). This module moves a box into
//! a transverse Mercator projection centred on the box's own UTM zone.

use wms_common::{BoundingBox, WGS84_EPSG};

use crate::error::Result;
use crate::transform::Frame;

/// Width of a UTM zone in degrees of longitude.
const ZONE_WIDTH_DEG: f64 = 6.0;
/// Offset turning `floor(lon / 6)` into a 1-based zone number.
const ZONE_OFFSET: f64 = 31.0;
/// Scale factor on the central meridian.
const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
/// False northing applied in the southern hemisphere.
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// UTM zone containing a longitude (degrees).
pub fn utm_zone(lon: f64) -> f64 {
    (lon / ZONE_WIDTH_DEG).floor() + ZONE_OFFSET
}

/// Central meridian (degrees) of a possibly fractional zone number.
pub fn central_meridian(zone: f64) -> f64 {
    zone * ZONE_WIDTH_DEG - 183.0
}

/// A transverse Mercator frame with UTM parameters.
pub struct UtmFrame {
    zone: f64,
    northern: bool,
    frame: Frame,
}

impl UtmFrame {
    /// Build the frame for `zone` (may be fractional, e.g. the mean of two
    /// adjacent zones) in the given hemisphere.
    pub fn new(zone: f64, northern: bool) -> Result<Self> {
        let false_northing = if northern { 0.0 } else { FALSE_NORTHING_SOUTH };
        let definition = format!(
            "+proj=tmerc +lat_0=0 +lon_0={} +k={} +x_0={} +y_0={} +datum=WGS84 +units=m +no_defs",
            central_meridian(zone),
            SCALE_FACTOR,
            FALSE_EASTING,
            false_northing
        );
        let label = format!("UTM zone {}{}", zone, if northern { "N" } else { "S" });
        Ok(Self {
            zone,
            northern,
            frame: Frame::from_definition(label, &definition)?,
        })
    }

    pub fn zone(&self) -> f64 {
        self.zone
    }

    pub fn is_northern(&self) -> bool {
        self.northern
    }

    /// Project WGS84 lon/lat (degrees) into this frame (meters).
    pub fn project(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        let wgs84 = Frame::from_epsg(WGS84_EPSG)?;
        wgs84.transform_to(&self.frame, lon, lat)
    }
}

/// Project a bounding box expressed in `epsg` into the local UTM frame.
///
/// Both corners are first moved to WGS84; the zone is the mean of the two
/// corner zones and the hemisphere is south as soon as either corner has a
/// negative latitude. The result keeps corner order, so its width and height
/// are the metric extents of the box.
pub fn to_local_metric(bbox: &BoundingBox, epsg: u32) -> Result<BoundingBox> {
    let wgs84 = Frame::from_epsg(WGS84_EPSG)?;
    let source = Frame::from_epsg(epsg)?;
    let (lon1, lat1) = source.transform_to(&wgs84, bbox.min_x, bbox.min_y)?;
    let (lon2, lat2) = source.transform_to(&wgs84, bbox.max_x, bbox.max_y)?;

    let zone = (utm_zone(lon1) + utm_zone(lon2)) / 2.0;
    let northern = !(lat1 < 0.0 || lat2 < 0.0);
    let utm = UtmFrame::new(zone, northern)?;

    let (x1, y1) = wgs84.transform_to(&utm.frame, lon1, lat1)?;
    let (x2, y2) = wgs84.transform_to(&utm.frame, lon2, lat2)?;
    Ok(BoundingBox::new(x1, y1, x2, y2))
}

//! Output image size from a bounding box.
//!
//! Sizes derived from the box (aspect ratio, scale) are computed in a local
//! UTM frame so they reflect ground distances rather than degrees or
//! Web Mercator units.

use projection::to_local_metric;
use wms_common::BoundingBox;

use crate::error::{ClientError, Result};

const MILLIMETERS_PER_INCH: f64 = 25.4;

/// How the pixel size of a map request is determined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeStrategy {
    /// Use the given size as is.
    Explicit { width: u32, height: u32 },
    /// Derive both dimensions from a map scale denominator and output DPI.
    ScaleDpi { scale: u32, dpi: u32 },
    /// Fixed width, height from the box's aspect ratio.
    Width(u32),
    /// Fixed height, width from the box's aspect ratio.
    Height(u32),
}

impl SizeStrategy {
    /// Explicit size, or a single fixed dimension when the other is zero.
    pub fn width_height(width: u32, height: u32) -> Self {
        if width == 0 {
            SizeStrategy::Height(height)
        } else if height == 0 {
            SizeStrategy::Width(width)
        } else {
            SizeStrategy::Explicit { width, height }
        }
    }

    pub fn scale_dpi(scale: u32, dpi: u32) -> Self {
        SizeStrategy::ScaleDpi { scale, dpi }
    }

    /// Resolve `(width, height)` in pixels for `bbox` given in `epsg`.
    pub fn resolve(&self, bbox: &BoundingBox, epsg: u32) -> Result<(u32, u32)> {
        match *self {
            SizeStrategy::Explicit { width, height } => Ok((width, height)),
            SizeStrategy::ScaleDpi { scale, dpi } => {
                if scale == 0 || dpi == 0 {
                    return Err(ClientError::SizeNotSpecified);
                }
                let metric = to_local_metric(bbox, epsg)?;
                let factor = dpi as f64 * MILLIMETERS_PER_INCH / scale as f64;
                Ok((
                    to_pixels(metric.width() * factor),
                    to_pixels(metric.height() * factor),
                ))
            }
            SizeStrategy::Width(width) => {
                if width == 0 {
                    return Err(ClientError::DimensionNotSpecified);
                }
                let metric = to_local_metric(bbox, epsg)?;
                let height = to_pixels(metric.height() / metric.width() * width as f64);
                Ok((width, height))
            }
            SizeStrategy::Height(height) => {
                if height == 0 {
                    return Err(ClientError::DimensionNotSpecified);
                }
                let metric = to_local_metric(bbox, epsg)?;
                let width = to_pixels(metric.width() / metric.height() * height as f64);
                Ok((width, height))
            }
        }
    }
}

/// Round to the nearest pixel count. Negative and NaN values become zero,
/// values beyond `u32::MAX` saturate.
fn to_pixels(value: f64) -> u32 {
    value.round() as u32
}

//! Bounding box types and operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A geographic or projected bounding box.
///
/// Units follow the coordinate system the box is expressed in: degrees for
/// geographic CRS (EPSG:4326), meters for projected ones (EPSG:3857, UTM...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a WMS BBOX parameter string: "minx,miny,maxx,maxy"
    pub fn from_wms_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))?;
        }
        Ok(Self::from_array(values))
    }

    /// Build a bounding box from a list of exactly four coordinates.
    pub fn from_slice(values: &[f64]) -> Result<Self, BboxParseError> {
        match values {
            [min_x, min_y, max_x, max_y] => Ok(Self::new(*min_x, *min_y, *max_x, *max_y)),
            _ => Err(BboxParseError::InvalidFormat(format!("{:?}", values))),
        }
    }

    fn from_array([min_x, min_y, max_x, max_y]: [f64; 4]) -> Self {
        Self::new(min_x, min_y, max_x, max_y)
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if a point is contained within this bbox (edges inclusive).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Check that every corner of `other` lies inside this bbox.
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        self.contains_point(other.min_x, other.min_y)
            && self.contains_point(other.max_x, other.max_y)
    }

    /// Grow the box by `percent` of its width and height, split evenly
    /// between both sides of each axis.
    pub fn expanded(&self, percent: f64) -> BoundingBox {
        let dx = self.width() * percent / 100.0 / 2.0;
        let dy = self.height() * percent / 100.0 / 2.0;
        BoundingBox {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    /// Format as a WMS BBOX parameter value with fixed 7-decimal precision.
    pub fn to_wms_param(&self) -> String {
        format!(
            "{:.7},{:.7},{:.7},{:.7}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid BBOX format: {0}. Expected 'minx,miny,maxx,maxy'")]
    InvalidFormat(String),

    #[error("Invalid number in BBOX: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wms_bbox() {
        let bbox = BoundingBox::from_wms_string("-125.0,24.0,-66.0,50.0").unwrap();
        assert_eq!(bbox.min_x, -125.0);
        assert_eq!(bbox.min_y, 24.0);
        assert_eq!(bbox.max_x, -66.0);
        assert_eq!(bbox.max_y, 50.0);
    }

    #[test]
    fn test_expanded_is_symmetric() {
        let bbox = BoundingBox::new(0.0, 0.0, 100.0, 50.0).expanded(10.0);
        assert_eq!(bbox, BoundingBox::new(-5.0, -2.5, 105.0, 52.5));
    }

    #[test]
    fn test_wms_param_precision() {
        let bbox = BoundingBox::new(1.0, 2.5, 3.123456789, -4.0);
        assert_eq!(
            bbox.to_wms_param(),
            "1.0000000,2.5000000,3.1234568,-4.0000000"
        );
    }
}

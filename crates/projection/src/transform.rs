//! EPSG registry lookup and point transformation.
//!
//! Definitions come from the `crs-definitions` table (several thousand EPSG
//! codes including UTM zones and national grids); the math is done by
//! `proj4rs`, a pure Rust port of PROJ.4.

use once_cell::sync::Lazy;
use proj4rs::proj::Proj;

use crate::error::{ProjectionError, Result};

/// Every EPSG code with a definition, ascending.
static KNOWN_CODES: Lazy<Vec<u32>> = Lazy::new(|| {
    (1..=u16::MAX)
        .filter(|code| crs_definitions::from_code(*code).is_some())
        .map(u32::from)
        .collect()
});

/// PROJ.4 string for an EPSG code, if the registry knows it.
pub fn proj_string(epsg: u32) -> Option<&'static str> {
    u16::try_from(epsg)
        .ok()
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4)
}

/// Whether the registry knows `epsg`.
pub fn is_known(epsg: u32) -> bool {
    proj_string(epsg).is_some()
}

/// All EPSG codes the registry can transform, ascending.
pub fn known_codes() -> &'static [u32] {
    &KNOWN_CODES
}

/// A parsed coordinate system ready for transformation.
pub(crate) struct Frame {
    label: String,
    proj: Proj,
    geographic: bool,
}

impl Frame {
    /// Look up an EPSG code in the registry.
    pub(crate) fn from_epsg(epsg: u32) -> Result<Self> {
        let definition = proj_string(epsg).ok_or(ProjectionError::UnknownEpsg(epsg))?;
        Self::from_definition(format!("EPSG:{}", epsg), definition)
    }

    /// Build a frame from a raw PROJ.4 string.
    pub(crate) fn from_definition(label: String, definition: &str) -> Result<Self> {
        let proj = Proj::from_proj_string(definition).map_err(|e| {
            ProjectionError::InvalidDefinition {
                definition: definition.to_string(),
                message: format!("{:?}", e),
            }
        })?;
        Ok(Self {
            label,
            proj,
            geographic: definition.contains("+proj=longlat"),
        })
    }

    /// Transform a single point from this frame into `target`.
    ///
    /// Geographic coordinates are taken and returned in degrees.
    pub(crate) fn transform_to(&self, target: &Frame, x: f64, y: f64) -> Result<(f64, f64)> {
        // proj4rs works in radians for geographic systems
        let mut point = if self.geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        proj4rs::transform::transform(&self.proj, &target.proj, &mut point).map_err(|e| {
            ProjectionError::TransformFailed {
                from: self.label.clone(),
                to: target.label.clone(),
                message: format!("{:?}", e),
            }
        })?;

        let (out_x, out_y) = if target.geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !out_x.is_finite() || !out_y.is_finite() {
            return Err(ProjectionError::TransformFailed {
                from: self.label.clone(),
                to: target.label.clone(),
                message: format!("non-finite result for ({}, {})", x, y),
            });
        }
        Ok((out_x, out_y))
    }
}

/// Transform a point between two EPSG coordinate systems.
///
/// Returns the input unchanged when both codes are equal and known.
pub fn transform(from_epsg: u32, to_epsg: u32, x: f64, y: f64) -> Result<(f64, f64)> {
    let source = Frame::from_epsg(from_epsg)?;
    if from_epsg == to_epsg {
        return Ok((x, y));
    }
    let target = Frame::from_epsg(to_epsg)?;
    source.transform_to(&target, x, y)
}

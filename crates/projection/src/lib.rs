//! Coordinate reference system transformations.
//!
//! Wraps the EPSG definition table and point transforms, and provides the
//! local UTM frame used for metric size computations.

pub mod error;
pub mod transform;
pub mod utm;

pub use error::{ProjectionError, Result};
pub use transform::{is_known, known_codes, proj_string, transform};
pub use utm::{to_local_metric, utm_zone, UtmFrame};

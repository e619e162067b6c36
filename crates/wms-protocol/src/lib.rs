//! OGC WMS client-side protocol support.
//!
//! Supports:
//! - GetCapabilities documents in WMS 1.3.0 and WMS 1.1.x schemas
//! - GetMap request URLs (`CRS` for 1.3.0, `SRS` otherwise)

pub mod capabilities;
pub mod getmap;
mod query;

pub use capabilities::{
    capabilities_url, Capabilities, CapabilitiesError, CapabilityBox, Layer, Schema,
    SchemaAttemptError, ServiceInfo,
};
pub use getmap::GetMapRequest;

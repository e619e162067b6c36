//! WMS client: capability-driven session negotiation and concurrent map
//! download.
//!
//! A typical run:
//!
//! 1. [`Service::set_url`] fetches the capability document and adopts its
//!    defaults.
//! 2. `set_format`, `set_layers`, `set_style` and `set_epsg` adjust the
//!    session; each change is validated against the document.
//! 3. [`Service::snapshot`] freezes the session and
//!    [`BatchOrchestrator::run`] fetches one image per bounding box.

pub mod batch;
pub mod capabilities;
pub mod config;
pub mod dimension;
pub mod error;
pub mod fetch;
pub mod session;
pub mod transport;

pub use batch::{BatchOptions, BatchOrchestrator, BatchReport};
pub use capabilities::fetch_capabilities;
pub use config::{ClientConfig, DEFAULT_MAX_PIXELS};
pub use dimension::SizeStrategy;
pub use error::{ClientError, ErrorCategory, Field, Result};
pub use fetch::{resolve_request_epsg, FetchedMap, MapFetcher};
pub use session::{LayerSelection, MapSession, Service};
pub use transport::{Credentials, HttpResponse, HttpTransport, MapTransport, TransportError};

pub use wms_common::BoundingBox;
pub use wms_protocol::Capabilities;

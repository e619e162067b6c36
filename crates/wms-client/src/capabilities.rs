//! GetCapabilities over a [`MapTransport`].

use tracing::{debug, info, instrument};
use url::Url;

use wms_protocol::{capabilities_url, Capabilities};

use crate::error::{ClientError, Result};
use crate::transport::MapTransport;

/// Request and decode the capability document of a service.
///
/// `version` is sent as `VERSION` unless empty, in which case the server
/// picks its preferred version.
#[instrument(skip(transport), fields(url = %url))]
pub async fn fetch_capabilities(
    transport: &dyn MapTransport,
    url: &Url,
    version: &str,
) -> Result<Capabilities> {
    let request_url = capabilities_url(url, version);
    debug!(url = %request_url, "Requesting capabilities");

    let response = transport.get(&request_url).await?;
    if !response.is_ok() {
        return Err(ClientError::UnexpectedStatus {
            status: response.status,
            url: request_url.to_string(),
        });
    }

    let capabilities = Capabilities::decode(&response.body)?;
    info!(
        version = %capabilities.version,
        formats = capabilities.formats.len(),
        layers = capabilities.layers.len(),
        "Loaded capabilities"
    );
    Ok(capabilities)
}

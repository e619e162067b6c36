//! Single GetMap fetch.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, instrument};
use url::Url;

use wms_common::BoundingBox;
use wms_protocol::Capabilities;

use crate::config::ClientConfig;
use crate::dimension::SizeStrategy;
use crate::error::{ClientError, Result};
use crate::session::MapSession;
use crate::transport::MapTransport;

/// Raw response of a successful GetMap plus what was requested.
#[derive(Debug, Clone)]
pub struct FetchedMap {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    /// Coordinate system of the request, after any reprojection
    pub epsg: u32,
    /// Requested box in `epsg`
    pub bbox: BoundingBox,
    pub url: Url,
}

/// Pick the coordinate system a request is sent in.
///
/// Codes the server advertises are used unchanged. Otherwise both corners
/// of `bbox` are transformed into the first advertised code.
pub fn resolve_request_epsg(
    capabilities: &Capabilities,
    epsg: u32,
    bbox: BoundingBox,
) -> Result<(BoundingBox, u32)> {
    let advertised = capabilities.epsg_codes();
    if advertised.contains(&epsg) {
        return Ok((bbox, epsg));
    }
    let target = *advertised.first().ok_or(ClientError::NoEpsgAdvertised)?;

    if !projection::is_known(epsg) {
        return Err(ClientError::UnknownSourceEpsg(epsg));
    }
    if !projection::is_known(target) {
        return Err(ClientError::UnknownTargetEpsg(target));
    }

    let (min_x, min_y) = projection::transform(epsg, target, bbox.min_x, bbox.min_y)?;
    let (max_x, max_y) = projection::transform(epsg, target, bbox.max_x, bbox.max_y)?;
    debug!(from = epsg, to = target, "Reprojected bounding box");
    Ok((BoundingBox::new(min_x, min_y, max_x, max_y), target))
}

/// Fail unless `bbox` lies inside the extent advertised for `epsg`.
fn check_extent(capabilities: &Capabilities, epsg: u32, bbox: &BoundingBox) -> Result<()> {
    let valid = capabilities
        .bounding_box_by_epsg(epsg)
        .and_then(|b| b.extent)
        .ok_or_else(|| {
            ClientError::invalid_capabilities(format!("no extent advertised for EPSG:{}", epsg))
        })?;
    if !valid.contains_box(bbox) {
        return Err(ClientError::BoundingBoxOutOfRange {
            requested: *bbox,
            valid,
        });
    }
    Ok(())
}

/// Performs GetMap requests for a negotiated session.
pub struct MapFetcher {
    transport: Arc<dyn MapTransport>,
    max_pixels: u64,
}

impl MapFetcher {
    pub fn new(transport: Arc<dyn MapTransport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            max_pixels: config.max_pixels,
        }
    }

    /// Fetch one map image.
    ///
    /// The size is resolved in the session's coordinate system before any
    /// reprojection; the session itself is never modified.
    #[instrument(skip(self, session), fields(bbox = %bbox))]
    pub async fn fetch(
        &self,
        session: &MapSession,
        bbox: BoundingBox,
        strategy: SizeStrategy,
    ) -> Result<FetchedMap> {
        let (width, height) = strategy.resolve(&bbox, session.epsg)?;

        let pixels = width as u64 * height as u64;
        if pixels > self.max_pixels {
            return Err(ClientError::ImageTooLarge {
                pixels,
                max: self.max_pixels,
            });
        }

        let (bbox, epsg) = resolve_request_epsg(&session.capabilities, session.epsg, bbox)?;
        check_extent(&session.capabilities, epsg, &bbox)?;

        let url = session
            .get_map_request(bbox, epsg, width, height)
            .to_url(&session.url);
        debug!(url = %url, width, height, "Requesting map");

        let response = self.transport.get(&url).await?;
        if !response.is_ok() {
            return Err(ClientError::UnexpectedStatus {
                status: response.status,
                url: url.to_string(),
            });
        }

        debug!(size = response.body.len(), "Received map");
        Ok(FetchedMap {
            bytes: response.body,
            width,
            height,
            epsg,
            bbox,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{bbox, capabilities};

    fn basic() -> Capabilities {
        Capabilities::decode(capabilities::BASIC.as_bytes()).unwrap()
    }

    #[test]
    fn test_advertised_epsg_is_kept() {
        let bbox = BoundingBox::new(7.0, 50.0, 8.0, 51.0);
        let (resolved, epsg) = resolve_request_epsg(&basic(), 4326, bbox).unwrap();
        assert_eq!(epsg, 4326);
        assert_eq!(resolved, bbox);
    }

    #[test]
    fn test_unadvertised_epsg_is_reprojected_to_first_code() {
        // BASIC advertises [3857, 4326]; EPSG:4258 (ETRS89) is close to WGS84
        let bbox = BoundingBox::new(7.0, 50.0, 8.0, 51.0);
        let (resolved, epsg) = resolve_request_epsg(&basic(), 4258, bbox).unwrap();
        assert_eq!(epsg, 3857);
        test_utils::assert_approx_eq!(resolved.min_x, 779_236.0, 100.0);
        assert!(resolved.max_y > resolved.min_y);
    }

    #[test]
    fn test_unknown_source_epsg() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(matches!(
            resolve_request_epsg(&basic(), 9999, bbox),
            Err(ClientError::UnknownSourceEpsg(9999))
        ));
    }

    #[test]
    fn test_unknown_target_epsg() {
        let doc = capabilities::BASIC.replace("EPSG:3857", "EPSG:9998");
        let caps = Capabilities::decode(doc.as_bytes()).unwrap();
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(matches!(
            resolve_request_epsg(&caps, 3857, bbox),
            Err(ClientError::UnknownTargetEpsg(9998))
        ));
    }

    #[test]
    fn test_check_extent() {
        let caps = basic();
        let (min_x, min_y, max_x, max_y) = bbox::GLOBAL;
        let global = BoundingBox::new(min_x, min_y, max_x, max_y);
        assert!(check_extent(&caps, 4326, &global).is_ok());
        let (min_x, min_y, max_x, max_y) = bbox::OUT_OF_RANGE;
        match check_extent(&caps, 4326, &BoundingBox::new(min_x, min_y, max_x, max_y)) {
            Err(ClientError::BoundingBoxOutOfRange { requested, valid }) => {
                assert_eq!(requested.max_x, 190.0);
                assert_eq!(valid, BoundingBox::new(-180.0, -90.0, 180.0, 90.0));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

//! Single GetMap fetches against a mocked server.

use std::sync::Arc;

use test_utils::{bbox, capabilities, create_test_png};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wms_client::{
    BoundingBox, Capabilities, ClientConfig, ClientError, HttpTransport, MapFetcher, MapTransport,
    Service, SizeStrategy,
};

async fn setup(doc: &str, config: &ClientConfig) -> (MockServer, Service, MapFetcher) {
    let server = MockServer::start().await;
    let transport: Arc<dyn MapTransport> = Arc::new(HttpTransport::new(config).unwrap());
    let caps = Capabilities::decode(doc.as_bytes()).unwrap();
    let service =
        Service::with_capabilities(Arc::clone(&transport), &format!("{}/wms", server.uri()), caps)
            .unwrap();
    let fetcher = MapFetcher::new(transport, config);
    (server, service, fetcher)
}

#[tokio::test]
async fn test_fetch_wms111_uses_srs() {
    let config = ClientConfig::default();
    let (server, service, fetcher) = setup(capabilities::BASIC, &config).await;
    Mock::given(method("GET"))
        .and(path("/wms"))
        .and(query_param("REQUEST", "GetMap"))
        .and(query_param("SRS", "EPSG:4326"))
        .and(query_param("BBOX", "7.0000000,50.0000000,8.0000000,51.0000000"))
        .and(query_param("WIDTH", "800"))
        .and(query_param("HEIGHT", "600"))
        .and(query_param("LAYERS", "base"))
        .and(query_param("FORMAT", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(create_test_png(8, 6)))
        .expect(1)
        .mount(&server)
        .await;

    let session = service.snapshot().unwrap();
    let map = fetcher
        .fetch(
            &session,
            BoundingBox::new(7.0, 50.0, 8.0, 51.0),
            SizeStrategy::width_height(800, 600),
        )
        .await
        .expect("fetch failed");

    assert_eq!((map.width, map.height), (800, 600));
    assert_eq!(map.epsg, 4326);
    assert!(!map.bytes.is_empty());
    assert!(map.url.query_pairs().all(|(k, _)| k != "CRS"));
}

#[tokio::test]
async fn test_fetch_wms130_uses_crs() {
    let config = ClientConfig::default();
    let (server, service, fetcher) = setup(capabilities::WMS_130, &config).await;
    Mock::given(method("GET"))
        .and(query_param("CRS", "EPSG:4326"))
        .and(query_param("VERSION", "1.3.0"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(create_test_png(4, 4)))
        .expect(1)
        .mount(&server)
        .await;

    let session = service.snapshot().unwrap();
    let map = fetcher
        .fetch(
            &session,
            BoundingBox::new(-10.0, -10.0, 10.0, 10.0),
            SizeStrategy::width_height(4, 4),
        )
        .await
        .unwrap();
    assert!(map.url.query_pairs().all(|(k, _)| k != "SRS"));
}

#[tokio::test]
async fn test_unadvertised_epsg_is_reprojected_without_touching_session() {
    let config = ClientConfig::default();
    let (server, mut service, fetcher) = setup(capabilities::BASIC, &config).await;
    Mock::given(method("GET"))
        .and(query_param("SRS", "EPSG:3857"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(create_test_png(4, 4)))
        .expect(1)
        .mount(&server)
        .await;

    // UTM 32N box around Bonn; the server only knows 3857 and 4326
    service.set_epsg(25832).unwrap();
    let session = service.snapshot().unwrap();
    let map = fetcher
        .fetch(
            &session,
            BoundingBox::new(360_000.0, 5_610_000.0, 370_000.0, 5_620_000.0),
            SizeStrategy::width_height(4, 4),
        )
        .await
        .unwrap();

    assert_eq!(map.epsg, 3857);
    assert!(map.bbox.min_x > 700_000.0 && map.bbox.max_x < 900_000.0);
    assert_eq!(session.epsg, 25832);
    assert_eq!(service.epsg(), Some(25832));
}

#[tokio::test]
async fn test_image_too_large() {
    let config = ClientConfig::default().with_max_pixels(1_000);
    let (server, service, fetcher) = setup(capabilities::BASIC, &config).await;

    let session = service.snapshot().unwrap();
    let err = fetcher
        .fetch(
            &session,
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            SizeStrategy::width_height(100, 11),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::ImageTooLarge {
            pixels: 1_100,
            max: 1_000
        }
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_out_of_range_box_is_not_requested() {
    let config = ClientConfig::default();
    let (server, service, fetcher) = setup(capabilities::BASIC, &config).await;

    let (min_x, min_y, max_x, max_y) = bbox::OUT_OF_RANGE;
    let session = service.snapshot().unwrap();
    let err = fetcher
        .fetch(
            &session,
            BoundingBox::new(min_x, min_y, max_x, max_y),
            SizeStrategy::width_height(10, 10),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::BoundingBoxOutOfRange { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_server_error_status() {
    let config = ClientConfig::default();
    let (server, service, fetcher) = setup(capabilities::BASIC, &config).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = service.snapshot().unwrap();
    let err = fetcher
        .fetch(
            &session,
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            SizeStrategy::width_height(10, 10),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedStatus { status: 500, .. }));
}

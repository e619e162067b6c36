//! Batch download end to end.

use std::sync::Arc;

use image::GenericImageView;
use test_utils::{bbox, capabilities, create_test_png};
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wms_client::{
    BatchOptions, BatchOrchestrator, BoundingBox, Capabilities, ClientConfig, ClientError,
    HttpTransport, MapSession, MapTransport, Service,
};

struct Fixture {
    server: MockServer,
    service: Service,
    batch: BatchOrchestrator,
    output: tempfile::TempDir,
}

async fn fixture() -> Fixture {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();
    let config = ClientConfig::default().with_output_dir(output.path());
    let transport: Arc<dyn MapTransport> = Arc::new(HttpTransport::new(&config).unwrap());
    let caps = Capabilities::decode(capabilities::BASIC.as_bytes()).unwrap();
    let service =
        Service::with_capabilities(Arc::clone(&transport), &format!("{}/wms", server.uri()), caps)
            .unwrap();
    let batch = BatchOrchestrator::new(transport, &config);
    Fixture {
        server,
        service,
        batch,
        output,
    }
}

fn session(service: &Service) -> Arc<MapSession> {
    Arc::new(service.snapshot().unwrap())
}

async fn respond_with_png(server: &MockServer, width: u32, height: u32) {
    Mock::given(method("GET"))
        .and(query_param("REQUEST", "GetMap"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(create_test_png(width, height)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_box_uses_plain_name() {
    let f = fixture().await;
    respond_with_png(&f.server, 20, 10).await;

    let options = BatchOptions {
        width: 20,
        height: 10,
        file_name: "bonn".into(),
        ..Default::default()
    };
    let report = f
        .batch
        .run(
            session(&f.service),
            &[BoundingBox::new(7.0, 50.6, 7.2, 50.8)],
            &options,
        )
        .await
        .expect("batch failed");

    assert_eq!(report.files, vec![f.output.path().join("bonn.png")]);
    assert!(report.files[0].exists());
}

#[tokio::test]
async fn test_multiple_boxes_are_numbered() {
    let f = fixture().await;
    respond_with_png(&f.server, 20, 10).await;

    let boxes = [
        BoundingBox::new(0.0, 0.0, 1.0, 1.0),
        BoundingBox::new(1.0, 1.0, 2.0, 2.0),
        BoundingBox::new(2.0, 2.0, 3.0, 3.0),
    ];
    let options = BatchOptions {
        width: 20,
        height: 10,
        ..Default::default()
    };
    let report = f.batch.run(session(&f.service), &boxes, &options).await.unwrap();

    let expected: Vec<_> = ["01_example.png", "02_example.png", "03_example.png"]
        .iter()
        .map(|name| f.output.path().join(name))
        .collect();
    assert_eq!(report.files, expected);
    assert!(expected.iter().all(|p| p.exists()));
}

#[tokio::test]
async fn test_one_failing_box_fails_the_batch() {
    let f = fixture().await;
    respond_with_png(&f.server, 10, 10).await;

    let boxes = [
        BoundingBox::new(0.0, 0.0, 1.0, 1.0),
        {
            let (min_x, min_y, max_x, max_y) = bbox::OUT_OF_RANGE;
            BoundingBox::new(min_x, min_y, max_x, max_y)
        },
        BoundingBox::new(2.0, 2.0, 3.0, 3.0),
    ];
    let options = BatchOptions {
        width: 10,
        height: 10,
        ..Default::default()
    };
    let err = f
        .batch
        .run(session(&f.service), &boxes, &options)
        .await
        .unwrap_err();

    // files of the other boxes may or may not exist
    assert!(matches!(err, ClientError::BoundingBoxOutOfRange { .. }));
}

#[tokio::test]
async fn test_expand_and_cut() {
    let mut f = fixture().await;
    Mock::given(method("GET"))
        .and(query_param("REQUEST", "GetMap"))
        .and(query_param("WIDTH", "110"))
        .and(query_param("HEIGHT", "110"))
        .and(query_param("BBOX", "-5.0000000,-5.0000000,105.0000000,105.0000000"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(create_test_png(110, 110)))
        .expect(1)
        .mount(&f.server)
        .await;

    f.service.set_epsg(3857).unwrap();
    let options = BatchOptions {
        expand_percent: 10.0,
        cut: true,
        width: 100,
        height: 100,
        file_name: "cut".into(),
        ..Default::default()
    };
    let report = f
        .batch
        .run(
            session(&f.service),
            &[BoundingBox::new(0.0, 0.0, 100.0, 100.0)],
            &options,
        )
        .await
        .expect("batch failed");

    let saved = image::open(&report.files[0]).unwrap();
    assert_eq!(saved.dimensions(), (100, 100));
}

#[tokio::test]
async fn test_undecodable_response() {
    let f = fixture().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<ServiceExceptionReport/>"))
        .mount(&f.server)
        .await;

    let options = BatchOptions {
        width: 10,
        height: 10,
        ..Default::default()
    };
    let err = f
        .batch
        .run(
            session(&f.service),
            &[BoundingBox::new(0.0, 0.0, 1.0, 1.0)],
            &options,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Image(_)));
}

#[tokio::test]
async fn test_concurrency_cap_of_one_still_completes() {
    let server = MockServer::start().await;
    respond_with_png(&server, 5, 5).await;
    let output = tempfile::tempdir().unwrap();
    let config = ClientConfig::default()
        .with_output_dir(output.path())
        .with_max_concurrent_fetches(1);
    let transport: Arc<dyn MapTransport> = Arc::new(HttpTransport::new(&config).unwrap());
    let caps = Capabilities::decode(capabilities::BASIC.as_bytes()).unwrap();
    let service =
        Service::with_capabilities(Arc::clone(&transport), &format!("{}/wms", server.uri()), caps)
            .unwrap();
    let batch = BatchOrchestrator::new(transport, &config);

    let boxes: Vec<_> = (0..5)
        .map(|i| BoundingBox::new(i as f64, 0.0, i as f64 + 1.0, 1.0))
        .collect();
    let options = BatchOptions {
        width: 5,
        height: 5,
        ..Default::default()
    };
    let report = batch.run(session(&service), &boxes, &options).await.unwrap();
    assert_eq!(report.files.len(), 5);
    assert_eq!(server.received_requests().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_empty_batch() {
    let f = fixture().await;
    let report = f
        .batch
        .run(session(&f.service), &[], &BatchOptions::default())
        .await
        .unwrap();
    assert!(report.files.is_empty());
}

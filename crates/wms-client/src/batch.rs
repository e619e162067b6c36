//! Concurrent multi-box map download.
//!
//! Every bounding box becomes one tokio task. Tasks run concurrently up to
//! `ClientConfig::max_concurrent_fetches` and report back over an mpsc
//! channel; the orchestrator waits for all of them and returns the first
//! error it receives. Boxes that succeed are written to disk even when a
//! sibling fails.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::GenericImageView;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use wms_common::BoundingBox;

use crate::config::ClientConfig;
use crate::dimension::SizeStrategy;
use crate::error::{ClientError, Result};
use crate::fetch::MapFetcher;
use crate::session::MapSession;
use crate::transport::MapTransport;

/// Output parameters shared by every box of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    /// Grow each box by this percentage of its width and height
    pub expand_percent: f64,
    /// Crop the image back to the unexpanded size
    pub cut: bool,
    pub width: u32,
    pub height: u32,
    /// Scale denominator, used when neither width nor height is set
    pub scale: u32,
    pub dpi: u32,
    /// Base name of the output files
    pub file_name: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            expand_percent: 0.0,
            cut: false,
            width: 0,
            height: 0,
            scale: 0,
            dpi: 0,
            file_name: "example".to_string(),
        }
    }
}

impl BatchOptions {
    fn growth(&self) -> f64 {
        1.0 + self.expand_percent / 100.0
    }

    /// Size strategy for an already expanded box.
    fn size_strategy(&self) -> SizeStrategy {
        if self.width != 0 || self.height != 0 {
            let growth = self.growth();
            SizeStrategy::width_height(
                (self.width as f64 * growth).round() as u32,
                (self.height as f64 * growth).round() as u32,
            )
        } else {
            SizeStrategy::scale_dpi(self.scale, self.dpi)
        }
    }

    /// Size to crop a fetched image to, if cutting is enabled.
    fn crop_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        self.cut.then(|| {
            let growth = self.growth();
            (
                (width as f64 / growth).round() as u32,
                (height as f64 / growth).round() as u32,
            )
        })
    }
}

/// Files written by a successful batch, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub files: Vec<PathBuf>,
}

/// Runs a batch of GetMap requests and stores the images.
pub struct BatchOrchestrator {
    fetcher: Arc<MapFetcher>,
    output_dir: PathBuf,
    max_concurrent: usize,
}

impl BatchOrchestrator {
    pub fn new(transport: Arc<dyn MapTransport>, config: &ClientConfig) -> Self {
        Self {
            fetcher: Arc::new(MapFetcher::new(transport, config)),
            output_dir: config.output_dir.clone(),
            max_concurrent: config.max_concurrent_fetches.max(1),
        }
    }

    /// Output path of box `index` (0-based) out of `total`.
    ///
    /// A single box is named `<name>.<ext>`; multiple boxes are numbered
    /// from 1 as `<NN>_<name>.<ext>`.
    pub fn output_path(&self, index: usize, total: usize, name: &str, extension: &str) -> PathBuf {
        let file = if total > 1 {
            format!("{:02}_{}.{}", index + 1, name, extension)
        } else {
            format!("{}.{}", name, extension)
        };
        self.output_dir.join(file)
    }

    /// Fetch and store one image per box.
    #[instrument(skip_all, fields(boxes = boxes.len()))]
    pub async fn run(
        &self,
        session: Arc<MapSession>,
        boxes: &[BoundingBox],
        options: &BatchOptions,
    ) -> Result<BatchReport> {
        if boxes.is_empty() {
            return Ok(BatchReport::default());
        }
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let total = boxes.len();
        let extension = session.file_extension();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let (tx, mut rx) = mpsc::channel::<(usize, Result<PathBuf>)>(total);

        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(total);
        for (index, bbox) in boxes.iter().copied().enumerate() {
            let path = self.output_path(index, total, &options.file_name, extension);
            let fetcher = Arc::clone(&self.fetcher);
            let session = Arc::clone(&session);
            let semaphore = Arc::clone(&semaphore);
            let options = options.clone();
            let tx = tx.clone();

            handles.push(tokio::spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        let result = process_box(&fetcher, &session, bbox, &options, path).await;
                        drop(permit);
                        result
                    }
                    Err(e) => Err(ClientError::TaskFailed(e.to_string())),
                };
                // receiver only goes away once every result has been drained
                let _ = tx.send((index, result)).await;
            }));
        }
        drop(tx);

        let mut files: Vec<Option<PathBuf>> = vec![None; total];
        let mut first_error: Option<ClientError> = None;
        let mut received = 0;
        while let Some((index, result)) = rx.recv().await {
            received += 1;
            match result {
                Ok(path) => {
                    debug!(index, path = %path.display(), "Stored map");
                    files[index] = Some(path);
                }
                Err(e) => {
                    warn!(index, error = %e, "Map fetch failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        // A task that panicked never sent its result
        if received < total {
            for handle in handles {
                if let Err(e) = handle.await {
                    first_error.get_or_insert(ClientError::TaskFailed(e.to_string()));
                }
            }
            first_error.get_or_insert(ClientError::TaskFailed(format!(
                "{} of {} tasks did not report a result",
                total - received,
                total
            )));
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let files: Vec<PathBuf> = files.into_iter().flatten().collect();
        info!(files = files.len(), dir = %self.output_dir.display(), "Batch complete");
        Ok(BatchReport { files })
    }
}

async fn process_box(
    fetcher: &MapFetcher,
    session: &MapSession,
    bbox: BoundingBox,
    options: &BatchOptions,
    path: PathBuf,
) -> Result<PathBuf> {
    let expanded = bbox.expanded(options.expand_percent);
    let fetched = fetcher
        .fetch(session, expanded, options.size_strategy())
        .await?;

    let crop = options.crop_size(fetched.width, fetched.height);
    let bytes = fetched.bytes;
    tokio::task::spawn_blocking(move || save_image(&bytes, crop, &path).map(|_| path))
        .await
        .map_err(|e| ClientError::TaskFailed(e.to_string()))?
}

/// Decode, optionally center-crop, and write an image. The output codec
/// follows the file extension.
fn save_image(bytes: &[u8], crop: Option<(u32, u32)>, path: &Path) -> Result<()> {
    let mut img = image::load_from_memory(bytes)?;
    if let Some((width, height)) = crop {
        let (full_width, full_height) = img.dimensions();
        let x = (full_width / 2).saturating_sub(width / 2);
        let y = (full_height / 2).saturating_sub(height / 2);
        img = img.crop_imm(x, y, width, height);
    }
    img.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::create_test_png;

    #[test]
    fn test_size_strategy_inflates_explicit_sizes() {
        let options = BatchOptions {
            expand_percent: 10.0,
            width: 100,
            height: 100,
            ..Default::default()
        };
        assert_eq!(
            options.size_strategy(),
            SizeStrategy::Explicit {
                width: 110,
                height: 110
            }
        );

        let width_only = BatchOptions {
            expand_percent: 10.0,
            width: 100,
            ..Default::default()
        };
        assert_eq!(width_only.size_strategy(), SizeStrategy::Width(110));

        let scaled = BatchOptions {
            scale: 5000,
            dpi: 96,
            ..Default::default()
        };
        assert_eq!(scaled.size_strategy(), SizeStrategy::scale_dpi(5000, 96));
    }

    #[test]
    fn test_crop_size() {
        let options = BatchOptions {
            expand_percent: 10.0,
            cut: true,
            ..Default::default()
        };
        assert_eq!(options.crop_size(110, 110), Some((100, 100)));
        assert_eq!(options.crop_size(221, 55), Some((201, 50)));

        let no_cut = BatchOptions {
            expand_percent: 10.0,
            ..Default::default()
        };
        assert_eq!(no_cut.crop_size(110, 110), None);
    }

    #[test]
    fn test_output_path() {
        struct Never;
        #[async_trait::async_trait]
        impl MapTransport for Never {
            async fn get(
                &self,
                url: &url::Url,
            ) -> std::result::Result<crate::transport::HttpResponse, crate::transport::TransportError>
            {
                Err(crate::transport::TransportError::Request {
                    url: url.to_string(),
                    message: "unused".into(),
                })
            }
        }

        let config = ClientConfig::default().with_output_dir("out");
        let batch = BatchOrchestrator::new(Arc::new(Never), &config);
        assert_eq!(batch.output_path(0, 1, "map", "png"), PathBuf::from("out/map.png"));
        assert_eq!(batch.output_path(0, 3, "map", "png"), PathBuf::from("out/01_map.png"));
        assert_eq!(batch.output_path(11, 12, "map", "jpeg"), PathBuf::from("out/12_map.jpeg"));
    }

    #[test]
    fn test_save_image_center_crop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crop.png");
        save_image(&create_test_png(110, 110), Some((100, 100)), &path).unwrap();

        let saved = image::open(&path).unwrap();
        assert_eq!(saved.dimensions(), (100, 100));
        // gradient red channel: pixel (0,0) of the crop was column 5 of the source
        let source = image::load_from_memory(&create_test_png(110, 110)).unwrap();
        assert_eq!(saved.get_pixel(0, 0), source.get_pixel(5, 5));
    }

    #[test]
    fn test_save_image_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_image(b"not an image", None, &dir.path().join("x.png")).unwrap_err();
        assert!(matches!(err, ClientError::Image(_)));
    }
}

//! Image uploads
//!
//! Files are filtered by sniffed MIME type, read concurrently and added to
//! the target bucket one at a time in completion order, each becoming an
//! item whose `src` is a base64 data URL.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::controller::BoardController;
use crate::error::UploadError;
use crate::model::{BucketKey, Item};
use crate::storage::Storage;

/// Outcome of one upload batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Ids of the items added, in the order they were added
    pub added: Vec<String>,
    /// Files skipped because they are not images
    pub skipped: Vec<PathBuf>,
    /// Images that could not be read
    pub failed: Vec<PathBuf>,
}

struct ImageFile {
    index: usize,
    path: PathBuf,
    mime: &'static str,
}

/// Add every image among `paths` to the front of `bucket`
pub async fn ingest_files<S: Storage>(
    controller: &mut BoardController<S>,
    bucket: &BucketKey,
    paths: &[PathBuf],
) -> Result<UploadReport, UploadError> {
    if !controller.board().has_bucket(bucket) {
        return Err(UploadError::UnknownBucket(bucket.to_string()));
    }

    let mut report = UploadReport::default();
    let mut images = Vec::new();
    for path in paths {
        match sniff_image(path) {
            Some(mime) => images.push(ImageFile {
                index: images.len(),
                path: path.clone(),
                mime,
            }),
            None => {
                debug!(path = %path.display(), "Skipping non-image file");
                report.skipped.push(path.clone());
            }
        }
    }
    if images.is_empty() {
        return Err(UploadError::NoImages);
    }

    let batch = chrono::Utc::now().timestamp_millis();
    read_images(controller, bucket, images, batch, &mut report).await;

    info!(
        bucket = %bucket,
        added = report.added.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Upload finished"
    );
    Ok(report)
}

/// Read sniffed images concurrently and add each one as its read completes
async fn read_images<S: Storage>(
    controller: &mut BoardController<S>,
    bucket: &BucketKey,
    images: Vec<ImageFile>,
    batch: i64,
    report: &mut UploadReport,
) {
    let mut reads: FuturesUnordered<_> = images
        .into_iter()
        .map(|image| async move {
            let bytes = tokio::fs::read(&image.path).await;
            (image, bytes)
        })
        .collect();

    while let Some((image, bytes)) = reads.next().await {
        match bytes {
            Ok(bytes) => {
                let mut item = image_item(batch, image.index, &image.path, image.mime, &bytes);
                item.id = controller.board().fresh_item_id(&item.id);
                let id = item.id.clone();
                if !controller.add_item(bucket, item).is_empty() {
                    report.added.push(id);
                }
            }
            Err(e) => {
                warn!(path = %image.path.display(), "Could not read image: {}", e);
                report.failed.push(image.path);
            }
        }
    }
}

/// Item for an uploaded image
///
/// `batch` is the upload's timestamp in milliseconds and `index` the file's
/// position among the batch's images. Two batches started in the same
/// millisecond share ids, so callers suffix them against the board.
pub fn image_item(batch: i64, index: usize, path: &Path, mime: &str, bytes: &[u8]) -> Item {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Item::new(
        format!("img_{}_{}", batch, index),
        format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        name,
    )
}

fn sniff_image(path: &Path) -> Option<&'static str> {
    match infer::get_from_path(path) {
        Ok(Some(kind)) if kind.matcher_type() == infer::MatcherType::Image => Some(kind.mime_type()),
        Ok(_) => None,
        Err(e) => {
            debug!(path = %path.display(), "Could not sniff file type: {}", e);
            None
        }
    }
}

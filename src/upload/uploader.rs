/// Sequential upload of picked files
///
/// Files go one at a time, in the order given. Each file gets up to
/// `max_attempts` tries against the store; a file that still fails is
/// reported and the remaining files are still uploaded.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::compress::{compress_image, detect_kind};
use super::store::MediaStore;
use crate::carousel::MediaKind;
use crate::config::UploadConfig;
use crate::error::{Error, Result};
use crate::state::data::NewMedia;

/// Distinguishes batches started within the same millisecond
static BATCH_SEQ: AtomicU64 = AtomicU64::new(0);

/// A file that made it into the store
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedMedia {
    pub source: PathBuf,
    pub media: NewMedia,
}

/// Outcome of a batch, cheap to hand back to the UI
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    pub uploaded: Vec<UploadedMedia>,
    /// Files that failed, with a displayable reason
    pub failed: Vec<(PathBuf, String)>,
}

/// Put `bytes` into the store, retrying up to `max_attempts` times
pub fn upload_with_retry<S: MediaStore + ?Sized>(
    store: &S,
    key: &str,
    bytes: &[u8],
    max_attempts: u32,
    retry_delay: Duration,
) -> Result<String> {
    let attempts = max_attempts.max(1);
    let mut last = String::new();

    for attempt in 1..=attempts {
        match store.put(key, bytes) {
            Ok(url) => return Ok(url),
            Err(e) => {
                tracing::warn!(key, attempt, attempts, error = %e, "upload attempt failed");
                last = e.to_string();
                if attempt < attempts && !retry_delay.is_zero() {
                    std::thread::sleep(retry_delay);
                }
            }
        }
    }

    Err(Error::UploadFailed {
        key: key.to_string(),
        attempts,
        last,
    })
}

/// Read, compress and store a single file
fn upload_one<S: MediaStore + ?Sized>(
    store: &S,
    path: &Path,
    key_prefix: &str,
    config: &UploadConfig,
) -> Result<UploadedMedia> {
    let kind = detect_kind(path)?;
    let bytes = std::fs::read(path)?;
    let retry_delay = Duration::from_millis(config.retry_delay_ms);

    let media = match kind {
        MediaKind::Image => {
            let compressed = compress_image(&bytes, config.max_dimension, config.jpeg_quality)?;
            let key = format!("{}.jpg", key_prefix);
            let url = upload_with_retry(store, &key, &compressed.jpeg, config.max_attempts, retry_delay)?;
            NewMedia {
                url,
                kind,
                width: Some(compressed.width),
                height: Some(compressed.height),
            }
        }
        MediaKind::Video { .. } => {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_else(|| "mp4".to_string());
            let key = format!("{}.{}", key_prefix, ext);
            let url = upload_with_retry(store, &key, &bytes, config.max_attempts, retry_delay)?;
            NewMedia {
                url,
                kind,
                width: None,
                height: None,
            }
        }
    };

    Ok(UploadedMedia {
        source: path.to_path_buf(),
        media,
    })
}

/// Upload `paths` in order, one result per input file
pub fn upload_files<S: MediaStore + ?Sized>(
    store: &S,
    paths: &[PathBuf],
    config: &UploadConfig,
) -> Vec<Result<UploadedMedia>> {
    let batch = format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        BATCH_SEQ.fetch_add(1, Ordering::Relaxed)
    );

    paths
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let result = upload_one(store, path, &format!("{}-{}", batch, i), config);
            match &result {
                Ok(uploaded) => tracing::info!(source = %path.display(), url = %uploaded.media.url, "uploaded"),
                Err(e) => tracing::error!(source = %path.display(), error = %e, "upload failed"),
            }
            result
        })
        .collect()
}

/// Run `upload_files` on the blocking pool and summarize the results
pub async fn upload_files_async(
    store: Arc<dyn MediaStore + Send + Sync>,
    paths: Vec<PathBuf>,
    config: UploadConfig,
) -> Result<UploadReport> {
    // Spawn blocking task for CPU-bound work (decode/resize/encode)
    tokio::task::spawn_blocking(move || {
        let results = upload_files(store.as_ref(), &paths, &config);

        let mut report = UploadReport::default();
        for (path, result) in paths.into_iter().zip(results) {
            match result {
                Ok(uploaded) => report.uploaded.push(uploaded),
                Err(e) => report.failed.push((path, e.to_string())),
            }
        }
        report
    })
    .await
    .map_err(|e| Error::Task(e.to_string()))
}

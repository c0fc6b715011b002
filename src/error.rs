/// Application-wide error type
///
/// Every fallible operation in the catalog, the upload helper and the
/// config loader returns `Result<T>`; the UI turns errors into status text.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid config at {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("unsupported media file: {0}")]
    UnsupportedMedia(PathBuf),

    #[error("upload of {key} failed after {attempts} attempts: {last}")]
    UploadFailed {
        key: String,
        attempts: u32,
        last: String,
    },

    #[error("background task failed: {0}")]
    Task(String),

    #[error("no usable {0} directory on this system")]
    NoDirectory(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Media upload module
///
/// This module handles:
/// - Detecting photo/video files by extension
/// - Downscaling and re-encoding photos before they are stored
/// - The media store the uploads land in
/// - Sequential uploads with per-file retry

pub mod compress;
pub mod store;
pub mod uploader;

pub use store::{LocalStore, MediaStore};
pub use uploader::{upload_files_async, UploadReport};

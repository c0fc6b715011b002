/// Media descriptors handed to the viewer
///
/// Photos and videos share one carousel; the only difference is how a page
/// renders, so the kind is a tagged union rather than two viewers.
use serde::{Deserialize, Serialize};

use crate::state::data::MediaRecord;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video {
        /// Poster frame shown while the video is not the current page
        thumbnail: Option<String>,
    },
}

/// A single page of the carousel
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Already-resolved location of the media (local path)
    pub url: String,
    pub kind: MediaKind,
    /// Pixel dimensions when known, used to letterbox the page
    pub size: Option<(u32, u32)>,
}

impl MediaItem {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: MediaKind::Image,
            size: None,
        }
    }

    pub fn video(url: impl Into<String>, thumbnail: Option<String>) -> Self {
        Self {
            url: url.into(),
            kind: MediaKind::Video { thumbnail },
            size: None,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self.kind, MediaKind::Video { .. })
    }
}

impl From<&MediaRecord> for MediaItem {
    fn from(record: &MediaRecord) -> Self {
        let item = match &record.kind {
            MediaKind::Image => Self::image(record.url.as_str()),
            MediaKind::Video { thumbnail } => Self::video(record.url.as_str(), thumbnail.clone()),
        };
        Self {
            size: record.width.zip(record.height),
            ..item
        }
    }
}

/// Playback state of a video page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Playing,
    Paused,
}

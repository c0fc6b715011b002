/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the catalog layer and the UI layer. The UI treats them as
/// opaque records and never mutates them in place.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::carousel::MediaKind;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// A timeline post with one or more photos/videos
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Moment {
    pub id: i64,
    pub author_id: i64,
    pub caption: String,
    pub created_at: DateTime<Utc>,
    pub media_count: usize,
}

/// What a piece of media is attached to
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaOwner {
    Moment(i64),
    Message(i64),
}

impl MediaOwner {
    /// Column values used by the catalog: (owner_type, owner_id)
    pub fn columns(self) -> (&'static str, i64) {
        match self {
            MediaOwner::Moment(id) => ("moment", id),
            MediaOwner::Message(id) => ("message", id),
        }
    }
}

/// A stored photo or video
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MediaRecord {
    pub id: i64,
    pub owner: MediaOwner,
    pub url: String,
    pub kind: MediaKind,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Order within the owner, starting at 0
    pub position: u32,
}

/// Media about to be attached to a moment or message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewMedia {
    pub url: String,
    pub kind: MediaKind,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Chat {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Profile ids, in the order they joined
    pub participants: Vec<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: i64,
    pub chat_id: i64,
    pub sender_id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub attachments: Vec<MediaRecord>,
}

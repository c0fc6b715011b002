/// Data-access interface used by the screens
///
/// Screens only see this trait; the SQLite catalog in `library.rs` is one
/// implementation, and a hosted backend client would be another.
use super::data::{Chat, ChatMessage, MediaOwner, MediaRecord, Moment, NewMedia, Profile};
use crate::error::Result;

pub trait MomentsRepository {
    fn get_profile(&self, id: i64) -> Result<Profile>;

    /// Create a profile, or return the existing one with the same name
    fn upsert_profile(&self, display_name: &str, avatar_url: Option<&str>) -> Result<Profile>;

    /// All moments, newest first
    fn list_moments(&self) -> Result<Vec<Moment>>;

    fn get_moment(&self, id: i64) -> Result<Moment>;

    /// Create a moment together with its media, in order. Either all of
    /// it is written or none of it is.
    fn create_moment(&self, author_id: i64, caption: &str, media: &[NewMedia]) -> Result<i64>;

    /// Media attached to `owner`, in display order
    fn get_media(&self, owner: MediaOwner) -> Result<Vec<MediaRecord>>;

    fn list_chats(&self) -> Result<Vec<Chat>>;

    fn get_chat(&self, id: i64) -> Result<Chat>;

    fn create_chat(&self, title: &str) -> Result<i64>;

    /// Add profiles to a chat. Returns how many were not already members.
    fn add_participants(&self, chat_id: i64, profile_ids: &[i64]) -> Result<usize>;

    /// Messages of a chat, oldest first, with their attachments
    fn list_messages(&self, chat_id: i64) -> Result<Vec<ChatMessage>>;

    fn send_message(
        &self,
        chat_id: i64,
        sender_id: i64,
        body: &str,
        attachments: &[NewMedia],
    ) -> Result<i64>;
}

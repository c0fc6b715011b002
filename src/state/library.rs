use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use super::data::{Chat, ChatMessage, MediaOwner, MediaRecord, Moment, NewMedia, Profile};
use super::repository::MomentsRepository;
use crate::carousel::MediaKind;
use crate::error::{Error, Result};

/// The Library manages the SQLite catalog database.
/// It stores profiles, moments, chats and references to stored media,
/// standing in for the hosted backend behind `MomentsRepository`.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open the catalog in the user's data directory:
    /// - Linux: ~/.local/share/moments/moments.db
    /// - macOS: ~/Library/Application Support/moments/moments.db
    /// - Windows: %APPDATA%\moments\moments.db
    pub fn new() -> Result<Self> {
        let db_path = Self::get_db_path()?;

        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::open(&db_path)
    }

    /// Open or create the catalog at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "catalog opened");

        let library = Library {
            conn,
            db_path: path.to_path_buf(),
        };
        library.init_schema()?;
        Ok(library)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let library = Library {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        library.init_schema()?;
        Ok(library)
    }

    fn get_db_path() -> Result<PathBuf> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(Error::NoDirectory("data"))?;

        path.push("moments");
        path.push("moments.db");
        Ok(path)
    }

    /// Initialize the database schema.
    /// Creates all necessary tables and indexes if they don't exist.
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS profiles (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                display_name    TEXT NOT NULL UNIQUE,
                avatar_url      TEXT
            );

            CREATE TABLE IF NOT EXISTS moments (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id       INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                caption         TEXT NOT NULL,
                created_at      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chats (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                created_at      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chat_participants (
                chat_id         INTEGER NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
                profile_id      INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                PRIMARY KEY (chat_id, profile_id)
            );

            CREATE TABLE IF NOT EXISTS messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id         INTEGER NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
                sender_id       INTEGER NOT NULL REFERENCES profiles(id),
                body            TEXT NOT NULL,
                sent_at         INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS media (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_type      TEXT NOT NULL CHECK (owner_type IN ('moment', 'message')),
                owner_id        INTEGER NOT NULL,
                url             TEXT NOT NULL,
                kind            TEXT NOT NULL CHECK (kind IN ('image', 'video')),
                thumbnail_url   TEXT,
                width           INTEGER,
                height          INTEGER,
                position        INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_moments_created_at ON moments(created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id, sent_at);
            CREATE INDEX IF NOT EXISTS idx_media_owner ON media(owner_type, owner_id, position);",
        )?;

        tracing::debug!("catalog schema initialized");
        Ok(())
    }

    fn participants(&self, chat_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT profile_id FROM chat_participants WHERE chat_id = ?1 ORDER BY rowid")?;
        let ids = stmt
            .query_map([chat_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    fn chat_exists(&self, chat_id: i64) -> Result<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM chats WHERE id = ?1", [chat_id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_media(conn: &Connection, owner: MediaOwner, media: &NewMedia) -> Result<i64> {
        let (owner_type, owner_id) = owner.columns();
        let (kind, thumbnail) = match &media.kind {
            MediaKind::Image => ("image", None),
            MediaKind::Video { thumbnail } => ("video", thumbnail.as_deref()),
        };
        let position: u32 = conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM media WHERE owner_type = ?1 AND owner_id = ?2",
            params![owner_type, owner_id],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT INTO media (owner_type, owner_id, url, kind, thumbnail_url, width, height, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![owner_type, owner_id, media.url, kind, thumbnail, media.width, media.height, position],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

fn to_utc(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn media_from_row(row: &Row<'_>, owner: MediaOwner) -> rusqlite::Result<MediaRecord> {
    let kind: String = row.get(2)?;
    let kind = match kind.as_str() {
        "video" => MediaKind::Video {
            thumbnail: row.get(3)?,
        },
        _ => MediaKind::Image,
    };
    Ok(MediaRecord {
        id: row.get(0)?,
        owner,
        url: row.get(1)?,
        kind,
        width: row.get(4)?,
        height: row.get(5)?,
        position: row.get(6)?,
    })
}

fn moment_from_row(row: &Row<'_>) -> rusqlite::Result<Moment> {
    Ok(Moment {
        id: row.get(0)?,
        author_id: row.get(1)?,
        caption: row.get(2)?,
        created_at: to_utc(row.get(3)?),
        media_count: row.get::<_, i64>(4)? as usize,
    })
}

const MOMENT_COLUMNS: &str = "SELECT m.id, m.author_id, m.caption, m.created_at,
        (SELECT COUNT(*) FROM media WHERE owner_type = 'moment' AND owner_id = m.id)
     FROM moments m";

impl MomentsRepository for Library {
    fn get_profile(&self, id: i64) -> Result<Profile> {
        self.conn
            .query_row(
                "SELECT id, display_name, avatar_url FROM profiles WHERE id = ?1",
                [id],
                |row| {
                    Ok(Profile {
                        id: row.get(0)?,
                        display_name: row.get(1)?,
                        avatar_url: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or(Error::NotFound { entity: "profile", id })
    }

    fn upsert_profile(&self, display_name: &str, avatar_url: Option<&str>) -> Result<Profile> {
        self.conn.execute(
            "INSERT INTO profiles (display_name, avatar_url) VALUES (?1, ?2)
             ON CONFLICT(display_name) DO UPDATE SET avatar_url = COALESCE(excluded.avatar_url, avatar_url)",
            params![display_name, avatar_url],
        )?;
        let id: i64 = self.conn.query_row(
            "SELECT id FROM profiles WHERE display_name = ?1",
            [display_name],
            |row| row.get(0),
        )?;
        self.get_profile(id)
    }

    fn list_moments(&self) -> Result<Vec<Moment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY m.created_at DESC, m.id DESC", MOMENT_COLUMNS))?;
        let moments = stmt
            .query_map([], moment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(moments)
    }

    fn get_moment(&self, id: i64) -> Result<Moment> {
        self.conn
            .query_row(&format!("{} WHERE m.id = ?1", MOMENT_COLUMNS), [id], moment_from_row)
            .optional()?
            .ok_or(Error::NotFound { entity: "moment", id })
    }

    fn create_moment(&self, author_id: i64, caption: &str, media: &[NewMedia]) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO moments (author_id, caption, created_at) VALUES (?1, ?2, ?3)",
            params![author_id, caption, Utc::now().timestamp()],
        )?;
        let moment_id = tx.last_insert_rowid();
        for item in media {
            Self::insert_media(&tx, MediaOwner::Moment(moment_id), item)?;
        }
        tx.commit()?;

        tracing::info!(moment_id, author_id, media = media.len(), "moment created");
        Ok(moment_id)
    }

    fn get_media(&self, owner: MediaOwner) -> Result<Vec<MediaRecord>> {
        let (owner_type, owner_id) = owner.columns();
        let mut stmt = self.conn.prepare(
            "SELECT id, url, kind, thumbnail_url, width, height, position
             FROM media WHERE owner_type = ?1 AND owner_id = ?2
             ORDER BY position",
        )?;
        let media = stmt
            .query_map(params![owner_type, owner_id], |row| media_from_row(row, owner))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(media)
    }

    fn list_chats(&self) -> Result<Vec<Chat>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, created_at FROM chats ORDER BY created_at DESC, id DESC")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, title, created_at)| {
                Ok(Chat {
                    id,
                    title,
                    created_at: to_utc(created_at),
                    participants: self.participants(id)?,
                })
            })
            .collect()
    }

    fn get_chat(&self, id: i64) -> Result<Chat> {
        let (title, created_at) = self
            .conn
            .query_row("SELECT title, created_at FROM chats WHERE id = ?1", [id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .optional()?
            .ok_or(Error::NotFound { entity: "chat", id })?;

        Ok(Chat {
            id,
            title,
            created_at: to_utc(created_at),
            participants: self.participants(id)?,
        })
    }

    fn create_chat(&self, title: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO chats (title, created_at) VALUES (?1, ?2)",
            params![title, Utc::now().timestamp()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn add_participants(&self, chat_id: i64, profile_ids: &[i64]) -> Result<usize> {
        if !self.chat_exists(chat_id)? {
            return Err(Error::NotFound { entity: "chat", id: chat_id });
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut added = 0;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO chat_participants (chat_id, profile_id) VALUES (?1, ?2)")?;
            for profile_id in profile_ids {
                added += stmt.execute(params![chat_id, profile_id])?;
            }
        }
        tx.commit()?;

        tracing::info!(chat_id, added, "participants added");
        Ok(added)
    }

    fn list_messages(&self, chat_id: i64) -> Result<Vec<ChatMessage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sender_id, body, sent_at FROM messages
             WHERE chat_id = ?1 ORDER BY sent_at, id",
        )?;
        let rows = stmt
            .query_map([chat_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, sender_id, body, sent_at)| {
                Ok(ChatMessage {
                    id,
                    chat_id,
                    sender_id,
                    body,
                    sent_at: to_utc(sent_at),
                    attachments: self.get_media(MediaOwner::Message(id))?,
                })
            })
            .collect()
    }

    fn send_message(
        &self,
        chat_id: i64,
        sender_id: i64,
        body: &str,
        attachments: &[NewMedia],
    ) -> Result<i64> {
        if !self.chat_exists(chat_id)? {
            return Err(Error::NotFound { entity: "chat", id: chat_id });
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO messages (chat_id, sender_id, body, sent_at) VALUES (?1, ?2, ?3, ?4)",
            params![chat_id, sender_id, body, Utc::now().timestamp()],
        )?;
        let message_id = tx.last_insert_rowid();
        for media in attachments {
            Self::insert_media(&tx, MediaOwner::Message(message_id), media)?;
        }
        tx.commit()?;

        tracing::debug!(chat_id, message_id, attachments = attachments.len(), "message sent");
        Ok(message_id)
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(url: &str) -> NewMedia {
        NewMedia {
            url: url.to_string(),
            kind: MediaKind::Image,
            width: Some(1600),
            height: Some(1200),
        }
    }

    fn video(url: &str) -> NewMedia {
        NewMedia {
            url: url.to_string(),
            kind: MediaKind::Video {
                thumbnail: Some(format!("{}.jpg", url)),
            },
            width: None,
            height: None,
        }
    }

    #[test]
    fn test_moment_with_media_in_order() {
        let library = Library::open_in_memory().unwrap();
        let author = library.upsert_profile("ayman", None).unwrap();
        let moment_id = library
            .create_moment(author.id, "beach day", &[photo("/m/1.jpg"), video("/m/2.mp4")])
            .unwrap();

        let media = library.get_media(MediaOwner::Moment(moment_id)).unwrap();
        assert_eq!(media.len(), 2);
        assert_eq!(media[0].position, 0);
        assert_eq!(media[0].width, Some(1600));
        assert_eq!(
            media[1].kind,
            MediaKind::Video {
                thumbnail: Some("/m/2.mp4.jpg".into())
            }
        );

        let moment = library.get_moment(moment_id).unwrap();
        assert_eq!(moment.caption, "beach day");
        assert_eq!(moment.media_count, 2);
    }

    #[test]
    fn test_failed_media_rolls_back_moment() {
        let library = Library::open_in_memory().unwrap();
        let author = library.upsert_profile("ayman", None).unwrap();
        library
            .conn
            .execute_batch(
                "CREATE TRIGGER reject_bad BEFORE INSERT ON media WHEN NEW.url = '/m/bad.jpg'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let result = library.create_moment(
            author.id,
            "half done",
            &[photo("/m/a.jpg"), photo("/m/bad.jpg"), photo("/m/c.jpg")],
        );
        assert!(result.is_err());

        assert!(library.list_moments().unwrap().is_empty());
        let rows: i64 = library
            .conn
            .query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn test_list_moments_newest_first() {
        let library = Library::open_in_memory().unwrap();
        let author = library.upsert_profile("ayman", None).unwrap();
        let first = library.create_moment(author.id, "first", &[]).unwrap();
        let second = library.create_moment(author.id, "second", &[]).unwrap();

        let ids: Vec<i64> = library.list_moments().unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn test_upsert_profile_is_idempotent() {
        let library = Library::open_in_memory().unwrap();
        let a = library.upsert_profile("sam", None).unwrap();
        let b = library.upsert_profile("sam", Some("/avatars/sam.jpg")).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.avatar_url.as_deref(), Some("/avatars/sam.jpg"));
    }

    #[test]
    fn test_missing_rows_are_not_found() {
        let library = Library::open_in_memory().unwrap();
        assert!(matches!(
            library.get_chat(42),
            Err(Error::NotFound { entity: "chat", id: 42 })
        ));
        assert!(matches!(library.get_moment(7), Err(Error::NotFound { .. })));
        assert!(matches!(library.get_profile(1), Err(Error::NotFound { .. })));
        assert!(matches!(library.add_participants(3, &[1]), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_add_participants_skips_members() {
        let library = Library::open_in_memory().unwrap();
        let a = library.upsert_profile("a", None).unwrap();
        let b = library.upsert_profile("b", None).unwrap();
        let chat_id = library.create_chat("weekend").unwrap();

        assert_eq!(library.add_participants(chat_id, &[a.id]).unwrap(), 1);
        assert_eq!(library.add_participants(chat_id, &[a.id, b.id]).unwrap(), 1);

        let chat = library.get_chat(chat_id).unwrap();
        assert_eq!(chat.participants, vec![a.id, b.id]);
        assert_eq!(library.list_chats().unwrap().len(), 1);
    }

    #[test]
    fn test_message_attachments() {
        let library = Library::open_in_memory().unwrap();
        let sender = library.upsert_profile("a", None).unwrap();
        let chat_id = library.create_chat("trip").unwrap();

        library.send_message(chat_id, sender.id, "hello", &[]).unwrap();
        let with_media = library
            .send_message(chat_id, sender.id, "pics", &[photo("/c/1.jpg"), photo("/c/2.jpg")])
            .unwrap();

        let messages = library.list_messages(chat_id).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].attachments.is_empty());
        assert_eq!(messages[1].id, with_media);
        assert_eq!(messages[1].attachments.len(), 2);
        assert_eq!(messages[1].attachments[1].owner, MediaOwner::Message(with_media));
        assert_eq!(messages[1].attachments[1].position, 1);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moments.db");
        {
            let library = Library::open(&path).unwrap();
            library.upsert_profile("a", None).unwrap();
        }
        let library = Library::open(&path).unwrap();
        assert_eq!(library.get_profile(1).unwrap().display_name, "a");
    }
}

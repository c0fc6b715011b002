use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Where uploaded media ends up. `put` returns the URL the media is
/// reachable at afterwards.
pub trait MediaStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<String>;
}

/// Media store backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Store under the system cache directory
    /// Returns ~/.cache/moments/media on Linux
    pub fn in_cache_dir() -> Result<Self> {
        let mut path = dirs_next::cache_dir()
            .or_else(dirs_next::home_dir)
            .ok_or(Error::NoDirectory("cache"))?;

        path.push("moments");
        path.push("media");
        Self::new(path)
    }
}

impl MediaStore for LocalStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<String> {
        // Keys are flat file names; never let one escape the root
        let name = Path::new(key)
            .file_name()
            .ok_or_else(|| Error::UnsupportedMedia(PathBuf::from(key)))?;
        let path = self.root.join(name);

        // Write then rename so a failed attempt never leaves a half file behind
        let partial = path.with_extension("part");
        if let Err(e) = fs::write(&partial, bytes).and_then(|_| fs::rename(&partial, &path)) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "stored media");
        Ok(path.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("media")).unwrap();

        let url = store.put("abc.jpg", b"jpeg bytes").unwrap();
        assert_eq!(std::fs::read(&url).unwrap(), b"jpeg bytes");
        assert!(Path::new(&url).starts_with(dir.path().join("media")));
    }

    #[test]
    fn test_failed_rename_removes_partial() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();
        // A directory in the way makes the final rename fail
        std::fs::create_dir(dir.path().join("taken.jpg")).unwrap();
        std::fs::write(dir.path().join("taken.jpg").join("keep"), b"x").unwrap();

        assert!(store.put("taken.jpg", b"jpeg bytes").is_err());
        assert!(!dir.path().join("taken.part").exists());
        assert!(dir.path().join("taken.jpg").is_dir());
    }

    #[test]
    fn test_put_strips_directories_from_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();

        let url = store.put("../../etc/evil.jpg", b"x").unwrap();
        assert_eq!(Path::new(&url), dir.path().join("evil.jpg"));
    }
}

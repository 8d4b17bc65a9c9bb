//! services/api/src/adapters/local_fs.rs
//!
//! A `LocalStore` that keeps one file per key under a profile directory.

use biblio_core::ports::{LocalStore, PortError, PortResult};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct FileLocalStore {
    root: PathBuf,
}

impl FileLocalStore {
    /// Opens (and creates if needed) the profile directory.
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Opens the profile directory of one user below `root`.
    pub fn open_profile(root: &Path, user_id: &str) -> std::io::Result<Self> {
        Self::open(root.join(file_name_for(user_id)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_name_for(key)))
    }
}

/// Keys map to file names; anything outside `[A-Za-z0-9_-]` is escaped as `%XX`.
fn file_name_for(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            name.push(byte as char);
        } else {
            name.push_str(&format!("%{:02X}", byte));
        }
    }
    name
}

impl LocalStore for FileLocalStore {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let path = self.path_for(key);
        // Each write gets its own sibling file, renamed over the target once complete.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)
            .map_err(|e| PortError::Unexpected(format!("tempfile: {e}")))?;
        tmp.write_all(value.as_bytes())
            .map_err(|e| PortError::Unexpected(format!("tempfile write: {e}")))?;
        tmp.persist(&path)
            .map_err(|e| PortError::Unexpected(format!("persist {}: {}", key, e.error)))?;
        Ok(())
    }
}

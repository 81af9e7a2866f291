//! File-backed durable store: one JSON object per origin

use crate::error::{Error, Result};
use crate::storage::DurableStore;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Persists entries for a single origin in `<dir>/<origin>.json`.
///
/// The file is re-read on every access, so it always reflects what a
/// fresh process would see.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open the store for `origin` under `dir`. Nothing is created until
    /// the first write.
    pub fn open(dir: impl AsRef<Path>, origin: &str) -> Result<Self> {
        let file_name = Self::file_stem(origin);
        if file_name.is_empty() {
            return Err(Error::Config(format!("Invalid storage origin: '{}'", origin)));
        }

        Ok(Self {
            path: dir.as_ref().join(format!("{}.json", file_name)),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File stem for an origin such as `https://app.example.com:8443`.
    ///
    /// Origins compare case-insensitively, so the origin is lowercased and
    /// then percent-encoded. The encoding is reversible, so distinct origins
    /// never share a file.
    pub fn file_stem(origin: &str) -> String {
        urlencoding::encode(&origin.trim().to_ascii_lowercase()).into_owned()
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::Storage(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            Error::Storage(format!("corrupt store {}: {}", self.path.display(), e))
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!("mkdir {}: {}", parent.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(entries)?;

        // Write to a sibling file first so readers never see a torn write
        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, content.as_bytes())
            .map_err(|e| Error::Storage(format!("write {}: {}", tmp.display(), e)))?;

        fs::rename(&tmp, &self.path).map_err(|e| {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                tracing::warn!("failed to remove {}: {}", tmp.display(), cleanup);
            }
            Error::Storage(format!("rename {}: {}", self.path.display(), e))
        })
    }
}

/// Create or truncate `path` readable by the owner only. On unix the mode is
/// set at creation, so the token is never briefly world-readable.
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    // A pre-existing tmp file keeps its old mode; tighten it
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(content)?;
    file.sync_all()
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entries()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }

        if entries.is_empty() {
            fs::remove_file(&self.path).map_err(|e| {
                Error::Storage(format!("failed to delete {}: {}", self.path.display(), e))
            })
        } else {
            self.write_entries(&entries)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_stem() {
        assert_eq!(
            FileStore::file_stem("http://localhost:3000"),
            "http%3A%2F%2Flocalhost%3A3000"
        );
        assert_eq!(
            FileStore::file_stem(" https://App.Example.com "),
            "https%3A%2F%2Fapp.example.com"
        );
        assert_eq!(FileStore::file_stem("///"), "%2F%2F%2F");
    }

    #[test]
    fn test_distinct_origins_get_distinct_files() {
        let tmp = TempDir::new().expect("tmp dir");
        let origins = [
            "https://a-b.com:80",
            "https://a-b.com_80",
            "https://a-b.com/80",
            "https://a_b.com:80",
            "http://localhost:3000",
            "http://localhost_3000",
        ];

        let mut paths: Vec<PathBuf> = origins
            .iter()
            .map(|origin| FileStore::open(tmp.path(), origin).unwrap().path().to_path_buf())
            .collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), origins.len());

        let mut first = FileStore::open(tmp.path(), "https://a-b.com:80").unwrap();
        let second = FileStore::open(tmp.path(), "https://a-b.com_80").unwrap();
        first.set("token", "abc").unwrap();
        assert!(second.get("token").unwrap().is_none());
    }

    #[test]
    fn test_stem_stays_inside_dir() {
        let tmp = TempDir::new().expect("tmp dir");
        let store = FileStore::open(tmp.path(), "../../etc/passwd").unwrap();
        assert_eq!(store.path().parent(), Some(tmp.path()));
    }

    #[test]
    fn test_open_rejects_empty_origin() {
        let tmp = TempDir::new().expect("tmp dir");
        assert!(matches!(
            FileStore::open(tmp.path(), "  "),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_file_store_set_get_remove_cycle() {
        let tmp = TempDir::new().expect("tmp dir");
        let mut store = FileStore::open(tmp.path().join("nested"), "http://localhost:3000")
            .expect("open store");

        assert!(store.get("token").unwrap().is_none());
        assert!(!store.path().exists());

        store.set("token", "abc").unwrap();
        assert!(store.path().exists());
        assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600, "store file should be 0600");
        }

        store.remove("token").unwrap();
        assert!(store.get("token").unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_private_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tmp dir");
        let path = tmp.path().join("entries.json.tmp");
        fs::write(&path, "stale").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_private(&path, b"{}").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_failed_rename_removes_tmp_file() {
        let tmp = TempDir::new().expect("tmp dir");
        let store = FileStore::open(tmp.path(), "origin").unwrap();

        // A non-empty directory at the target path makes the rename fail
        fs::create_dir_all(store.path().join("occupied")).unwrap();

        let mut entries = BTreeMap::new();
        entries.insert("token".to_string(), "abc".to_string());
        let err = store.write_entries(&entries).unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
        assert!(!store.path().with_extension("json.tmp").exists());
        assert!(store.path().is_dir());
    }

    #[test]
    fn test_remove_keeps_other_keys() {
        let tmp = TempDir::new().expect("tmp dir");
        let mut store = FileStore::open(tmp.path(), "origin").unwrap();

        store.set("token", "abc").unwrap();
        store.set("theme", "dark").unwrap();
        store.remove("token").unwrap();

        assert!(store.path().exists());
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let tmp = TempDir::new().expect("tmp dir");
        let store = FileStore::open(tmp.path(), "origin").unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.get("token"), Err(Error::Storage(_))));
    }

    #[test]
    fn test_empty_file_reads_as_empty() {
        let tmp = TempDir::new().expect("tmp dir");
        let store = FileStore::open(tmp.path(), "origin").unwrap();
        fs::write(store.path(), "  \n").unwrap();

        assert!(store.get("token").unwrap().is_none());
    }
}

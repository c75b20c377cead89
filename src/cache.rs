//! On-disk cache store.
//!
//! Every entry is a file in one cache directory, addressed by key. The file's
//! modification time is the entry's age, which is what rescan intervals are
//! compared against. Writers replace entries wholesale (write to a temporary
//! file, then rename), so concurrent readers see either the old or the new
//! content; concurrent writers race and the last one wins.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::CacheError;

/// Keyed file cache rooted at one directory.
#[derive(Clone, Debug)]
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    /// Create a cache rooted at `dir`. The directory is created lazily.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory that will hold one file per entry
    ///
    /// # Examples
    ///
    /// ```
    /// # use editor_projects::cache::Cache;
    /// let cache = Cache::new("/nonexistent/editor-projects");
    /// assert!(!cache.exists("sublime-projects.json"));
    /// ```
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform default cache directory (`~/.cache/editor-projects` on Linux).
    ///
    /// # Returns
    ///
    /// `None` if the platform has no notion of a user cache directory.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|p| p.join("editor-projects"))
    }

    /// Directory holding the entries.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    #[must_use]
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Replace the entry at `key` with `data`.
    ///
    /// The data goes to a temporary file in the cache directory first and is
    /// then renamed over the entry, so readers never see a partial write.
    ///
    /// # Arguments
    ///
    /// * `key` - Entry name, e.g. `"sublime-find.txt"`
    /// * `data` - New content of the entry
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory cannot be created or the
    /// entry cannot be written.
    ///
    /// # Examples
    ///
    /// ```
    /// # use editor_projects::cache::Cache;
    /// # let cache = Cache::new(std::env::temp_dir().join("editor-projects-doc"));
    /// cache.store("sublime-find.txt", b"/a/x.sublime-project\n")?;
    /// assert_eq!(cache.load("sublime-find.txt")?, b"/a/x.sublime-project\n");
    /// # Ok::<(), editor_projects::error::CacheError>(())
    /// ```
    pub fn store(&self, key: &str, data: &[u8]) -> Result<(), CacheError> {
        let io_err = |source: io::Error| CacheError::Io {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(data).map_err(io_err)?;
        tmp.persist(self.path(key)).map_err(|e| io_err(e.error))?;

        debug!("[cache] stored {} bytes in {key:?}", data.len());
        Ok(())
    }

    /// Read the entry at `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - Entry name
    ///
    /// # Returns
    ///
    /// The raw bytes last written with [`Cache::store`].
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Missing`] if there is no such entry and
    /// [`CacheError::Io`] if it cannot be read.
    pub fn load(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        fs::read(self.path(key)).map_err(|source| Self::read_error(key, source))
    }

    /// Whether an entry exists at `key`.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.path(key).is_file()
    }

    /// Last modification time of the entry at `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - Entry name
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Missing`] if there is no such entry.
    pub fn modified(&self, key: &str) -> Result<SystemTime, CacheError> {
        let metadata =
            fs::metadata(self.path(key)).map_err(|source| Self::read_error(key, source))?;

        metadata.modified().map_err(|source| CacheError::Io {
            key: key.to_string(),
            source,
        })
    }

    /// Time since the entry at `key` was last written.
    ///
    /// # Arguments
    ///
    /// * `key` - Entry name
    ///
    /// # Returns
    ///
    /// The entry's age. Entries stamped in the future report an age of zero.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Missing`] if there is no such entry.
    pub fn age(&self, key: &str) -> Result<Duration, CacheError> {
        let modified = self.modified(key)?;
        Ok(SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO))
    }

    /// Whether the entry at `key` is absent or older than `max_age`.
    ///
    /// # Arguments
    ///
    /// * `key` - Entry name
    /// * `max_age` - Oldest age still considered fresh
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::time::Duration;
    /// # use editor_projects::cache::Cache;
    /// # let cache = Cache::new(std::env::temp_dir().join("editor-projects-doc"));
    /// // Missing entries are always expired
    /// assert!(cache.expired("never-written.txt", Duration::from_secs(300)));
    /// ```
    #[must_use]
    pub fn expired(&self, key: &str, max_age: Duration) -> bool {
        self.age(key).map_or(true, |age| age > max_age)
    }

    /// Remove the entry at `key`. Removing an absent entry succeeds.
    ///
    /// # Arguments
    ///
    /// * `key` - Entry name
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the entry exists but cannot be removed.
    pub fn clear(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => {
                debug!("[cache] cleared {key:?}");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Serialize `value` as JSON into the entry at `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - Entry name, e.g. `"sublime-projects.json"`
    /// * `value` - Anything serializable, usually a `Vec<Project>`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Json`] if serialization fails, otherwise the
    /// same errors as [`Cache::store`].
    pub fn store_json<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_vec(value).map_err(|source| CacheError::Json {
            key: key.to_string(),
            source,
        })?;
        self.store(key, &data)
    }

    /// Deserialize the JSON entry at `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - Entry name
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Json`] if the entry is not valid JSON for `T`,
    /// otherwise the same errors as [`Cache::load`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use editor_projects::{cache::Cache, project::Project};
    /// # let cache = Cache::new(std::env::temp_dir().join("editor-projects-doc"));
    /// let projects: Vec<Project> = cache.load_json("sublime-projects.json")?;
    /// println!("{} cached projects", projects.len());
    /// # Ok::<(), editor_projects::error::CacheError>(())
    /// ```
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        let data = self.load(key)?;
        serde_json::from_slice(&data).map_err(|source| CacheError::Json {
            key: key.to_string(),
            source,
        })
    }

    /// `NotFound` becomes [`CacheError::Missing`], anything else [`CacheError::Io`].
    fn read_error(key: &str, source: io::Error) -> CacheError {
        if source.kind() == io::ErrorKind::NotFound {
            CacheError::Missing {
                key: key.to_string(),
            }
        } else {
            CacheError::Io {
                key: key.to_string(),
                source,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{FileTime, set_file_mtime};
    use tempfile::TempDir;

    fn age_entry(cache: &Cache, key: &str, by: Duration) {
        let when = SystemTime::now() - by;
        set_file_mtime(cache.path(key), FileTime::from_system_time(when)).unwrap();
    }

    #[test]
    fn test_store_and_load() {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path().join("nested/cache"));

        assert!(!cache.exists("a.txt"));
        cache.store("a.txt", b"/x\n/y\n").unwrap();

        assert!(cache.exists("a.txt"));
        assert_eq!(cache.load("a.txt").unwrap(), b"/x\n/y\n");
    }

    #[test]
    fn test_store_overwrites() {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path());

        cache.store("k", b"old").unwrap();
        cache.store("k", b"new").unwrap();
        assert_eq!(cache.load("k").unwrap(), b"new");
    }

    #[test]
    fn test_load_missing() {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path());

        assert!(matches!(
            cache.load("nope"),
            Err(CacheError::Missing { .. })
        ));
        assert!(matches!(cache.age("nope"), Err(CacheError::Missing { .. })));
    }

    #[test]
    fn test_expired() {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path());

        assert!(cache.expired("k", Duration::from_secs(60)));

        cache.store("k", b"data").unwrap();
        assert!(!cache.expired("k", Duration::from_secs(60)));

        age_entry(&cache, "k", Duration::from_secs(120));
        assert!(cache.expired("k", Duration::from_secs(60)));
        assert!(!cache.expired("k", Duration::from_secs(600)));
    }

    #[test]
    fn test_age_tracks_mtime() {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path());

        cache.store("k", b"data").unwrap();
        age_entry(&cache, "k", Duration::from_secs(3600));

        let age = cache.age("k").unwrap();
        assert!(age >= Duration::from_secs(3600));
        assert!(age < Duration::from_secs(3700));
    }

    #[test]
    fn test_clear() {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path());

        cache.store("k", b"data").unwrap();
        cache.clear("k").unwrap();
        assert!(!cache.exists("k"));

        // Clearing twice is fine
        cache.clear("k").unwrap();
    }

    #[test]
    fn test_json_round_trip() {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path());

        cache.store_json("list.json", &vec!["a", "b"]).unwrap();
        let loaded: Vec<String> = cache.load_json("list.json").unwrap();
        assert_eq!(loaded, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_load_json_invalid() {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path());

        cache.store("bad.json", b"{").unwrap();
        assert!(matches!(
            cache.load_json::<Vec<String>>("bad.json"),
            Err(CacheError::Json { .. })
        ));
    }
}

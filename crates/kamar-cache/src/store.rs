//! Cache store: raw XML artifacts and derived JSON artifacts.

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Data kinds held in the cache directory, each with a fixed file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    /// Raw `GetStudentTimetable` response.
    TimetableXml,
    /// Raw `GetGlobals` response.
    PeriodsXml,
    /// Raw `GetCalendar` response.
    CalendarXml,
    /// Parsed timetable artifact.
    TimetableJson,
    /// Parsed calendar artifact.
    CalendarJson,
}

impl CacheKind {
    /// Fixed file name for this kind.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::TimetableXml => "timetable.xml",
            Self::PeriodsXml => "periods.xml",
            Self::CalendarXml => "calendar.xml",
            Self::TimetableJson => "timetable.json",
            Self::CalendarJson => "calendar.json",
        }
    }
}

/// File-backed cache for portal artifacts.
///
/// Entries live until overwritten by a forced refresh: there is no TTL and
/// no eviction. Concurrent invocations against the same directory are not
/// locked against each other; the last writer wins.
#[derive(Debug)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Opens (or creates) the cache directory.
    ///
    /// - If `dir` is `Some`, uses it directly.
    /// - Otherwise uses `~/.cache/kamar`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be resolved or created.
    pub fn open(dir: Option<&PathBuf>) -> Result<Self> {
        let dir = resolve_cache_dir(dir)?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Absolute path of the artifact for `kind`.
    #[must_use]
    pub fn path(&self, kind: CacheKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Whether an artifact for `kind` exists.
    #[must_use]
    pub fn exists(&self, kind: CacheKind) -> bool {
        self.path(kind).exists()
    }

    /// Reads the artifact for `kind` verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read(&self, kind: CacheKind) -> Result<String> {
        let path = self.path(kind);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))
    }

    /// Writes the artifact for `kind` verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, kind: CacheKind, contents: &str) -> Result<()> {
        let path = self.path(kind);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Deserializes a derived JSON artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed. A corrupt
    /// artifact keeps failing until a refresh rewrites it; nothing is
    /// invalidated automatically.
    pub fn load_json<T: DeserializeOwned>(&self, kind: CacheKind) -> Result<T> {
        let contents = self.read(kind)?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", self.path(kind).display()))
    }

    /// Serializes a derived JSON artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn save_json<T: Serialize>(&self, kind: CacheKind, value: &T) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(value).context("failed to serialize cache artifact")?;
        self.write(kind, &contents)
    }

    /// Returns the cached artifact for `kind`, fetching when needed.
    ///
    /// With `force_refresh` unset and an artifact present, the cached
    /// contents are returned without running `fetch`. Otherwise `fetch`
    /// runs; its result is persisted verbatim before being returned, and on
    /// failure the existing artifact is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or the artifact cannot be read
    /// or written.
    pub async fn fetch_or_load<F, Fut>(
        &self,
        kind: CacheKind,
        force_refresh: bool,
        fetch: F,
    ) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        if !force_refresh && self.exists(kind) {
            tracing::debug!(file = kind.file_name(), "using cached data");
            return self.read(kind);
        }

        tracing::info!(file = kind.file_name(), "fetching fresh data");
        let body = fetch().await?;
        self.write(kind, &body)?;
        Ok(body)
    }
}

/// Resolves the cache directory.
fn resolve_cache_dir(dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.clone());
    }

    let home = std::env::var("HOME").context("HOME environment variable is not set")?;
    Ok(PathBuf::from(home).join(".cache").join("kamar"))
}

//! Atomic JSON file operations.
//!
//! Provides a thin layer for safe access to JSON state files: a consumer
//! never observes a file that reflects only part of one write.

use parley_core::ParleyError;
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Errors that can occur during atomic JSON operations.
#[derive(Debug)]
pub enum AtomicJsonError {
    /// File I/O error.
    Io(std::io::Error),
    /// JSON serialization/deserialization error.
    Json(serde_json::Error),
}

impl std::fmt::Display for AtomicJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomicJsonError::Io(e) => write!(f, "I/O error: {}", e),
            AtomicJsonError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for AtomicJsonError {}

impl From<std::io::Error> for AtomicJsonError {
    fn from(e: std::io::Error) -> Self {
        AtomicJsonError::Io(e)
    }
}

impl From<serde_json::Error> for AtomicJsonError {
    fn from(e: serde_json::Error) -> Self {
        AtomicJsonError::Json(e)
    }
}

impl From<AtomicJsonError> for ParleyError {
    fn from(e: AtomicJsonError) -> Self {
        match e {
            AtomicJsonError::Io(err) => ParleyError::io(err.to_string()),
            AtomicJsonError::Json(err) => ParleyError::serialization("JSON", err.to_string()),
        }
    }
}

/// A handle to a JSON file written via tmp file + atomic rename.
///
/// - **Atomicity**: updates are all-or-nothing via tmp file + rename
/// - **Durability**: explicit fsync before rename
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a new atomic JSON file handle.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the JSON file and deserializes it.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>, AtomicJsonError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: T = serde_json::from_str(&content)?;
        Ok(Some(data))
    }

    /// Saves data to the JSON file atomically.
    ///
    /// Parent directories are created on demand. The data is written to a
    /// temporary file in the same directory, fsynced, then renamed over the
    /// target.
    pub fn save(&self, data: &T) -> Result<(), AtomicJsonError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json_string = serde_json::to_string_pretty(data)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf, AtomicJsonError> {
        let parent = self.path.parent().ok_or_else(|| {
            AtomicJsonError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            ))
        })?;

        let file_name = self.path.file_name().ok_or_else(|| {
            AtomicJsonError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(parent.join(tmp_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestRecord {
        name: String,
        count: u32,
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let atomic_file =
            AtomicJsonFile::<TestRecord>::new(temp_dir.path().join("record.json"));

        let record = TestRecord {
            name: "test".to_string(),
            count: 42,
        };
        atomic_file.save(&record).unwrap();

        let loaded = atomic_file.load().unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_load_nonexistent_file_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let atomic_file =
            AtomicJsonFile::<TestRecord>::new(temp_dir.path().join("missing.json"));
        assert!(atomic_file.load().unwrap().is_none());
    }

    #[test]
    fn test_load_empty_file_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.json");
        fs::write(&path, "  \n").unwrap();
        let atomic_file = AtomicJsonFile::<TestRecord>::new(path);
        assert!(atomic_file.load().unwrap().is_none());
    }

    #[test]
    fn test_load_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let atomic_file = AtomicJsonFile::<TestRecord>::new(path);
        assert!(matches!(
            atomic_file.load(),
            Err(AtomicJsonError::Json(_))
        ));
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("record.json");
        let atomic_file = AtomicJsonFile::<TestRecord>::new(path.clone());

        atomic_file
            .save(&TestRecord {
                name: "deep".to_string(),
                count: 1,
            })
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let temp_dir = TempDir::new().unwrap();
        let atomic_file =
            AtomicJsonFile::<TestRecord>::new(temp_dir.path().join("record.json"));

        for count in 0..3 {
            atomic_file
                .save(&TestRecord {
                    name: "latest".to_string(),
                    count,
                })
                .unwrap();
        }
        assert_eq!(atomic_file.load().unwrap().unwrap().count, 2);
    }
}

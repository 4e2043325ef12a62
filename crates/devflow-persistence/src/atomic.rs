//! Atomic file operations.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{PersistenceError, Result};

/// Writes data to a file atomically, replacing any existing file.
///
/// Data goes to a temporary file in the target directory first and is then
/// renamed into place, so readers never observe a partial file.
///
/// # Errors
/// Returns an error if the write or rename fails.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let temp_file = write_temp(path, data)?;
    temp_file
        .persist(path)
        .map_err(|e| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source: e.error,
        })?;
    Ok(())
}

/// Writes data to a new file atomically, failing if the path already exists.
///
/// # Errors
/// Returns [`PersistenceError::AlreadyExists`] if `path` is taken.
pub fn atomic_create(path: &Path, data: &[u8]) -> Result<()> {
    let temp_file = write_temp(path, data)?;
    temp_file.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == ErrorKind::AlreadyExists {
            PersistenceError::AlreadyExists(path.to_path_buf())
        } else {
            PersistenceError::WriteError {
                path: path.to_path_buf(),
                source: e.error,
            }
        }
    })?;
    Ok(())
}

/// Serializes `value` as pretty JSON and writes it with [`atomic_create`].
pub fn atomic_create_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    atomic_create(path, json.as_bytes())
}

/// Reads and deserializes JSON from a file.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path).map_err(|source| PersistenceError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

/// Ensures a directory exists.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| PersistenceError::DirectoryError {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn write_temp(path: &Path, data: &[u8]) -> Result<NamedTempFile> {
    let dir = path.parent().unwrap_or(Path::new("."));
    ensure_dir(dir)?;

    // Same directory as the target so the rename stays on one filesystem.
    let mut temp_file =
        NamedTempFile::new_in(dir).map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    temp_file
        .write_all(data)
        .and_then(|()| temp_file.flush())
        .map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(temp_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/test.txt");

        atomic_write(&path, b"nested content").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "nested content");
    }

    #[test]
    fn test_atomic_write_replaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");

        atomic_write(&path, b"one").unwrap();
        atomic_write(&path, b"two").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
    }

    #[test]
    fn test_atomic_create_refuses_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entry.json");

        atomic_create(&path, b"first").unwrap();
        let err = atomic_create(&path, b"second").unwrap_err();

        assert!(matches!(err, PersistenceError::AlreadyExists(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn test_create_json_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        atomic_create_json(&path, &data).unwrap();
        let loaded: TestData = read_json(&path).unwrap();

        assert_eq!(data, loaded);
    }
}

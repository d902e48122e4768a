//! JSON file helpers shared by the file-backed collaborators

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Read a JSON document; `Ok(None)` when the file does not exist
pub(crate) fn read<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::storage(format!("Failed to read {}", path.display()), e)),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| Error::Parse(format!("{}: {e}", path.display())))
}

/// Read a top-level JSON array as raw rows
pub(crate) fn read_rows(path: &Path) -> Result<Vec<Value>> {
    read::<Vec<Value>>(path).map(Option::unwrap_or_default)
}

/// Pretty-print `value` to `path` with a trailing newline.
///
/// The document is written to a sibling temp file and renamed into place, so
/// readers never observe a half-written file.
pub(crate) fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::storage(format!("Failed to create directory {}", parent.display()), e)
        })?;
    }

    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');

    let tmp = temp_path(path);
    fs::write(&tmp, content)
        .map_err(|e| Error::storage(format!("Failed to write {}", tmp.display()), e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        Error::storage(format!("Failed to replace {}", path.display()), e)
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp-{}", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_as_none() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let value: Option<Value> = read(&dir.path().join("absent.json"))?;
        assert!(value.is_none());
        assert!(read_rows(&dir.path().join("absent.json"))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_write_pretty_adds_newline_and_creates_parent() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested/doc.json");
        write_pretty(&path, &serde_json::json!([{"a": 1}]))?;

        let raw = fs::read_to_string(&path)?;
        assert!(raw.ends_with("]\n"));
        assert!(raw.contains("\n  {"));
        assert_eq!(fs::read_dir(dir.path().join("nested"))?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_non_array_is_parse_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ledger.json");
        fs::write(&path, "{\"not\": \"an array\"}")?;
        assert!(matches!(read_rows(&path), Err(Error::Parse(_))));
        Ok(())
    }
}

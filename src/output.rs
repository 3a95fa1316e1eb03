use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::{AppError, Result};

/// Write `data` as pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AppError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let file = File::create(path).map_err(|e| AppError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| AppError::JsonSerialize(e.to_string()))?;
    writeln!(writer)
        .and_then(|_| writer.flush())
        .map_err(|e| AppError::WriteFile {
            path: path.display().to_string(),
            source: e,
        })?;
    Ok(())
}

/// Print `data` as pretty JSON on stdout.
pub fn write_json_stdout<T: Serialize + ?Sized>(data: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| AppError::JsonSerialize(e.to_string()))?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Thread;
    use tempfile::tempdir;

    #[test]
    fn test_write_json_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("2025").join("01").join("15").join("slack.json");

        write_json(&path, &Vec::<Thread>::new()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), "[]");
    }

    #[test]
    fn test_write_json_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");

        write_json(&path, &vec![1, 2, 3]).unwrap();
        write_json(&path, &vec![4]).unwrap();

        let parsed: Vec<i32> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, vec![4]);
    }
}

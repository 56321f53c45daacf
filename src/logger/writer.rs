//! File sink for the file logging layer.

use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use crate::logger::config::FileConfig;
use crate::logger::error::LoggerError;

/// Opens the configured log file, creating parent directories as needed.
///
/// The returned `Mutex<File>` is a `MakeWriter` for `tracing_subscriber::fmt`.
pub(crate) fn open_log_file(config: &FileConfig) -> Result<Mutex<File>, LoggerError> {
    if let Some(parent) = config.path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(config.append)
        .truncate(!config.append)
        .open(&config.path)?;

    Ok(Mutex::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LogFormat;
    use std::io::Write;
    use tempfile::TempDir;

    fn file_config(dir: &TempDir, append: bool) -> FileConfig {
        FileConfig::new(
            true,
            dir.path().join("nested/logs/app.log"),
            append,
            LogFormat::Full,
        )
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, true);

        open_log_file(&config).unwrap();
        assert!(config.path.exists());
    }

    #[test]
    fn test_append_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, true);

        open_log_file(&config).unwrap().lock().unwrap().write_all(b"first\n").unwrap();
        open_log_file(&config).unwrap().lock().unwrap().write_all(b"second\n").unwrap();

        let content = std::fs::read_to_string(&config.path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_truncate_when_not_appending() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, false);

        open_log_file(&config).unwrap().lock().unwrap().write_all(b"stale\n").unwrap();
        open_log_file(&config).unwrap().lock().unwrap().write_all(b"fresh\n").unwrap();

        let content = std::fs::read_to_string(&config.path).unwrap();
        assert_eq!(content, "fresh\n");
    }
}

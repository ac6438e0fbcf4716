//! Collision-free output paths: `<dir>/<YYYYMMDD_HHMMSS>_<n>.wav`.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::models::error::RecorderError;

/// Hard ceiling on suffixes tried for a single timestamp.
pub const MAX_ATTEMPTS: u32 = 999;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, Copy)]
pub struct FilenameAllocator {
    max_attempts: u32,
}

impl FilenameAllocator {
    pub fn new() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Return the first `<timestamp>_<n>.wav` under `base_directory` that
    /// does not exist yet, trying `n = 1..=999`.
    pub fn allocate(&self, base_directory: &Path, now: &NaiveDateTime) -> Result<PathBuf, RecorderError> {
        if !base_directory.is_dir() {
            return Err(RecorderError::NoDirectory(format!(
                "{} is not a directory",
                base_directory.display()
            )));
        }

        let stem = now.format(TIMESTAMP_FORMAT).to_string();
        for n in 1..=self.max_attempts {
            let candidate = base_directory.join(format!("{}_{}.wav", stem, n));
            if !candidate.exists() {
                return Ok(candidate);
            }
        }

        Err(RecorderError::ExhaustedAttempts {
            stem,
            attempts: self.max_attempts,
        })
    }
}

impl Default for FilenameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve where recordings go: the configured directory if any, otherwise
/// the user's desktop. `None` when neither is available.
pub fn preferred_directory(configured: Option<&Path>) -> Option<PathBuf> {
    match configured {
        Some(dir) => Some(dir.to_path_buf()),
        None => dirs_next::desktop_dir(),
    }
}

/// Current working directory, the fallback when the preferred one is unusable.
pub fn fallback_directory() -> Result<PathBuf, RecorderError> {
    std::env::current_dir()
        .map_err(|e| RecorderError::NoDirectory(format!("current directory unavailable: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;

    fn new_year() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn first_allocation_uses_suffix_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = FilenameAllocator::new().allocate(dir.path(), &new_year()).unwrap();
        assert_eq!(path, dir.path().join("20240101_000000_1.wav"));
    }

    #[test]
    fn skips_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        for n in 1..=5 {
            fs::write(dir.path().join(format!("20240101_000000_{}.wav", n)), b"").unwrap();
        }

        let path = FilenameAllocator::new().allocate(dir.path(), &new_year()).unwrap();
        assert_eq!(path, dir.path().join("20240101_000000_6.wav"));
        assert!(!path.exists());
    }

    #[test]
    fn timestamp_formatting() {
        let dir = tempfile::tempdir().unwrap();
        let when = NaiveDate::from_ymd_opt(2023, 11, 7)
            .unwrap()
            .and_hms_opt(9, 5, 3)
            .unwrap();
        let path = FilenameAllocator::new().allocate(dir.path(), &when).unwrap();
        assert_eq!(path.file_name().unwrap(), "20231107_090503_1.wav");
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = FilenameAllocator::new().allocate(&missing, &new_year()).unwrap_err();
        assert!(matches!(err, RecorderError::NoDirectory(_)));
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let allocator = FilenameAllocator { max_attempts: 3 };
        for n in 1..=3 {
            fs::write(dir.path().join(format!("20240101_000000_{}.wav", n)), b"").unwrap();
        }

        let err = allocator.allocate(dir.path(), &new_year()).unwrap_err();
        assert_eq!(
            err,
            RecorderError::ExhaustedAttempts {
                stem: "20240101_000000".into(),
                attempts: 3,
            }
        );
    }

    #[test]
    fn configured_directory_wins() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(preferred_directory(Some(dir.path())), Some(dir.path().to_path_buf()));
    }
}

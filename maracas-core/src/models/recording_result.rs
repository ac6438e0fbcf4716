use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Returned by `stop()` once the WAV file is finalized and closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingResult {
    pub id: String,
    pub file_path: PathBuf,
    pub source_id: String,
    /// Audio payload size, header excluded.
    pub audio_bytes: u64,
    pub duration_secs: f64,
    /// SHA-256 of the finalized file, lowercase hex.
    pub checksum: String,
    pub created_at: String,
}

impl RecordingResult {
    pub fn new(file_path: PathBuf, source_id: &str, audio_bytes: u64, duration_secs: f64, checksum: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path,
            source_id: source_id.to_string(),
            audio_bytes,
            duration_secs,
            checksum,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

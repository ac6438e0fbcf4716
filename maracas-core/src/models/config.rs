use std::path::PathBuf;

/// In-memory engine configuration. Nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfiguration {
    /// Client name announced to the audio server (default: "Maracas").
    pub application_name: String,

    /// Name of the capture stream (default: "Maracas Record").
    pub stream_name: String,

    /// Directory for new recordings. `None` means the user's desktop,
    /// falling back to the current working directory.
    pub output_directory: Option<PathBuf>,
}

impl RecorderConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.application_name.trim().is_empty() {
            return Err("application name must not be empty".into());
        }
        if self.stream_name.trim().is_empty() {
            return Err("stream name must not be empty".into());
        }
        Ok(())
    }

    pub fn with_output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(dir.into());
        self
    }
}

impl Default for RecorderConfiguration {
    fn default() -> Self {
        Self {
            application_name: "Maracas".into(),
            stream_name: "Maracas Record".into(),
            output_directory: None,
        }
    }
}

use thiserror::Error;

/// Errors produced by the recording engine.
///
/// Payloads are plain strings so errors stay `Clone` and comparable; OS and
/// audio-server error text is carried verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("audio server connection failed: {0}")]
    ConnectionFailed(String),

    #[error("audio server connection terminated: {0}")]
    ConnectionTerminated(String),

    #[error("audio server connection is not ready")]
    NotConnected,

    #[error("source index {index} out of range ({len} sources available)")]
    SourceOutOfRange { index: usize, len: usize },

    #[error("source id must not be empty")]
    EmptySourceId,

    #[error("a recording session is already active")]
    SessionBusy,

    #[error("capture stream failed: {0}")]
    StreamFailed(String),

    #[error("output directory unavailable: {0}")]
    NoDirectory(String),

    #[error("no free file name for {stem} after {attempts} attempts")]
    ExhaustedAttempts { stem: String, attempts: u32 },

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("wav file already finalized")]
    WriterFinalized,

    #[error("audio server error: {0}")]
    Server(String),

    #[error("configuration invalid: {0}")]
    ConfigurationFailed(String),
}

/// How far an error reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The connection is gone; the host application should exit.
    Fatal,
    /// The session returned to idle; the engine stays usable.
    SessionRecoverable,
    /// A single buffer was lost; recording continues.
    Ignorable,
    /// The caller asked for something that cannot be done right now.
    Misuse,
}

impl RecorderError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::ConnectionFailed(_) | Self::ConnectionTerminated(_) => Severity::Fatal,
            Self::StreamFailed(_)
            | Self::NoDirectory(_)
            | Self::ExhaustedAttempts { .. }
            | Self::StorageError(_)
            | Self::Server(_) => Severity::SessionRecoverable,
            Self::WriterFinalized => Severity::Ignorable,
            Self::NotConnected
            | Self::SourceOutOfRange { .. }
            | Self::EmptySourceId
            | Self::SessionBusy
            | Self::ConfigurationFailed(_) => Severity::Misuse,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

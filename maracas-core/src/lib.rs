//! # maracas-core
//!
//! Recording engine for a networked audio server.
//!
//! Connects to the server, lists its input sources, and records one source
//! at a time into a standard 16-bit PCM WAV file. The engine is driven by
//! the host's event loop: it never blocks and owns no threads. Server
//! backends implement `AudioServer` and `CaptureStream` and plug into the
//! generic `RecorderEngine`.
//!
//! ## Architecture
//!
//! ```text
//! maracas-core (this crate)
//! ├── traits/       ← AudioServer, CaptureStream, EngineDelegate
//! ├── models/       ← RecorderError, connection/stream/session states, configuration
//! ├── processing/   ← WAV header layout and size fields
//! ├── session/      ← ConnectionManager, SourceCatalog, RecordingSession, RecorderEngine
//! └── storage/      ← WavFileWriter, file name allocation
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioSourceDescriptor, SampleSpec};
pub use models::config::RecorderConfiguration;
pub use models::error::{RecorderError, Severity};
pub use models::recording_result::RecordingResult;
pub use models::state::{ConnectionState, SessionState, StreamState};
pub use session::connection::ConnectionManager;
pub use session::engine::RecorderEngine;
pub use session::recording::RecordingSession;
pub use session::source_catalog::SourceCatalog;
pub use storage::filename::FilenameAllocator;
pub use storage::wav_writer::WavFileWriter;
pub use traits::audio_server::{AudioServer, ServerEvent};
pub use traits::capture_stream::{CaptureStream, PeekedBuffer, StreamEvent};
pub use traits::engine_delegate::EngineDelegate;

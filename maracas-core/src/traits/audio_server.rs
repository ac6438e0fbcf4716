use crate::models::audio_models::{AudioSourceDescriptor, SampleSpec};
use crate::models::error::RecorderError;
use crate::models::state::ConnectionState;
use crate::traits::capture_stream::CaptureStream;

/// A notification from the audio server, drained after each iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// The connection moved to a new state.
    StateChanged(ConnectionState),
    /// One input source from an enumeration in progress.
    SourceReported(AudioSourceDescriptor),
    /// The enumeration finished; no more sources follow.
    SourceListComplete,
    /// The enumeration was aborted by the server.
    SourceListFailed(String),
}

/// Client side of an audio-server connection.
///
/// Implemented by:
/// - `PulseServer` (maracas-pulse, libpulse standard mainloop)
///
/// Nothing here blocks. The owner drives the connection by calling
/// `iterate` from the host's scheduler and then draining `next_event`;
/// state and enumeration callbacks only ever fire inside `iterate`.
pub trait AudioServer {
    type Stream: CaptureStream;

    /// Begin the asynchronous connection handshake.
    fn connect(&mut self) -> Result<(), RecorderError>;

    /// Run one non-blocking iteration of the server's event loop.
    fn iterate(&mut self) -> Result<(), RecorderError>;

    /// Next queued notification, in arrival order.
    fn next_event(&mut self) -> Option<ServerEvent>;

    /// Ask the server to report all input sources.
    fn request_source_list(&mut self) -> Result<(), RecorderError>;

    /// Create a record stream on `source_id` and connect it corked.
    fn create_stream(&mut self, source_id: &str, spec: &SampleSpec) -> Result<Self::Stream, RecorderError>;

    /// Human-readable text for the most recent server error.
    fn last_error(&self) -> String;

    /// Disconnect from the server. Further notifications may still be queued.
    fn disconnect(&mut self);
}

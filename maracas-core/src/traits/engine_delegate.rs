use crate::models::audio_models::AudioSourceDescriptor;
use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::{ConnectionState, SessionState};

/// Event sink for the host UI.
///
/// All methods are called synchronously from inside engine calls on the
/// host's thread. Implementations must not call back into the engine.
pub trait EngineDelegate {
    /// Called for every connection state notification.
    fn on_connection_state_changed(&self, state: ConnectionState);

    /// Called when the catalog is cleared and again when an enumeration completes.
    fn on_source_list_changed(&self, sources: &[AudioSourceDescriptor]);

    /// Called when the recording session changes state.
    fn on_session_state_changed(&self, state: SessionState);

    /// Called once per whole second of recording, starting at 0.
    fn on_elapsed_tick(&self, seconds: u64);

    /// Called for errors that did not come back through a return value.
    fn on_error(&self, error: &RecorderError);

    /// Called when a recording is finalized and closed.
    fn on_recording_finished(&self, result: &RecordingResult);
}

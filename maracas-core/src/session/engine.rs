use std::rc::Rc;

use crate::models::audio_models::AudioSourceDescriptor;
use crate::models::config::RecorderConfiguration;
use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::{ConnectionState, SessionState};
use crate::session::connection::ConnectionManager;
use crate::session::recording::RecordingSession;
use crate::session::source_catalog::SourceCatalog;
use crate::traits::audio_server::{AudioServer, ServerEvent};
use crate::traits::engine_delegate::EngineDelegate;

/// Recording engine: connection, source catalog and one recording session
/// behind a single control surface.
///
/// The engine owns no threads. The host registers one repeating task that
/// calls `poll`; every state transition and every buffer is handled inside
/// those calls.
///
/// ```text
/// host timer → poll → [ConnectionManager] → ServerEvent → [SourceCatalog]
///                   → [RecordingSession] → StreamEvent → WAV file
/// ```
pub struct RecorderEngine<S: AudioServer> {
    // Declared first so a live session is finalized before the connection drops.
    session: RecordingSession<S>,
    catalog: SourceCatalog,
    connection: ConnectionManager<S>,
    last_tick: Option<u64>,
    delegate: Option<Rc<dyn EngineDelegate>>,
}

impl<S: AudioServer> RecorderEngine<S> {
    pub fn new(server: S, config: RecorderConfiguration) -> Result<Self, RecorderError> {
        config.validate().map_err(RecorderError::ConfigurationFailed)?;
        Ok(Self {
            session: RecordingSession::new(&config),
            catalog: SourceCatalog::new(),
            connection: ConnectionManager::new(server),
            last_tick: None,
            delegate: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Rc<dyn EngineDelegate>) {
        self.connection.set_delegate(Rc::clone(&delegate));
        self.catalog.set_delegate(Rc::clone(&delegate));
        self.session.set_delegate(Rc::clone(&delegate));
        self.delegate = Some(delegate);
    }

    pub fn connect(&mut self) -> Result<(), RecorderError> {
        self.connection.connect()
    }

    /// One non-blocking pass: iterate the server loop, apply its
    /// notifications in order, service the capture stream, emit the
    /// elapsed tick.
    ///
    /// Returns `Err` only for fatal connection errors. The live session is
    /// finalized first; the host should then exit.
    pub fn poll(&mut self) -> Result<(), RecorderError> {
        if let Err(e) = self.connection.iterate() {
            return Err(self.fail(e));
        }

        while let Some(event) = self.connection.next_event() {
            match event {
                ServerEvent::StateChanged(state) => {
                    if let Err(e) = self.connection.on_state_notification(state, &mut self.catalog) {
                        return Err(self.fail(e));
                    }
                }
                ServerEvent::SourceReported(descriptor) => self.catalog.on_source_reported(descriptor),
                ServerEvent::SourceListComplete => self.catalog.on_enumeration_complete(),
                ServerEvent::SourceListFailed(reason) => {
                    self.catalog.on_enumeration_failed(&reason);
                    self.report(&RecorderError::Server(reason));
                }
            }
        }

        if let Err(e) = self.session.service(self.connection.server()) {
            self.report(&e);
        }

        self.tick();
        Ok(())
    }

    /// Start recording the catalog entry at `index`.
    pub fn start_index(&mut self, index: usize) -> Result<(), RecorderError> {
        if !self.connection.is_ready() {
            return Err(RecorderError::NotConnected);
        }
        let source_id = self.catalog.select_by_index(index)?.id.clone();
        self.start_source(&source_id)
    }

    /// Start recording the source with server id `source_id`.
    pub fn start_source(&mut self, source_id: &str) -> Result<(), RecorderError> {
        if !self.connection.is_ready() {
            return Err(RecorderError::NotConnected);
        }
        self.session.start(self.connection.server_mut(), source_id)?;
        self.last_tick = None;
        Ok(())
    }

    /// Stop the live recording. `Ok(None)` when nothing was recording.
    pub fn stop(&mut self) -> Result<Option<RecordingResult>, RecorderError> {
        self.last_tick = None;
        self.session.stop()
    }

    /// Stop any recording, then disconnect from the server.
    pub fn shutdown(&mut self) -> Result<Option<RecordingResult>, RecorderError> {
        let result = self.stop();
        self.connection.disconnect();
        result
    }

    pub fn sources(&self) -> &[AudioSourceDescriptor] {
        self.catalog.sources()
    }

    pub fn default_source_index(&self) -> Option<usize> {
        self.catalog.default_index()
    }

    /// True between a `Ready` transition and the end of its enumeration.
    pub fn is_enumerating(&self) -> bool {
        self.catalog.is_enumerating()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &RecordingSession<S> {
        &self.session
    }

    // --- Internal helpers ---

    fn tick(&mut self) {
        let elapsed = match self.session.elapsed() {
            Some(elapsed) if self.session.state().is_recording() => elapsed,
            _ => {
                self.last_tick = None;
                return;
            }
        };
        let seconds = elapsed.as_secs();
        if self.last_tick == Some(seconds) {
            return;
        }
        self.last_tick = Some(seconds);
        if let Some(ref delegate) = self.delegate {
            delegate.on_elapsed_tick(seconds);
        }
    }

    fn fail(&mut self, error: RecorderError) -> RecorderError {
        self.report(&error);
        if let Err(e) = self.session.stop() {
            self.report(&e);
        }
        error
    }

    fn report(&self, error: &RecorderError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }
}

use std::rc::Rc;

use crate::models::error::RecorderError;
use crate::models::state::ConnectionState;
use crate::session::source_catalog::SourceCatalog;
use crate::traits::audio_server::{AudioServer, ServerEvent};
use crate::traits::engine_delegate::EngineDelegate;

/// Owns the audio-server connection and follows its state notifications.
///
/// The only transition the manager makes itself is the initial `connect`;
/// everything after that is driven by `ServerEvent::StateChanged`. Each
/// entry into `Ready` clears the catalog and requests a fresh source list.
/// `Failed` and `Terminated` are fatal: the manager reports them and the
/// host is expected to exit.
pub struct ConnectionManager<S: AudioServer> {
    server: S,
    state: ConnectionState,
    connect_requested: bool,
    delegate: Option<Rc<dyn EngineDelegate>>,
}

impl<S: AudioServer> ConnectionManager<S> {
    pub fn new(server: S) -> Self {
        Self {
            server,
            state: ConnectionState::Unconnected,
            connect_requested: false,
            delegate: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Rc<dyn EngineDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn server(&self) -> &S {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut S {
        &mut self.server
    }

    /// Start the handshake. Returns immediately; progress arrives through `poll`.
    pub fn connect(&mut self) -> Result<(), RecorderError> {
        if self.connect_requested {
            return Err(RecorderError::Server("connect already requested".into()));
        }
        self.server.connect().map_err(|e| {
            log::error!("connect failed: {}", e);
            RecorderError::ConnectionFailed(e.to_string())
        })?;
        self.connect_requested = true;
        log::info!("connecting to audio server");
        Ok(())
    }

    /// Run one non-blocking iteration of the server's event loop.
    pub fn iterate(&mut self) -> Result<(), RecorderError> {
        self.server.iterate()
    }

    pub fn next_event(&mut self) -> Option<ServerEvent> {
        self.server.next_event()
    }

    /// Apply one state notification.
    ///
    /// Returns `Err` with a fatal error when the connection failed or was
    /// terminated.
    pub fn on_state_notification(
        &mut self,
        state: ConnectionState,
        catalog: &mut SourceCatalog,
    ) -> Result<(), RecorderError> {
        if self.state.is_terminal() {
            log::warn!("connection notification {:?} after {:?}, ignoring", state, self.state);
            return Ok(());
        }

        log::info!("audio server connection: {:?} -> {:?}", self.state, state);
        self.state = state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_connection_state_changed(state);
        }

        match state {
            ConnectionState::Ready => {
                catalog.begin_enumeration();
                if let Err(e) = self.server.request_source_list() {
                    let reason = format!("{} ({})", e, self.server.last_error());
                    catalog.on_enumeration_failed(&reason);
                    if let Some(ref delegate) = self.delegate {
                        delegate.on_error(&e);
                    }
                }
                Ok(())
            }
            ConnectionState::Failed => {
                let reason = self.server.last_error();
                log::error!("audio server connection failed: {}", reason);
                Err(RecorderError::ConnectionFailed(reason))
            }
            ConnectionState::Terminated => {
                let reason = self.server.last_error();
                log::error!("audio server connection terminated: {}", reason);
                Err(RecorderError::ConnectionTerminated(reason))
            }
            _ => Ok(()),
        }
    }

    /// Disconnect from the server. Event-loop teardown and release follow
    /// when the manager is dropped.
    pub fn disconnect(&mut self) {
        if self.connect_requested {
            log::info!("disconnecting from audio server");
            self.server.disconnect();
            self.connect_requested = false;
        }
    }
}

//! PulseAudio connection over the libpulse standard mainloop.
//!
//! The mainloop is never run on its own thread. `iterate` performs one
//! non-blocking pass; context and introspection callbacks queue raw
//! markers that `next_event` turns into `ServerEvent`s afterwards, so no
//! engine code ever runs inside a libpulse callback.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use libpulse_binding as pulse;
use pulse::callbacks::ListResult;
use pulse::context::introspect::SourceInfo;
use pulse::context::{Context, FlagSet as ContextFlagSet, State as ContextState};
use pulse::error::PAErr;
use pulse::mainloop::standard::{IterateResult, Mainloop};
use pulse::sample::{Format, Spec};

use maracas_core::models::audio_models::{AudioSourceDescriptor, SampleSpec};
use maracas_core::models::config::RecorderConfiguration;
use maracas_core::models::error::RecorderError;
use maracas_core::models::state::ConnectionState;
use maracas_core::traits::audio_server::{AudioServer, ServerEvent};

use crate::stream::PulseStream;

enum RawEvent {
    /// The context state callback fired; the new state is read at drain time.
    StateChanged,
    Source(AudioSourceDescriptor),
    ListEnd,
    ListError,
}

/// PulseAudio client: one context on one standard mainloop.
pub struct PulseServer {
    // Field order is drop order: the context goes before its mainloop.
    context: Context,
    mainloop: Mainloop,
    raw: Rc<RefCell<VecDeque<RawEvent>>>,
    last_state: Option<ConnectionState>,
    stream_name: String,
}

impl PulseServer {
    /// Create the mainloop and a context announcing the configured
    /// application name. Nothing is sent to the server until `connect`.
    pub fn new(config: &RecorderConfiguration) -> Result<Self, RecorderError> {
        let mainloop = Mainloop::new()
            .ok_or_else(|| RecorderError::ConnectionFailed("failed to create mainloop".into()))?;
        let mut context = Context::new(&mainloop, &config.application_name)
            .ok_or_else(|| RecorderError::ConnectionFailed("failed to create context".into()))?;

        let raw = Rc::new(RefCell::new(VecDeque::new()));
        let queue = Rc::clone(&raw);
        context.set_state_callback(Some(Box::new(move || {
            queue.borrow_mut().push_back(RawEvent::StateChanged);
        })));

        Ok(Self {
            context,
            mainloop,
            raw,
            last_state: None,
            stream_name: config.stream_name.clone(),
        })
    }

    fn map_state(state: ContextState) -> ConnectionState {
        match state {
            ContextState::Unconnected => ConnectionState::Unconnected,
            ContextState::Connecting => ConnectionState::Connecting,
            ContextState::Authorizing => ConnectionState::Authorizing,
            ContextState::SettingName => ConnectionState::SettingName,
            ContextState::Ready => ConnectionState::Ready,
            ContextState::Failed => ConnectionState::Failed,
            ContextState::Terminated => ConnectionState::Terminated,
        }
    }

    fn describe(source: &SourceInfo) -> Option<AudioSourceDescriptor> {
        let id = source.name.as_ref()?.to_string();
        let display_name = source
            .description
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_else(|| id.clone());
        Some(AudioSourceDescriptor::new(id, display_name))
    }
}

/// Text for a libpulse error code.
pub(crate) fn error_text(err: PAErr) -> String {
    err.to_string().unwrap_or_else(|| format!("error code {}", err.0))
}

impl AudioServer for PulseServer {
    type Stream = PulseStream;

    fn connect(&mut self) -> Result<(), RecorderError> {
        self.context
            .connect(None, ContextFlagSet::NOFLAGS, None)
            .map_err(|e| RecorderError::ConnectionFailed(error_text(e)))
    }

    fn iterate(&mut self) -> Result<(), RecorderError> {
        match self.mainloop.iterate(false) {
            IterateResult::Success(_) => Ok(()),
            IterateResult::Quit(_) => Err(RecorderError::ConnectionTerminated("mainloop quit".into())),
            IterateResult::Err(e) => Err(RecorderError::ConnectionFailed(error_text(e))),
        }
    }

    fn next_event(&mut self) -> Option<ServerEvent> {
        loop {
            let raw = self.raw.borrow_mut().pop_front()?;
            match raw {
                RawEvent::StateChanged => {
                    let state = Self::map_state(self.context.get_state());
                    // Several callbacks may have fired during one iteration.
                    if self.last_state == Some(state) {
                        continue;
                    }
                    self.last_state = Some(state);
                    return Some(ServerEvent::StateChanged(state));
                }
                RawEvent::Source(descriptor) => return Some(ServerEvent::SourceReported(descriptor)),
                RawEvent::ListEnd => return Some(ServerEvent::SourceListComplete),
                RawEvent::ListError => return Some(ServerEvent::SourceListFailed(self.last_error())),
            }
        }
    }

    fn request_source_list(&mut self) -> Result<(), RecorderError> {
        let queue = Rc::clone(&self.raw);
        // The operation handle is not needed; the callback outlives it.
        let _op = self.context.introspect().get_source_info_list(move |result| {
            let event = match result {
                ListResult::Item(source) => match Self::describe(source) {
                    Some(descriptor) => RawEvent::Source(descriptor),
                    None => return,
                },
                ListResult::End => RawEvent::ListEnd,
                ListResult::Error => RawEvent::ListError,
            };
            queue.borrow_mut().push_back(event);
        });
        log::debug!("requested source list");
        Ok(())
    }

    fn create_stream(&mut self, source_id: &str, spec: &SampleSpec) -> Result<PulseStream, RecorderError> {
        let pa_spec = Spec {
            format: Format::S16le,
            rate: spec.sample_rate,
            channels: spec.channels as u8,
        };
        if !pa_spec.is_valid() {
            return Err(RecorderError::StreamFailed(format!("invalid sample spec {:?}", spec)));
        }
        PulseStream::connect(&mut self.context, &self.stream_name, &pa_spec, source_id)
    }

    fn last_error(&self) -> String {
        error_text(self.context.errno())
    }

    fn disconnect(&mut self) {
        self.context.disconnect();
    }
}

impl Drop for PulseServer {
    fn drop(&mut self) {
        self.context.set_state_callback(None);
        self.context.disconnect();
    }
}

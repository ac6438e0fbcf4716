//! PulseAudio record stream.
//!
//! Connected corked on creation; the session uncorks it once the stream
//! reports ready. Buffers are read in place with `peek` and handed back
//! with `discard`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use libpulse_binding as pulse;
use pulse::context::Context;
use pulse::sample::Spec;
use pulse::stream::{FlagSet as StreamFlagSet, PeekResult, State as PaStreamState, Stream};

use maracas_core::models::error::RecorderError;
use maracas_core::models::state::StreamState;
use maracas_core::traits::capture_stream::{CaptureStream, PeekedBuffer, StreamEvent};

use crate::server::error_text;

enum RawStreamEvent {
    StateChanged,
    Readable(usize),
}

pub struct PulseStream {
    stream: Stream,
    raw: Rc<RefCell<VecDeque<RawStreamEvent>>>,
    last_state: Option<StreamState>,
    /// Set while a non-empty peek is outstanding.
    peeked: bool,
    disconnected: bool,
}

impl PulseStream {
    pub(crate) fn connect(
        context: &mut Context,
        name: &str,
        spec: &Spec,
        source_id: &str,
    ) -> Result<Self, RecorderError> {
        let mut stream = Stream::new(context, name, spec, None)
            .ok_or_else(|| RecorderError::StreamFailed(error_text(context.errno())))?;

        let raw = Rc::new(RefCell::new(VecDeque::new()));
        let queue = Rc::clone(&raw);
        stream.set_state_callback(Some(Box::new(move || {
            queue.borrow_mut().push_back(RawStreamEvent::StateChanged);
        })));
        let queue = Rc::clone(&raw);
        stream.set_read_callback(Some(Box::new(move |len: usize| {
            queue.borrow_mut().push_back(RawStreamEvent::Readable(len));
        })));

        stream
            .connect_record(Some(source_id), None, StreamFlagSet::START_CORKED)
            .map_err(|e| RecorderError::StreamFailed(error_text(e)))?;
        log::debug!("record stream '{}' connecting to {}", name, source_id);

        Ok(Self {
            stream,
            raw,
            last_state: None,
            peeked: false,
            disconnected: false,
        })
    }

    /// libpulse panics on a cork request for a stream that is not ready.
    fn ensure_ready(&self, action: &str) -> Result<(), RecorderError> {
        match self.stream.get_state() {
            PaStreamState::Ready if !self.disconnected => Ok(()),
            state => Err(RecorderError::StreamFailed(format!(
                "cannot {} stream in state {:?}",
                action, state
            ))),
        }
    }

    fn map_state(state: PaStreamState) -> StreamState {
        match state {
            PaStreamState::Unconnected => StreamState::Uninitialized,
            PaStreamState::Creating => StreamState::Creating,
            PaStreamState::Ready => StreamState::Ready,
            PaStreamState::Failed => StreamState::Failed,
            PaStreamState::Terminated => StreamState::Terminated,
        }
    }
}

impl CaptureStream for PulseStream {
    fn take_events(&mut self) -> Vec<StreamEvent> {
        let raw: Vec<RawStreamEvent> = self.raw.borrow_mut().drain(..).collect();
        let mut events = Vec::with_capacity(raw.len());
        for event in raw {
            match event {
                RawStreamEvent::StateChanged => {
                    let state = Self::map_state(self.stream.get_state());
                    if self.last_state != Some(state) {
                        self.last_state = Some(state);
                        events.push(StreamEvent::StateChanged(state));
                    }
                }
                RawStreamEvent::Readable(len) => events.push(StreamEvent::Readable(len)),
            }
        }
        events
    }

    fn uncork(&mut self) -> Result<(), RecorderError> {
        self.ensure_ready("uncork")?;
        let _op = self.stream.uncork(None);
        Ok(())
    }

    fn cork(&mut self) -> Result<(), RecorderError> {
        self.ensure_ready("cork")?;
        let _op = self.stream.cork(None);
        Ok(())
    }

    fn peek(&mut self) -> Result<PeekedBuffer<'_>, RecorderError> {
        let result = self
            .stream
            .peek()
            .map_err(|e| RecorderError::Server(error_text(e)))?;
        self.peeked = !matches!(result, PeekResult::Empty);
        Ok(match result {
            PeekResult::Empty => PeekedBuffer::Empty,
            PeekResult::Hole(len) => PeekedBuffer::Hole(len),
            PeekResult::Data(bytes) => PeekedBuffer::Data(bytes),
        })
    }

    fn release(&mut self) -> Result<(), RecorderError> {
        // Discarding after an empty peek is an error in libpulse.
        if !self.peeked {
            return Ok(());
        }
        self.peeked = false;
        self.stream
            .discard()
            .map_err(|e| RecorderError::Server(error_text(e)))
    }

    fn disconnect(&mut self) -> Result<(), RecorderError> {
        if self.disconnected {
            return Ok(());
        }
        self.disconnected = true;
        self.stream
            .disconnect()
            .map_err(|e| RecorderError::Server(error_text(e)))
    }
}

impl Drop for PulseStream {
    fn drop(&mut self) {
        self.stream.set_state_callback(None);
        self.stream.set_read_callback(None);
        if self.disconnected {
            return;
        }
        if matches!(self.stream.get_state(), PaStreamState::Creating | PaStreamState::Ready) {
            if let Err(e) = self.stream.disconnect() {
                log::warn!("record stream disconnect on drop failed: {}", error_text(e));
            }
        }
    }
}

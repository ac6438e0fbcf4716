//! Scripted in-memory audio server for tests.
//!
//! The test keeps a `MockHandle` and pushes notifications and buffers into
//! shared queues; the engine under test owns the `MockServer`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::models::audio_models::{AudioSourceDescriptor, SampleSpec};
use crate::models::error::RecorderError;
use crate::models::state::{ConnectionState, StreamState};
use crate::traits::audio_server::{AudioServer, ServerEvent};
use crate::traits::capture_stream::{CaptureStream, PeekedBuffer, StreamEvent};

#[derive(Default)]
pub struct ServerShared {
    pub events: VecDeque<ServerEvent>,
    pub connect_calls: u32,
    pub list_requests: u32,
    pub disconnected: bool,
    pub fail_create: Option<String>,
    pub streams: Vec<Rc<RefCell<StreamShared>>>,
    pub created_for: Vec<String>,
}

#[derive(Default)]
pub struct StreamShared {
    pub events: VecDeque<StreamEvent>,
    pub buffers: VecDeque<Vec<u8>>,
    pub corked: bool,
    /// Set once a `Ready` notification has been taken; cork and uncork fail before that.
    pub ready: bool,
    pub peeks: u32,
    pub releases: u32,
    pub fail_next_peek: bool,
    pub disconnected: bool,
    /// Control calls in order, e.g. "uncork", "cork", "disconnect".
    pub calls: Vec<&'static str>,
}

#[derive(Clone, Default)]
pub struct MockHandle {
    shared: Rc<RefCell<ServerShared>>,
}

impl MockHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server(&self) -> MockServer {
        MockServer {
            shared: Rc::clone(&self.shared),
        }
    }

    pub fn push(&self, event: ServerEvent) {
        self.shared.borrow_mut().events.push_back(event);
    }

    /// Queue the full successful handshake.
    pub fn push_handshake(&self) {
        for state in [
            ConnectionState::Connecting,
            ConnectionState::Authorizing,
            ConnectionState::SettingName,
            ConnectionState::Ready,
        ] {
            self.push(ServerEvent::StateChanged(state));
        }
    }

    /// Queue a complete enumeration of `ids`.
    pub fn push_sources(&self, ids: &[&str]) {
        for id in ids {
            self.push(ServerEvent::SourceReported(AudioSourceDescriptor::new(
                *id,
                format!("{} (mock)", id),
            )));
        }
        self.push(ServerEvent::SourceListComplete);
    }

    pub fn fail_next_stream(&self, reason: &str) {
        self.shared.borrow_mut().fail_create = Some(reason.to_string());
    }

    pub fn stream(&self, index: usize) -> Rc<RefCell<StreamShared>> {
        Rc::clone(&self.shared.borrow().streams[index])
    }

    pub fn stream_count(&self) -> usize {
        self.shared.borrow().streams.len()
    }

    pub fn push_stream_state(&self, index: usize, state: StreamState) {
        self.stream(index)
            .borrow_mut()
            .events
            .push_back(StreamEvent::StateChanged(state));
    }

    pub fn push_buffer(&self, index: usize, bytes: Vec<u8>) {
        let stream = self.stream(index);
        let mut stream = stream.borrow_mut();
        stream.events.push_back(StreamEvent::Readable(bytes.len()));
        stream.buffers.push_back(bytes);
    }

    pub fn list_requests(&self) -> u32 {
        self.shared.borrow().list_requests
    }

    pub fn connect_calls(&self) -> u32 {
        self.shared.borrow().connect_calls
    }

    pub fn is_disconnected(&self) -> bool {
        self.shared.borrow().disconnected
    }

    pub fn created_for(&self) -> Vec<String> {
        self.shared.borrow().created_for.clone()
    }
}

pub struct MockServer {
    shared: Rc<RefCell<ServerShared>>,
}

impl AudioServer for MockServer {
    type Stream = MockStream;

    fn connect(&mut self) -> Result<(), RecorderError> {
        self.shared.borrow_mut().connect_calls += 1;
        Ok(())
    }

    fn iterate(&mut self) -> Result<(), RecorderError> {
        Ok(())
    }

    fn next_event(&mut self) -> Option<ServerEvent> {
        self.shared.borrow_mut().events.pop_front()
    }

    fn request_source_list(&mut self) -> Result<(), RecorderError> {
        self.shared.borrow_mut().list_requests += 1;
        Ok(())
    }

    fn create_stream(&mut self, source_id: &str, _spec: &SampleSpec) -> Result<MockStream, RecorderError> {
        let mut shared = self.shared.borrow_mut();
        if let Some(reason) = shared.fail_create.take() {
            return Err(RecorderError::StreamFailed(reason));
        }
        let stream = Rc::new(RefCell::new(StreamShared {
            corked: true,
            ..Default::default()
        }));
        shared.streams.push(Rc::clone(&stream));
        shared.created_for.push(source_id.to_string());
        Ok(MockStream {
            shared: stream,
            current: None,
        })
    }

    fn last_error(&self) -> String {
        "mock server error".into()
    }

    fn disconnect(&mut self) {
        self.shared.borrow_mut().disconnected = true;
    }
}

pub struct MockStream {
    shared: Rc<RefCell<StreamShared>>,
    current: Option<Vec<u8>>,
}

impl CaptureStream for MockStream {
    fn take_events(&mut self) -> Vec<StreamEvent> {
        let mut shared = self.shared.borrow_mut();
        let events: Vec<StreamEvent> = shared.events.drain(..).collect();
        for event in &events {
            if let StreamEvent::StateChanged(state) = event {
                shared.ready = *state == StreamState::Ready;
            }
        }
        events
    }

    fn uncork(&mut self) -> Result<(), RecorderError> {
        let mut shared = self.shared.borrow_mut();
        if !shared.ready {
            return Err(RecorderError::Server("uncork on a stream that is not ready".into()));
        }
        shared.corked = false;
        shared.calls.push("uncork");
        Ok(())
    }

    fn cork(&mut self) -> Result<(), RecorderError> {
        let mut shared = self.shared.borrow_mut();
        if !shared.ready {
            return Err(RecorderError::Server("cork on a stream that is not ready".into()));
        }
        shared.corked = true;
        shared.calls.push("cork");
        Ok(())
    }

    fn peek(&mut self) -> Result<PeekedBuffer<'_>, RecorderError> {
        {
            let mut shared = self.shared.borrow_mut();
            shared.peeks += 1;
            if shared.fail_next_peek {
                shared.fail_next_peek = false;
                return Err(RecorderError::Server("peek failed".into()));
            }
            self.current = shared.buffers.pop_front();
        }
        match self.current {
            Some(ref bytes) if bytes.is_empty() => Ok(PeekedBuffer::Hole(0)),
            Some(ref bytes) => Ok(PeekedBuffer::Data(bytes)),
            None => Ok(PeekedBuffer::Empty),
        }
    }

    fn release(&mut self) -> Result<(), RecorderError> {
        self.current = None;
        self.shared.borrow_mut().releases += 1;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), RecorderError> {
        let mut shared = self.shared.borrow_mut();
        shared.disconnected = true;
        shared.calls.push("disconnect");
        Ok(())
    }
}

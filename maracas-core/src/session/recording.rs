use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};

use crate::models::audio_models::SampleSpec;
use crate::models::config::RecorderConfiguration;
use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::{SessionState, StreamState};
use crate::storage::filename::{self, FilenameAllocator};
use crate::storage::wav_writer::{self, WavFileWriter};
use crate::traits::audio_server::AudioServer;
use crate::traits::capture_stream::{CaptureStream, PeekedBuffer, StreamEvent};
use crate::traits::engine_delegate::EngineDelegate;

type FileWriter = WavFileWriter<File>;

/// Counters from one pass over a stream's queued buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub buffers: u32,
    pub bytes_written: u64,
    pub write_failures: u32,
}

/// One recording: one capture stream feeding one WAV file.
///
/// ```text
/// [CaptureStream] → peek → [WavFileWriter] → <dir>/<timestamp>_<n>.wav
///                    └── release (always)
/// ```
///
/// The session exclusively owns the stream and the file handle. Both are
/// released when the session returns to `Idle`, whichever path it takes.
pub struct RecordingSession<S: AudioServer> {
    state: SessionState,
    spec: SampleSpec,
    output_directory: Option<PathBuf>,
    allocator: FilenameAllocator,
    source_id: String,
    output_path: Option<PathBuf>,
    bytes_written: u64,
    started_at: Option<Instant>,
    stream: Option<S::Stream>,
    writer: Option<FileWriter>,
    delegate: Option<Rc<dyn EngineDelegate>>,
}

impl<S: AudioServer> RecordingSession<S> {
    pub fn new(config: &RecorderConfiguration) -> Self {
        Self {
            state: SessionState::Idle,
            spec: SampleSpec::CAPTURE,
            output_directory: config.output_directory.clone(),
            allocator: FilenameAllocator::new(),
            source_id: String::new(),
            output_path: None,
            bytes_written: 0,
            started_at: None,
            stream: None,
            writer: None,
            delegate: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Rc<dyn EngineDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn source_id(&self) -> Option<&str> {
        if self.state.is_idle() {
            None
        } else {
            Some(&self.source_id)
        }
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Audio bytes written to the current file, header excluded.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Time since the stream started delivering, if it has.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|t| t.elapsed())
    }

    /// Open a file and a corked capture stream on `source_id`.
    ///
    /// Transitions: idle → starting. The session reaches `Recording` once
    /// the stream reports ready during a later `service` call.
    pub fn start(&mut self, server: &mut S, source_id: &str) -> Result<(), RecorderError> {
        self.start_at(server, source_id, &Local::now().naive_local())
    }

    fn start_at(&mut self, server: &mut S, source_id: &str, now: &NaiveDateTime) -> Result<(), RecorderError> {
        if !self.state.is_idle() {
            return Err(RecorderError::SessionBusy);
        }
        if source_id.trim().is_empty() {
            return Err(RecorderError::EmptySourceId);
        }

        self.set_state(SessionState::Starting);
        self.source_id = source_id.to_string();
        self.bytes_written = 0;
        self.started_at = None;

        let path = match self.allocate_path(now) {
            Ok(path) => path,
            Err(e) => {
                log::error!("cannot allocate output file: {}", e);
                self.abandon();
                return Err(e);
            }
        };

        let writer = match WavFileWriter::create_new(&path, self.spec) {
            Ok(writer) => writer,
            Err(e) => {
                log::error!("cannot open {}: {}", path.display(), e);
                self.abandon();
                return Err(e);
            }
        };
        log::info!("recording {} into {}", source_id, path.display());
        self.output_path = Some(path);
        self.writer = Some(writer);

        match server.create_stream(source_id, &self.spec) {
            Ok(stream) => {
                self.stream = Some(stream);
                Ok(())
            }
            Err(e) => {
                log::error!("cannot create capture stream on {}: {}", source_id, e);
                self.abandon();
                Err(match e {
                    RecorderError::StreamFailed(_) => e,
                    other => RecorderError::StreamFailed(other.to_string()),
                })
            }
        }
    }

    /// Handle queued stream notifications: readiness, failure and data.
    ///
    /// Returns `Err` when the stream failed and the session fell back to
    /// `Idle`. Notifications for a stream that is already gone are ignored.
    pub fn service(&mut self, server: &S) -> Result<(), RecorderError> {
        let events = match self.stream.as_mut() {
            Some(stream) => stream.take_events(),
            None => return Ok(()),
        };

        for event in events {
            match event {
                StreamEvent::StateChanged(StreamState::Ready) => self.on_stream_ready()?,
                StreamEvent::StateChanged(state) if state.is_terminal() => {
                    let reason = server.last_error();
                    log::error!("capture stream {:?}: {}", state, reason);
                    self.abandon();
                    return Err(RecorderError::StreamFailed(reason));
                }
                StreamEvent::StateChanged(state) => {
                    log::debug!("capture stream state: {:?}", state);
                }
                StreamEvent::Readable(hint) => {
                    log::trace!("{} bytes readable", hint);
                    self.drain();
                }
            }
        }
        Ok(())
    }

    /// Cork, disconnect, finalize and close.
    ///
    /// Transitions: starting/recording → stopping → idle. Calling it while
    /// idle does nothing and returns `Ok(None)`.
    pub fn stop(&mut self) -> Result<Option<RecordingResult>, RecorderError> {
        if !matches!(self.state, SessionState::Starting | SessionState::Recording) {
            log::debug!("stop requested while {:?}, nothing to do", self.state);
            return Ok(None);
        }

        // A stream still starting up was never uncorked.
        let uncorked = self.state.is_recording();
        self.set_state(SessionState::Stopping);
        let duration = self.elapsed().map(|d| d.as_secs_f64()).unwrap_or(0.0);

        if let Some(mut stream) = self.stream.take() {
            if uncorked {
                if let Err(e) = stream.cork() {
                    log::warn!("cork before stop failed: {}", e);
                }
            }
            if let Err(e) = stream.disconnect() {
                log::warn!("stream disconnect failed: {}", e);
            }
        }

        let writer = self.writer.take();
        let path = self.output_path.take();
        self.started_at = None;

        let outcome = match (writer, path) {
            (Some(writer), Some(path)) => {
                finish_file(writer, path, &self.source_id, self.bytes_written, duration)
            }
            _ => Err(RecorderError::StorageError("no open output file".into())),
        };

        self.set_state(SessionState::Idle);

        let result = outcome?;
        log::info!(
            "recording finished: {} ({} audio bytes, {:.1}s)",
            result.file_path.display(),
            result.audio_bytes,
            result.duration_secs
        );
        if let Some(ref delegate) = self.delegate {
            delegate.on_recording_finished(&result);
        }
        Ok(Some(result))
    }

    // --- Internal helpers ---

    fn set_state(&mut self, new_state: SessionState) {
        if self.state == new_state {
            return;
        }
        log::debug!("session: {:?} -> {:?}", self.state, new_state);
        self.state = new_state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_session_state_changed(new_state);
        }
    }

    fn allocate_path(&self, now: &NaiveDateTime) -> Result<PathBuf, RecorderError> {
        let preferred = filename::preferred_directory(self.output_directory.as_deref());
        let attempt = match preferred {
            Some(dir) => self.allocator.allocate(&dir, now),
            None => Err(RecorderError::NoDirectory("no desktop directory".into())),
        };
        match attempt {
            Err(RecorderError::NoDirectory(reason)) => {
                log::warn!("{}, falling back to the current directory", reason);
                let cwd = filename::fallback_directory()?;
                self.allocator.allocate(&cwd, now)
            }
            other => other,
        }
    }

    fn on_stream_ready(&mut self) -> Result<(), RecorderError> {
        if self.state != SessionState::Starting {
            log::debug!("stream ready while {:?}, ignoring", self.state);
            return Ok(());
        }
        let uncorked = match self.stream.as_mut() {
            Some(stream) => stream.uncork(),
            None => return Ok(()),
        };
        if let Err(e) = uncorked {
            log::error!("uncork failed: {}", e);
            self.abandon();
            return Err(RecorderError::StreamFailed(e.to_string()));
        }
        log::info!("capture stream ready, recording");
        self.started_at = Some(Instant::now());
        self.set_state(SessionState::Recording);
        Ok(())
    }

    fn drain(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        let sink = if self.state.is_recording() {
            self.writer.as_mut()
        } else {
            None
        };
        let stats = drain_stream(stream, sink);
        log::trace!(
            "drained {} buffer(s), {} bytes, {} failed",
            stats.buffers,
            stats.bytes_written,
            stats.write_failures
        );
        self.bytes_written += stats.bytes_written;
    }

    /// Release stream and file without finalizing; the file keeps its
    /// placeholder header.
    fn abandon(&mut self) {
        self.stream = None;
        if self.writer.take().is_some() {
            if let Some(ref path) = self.output_path {
                log::warn!("leaving unfinalized file {}", path.display());
            }
        }
        self.output_path = None;
        self.started_at = None;
        self.set_state(SessionState::Idle);
    }
}

impl<S: AudioServer> Drop for RecordingSession<S> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("failed to finalize recording on drop: {}", e);
        }
    }
}

/// Peek and release every queued buffer, appending data to `sink` if given.
///
/// Each peek is followed by a release no matter what the peek returned or
/// whether the write succeeded. Write failures are logged and skipped.
pub fn drain_stream<C, W>(stream: &mut C, mut sink: Option<&mut WavFileWriter<W>>) -> DrainStats
where
    C: CaptureStream,
    W: Write + Seek,
{
    let mut stats = DrainStats::default();
    loop {
        let more = match stream.peek() {
            Ok(PeekedBuffer::Data(bytes)) => {
                stats.buffers += 1;
                if let Some(writer) = sink.as_deref_mut() {
                    match writer.append(bytes) {
                        Ok(()) => stats.bytes_written += bytes.len() as u64,
                        Err(e) => {
                            stats.write_failures += 1;
                            log::error!("dropping {} bytes: {}", bytes.len(), e);
                        }
                    }
                }
                true
            }
            Ok(PeekedBuffer::Hole(len)) => {
                log::debug!("stream hole of {} bytes", len);
                true
            }
            Ok(PeekedBuffer::Empty) => false,
            Err(e) => {
                log::error!("peek failed: {}", e);
                false
            }
        };
        if let Err(e) = stream.release() {
            log::error!("release failed: {}", e);
            break;
        }
        if !more {
            break;
        }
    }
    stats
}

fn finish_file(
    mut writer: FileWriter,
    path: PathBuf,
    source_id: &str,
    audio_bytes: u64,
    duration_secs: f64,
) -> Result<RecordingResult, RecorderError> {
    writer.finalize()?;
    writer.close()?;
    let checksum = wav_writer::sha256_file(&path)?;
    Ok(RecordingResult::new(path, source_id, audio_bytes, duration_secs, checksum))
}

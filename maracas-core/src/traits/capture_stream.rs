use crate::models::error::RecorderError;
use crate::models::state::StreamState;

/// A notification from a capture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    StateChanged(StreamState),
    /// Data is waiting; the argument is the size hint from the server.
    Readable(usize),
}

/// Result of peeking at the head of a stream's buffer queue.
#[derive(Debug, PartialEq, Eq)]
pub enum PeekedBuffer<'a> {
    /// Nothing queued.
    Empty,
    /// The server dropped this many bytes; there is nothing to write.
    Hole(usize),
    /// Borrowed view into the server's buffer, valid until `release`.
    Data(&'a [u8]),
}

/// One record stream against one input source.
///
/// Dropping the stream releases it on the server side.
pub trait CaptureStream {
    /// Queued state and data notifications, in arrival order.
    fn take_events(&mut self) -> Vec<StreamEvent>;

    /// Resume buffer delivery.
    fn uncork(&mut self) -> Result<(), RecorderError>;

    /// Pause buffer delivery without tearing the stream down.
    fn cork(&mut self) -> Result<(), RecorderError>;

    /// Read the next buffer without copying it.
    fn peek(&mut self) -> Result<PeekedBuffer<'_>, RecorderError>;

    /// Hand the peeked buffer back. Must follow every `peek`, whatever it
    /// returned, or delivery stalls. A release with nothing peeked is a no-op.
    fn release(&mut self) -> Result<(), RecorderError>;

    /// Disconnect from the source.
    fn disconnect(&mut self) -> Result<(), RecorderError>;
}

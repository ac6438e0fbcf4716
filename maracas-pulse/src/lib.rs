//! # maracas-pulse
//!
//! PulseAudio backend for the maracas recording engine.
//!
//! Provides:
//! - `PulseServer`: context on a libpulse standard mainloop, iterated by the host
//! - `PulseStream`: corked record stream read with peek/discard
//!
//! ## Build Requirements
//! - `libpulse` development files, enabled with `--features pulse`
//!
//! ## Usage
//! ```ignore
//! use maracas_core::{RecorderConfiguration, RecorderEngine};
//! use maracas_pulse::PulseServer;
//!
//! let config = RecorderConfiguration::default();
//! let server = PulseServer::new(&config)?;
//! let mut engine = RecorderEngine::new(server, config)?;
//! engine.connect()?;
//! loop {
//!     engine.poll()?;
//! }
//! ```

#[cfg(feature = "pulse")]
pub mod server;
#[cfg(feature = "pulse")]
pub mod stream;

#[cfg(feature = "pulse")]
pub use server::PulseServer;
#[cfg(feature = "pulse")]
pub use stream::PulseStream;

pub mod audio_server;
pub mod capture_stream;
pub mod engine_delegate;

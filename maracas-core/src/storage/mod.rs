pub mod filename;
pub mod wav_writer;

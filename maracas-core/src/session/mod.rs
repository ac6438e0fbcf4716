pub mod connection;
pub mod engine;
#[cfg(test)]
pub mod mock;
pub mod recording;
pub mod source_catalog;

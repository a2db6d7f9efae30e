//! ascii-stream library crate.
//!
//! Converts video into ASCII-art frame sequences and shares them through
//! short-lived, in-memory stream sessions playable from any terminal.

pub mod ascii;
pub mod config;
pub mod pipeline;
pub mod player;
pub mod resolver;
pub mod server;
pub mod stream;

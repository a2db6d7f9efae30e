//! Ephemeral stream sharing.
//!
//! A [`StreamStore`] keeps shared frame sequences in memory under random
//! ids and expires them after a TTL; [`render_script`] turns a session into
//! a bash script that plays it in any terminal.

mod script;
mod session;
mod store;

pub use script::render_script;
pub use session::{StreamId, StreamMetadata, StreamSession};
pub use store::{Reaper, StreamError, StreamStore, DEFAULT_REAP_INTERVAL, DEFAULT_TTL};

/// Frame rate used when a share request does not give one.
pub const DEFAULT_FRAME_RATE: f64 = 24.0;

/// Title used when a share request does not give one.
pub const DEFAULT_TITLE: &str = "ASCII Video";

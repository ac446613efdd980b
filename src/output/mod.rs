//! Video output module
//!
//! Encodes BGR24 frames with a default or user-selected encoder and muxes
//! them into a file whose container is guessed from its path.

mod recorder;

pub use recorder::{choose_pixel_format, Recorder, RecorderSettings};

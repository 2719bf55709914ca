//! # Playback
//!
//! A minimal video output loop: decoded frames in, filtered frames out.

pub mod engine;

pub use engine::{PlaybackEngine, PlaybackReport};

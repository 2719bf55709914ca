//! # Motion Blur
//!
//! A temporal blur filter for planar YUV video.
//!
//! Every output frame is the incoming frame blended over the previous output
//! with fixed-point weights, leaving fading trails behind moving objects. The
//! filter sits between a decoder and a video output, borrowing its buffers
//! from the output's pool.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use motion_blur::{
//!     filter::{CancelToken, MotionBlurFilter},
//!     playback::PlaybackEngine,
//!     video::{Chroma, FrameGeometry, SyntheticSource},
//!     Config,
//! };
//!
//! # fn main() -> motion_blur::Result<()> {
//! let config = Config::default();
//! let geometry = FrameGeometry::new(320, 240, Chroma::I420);
//! let cancel = CancelToken::new();
//!
//! let filter = MotionBlurFilter::new(&config, cancel.clone());
//! let mut engine = PlaybackEngine::new(&config, Box::new(filter), geometry, cancel)?;
//! engine.play_frames(SyntheticSource::new(geometry, 40_000).take(25), |frame| {
//!     println!("displayed frame at {} us", frame.pts());
//!     Ok(())
//! })?;
//! engine.finish();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`video`] - Planar frames, the output pool contract, RGB conversion
//! - [`filter`] - Blend engine, frame copier and the motion blur state machine
//! - [`playback`] - Output loop driving a filter frame by frame
//! - [`config`] - Configuration management

pub mod config;
pub mod error;
pub mod filter;
pub mod playback;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{BlurError, Result},
    filter::{BlendFactor, MotionBlurFilter, VideoFilter},
    playback::PlaybackEngine,
};

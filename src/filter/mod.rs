//! # Video Filters
//!
//! Per-frame filters driven by the playback thread. The motion blur filter
//! keeps the previous output and blends every new frame over it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use motion_blur::filter::{CancelToken, MotionBlurFilter, VideoFilter};
//! use motion_blur::video::{Chroma, FrameGeometry, FramePool};
//! use motion_blur::Config;
//!
//! # fn main() -> motion_blur::Result<()> {
//! let geometry = FrameGeometry::new(640, 480, Chroma::I420);
//! let pool = Arc::new(FramePool::new(geometry, 8));
//!
//! let mut filter = MotionBlurFilter::new(&Config::default(), CancelToken::new());
//! filter.init(&geometry, &FramePool::shared_factory(Arc::clone(&pool)))?;
//! # Ok(())
//! # }
//! ```

pub mod blend;
pub mod copy;
pub mod direct;
pub mod motion_blur;
pub mod retry;
pub mod traits;

pub use blend::{blend_frames, BlendFactor};
pub use copy::copy_frame;
pub use motion_blur::{FilterState, FilterStats, MotionBlurFilter};
pub use retry::{acquire_with_retry, CancelToken, RetryPolicy};
pub use traits::{RenderOutcome, VideoFilter};

//! # Video Frames
//!
//! Planar frame types, the output pool contract, RGB conversion and a
//! synthetic frame source.

pub mod convert;
pub mod pool;
pub mod synthetic;
pub mod types;

pub use convert::{frame_from_rgb, frame_to_rgb, write_rgb};
pub use pool::{BufferRequest, FramePool, OutputSink, PoolStats, SinkFactory};
pub use synthetic::SyntheticSource;
pub use types::{Chroma, Frame, FrameGeometry, Plane, ASPECT_FACTOR, PITCH_ALIGN};

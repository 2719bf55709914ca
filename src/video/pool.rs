//! Output buffer pool contract and an in-memory implementation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::{
    error::{FilterError, Result},
    video::types::{Chroma, Frame, FrameGeometry},
};

/// Buffer dimensions asked of a sink
///
/// Zero width, zero height and no chroma mean "the negotiated geometry".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferRequest {
    pub width: u32,
    pub height: u32,
    pub chroma: Option<Chroma>,
}

impl BufferRequest {
    pub fn negotiated() -> Self {
        Self::default()
    }

    pub fn is_negotiated(&self) -> bool {
        self.width == 0 && self.height == 0 && self.chroma.is_none()
    }

    /// Fill unspecified fields from `geometry`
    pub fn resolve(&self, geometry: &FrameGeometry) -> FrameGeometry {
        let width = if self.width == 0 { geometry.width } else { self.width };
        let height = if self.height == 0 { geometry.height } else { self.height };
        let chroma = self.chroma.unwrap_or(geometry.chroma);
        if (width, height, chroma) == (geometry.width, geometry.height, geometry.chroma) {
            *geometry
        } else {
            FrameGeometry::new(width, height, chroma)
        }
    }
}

/// Downstream video output: hands out buffers and displays finished frames
///
/// Implementations synchronize internally; every method takes `&self`.
pub trait OutputSink: Send {
    /// Geometry negotiated when the sink was created
    fn geometry(&self) -> FrameGeometry;

    /// A free buffer, or `None` while all buffers are in use
    fn acquire(&self, request: BufferRequest) -> Option<Frame>;

    /// Return an unused buffer
    fn release(&self, frame: Frame);

    /// Queue a finished frame for display
    fn display(&self, frame: Frame);
}

impl<S: OutputSink + Sync + ?Sized> OutputSink for Arc<S> {
    fn geometry(&self) -> FrameGeometry {
        (**self).geometry()
    }

    fn acquire(&self, request: BufferRequest) -> Option<Frame> {
        (**self).acquire(request)
    }

    fn release(&self, frame: Frame) {
        (**self).release(frame)
    }

    fn display(&self, frame: Frame) {
        (**self).display(frame)
    }
}

/// Creates the output sink a filter renders into
pub trait SinkFactory {
    fn create_sink(&self, geometry: &FrameGeometry) -> Result<Box<dyn OutputSink>>;
}

impl<F> SinkFactory for F
where
    F: Fn(&FrameGeometry) -> Result<Box<dyn OutputSink>>,
{
    fn create_sink(&self, geometry: &FrameGeometry) -> Result<Box<dyn OutputSink>> {
        self(geometry)
    }
}

/// Counters kept by [`FramePool`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub allocated: u64,
    pub acquired: u64,
    pub exhausted: u64,
    pub released: u64,
    pub displayed: u64,
    pub recycled: u64,
}

#[derive(Default)]
struct PoolState {
    free: Vec<Frame>,
    outstanding: usize,
    displayed: VecDeque<Frame>,
    stats: PoolStats,
}

/// Bounded buffer pool with a display queue
///
/// At most `capacity` buffers are out at once, counting frames waiting in the
/// display queue. A displayed frame is given back with [`FramePool::recycle`].
pub struct FramePool {
    geometry: FrameGeometry,
    capacity: usize,
    state: Mutex<PoolState>,
}

impl FramePool {
    pub fn new(geometry: FrameGeometry, capacity: usize) -> Self {
        debug!("Created frame pool: {} x {} buffers", geometry, capacity);
        Self {
            geometry,
            capacity,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Buffers currently held outside the pool, including queued displays
    pub fn outstanding(&self) -> usize {
        self.state().outstanding
    }

    /// Number of frames waiting in the display queue
    pub fn pending_display(&self) -> usize {
        self.state().displayed.len()
    }

    /// Drain the display queue in submission order
    pub fn take_displayed(&self) -> Vec<Frame> {
        self.state().displayed.drain(..).collect()
    }

    /// Give back a frame obtained from [`FramePool::take_displayed`]
    pub fn recycle(&self, frame: Frame) {
        let mut state = self.state();
        state.stats.recycled += 1;
        Self::give_back(&mut state, frame);
    }

    pub fn stats(&self) -> PoolStats {
        self.state().stats
    }

    /// A factory that hands out this pool when asked for its geometry
    pub fn shared_factory(pool: Arc<FramePool>) -> impl SinkFactory {
        move |geometry: &FrameGeometry| -> Result<Box<dyn OutputSink>> {
            if *geometry != pool.geometry {
                return Err(FilterError::SinkCreationFailed {
                    reason: format!("pool is {}, requested {}", pool.geometry, geometry),
                }
                .into());
            }
            Ok(Box::new(Arc::clone(&pool)))
        }
    }

    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn give_back(state: &mut PoolState, frame: Frame) {
        if state.outstanding == 0 {
            warn!("Frame returned to a pool with no outstanding buffers, discarding");
            return;
        }
        state.outstanding -= 1;
        state.free.push(frame);
    }
}

impl OutputSink for FramePool {
    fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    fn acquire(&self, request: BufferRequest) -> Option<Frame> {
        let mut state = self.state();
        if state.outstanding >= self.capacity {
            state.stats.exhausted += 1;
            return None;
        }

        let wanted = if request.is_negotiated() {
            self.geometry
        } else {
            request.resolve(&self.geometry)
        };
        let frame = match state.free.iter().position(|f| wanted.matches(f)) {
            Some(index) => state.free.swap_remove(index),
            None => {
                state.stats.allocated += 1;
                Frame::new(&wanted)
            }
        };
        state.outstanding += 1;
        state.stats.acquired += 1;
        Some(frame)
    }

    fn release(&self, frame: Frame) {
        let mut state = self.state();
        state.stats.released += 1;
        Self::give_back(&mut state, frame);
    }

    fn display(&self, frame: Frame) {
        let mut state = self.state();
        state.stats.displayed += 1;
        state.displayed.push_back(frame);
    }
}

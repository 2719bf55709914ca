use crate::{
    error::Result,
    video::{Frame, FrameGeometry, SinkFactory},
};

/// Outcome of a single render call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// A frame was submitted to the sink
    Displayed,
    /// Cancellation was observed while waiting for a buffer; nothing was shown
    Dropped,
}

/// Core trait for per-frame video filters driven by the playback thread
pub trait VideoFilter: Send {
    /// Returns the unique name of this filter
    fn name(&self) -> &str;

    /// Returns a human-readable description of this filter
    fn description(&self) -> &str;

    /// Negotiate the output for a stream of `render` frames and create the sink
    ///
    /// # Returns
    ///
    /// The geometry of the frames the filter will display.
    fn init(&mut self, render: &FrameGeometry, factory: &dyn SinkFactory) -> Result<FrameGeometry>;

    /// Process one decoded frame
    fn render(&mut self, input: &Frame) -> Result<RenderOutcome>;

    /// Release every buffer the filter holds. Safe to call more than once.
    fn end(&mut self);

    /// A preallocated input buffer, if the filter keeps any
    fn input_buffer(&mut self) -> Option<Frame> {
        None
    }

    /// Give back a buffer obtained from [`VideoFilter::input_buffer`]
    fn recycle_input(&mut self, frame: Frame) {
        let _ = frame;
    }
}

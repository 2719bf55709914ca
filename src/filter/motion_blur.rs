use std::fmt;

use tracing::{debug, error, info};

use crate::{
    config::Config,
    error::{FilterError, Result},
    filter::{
        blend::{blend_frames, BlendFactor},
        copy::copy_frame,
        direct::DirectBuffers,
        retry::{acquire_with_retry, CancelToken, RetryPolicy},
        traits::{RenderOutcome, VideoFilter},
    },
    video::{Frame, FrameGeometry, OutputSink, SinkFactory},
};

/// Lifecycle of a [`MotionBlurFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Uninitialized,
    AwaitingFirstFrame,
    Steady,
    Terminated,
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterState::Uninitialized => "uninitialized",
            FilterState::AwaitingFirstFrame => "awaiting-first-frame",
            FilterState::Steady => "steady",
            FilterState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Counters kept across render calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub frames_displayed: u64,
    pub frames_dropped: u64,
    pub acquire_retries: u64,
}

/// Temporal blur: each output is the new frame blended over the previous output
///
/// The filter keeps one retained frame, a copy of the last displayed output.
/// The first frame after init passes through unchanged; every later frame is
/// blended with the retained one using the configured [`BlendFactor`].
pub struct MotionBlurFilter {
    factor: BlendFactor,
    retry: RetryPolicy,
    direct_buffer_count: usize,
    cancel: CancelToken,
    state: FilterState,
    output: Option<FrameGeometry>,
    sink: Option<Box<dyn OutputSink>>,
    retained: Option<Frame>,
    direct: DirectBuffers,
    stats: FilterStats,
}

impl MotionBlurFilter {
    pub const NAME: &'static str = "motionblur";

    /// Create a filter from configuration; the blur factor is fixed from here on
    pub fn new(config: &Config, cancel: CancelToken) -> Self {
        Self::with_factor(BlendFactor::new(config.filter.blur_factor), cancel)
            .with_retry(RetryPolicy::from(&config.pool))
            .with_direct_buffers(config.filter.direct_buffers)
    }

    pub fn with_factor(factor: BlendFactor, cancel: CancelToken) -> Self {
        Self {
            factor,
            retry: RetryPolicy::default(),
            direct_buffer_count: 0,
            cancel,
            state: FilterState::Uninitialized,
            output: None,
            sink: None,
            retained: None,
            direct: DirectBuffers::default(),
            stats: FilterStats::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_direct_buffers(mut self, count: usize) -> Self {
        self.direct_buffer_count = count;
        self
    }

    pub fn factor(&self) -> BlendFactor {
        self.factor
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Negotiated output geometry, once initialized
    pub fn output_geometry(&self) -> Option<FrameGeometry> {
        self.output
    }

    /// The copy of the last displayed output
    pub fn retained_frame(&self) -> Option<&Frame> {
        self.retained.as_ref()
    }

    /// Input buffers not currently checked out
    pub fn available_input_buffers(&self) -> usize {
        self.direct.available()
    }

    fn first_frame(&mut self, input: &Frame, mut out: Frame) -> Result<RenderOutcome> {
        let Some(sink) = self.sink.as_deref() else {
            return Err(FilterError::NotInitialized.into());
        };

        let Some(mut retained) =
            acquire_with_retry(sink, &self.cancel, &self.retry, &mut self.stats.acquire_retries)
        else {
            sink.release(out);
            self.stats.frames_dropped += 1;
            debug!("Cancelled while waiting for the retained frame buffer");
            return Ok(RenderOutcome::Dropped);
        };

        if let Err(e) = copy_frame(&mut retained, input).and_then(|_| copy_frame(&mut out, input)) {
            sink.release(out);
            sink.release(retained);
            return Err(e);
        }

        sink.display(out);
        self.retained = Some(retained);
        self.state = FilterState::Steady;
        self.stats.frames_displayed += 1;
        debug!("First frame passed through at pts {}", input.pts());
        Ok(RenderOutcome::Displayed)
    }

    fn blended_frame(&mut self, input: &Frame, mut out: Frame, previous: Frame) -> Result<RenderOutcome> {
        let Some(sink) = self.sink.as_deref() else {
            return Err(FilterError::NotInitialized.into());
        };

        if let Err(e) = blend_frames(&previous, input, &mut out, self.factor) {
            sink.release(out);
            self.retained = Some(previous);
            return Err(e);
        }
        sink.release(previous);

        let Some(mut retained) =
            acquire_with_retry(sink, &self.cancel, &self.retry, &mut self.stats.acquire_retries)
        else {
            sink.release(out);
            self.state = FilterState::AwaitingFirstFrame;
            self.stats.frames_dropped += 1;
            debug!("Cancelled while waiting for the retained frame buffer");
            return Ok(RenderOutcome::Dropped);
        };

        if let Err(e) = copy_frame(&mut retained, &out) {
            sink.release(out);
            sink.release(retained);
            self.state = FilterState::AwaitingFirstFrame;
            return Err(e);
        }

        sink.display(out);
        self.retained = Some(retained);
        self.stats.frames_displayed += 1;
        Ok(RenderOutcome::Displayed)
    }
}

impl VideoFilter for MotionBlurFilter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Motion blur filter: blends each frame with the previous output"
    }

    fn init(&mut self, render: &FrameGeometry, factory: &dyn SinkFactory) -> Result<FrameGeometry> {
        if self.state != FilterState::Uninitialized {
            return Err(FilterError::InvalidState {
                state: self.state.to_string(),
            }
            .into());
        }

        if !render.chroma.is_planar_yuv() {
            debug!("Cannot handle {} input", render.chroma);
            return Err(FilterError::UnsupportedFormat {
                chroma: render.chroma.to_string(),
            }
            .into());
        }
        render.validate()?;

        // output mirrors the input exactly
        let output = *render;

        debug!("Spawning the real video output for {}", output);
        let sink = factory.create_sink(&output).map_err(|e| {
            error!("Cannot open video output, aborting: {}", e);
            FilterError::SinkCreationFailed {
                reason: e.to_string(),
            }
        })?;

        self.direct = DirectBuffers::allocate(&output, self.direct_buffer_count);
        self.sink = Some(sink);
        self.output = Some(output);
        self.state = FilterState::AwaitingFirstFrame;

        info!(
            "Motion blur ready: {} (aspect {}), blur factor {}",
            output,
            output.aspect,
            self.factor.value()
        );
        Ok(output)
    }

    fn render(&mut self, input: &Frame) -> Result<RenderOutcome> {
        match self.state {
            FilterState::Uninitialized => return Err(FilterError::NotInitialized.into()),
            FilterState::Terminated => return Err(FilterError::Terminated.into()),
            FilterState::AwaitingFirstFrame | FilterState::Steady => {}
        }

        let (Some(output), Some(sink)) = (self.output, self.sink.as_deref()) else {
            return Err(FilterError::NotInitialized.into());
        };
        if !output.matches(input) {
            return Err(FilterError::InputMismatch {
                expected: output.to_string(),
                found: format!("{}x{} {}", input.width(), input.height(), input.chroma()),
            }
            .into());
        }
        output.check_planes(input)?;

        let Some(mut out) =
            acquire_with_retry(sink, &self.cancel, &self.retry, &mut self.stats.acquire_retries)
        else {
            self.stats.frames_dropped += 1;
            debug!("Cancelled while waiting for an output buffer, dropping frame");
            return Ok(RenderOutcome::Dropped);
        };
        out.set_pts(input.pts());

        match self.retained.take() {
            None => self.first_frame(input, out),
            Some(previous) => self.blended_frame(input, out, previous),
        }
    }

    fn end(&mut self) {
        let freed = self.direct.release_all();
        if let Some(retained) = self.retained.take() {
            if let Some(sink) = self.sink.as_deref() {
                sink.release(retained);
            }
        }
        if self.state != FilterState::Terminated {
            debug!(
                "Motion blur terminated: {} frames displayed, {} dropped, {} input buffers freed",
                self.stats.frames_displayed, self.stats.frames_dropped, freed
            );
        }
        self.state = FilterState::Terminated;
    }

    fn input_buffer(&mut self) -> Option<Frame> {
        self.direct.checkout()
    }

    fn recycle_input(&mut self, frame: Frame) {
        self.direct.checkin(frame);
    }
}

impl Drop for MotionBlurFilter {
    fn drop(&mut self) {
        self.end();
        if self.sink.take().is_some() {
            debug!("Destroyed video output");
        }
    }
}

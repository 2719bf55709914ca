use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::Result,
    filter::{CancelToken, RenderOutcome, VideoFilter},
    video::{write_rgb, Frame, FrameGeometry, FramePool},
};

/// Summary of a playback run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    pub frames_in: usize,
    pub frames_displayed: usize,
    pub frames_dropped: usize,
}

/// Drives a filter the way a video output thread does
///
/// The engine feeds frames to the filter one at a time, drains the pool's
/// display queue after every call, hands each displayed frame to the caller
/// and recycles it.
///
/// 1. Initialization - create the pool and let the filter negotiate its output
/// 2. Rendering - one synchronous render call per input frame
/// 3. Display - pass finished frames to the caller in order
/// 4. Teardown - end the filter and return its buffers
pub struct PlaybackEngine {
    filter: Box<dyn VideoFilter>,
    pool: Arc<FramePool>,
    geometry: FrameGeometry,
    frame_interval_us: i64,
    cancel: CancelToken,
}

impl PlaybackEngine {
    /// Create the output pool and initialize `filter` for `geometry`
    ///
    /// `cancel` should be the token the filter was built with.
    pub fn new(
        config: &Config,
        mut filter: Box<dyn VideoFilter>,
        geometry: FrameGeometry,
        cancel: CancelToken,
    ) -> Result<Self> {
        let pool = Arc::new(FramePool::new(geometry, config.pool.capacity));
        let output = filter.init(&geometry, &FramePool::shared_factory(Arc::clone(&pool)))?;
        info!("Playback through {} at {}", filter.name(), output);

        Ok(Self {
            filter,
            pool,
            geometry: output,
            frame_interval_us: config.io.frame_interval_us,
            cancel,
        })
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    pub fn pool(&self) -> &Arc<FramePool> {
        &self.pool
    }

    /// Play already-decoded frames
    pub fn play_frames<I, F>(&mut self, frames: I, mut on_display: F) -> Result<PlaybackReport>
    where
        I: IntoIterator<Item = Frame>,
        F: FnMut(&Frame) -> Result<()>,
    {
        let mut report = PlaybackReport::default();
        for frame in frames {
            if !self.step(&frame, &mut report, &mut on_display)? {
                break;
            }
        }
        Ok(report)
    }

    /// Play RGB images, converting each into one of the filter's input buffers
    ///
    /// Timestamps are assigned from the configured frame interval.
    pub fn play_images<F>(&mut self, images: &[RgbImage], mut on_display: F) -> Result<PlaybackReport>
    where
        F: FnMut(&Frame) -> Result<()>,
    {
        let mut report = PlaybackReport::default();
        for (index, image) in images.iter().enumerate() {
            let mut input = self
                .filter
                .input_buffer()
                .unwrap_or_else(|| Frame::new(&self.geometry));
            write_rgb(image, &mut input)?;
            input.set_pts(index as i64 * self.frame_interval_us);

            let result = self.step(&input, &mut report, &mut on_display);
            self.filter.recycle_input(input);
            if !result? {
                break;
            }
        }
        Ok(report)
    }

    /// Render one frame and show whatever the pool displayed; false once cancelled
    fn step<F>(&mut self, input: &Frame, report: &mut PlaybackReport, on_display: &mut F) -> Result<bool>
    where
        F: FnMut(&Frame) -> Result<()>,
    {
        report.frames_in += 1;
        let outcome = self.filter.render(input)?;
        if outcome == RenderOutcome::Dropped {
            report.frames_dropped += 1;
        }

        for frame in self.pool.take_displayed() {
            let shown = on_display(&frame);
            self.pool.recycle(frame);
            shown?;
            report.frames_displayed += 1;
        }

        if self.cancel.is_cancelled() {
            warn!("Playback cancelled after {} frames", report.frames_in);
            return Ok(false);
        }
        debug!("Frame {} {:?}", report.frames_in, outcome);
        Ok(true)
    }

    /// End the filter and report how many buffers are still out
    pub fn finish(mut self) -> usize {
        self.filter.end();
        let outstanding = self.pool.outstanding();
        if outstanding > 0 {
            warn!("{} output buffers still outstanding after teardown", outstanding);
        }
        outstanding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filter::{blend::blend_pixel, BlendFactor, MotionBlurFilter},
        video::{frame_from_rgb, Chroma, SyntheticSource},
    };
    use image::Rgb;

    fn engine(factor: i32, geometry: FrameGeometry) -> PlaybackEngine {
        let mut config = Config::default();
        config.filter.blur_factor = factor;
        config.filter.direct_buffers = 2;
        config.pool.capacity = 3;
        let cancel = CancelToken::new();
        let filter = MotionBlurFilter::new(&config, cancel.clone());
        PlaybackEngine::new(&config, Box::new(filter), geometry, cancel).unwrap()
    }

    #[test]
    fn test_unsupported_geometry_fails() {
        let config = Config::default();
        let cancel = CancelToken::new();
        let filter = MotionBlurFilter::new(&config, cancel.clone());
        let geometry = FrameGeometry::new(16, 16, Chroma::Rv32);

        let err = PlaybackEngine::new(&config, Box::new(filter), geometry, cancel)
            .err()
            .unwrap();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_play_frames_displays_every_frame() {
        let geometry = FrameGeometry::new(32, 16, Chroma::I420);
        let mut engine = engine(80, geometry);
        let mut shown = Vec::new();

        let report = engine
            .play_frames(SyntheticSource::new(geometry, 40_000).take(5), |frame| {
                shown.push(frame.pts());
                Ok(())
            })
            .unwrap();

        assert_eq!(report.frames_in, 5);
        assert_eq!(report.frames_displayed, 5);
        assert_eq!(shown, vec![0, 40_000, 80_000, 120_000, 160_000]);
        assert_eq!(engine.finish(), 0);
    }

    #[test]
    fn test_play_images_blends_against_previous_output() {
        let geometry = FrameGeometry::new(8, 8, Chroma::I422);
        let mut engine = engine(64, geometry);
        let black = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        let white = RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]));
        let mut lumas = Vec::new();

        engine
            .play_images(&[black.clone(), white.clone(), white], |frame| {
                lumas.push(frame.plane(0).unwrap().row(0)[0]);
                Ok(())
            })
            .unwrap();

        let black_y = frame_from_rgb(&black, Chroma::I422, 0).unwrap().plane(0).unwrap().row(0)[0];
        let white_y = 235;
        let factor = BlendFactor::new(64);
        let second = blend_pixel(black_y, white_y, factor);
        assert_eq!(lumas, vec![black_y, second, blend_pixel(second, white_y, factor)]);
        assert_eq!(engine.finish(), 0);
    }

    #[test]
    fn test_display_error_stops_playback() {
        let geometry = FrameGeometry::new(16, 16, Chroma::I420);
        let mut engine = engine(80, geometry);

        let result = engine.play_frames(SyntheticSource::new(geometry, 1).take(3), |_| {
            Err(crate::error::BlurError::generic("disk full"))
        });
        assert!(result.is_err());
        assert_eq!(engine.pool().pending_display(), 0);
    }
}

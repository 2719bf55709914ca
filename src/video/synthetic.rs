use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::video::types::{Frame, FrameGeometry};

const BACKGROUND_LUMA: u8 = 16;
const SQUARE_LUMA: u8 = 235;
const NEUTRAL_CHROMA: u8 = 128;

/// Endless stream of test frames: a bright square sliding across a dark field
///
/// Useful for watching the blur trail without any input footage. Optional
/// luma noise comes from a seeded generator so runs are reproducible.
pub struct SyntheticSource {
    geometry: FrameGeometry,
    square: u32,
    speed: u32,
    noise: u8,
    frame_interval_us: i64,
    index: u64,
    rng: SmallRng,
}

impl SyntheticSource {
    pub fn new(geometry: FrameGeometry, frame_interval_us: i64) -> Self {
        Self {
            geometry,
            square: (geometry.height / 4).max(1),
            speed: (geometry.width / 16).max(1),
            noise: 0,
            frame_interval_us,
            index: 0,
            rng: SmallRng::seed_from_u64(0x6d62_6c72),
        }
    }

    /// Add up to `amplitude` of random luma noise per pixel
    pub fn with_noise(mut self, amplitude: u8, seed: u64) -> Self {
        self.noise = amplitude;
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    /// Left edge of the square in frame `index`
    pub fn square_x(&self, index: u64) -> u32 {
        let travel = self.geometry.width.saturating_sub(self.square).max(1) as u64;
        ((index * self.speed as u64) % travel) as u32
    }

    fn draw(&mut self, index: u64) -> Frame {
        let mut frame = Frame::new(&self.geometry);
        frame.fill(&[BACKGROUND_LUMA, NEUTRAL_CHROMA, NEUTRAL_CHROMA]);
        frame.set_pts(index as i64 * self.frame_interval_us);

        let left = self.square_x(index) as usize;
        let right = (left + self.square as usize).min(self.geometry.width as usize);
        let top = ((self.geometry.height - self.square.min(self.geometry.height)) / 2) as usize;
        let bottom = top + self.square as usize;

        if let Some(luma) = frame.plane_mut(0) {
            for y in 0..luma.lines() {
                let row = luma.row_mut(y);
                if (top..bottom).contains(&y) {
                    row[left..right].fill(SQUARE_LUMA);
                }
                if self.noise > 0 {
                    for px in row.iter_mut() {
                        *px = px.saturating_add(self.rng.gen_range(0..=self.noise));
                    }
                }
            }
        }
        frame
    }
}

impl Iterator for SyntheticSource {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let frame = self.draw(self.index);
        self.index += 1;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::Chroma;

    fn geometry() -> FrameGeometry {
        FrameGeometry::new(64, 32, Chroma::I420)
    }

    #[test]
    fn test_square_moves_and_timestamps_advance() {
        let frames: Vec<Frame> = SyntheticSource::new(geometry(), 40_000).take(3).collect();
        assert_eq!(frames[2].pts(), 80_000);

        let row = frames[0].plane(0).unwrap().row(16);
        assert_eq!(row[0], SQUARE_LUMA);
        assert_eq!(row[8], BACKGROUND_LUMA);

        let row = frames[1].plane(0).unwrap().row(16);
        assert_eq!(row[0], BACKGROUND_LUMA);
        assert_eq!(row[4], SQUARE_LUMA);
    }

    #[test]
    fn test_noise_is_reproducible() {
        let a: Vec<Frame> = SyntheticSource::new(geometry(), 1).with_noise(8, 42).take(2).collect();
        let b: Vec<Frame> = SyntheticSource::new(geometry(), 1).with_noise(8, 42).take(2).collect();
        assert_eq!(a, b);
        assert_ne!(a[0].plane(0).unwrap().row(0), &[BACKGROUND_LUMA; 64]);
    }

    #[test]
    fn test_square_wraps() {
        let source = SyntheticSource::new(geometry(), 1);
        // travel = 64 - 8
        assert_eq!(source.square_x(14), 0);
    }
}

//! Fixed-point blending of two frames.
//!
//! Each output byte is `(old * f + new * (128 - f)) >> 7`. The weights sum to
//! 128 so the shift stands in for the division; results are truncated to
//! 8 bits exactly as the integer arithmetic produces them.

use serde::{Deserialize, Serialize};

use crate::{
    error::{FrameError, Result},
    video::Frame,
};

/// Fixed-point precision of the blend weights
pub const BLEND_SHIFT: u32 = 7;

/// Sum of the old and new weights
pub const BLEND_WEIGHT_TOTAL: i32 = 1 << BLEND_SHIFT;

/// Weight given to the previous output frame
///
/// Meaningful values are 1..=127. Values outside that range are kept as
/// given and produce wrapped output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlendFactor(i32);

impl BlendFactor {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 127;
    pub const DEFAULT: Self = Self(80);

    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> i32 {
        self.0
    }

    pub const fn old_weight(&self) -> i32 {
        self.0
    }

    pub const fn new_weight(&self) -> i32 {
        BLEND_WEIGHT_TOTAL.wrapping_sub(self.0)
    }

    pub fn is_in_range(&self) -> bool {
        (Self::MIN..=Self::MAX).contains(&self.0)
    }
}

impl Default for BlendFactor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i32> for BlendFactor {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

#[inline]
fn weighted(old: u8, new: u8, old_weight: i32, new_weight: i32) -> u8 {
    // wraps like 32-bit C arithmetic when the factor is out of range
    ((old as i32)
        .wrapping_mul(old_weight)
        .wrapping_add((new as i32).wrapping_mul(new_weight))
        >> BLEND_SHIFT) as u8
}

#[inline]
pub fn blend_pixel(old: u8, new: u8, factor: BlendFactor) -> u8 {
    weighted(old, new, factor.old_weight(), factor.new_weight())
}

/// Blend two byte slices of equal length into `dest`
pub fn blend_plane(old: &[u8], new: &[u8], dest: &mut [u8], factor: BlendFactor) -> Result<()> {
    if old.len() != dest.len() || new.len() != dest.len() {
        return Err(FrameError::InvalidPlane {
            details: format!(
                "blend extents differ: old {}, new {}, dest {}",
                old.len(),
                new.len(),
                dest.len()
            ),
        }
        .into());
    }

    let old_weight = factor.old_weight();
    let new_weight = factor.new_weight();
    for (out, (&o, &n)) in dest.iter_mut().zip(old.iter().zip(new)) {
        *out = weighted(o, n, old_weight, new_weight);
    }
    Ok(())
}

/// Blend every plane of `old` and `new` into `dest`
///
/// All three frames must share plane count, pitch and line count. Nothing is
/// written when they don't. Padding bytes are blended like pixel data.
pub fn blend_frames(old: &Frame, new: &Frame, dest: &mut Frame, factor: BlendFactor) -> Result<()> {
    dest.check_layout(old)?;
    dest.check_layout(new)?;

    for ((out, o), n) in dest.planes_mut().iter_mut().zip(old.planes()).zip(new.planes()) {
        blend_plane(o.data(), n.data(), out.data_mut(), factor)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::{Chroma, FrameGeometry};

    fn reference(old: u8, new: u8, f: i32) -> u8 {
        ((old as u32 * f as u32 + new as u32 * (128 - f) as u32) >> 7) as u8
    }

    #[test]
    fn test_blend_pixel_matches_fixed_point_formula() {
        for f in BlendFactor::MIN..=BlendFactor::MAX {
            let factor = BlendFactor::new(f);
            for old in 0..=255u8 {
                for new in 0..=255u8 {
                    assert_eq!(blend_pixel(old, new, factor), reference(old, new, f));
                }
            }
        }
    }

    #[test]
    fn test_weights_sum_to_128() {
        let factor = BlendFactor::DEFAULT;
        assert_eq!(factor.old_weight(), 80);
        assert_eq!(factor.new_weight(), 48);
        assert_eq!(factor.old_weight() + factor.new_weight(), BLEND_WEIGHT_TOTAL);
    }

    #[test]
    fn test_known_values() {
        let factor = BlendFactor::DEFAULT;
        // (200 * 80 + 100 * 48) >> 7 = 20800 >> 7
        assert_eq!(blend_pixel(200, 100, factor), 162);
        // 255 * 128 >> 7 never overflows for in-range factors
        assert_eq!(blend_pixel(255, 255, factor), 255);
        assert_eq!(blend_pixel(0, 0, factor), 0);
    }

    #[test]
    fn test_out_of_range_factor_wraps() {
        let factor = BlendFactor::new(200);
        assert!(!factor.is_in_range());
        // (0 * 200 + 255 * -72) >> 7 = -144, truncated to 112
        assert_eq!(blend_pixel(0, 255, factor), (-18360i32 >> 7) as u8);
        assert_eq!(blend_pixel(0, 255, factor), 112);
    }

    #[test]
    fn test_extreme_factors_do_not_overflow() {
        for value in [i32::MAX, i32::MIN, i32::MIN + 1, 1 << 24] {
            let factor = BlendFactor::new(value);
            let expected = |o: u8, n: u8| {
                let sum = (o as i64 * value as i64 + n as i64 * (128 - value as i64)) as i32;
                (sum >> 7) as u8
            };
            for (o, n) in [(0, 0), (255, 0), (0, 255), (255, 255), (17, 200)] {
                assert_eq!(blend_pixel(o, n, factor), expected(o, n));
            }

            let mut dest = [0u8; 3];
            blend_plane(&[255, 0, 17], &[0, 255, 200], &mut dest, factor).unwrap();
            assert_eq!(dest, [expected(255, 0), expected(0, 255), expected(17, 200)]);
        }
        assert_eq!(BlendFactor::new(i32::MIN).new_weight(), 128i32.wrapping_sub(i32::MIN));
    }

    #[test]
    fn test_blend_frames_covers_padding() {
        let geometry = FrameGeometry::new(10, 4, Chroma::I420);
        let mut old = Frame::new(&geometry);
        let mut new = Frame::new(&geometry);
        let mut dest = Frame::new(&geometry);
        old.fill(&[200, 200, 200]);
        new.fill(&[100, 100, 100]);

        blend_frames(&old, &new, &mut dest, BlendFactor::DEFAULT).unwrap();

        for plane in dest.planes() {
            assert!(plane.pitch() > plane.visible_pitch());
            assert!(plane.data().iter().all(|&b| b == 162));
        }
    }

    #[test]
    fn test_blend_frames_rejects_mismatch_without_writing() {
        let old = Frame::new(&FrameGeometry::new(16, 16, Chroma::I420));
        let new = Frame::new(&FrameGeometry::new(16, 16, Chroma::I422));
        let mut dest = Frame::new(&FrameGeometry::new(16, 16, Chroma::I420));
        dest.fill(&[7, 7, 7]);

        assert!(blend_frames(&old, &new, &mut dest, BlendFactor::DEFAULT).is_err());
        assert!(dest.planes().iter().all(|p| p.data().iter().all(|&b| b == 7)));
    }

    #[test]
    fn test_blend_plane_rejects_short_input() {
        let mut dest = [0u8; 4];
        assert!(blend_plane(&[1, 2, 3, 4], &[1, 2, 3], &mut dest, BlendFactor::DEFAULT).is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FrameError, Result};

/// Byte alignment applied to every plane pitch.
pub const PITCH_ALIGN: usize = 16;

/// Fixed-point scale used for display aspect ratios (4:3 is `ASPECT_FACTOR * 4 / 3`).
pub const ASPECT_FACTOR: u32 = 432_000;

/// Pixel layout of a frame, identified by its FourCC tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chroma {
    /// Planar YUV 4:2:0, planes Y, U, V
    I420,
    /// Same layout as I420 under another tag
    Iyuv,
    /// Planar YUV 4:2:0, planes Y, V, U
    Yv12,
    /// Planar YUV 4:2:2, planes Y, U, V
    I422,
    /// Packed YUV 4:2:2
    Yuy2,
    /// Packed 32-bit RGB
    Rv32,
}

impl Chroma {
    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            Chroma::I420 => *b"I420",
            Chroma::Iyuv => *b"IYUV",
            Chroma::Yv12 => *b"YV12",
            Chroma::I422 => *b"I422",
            Chroma::Yuy2 => *b"YUY2",
            Chroma::Rv32 => *b"RV32",
        }
    }

    pub fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"I420" => Some(Chroma::I420),
            b"IYUV" => Some(Chroma::Iyuv),
            b"YV12" => Some(Chroma::Yv12),
            b"I422" => Some(Chroma::I422),
            b"YUY2" => Some(Chroma::Yuy2),
            b"RV32" => Some(Chroma::Rv32),
            _ => None,
        }
    }

    /// Whether this is one of the three-plane YUV layouts (4:2:0 or 4:2:2)
    pub fn is_planar_yuv(&self) -> bool {
        matches!(self, Chroma::I420 | Chroma::Iyuv | Chroma::Yv12 | Chroma::I422)
    }

    /// Horizontal and vertical subsampling shifts of the chroma planes
    pub fn chroma_shift(&self) -> (u32, u32) {
        match self {
            Chroma::I420 | Chroma::Iyuv | Chroma::Yv12 => (1, 1),
            Chroma::I422 => (1, 0),
            Chroma::Yuy2 | Chroma::Rv32 => (0, 0),
        }
    }

    /// Plane indices of the U and V components for planar layouts
    pub fn uv_planes(&self) -> Option<(usize, usize)> {
        match self {
            Chroma::I420 | Chroma::Iyuv | Chroma::I422 => Some((1, 2)),
            Chroma::Yv12 => Some((2, 1)),
            Chroma::Yuy2 | Chroma::Rv32 => None,
        }
    }

    /// Visible bytes per row and line count of each plane for a `width`x`height` picture
    pub fn plane_layouts(&self, width: u32, height: u32) -> Vec<(usize, usize)> {
        let (w, h) = (width as usize, height as usize);
        match self {
            Chroma::Yuy2 => vec![(w.div_ceil(2) * 4, h)],
            Chroma::Rv32 => vec![(w * 4, h)],
            _ => {
                let (sx, sy) = self.chroma_shift();
                let cw = w.div_ceil(1 << sx);
                let ch = h.div_ceil(1 << sy);
                vec![(w, h), (cw, ch), (cw, ch)]
            }
        }
    }
}

impl fmt::Display for Chroma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fourcc = self.fourcc();
        write!(f, "{}", String::from_utf8_lossy(&fourcc))
    }
}

impl FromStr for Chroma {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        let bytes: [u8; 4] = upper
            .as_bytes()
            .try_into()
            .map_err(|_| format!("unknown chroma: {}", s))?;
        Self::from_fourcc(&bytes).ok_or_else(|| format!("unknown chroma: {}", s))
    }
}

/// Dimensions, layout and display aspect of a video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    pub chroma: Chroma,
    /// Display aspect ratio scaled by [`ASPECT_FACTOR`]
    pub aspect: u32,
}

impl FrameGeometry {
    /// Geometry with square pixels
    pub fn new(width: u32, height: u32, chroma: Chroma) -> Self {
        let aspect = if height == 0 {
            0
        } else {
            u32::try_from(ASPECT_FACTOR as u64 * width as u64 / height as u64).unwrap_or(u32::MAX)
        };
        Self {
            width,
            height,
            chroma,
            aspect,
        }
    }

    pub fn with_aspect(mut self, aspect: u32) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::InvalidDimensions {
                width: self.width,
                height: self.height,
            }
            .into());
        }
        Ok(())
    }

    /// Whether `frame` has this geometry's size and layout
    pub fn matches(&self, frame: &Frame) -> bool {
        frame.width() == self.width && frame.height() == self.height && frame.chroma() == self.chroma
    }

    /// Aligned pitch and line count of each plane
    pub fn plane_extents(&self) -> Vec<(usize, usize)> {
        self.chroma
            .plane_layouts(self.width, self.height)
            .into_iter()
            .map(|(visible_pitch, lines)| (visible_pitch.next_multiple_of(PITCH_ALIGN), lines))
            .collect()
    }

    /// Check that every plane of `frame` has the pitch and line count of this geometry
    pub fn check_planes(&self, frame: &Frame) -> Result<()> {
        let extents = self.plane_extents();
        if extents.len() != frame.plane_count() {
            return Err(FrameError::PlaneCountMismatch {
                expected: extents.len(),
                found: frame.plane_count(),
            }
            .into());
        }
        for (index, ((pitch, lines), plane)) in extents.iter().zip(frame.planes()).enumerate() {
            if plane.pitch() != *pitch || plane.lines() != *lines {
                return Err(FrameError::PlaneLayoutMismatch {
                    plane: index,
                    expected: format!("{}x{}", pitch, lines),
                    found: format!("{}x{}", plane.pitch(), plane.lines()),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.chroma)
    }
}

/// One component buffer of a frame
///
/// The buffer holds exactly `pitch * lines` bytes. Bytes past `visible_pitch`
/// in each row are alignment padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plane {
    data: Vec<u8>,
    pitch: usize,
    visible_pitch: usize,
    lines: usize,
}

impl Plane {
    /// Zeroed plane with the pitch rounded up to [`PITCH_ALIGN`]
    pub fn new(visible_pitch: usize, lines: usize) -> Self {
        let pitch = visible_pitch.next_multiple_of(PITCH_ALIGN);
        Self {
            data: vec![0; pitch * lines],
            pitch,
            visible_pitch,
            lines,
        }
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn visible_pitch(&self) -> usize {
        self.visible_pitch
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Byte extent of the plane (`pitch * lines`)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Visible bytes of row `y`
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.pitch;
        &self.data[start..start + self.visible_pitch]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.pitch;
        &mut self.data[start..start + self.visible_pitch]
    }

    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }

    /// Same pitch and line count
    pub fn same_layout(&self, other: &Plane) -> bool {
        self.pitch == other.pitch && self.lines == other.lines
    }
}

/// A decoded picture: planes plus presentation timestamp
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    planes: Vec<Plane>,
    chroma: Chroma,
    width: u32,
    height: u32,
    /// Presentation timestamp in microseconds
    pts: i64,
}

impl Frame {
    /// Allocate a zeroed frame for the given geometry
    pub fn new(geometry: &FrameGeometry) -> Self {
        let planes = geometry
            .chroma
            .plane_layouts(geometry.width, geometry.height)
            .into_iter()
            .map(|(visible_pitch, lines)| Plane::new(visible_pitch, lines))
            .collect();
        Self {
            planes,
            chroma: geometry.chroma,
            width: geometry.width,
            height: geometry.height,
            pts: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn chroma(&self) -> Chroma {
        self.chroma
    }

    pub fn pts(&self) -> i64 {
        self.pts
    }

    pub fn set_pts(&mut self, pts: i64) {
        self.pts = pts;
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn planes_mut(&mut self) -> &mut [Plane] {
        &mut self.planes
    }

    pub fn plane(&self, index: usize) -> Option<&Plane> {
        self.planes.get(index)
    }

    pub fn plane_mut(&mut self, index: usize) -> Option<&mut Plane> {
        self.planes.get_mut(index)
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Fill each plane with the matching value; extra values are ignored
    pub fn fill(&mut self, values: &[u8]) {
        for (plane, value) in self.planes.iter_mut().zip(values) {
            plane.fill(*value);
        }
    }

    /// Check that `other` has the same plane count and per-plane pitch and lines
    pub fn check_layout(&self, other: &Frame) -> Result<()> {
        if self.planes.len() != other.planes.len() {
            return Err(FrameError::PlaneCountMismatch {
                expected: self.planes.len(),
                found: other.planes.len(),
            }
            .into());
        }
        for (index, (ours, theirs)) in self.planes.iter().zip(&other.planes).enumerate() {
            if !ours.same_layout(theirs) {
                return Err(FrameError::PlaneLayoutMismatch {
                    plane: index,
                    expected: format!("{}x{}", ours.pitch(), ours.lines()),
                    found: format!("{}x{}", theirs.pitch(), theirs.lines()),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_roundtrip() {
        for chroma in [Chroma::I420, Chroma::Iyuv, Chroma::Yv12, Chroma::I422, Chroma::Yuy2, Chroma::Rv32] {
            assert_eq!(Chroma::from_fourcc(&chroma.fourcc()), Some(chroma));
        }
        assert_eq!(Chroma::from_fourcc(b"NV12"), None);
    }

    #[test]
    fn test_chroma_from_str() {
        assert_eq!("i420".parse::<Chroma>().unwrap(), Chroma::I420);
        assert_eq!("YV12".parse::<Chroma>().unwrap(), Chroma::Yv12);
        assert!("rgb".parse::<Chroma>().is_err());
        assert_eq!(Chroma::I422.to_string(), "I422");
    }

    #[test]
    fn test_planar_family() {
        assert!(Chroma::I420.is_planar_yuv());
        assert!(Chroma::I422.is_planar_yuv());
        assert!(!Chroma::Yuy2.is_planar_yuv());
        assert!(!Chroma::Rv32.is_planar_yuv());
    }

    #[test]
    fn test_i420_plane_layout() {
        let frame = Frame::new(&FrameGeometry::new(33, 17, Chroma::I420));
        assert_eq!(frame.plane_count(), 3);

        let luma = frame.plane(0).unwrap();
        assert_eq!(luma.visible_pitch(), 33);
        assert_eq!(luma.pitch(), 48);
        assert_eq!(luma.lines(), 17);
        assert_eq!(luma.len(), 48 * 17);

        let u = frame.plane(1).unwrap();
        assert_eq!(u.visible_pitch(), 17);
        assert_eq!(u.pitch(), 32);
        assert_eq!(u.lines(), 9);
    }

    #[test]
    fn test_i422_keeps_full_height_chroma() {
        let frame = Frame::new(&FrameGeometry::new(64, 48, Chroma::I422));
        let v = frame.plane(2).unwrap();
        assert_eq!(v.visible_pitch(), 32);
        assert_eq!(v.lines(), 48);
    }

    #[test]
    fn test_aspect_defaults_to_square_pixels() {
        let geometry = FrameGeometry::new(640, 480, Chroma::I420);
        assert_eq!(geometry.aspect, ASPECT_FACTOR * 4 / 3);
        assert_eq!(geometry.with_aspect(ASPECT_FACTOR).aspect, ASPECT_FACTOR);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(FrameGeometry::new(0, 10, Chroma::I420).validate().is_err());
        assert!(FrameGeometry::new(10, 10, Chroma::I420).validate().is_ok());
    }

    #[test]
    fn test_check_layout_detects_mismatch() {
        let a = Frame::new(&FrameGeometry::new(32, 32, Chroma::I420));
        let b = Frame::new(&FrameGeometry::new(32, 32, Chroma::I422));
        let c = Frame::new(&FrameGeometry::new(32, 32, Chroma::Rv32));

        assert!(a.check_layout(&a.clone()).is_ok());
        assert!(a.check_layout(&b).is_err());
        assert!(a.check_layout(&c).is_err());
    }

    #[test]
    fn test_extreme_aspect_saturates() {
        let wide = FrameGeometry::new(100_000, 1, Chroma::I420);
        assert_eq!(wide.aspect, u32::MAX);
        let tall = FrameGeometry::new(1, 100_000, Chroma::I420);
        assert_eq!(tall.aspect, ASPECT_FACTOR / 100_000);
        assert_eq!(FrameGeometry::new(10, 0, Chroma::I420).aspect, 0);
    }

    #[test]
    fn test_check_planes_detects_resized_plane() {
        let geometry = FrameGeometry::new(33, 17, Chroma::I420);
        assert_eq!(geometry.plane_extents(), vec![(48, 17), (32, 9), (32, 9)]);

        let mut frame = Frame::new(&geometry);
        assert!(geometry.check_planes(&frame).is_ok());

        frame.planes_mut()[1] = Plane::new(40, 9);
        assert!(geometry.matches(&frame));
        assert!(geometry.check_planes(&frame).is_err());
    }

    #[test]
    fn test_rows_exclude_padding() {
        let mut plane = Plane::new(5, 2);
        plane.row_mut(1).fill(9);
        assert_eq!(plane.row(1), &[9; 5]);
        assert_eq!(plane.data()[plane.pitch() + 5], 0);
    }
}

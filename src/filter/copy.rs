use crate::{error::Result, video::Frame};

/// Byte-exact copy of every plane of `source` into `dest`
///
/// Both frames must have the same plane layout. The timestamp is not copied.
pub fn copy_frame(dest: &mut Frame, source: &Frame) -> Result<()> {
    dest.check_layout(source)?;

    for (out, input) in dest.planes_mut().iter_mut().zip(source.planes()) {
        out.data_mut().copy_from_slice(input.data());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::{Chroma, FrameGeometry};

    fn patterned(geometry: &FrameGeometry) -> Frame {
        let mut frame = Frame::new(geometry);
        for (p, plane) in frame.planes_mut().iter_mut().enumerate() {
            for (i, byte) in plane.data_mut().iter_mut().enumerate() {
                *byte = (i * 7 + p * 31) as u8;
            }
        }
        frame
    }

    #[test]
    fn test_copy_is_byte_exact() {
        let geometry = FrameGeometry::new(21, 13, Chroma::Yv12);
        let source = patterned(&geometry);
        let mut dest = Frame::new(&geometry);

        copy_frame(&mut dest, &source).unwrap();
        assert_eq!(dest.planes(), source.planes());
    }

    #[test]
    fn test_copy_of_copy_matches_source() {
        let geometry = FrameGeometry::new(40, 30, Chroma::I422);
        let source = patterned(&geometry);
        let mut first = Frame::new(&geometry);
        let mut second = Frame::new(&geometry);

        copy_frame(&mut first, &source).unwrap();
        copy_frame(&mut second, &first).unwrap();
        assert_eq!(second.planes(), source.planes());
    }

    #[test]
    fn test_copy_leaves_timestamp() {
        let geometry = FrameGeometry::new(8, 8, Chroma::I420);
        let mut source = patterned(&geometry);
        source.set_pts(1234);
        let mut dest = Frame::new(&geometry);
        dest.set_pts(99);

        copy_frame(&mut dest, &source).unwrap();
        assert_eq!(dest.pts(), 99);
    }

    #[test]
    fn test_copy_rejects_mismatch() {
        let source = Frame::new(&FrameGeometry::new(16, 16, Chroma::I420));
        let mut dest = Frame::new(&FrameGeometry::new(32, 16, Chroma::I420));
        assert!(copy_frame(&mut dest, &source).is_err());
    }
}

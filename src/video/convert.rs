//! RGB <-> planar YUV conversion (BT.601, studio range, integer arithmetic).

use image::{Rgb, RgbImage};

use crate::{
    error::{FrameError, Result},
    video::types::{Chroma, Frame, FrameGeometry, Plane},
};

#[derive(Clone, Copy)]
enum Component {
    U,
    V,
}

fn rgb_to_y([r, g, b]: [i32; 3]) -> u8 {
    (((66 * r + 129 * g + 25 * b + 128) >> 8) + 16).clamp(0, 255) as u8
}

fn rgb_to_chroma([r, g, b]: [i32; 3], component: Component) -> u8 {
    let value = match component {
        Component::U => (-38 * r - 74 * g + 112 * b + 128) >> 8,
        Component::V => (112 * r - 94 * g - 18 * b + 128) >> 8,
    };
    (value + 128).clamp(0, 255) as u8
}

fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    let clip = |x: i32| (x >> 8).clamp(0, 255) as u8;
    [
        clip(298 * c + 409 * e + 128),
        clip(298 * c - 100 * d - 208 * e + 128),
        clip(298 * c + 516 * d + 128),
    ]
}

fn unsupported(chroma: Chroma) -> FrameError {
    FrameError::UnsupportedConversion {
        chroma: chroma.to_string(),
    }
}

fn check_size(image: &RgbImage, frame: &Frame) -> Result<()> {
    if image.width() != frame.width() || image.height() != frame.height() {
        return Err(FrameError::InvalidPlane {
            details: format!(
                "image is {}x{}, frame is {}x{}",
                image.width(),
                image.height(),
                frame.width(),
                frame.height()
            ),
        }
        .into());
    }
    Ok(())
}

/// Convert an RGB image into a new planar frame
pub fn frame_from_rgb(image: &RgbImage, chroma: Chroma, pts: i64) -> Result<Frame> {
    let geometry = FrameGeometry::new(image.width(), image.height(), chroma);
    let mut frame = Frame::new(&geometry);
    write_rgb(image, &mut frame)?;
    frame.set_pts(pts);
    Ok(frame)
}

/// Overwrite the visible pixels of a planar frame with `image`
///
/// Chroma samples average the RGB values of the pixels they cover.
pub fn write_rgb(image: &RgbImage, frame: &mut Frame) -> Result<()> {
    let chroma = frame.chroma();
    let (u_index, v_index) = chroma.uv_planes().ok_or_else(|| unsupported(chroma))?;
    check_size(image, frame)?;
    let (width, height) = (image.width(), image.height());
    let (sx, sy) = chroma.chroma_shift();

    let luma = frame.plane_mut(0).ok_or_else(|| unsupported(chroma))?;
    for y in 0..height {
        for (x, out) in luma.row_mut(y as usize).iter_mut().enumerate().take(width as usize) {
            let Rgb([r, g, b]) = *image.get_pixel(x as u32, y);
            *out = rgb_to_y([r as i32, g as i32, b as i32]);
        }
    }

    for (index, component) in [(u_index, Component::U), (v_index, Component::V)] {
        let plane = frame.plane_mut(index).ok_or_else(|| unsupported(chroma))?;
        write_chroma_plane(image, plane, (sx, sy), component);
    }
    Ok(())
}

fn write_chroma_plane(image: &RgbImage, plane: &mut Plane, (sx, sy): (u32, u32), component: Component) {
    let (width, height) = (image.width(), image.height());
    for cy in 0..plane.lines() as u32 {
        let rows = (cy << sy)..((cy + 1) << sy).min(height);
        for (cx, out) in plane.row_mut(cy as usize).iter_mut().enumerate() {
            let cx = cx as u32;
            let cols = (cx << sx)..((cx + 1) << sx).min(width);

            let mut sum = [0i32; 3];
            let mut count = 0;
            for y in rows.clone() {
                for x in cols.clone() {
                    let Rgb(px) = *image.get_pixel(x, y);
                    for (acc, channel) in sum.iter_mut().zip(px) {
                        *acc += channel as i32;
                    }
                    count += 1;
                }
            }
            if count > 0 {
                *out = rgb_to_chroma(sum.map(|s| s / count), component);
            }
        }
    }
}

/// Convert the visible pixels of a planar frame to RGB
pub fn frame_to_rgb(frame: &Frame) -> Result<RgbImage> {
    let chroma = frame.chroma();
    let (u_index, v_index) = chroma.uv_planes().ok_or_else(|| unsupported(chroma))?;
    let (sx, sy) = chroma.chroma_shift();
    let (luma, u, v) = match (frame.plane(0), frame.plane(u_index), frame.plane(v_index)) {
        (Some(luma), Some(u), Some(v)) => (luma, u, v),
        _ => return Err(unsupported(chroma).into()),
    };

    let mut image = RgbImage::new(frame.width(), frame.height());
    for y in 0..frame.height() as usize {
        let (luma_row, u_row, v_row) = (luma.row(y), u.row(y >> sy), v.row(y >> sy));
        for x in 0..frame.width() as usize {
            let rgb = yuv_to_rgb(luma_row[x], u_row[x >> sx], v_row[x >> sx]);
            image.put_pixel(x as u32, y as u32, Rgb(rgb));
        }
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [u8; 3], b: [u8; 3]) -> bool {
        a.iter().zip(b).all(|(&x, y)| (x as i32 - y as i32).abs() <= 3)
    }

    #[test]
    fn test_gray_maps_to_neutral_chroma() {
        let image = RgbImage::from_pixel(4, 4, Rgb([128, 128, 128]));
        let frame = frame_from_rgb(&image, Chroma::I420, 7).unwrap();

        assert_eq!(frame.pts(), 7);
        assert_eq!(frame.plane(0).unwrap().row(0), &[126; 4]);
        assert_eq!(frame.plane(1).unwrap().row(0), &[128; 2]);
        assert_eq!(frame.plane(2).unwrap().row(0), &[128; 2]);
    }

    #[test]
    fn test_flat_colors_survive_roundtrip() {
        for color in [[255, 0, 0], [0, 255, 0], [0, 0, 255], [40, 90, 200], [250, 250, 250]] {
            for chroma in [Chroma::I420, Chroma::Yv12, Chroma::I422] {
                let image = RgbImage::from_pixel(7, 5, Rgb(color));
                let frame = frame_from_rgb(&image, chroma, 0).unwrap();
                let back = frame_to_rgb(&frame).unwrap();
                for px in back.pixels() {
                    assert!(close(px.0, color), "{:?} -> {:?} via {}", color, px.0, chroma);
                }
            }
        }
    }

    #[test]
    fn test_yv12_swaps_chroma_planes() {
        let image = RgbImage::from_pixel(2, 2, Rgb([0, 0, 255]));
        let i420 = frame_from_rgb(&image, Chroma::I420, 0).unwrap();
        let yv12 = frame_from_rgb(&image, Chroma::Yv12, 0).unwrap();

        assert_eq!(i420.plane(1).unwrap().row(0), yv12.plane(2).unwrap().row(0));
        assert_eq!(i420.plane(2).unwrap().row(0), yv12.plane(1).unwrap().row(0));
    }

    #[test]
    fn test_packed_formats_rejected() {
        let image = RgbImage::new(4, 4);
        assert!(frame_from_rgb(&image, Chroma::Yuy2, 0).is_err());
        let frame = Frame::new(&FrameGeometry::new(4, 4, Chroma::Rv32));
        assert!(frame_to_rgb(&frame).is_err());
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let image = RgbImage::new(4, 4);
        let mut frame = Frame::new(&FrameGeometry::new(8, 4, Chroma::I420));
        assert!(write_rgb(&image, &mut frame).is_err());
    }
}

use log::trace;
use palette::Srgb;

use crate::buffer::PixelBuffer;
use crate::color::{color_name, hex_encode, parse_hex, rgb_string};
use crate::error::{InspectError, Result};

/// The exact color under the pointer (or from an external picker).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SampledColor {
    pub hex: String,
    pub rgb: String,
    pub name: String,
}

impl SampledColor {
    pub fn from_color(c: Srgb<u8>) -> Self {
        Self {
            hex: hex_encode(c),
            rgb: rgb_string(c),
            name: color_name(c).to_string(),
        }
    }

    /// Build from a hex string handed over by an OS eyedropper.
    pub fn from_hex(hex: &str) -> Result<Self> {
        parse_hex(hex).map(Self::from_color)
    }
}

/// Where the image is currently drawn on screen, and its natural size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayTransform {
    pub natural_width: u32,
    pub natural_height: u32,
    pub displayed_left: f64,
    pub displayed_top: f64,
    pub displayed_width: f64,
    pub displayed_height: f64,
}

impl DisplayTransform {
    pub fn new(
        natural_width: u32,
        natural_height: u32,
        displayed_left: f64,
        displayed_top: f64,
        displayed_width: f64,
        displayed_height: f64,
    ) -> Result<Self> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(displayed_width) || !positive(displayed_height) {
            return Err(InspectError::InvalidInput(format!(
                "displayed size must be positive, got {displayed_width}x{displayed_height}"
            )));
        }
        if !displayed_left.is_finite() || !displayed_top.is_finite() {
            return Err(InspectError::InvalidInput("displayed origin must be finite".into()));
        }
        Ok(Self {
            natural_width,
            natural_height,
            displayed_left,
            displayed_top,
            displayed_width,
            displayed_height,
        })
    }

    /// Rendered at natural size with its top-left corner at the origin.
    pub fn identity(natural_width: u32, natural_height: u32) -> Self {
        Self {
            natural_width,
            natural_height,
            displayed_left: 0.0,
            displayed_top: 0.0,
            displayed_width: natural_width as f64,
            displayed_height: natural_height as f64,
        }
    }
}

#[inline(always)]
fn floor_to_pixel(v: f64) -> i64 {
    // NaN would otherwise cast to 0, a valid pixel
    if v.is_finite() { v.floor() as i64 } else { i64::MIN }
}

/// Rescale a pointer position from the displayed box onto the natural pixel grid.
pub fn map_to_buffer_coordinates(
    pointer_x: f64,
    pointer_y: f64,
    transform: &DisplayTransform,
) -> (i64, i64) {
    let x = (pointer_x - transform.displayed_left) / transform.displayed_width
        * transform.natural_width as f64;
    let y = (pointer_y - transform.displayed_top) / transform.displayed_height
        * transform.natural_height as f64;
    (floor_to_pixel(x), floor_to_pixel(y))
}

pub fn sample_pixel(buffer: &PixelBuffer, x: i64, y: i64) -> Result<SampledColor> {
    let out_of_bounds = || InspectError::OutOfBounds {
        x,
        y,
        width: buffer.width(),
        height: buffer.height(),
    };
    let px = u32::try_from(x).map_err(|_| out_of_bounds())?;
    let py = u32::try_from(y).map_err(|_| out_of_bounds())?;
    let [r, g, b, _] = buffer.rgba(px, py).ok_or_else(out_of_bounds)?;
    trace!("sampled ({px}, {py}) = {r},{g},{b}");
    Ok(SampledColor::from_color(Srgb::new(r, g, b)))
}

/// Map the pointer through `transform` and read the pixel underneath.
pub fn sample_at(
    buffer: &PixelBuffer,
    pointer_x: f64,
    pointer_y: f64,
    transform: &DisplayTransform,
) -> Result<SampledColor> {
    let (x, y) = map_to_buffer_coordinates(pointer_x, pointer_y, transform);
    sample_pixel(buffer, x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> Vec<u8> {
        let mut data = vec![0u8; 16];
        data[12..16].copy_from_slice(&[10, 20, 30, 255]);
        data
    }

    #[test]
    fn identity_transform_floors() {
        let t = DisplayTransform::identity(100, 100);
        assert_eq!(map_to_buffer_coordinates(10.4, 20.9, &t), (10, 20));
    }

    #[test]
    fn scaled_and_offset_box() {
        // 400x200 image drawn at half size, offset by (50, 10)
        let t = DisplayTransform::new(400, 200, 50.0, 10.0, 200.0, 100.0).unwrap();
        assert_eq!(map_to_buffer_coordinates(50.0, 10.0, &t), (0, 0));
        assert_eq!(map_to_buffer_coordinates(150.0, 60.0, &t), (200, 100));
        assert_eq!(map_to_buffer_coordinates(249.9, 109.9, &t), (399, 199));
        assert_eq!(map_to_buffer_coordinates(250.0, 110.0, &t), (400, 200));
    }

    #[test]
    fn left_of_box_is_negative() {
        let t = DisplayTransform::new(10, 10, 5.0, 5.0, 10.0, 10.0).unwrap();
        assert_eq!(map_to_buffer_coordinates(4.5, 5.0, &t), (-1, 0));
    }

    #[test]
    fn non_finite_pointer_never_lands_inside() {
        let data = two_by_two();
        let buf = PixelBuffer::new(2, 2, &data).unwrap();
        let t = DisplayTransform::identity(2, 2);
        let err = sample_at(&buf, f64::NAN, 0.0, &t).unwrap_err();
        assert!(err.is_out_of_bounds());
    }

    #[test]
    fn rejects_degenerate_display_box() {
        assert!(DisplayTransform::new(10, 10, 0.0, 0.0, 0.0, 10.0).is_err());
        assert!(DisplayTransform::new(10, 10, 0.0, 0.0, 10.0, -1.0).is_err());
        assert!(DisplayTransform::new(10, 10, f64::NAN, 0.0, 10.0, 10.0).is_err());
    }

    #[test]
    fn reads_exact_pixel() {
        let data = two_by_two();
        let buf = PixelBuffer::new(2, 2, &data).unwrap();
        let c = sample_pixel(&buf, 1, 1).unwrap();
        assert_eq!(c.hex, "#0A141E");
        assert_eq!(c.rgb, "rgb(10, 20, 30)");
        assert_eq!(c.name, "Dark Shade");
    }

    #[test]
    fn outside_is_out_of_bounds() {
        let data = two_by_two();
        let buf = PixelBuffer::new(2, 2, &data).unwrap();
        for (x, y) in [(2, 0), (0, 2), (-1, 0), (0, -1)] {
            let err = sample_pixel(&buf, x, y).unwrap_err();
            assert!(err.is_out_of_bounds(), "({x}, {y})");
        }
    }

    #[test]
    fn names_the_exact_color_not_the_bucket() {
        // (31, 31, 31) is a Dark Gray; its bucket (16, 16, 16) would be a Dark Shade
        let data = [31, 31, 31, 255];
        let buf = PixelBuffer::new(1, 1, &data).unwrap();
        assert_eq!(sample_pixel(&buf, 0, 0).unwrap().name, "Dark Gray");
    }

    #[test]
    fn eyedropper_hex() {
        let c = SampledColor::from_hex("#ff8000").unwrap();
        assert_eq!(c.hex, "#FF8000");
        assert_eq!(c.rgb, "rgb(255, 128, 0)");
        assert_eq!(c.name, "Orange Tone");
        assert!(SampledColor::from_hex("nope").is_err());
    }
}

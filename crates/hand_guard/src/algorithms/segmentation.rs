use image::{GrayImage, Luma, Rgb, RgbImage};
use crate::{
    error::{GuardError, Result},
    traits::ColorSegmenter,
    types::{ColorRange, Hsv},
};

/// Foreground value written into masks
pub const FOREGROUND: u8 = 255;
/// Background value written into masks
pub const BACKGROUND: u8 = 0;

/// Convert an RGB pixel to HSV on the byte scale (H: 0-179, S: 0-255, V: 0-255).
#[inline]
pub fn rgb_to_hsv(Rgb([r, g, b]): Rgb<u8>) -> Hsv {
    let r_n = r as f32 / 255.0;
    let g_n = g as f32 / 255.0;
    let b_n = b as f32 / 255.0;

    let max = r_n.max(g_n).max(b_n);
    let min = r_n.min(g_n).min(b_n);
    let delta = max - min;

    let degrees = if delta < 1e-6 {
        0.0
    } else if max == r_n {
        60.0 * (((g_n - b_n) / delta) % 6.0)
    } else if max == g_n {
        60.0 * (((b_n - r_n) / delta) + 2.0)
    } else {
        60.0 * (((r_n - g_n) / delta) + 4.0)
    };
    let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };

    // Half-degree hue; 360 degrees lands back on 0
    let h = (degrees / 2.0).round() as u16 % 180;
    let s = if max < 1e-6 { 0.0 } else { delta / max * 255.0 };
    let v = max * 255.0;

    Hsv::new(h as u8, s.round() as u8, v.round() as u8)
}

/// Skin-tone segmenter working in HSV space with an optional Gaussian pre-blur
#[derive(Debug, Clone)]
pub struct HsvSegmenter {
    pub range: ColorRange,
    /// Standard deviation of the pre-blur; `0.0` disables it
    pub blur_sigma: f32,
}

impl Default for HsvSegmenter {
    fn default() -> Self {
        Self {
            range: ColorRange::default(),
            blur_sigma: 2.0,
        }
    }
}

impl HsvSegmenter {
    pub fn new(range: ColorRange, blur_sigma: f32) -> Self {
        Self { range, blur_sigma }
    }
}

impl ColorSegmenter for HsvSegmenter {
    fn segment(&self, frame: &RgbImage) -> Result<GrayImage> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(GuardError::EmptyFrame { width, height });
        }

        let blurred;
        let source = if self.blur_sigma > 0.0 {
            blurred = imageproc::filter::gaussian_blur_f32(frame, self.blur_sigma);
            &blurred
        } else {
            frame
        };

        Ok(GrayImage::from_fn(width, height, |x, y| {
            let hsv = rgb_to_hsv(*source.get_pixel(x, y));
            if self.range.contains(hsv) {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        }))
    }
}

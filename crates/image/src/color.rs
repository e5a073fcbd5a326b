//! RGB <-> CIE L*a*b* conversion on 8-bit planes.
//!
//! Uses sRGB companding and the D65 white point. Values are quantised the
//! way 8-bit Lab is conventionally stored:
//!
//! ```text
//! L8 = L* * 255 / 100      (0..=255)
//! a8 = a* + 128
//! b8 = b* + 128
//! ```
//!
//! A neutral gray therefore always has `a8 == b8 == 128`.

use image::{GrayImage, Luma, Rgb, RgbImage};
use once_cell::sync::Lazy;

// D65 reference white
const WHITE_X: f32 = 0.950_456;
const WHITE_Z: f32 = 1.088_754;

const EPSILON: f32 = 0.008_856;
const KAPPA: f32 = 903.3;

/// sRGB byte to linear light.
static SRGB_TO_LINEAR: Lazy<[f32; 256]> = Lazy::new(|| {
    let mut table = [0.0f32; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        let c = i as f32 / 255.0;
        *slot = if c <= 0.040_45 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        };
    }
    table
});

/// An image split into quantised L, a and b planes.
#[derive(Debug, Clone, PartialEq)]
pub struct LabPlanes {
    /// Lightness
    pub lightness: GrayImage,
    /// Green-red axis, offset by 128
    pub a: GrayImage,
    /// Blue-yellow axis, offset by 128
    pub b: GrayImage,
}

impl LabPlanes {
    /// Width and height shared by all three planes
    pub fn dimensions(&self) -> (u32, u32) {
        self.lightness.dimensions()
    }
}

/// Split an RGB image into Lab planes.
pub fn rgb_to_lab(image: &RgbImage) -> LabPlanes {
    let (width, height) = image.dimensions();
    let mut lightness = GrayImage::new(width, height);
    let mut a = GrayImage::new(width, height);
    let mut b = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let [l8, a8, b8] = pixel_to_lab(*pixel);
        lightness.put_pixel(x, y, Luma([l8]));
        a.put_pixel(x, y, Luma([a8]));
        b.put_pixel(x, y, Luma([b8]));
    }

    LabPlanes { lightness, a, b }
}

/// Recombine Lab planes into an RGB image.
pub fn lab_to_rgb(planes: &LabPlanes) -> RgbImage {
    let (width, height) = planes.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        lab_to_pixel([
            planes.lightness.get_pixel(x, y).0[0],
            planes.a.get_pixel(x, y).0[0],
            planes.b.get_pixel(x, y).0[0],
        ])
    })
}

/// Convert one sRGB pixel to quantised Lab.
pub fn pixel_to_lab(pixel: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0.map(|c| SRGB_TO_LINEAR[c as usize]);

    let x = (0.412_453 * r + 0.357_580 * g + 0.180_423 * b) / WHITE_X;
    let y = 0.212_671 * r + 0.715_160 * g + 0.072_169 * b;
    let z = (0.019_334 * r + 0.119_193 * g + 0.950_227 * b) / WHITE_Z;

    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
    let l = if y > EPSILON { 116.0 * fy - 16.0 } else { KAPPA * y };
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);

    [
        quantize(l * 255.0 / 100.0),
        quantize(a + 128.0),
        quantize(b + 128.0),
    ]
}

/// Convert one quantised Lab triple back to sRGB.
pub fn lab_to_pixel(lab: [u8; 3]) -> Rgb<u8> {
    let l = lab[0] as f32 * 100.0 / 255.0;
    let a = lab[1] as f32 - 128.0;
    let b = lab[2] as f32 - 128.0;

    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let y = if l > KAPPA * EPSILON { fy * fy * fy } else { l / KAPPA };
    let x = lab_f_inv(fx) * WHITE_X;
    let z = lab_f_inv(fz) * WHITE_Z;

    let r = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
    let g = -0.969_256 * x + 1.875_991 * y + 0.041_556 * z;
    let b = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;

    Rgb([r, g, b].map(|c| quantize(linear_to_srgb(c) * 255.0)))
}

fn lab_f(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inv(f: f32) -> f32 {
    let cubed = f * f * f;
    if cubed > EPSILON {
        cubed
    } else {
        (f - 16.0 / 116.0) / 7.787
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn quantize(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

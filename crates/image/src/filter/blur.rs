//! Fixed-size Gaussian smoothing.

use super::PhaseFilter;
use image::RgbImage;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const CHANNELS: usize = 3;

/// Venous-phase filter: separable Gaussian blur with reflect-101 borders.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianSmoother {
    kernel: Vec<f32>,
}

impl Default for GaussianSmoother {
    fn default() -> Self {
        Self::new(15)
    }
}

impl GaussianSmoother {
    /// Build a smoother for an odd `size` x `size` kernel.
    ///
    /// Sigma follows the size: `0.3 * ((size - 1) / 2 - 1) + 0.8`, which is
    /// 2.6 for the default 15 tap kernel. Even sizes are bumped to the next
    /// odd size.
    pub fn new(size: usize) -> Self {
        let size = size.max(1) | 1;
        let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
        Self {
            kernel: gaussian_kernel(size, sigma),
        }
    }

    /// Number of taps along each axis
    pub fn size(&self) -> usize {
        self.kernel.len()
    }

    /// Normalised one-dimensional weights
    pub fn kernel(&self) -> &[f32] {
        &self.kernel
    }
}

impl PhaseFilter for GaussianSmoother {
    fn name(&self) -> &'static str {
        "gaussian"
    }

    fn apply(&self, image: &RgbImage) -> RgbImage {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return image.clone();
        }
        let (w, h) = (width as usize, height as usize);
        let radius = (self.kernel.len() / 2) as isize;
        let src = image.as_raw();
        let row_len = w * CHANNELS;

        // Horizontal pass into floats.
        let mut horizontal = vec![0.0f32; row_len * h];
        for_each_row(&mut horizontal, row_len, |y, row| {
            let line = &src[y * row_len..(y + 1) * row_len];
            for x in 0..w {
                let mut acc = [0.0f32; CHANNELS];
                for (k, weight) in self.kernel.iter().enumerate() {
                    let sx = reflect_101(x as isize + k as isize - radius, w);
                    for c in 0..CHANNELS {
                        acc[c] += weight * line[sx * CHANNELS + c] as f32;
                    }
                }
                row[x * CHANNELS..(x + 1) * CHANNELS].copy_from_slice(&acc);
            }
        });

        // Vertical pass back to bytes.
        let mut out = RgbImage::new(width, height);
        for_each_row(&mut *out, row_len, |y, row| {
            for (i, slot) in row.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for (k, weight) in self.kernel.iter().enumerate() {
                    let sy = reflect_101(y as isize + k as isize - radius, h);
                    acc += weight * horizontal[sy * row_len + i];
                }
                *slot = acc.round().clamp(0.0, 255.0) as u8;
            }
        });

        out
    }
}

/// Sampled Gaussian of odd length `size`, normalised to sum to one.
fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    let radius = (size / 2) as f32;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - radius;
            (-(d * d) / denom).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Mirror an out-of-range index without repeating the edge sample
/// (`dcb|abcd|cba`).
fn reflect_101(mut i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

#[cfg(feature = "parallel")]
fn for_each_row<T, F>(buf: &mut [T], row_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    buf.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

#[cfg(not(feature = "parallel"))]
fn for_each_row<T, F>(buf: &mut [T], row_len: usize, f: F)
where
    F: Fn(usize, &mut [T]),
{
    buf.chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

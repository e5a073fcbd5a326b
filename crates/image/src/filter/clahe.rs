//! Contrast limited adaptive histogram equalization.

use super::PhaseFilter;
use crate::color::{lab_to_rgb, rgb_to_lab};
use image::{GrayImage, RgbImage};

const BINS: usize = 256;

/// CLAHE over a single 8-bit plane.
///
/// The plane is split into a `grid_x` by `grid_y` grid of tiles. Each tile
/// gets its own equalization table from a clipped histogram, and every
/// output pixel blends the tables of the four nearest tile centres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clahe {
    /// Histogram clip as a multiple of the mean bin height; `0` disables clipping
    pub clip_limit: f32,
    /// Tiles across
    pub grid_x: u32,
    /// Tiles down
    pub grid_y: u32,
}

impl Default for Clahe {
    fn default() -> Self {
        Self {
            clip_limit: 3.0,
            grid_x: 8,
            grid_y: 8,
        }
    }
}

impl Clahe {
    /// Equalize a plane, returning a new plane of the same size.
    pub fn apply(&self, plane: &GrayImage) -> GrayImage {
        let (width, height) = plane.dimensions();
        if width == 0 || height == 0 {
            return plane.clone();
        }

        // A grid finer than the image degenerates to one tile per row/column.
        let tiles_x = self.grid_x.clamp(1, width);
        let tiles_y = self.grid_y.clamp(1, height);

        let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
        for ty in 0..tiles_y {
            let (y0, y1) = tile_span(ty, tiles_y, height);
            for tx in 0..tiles_x {
                let (x0, x1) = tile_span(tx, tiles_x, width);
                luts.push(self.tile_lut(plane, x0, x1, y0, y1));
            }
        }

        let columns = interpolation_weights(width, tiles_x);
        let rows = interpolation_weights(height, tiles_y);
        let index = |tx: u32, ty: u32| (ty * tiles_x + tx) as usize;

        GrayImage::from_fn(width, height, |x, y| {
            let v = plane.get_pixel(x, y).0[0] as usize;
            let (tx1, tx2, xa) = columns[x as usize];
            let (ty1, ty2, ya) = rows[y as usize];

            let top = luts[index(tx1, ty1)][v] as f32 * (1.0 - xa)
                + luts[index(tx2, ty1)][v] as f32 * xa;
            let bottom = luts[index(tx1, ty2)][v] as f32 * (1.0 - xa)
                + luts[index(tx2, ty2)][v] as f32 * xa;
            let blended = top * (1.0 - ya) + bottom * ya;

            image::Luma([blended.round().clamp(0.0, 255.0) as u8])
        })
    }

    /// Equalization table for the tile `[x0, x1) x [y0, y1)`.
    fn tile_lut(&self, plane: &GrayImage, x0: u32, x1: u32, y0: u32, y1: u32) -> [u8; BINS] {
        let mut hist = [0u32; BINS];
        for y in y0..y1 {
            for x in x0..x1 {
                hist[plane.get_pixel(x, y).0[0] as usize] += 1;
            }
        }

        let area = (x1 - x0) * (y1 - y0);
        if self.clip_limit > 0.0 {
            let limit = ((self.clip_limit * area as f32 / BINS as f32) as u32).max(1);
            clip_histogram(&mut hist, limit);
        }

        let scale = 255.0 / area as f32;
        let mut lut = [0u8; BINS];
        let mut sum = 0u32;
        for (slot, count) in lut.iter_mut().zip(hist.iter()) {
            sum += count;
            *slot = (sum as f32 * scale).round().min(255.0) as u8;
        }
        lut
    }
}

/// Cap every bin at `limit` and hand the excess back out evenly.
///
/// Whatever does not divide evenly goes one count at a time to bins spaced
/// `BINS / residual` apart, starting at bin 0.
fn clip_histogram(hist: &mut [u32; BINS], limit: u32) {
    let mut excess = 0u32;
    for count in hist.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }

    let batch = excess / BINS as u32;
    let mut residual = excess - batch * BINS as u32;
    for count in hist.iter_mut() {
        *count += batch;
    }

    if residual > 0 {
        let step = (BINS as u32 / residual).max(1) as usize;
        let mut i = 0;
        while i < BINS && residual > 0 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }
}

/// Pixel range `[start, end)` covered by tile `index` of `tiles`.
fn tile_span(index: u32, tiles: u32, extent: u32) -> (u32, u32) {
    let start = (index as u64 * extent as u64 / tiles as u64) as u32;
    let end = ((index as u64 + 1) * extent as u64 / tiles as u64) as u32;
    (start, end)
}

/// For each pixel along one axis: the two neighbouring tile indices and
/// the weight of the second one.
fn interpolation_weights(extent: u32, tiles: u32) -> Vec<(u32, u32, f32)> {
    let tile_size = extent as f32 / tiles as f32;
    let last = tiles as i64 - 1;

    (0..extent)
        .map(|p| {
            let pos = (p as f32 + 0.5) / tile_size - 0.5;
            let first = pos.floor();
            let weight = pos - first;
            let first = first as i64;
            (
                first.clamp(0, last) as u32,
                (first + 1).clamp(0, last) as u32,
                weight,
            )
        })
        .collect()
}

/// Arterial-phase filter: CLAHE on Lab lightness, chroma untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContrastEnhancer {
    /// Equalization settings for the lightness plane
    pub clahe: Clahe,
}

impl PhaseFilter for ContrastEnhancer {
    fn name(&self) -> &'static str {
        "clahe"
    }

    fn apply(&self, image: &RgbImage) -> RgbImage {
        let mut planes = rgb_to_lab(image);
        planes.lightness = self.clahe.apply(&planes.lightness);
        lab_to_rgb(&planes)
    }
}

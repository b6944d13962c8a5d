// seascan_core/src/waterfall.rs

use crate::types::ProfileSample;

/// Bytes per pixel of the rasterized rows (RGBA).
pub const CHANNELS: usize = 4;

/// Converts one profile into a grayscale RGBA pixel row:
/// `R = G = B = round(intensity * 255)`, `A = 255`.
pub fn rasterize_row(profile: &[ProfileSample], out: &mut [u8]) {
    debug_assert_eq!(out.len(), profile.len() * CHANNELS);
    for (sample, pixel) in profile.iter().zip(out.chunks_exact_mut(CHANNELS)) {
        let level = (sample.intensity * 255.0).round() as u8;
        pixel[0] = level;
        pixel[1] = level;
        pixel[2] = level;
        pixel[3] = 255;
    }
}

/// The scrolling waterfall display buffer: a fixed-height history of
/// rasterized profile rows, newest at row 0.
///
/// The only pipeline state that persists across ticks. Not designed for
/// concurrent mutation; the sensor serializes ticks.
pub struct Waterfall {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Waterfall {
    /// Starts as opaque black so the buffer can be handed to a blitter
    /// before the first scan arrives.
    pub fn new(width: usize, height: usize) -> Self {
        let mut data = vec![0u8; width * height * CHANNELS];
        for pixel in data.chunks_exact_mut(CHANNELS) {
            pixel[3] = 255;
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width * CHANNELS
    }

    /// Shifts every row down by one (discarding the oldest) and writes the
    /// new row at index 0.
    pub fn push_row(&mut self, row: &[u8]) {
        let stride = self.stride();
        debug_assert_eq!(row.len(), stride);
        if self.height > 1 {
            self.data.copy_within(0..stride * (self.height - 1), stride);
        }
        self.data[..stride].copy_from_slice(row);
    }

    /// Flat row-major RGBA byte view for blitting into a display surface.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn row(&self, index: usize) -> &[u8] {
        let stride = self.stride();
        &self.data[index * stride..(index + 1) * stride]
    }
}

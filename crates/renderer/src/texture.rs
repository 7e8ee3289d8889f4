//! Normalized texture storage consulted by shaders during color calculation.
//!
//! A [`TextureMap`] is filled once (from a [`PackedRaster`], optionally followed
//! by [`TextureMap::invert`]) and then shared read-only, typically behind an
//! `Arc`, by every render worker. Mutation needs `&mut self`, so the borrow
//! checker keeps loading and sampling from overlapping.

use image::{DynamicImage, GenericImageView, GrayImage, RgbImage, RgbaImage};

use crate::error::TextureError;
use crate::types::{Uv, Viewport};

/// Largest number of channels a map can hold.
pub const MAX_CHANNELS: usize = 3;

/// In-memory raster that exposes each pixel as a packed `0xAARRGGBB` integer.
///
/// Byte 0 (least significant) is blue, byte 1 green, byte 2 red.
pub trait PackedRaster {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn pixel(&self, x: u32, y: u32) -> u32;
}

fn pack_argb(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (u32::from(a) << 24) | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

impl PackedRaster for RgbaImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        let [r, g, b, a] = self.get_pixel(x, y).0;
        pack_argb(r, g, b, a)
    }
}

impl PackedRaster for RgbImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        let [r, g, b] = self.get_pixel(x, y).0;
        pack_argb(r, g, b, u8::MAX)
    }
}

impl PackedRaster for GrayImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        let [luma] = self.get_pixel(x, y).0;
        pack_argb(luma, luma, luma, u8::MAX)
    }
}

impl PackedRaster for DynamicImage {
    fn width(&self) -> u32 {
        GenericImageView::width(self)
    }

    fn height(&self) -> u32 {
        GenericImageView::height(self)
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        let [r, g, b, a] = self.get_pixel(x, y).0;
        pack_argb(r, g, b, a)
    }
}

/// Row-major packed pixels held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedPixels {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PackedPixels {
    /// Wraps `pixels`; returns `None` when the length is not `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }
}

impl PackedRaster for PackedPixels {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

/// Dense store of normalized `f32` texels with 1, 2, or 3 channels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureMap {
    data: Vec<f32>,
    channels: usize,
    width: u32,
    height: u32,
}

impl TextureMap {
    /// Allocates a zeroed map.
    pub fn new(channels: usize, width: u32, height: u32) -> Result<Self, TextureError> {
        if !(1..=MAX_CHANNELS).contains(&channels) {
            return Err(TextureError::InvalidChannelCount(channels));
        }
        let dimensions = Viewport::new(width, height);
        if dimensions.is_empty() {
            return Err(TextureError::EmptyDimensions(dimensions));
        }
        Ok(Self {
            data: vec![0.0; dimensions.pixel_count() * channels],
            channels,
            width,
            height,
        })
    }

    /// Allocates a map matching `raster` and loads it.
    pub fn from_raster<R>(raster: &R, channels: usize) -> Result<Self, TextureError>
    where
        R: PackedRaster + ?Sized,
    {
        let mut map = Self::new(channels, raster.width(), raster.height())?;
        map.load_from(raster)?;
        Ok(map)
    }

    /// Overwrites every texel from `raster`, which must have identical dimensions.
    ///
    /// Byte plane `i` of each packed pixel lands in channel slot
    /// `channels - 1 - i`, so a 3-channel map stores `[r, g, b]` and a
    /// 1-channel map stores the lowest byte (blue, or luma for gray sources).
    pub fn load_from<R>(&mut self, raster: &R) -> Result<(), TextureError>
    where
        R: PackedRaster + ?Sized,
    {
        let actual = Viewport::new(raster.width(), raster.height());
        if actual != self.dimensions() {
            return Err(TextureError::DimensionMismatch {
                expected: self.dimensions(),
                actual,
            });
        }

        let channels = self.channels;
        for y in 0..self.height {
            for x in 0..self.width {
                let packed = raster.pixel(x, y);
                let base = self.index(x as usize, y as usize);
                let texel = &mut self.data[base..base + channels];
                for i in 0..channels {
                    let byte = (packed >> (i * 8)) & 0xff;
                    texel[channels - 1 - i] = byte as f32 / 255.0;
                }
            }
        }

        tracing::trace!(
            channels,
            size = %self.dimensions(),
            "loaded texture map from raster"
        );
        Ok(())
    }

    /// Borrows the `channels` values of the texel under `uv`.
    ///
    /// The pixel is found by truncating `uv * dimension` on each axis with no
    /// clamping. A coordinate of exactly 1.0 addresses one past the edge: on
    /// the x axis this reads the first texel of the next row, and on the last
    /// row it panics. Sample pixel centers or use [`Self::sample_clamped`].
    pub fn sample(&self, uv: Uv) -> &[f32] {
        let base = self.offset(uv);
        &self.data[base..base + self.channels]
    }

    /// Copies the texel under `uv` into the front of `out` and returns that prefix.
    ///
    /// Panics if `out` is shorter than [`Self::channels`].
    pub fn sample_into<'a>(&self, uv: Uv, out: &'a mut [f32]) -> &'a [f32] {
        let texel = &mut out[..self.channels];
        texel.copy_from_slice(self.sample(uv));
        texel
    }

    /// Like [`Self::sample`] but clamps the pixel index into the map.
    pub fn sample_clamped(&self, uv: Uv) -> &[f32] {
        let x = ((self.width as f32 * uv.x) as usize).min(self.width as usize - 1);
        let y = ((self.height as f32 * uv.y) as usize).min(self.height as usize - 1);
        let base = self.index(x, y);
        &self.data[base..base + self.channels]
    }

    /// Returns the value under `uv` of a 1-channel map.
    pub fn sample_single(&self, uv: Uv) -> Result<f32, TextureError> {
        if self.channels != 1 {
            return Err(TextureError::WrongComponentCount(self.channels));
        }
        Ok(self.data[self.offset(uv)])
    }

    /// Replaces every value `v` with `1 - v`.
    pub fn invert(&mut self) {
        for value in &mut self.data {
            *value = 1.0 - *value;
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    /// Raw texel storage, `channels` floats per pixel in row-major order.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    fn offset(&self, uv: Uv) -> usize {
        let x = (self.width as f32 * uv.x) as usize;
        let y = (self.height as f32 * uv.y) as usize;
        self.index(x, y)
    }

    fn index(&self, x: usize, y: usize) -> usize {
        self.channels * (y * self.width as usize + x)
    }
}

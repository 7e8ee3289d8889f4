use std::path::Path;

use anyhow::{Context, Result};
use image::RgbImage;

use crate::types::{Rgb, Viewport};

/// Writable surface that receives finished frames.
///
/// Nothing is read back from a target; display or encoding happens elsewhere.
pub trait RenderTarget {
    fn size(&self) -> Viewport;
    fn write(&mut self, x: u32, y: u32, color: Rgb);
}

impl<T: RenderTarget + ?Sized> RenderTarget for &mut T {
    fn size(&self) -> Viewport {
        (**self).size()
    }

    fn write(&mut self, x: u32, y: u32, color: Rgb) {
        (**self).write(x, y, color)
    }
}

/// Floating-point RGB frame in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    viewport: Viewport,
    pixels: Vec<Rgb>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let viewport = Viewport::new(width, height);
        Self {
            viewport,
            pixels: vec![Rgb::BLACK; viewport.pixel_count()],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Rgb {
        self.pixels[self.index(x, y)]
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Flat `[r, g, b, r, g, b, ...]` view of the frame.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }

    pub fn to_rgb8_image(&self) -> RgbImage {
        RgbImage::from_fn(self.viewport.width, self.viewport.height, |x, y| {
            image::Rgb(self.get(x, y).to_rgb8())
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.viewport.width as usize + x as usize
    }
}

impl RenderTarget for FrameBuffer {
    fn size(&self) -> Viewport {
        self.viewport
    }

    fn write(&mut self, x: u32, y: u32, color: Rgb) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }
}

/// 8-bit RGB image target; colors are clamped and quantized on write.
#[derive(Debug, Clone)]
pub struct ImageTarget {
    image: RgbImage,
}

impl ImageTarget {
    /// Creates a black image of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Encodes the image; the format follows the file extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.image
            .save(path)
            .with_context(|| format!("failed to write frame to {}", path.display()))
    }
}

impl RenderTarget for ImageTarget {
    fn size(&self) -> Viewport {
        Viewport::new(self.image.width(), self.image.height())
    }

    fn write(&mut self, x: u32, y: u32, color: Rgb) {
        self.image.put_pixel(x, y, image::Rgb(color.to_rgb8()));
    }
}

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

/// Normalized 2D coordinate with both axes nominally in `[0, 1]`.
///
/// `x` grows to the right and `y` grows downwards, matching raster row order.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Uv {
    pub x: f32,
    pub y: f32,
}

impl Uv {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Coordinate of the center of pixel `(x, y)` in a `width` x `height` grid.
    ///
    /// Never reaches 1.0 on either axis, so truncating lookups stay in bounds.
    pub fn pixel_center(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x: (x as f32 + 0.5) / width as f32,
            y: (y as f32 + 0.5) / height as f32,
        }
    }
}

/// Alpha-less color with components nominally in `[0, 1]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }

    pub fn set(&mut self, r: f32, g: f32, b: f32) {
        self.r = r;
        self.g = g;
        self.b = b;
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    /// Quantizes to 8-bit channels, clamping out-of-range components first.
    pub fn to_rgb8(self) -> [u8; 3] {
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }
}

fn quantize(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Pixel dimensions of a render target or shader viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Width over height; 1.0 for an empty viewport.
    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_center_stays_inside_unit_square() {
        let last = Uv::pixel_center(3, 3, 4, 4);
        assert!((last.x - 0.875).abs() < 1e-6);
        assert!(last.x < 1.0 && last.y < 1.0);
        assert_eq!((last.x * 4.0) as u32, 3);
    }

    #[test]
    fn rgb_quantization_clamps_and_rounds() {
        assert_eq!(Rgb::new(-0.5, 0.5, 2.0).to_rgb8(), [0, 128, 255]);
        assert_eq!(Rgb::WHITE.to_rgb8(), [255, 255, 255]);
    }

    #[test]
    fn rgb_is_viewable_as_floats() {
        let pixels = [Rgb::new(0.1, 0.2, 0.3), Rgb::splat(1.0)];
        let floats: &[f32] = bytemuck::cast_slice(&pixels);
        assert_eq!(floats, &[0.1, 0.2, 0.3, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn viewport_aspect_handles_empty() {
        assert_eq!(Viewport::new(0, 10).aspect(), 1.0);
        assert!((Viewport::new(1920, 1080).aspect() - 16.0 / 9.0).abs() < 1e-6);
    }
}

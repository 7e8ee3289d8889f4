//! Built-in demo shaders driven by the `rayshade` front end.
//!
//! - `gradient` animates the classic cosine palette across the screen and
//!   needs no texture.
//! - `texture` shows a [`TextureMap`](renderer::TextureMap) letterboxed into the
//!   viewport.
//! - `sphere` casts one ray per pixel from an orbit camera, wraps the texture
//!   around a unit sphere and lights it with a slowly orbiting sun.

mod gradient;
mod math;
mod sphere;
mod texture;

pub use gradient::GradientShader;
pub use sphere::{RayStats, SphereCamera, SphereShader};
pub use texture::TextureShader;

use renderer::Rgb;

/// Expands 1-3 texture channels into a color: gray, red-green, or RGB.
fn texel_to_rgb(texel: &[f32]) -> Rgb {
    match *texel {
        [value] => Rgb::splat(value),
        [r, g] => Rgb::new(r, g, 0.0),
        [r, g, b, ..] => Rgb::new(r, g, b),
        [] => Rgb::BLACK,
    }
}

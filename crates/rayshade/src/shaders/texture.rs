use std::sync::Arc;

use anyhow::Result;
use renderer::{Rgb, Shader, TextureMap, Uv};

use super::texel_to_rgb;

/// Shows a texture scaled to fit the viewport, letterboxed in black.
pub struct TextureShader {
    texture: Arc<TextureMap>,
    scale: (f32, f32),
}

impl TextureShader {
    pub fn new(texture: Arc<TextureMap>) -> Self {
        Self {
            texture,
            scale: (1.0, 1.0),
        }
    }
}

impl Shader for TextureShader {
    type Runtime = ();

    fn calculate_color_into(&self, uv: Uv, out: &mut Rgb, _: &mut ()) -> Result<()> {
        let u = (uv.x - 0.5) * self.scale.0 + 0.5;
        let v = (uv.y - 0.5) * self.scale.1 + 0.5;
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            *out = Rgb::BLACK;
            return Ok(());
        }
        *out = texel_to_rgb(self.texture.sample_clamped(Uv::new(u, v)));
        Ok(())
    }

    fn set_viewport_size(&mut self, width: u32, height: u32) {
        let view = width as f32 / height as f32;
        let texture = self.texture.dimensions().aspect();
        self.scale = if view > texture {
            (view / texture, 1.0)
        } else {
            (1.0, texture / view)
        };
    }

    fn create_runtime(&self) {}
}

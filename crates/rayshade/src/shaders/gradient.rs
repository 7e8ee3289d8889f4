use std::f32::consts::TAU;

use anyhow::Result;
use renderer::{BoxedTimeSource, Rgb, Shader, Uv};

/// Cosine palette sweeping across the screen over time.
pub struct GradientShader {
    clock: BoxedTimeSource,
    time: f32,
    aspect: f32,
}

impl GradientShader {
    pub fn new(clock: BoxedTimeSource) -> Self {
        Self {
            clock,
            time: 0.0,
            aspect: 1.0,
        }
    }
}

impl Shader for GradientShader {
    type Runtime = ();

    fn calculate_color_into(&self, uv: Uv, out: &mut Rgb, _: &mut ()) -> Result<()> {
        let x = (uv.x - 0.5) * self.aspect;
        let y = uv.y - 0.5;
        let radius = (x * x + y * y).sqrt();
        out.set(
            0.5 + 0.5 * (self.time + uv.x * TAU).cos(),
            0.5 + 0.5 * (self.time + uv.y * TAU + 2.0).cos(),
            0.5 + 0.5 * (self.time + radius * TAU + 4.0).cos(),
        );
        Ok(())
    }

    fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    fn on_frame_start(&mut self) {
        self.time = self.clock.sample().seconds;
    }

    fn create_runtime(&self) {}
}

use anyhow::Result;

use crate::types::{Rgb, Uv};

/// A per-pixel color function evaluated by the [`Dispatcher`](crate::Dispatcher).
///
/// The split between `&self` and `&mut self` encodes the threading rules:
///
/// * [`set_viewport_size`](Shader::set_viewport_size) and
///   [`on_frame_start`](Shader::on_frame_start) mutate frame-global state and
///   only ever run on the dispatching thread, between render passes.
/// * [`calculate_color_into`](Shader::calculate_color_into) runs concurrently on
///   every worker. It may read the shader but writes only to the worker's own
///   [`Runtime`](Shader::Runtime) and the output color.
///
/// The result must depend only on the coordinate, the runtime contents, and
/// whatever the most recent lifecycle calls fixed.
pub trait Shader: Sync {
    /// Mutable scratch space owned by exactly one worker for a render pass.
    type Runtime: Send;

    /// Writes the color for screen coordinate `uv` into `out`.
    fn calculate_color_into(&self, uv: Uv, out: &mut Rgb, runtime: &mut Self::Runtime)
        -> Result<()>;

    /// Allocating convenience over [`calculate_color_into`](Shader::calculate_color_into).
    fn calculate_color(&self, uv: Uv, runtime: &mut Self::Runtime) -> Result<Rgb> {
        let mut color = Rgb::default();
        self.calculate_color_into(uv, &mut color, runtime)?;
        Ok(color)
    }

    /// Called before the first frame and whenever the target size changes.
    fn set_viewport_size(&mut self, width: u32, height: u32);

    /// Called once per frame before any pixel of that frame is shaded.
    fn on_frame_start(&mut self) {}

    /// Creates a fresh runtime for one worker.
    ///
    /// Workers may call this concurrently, so it must not touch shared state.
    fn create_runtime(&self) -> Self::Runtime;
}

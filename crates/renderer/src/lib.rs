//! CPU shading substrate for ray-based image synthesis.
//!
//! The crate provides three collaborators and the loop that ties them together:
//!
//! ```text
//!   TextureMap ◀── sampled by ── Shader::calculate_color_into(uv, out, runtime)
//!                                      ▲
//!                                      │ one Runtime per worker
//!   Dispatcher::render_frame ──────────┘──▶ FrameBuffer bands ──▶ RenderTarget::write
//! ```
//!
//! * [`TextureMap`] holds normalized texel data loaded from any [`PackedRaster`].
//! * [`Shader`] is the per-pixel color function with its per-thread
//!   [`Shader::Runtime`] and single-threaded lifecycle hooks.
//! * [`RenderTarget`] is the sink for finished frames.
//! * [`Dispatcher`] partitions each frame into row bands, shades them on scoped
//!   worker threads and publishes the result after all workers have joined.

pub mod clock;
pub mod dispatch;
pub mod error;
pub mod shader;
pub mod target;
pub mod texture;
pub mod types;

pub use clock::{
    time_source_for, BoxedTimeSource, FixedTimeSource, SystemTimeSource, TimeSample, TimeSource,
};
pub use dispatch::{DispatchOptions, Dispatcher, FrameStats, RuntimeReuse};
pub use error::{RenderError, TextureError};
pub use shader::Shader;
pub use target::{FrameBuffer, ImageTarget, RenderTarget};
pub use texture::{PackedPixels, PackedRaster, TextureMap, MAX_CHANNELS};
pub use types::{Rgb, Uv, Viewport};

//! Parallel frame dispatch.
//!
//! One call to [`Dispatcher::render_frame`] runs a full render pass:
//!
//! ```text
//!   on_frame_start() ─▶ set_viewport_size()? ─▶ split rows into bands
//!                                                    │
//!            ┌───────────────┬───────────────────────┤
//!            ▼               ▼                       ▼
//!        worker 0        worker 1      ...       worker N-1
//!     (own Runtime)    (own Runtime)           (own Runtime)
//!            └───────────────┴───────────┬───────────┘
//!                                        ▼
//!                         join ─▶ publish to RenderTarget
//! ```
//!
//! Workers shade into disjoint row bands of a private [`FrameBuffer`]. The
//! target only sees the frame once every worker has finished successfully.

use std::num::NonZeroUsize;
use std::thread;
use std::time::Instant;

use serde::Serialize;

use crate::error::RenderError;
use crate::shader::Shader;
use crate::target::{FrameBuffer, RenderTarget};
use crate::types::{Rgb, Uv, Viewport};

/// Lifetime of the per-worker shader runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeReuse {
    /// Create a fresh runtime on every worker at the start of each pass.
    #[default]
    PerPass,
    /// Keep one runtime per worker slot and hand it back every frame. The
    /// slots are rebuilt when the worker count changes.
    PerSlot,
}

/// Tuning knobs for a [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOptions {
    /// Worker thread count; `None` uses the available hardware parallelism.
    pub workers: Option<NonZeroUsize>,
    pub runtimes: RuntimeReuse,
}

impl DispatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker count; zero selects the hardware default.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = NonZeroUsize::new(workers);
        self
    }

    pub fn with_runtime_reuse(mut self, runtimes: RuntimeReuse) -> Self {
        self.runtimes = runtimes;
        self
    }

    /// Worker count before it is capped to the frame height.
    pub fn worker_count(&self) -> usize {
        self.workers.map(NonZeroUsize::get).unwrap_or_else(|| {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }
}

/// Summary of one dispatched frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameStats {
    /// Zero-based index of the frame within this dispatcher.
    pub frame_index: u64,
    pub viewport: Viewport,
    pub workers: usize,
    /// Pixels shaded by each worker, indexed by worker.
    pub pixels_per_worker: Vec<usize>,
    pub elapsed_ms: f64,
}

/// Drives full-frame render passes for one shader type.
pub struct Dispatcher<S: Shader> {
    options: DispatchOptions,
    last_viewport: Option<Viewport>,
    frame_index: u64,
    slots: Vec<S::Runtime>,
    frame: FrameBuffer,
}

impl<S: Shader> Dispatcher<S> {
    pub fn new(options: DispatchOptions) -> Self {
        Self {
            options,
            last_viewport: None,
            frame_index: 0,
            slots: Vec::new(),
            frame: FrameBuffer::new(0, 0),
        }
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Number of frames dispatched so far, including failed ones.
    pub fn frames_rendered(&self) -> u64 {
        self.frame_index
    }

    /// Runtimes retained under [`RuntimeReuse::PerSlot`], indexed by worker.
    pub fn runtimes(&self) -> &[S::Runtime] {
        &self.slots
    }

    /// Renders one frame of `shader` into `target`.
    ///
    /// On failure nothing is written to `target`. When several workers fail,
    /// the error of the lowest-numbered worker is returned; the others are
    /// logged.
    pub fn render_frame<T>(&mut self, shader: &mut S, target: &mut T) -> Result<FrameStats, RenderError>
    where
        T: RenderTarget + ?Sized,
    {
        let viewport = target.size();
        if viewport.is_empty() {
            return Err(RenderError::EmptyViewport(viewport));
        }
        let started = Instant::now();
        let frame_index = self.frame_index;
        self.frame_index += 1;

        shader.on_frame_start();
        if self.last_viewport != Some(viewport) {
            tracing::debug!(%viewport, "viewport changed; resizing shader");
            shader.set_viewport_size(viewport.width, viewport.height);
            self.last_viewport = Some(viewport);
        }
        let shader: &S = shader;

        let workers = self.options.worker_count().min(viewport.height as usize);
        if self.options.runtimes == RuntimeReuse::PerSlot && self.slots.len() != workers {
            tracing::debug!(workers, "creating per-slot shader runtimes");
            self.slots.clear();
            self.slots.extend((0..workers).map(|_| shader.create_runtime()));
        }
        if self.frame.size() != viewport {
            self.frame = FrameBuffer::new(viewport.width, viewport.height);
        }

        tracing::debug!(frame = frame_index, %viewport, workers, "dispatching frame");

        let bands = split_bands(self.frame.pixels_mut(), viewport, workers);
        let mut reused = self.slots.iter_mut();
        let outcomes: Vec<Result<usize, RenderError>> = thread::scope(|scope| {
            let handles: Vec<_> = bands
                .into_iter()
                .map(|band| {
                    let slot = reused.next();
                    scope.spawn(move || {
                        let mut fresh = None;
                        let runtime = match slot {
                            Some(runtime) => runtime,
                            None => fresh.insert(shader.create_runtime()),
                        };
                        shade_band(shader, band, viewport, runtime)
                    })
                })
                .collect();

            handles
                .into_iter()
                .enumerate()
                .map(|(worker, handle)| {
                    handle
                        .join()
                        .unwrap_or(Err(RenderError::WorkerPanicked { worker }))
                })
                .collect()
        });

        let mut pixels_per_worker = Vec::with_capacity(workers);
        let mut first_error = None;
        for outcome in outcomes {
            match outcome {
                Ok(shaded) => pixels_per_worker.push(shaded),
                Err(error) => {
                    tracing::warn!(frame = frame_index, error = %error, "render worker failed");
                    pixels_per_worker.push(0);
                    first_error.get_or_insert(error);
                }
            }
        }
        if let Some(error) = first_error {
            return Err(error);
        }

        publish(&self.frame, target);

        let stats = FrameStats {
            frame_index,
            viewport,
            workers,
            pixels_per_worker,
            elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
        };
        tracing::trace!(frame = frame_index, elapsed_ms = stats.elapsed_ms, "frame complete");
        Ok(stats)
    }
}

impl<S: Shader> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new(DispatchOptions::default())
    }
}

/// Contiguous rows assigned to one worker.
struct Band<'a> {
    worker: usize,
    first_row: u32,
    pixels: &'a mut [Rgb],
}

/// Splits the frame into `workers` row bands whose sizes differ by at most one row.
fn split_bands(pixels: &mut [Rgb], viewport: Viewport, workers: usize) -> Vec<Band<'_>> {
    let width = viewport.width as usize;
    let height = viewport.height as usize;
    let rows_per_worker = height / workers;
    let remainder = height % workers;

    let mut bands = Vec::with_capacity(workers);
    let mut remaining = pixels;
    let mut first_row = 0;
    for worker in 0..workers {
        let rows = rows_per_worker + usize::from(worker < remainder);
        let (chunk, rest) = std::mem::take(&mut remaining).split_at_mut(rows * width);
        bands.push(Band {
            worker,
            first_row: first_row as u32,
            pixels: chunk,
        });
        remaining = rest;
        first_row += rows;
    }
    bands
}

/// Shades every pixel of `band`, stopping at the first shader error.
fn shade_band<S: Shader>(
    shader: &S,
    band: Band<'_>,
    viewport: Viewport,
    runtime: &mut S::Runtime,
) -> Result<usize, RenderError> {
    let mut color = Rgb::default();
    let width = viewport.width as usize;
    tracing::trace!(
        worker = band.worker,
        first_row = band.first_row,
        rows = band.pixels.len() / width,
        "shading band"
    );

    for (row, line) in band.pixels.chunks_mut(width).enumerate() {
        let y = band.first_row + row as u32;
        for (x, pixel) in line.iter_mut().enumerate() {
            let x = x as u32;
            let uv = Uv::pixel_center(x, y, viewport.width, viewport.height);
            shader
                .calculate_color_into(uv, &mut color, runtime)
                .map_err(|source| RenderError::Shader {
                    worker: band.worker,
                    x,
                    y,
                    source,
                })?;
            *pixel = color;
        }
    }
    Ok(band.pixels.len())
}

fn publish<T: RenderTarget + ?Sized>(frame: &FrameBuffer, target: &mut T) {
    let width = frame.size().width as usize;
    for (y, line) in frame.pixels().chunks(width).enumerate() {
        for (x, color) in line.iter().enumerate() {
            target.write(x as u32, y as u32, *color);
        }
    }
}

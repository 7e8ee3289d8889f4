use crate::types::Viewport;

/// Failures raised by [`TextureMap`](crate::TextureMap) construction, ingestion and lookup.
///
/// Each variant signals a caller or configuration mistake; none of them is
/// transient, so they are meant to be propagated rather than retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextureError {
    #[error("texture maps support 1, 2, or 3 channels (got {0})")]
    InvalidChannelCount(usize),
    #[error("texture dimensions must be non-zero (got {0})")]
    EmptyDimensions(Viewport),
    #[error("source image is {actual} but the texture map is {expected}")]
    DimensionMismatch { expected: Viewport, actual: Viewport },
    #[error("single-value sampling requires a 1-channel map (this map has {0})")]
    WrongComponentCount(usize),
}

/// Failures raised while dispatching a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render target has an empty viewport ({0})")]
    EmptyViewport(Viewport),
    #[error("shader failed on worker {worker} at pixel ({x}, {y})")]
    Shader {
        worker: usize,
        x: u32,
        y: u32,
        #[source]
        source: anyhow::Error,
    },
    #[error("render worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use frameconfig::{RenderConfig, ShaderKind, TextureSection};
use image::RgbaImage;
use renderer::{
    time_source_for, DispatchOptions, Dispatcher, FrameStats, ImageTarget, RuntimeReuse, Shader,
    TextureMap,
};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;
use crate::settings::{load_config, resolve};
use crate::shaders::{GradientShader, RayStats, SphereCamera, SphereShader, TextureShader};

const CHECKER_SIZE: (u32, u32) = (64, 32);
const CHECKER_CELL: u32 = 8;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the effective settings: config file first, then command-line flags.
pub fn effective_config(args: &RunArgs) -> Result<RenderConfig> {
    let paths = AppPaths::discover()?;
    tracing::debug!(config = %paths.config_dir().display(), "resolved rayshade paths");
    let config = load_config(args, &paths)?;
    resolve(config, args)
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = effective_config(&args)?;
    let options = DispatchOptions::new()
        .with_workers(config.workers().unwrap_or(0))
        .with_runtime_reuse(if config.render.reuse_runtimes {
            RuntimeReuse::PerSlot
        } else {
            RuntimeReuse::PerPass
        });
    let clock = time_source_for(config.render.time);

    tracing::info!(
        shader = %config.shader.kind,
        size = %config.render.size,
        workers = options.worker_count(),
        frames = config.render.frames,
        "starting render"
    );

    let stats = match config.shader.kind {
        ShaderKind::Gradient => render_with(&config, options, GradientShader::new(clock))?.0,
        ShaderKind::Texture => {
            let texture = load_texture(config.texture.as_ref())?;
            render_with(&config, options, TextureShader::new(texture))?.0
        }
        ShaderKind::Sphere => {
            let texture = load_texture(config.texture.as_ref())?;
            let camera = SphereCamera::new(config.shader.yaw, config.shader.pitch);
            let (stats, dispatcher) =
                render_with(&config, options, SphereShader::new(texture, camera, clock))?;
            log_ray_stats(dispatcher.runtimes());
            stats
        }
    };

    if let Some(path) = &config.output.stats {
        write_stats(path, &stats)?;
    }
    Ok(())
}

/// Dispatches every configured frame and writes the last one to the output path.
fn render_with<S: Shader>(
    config: &RenderConfig,
    options: DispatchOptions,
    mut shader: S,
) -> Result<(Vec<FrameStats>, Dispatcher<S>)> {
    let size = config.render.size;
    let mut target = ImageTarget::new(size.width, size.height);
    let mut dispatcher = Dispatcher::new(options);
    let mut stats = Vec::with_capacity(config.render.frames as usize);

    for _ in 0..config.render.frames {
        let frame = dispatcher
            .render_frame(&mut shader, &mut target)
            .with_context(|| format!("failed to render frame {}", dispatcher.frames_rendered()))?;
        tracing::debug!(
            frame = frame.frame_index,
            elapsed_ms = frame.elapsed_ms,
            "frame rendered"
        );
        stats.push(frame);
    }

    let output = &config.output.path;
    create_parent_dir(output)?;
    target.save(output)?;
    tracing::info!(path = %output.display(), "wrote frame");
    Ok((stats, dispatcher))
}

fn load_texture(section: Option<&TextureSection>) -> Result<Arc<TextureMap>> {
    let Some(section) = section else {
        tracing::info!("no texture configured; using built-in checkerboard");
        let checker = RgbaImage::from_fn(CHECKER_SIZE.0, CHECKER_SIZE.1, |x, y| {
            if (x / CHECKER_CELL + y / CHECKER_CELL) % 2 == 0 {
                image::Rgba([230, 230, 230, 255])
            } else {
                image::Rgba([40, 70, 160, 255])
            }
        });
        return Ok(Arc::new(TextureMap::from_raster(&checker, 3)?));
    };

    let image = image::open(&section.path)
        .with_context(|| format!("failed to open texture {}", section.path.display()))?;
    let mut texture = TextureMap::from_raster(&image, section.channels)
        .with_context(|| format!("failed to load texture {}", section.path.display()))?;
    if section.invert {
        texture.invert();
    }
    tracing::info!(
        path = %section.path.display(),
        size = %texture.dimensions(),
        channels = texture.channels(),
        inverted = section.invert,
        "loaded texture"
    );
    Ok(Arc::new(texture))
}

fn log_ray_stats(runtimes: &[RayStats]) {
    if runtimes.is_empty() {
        return;
    }
    let (rays, hits) = runtimes
        .iter()
        .fold((0, 0), |(rays, hits), stats| (rays + stats.rays, hits + stats.hits));
    tracing::info!(rays, hits, workers = runtimes.len(), "sphere ray totals");
}

fn write_stats(path: &Path, stats: &[FrameStats]) -> Result<()> {
    create_parent_dir(path)?;
    let json = serde_json::to_string_pretty(stats).context("failed to encode frame stats")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write frame stats to {}", path.display()))?;
    tracing::info!(path = %path.display(), frames = stats.len(), "wrote frame stats");
    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display())),
        _ => Ok(()),
    }
}

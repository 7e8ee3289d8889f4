use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use frameconfig::{RenderConfig, TextureSection};
use tracing::{debug, warn};

use crate::cli::RunArgs;
use crate::paths::AppPaths;

/// Loads the explicit `--config` file, else the default file if present, else defaults.
pub fn load_config(args: &RunArgs, paths: &AppPaths) -> Result<RenderConfig> {
    if let Some(path) = &args.config {
        return read_config(path);
    }

    let default_file = paths.config_file();
    if default_file.is_file() {
        debug!(path = %default_file.display(), "using default render config");
        read_config(&default_file)
    } else {
        debug!("no render config found; using built-in defaults");
        Ok(RenderConfig::default())
    }
}

fn read_config(path: &Path) -> Result<RenderConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read render config at {}", path.display()))?;
    RenderConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load render config at {}", path.display()))
}

/// Applies command-line flags on top of `config` and re-validates the result.
pub fn resolve(mut config: RenderConfig, args: &RunArgs) -> Result<RenderConfig> {
    if let Some(size) = args.size {
        config.render.size = size;
    }
    if let Some(workers) = args.workers {
        config.render.workers = Some(workers);
    }
    if let Some(frames) = args.frames {
        config.render.frames = frames;
    }
    if args.reuse_runtimes {
        config.render.reuse_runtimes = true;
    }
    if let Some(time) = args.time {
        config.render.time = Some(time);
    }
    if let Some(kind) = args.shader {
        config.shader.kind = kind;
    }
    if let Some(yaw) = args.yaw {
        config.shader.yaw = yaw;
    }
    if let Some(pitch) = args.pitch {
        config.shader.pitch = pitch;
    }

    if let Some(path) = &args.texture {
        let previous = config.texture.take();
        config.texture = Some(TextureSection {
            path: path.clone(),
            channels: previous.as_ref().map_or(3, |texture| texture.channels),
            invert: previous.is_some_and(|texture| texture.invert),
        });
    }
    match config.texture.as_mut() {
        Some(texture) => {
            if let Some(channels) = args.channels {
                texture.channels = channels;
            }
            if args.invert {
                texture.invert = true;
            }
        }
        None if args.channels.is_some() || args.invert => {
            warn!("--channels/--invert have no effect without a texture");
        }
        None => {}
    }

    if let Some(output) = &args.output {
        config.output.path = output.clone();
    }
    if let Some(stats) = &args.stats {
        config.output.stats = Some(stats.clone());
    }

    config.validate().context("invalid render settings")?;
    Ok(config)
}

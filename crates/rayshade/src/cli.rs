use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use frameconfig::{FrameSize, ShaderKind};

#[derive(Parser, Debug)]
#[command(
    name = "rayshade",
    author,
    version,
    about = "Render ray-shaded frames on the CPU"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Render configuration file (TOML). Defaults to `rayshade.toml` in the config directory.
    #[arg(long, value_name = "FILE", env = "RAYSHADE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output resolution (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<FrameSize>,

    /// Worker threads (0 = available hardware parallelism).
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Number of frames to dispatch; the last one is written.
    #[arg(long, value_name = "N")]
    pub frames: Option<u32>,

    /// Built-in shader: `gradient`, `texture`, or `sphere`.
    #[arg(long, value_name = "KIND", value_parser = parse_shader_kind)]
    pub shader: Option<ShaderKind>,

    /// Image used as the shader texture.
    #[arg(long, value_name = "PATH")]
    pub texture: Option<PathBuf>,

    /// Channels kept from the texture image (1, 2, or 3).
    #[arg(long, value_name = "N")]
    pub channels: Option<usize>,

    /// Invert texture values after loading.
    #[arg(long)]
    pub invert: bool,

    /// Camera heading in degrees (0-360) for the sphere shader.
    #[arg(long, value_name = "DEGREES")]
    pub yaw: Option<f32>,

    /// Camera elevation in degrees (-90-90) for the sphere shader.
    #[arg(long, value_name = "DEGREES", allow_hyphen_values = true)]
    pub pitch: Option<f32>,

    /// Fixed animation time (seconds or e.g. `1s 250ms`) instead of the wall clock.
    #[arg(long, value_name = "SECONDS", value_parser = parse_time)]
    pub time: Option<Duration>,

    /// Keep one shader runtime per worker across frames.
    #[arg(long)]
    pub reuse_runtimes: bool,

    /// Output image path; the format follows the extension.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write per-frame dispatch statistics as JSON.
    #[arg(long, value_name = "PATH")]
    pub stats: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect configuration locations and effective settings.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the default configuration file location.
    Where,
    /// Print the effective settings after applying flags, as TOML.
    Show,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<FrameSize, String> {
    if value.trim().is_empty() {
        return Err("size must not be empty".to_string());
    }
    value.parse()
}

pub fn parse_shader_kind(value: &str) -> Result<ShaderKind, String> {
    if value.trim().is_empty() {
        return Err("shader kind must not be empty".to_string());
    }
    value.parse()
}

pub fn parse_time(value: &str) -> Result<Duration, String> {
    if value.trim().is_empty() {
        return Err("time must not be empty".to_string());
    }
    frameconfig::parse_duration(value)
}

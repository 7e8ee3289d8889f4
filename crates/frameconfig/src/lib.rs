use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Serializer;
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    pub version: u32,
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub shader: ShaderSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<TextureSection>,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderSection {
    #[serde(default = "default_size")]
    pub size: FrameSize,
    /// Worker threads; absent or 0 selects the hardware parallelism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default = "default_frames")]
    pub frames: u32,
    #[serde(default)]
    pub reuse_runtimes: bool,
    /// Fixed animation timestamp; absent means wall-clock time.
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        serialize_with = "serialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShaderSection {
    #[serde(default)]
    pub kind: ShaderKind,
    /// Orbit camera heading in degrees, `0..=360`.
    #[serde(default = "default_yaw")]
    pub yaw: f32,
    /// Orbit camera elevation in degrees, `-90..=90`.
    #[serde(default)]
    pub pitch: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextureSection {
    pub path: PathBuf,
    #[serde(default = "default_channels")]
    pub channels: usize,
    #[serde(default)]
    pub invert: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputSection {
    #[serde(default = "default_output")]
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderKind {
    #[default]
    Gradient,
    Texture,
    Sphere,
}

impl FromStr for ShaderKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gradient" => Ok(Self::Gradient),
            "texture" | "map" => Ok(Self::Texture),
            "sphere" | "globe" => Ok(Self::Sphere),
            other => Err(format!(
                "unknown shader '{other}'; expected 'gradient', 'texture', or 'sphere'"
            )),
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Gradient => f.write_str("gradient"),
            ShaderKind::Texture => f.write_str("texture"),
            ShaderKind::Sphere => f.write_str("sphere"),
        }
    }
}

/// Frame dimensions written as `WIDTHxHEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FromStr for FrameSize {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (width, height) = raw
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("invalid size '{raw}'; expected WIDTHxHEIGHT"))?;
        let width = width
            .trim()
            .parse::<u32>()
            .map_err(|err| format!("invalid width in '{raw}': {err}"))?;
        let height = height
            .trim()
            .parse::<u32>()
            .map_err(|err| format!("invalid height in '{raw}': {err}"))?;
        if width == 0 || height == 0 {
            return Err(format!("size '{raw}' must be non-zero in both dimensions"));
        }
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for FrameSize {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FrameSize> for String {
    fn from(size: FrameSize) -> Self {
        size.to_string()
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn default_size() -> FrameSize {
    FrameSize::new(640, 480)
}

fn default_frames() -> u32 {
    1
}

fn default_yaw() -> f32 {
    180.0
}

fn default_channels() -> usize {
    3
}

fn default_output() -> PathBuf {
    PathBuf::from("frame.png")
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            size: default_size(),
            workers: None,
            frames: default_frames(),
            reuse_runtimes: false,
            time: None,
        }
    }
}

impl Default for ShaderSection {
    fn default() -> Self {
        Self {
            kind: ShaderKind::default(),
            yaw: default_yaw(),
            pitch: 0.0,
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            path: default_output(),
            stats: None,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            render: RenderSection::default(),
            shader: ShaderSection::default(),
            texture: None,
            output: OutputSection::default(),
        }
    }
}

/// Parses a duration given as seconds (integer or float) or a humantime string.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    if let Ok(seconds) = trimmed.parse::<f64>() {
        if seconds.is_nan() || seconds.is_sign_negative() {
            return Err("duration must be non-negative".into());
        }
        return Ok(Duration::from_secs_f64(seconds));
    }
    humantime::parse_duration(trimmed).map_err(|err| format!("invalid duration '{raw}': {err}"))
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            parse_duration(v).map(Some).map_err(E::custom)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

/// Writes durations as humantime strings so they parse back unchanged.
fn serialize_duration_opt<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => serializer.collect_str(&humantime::format_duration(*duration)),
        None => serializer.serialize_none(),
    }
}

impl RenderConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: RenderConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Worker count with 0 folded into "use the hardware default".
    pub fn workers(&self) -> Option<usize> {
        self.render.workers.filter(|workers| *workers > 0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        if self.render.frames == 0 {
            return Err(ConfigError::Invalid(
                "render.frames must be at least 1".into(),
            ));
        }

        if !(0.0..=360.0).contains(&self.shader.yaw) {
            return Err(ConfigError::Invalid(format!(
                "shader.yaw must be within 0..=360 degrees (got {})",
                self.shader.yaw
            )));
        }

        if !(-90.0..=90.0).contains(&self.shader.pitch) {
            return Err(ConfigError::Invalid(format!(
                "shader.pitch must be within -90..=90 degrees (got {})",
                self.shader.pitch
            )));
        }

        if let Some(texture) = &self.texture {
            if texture.path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("texture.path may not be empty".into()));
            }
            if !(1..=3).contains(&texture.channels) {
                return Err(ConfigError::Invalid(format!(
                    "texture.channels must be 1, 2, or 3 (got {})",
                    texture.channels
                )));
            }
        }

        if self.output.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output.path may not be empty".into()));
        }

        Ok(())
    }
}

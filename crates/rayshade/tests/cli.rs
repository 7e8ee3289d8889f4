use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn rayshade(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rayshade"))
        .args(args)
        .env("RAYSHADE_CONFIG_DIR", config_dir)
        .env_remove("RAYSHADE_CONFIG")
        .env("RUST_LOG", "warn")
        .output()
        .expect("spawn rayshade")
}

#[test]
fn renders_sphere_with_stats() {
    let root = TempDir::new().unwrap();
    let output = root.path().join("out/sphere.png");
    let stats = root.path().join("out/stats.json");

    let result = rayshade(
        root.path(),
        &[
            "--shader",
            "sphere",
            "--size",
            "48x32",
            "--frames",
            "2",
            "--workers",
            "3",
            "--time",
            "1.5",
            "-o",
            output.to_str().unwrap(),
            "--stats",
            stats.to_str().unwrap(),
        ],
    );
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let image = image::open(&output).unwrap();
    assert_eq!((image.width(), image.height()), (48, 32));

    let frames: serde_json::Value = serde_json::from_str(&fs::read_to_string(&stats).unwrap()).unwrap();
    let frames = frames.as_array().unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1]["frame_index"], 1);
    assert_eq!(frames[0]["workers"], 3);
    let shaded: u64 = frames[0]["pixels_per_worker"]
        .as_array()
        .unwrap()
        .iter()
        .map(|count| count.as_u64().unwrap())
        .sum();
    assert_eq!(shaded, 48 * 32);
}

#[test]
fn default_config_file_drives_the_render() {
    let root = TempDir::new().unwrap();
    let output = root.path().join("gradient.png");
    fs::write(
        root.path().join("rayshade.toml"),
        format!(
            "version = 1\n[render]\nsize = \"20x10\"\ntime = \"250ms\"\n[output]\npath = {:?}\n",
            output.to_str().unwrap()
        ),
    )
    .unwrap();

    let result = rayshade(root.path(), &[]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    let image = image::open(&output).unwrap();
    assert_eq!((image.width(), image.height()), (20, 10));
}

#[test]
fn config_where_prints_the_default_file() {
    let root = TempDir::new().unwrap();
    let result = rayshade(root.path(), &["config", "where"]);
    assert!(result.status.success());
    let stdout = String::from_utf8(result.stdout).unwrap();
    assert_eq!(
        stdout.trim(),
        root.path().join("rayshade.toml").display().to_string()
    );
}

#[test]
fn config_show_reflects_flags() {
    let root = TempDir::new().unwrap();
    let result = rayshade(
        root.path(),
        &["--size", "320x200", "--shader", "globe", "--time", "2", "config", "show"],
    );
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    let stdout = String::from_utf8(result.stdout).unwrap();
    assert!(stdout.contains("size = \"320x200\""), "{stdout}");
    assert!(stdout.contains("kind = \"sphere\""), "{stdout}");
    assert!(stdout.contains("time = \"2s\""), "{stdout}");
}

#[test]
fn config_show_keeps_logs_off_stdout() {
    let root = TempDir::new().unwrap();
    let result = Command::new(env!("CARGO_BIN_EXE_rayshade"))
        .args(["--channels", "2", "config", "show"])
        .env("RAYSHADE_CONFIG_DIR", root.path())
        .env_remove("RAYSHADE_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn rayshade");
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let stdout = String::from_utf8(result.stdout).unwrap();
    let shown: toml::Value = toml::from_str(&stdout).expect("stdout is plain TOML");
    assert_eq!(shown["version"].as_integer(), Some(1));
    assert!(String::from_utf8_lossy(&result.stderr).contains("no effect without a texture"));
}

#[test]
fn invalid_channel_count_fails() {
    let root = TempDir::new().unwrap();
    let texture = root.path().join("flat.png");
    image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]))
        .save(&texture)
        .unwrap();

    let result = rayshade(
        root.path(),
        &[
            "--shader",
            "texture",
            "--texture",
            texture.to_str().unwrap(),
            "--channels",
            "5",
            "-o",
            root.path().join("never.png").to_str().unwrap(),
        ],
    );
    assert!(!result.status.success());
    assert!(!root.path().join("never.png").exists());
}

use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use anyhow::Result;
use renderer::{BoxedTimeSource, Rgb, Shader, TextureMap, Uv};

use super::math::Vec3;
use super::texel_to_rgb;

const SPHERE_CENTER: Vec3 = Vec3::ZERO;
const AMBIENT: f32 = 0.1;
const SUN_ELEVATION: f32 = 25.0;
const SUN_OFFSET: f32 = 40.0;
const SUN_DEGREES_PER_SECOND: f32 = 15.0;
const SKY_TOP: Rgb = Rgb::new(0.05, 0.07, 0.15);
const SKY_BOTTOM: Rgb = Rgb::new(0.0, 0.0, 0.02);

/// Orbit camera looking at the origin.
#[derive(Debug, Clone, Copy)]
pub struct SphereCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov_degrees: f32,
}

impl SphereCamera {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self {
            yaw,
            pitch,
            ..Self::default()
        }
    }

    fn position(&self) -> Vec3 {
        Vec3::from_angles(self.yaw, self.pitch) * self.distance
    }
}

impl Default for SphereCamera {
    fn default() -> Self {
        Self {
            yaw: 180.0,
            pitch: 0.0,
            distance: 3.0,
            fov_degrees: 45.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Basis {
    origin: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
}

impl Basis {
    fn looking_at_center(camera: &SphereCamera) -> Self {
        let origin = camera.position();
        let forward = (SPHERE_CENTER - origin).normalized();
        let mut right = forward.cross(Vec3::UP);
        if right.length() < 1e-4 {
            // Looking straight up or down.
            right = Vec3::new(1.0, 0.0, 0.0);
        }
        let right = right.normalized();
        let up = right.cross(forward);
        Self {
            origin,
            forward,
            right,
            up,
        }
    }
}

/// Per-worker ray counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RayStats {
    pub rays: u64,
    pub hits: u64,
}

/// Textured unit sphere lit by an orbiting sun.
pub struct SphereShader {
    texture: Arc<TextureMap>,
    clock: BoxedTimeSource,
    camera: SphereCamera,
    basis: Basis,
    half_height: f32,
    aspect: f32,
    sun: Vec3,
}

impl SphereShader {
    pub fn new(texture: Arc<TextureMap>, camera: SphereCamera, clock: BoxedTimeSource) -> Self {
        Self {
            texture,
            clock,
            basis: Basis::looking_at_center(&camera),
            half_height: (camera.fov_degrees.to_radians() * 0.5).tan(),
            aspect: 1.0,
            sun: Vec3::from_angles(camera.yaw + SUN_OFFSET, SUN_ELEVATION),
            camera,
        }
    }

    fn ray_direction(&self, uv: Uv) -> Vec3 {
        let x = (2.0 * uv.x - 1.0) * self.aspect * self.half_height;
        let y = (1.0 - 2.0 * uv.y) * self.half_height;
        (self.basis.forward + self.basis.right * x + self.basis.up * y).normalized()
    }

    /// Distance along the ray to the front face of the unit sphere.
    fn intersect(origin: Vec3, direction: Vec3) -> Option<f32> {
        let offset = origin - SPHERE_CENTER;
        let b = offset.dot(direction);
        let c = offset.dot(offset) - 1.0;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let t = -b - discriminant.sqrt();
        (t > 0.0).then_some(t)
    }
}

fn background(uv: Uv) -> Rgb {
    let t = uv.y.clamp(0.0, 1.0);
    Rgb::new(
        SKY_TOP.r + (SKY_BOTTOM.r - SKY_TOP.r) * t,
        SKY_TOP.g + (SKY_BOTTOM.g - SKY_TOP.g) * t,
        SKY_TOP.b + (SKY_BOTTOM.b - SKY_TOP.b) * t,
    )
}

/// Equirectangular lookup for a point on the unit sphere.
fn equirect(normal: Vec3) -> Uv {
    Uv::new(
        0.5 + normal.z.atan2(normal.x) / TAU,
        0.5 - normal.y.clamp(-1.0, 1.0).asin() / PI,
    )
}

impl Shader for SphereShader {
    type Runtime = RayStats;

    fn calculate_color_into(&self, uv: Uv, out: &mut Rgb, stats: &mut RayStats) -> Result<()> {
        stats.rays += 1;
        let direction = self.ray_direction(uv);
        let Some(t) = Self::intersect(self.basis.origin, direction) else {
            *out = background(uv);
            return Ok(());
        };
        stats.hits += 1;

        let normal = (self.basis.origin + direction * t - SPHERE_CENTER).normalized();
        let albedo = texel_to_rgb(self.texture.sample_clamped(equirect(normal)));
        let lambert = normal.dot(self.sun).max(0.0);
        *out = albedo.scale(AMBIENT + (1.0 - AMBIENT) * lambert);
        Ok(())
    }

    fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    fn on_frame_start(&mut self) {
        let time = self.clock.sample().seconds;
        let heading = self.camera.yaw + SUN_OFFSET + time * SUN_DEGREES_PER_SECOND;
        self.sun = Vec3::from_angles(heading.rem_euclid(360.0), SUN_ELEVATION);
    }

    fn create_runtime(&self) -> RayStats {
        RayStats::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::{DispatchOptions, Dispatcher, FixedTimeSource, FrameBuffer, RuntimeReuse};

    fn white_texture() -> Arc<TextureMap> {
        let image = image::GrayImage::from_pixel(8, 4, image::Luma([255]));
        Arc::new(TextureMap::from_raster(&image, 1).unwrap())
    }

    fn shader(yaw: f32, pitch: f32) -> SphereShader {
        SphereShader::new(
            white_texture(),
            SphereCamera::new(yaw, pitch),
            Box::new(FixedTimeSource::new(0.0)),
        )
    }

    #[test]
    fn center_ray_hits_and_corner_ray_misses() {
        let mut shader = shader(180.0, 0.0);
        shader.set_viewport_size(64, 64);
        shader.on_frame_start();
        let mut stats = shader.create_runtime();

        let corner = Uv::pixel_center(0, 0, 64, 64);
        assert_eq!(
            shader.calculate_color(corner, &mut stats).unwrap(),
            background(corner)
        );
        let center = shader.calculate_color(Uv::new(0.5, 0.5), &mut stats).unwrap();
        assert!(center.r > AMBIENT);
        assert_eq!(stats, RayStats { rays: 2, hits: 1 });
    }

    #[test]
    fn polar_camera_produces_finite_colors() {
        let mut shader = shader(0.0, 90.0);
        shader.set_viewport_size(16, 16);
        shader.on_frame_start();
        let mut stats = shader.create_runtime();
        for step in 0..16 {
            let uv = Uv::new(step as f32 / 16.0, 0.5);
            let color = shader.calculate_color(uv, &mut stats).unwrap();
            assert!(color.r.is_finite() && color.g.is_finite() && color.b.is_finite());
        }
        assert!(stats.hits > 0);
    }

    #[test]
    fn equirect_maps_poles_and_seam() {
        assert!(equirect(Vec3::UP).y.abs() < 1e-6);
        assert!((equirect(-Vec3::UP).y - 1.0).abs() < 1e-6);
        let front = equirect(Vec3::new(1.0, 0.0, 0.0));
        assert!((front.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn frames_match_across_worker_counts() {
        let render = |workers: usize| {
            let mut shader = shader(200.0, 15.0);
            let mut dispatcher = Dispatcher::new(
                DispatchOptions::new()
                    .with_workers(workers)
                    .with_runtime_reuse(RuntimeReuse::PerSlot),
            );
            let mut frame = FrameBuffer::new(40, 30);
            dispatcher.render_frame(&mut shader, &mut frame).unwrap();
            let rays: u64 = dispatcher.runtimes().iter().map(|stats| stats.rays).sum();
            assert_eq!(rays, 40 * 30);
            frame
        };
        let single = render(1);
        assert_eq!(render(3), single);
        assert_eq!(render(7), single);
    }
}

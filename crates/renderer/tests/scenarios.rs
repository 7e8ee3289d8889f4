use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use renderer::{
    DispatchOptions, Dispatcher, FrameBuffer, PackedPixels, RenderError, RenderTarget, Rgb,
    RuntimeReuse, Shader, TextureMap, Uv, Viewport,
};

/// Records how often each pixel was written.
struct TallyTarget {
    viewport: Viewport,
    writes: HashMap<(u32, u32), (usize, Rgb)>,
}

impl TallyTarget {
    fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            writes: HashMap::new(),
        }
    }
}

impl RenderTarget for TallyTarget {
    fn size(&self) -> Viewport {
        self.viewport
    }

    fn write(&mut self, x: u32, y: u32, color: Rgb) {
        let entry = self.writes.entry((x, y)).or_insert((0, Rgb::BLACK));
        entry.0 += 1;
        entry.1 = color;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hook {
    Viewport(u32, u32),
    FrameStart,
}

/// Constant-color shader that logs its lifecycle calls.
struct Constant {
    color: Rgb,
    hooks: Vec<Hook>,
}

impl Shader for Constant {
    type Runtime = ();

    fn calculate_color_into(&self, _: Uv, out: &mut Rgb, _: &mut ()) -> Result<()> {
        *out = self.color;
        Ok(())
    }

    fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.hooks.push(Hook::Viewport(width, height));
    }

    fn on_frame_start(&mut self) {
        self.hooks.push(Hook::FrameStart);
    }

    fn create_runtime(&self) {}
}

/// Looks up a shared single-channel texture at the pixel center.
struct Lookup {
    texture: Arc<TextureMap>,
}

impl Shader for Lookup {
    type Runtime = [f32; 3];

    fn calculate_color_into(&self, uv: Uv, out: &mut Rgb, scratch: &mut [f32; 3]) -> Result<()> {
        let value = self.texture.sample_into(uv, scratch)[0];
        out.set(value, value, value);
        Ok(())
    }

    fn set_viewport_size(&mut self, _: u32, _: u32) {}

    fn create_runtime(&self) -> [f32; 3] {
        [0.0; 3]
    }
}

struct Panics;

impl Shader for Panics {
    type Runtime = ();

    fn calculate_color_into(&self, uv: Uv, out: &mut Rgb, _: &mut ()) -> Result<()> {
        if uv.y > 0.5 {
            panic!("lower half is off limits");
        }
        *out = Rgb::WHITE;
        Ok(())
    }

    fn set_viewport_size(&mut self, _: u32, _: u32) {}

    fn create_runtime(&self) {}
}

fn two_by_two() -> TextureMap {
    let raster = PackedPixels::new(2, 2, vec![0x00, 0xff, 0x80, 0x40]).expect("pixels");
    TextureMap::from_raster(&raster, 1).expect("texture")
}

#[test]
fn two_by_two_single_channel_scenario() {
    let map = two_by_two();
    let expected = [0.0, 1.0, 0.502, 0.251];
    for (index, want) in expected.iter().enumerate() {
        let (x, y) = (index as u32 % 2, index as u32 / 2);
        let got = map
            .sample_single(Uv::pixel_center(x, y, 2, 2))
            .expect("single channel");
        assert!((got - want).abs() <= 1.0 / 255.0, "pixel {index}: {got}");
    }
}

#[test]
fn constant_shader_writes_each_pixel_once() {
    let mut shader = Constant {
        color: Rgb::new(0.2, 0.4, 0.6),
        hooks: Vec::new(),
    };
    shader.set_viewport_size(4, 4);
    shader.on_frame_start();

    let mut dispatcher = Dispatcher::new(DispatchOptions::new().with_workers(3));
    let mut target = TallyTarget::new(4, 4);
    dispatcher
        .render_frame(&mut shader, &mut target)
        .expect("frame");

    assert_eq!(target.writes.len(), 16);
    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(target.writes[&(x, y)], (1, Rgb::new(0.2, 0.4, 0.6)));
        }
    }
}

#[test]
fn lifecycle_hooks_run_once_per_frame_and_on_resize() {
    let mut shader = Constant {
        color: Rgb::WHITE,
        hooks: Vec::new(),
    };
    let mut dispatcher = Dispatcher::new(DispatchOptions::new().with_workers(2));

    let mut square = FrameBuffer::new(4, 4);
    dispatcher.render_frame(&mut shader, &mut square).expect("first");
    dispatcher.render_frame(&mut shader, &mut square).expect("second");
    let mut wide = FrameBuffer::new(8, 2);
    dispatcher.render_frame(&mut shader, &mut wide).expect("third");

    assert_eq!(
        shader.hooks,
        vec![
            Hook::FrameStart,
            Hook::Viewport(4, 4),
            Hook::FrameStart,
            Hook::FrameStart,
            Hook::Viewport(8, 2),
        ]
    );
    assert_eq!(dispatcher.frames_rendered(), 3);
}

#[test]
fn shared_texture_renders_identically_across_worker_counts() {
    let texture = Arc::new(two_by_two());
    let render = |workers: usize, reuse: RuntimeReuse| {
        let mut shader = Lookup {
            texture: Arc::clone(&texture),
        };
        let mut dispatcher = Dispatcher::new(
            DispatchOptions::new()
                .with_workers(workers)
                .with_runtime_reuse(reuse),
        );
        let mut target = FrameBuffer::new(64, 48);
        dispatcher
            .render_frame(&mut shader, &mut target)
            .expect("frame");
        target
    };

    let reference = render(1, RuntimeReuse::PerPass);
    assert_eq!(reference.get(0, 0), Rgb::BLACK);
    assert_eq!(reference.get(63, 0), Rgb::WHITE);
    for workers in [2, 5, 8] {
        assert_eq!(render(workers, RuntimeReuse::PerPass), reference);
        assert_eq!(render(workers, RuntimeReuse::PerSlot), reference);
    }
}

#[test]
fn panicking_worker_is_reported() {
    let mut dispatcher = Dispatcher::new(DispatchOptions::new().with_workers(2));
    let mut target = FrameBuffer::new(4, 4);
    let err = dispatcher
        .render_frame(&mut Panics, &mut target)
        .unwrap_err();
    assert!(matches!(err, RenderError::WorkerPanicked { worker: 1 }));
    assert!(target.pixels().iter().all(|pixel| *pixel == Rgb::BLACK));
}

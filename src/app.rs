use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use hecs::{Entity, World};
use sdl2::keyboard::Scancode;
use sdl2::Sdl;

use crate::camera::Camera;
use crate::components::LightEmitter;
use crate::config::LightingConfig;
use crate::engine::input::{InputEvent, InputState};
use crate::engine::time::FrameTimer;
use crate::engine::window::GameWindow;
use crate::gpu::{GlDevice, HeadlessDevice, HeadlessShader, SharedDevice};
use crate::lighting::{LightSystem, ShadowShaders, SyncStats};
use crate::renderer::{FrameView, MeshStore, Renderer};
use crate::scene::demo::{build_demo_lights, load_demo_scene};
use crate::systems::{gizmo_system, light_animation_system, transform_propagation_system, GizmoInput};

pub struct LumenApp {
    world: World,
    meshes: MeshStore,
    lights: LightSystem,
    light_entities: Vec<Entity>,
    selected: usize,
    animate: bool,
    camera: Camera,
    renderer: Renderer,
}

impl LumenApp {
    /// Builds the scene and initialises lighting. Needs the window's GL context.
    pub fn new(config: LightingConfig) -> Result<Self> {
        let device: SharedDevice = Rc::new(GlDevice);
        let renderer = Renderer::init().context("failed to build shader programs")?;

        let mut world = World::new();
        let mut lights = LightSystem::new(device, config);
        let (meshes, light_entities) = load_demo_scene(&mut world, &mut lights);
        transform_propagation_system(&mut world);
        lights.sync_from_world(&world);
        lights.init();

        Ok(Self {
            world,
            meshes,
            lights,
            light_entities,
            selected: 0,
            animate: true,
            camera: Camera::new(),
            renderer,
        })
    }

    /// Main loop. Stops on quit, or after `max_frames` when given.
    pub fn run(&mut self, sdl: &Sdl, window: &GameWindow, max_frames: Option<u64>) -> Result<()> {
        sdl.mouse().set_relative_mouse_mode(true);
        let mut event_pump = sdl.event_pump().map_err(|e| anyhow!(e)).context("failed to get event pump")?;
        let mut input = InputState::new();
        let mut timer = FrameTimer::new();
        log::info!("Tab cycles lights, arrows/PageUp/PageDown move, I/J/K/L rotate, P pauses animation");

        loop {
            timer.tick();
            input.update(&mut event_pump);
            if input.should_quit() {
                break;
            }

            self.handle_keys(&input);
            self.update(&input, &timer);
            self.render(window);
            window.swap();

            if max_frames.is_some_and(|max| timer.frames >= max) {
                break;
            }
        }
        log::info!("exiting after {} frames", timer.frames);
        Ok(())
    }

    fn handle_keys(&mut self, input: &InputState) {
        for event in &input.events {
            match event {
                InputEvent::KeyPressed(Scancode::Tab) => {
                    if !self.light_entities.is_empty() {
                        self.selected = (self.selected + 1) % self.light_entities.len();
                        let entity = self.light_entities[self.selected];
                        match self.world.get::<&LightEmitter>(entity) {
                            Ok(emitter) => log::info!("selected light {} {:?}", self.selected, emitter.0),
                            Err(_) => log::warn!("entity {entity:?} no longer carries a light"),
                        }
                    }
                }
                InputEvent::KeyPressed(Scancode::P) => {
                    self.animate = !self.animate;
                    log::info!("light animation {}", if self.animate { "resumed" } else { "paused" });
                }
                InputEvent::KeyPressed(Scancode::F2) => log::info!("{}", self.lights.light_tree()),
                InputEvent::KeyPressed(Scancode::F5) => self.lights.force_full_upload(),
                InputEvent::KeyPressed(Scancode::F6) => self.lights.invalidate_shadows(),
                _ => {}
            }
        }
    }

    fn update(&mut self, input: &InputState, timer: &FrameTimer) {
        self.camera.look(input.mouse_dx, input.mouse_dy);
        self.camera.move_wasd(input, timer.dt);

        if self.animate {
            light_animation_system(&mut self.world, timer.elapsed, timer.dt);
        }
        if let Some(&entity) = self.light_entities.get(self.selected) {
            gizmo_system(&mut self.world, entity, GizmoInput::from_keys(input), timer.dt);
        }
        transform_propagation_system(&mut self.world);

        self.lights.sync_from_world(&self.world);
        self.lights.update(timer.dt);
    }

    fn render(&mut self, window: &GameWindow) {
        let frame = FrameView {
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(window.aspect_ratio()),
            camera_position: self.camera.position,
            viewport: window.size(),
        };
        let stats = self.renderer.draw_scene(&self.world, &self.meshes, &self.lights, &frame);
        if stats.incomplete > 0 {
            log::debug!("{} shadow maps skipped this frame", stats.incomplete);
        }
    }
}

/// Summary of a headless run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessReport {
    pub frames: u64,
    pub lights: usize,
    pub synced: SyncStats,
    pub shadow_maps_rendered: usize,
    pub shadow_maps_bound: u32,
}

/// Runs the demo lights through init and `frames` animated updates against
/// the CPU device, then one shadow pass and one bind.
pub fn run_headless(config: LightingConfig, frames: u64) -> Result<HeadlessReport> {
    let headless = Rc::new(HeadlessDevice::new());
    let device: SharedDevice = headless.clone();
    let mut world = World::new();
    let mut lights = LightSystem::new(device, config);
    build_demo_lights(&mut world, &mut lights);
    transform_propagation_system(&mut world);
    lights.sync_from_world(&world);
    lights.init();

    let dt = 1.0 / 60.0;
    let mut synced = SyncStats::default();
    for frame in 0..frames {
        light_animation_system(&mut world, frame as f32 * dt, dt);
        transform_propagation_system(&mut world);
        lights.sync_from_world(&world);
        let stats = lights.update(dt);
        synced.records += stats.records;
        synced.bytes += stats.bytes;
        synced.full_upload |= stats.full_upload;
    }

    let mut shaders = ShadowShaders {
        plane: HeadlessShader::new(1),
        plane_instanced: HeadlessShader::new(2),
        cube: HeadlessShader::new(3),
        cube_instanced: HeadlessShader::new(4),
    };
    let pass = lights.render_shadow_maps(&mut shaders, |_, _| {});
    let mut pbr = HeadlessShader::new(5);
    let bound = lights.push_depth_maps_to_shader(&mut pbr);

    log::info!("{}", lights.light_tree());
    log::info!(
        "headless run: {frames} frames, {} records / {} bytes synced, {} live buffers",
        synced.records,
        synced.bytes,
        headless.live_buffers()
    );

    Ok(HeadlessReport {
        frames,
        lights: lights.registry().len(),
        synced,
        shadow_maps_rendered: pass.rendered,
        shadow_maps_bound: bound.plane_bound + bound.cube_bound,
    })
}

//! Dynamic lights with shadow mapping.
//!
//! [`LightSystem`] owns every light, the storage buffers that publish their
//! records to shaders, and the binder that exposes their depth maps. Per
//! frame the render loop calls, in order: [`LightSystem::sync_from_world`],
//! [`LightSystem::update`], [`LightSystem::render_shadow_maps`], then
//! [`LightSystem::push_depth_maps_to_shader`] for each PBR program.

pub mod binder;
pub mod data;
pub mod directional;
pub mod inspect;
pub mod light;
pub mod point;
pub mod registry;
pub mod shadow;
pub mod spot;
pub mod sync;

use hecs::{Entity, World};

pub use binder::{BindSummary, ShadowTextureBinder};
pub use data::{Attenuation, Cone, DirLightData, PointLightData, SpotLightData};
pub use directional::DirLight;
pub use light::{
    Light, LightId, LightKind, LightSource, LightTransform, ShaderVariant, ShadowShaderSet, ShadowShaders,
};
pub use point::PointLight;
pub use registry::{LightHandle, LightRegistry};
pub use shadow::ShadowMap;
pub use spot::SpotLight;
pub use sync::{LightBufferSync, SyncStats};

use crate::components::GlobalTransform;
use crate::config::LightingConfig;
use crate::gpu::SharedDevice;
use crate::renderer::shader::ShaderUniforms;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShadowPassStats {
    pub rendered: usize,
    pub incomplete: usize,
}

pub struct LightSystem {
    device: SharedDevice,
    config: LightingConfig,
    registry: LightRegistry,
    sync: LightBufferSync,
    binder: ShadowTextureBinder,
    needs_full_upload: bool,
    initialized: bool,
}

impl LightSystem {
    pub fn new(device: SharedDevice, config: LightingConfig) -> Self {
        let sync = LightBufferSync::new(device.clone(), config.bindings);
        Self {
            device,
            config,
            registry: LightRegistry::new(),
            sync,
            binder: ShadowTextureBinder::new(config.units),
            needs_full_upload: true,
            initialized: false,
        }
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    pub fn registry(&self) -> &LightRegistry {
        &self.registry
    }

    /// Lights may be edited through this, but new ones must go through
    /// [`LightSystem::add_light`] so the buffers get rebuilt.
    pub fn registry_mut(&mut self) -> &mut LightRegistry {
        &mut self.registry
    }

    pub fn buffers(&self) -> &LightBufferSync {
        &self.sync
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Registers a light. Any addition schedules a full upload for the next
    /// [`LightSystem::update`]; after [`LightSystem::init`] the new light
    /// also gets its shadow map right away.
    pub fn add_light(&mut self, light: impl Into<Light>) -> LightHandle {
        let handle = self.registry.add(light);
        self.needs_full_upload = true;
        if self.initialized {
            let resolution = self.config.shadow_resolution;
            if let Some(light) = self.registry.get_mut(handle) {
                light.init_shadow(&self.device, resolution);
            }
        }
        handle
    }

    /// Registers a light whose placement follows `entity`'s world transform.
    pub fn add_entity_light(&mut self, entity: Entity, light: impl Into<Light>) -> LightHandle {
        let handle = self.add_light(light);
        self.registry.link_entity(handle, entity);
        handle
    }

    /// Allocates every shadow map and performs the first full upload.
    pub fn init(&mut self) -> SyncStats {
        self.init_shadows();
        let stats = self.sync.full_upload(&mut self.registry);
        self.needs_full_upload = false;
        self.initialized = true;
        log::info!(
            "light system ready: {} lights, {}x{} shadow maps",
            self.registry.len(),
            self.config.shadow_resolution,
            self.config.shadow_resolution
        );
        stats
    }

    /// Per-frame GPU sync. Rebuilds the buffers when lights were added (or a
    /// rebuild was forced), otherwise writes back only dirty records.
    pub fn update(&mut self, _delta_time: f32) -> SyncStats {
        if self.needs_full_upload {
            self.needs_full_upload = false;
            return self.sync.full_upload(&mut self.registry);
        }
        match self.sync.incremental_update(&mut self.registry) {
            Ok(stats) => {
                if !stats.is_empty() {
                    log::debug!("synced {} light records ({} bytes)", stats.records, stats.bytes);
                }
                stats
            }
            Err(err) => {
                log::warn!("{err}; rebuilding light buffers");
                self.sync.full_upload(&mut self.registry)
            }
        }
    }

    /// Applies the world transform of every entity-linked light. Returns the
    /// number of lights whose GPU record changed.
    pub fn sync_from_world(&mut self, world: &World) -> usize {
        let mut changed = 0;
        self.registry.for_each_mut(|_, light| {
            let Some(entity) = light.entity() else {
                return;
            };
            let Ok(global) = world.get::<&GlobalTransform>(entity) else {
                return;
            };
            let before = light.record_bytes();
            light.edit_light(&LightTransform::from_matrix(&global.0));
            if light.record_bytes() != before {
                changed += 1;
            }
        });
        changed
    }

    /// Renders every light's depth map. `draw` is called twice per light, once
    /// per [`ShaderVariant`], with the depth program already bound and loaded.
    /// Lights whose target is incomplete are reported and skipped.
    pub fn render_shadow_maps<S, F>(&self, shaders: &mut S, mut draw: F) -> ShadowPassStats
    where
        S: ShadowShaderSet,
        F: FnMut(ShaderVariant, &mut dyn ShaderUniforms),
    {
        let mut stats = ShadowPassStats::default();
        for (_, light) in self.registry.iter() {
            let Some(target) = light.shadow_map().map(|map| map.target()) else {
                stats.incomplete += 1;
                continue;
            };
            if !light.set_up_shadow_buffer(shaders, ShaderVariant::Normal).is_complete() {
                stats.incomplete += 1;
                continue;
            }
            self.device.clear_depth();
            draw(ShaderVariant::Normal, shaders.select(target, ShaderVariant::Normal));

            light.set_up_shadow_buffer(shaders, ShaderVariant::Instanced);
            draw(ShaderVariant::Instanced, shaders.select(target, ShaderVariant::Instanced));
            stats.rendered += 1;
        }
        self.device.bind_default_framebuffer();
        stats
    }

    /// Binds every depth map into its texture unit and sets the sampler
    /// arrays of `shader`. Run once per program that samples shadows.
    pub fn push_depth_maps_to_shader(&self, shader: &mut dyn ShaderUniforms) -> BindSummary {
        self.binder.bind(self.device.as_ref(), &self.registry, shader)
    }

    /// Releases and reallocates every shadow map.
    pub fn invalidate_shadows(&mut self) {
        self.init_shadows();
        log::info!("reinitialised {} shadow maps", self.registry.len());
    }

    /// Schedules a wholesale re-upload of all light buffers.
    pub fn force_full_upload(&mut self) {
        self.needs_full_upload = true;
    }

    pub fn light_tree(&self) -> String {
        inspect::light_tree(&self.registry)
    }

    fn init_shadows(&mut self) {
        let device = self.device.clone();
        let resolution = self.config.shadow_resolution;
        self.registry
            .for_each_mut(|_, light| light.init_shadow(&device, resolution));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{HeadlessDevice, HeadlessShader};
    use glam::{Mat4, Quat, Vec3};
    use std::rc::Rc;

    fn small_config() -> LightingConfig {
        LightingConfig {
            shadow_resolution: 16,
            ..Default::default()
        }
    }

    fn system() -> (Rc<HeadlessDevice>, LightSystem) {
        let headless = Rc::new(HeadlessDevice::new());
        let device: SharedDevice = headless.clone();
        (headless, LightSystem::new(device, small_config()))
    }

    fn shaders() -> ShadowShaders<HeadlessShader> {
        ShadowShaders {
            plane: HeadlessShader::new(1),
            plane_instanced: HeadlessShader::new(2),
            cube: HeadlessShader::new(3),
            cube_instanced: HeadlessShader::new(4),
        }
    }

    #[test]
    fn init_allocates_maps_and_uploads_everything() {
        let (headless, mut lights) = system();
        lights.add_light(DirLight::new(Vec3::ZERO, Vec3::ONE));
        lights.add_light(PointLight::new(Vec3::Y, Vec3::ONE, Attenuation::for_radius(10.0)));

        let stats = lights.init();
        assert!(stats.full_upload);
        assert_eq!(stats.records, 2);
        assert_eq!(headless.live_textures(), 2);
        assert_eq!(headless.live_buffers(), 3);
        assert_eq!(lights.registry().dirty_count(), 0);
        assert_eq!(headless.binding_contents(1).map(|b| b.len()), Some(128));
    }

    #[test]
    fn adding_after_init_triggers_one_full_upload() {
        let (headless, mut lights) = system();
        lights.add_light(PointLight::new(Vec3::ZERO, Vec3::ONE, Attenuation::for_radius(10.0)));
        lights.init();
        assert!(lights.update(0.016).is_empty());

        lights.add_light(PointLight::new(Vec3::X, Vec3::ONE, Attenuation::for_radius(10.0)));
        assert!(lights.registry().point()[1].shadow_map().is_some());
        let stats = lights.update(0.016);
        assert!(stats.full_upload);
        assert_eq!(headless.binding_contents(2).map(|b| b.len()), Some(128));
        assert!(!lights.update(0.016).full_upload);
    }

    #[test]
    fn world_edits_flow_into_incremental_updates() {
        let (headless, mut lights) = system();
        let mut world = World::new();
        let entity = world.spawn((GlobalTransform(Mat4::from_translation(Vec3::ZERO)),));
        lights.add_entity_light(
            entity,
            PointLight::new(Vec3::ZERO, Vec3::ONE, Attenuation::for_radius(10.0)),
        );
        lights.init();
        headless.take_writes();

        assert_eq!(lights.sync_from_world(&world), 0);
        assert!(lights.update(0.016).is_empty());

        if let Ok(mut global) = world.get::<&mut GlobalTransform>(entity) {
            global.0 = Mat4::from_rotation_translation(Quat::IDENTITY, Vec3::new(2.0, 0.0, 0.0));
        }
        assert_eq!(lights.sync_from_world(&world), 1);
        let stats = lights.update(0.016);
        assert_eq!(stats.records, 1);
        assert_eq!(headless.take_writes().len(), 1);
        assert_eq!(lights.registry().point()[0].position(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn already_dirty_lights_still_count_as_changed() {
        let (_headless, mut lights) = system();
        let mut world = World::new();
        let entity = world.spawn((GlobalTransform(Mat4::IDENTITY),));
        lights.add_entity_light(
            entity,
            PointLight::new(Vec3::ZERO, Vec3::ONE, Attenuation::for_radius(10.0)),
        );
        lights.init();

        lights.registry_mut().point_mut()[0].set_color(Vec3::new(1.0, 0.0, 0.0));
        assert!(lights.registry().point()[0].is_dirty());
        if let Ok(mut global) = world.get::<&mut GlobalTransform>(entity) {
            global.0 = Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0));
        }
        assert_eq!(lights.sync_from_world(&world), 1);
        // Same transform again: dirty but unchanged.
        assert_eq!(lights.sync_from_world(&world), 0);
        assert!(lights.registry().point()[0].is_dirty());
    }

    #[test]
    fn shadow_pass_draws_both_variants_per_light() {
        let (headless, mut lights) = system();
        lights.add_light(DirLight::new(Vec3::ZERO, Vec3::ONE));
        lights.add_light(PointLight::new(Vec3::ZERO, Vec3::ONE, Attenuation::for_radius(10.0)));
        lights.init();

        let mut shaders = shaders();
        let mut calls = Vec::new();
        let stats = lights.render_shadow_maps(&mut shaders, |variant, shader| calls.push((variant, shader.id())));

        assert_eq!(stats.rendered, 2);
        assert_eq!(
            calls,
            vec![
                (ShaderVariant::Normal, 1),
                (ShaderVariant::Instanced, 2),
                (ShaderVariant::Normal, 3),
                (ShaderVariant::Instanced, 4),
            ]
        );
        assert_eq!(headless.depth_clears(), 2);
        assert_eq!(headless.bound_framebuffer(), None);
    }

    #[test]
    fn incomplete_targets_are_skipped() {
        let (headless, mut lights) = system();
        lights.add_light(DirLight::new(Vec3::ZERO, Vec3::ONE));
        lights.init();
        headless.force_incomplete_framebuffers(true);

        let mut draws = 0;
        let stats = lights.render_shadow_maps(&mut shaders(), |_, _| draws += 1);
        assert_eq!(stats, ShadowPassStats { rendered: 0, incomplete: 1 });
        assert_eq!(draws, 0);
    }

    #[test]
    fn invalidation_replaces_maps_without_leaking() {
        let (headless, mut lights) = system();
        lights.add_light(DirLight::new(Vec3::ZERO, Vec3::ONE));
        lights.add_light(PointLight::new(Vec3::ZERO, Vec3::ONE, Attenuation::for_radius(10.0)));
        lights.init();
        let before = lights.registry().directional()[0].shadow_map().unwrap().texture();

        lights.invalidate_shadows();
        assert_eq!(headless.live_textures(), 2);
        assert_eq!(headless.live_framebuffers(), 2);
        assert_ne!(lights.registry().directional()[0].shadow_map().unwrap().texture(), before);

        drop(lights);
        assert_eq!(headless.live_textures(), 0);
        assert_eq!(headless.live_buffers(), 0);
    }

    #[test]
    fn push_binds_before_setting_samplers() {
        let (_headless, mut lights) = system();
        lights.add_light(DirLight::new(Vec3::ZERO, Vec3::ONE));
        lights.init();

        let mut pbr = HeadlessShader::new(10);
        let summary = lights.push_depth_maps_to_shader(&mut pbr);
        assert_eq!(summary.plane_bound, 1);
        assert_eq!(pbr.binds, 1);
        assert_eq!(pbr.int("planeShadowMaps[0]"), Some(13));
    }

    #[test]
    fn forced_upload_rewrites_whole_buffers() {
        let (_headless, mut lights) = system();
        lights.add_light(DirLight::new(Vec3::ZERO, Vec3::ONE));
        lights.init();
        lights.force_full_upload();
        assert!(lights.update(0.0).full_upload);
    }
}

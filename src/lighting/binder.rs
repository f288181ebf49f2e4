use super::light::LightSource;
use super::registry::LightRegistry;
use crate::config::TextureUnitLayout;
use crate::gpu::{GpuDevice, TextureTarget};
use crate::renderer::shader::ShaderUniforms;

pub const PLANE_SAMPLERS: &str = "planeShadowMaps";
pub const CUBE_SAMPLERS: &str = "cubeShadowMaps";

/// Outcome of one bind pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BindSummary {
    pub plane_bound: u32,
    pub cube_bound: u32,
    /// Lights whose shadow index lies past their unit range.
    pub overflow: u32,
    /// Lights registered without an allocated depth map.
    pub missing: u32,
}

/// Binds every light's depth map into the reserved texture-unit ranges and
/// points the matching sampler-array element of a shader at it.
#[derive(Debug, Clone, Copy)]
pub struct ShadowTextureBinder {
    layout: TextureUnitLayout,
}

impl ShadowTextureBinder {
    pub fn new(layout: TextureUnitLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> TextureUnitLayout {
        self.layout
    }

    /// Sampler uniforms are per program, so this runs once for every shader
    /// that reads shadows.
    pub fn bind(
        &self,
        device: &dyn GpuDevice,
        registry: &LightRegistry,
        shader: &mut dyn ShaderUniforms,
    ) -> BindSummary {
        shader.bind();

        let mut summary = BindSummary::default();
        let mut plane_used = vec![false; self.layout.plane_capacity() as usize];
        let mut cube_used = vec![false; self.layout.cube_capacity() as usize];

        for (_, light) in registry.iter() {
            let Some(index) = light.shadow_index() else {
                continue;
            };
            let target = light.kind().shadow_target();
            let (unit, samplers, used) = match target {
                TextureTarget::Texture2D => (self.layout.plane_unit(index), PLANE_SAMPLERS, &mut plane_used),
                TextureTarget::CubeMap => (self.layout.cube_unit(index), CUBE_SAMPLERS, &mut cube_used),
            };
            let Some(unit) = unit else {
                log::warn!(
                    "{:?} light {:?} has shadow index {index} past the {samplers} range; skipped",
                    light.kind(),
                    light.id()
                );
                summary.overflow += 1;
                continue;
            };
            let Some(map) = light.shadow_map() else {
                log::warn!("{:?} light {:?} has no shadow map to bind", light.kind(), light.id());
                summary.missing += 1;
                continue;
            };

            device.bind_texture_unit(unit, target, map.texture());
            shader.set_int(&format!("{samplers}[{index}]"), unit as i32);
            used[index as usize] = true;
            match target {
                TextureTarget::Texture2D => summary.plane_bound += 1,
                TextureTarget::CubeMap => summary.cube_bound += 1,
            }
        }

        // Unused elements still need a unit of their own sampler type.
        for (index, _) in plane_used.iter().enumerate().filter(|(_, used)| !**used) {
            shader.set_int(&format!("{PLANE_SAMPLERS}[{index}]"), self.layout.plane_shadow_offset as i32);
        }
        for (index, _) in cube_used.iter().enumerate().filter(|(_, used)| !**used) {
            shader.set_int(&format!("{CUBE_SAMPLERS}[{index}]"), self.layout.texture_units_offset as i32);
        }

        log::debug!(
            "bound {} plane and {} cube shadow maps to program {}",
            summary.plane_bound,
            summary.cube_bound,
            shader.id()
        );
        summary
    }
}

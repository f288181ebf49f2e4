use glam::{Mat4, Vec3};

use super::data::{Attenuation, PointLightData};
use super::light::{LightCommon, LightKind, LightSource, LightTransform};
use super::shadow::{point_shadow_transforms, POINT_FAR_PLANE};
use crate::renderer::shader::ShaderUniforms;

/// Omnidirectional light with a cube depth map.
#[derive(Debug)]
pub struct PointLight {
    pub(crate) common: LightCommon,
    data: PointLightData,
    shadow_transforms: [Mat4; 6],
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3, attenuation: Attenuation) -> Self {
        Self {
            common: LightCommon::new(),
            data: PointLightData::new(position, color, attenuation),
            shadow_transforms: [Mat4::IDENTITY; 6],
        }
    }

    pub fn data(&self) -> &PointLightData {
        &self.data
    }

    pub(crate) fn assign_shadow_index(&mut self, index: u32) {
        self.common.shadow_index = Some(index);
        self.data.shadow_index = index as i32;
    }

    /// Mutable access to the GPU record. Always marks the light dirty.
    pub fn data_mut(&mut self) -> &mut PointLightData {
        self.common.dirty = true;
        &mut self.data
    }

    pub fn position(&self) -> Vec3 {
        self.data.position.truncate()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.data_mut().position = position.extend(1.0);
        self.update_shadow_transforms();
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.data_mut().color = color.extend(1.0);
    }

    /// Per-face view-projections in cube layer order.
    pub fn shadow_transforms(&self) -> &[Mat4; 6] {
        &self.shadow_transforms
    }
}

impl LightSource for PointLight {
    fn kind(&self) -> LightKind {
        LightKind::Point
    }

    fn common(&self) -> &LightCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut LightCommon {
        &mut self.common
    }

    fn update_shadow_transforms(&mut self) {
        self.shadow_transforms = point_shadow_transforms(self.position());
    }

    fn upload_shadow_uniforms(&self, shader: &mut dyn ShaderUniforms) {
        for (face, transform) in self.shadow_transforms.iter().enumerate() {
            shader.set_mat4(&format!("shadowMatrices[{face}]"), transform);
        }
        shader.set_float("far_plane", POINT_FAR_PLANE);
        shader.set_vec3("lightPos", self.position());
    }

    fn apply_transform(&mut self, transform: &LightTransform) {
        self.data.position = transform.position.extend(1.0);
    }

    fn record_bytes(&self) -> Vec<u8> {
        bytemuck::bytes_of(&self.data).to_vec()
    }
}

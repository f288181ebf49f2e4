use glam::Vec3;

use super::data::{Attenuation, Cone, SpotLightData};
use super::light::{LightCommon, LightKind, LightSource, LightTransform};
use super::shadow::spot_light_space;
use crate::renderer::shader::ShaderUniforms;

/// Cone light. Direction uses the same Euler convention as [`DirLight`],
/// the shadow is a single perspective projection from the light position.
///
/// [`DirLight`]: super::directional::DirLight
#[derive(Debug)]
pub struct SpotLight {
    pub(crate) common: LightCommon,
    data: SpotLightData,
}

impl SpotLight {
    pub fn new(position: Vec3, euler: Vec3, color: Vec3, cone: Cone, attenuation: Attenuation) -> Self {
        Self {
            common: LightCommon::new(),
            data: SpotLightData::new(position, euler, color, cone, attenuation),
        }
    }

    pub fn data(&self) -> &SpotLightData {
        &self.data
    }

    pub(crate) fn assign_shadow_index(&mut self, index: u32) {
        self.common.shadow_index = Some(index);
        self.data.shadow_index = index as i32;
    }

    /// Mutable access to the GPU record. Always marks the light dirty.
    pub fn data_mut(&mut self) -> &mut SpotLightData {
        self.common.dirty = true;
        &mut self.data
    }

    pub fn position(&self) -> Vec3 {
        self.data.position.truncate()
    }

    pub fn euler(&self) -> Vec3 {
        self.data.direction.truncate()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.data_mut().position = position.extend(1.0);
        self.update_shadow_transforms();
    }

    pub fn set_euler(&mut self, euler: Vec3) {
        self.data_mut().direction = euler.extend(1.0);
        self.update_shadow_transforms();
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.data_mut().color = color.extend(1.0);
    }
}

impl LightSource for SpotLight {
    fn kind(&self) -> LightKind {
        LightKind::Spot
    }

    fn common(&self) -> &LightCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut LightCommon {
        &mut self.common
    }

    fn update_shadow_transforms(&mut self) {
        self.data.light_space_matrix = spot_light_space(self.position(), self.euler());
    }

    fn upload_shadow_uniforms(&self, shader: &mut dyn ShaderUniforms) {
        shader.set_mat4("lightSpaceMatrix", &self.data.light_space_matrix);
    }

    fn apply_transform(&mut self, transform: &LightTransform) {
        self.data.position = transform.position.extend(1.0);
        self.data.direction = transform.euler().extend(1.0);
    }

    fn record_bytes(&self) -> Vec<u8> {
        bytemuck::bytes_of(&self.data).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{HeadlessDevice, HeadlessShader, SharedDevice, TextureTarget};
    use crate::lighting::light::{ShaderVariant, ShadowShaders};
    use crate::lighting::shadow::spot_projection;
    use glam::{Mat4, Quat};
    use std::rc::Rc;

    fn torch(position: Vec3, euler: Vec3) -> SpotLight {
        SpotLight::new(
            position,
            euler,
            Vec3::ONE,
            Cone {
                inner_deg: 12.5,
                outer_deg: 17.5,
            },
            Attenuation::for_radius(50.0),
        )
    }

    #[test]
    fn init_looks_along_positive_x_for_zero_angles() {
        let headless = Rc::new(HeadlessDevice::new());
        let device: SharedDevice = headless.clone();
        let mut light = torch(Vec3::ZERO, Vec3::ZERO);
        light.init_shadow(&device, 512);

        let expected = spot_projection(1.0) * Mat4::look_at_rh(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert_eq!(light.data().light_space_matrix, expected);
        let map = light.shadow_map().unwrap();
        assert_eq!(headless.texture_size(map.texture()), Some((TextureTarget::Texture2D, 512)));
        assert!(light.is_dirty());
    }

    #[test]
    fn repeated_init_gives_identical_light_space() {
        let device: SharedDevice = Rc::new(HeadlessDevice::new());
        let mut light = torch(Vec3::new(0.0, 18.0, 14.0), Vec3::new(-1.2, -0.8, 0.0));
        light.init_shadow(&device, 32);
        let first = light.data().light_space_matrix;
        light.init_shadow(&device, 32);
        let mut twin = torch(Vec3::new(0.0, 18.0, 14.0), Vec3::new(-1.2, -0.8, 0.0));
        twin.init_shadow(&device, 32);

        assert_eq!(bytemuck::bytes_of(&first), bytemuck::bytes_of(&light.data().light_space_matrix));
        assert_eq!(bytemuck::bytes_of(&first), bytemuck::bytes_of(&twin.data().light_space_matrix));
    }

    #[test]
    fn edit_applies_position_and_rotation() {
        let mut light = torch(Vec3::ZERO, Vec3::ZERO);
        let rotation = Quat::from_euler(glam::EulerRot::XYZ, -0.2, 0.7, 0.0);
        light.edit_light(&LightTransform {
            position: Vec3::new(4.0, 8.0, -1.0),
            rotation,
        });
        assert_eq!(light.position(), Vec3::new(4.0, 8.0, -1.0));
        assert!(light.euler().abs_diff_eq(Vec3::new(-0.2, 0.7, 0.0), 1e-5));
        assert_eq!(
            light.data().light_space_matrix,
            spot_light_space(light.position(), light.euler())
        );
    }

    #[test]
    fn incomplete_target_is_reported_not_fatal() {
        let headless = Rc::new(HeadlessDevice::new());
        let device: SharedDevice = headless.clone();
        let mut shaders = ShadowShaders {
            plane: HeadlessShader::new(1),
            plane_instanced: HeadlessShader::new(2),
            cube: HeadlessShader::new(3),
            cube_instanced: HeadlessShader::new(4),
        };
        let mut light = torch(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO);
        light.init_shadow(&device, 16);
        headless.force_incomplete_framebuffers(true);

        let status = light.set_up_shadow_buffer(&mut shaders, ShaderVariant::Normal);
        assert!(!status.is_complete());
        // Uniforms still went out; the caller decides whether to draw.
        assert!(shaders.plane.mat4("lightSpaceMatrix").is_some());
    }

    #[test]
    fn missing_shadow_map_is_incomplete() {
        let mut shaders = ShadowShaders {
            plane: HeadlessShader::new(1),
            plane_instanced: HeadlessShader::new(2),
            cube: HeadlessShader::new(3),
            cube_instanced: HeadlessShader::new(4),
        };
        let light = torch(Vec3::ZERO, Vec3::ZERO);
        assert!(!light.set_up_shadow_buffer(&mut shaders, ShaderVariant::Normal).is_complete());
        assert_eq!(shaders.plane.binds, 0);
    }
}

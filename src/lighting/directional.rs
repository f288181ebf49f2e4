use glam::{Vec3, Vec4};

use super::data::DirLightData;
use super::light::{LightCommon, LightKind, LightSource, LightTransform};
use super::shadow::directional_light_space;
use crate::renderer::shader::ShaderUniforms;

/// Sun-like light. Direction is stored as Euler angles; the shadow camera is
/// placed far back along the reconstructed direction, looking at the origin.
#[derive(Debug)]
pub struct DirLight {
    pub(crate) common: LightCommon,
    data: DirLightData,
}

impl DirLight {
    pub fn new(euler: Vec3, color: Vec3) -> Self {
        Self {
            common: LightCommon::new(),
            data: DirLightData::new(euler, color),
        }
    }

    pub fn data(&self) -> &DirLightData {
        &self.data
    }

    pub(crate) fn assign_shadow_index(&mut self, index: u32) {
        self.common.shadow_index = Some(index);
        self.data.shadow_index = index as i32;
    }

    /// Mutable access to the GPU record. Always marks the light dirty.
    pub fn data_mut(&mut self) -> &mut DirLightData {
        self.common.dirty = true;
        &mut self.data
    }

    pub fn euler(&self) -> Vec3 {
        self.data.direction.truncate()
    }

    pub fn set_euler(&mut self, euler: Vec3) {
        self.data_mut().direction = euler.extend(1.0);
        self.update_shadow_transforms();
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.data_mut().color = color.extend(1.0);
    }
}

impl LightSource for DirLight {
    fn kind(&self) -> LightKind {
        LightKind::Directional
    }

    fn common(&self) -> &LightCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut LightCommon {
        &mut self.common
    }

    fn update_shadow_transforms(&mut self) {
        let (position, light_space) = directional_light_space(self.euler());
        self.data.position = Vec4::from((position, 1.0));
        self.data.light_space_matrix = light_space;
    }

    fn upload_shadow_uniforms(&self, shader: &mut dyn ShaderUniforms) {
        shader.set_mat4("lightSpaceMatrix", &self.data.light_space_matrix);
    }

    fn apply_transform(&mut self, transform: &LightTransform) {
        // Only orientation matters; the position is derived from it.
        self.data.direction = transform.euler().extend(1.0);
    }

    fn record_bytes(&self) -> Vec<u8> {
        bytemuck::bytes_of(&self.data).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{HeadlessDevice, HeadlessShader, SharedDevice};
    use crate::lighting::light::{ShadowShaders, ShaderVariant};
    use glam::{Mat4, Quat};
    use std::rc::Rc;

    fn headless_shaders() -> ShadowShaders<HeadlessShader> {
        ShadowShaders {
            plane: HeadlessShader::new(1),
            plane_instanced: HeadlessShader::new(2),
            cube: HeadlessShader::new(3),
            cube_instanced: HeadlessShader::new(4),
        }
    }

    #[test]
    fn init_places_shadow_camera_from_euler() {
        let device: SharedDevice = Rc::new(HeadlessDevice::new());
        let mut light = DirLight::new(Vec3::ZERO, Vec3::ONE);
        light.init_shadow(&device, 256);
        assert_eq!(light.data().position, Vec4::new(-1000.0, 0.0, 0.0, 1.0));
        assert!(light.is_dirty());
        assert_eq!(light.shadow_map().unwrap().resolution(), 256);
    }

    #[test]
    fn repeated_init_is_bit_identical() {
        let device: SharedDevice = Rc::new(HeadlessDevice::new());
        let mut light = DirLight::new(Vec3::new(0.4, -0.9, 0.0), Vec3::ONE);
        light.init_shadow(&device, 64);
        let first = light.data().light_space_matrix;
        light.init_shadow(&device, 64);
        assert_eq!(
            bytemuck::bytes_of(&first),
            bytemuck::bytes_of(&light.data().light_space_matrix)
        );
    }

    #[test]
    fn edit_converts_rotation_to_euler() {
        let mut light = DirLight::new(Vec3::ZERO, Vec3::ONE);
        let rotation = Quat::from_euler(glam::EulerRot::XYZ, 0.3, -0.6, 0.0);
        light.edit_light(&LightTransform {
            position: Vec3::new(5.0, 5.0, 5.0),
            rotation,
        });
        assert!(light.euler().abs_diff_eq(Vec3::new(0.3, -0.6, 0.0), 1e-5));
        let (position, _) = directional_light_space(light.euler());
        assert_eq!(light.data().position.truncate(), position);
        assert!(light.is_dirty());
    }

    #[test]
    fn unchanged_edit_leaves_flag_clear() {
        let mut light = DirLight::new(Vec3::ZERO, Vec3::ONE);
        let identity = LightTransform {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        };
        light.edit_light(&identity);
        light.common.dirty = false;
        light.edit_light(&identity);
        assert!(!light.is_dirty());
    }

    #[test]
    fn shadow_buffer_targets_requested_variant() {
        let headless = Rc::new(HeadlessDevice::new());
        let device: SharedDevice = headless.clone();
        let mut shaders = headless_shaders();
        let mut light = DirLight::new(Vec3::ZERO, Vec3::ONE);
        light.init_shadow(&device, 64);

        let status = light.set_up_shadow_buffer(&mut shaders, ShaderVariant::Instanced);
        assert!(status.is_complete());
        let expected = light.data().light_space_matrix;
        assert_ne!(expected, Mat4::IDENTITY);
        assert_eq!(shaders.plane_instanced.binds, 1);
        assert_eq!(shaders.plane_instanced.mat4("lightSpaceMatrix"), Some(expected));
        assert_eq!(shaders.plane.binds, 0);
        assert!(shaders.cube.uniforms.is_empty());
        assert_eq!(
            headless.bound_framebuffer(),
            light.shadow_map().map(|m| m.framebuffer())
        );
    }
}

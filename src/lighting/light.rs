use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Mat4, Quat, Vec3};
use hecs::Entity;

use super::directional::DirLight;
use super::point::PointLight;
use super::shadow::ShadowMap;
use super::spot::SpotLight;
use crate::gpu::{FramebufferStatus, SharedDevice, TextureTarget};
use crate::renderer::shader::ShaderUniforms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

impl LightKind {
    /// Depth texture shape this kind renders its shadow into.
    pub fn shadow_target(self) -> TextureTarget {
        match self {
            LightKind::Point => TextureTarget::CubeMap,
            LightKind::Directional | LightKind::Spot => TextureTarget::Texture2D,
        }
    }
}

/// Which depth shader a shadow draw goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderVariant {
    Normal,
    Instanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub u32);

static NEXT_LIGHT_ID: AtomicU32 = AtomicU32::new(1);

impl LightId {
    fn next() -> Self {
        LightId(NEXT_LIGHT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// State every light variant carries besides its GPU record.
#[derive(Debug)]
pub struct LightCommon {
    pub(crate) id: LightId,
    pub(crate) entity: Option<Entity>,
    pub(crate) dirty: bool,
    /// Slot in the sampler array of this light's shadow shape.
    pub(crate) shadow_index: Option<u32>,
    pub(crate) shadow: Option<ShadowMap>,
}

impl LightCommon {
    pub fn new() -> Self {
        Self {
            id: LightId::next(),
            entity: None,
            dirty: false,
            shadow_index: None,
            shadow: None,
        }
    }
}

impl Default for LightCommon {
    fn default() -> Self {
        Self::new()
    }
}

/// World placement of a light-owning entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl LightTransform {
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (_, rotation, position) = matrix.to_scale_rotation_translation();
        Self { position, rotation }
    }

    /// Orientation in the stored Euler representation.
    pub fn euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(glam::EulerRot::XYZ);
        Vec3::new(x, y, z)
    }
}

/// The four depth programs of the shadow pass: 2D and cube targets, each with
/// a per-draw and an instanced vertex stage.
pub struct ShadowShaders<S> {
    pub plane: S,
    pub plane_instanced: S,
    pub cube: S,
    pub cube_instanced: S,
}

/// Picks the depth program for a target shape and draw variant.
pub trait ShadowShaderSet {
    fn select(&mut self, target: TextureTarget, variant: ShaderVariant) -> &mut dyn ShaderUniforms;
}

impl<S: ShaderUniforms> ShadowShaderSet for ShadowShaders<S> {
    fn select(&mut self, target: TextureTarget, variant: ShaderVariant) -> &mut dyn ShaderUniforms {
        match (target, variant) {
            (TextureTarget::Texture2D, ShaderVariant::Normal) => &mut self.plane,
            (TextureTarget::Texture2D, ShaderVariant::Instanced) => &mut self.plane_instanced,
            (TextureTarget::CubeMap, ShaderVariant::Normal) => &mut self.cube,
            (TextureTarget::CubeMap, ShaderVariant::Instanced) => &mut self.cube_instanced,
        }
    }
}

/// Capability shared by every light variant.
pub trait LightSource {
    fn kind(&self) -> LightKind;

    fn common(&self) -> &LightCommon;

    fn common_mut(&mut self) -> &mut LightCommon;

    /// Recomputes light-space transform(s) from the current position/direction.
    fn update_shadow_transforms(&mut self);

    /// Uploads the light-space transform(s) to an already bound depth shader.
    fn upload_shadow_uniforms(&self, shader: &mut dyn ShaderUniforms);

    /// Applies a world-space placement and converts orientation back to the
    /// stored Euler angles.
    fn apply_transform(&mut self, transform: &LightTransform);

    /// Snapshot of the GPU-visible record as raw bytes, used for change detection.
    fn record_bytes(&self) -> Vec<u8>;

    fn id(&self) -> LightId {
        self.common().id
    }

    fn entity(&self) -> Option<Entity> {
        self.common().entity
    }

    fn is_dirty(&self) -> bool {
        self.common().dirty
    }

    fn mark_dirty(&mut self) {
        self.common_mut().dirty = true;
    }

    fn shadow_index(&self) -> Option<u32> {
        self.common().shadow_index
    }

    fn shadow_map(&self) -> Option<&ShadowMap> {
        self.common().shadow.as_ref()
    }

    /// Allocates the depth target, releasing any previous one first, then
    /// computes the light-space transform(s).
    fn init_shadow(&mut self, device: &SharedDevice, resolution: u32) {
        let target = self.kind().shadow_target();
        let common = self.common_mut();
        common.shadow = None;
        common.shadow = Some(ShadowMap::new(device, target, resolution));
        let before = self.record_bytes();
        self.update_shadow_transforms();
        if self.record_bytes() != before {
            self.mark_dirty();
        }
    }

    /// Makes this light's depth map the render target and uploads its
    /// light-space transform(s) to the matching depth shader.
    fn set_up_shadow_buffer(
        &self,
        shaders: &mut dyn ShadowShaderSet,
        variant: ShaderVariant,
    ) -> FramebufferStatus {
        let Some(shadow) = self.shadow_map() else {
            log::error!("light {:?} has no shadow map; call init_shadow first", self.id());
            return FramebufferStatus::Incomplete(0);
        };
        let shader = shaders.select(shadow.target(), variant);
        shader.bind();
        self.upload_shadow_uniforms(shader);

        let status = shadow.bind();
        if let FramebufferStatus::Incomplete(code) = status {
            log::error!(
                "shadow framebuffer for {:?} light {:?} is not complete (status {code:#x})",
                self.kind(),
                self.id()
            );
        }
        status
    }

    /// Applies an external manipulation and refreshes the shadow transforms.
    /// Only raises the dirty flag when the GPU record actually changed.
    fn edit_light(&mut self, transform: &LightTransform) {
        let before = self.record_bytes();
        self.apply_transform(transform);
        self.update_shadow_transforms();
        if self.record_bytes() != before {
            self.mark_dirty();
        }
    }
}

/// A light of any supported kind, as handed to the registry.
#[derive(Debug)]
pub enum Light {
    Directional(DirLight),
    Point(PointLight),
    Spot(SpotLight),
}

impl Light {
    pub fn kind(&self) -> LightKind {
        match self {
            Light::Directional(_) => LightKind::Directional,
            Light::Point(_) => LightKind::Point,
            Light::Spot(_) => LightKind::Spot,
        }
    }

    pub fn as_source(&self) -> &dyn LightSource {
        match self {
            Light::Directional(light) => light,
            Light::Point(light) => light,
            Light::Spot(light) => light,
        }
    }

    pub fn as_source_mut(&mut self) -> &mut dyn LightSource {
        match self {
            Light::Directional(light) => light,
            Light::Point(light) => light,
            Light::Spot(light) => light,
        }
    }
}

impl From<DirLight> for Light {
    fn from(light: DirLight) -> Self {
        Light::Directional(light)
    }
}

impl From<PointLight> for Light {
    fn from(light: PointLight) -> Self {
        Light::Point(light)
    }
}

impl From<SpotLight> for Light {
    fn from(light: SpotLight) -> Self {
        Light::Spot(light)
    }
}

use glam::Vec3;

/// Index into the MeshStore resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHandle(pub usize);

/// Metallic-roughness PBR parameters, uploaded per draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub albedo: Vec3,
    pub metallic: f32,
    pub roughness: f32,
    pub ao: f32,
}

impl Material {
    pub fn dielectric(albedo: Vec3, roughness: f32) -> Self {
        Self {
            albedo,
            metallic: 0.0,
            roughness,
            ao: 1.0,
        }
    }

    pub fn metal(albedo: Vec3, roughness: f32) -> Self {
        Self {
            albedo,
            metallic: 1.0,
            roughness,
            ao: 1.0,
        }
    }
}

/// Draws the mesh once per stored instance matrix instead of at the entity's
/// transform. Used for large static fields such as the asteroid ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstancedMesh(pub MeshHandle);

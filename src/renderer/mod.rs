pub mod mesh;
pub mod shader;

use glam::{Mat4, Vec3};
use hecs::World;
use mesh::Mesh;
use shader::{ShaderProgram, ShaderUniforms};

use crate::components::{GlobalTransform, InstancedMesh, Material, MeshHandle};
use crate::error::ShaderError;
use crate::lighting::{LightSystem, ShaderVariant, ShadowPassStats, ShadowShaders};

const PBR_VERT: &str = include_str!("../../shaders/pbr.vert");
const PBR_INSTANCED_VERT: &str = include_str!("../../shaders/pbr_instanced.vert");
const PBR_FRAG: &str = include_str!("../../shaders/pbr.frag");
const SHADOW_VERT: &str = include_str!("../../shaders/shadow_depth.vert");
const SHADOW_INSTANCED_VERT: &str = include_str!("../../shaders/shadow_depth_instanced.vert");
const SHADOW_FRAG: &str = include_str!("../../shaders/shadow_depth.frag");
const CUBE_VERT: &str = include_str!("../../shaders/cube_depth.vert");
const CUBE_INSTANCED_VERT: &str = include_str!("../../shaders/cube_depth_instanced.vert");
const CUBE_GEOM: &str = include_str!("../../shaders/cube_depth.geom");
const CUBE_FRAG: &str = include_str!("../../shaders/cube_depth.frag");

const CLEAR_COLOR: Vec3 = Vec3::new(0.02, 0.02, 0.03);

/// Holds all loaded meshes. Entities reference meshes by MeshHandle index.
pub struct MeshStore {
    meshes: Vec<Mesh>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self { meshes: Vec::new() }
    }

    pub fn add(&mut self, mesh: Mesh) -> MeshHandle {
        let handle = MeshHandle(self.meshes.len());
        self.meshes.push(mesh);
        handle
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: MeshHandle) -> Option<&mut Mesh> {
        self.meshes.get_mut(handle.0)
    }
}

/// Per-frame view parameters for the colour pass.
pub struct FrameView {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub viewport: (u32, u32),
}

/// Runs the fixed pipeline: depth pass for every light, then the forward
/// PBR pass for plain and instanced geometry.
pub struct Renderer {
    pbr: ShaderProgram,
    pbr_instanced: ShaderProgram,
    shadow_shaders: ShadowShaders<ShaderProgram>,
}

impl Renderer {
    pub fn init() -> Result<Self, ShaderError> {
        unsafe {
            gl::Enable(gl::DEPTH_TEST);
            gl::Enable(gl::TEXTURE_CUBE_MAP_SEAMLESS);
            gl::ClearColor(CLEAR_COLOR.x, CLEAR_COLOR.y, CLEAR_COLOR.z, 1.0);
        }

        let shadow_shaders = ShadowShaders {
            plane: ShaderProgram::from_sources(SHADOW_VERT, SHADOW_FRAG)?,
            plane_instanced: ShaderProgram::from_sources(SHADOW_INSTANCED_VERT, SHADOW_FRAG)?,
            cube: ShaderProgram::with_geometry(CUBE_VERT, CUBE_GEOM, CUBE_FRAG)?,
            cube_instanced: ShaderProgram::with_geometry(CUBE_INSTANCED_VERT, CUBE_GEOM, CUBE_FRAG)?,
        };

        Ok(Self {
            pbr: ShaderProgram::from_sources(PBR_VERT, PBR_FRAG)?,
            pbr_instanced: ShaderProgram::from_sources(PBR_INSTANCED_VERT, PBR_FRAG)?,
            shadow_shaders,
        })
    }

    pub fn draw_scene(
        &mut self,
        world: &World,
        meshes: &MeshStore,
        lights: &LightSystem,
        frame: &FrameView,
    ) -> ShadowPassStats {
        let stats = lights.render_shadow_maps(&mut self.shadow_shaders, |variant, shader| match variant {
            ShaderVariant::Normal => draw_meshes(world, meshes, shader, false),
            ShaderVariant::Instanced => draw_instanced(world, meshes, shader, false),
        });

        let (width, height) = frame.viewport;
        unsafe {
            gl::Viewport(0, 0, width as i32, height as i32);
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        }

        // Sampler uniforms are per program: bind the depth maps for each.
        lights.push_depth_maps_to_shader(&mut self.pbr);
        set_frame_uniforms(&mut self.pbr, frame);
        draw_meshes(world, meshes, &mut self.pbr, true);

        lights.push_depth_maps_to_shader(&mut self.pbr_instanced);
        set_frame_uniforms(&mut self.pbr_instanced, frame);
        draw_instanced(world, meshes, &mut self.pbr_instanced, true);

        stats
    }
}

fn set_frame_uniforms(shader: &mut dyn ShaderUniforms, frame: &FrameView) {
    shader.set_mat4("u_view", &frame.view);
    shader.set_mat4("u_projection", &frame.projection);
    shader.set_vec3("u_camera_pos", frame.camera_position);
}

fn set_material(shader: &mut dyn ShaderUniforms, material: &Material) {
    shader.set_vec3("u_albedo", material.albedo);
    shader.set_float("u_metallic", material.metallic);
    shader.set_float("u_roughness", material.roughness);
    shader.set_float("u_ao", material.ao);
}

fn draw_meshes(world: &World, meshes: &MeshStore, shader: &mut dyn ShaderUniforms, with_material: bool) {
    for (_entity, (global, handle, material)) in world
        .query::<(&GlobalTransform, &MeshHandle, Option<&Material>)>()
        .iter()
    {
        let Some(mesh) = meshes.get(*handle) else {
            continue;
        };
        shader.set_mat4("u_model", &global.0);
        if with_material {
            if let Some(material) = material {
                set_material(shader, material);
            }
        }
        mesh.draw();
    }
}

fn draw_instanced(world: &World, meshes: &MeshStore, shader: &mut dyn ShaderUniforms, with_material: bool) {
    for (_entity, (instanced, material)) in world
        .query::<(&InstancedMesh, Option<&Material>)>()
        .iter()
    {
        let Some(mesh) = meshes.get(instanced.0) else {
            continue;
        };
        if with_material {
            if let Some(material) = material {
                set_material(shader, material);
            }
        }
        mesh.draw_instanced();
    }
}

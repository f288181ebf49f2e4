use glam::{EulerRot, Mat4, Quat, Vec3};
use hecs::{Entity, World};

use crate::components::*;
use crate::lighting::{Attenuation, Cone, DirLight, LightSystem, PointLight, SpotLight};
use crate::renderer::mesh::create_box;
use crate::renderer::MeshStore;

/// Rotation whose XYZ Euler decomposition is `euler`, the form lights store
/// their direction in.
pub fn rotation_from_euler(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)
}

fn spawn_transform(world: &mut World, local: LocalTransform) -> Entity {
    let global = GlobalTransform(local.matrix());
    world.spawn((local, global))
}

/// Spawn a large flat slab whose top face sits at y = 0.
pub fn spawn_ground(world: &mut World, meshes: &mut MeshStore) -> Entity {
    const HALF_EXTENT: f32 = 400.0;
    const THICKNESS: f32 = 2.0;
    // Unit box: Y from -0.5 to +0.5 in local space.
    let ground_handle = meshes.add(create_box(1.0, 1.0, 1.0));
    let ground_t = LocalTransform::new(Vec3::new(0.0, -THICKNESS / 2.0, 0.0))
        .with_scale(Vec3::new(HALF_EXTENT * 2.0, THICKNESS, HALF_EXTENT * 2.0));
    world.spawn((
        ground_t,
        GlobalTransform(ground_t.matrix()),
        ground_handle,
        Material::dielectric(Vec3::new(0.45, 0.45, 0.42), 0.9),
    ))
}

pub fn spawn_prop(world: &mut World, mesh: MeshHandle, local: LocalTransform, material: Material) -> Entity {
    world.spawn((local, GlobalTransform(local.matrix()), mesh, material))
}

pub fn spawn_directional_light(world: &mut World, lights: &mut LightSystem, euler: Vec3, color: Vec3) -> Entity {
    let entity = spawn_transform(world, LocalTransform::new(Vec3::ZERO).with_rotation(rotation_from_euler(euler)));
    let handle = lights.add_entity_light(entity, DirLight::new(euler, color));
    let _ = world.insert_one(entity, LightEmitter(handle));
    entity
}

pub fn spawn_point_light(
    world: &mut World,
    lights: &mut LightSystem,
    position: Vec3,
    color: Vec3,
    radius: f32,
) -> Entity {
    let entity = spawn_transform(world, LocalTransform::new(position));
    let handle = lights.add_entity_light(
        entity,
        PointLight::new(position, color, Attenuation::for_radius(radius)),
    );
    let _ = world.insert_one(entity, LightEmitter(handle));
    entity
}

pub fn spawn_spot_light(
    world: &mut World,
    lights: &mut LightSystem,
    position: Vec3,
    euler: Vec3,
    color: Vec3,
    cone: Cone,
    radius: f32,
) -> Entity {
    let local = LocalTransform::new(position).with_rotation(rotation_from_euler(euler));
    let entity = spawn_transform(world, local);
    let handle = lights.add_entity_light(
        entity,
        SpotLight::new(position, euler, color, cone, Attenuation::for_radius(radius)),
    );
    let _ = world.insert_one(entity, LightEmitter(handle));
    entity
}

/// Deterministic xorshift; the ring must look the same on every run.
struct Xorshift(u32);

impl Xorshift {
    fn next_f32(&mut self) -> f32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        (x >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// Model matrices for a flat ring of rocks around the origin.
pub fn asteroid_ring(count: usize, inner_radius: f32, outer_radius: f32, seed: u32) -> Vec<Mat4> {
    let mut rng = Xorshift(seed.max(1));
    (0..count)
        .map(|i| {
            let angle = i as f32 / count.max(1) as f32 * std::f32::consts::TAU;
            let radius = inner_radius + (outer_radius - inner_radius) * rng.next_f32();
            let height = (rng.next_f32() - 0.5) * 6.0;
            let position = Vec3::new(angle.cos() * radius, 20.0 + height, angle.sin() * radius);
            let scale = 0.4 + rng.next_f32() * 1.6;
            let axis = Vec3::new(rng.next_f32() - 0.5, rng.next_f32() - 0.5, rng.next_f32() - 0.5)
                .try_normalize()
                .unwrap_or(Vec3::Y);
            let rotation = Quat::from_axis_angle(axis, rng.next_f32() * std::f32::consts::TAU);
            Mat4::from_scale_rotation_translation(Vec3::splat(scale), rotation, position)
        })
        .collect()
}

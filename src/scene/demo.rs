use glam::{Quat, Vec3};
use hecs::{Entity, World};

use crate::components::{InstancedMesh, LocalTransform, Material, Orbit, Spin};
use crate::lighting::{Cone, LightSystem};
use crate::renderer::mesh::{create_box, create_sphere};
use crate::renderer::MeshStore;
use crate::scene::prefabs::{
    asteroid_ring, spawn_directional_light, spawn_ground, spawn_point_light, spawn_prop,
    spawn_spot_light,
};

const ASTEROID_COUNT: usize = 2000;

/// Spawns the demo lights: one sun, three orbiting point lights and a
/// sweeping spot light. Needs no GL context, so headless runs use it too.
/// Returns the light entities in registration order.
pub fn build_demo_lights(world: &mut World, lights: &mut LightSystem) -> Vec<Entity> {
    let mut entities = Vec::new();

    entities.push(spawn_directional_light(
        world,
        lights,
        Vec3::new(0.6, -0.9, 0.0),
        Vec3::new(1.6, 1.5, 1.35),
    ));

    let lamps = [
        (Vec3::new(1.0, 0.55, 0.2), 0.0),
        (Vec3::new(0.25, 0.45, 1.0), 2.1),
        (Vec3::new(0.2, 1.0, 0.35), 4.2),
    ];
    for (color, phase) in lamps {
        let orbit = Orbit {
            center: Vec3::ZERO,
            radius: 9.0,
            height: 4.0,
            speed: 0.6,
            phase,
        };
        let start = orbit.center + Vec3::new(phase.cos() * orbit.radius, orbit.height, phase.sin() * orbit.radius);
        let entity = spawn_point_light(world, lights, start, color * 6.0, 25.0);
        let _ = world.insert_one(entity, orbit);
        entities.push(entity);
    }

    let spot = spawn_spot_light(
        world,
        lights,
        Vec3::new(0.0, 18.0, 14.0),
        Vec3::new(-1.2, -0.8, 0.0),
        Vec3::new(8.0, 7.5, 6.5),
        Cone {
            inner_deg: 14.0,
            outer_deg: 20.0,
        },
        50.0,
    );
    let _ = world.insert_one(spot, Spin { axis: Vec3::X, speed: 0.3 });
    entities.push(spot);

    entities
}

/// Demo geometry plus lights. Requires a current GL context.
pub fn load_demo_scene(world: &mut World, lights: &mut LightSystem) -> (MeshStore, Vec<Entity>) {
    let mut meshes = MeshStore::new();
    spawn_ground(world, &mut meshes);

    let sphere = meshes.add(create_sphere(1.0, 32, 64));
    let cube = meshes.add(create_box(1.0, 1.0, 1.0));

    for (i, roughness) in [0.15_f32, 0.4, 0.7].into_iter().enumerate() {
        let x = (i as f32 - 1.0) * 5.0;
        spawn_prop(
            world,
            sphere,
            LocalTransform::new(Vec3::new(x, 1.5, 0.0)).with_scale(Vec3::splat(1.5)),
            Material::metal(Vec3::new(0.95, 0.64, 0.54), roughness),
        );
    }
    for &(x, z, h) in &[(8.0_f32, -6.0_f32, 4.0_f32), (-9.0, 4.0, 6.0), (3.0, 9.0, 2.5)] {
        spawn_prop(
            world,
            cube,
            LocalTransform::new(Vec3::new(x, h / 2.0, z))
                .with_rotation(Quat::from_rotation_y(x * 0.1))
                .with_scale(Vec3::new(2.5, h, 2.5)),
            Material::dielectric(Vec3::new(0.6, 0.6, 0.62), 0.5),
        );
    }

    let rock = meshes.add(create_sphere(1.0, 6, 8));
    if let Some(mesh) = meshes.get_mut(rock) {
        mesh.set_instances(&asteroid_ring(ASTEROID_COUNT, 60.0, 110.0, 0x5eed));
    }
    world.spawn((
        InstancedMesh(rock),
        Material::dielectric(Vec3::new(0.42, 0.36, 0.3), 0.85),
    ));

    let light_entities = build_demo_lights(world, lights);
    log::info!(
        "demo scene built: {} entities, {} lights, {ASTEROID_COUNT} asteroids",
        world.len(),
        lights.registry().len()
    );
    (meshes, light_entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::LightEmitter;
    use crate::config::LightingConfig;
    use crate::gpu::{HeadlessDevice, SharedDevice};
    use crate::lighting::LightKind;
    use std::rc::Rc;

    #[test]
    fn every_light_entity_carries_its_handle() {
        let device: SharedDevice = Rc::new(HeadlessDevice::new());
        let mut lights = LightSystem::new(device, LightingConfig::default());
        let mut world = World::new();
        let entities = build_demo_lights(&mut world, &mut lights);

        let kinds: Vec<LightKind> = entities
            .iter()
            .map(|&entity| {
                let emitter = world.get::<&LightEmitter>(entity).unwrap();
                let light = lights.registry().get(emitter.0).unwrap();
                assert_eq!(light.entity(), Some(entity));
                assert_eq!(lights.registry().find_by_entity(entity), Some(emitter.0));
                emitter.0.kind
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                LightKind::Directional,
                LightKind::Point,
                LightKind::Point,
                LightKind::Point,
                LightKind::Spot
            ]
        );
    }
}

use glam::{Quat, Vec3};
use hecs::World;

use crate::components::{LocalTransform, Orbit, Spin};

/// Advances procedural light motion. `time` is seconds since start, `dt` the
/// frame step. Orbits are evaluated from absolute time so they never drift;
/// spins accumulate.
pub fn light_animation_system(world: &mut World, time: f32, dt: f32) {
    for (_entity, (local, orbit)) in world.query_mut::<(&mut LocalTransform, &Orbit)>() {
        let angle = orbit.phase + orbit.speed * time;
        local.position = orbit.center
            + Vec3::new(angle.cos() * orbit.radius, orbit.height, angle.sin() * orbit.radius);
    }

    for (_entity, (local, spin)) in world.query_mut::<(&mut LocalTransform, &Spin)>() {
        let axis = spin.axis.normalize_or_zero();
        if axis == Vec3::ZERO {
            continue;
        }
        local.rotation = (Quat::from_axis_angle(axis, spin.speed * dt) * local.rotation).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_is_a_function_of_time() {
        let mut world = World::new();
        let orbit = Orbit {
            center: Vec3::new(0.0, 1.0, 0.0),
            radius: 4.0,
            height: 2.0,
            speed: std::f32::consts::FRAC_PI_2,
            phase: 0.0,
        };
        let entity = world.spawn((LocalTransform::new(Vec3::ZERO), orbit));

        light_animation_system(&mut world, 1.0, 0.016);
        let position = world.get::<&LocalTransform>(entity).unwrap().position;
        assert!(position.abs_diff_eq(Vec3::new(0.0, 3.0, 4.0), 1e-5));
    }

    #[test]
    fn spin_accumulates_rotation() {
        let mut world = World::new();
        let spin = Spin {
            axis: Vec3::Y,
            speed: 1.0,
        };
        let entity = world.spawn((LocalTransform::new(Vec3::ZERO), spin));
        light_animation_system(&mut world, 0.0, 0.5);
        light_animation_system(&mut world, 0.5, 0.5);

        let rotation = world.get::<&LocalTransform>(entity).unwrap().rotation;
        assert!(rotation.abs_diff_eq(Quat::from_rotation_y(1.0), 1e-5));
    }
}

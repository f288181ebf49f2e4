use glam::{EulerRot, Quat, Vec3};
use hecs::{Entity, World};
use sdl2::keyboard::Scancode;

use crate::components::LocalTransform;
use crate::engine::input::InputState;

const TRANSLATE_SPEED: f32 = 10.0;
const ROTATE_SPEED: f32 = 1.2;

/// Per-frame manipulation request for the selected light entity. Axes are
/// in [-1, 1]; rotation is applied to the stored Euler angles (x, y).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GizmoInput {
    pub translate: Vec3,
    pub rotate_x: f32,
    pub rotate_y: f32,
}

impl GizmoInput {
    pub fn from_keys(input: &InputState) -> Self {
        let axis = |pos: Scancode, neg: Scancode| {
            (input.is_key_held(pos) as i32 - input.is_key_held(neg) as i32) as f32
        };
        Self {
            translate: Vec3::new(
                axis(Scancode::Right, Scancode::Left),
                axis(Scancode::PageUp, Scancode::PageDown),
                axis(Scancode::Down, Scancode::Up),
            ),
            rotate_x: axis(Scancode::L, Scancode::J),
            rotate_y: axis(Scancode::I, Scancode::K),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.translate == Vec3::ZERO && self.rotate_x == 0.0 && self.rotate_y == 0.0
    }
}

/// Moves and turns `entity` the way an editor gizmo would. The light picks
/// the change up through its world transform on the next sync.
pub fn gizmo_system(world: &mut World, entity: Entity, input: GizmoInput, dt: f32) {
    if input.is_idle() {
        return;
    }
    let Ok(mut local) = world.get::<&mut LocalTransform>(entity) else {
        return;
    };
    local.position += input.translate * TRANSLATE_SPEED * dt;

    let (x, y, z) = local.rotation.to_euler(EulerRot::XYZ);
    local.rotation = Quat::from_euler(
        EulerRot::XYZ,
        x + input.rotate_x * ROTATE_SPEED * dt,
        y + input.rotate_y * ROTATE_SPEED * dt,
        z,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_scales_with_dt() {
        let mut world = World::new();
        let entity = world.spawn((LocalTransform::new(Vec3::ZERO),));
        let input = GizmoInput {
            translate: Vec3::X,
            ..Default::default()
        };
        gizmo_system(&mut world, entity, input, 0.5);
        let local = world.get::<&LocalTransform>(entity).unwrap();
        assert_eq!(local.position, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(local.rotation, Quat::IDENTITY);
    }

    #[test]
    fn rotation_edits_euler_angles() {
        let mut world = World::new();
        let entity = world.spawn((LocalTransform::new(Vec3::ZERO),));
        let input = GizmoInput {
            rotate_y: 1.0,
            ..Default::default()
        };
        gizmo_system(&mut world, entity, input, 0.25);
        let (x, y, _) = world.get::<&LocalTransform>(entity).unwrap().rotation.to_euler(EulerRot::XYZ);
        assert!(x.abs() < 1e-5);
        assert!((y - 0.3).abs() < 1e-5);
    }
}

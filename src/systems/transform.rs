use hecs::World;

use crate::components::{GlobalTransform, LocalTransform};

/// Writes every entity's LocalTransform matrix into its GlobalTransform.
/// Lights read placement from GlobalTransform, so this runs before
/// `LightSystem::sync_from_world`.
pub fn transform_propagation_system(world: &mut World) {
    for (_entity, (local, global)) in world.query_mut::<(&LocalTransform, &mut GlobalTransform)>() {
        global.0 = local.matrix();
    }
}

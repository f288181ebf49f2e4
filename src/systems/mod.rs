mod animation;
mod gizmo;
mod transform;

pub use animation::light_animation_system;
pub use gizmo::{gizmo_system, GizmoInput};
pub use transform::transform_propagation_system;

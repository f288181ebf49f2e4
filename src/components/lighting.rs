use glam::Vec3;

use crate::lighting::LightHandle;

/// Links an entity to the light its transform drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightEmitter(pub LightHandle);

/// Circles `center` in the XZ plane at `radius`, `height` above it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub center: Vec3,
    pub radius: f32,
    pub height: f32,
    /// Radians per second.
    pub speed: f32,
    pub phase: f32,
}

/// Constant rotation about a world axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub axis: Vec3,
    /// Radians per second.
    pub speed: f32,
}

//! Shadow-projection math for every light type, and the owned depth target
//! each light renders into.

use glam::{Mat4, Vec3};

use crate::gpu::{FramebufferId, FramebufferStatus, SharedDevice, TextureId, TextureTarget};

/// Distance the directional shadow camera is pulled back along -direction.
pub const DIRECTIONAL_DISTANCE: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

pub const DIRECTIONAL_BOUNDS: OrthoBounds = OrthoBounds {
    left: -750.0,
    right: 750.0,
    bottom: -750.0,
    top: 750.0,
    near: 1.0,
    far: 2000.0,
};

pub const POINT_FOV_DEG: f32 = 90.0;
pub const POINT_NEAR_PLANE: f32 = 1.0;
pub const POINT_FAR_PLANE: f32 = 25.0;

pub const SPOT_FOV_DEG: f32 = 45.0;
pub const SPOT_NEAR_PLANE: f32 = 1.0;
pub const SPOT_FAR_PLANE: f32 = 50.0;

/// View setup for one face of a cube depth map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeFace {
    pub direction: Vec3,
    pub up: Vec3,
}

/// Face order and up vectors follow the GL cube-map layer order
/// (+X, -X, +Y, -Y, +Z, -Z); the cube depth shader writes face `i` to layer `i`.
pub const CUBE_FACES: [CubeFace; 6] = [
    CubeFace { direction: Vec3::X, up: Vec3::NEG_Y },
    CubeFace { direction: Vec3::NEG_X, up: Vec3::NEG_Y },
    CubeFace { direction: Vec3::Y, up: Vec3::Z },
    CubeFace { direction: Vec3::NEG_Y, up: Vec3::NEG_Z },
    CubeFace { direction: Vec3::Z, up: Vec3::NEG_Y },
    CubeFace { direction: Vec3::NEG_Z, up: Vec3::NEG_Y },
];

/// Reconstructs a unit direction from stored Euler angles
/// (x = yaw, y = pitch; z is ignored).
pub fn euler_to_direction(euler: Vec3) -> Vec3 {
    let (yaw, pitch) = (euler.x, euler.y);
    Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
}

/// `look_at_rh` with +Y up, switching to +Z when the view direction is
/// (anti)parallel to +Y.
pub fn look_at_y_up(eye: Vec3, target: Vec3) -> Mat4 {
    let forward = (target - eye).normalize_or_zero();
    let up = if forward.dot(Vec3::Y).abs() > 0.999 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    Mat4::look_at_rh(eye, target, up)
}

pub fn directional_projection() -> Mat4 {
    let b = DIRECTIONAL_BOUNDS;
    Mat4::orthographic_rh_gl(b.left, b.right, b.bottom, b.top, b.near, b.far)
}

/// Shadow camera for a directional light: returns its virtual world position
/// and the light-space (projection × view) matrix.
pub fn directional_light_space(euler: Vec3) -> (Vec3, Mat4) {
    let direction = euler_to_direction(euler);
    let position = -DIRECTIONAL_DISTANCE * direction;
    let view = look_at_y_up(position, Vec3::ZERO);
    (position, directional_projection() * view)
}

pub fn point_projection(aspect: f32) -> Mat4 {
    Mat4::perspective_rh_gl(POINT_FOV_DEG.to_radians(), aspect, POINT_NEAR_PLANE, POINT_FAR_PLANE)
}

/// One view-projection per cube face, in [`CUBE_FACES`] order.
pub fn point_shadow_transforms(position: Vec3) -> [Mat4; 6] {
    let projection = point_projection(1.0);
    CUBE_FACES.map(|face| projection * Mat4::look_at_rh(position, position + face.direction, face.up))
}

pub fn spot_projection(aspect: f32) -> Mat4 {
    Mat4::perspective_rh_gl(SPOT_FOV_DEG.to_radians(), aspect, SPOT_NEAR_PLANE, SPOT_FAR_PLANE)
}

pub fn spot_light_space(position: Vec3, euler: Vec3) -> Mat4 {
    let direction = euler_to_direction(euler).normalize();
    spot_projection(1.0) * look_at_y_up(position, position + direction)
}

/// Depth texture plus the framebuffer that renders into it. Both handles are
/// released when the map is dropped.
pub struct ShadowMap {
    device: SharedDevice,
    target: TextureTarget,
    texture: TextureId,
    framebuffer: FramebufferId,
    resolution: u32,
}

impl ShadowMap {
    pub fn new(device: &SharedDevice, target: TextureTarget, resolution: u32) -> Self {
        let texture = device.create_depth_texture(target, resolution);
        let framebuffer = device.create_depth_framebuffer(texture, target);
        log::debug!(
            "allocated {target:?} shadow map {}x{} (texture {}, framebuffer {})",
            resolution,
            resolution,
            texture.0,
            framebuffer.0
        );
        Self {
            device: device.clone(),
            target,
            texture,
            framebuffer,
            resolution,
        }
    }

    pub fn target(&self) -> TextureTarget {
        self.target
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Binds the framebuffer as render target with a full-resolution viewport.
    pub fn bind(&self) -> FramebufferStatus {
        self.device.bind_depth_target(self.framebuffer, self.resolution)
    }
}

impl Drop for ShadowMap {
    fn drop(&mut self) {
        self.device.delete_framebuffer(self.framebuffer);
        self.device.delete_texture(self.texture);
    }
}

impl std::fmt::Debug for ShadowMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowMap")
            .field("target", &self.target)
            .field("texture", &self.texture.0)
            .field("framebuffer", &self.framebuffer.0)
            .field("resolution", &self.resolution)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessDevice;
    use std::rc::Rc;

    #[test]
    fn zero_euler_points_along_x() {
        assert_eq!(euler_to_direction(Vec3::ZERO), Vec3::X);
        let up = euler_to_direction(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        assert!(up.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn directional_camera_sits_behind_the_scene() {
        let (position, light_space) = directional_light_space(Vec3::ZERO);
        assert_eq!(position, Vec3::new(-1000.0, 0.0, 0.0));
        assert_eq!(
            DIRECTIONAL_BOUNDS,
            OrthoBounds {
                left: -750.0,
                right: 750.0,
                bottom: -750.0,
                top: 750.0,
                near: 1.0,
                far: 2000.0
            }
        );
        let expected = Mat4::orthographic_rh_gl(-750.0, 750.0, -750.0, 750.0, 1.0, 2000.0)
            * Mat4::look_at_rh(Vec3::new(-1000.0, 0.0, 0.0), Vec3::ZERO, Vec3::Y);
        assert_eq!(light_space, expected);

        // The origin lands in the middle of the depth range.
        let origin = light_space.project_point3(Vec3::ZERO);
        assert!(origin.truncate().abs_diff_eq(glam::Vec2::ZERO, 1e-5));
        assert!((origin.z - (1000.0 - 1.0) / (2000.0 - 1.0) * 2.0 + 1.0).abs() < 1e-4);
    }

    #[test]
    fn straight_down_light_stays_finite() {
        let down = Vec3::new(0.0, -std::f32::consts::FRAC_PI_2, 0.0);
        let (_, light_space) = directional_light_space(down);
        assert!(light_space.is_finite());
        assert!(spot_light_space(Vec3::new(0.0, 10.0, 0.0), down).is_finite());
    }

    #[test]
    fn cube_faces_follow_layer_convention() {
        let expected = [
            (Vec3::X, Vec3::NEG_Y),
            (Vec3::NEG_X, Vec3::NEG_Y),
            (Vec3::Y, Vec3::Z),
            (Vec3::NEG_Y, Vec3::NEG_Z),
            (Vec3::Z, Vec3::NEG_Y),
            (Vec3::NEG_Z, Vec3::NEG_Y),
        ];
        for (face, (direction, up)) in CUBE_FACES.iter().zip(expected) {
            assert_eq!(face.direction, direction);
            assert_eq!(face.up, up);
        }
    }

    #[test]
    fn each_cube_face_looks_down_its_axis() {
        let position = Vec3::new(3.0, 2.0, -1.0);
        let transforms = point_shadow_transforms(position);
        for (face, transform) in CUBE_FACES.iter().zip(transforms) {
            // A point ahead on the face axis projects to the face centre.
            let ndc = transform.project_point3(position + face.direction * 5.0);
            assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5, "{face:?} -> {ndc}");
            assert!(ndc.z > -1.0 && ndc.z < 1.0);
        }
    }

    #[test]
    fn spot_view_looks_along_reconstructed_direction() {
        let light_space = spot_light_space(Vec3::ZERO, Vec3::ZERO);
        let expected = spot_projection(1.0) * Mat4::look_at_rh(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert_eq!(light_space, expected);
    }

    #[test]
    fn dropping_a_map_releases_both_handles() {
        let headless = Rc::new(HeadlessDevice::new());
        let device: SharedDevice = headless.clone();
        let map = ShadowMap::new(&device, TextureTarget::CubeMap, 64);
        assert_eq!(headless.texture_size(map.texture()), Some((TextureTarget::CubeMap, 64)));
        assert!(map.bind().is_complete());
        drop(map);
        assert_eq!(headless.live_textures(), 0);
        assert_eq!(headless.live_framebuffers(), 0);
    }
}

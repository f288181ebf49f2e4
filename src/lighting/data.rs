//! GPU-visible light records. Each struct mirrors the std430 layout declared
//! in `shaders/pbr.frag`; a storage buffer holds a packed array of one type.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DirLightData {
    /// Euler angles (x = yaw, y = pitch) in xyz, w unused.
    pub direction: Vec4,
    pub color: Vec4,
    /// Virtual shadow-camera position, derived from `direction`.
    pub position: Vec4,
    pub light_space_matrix: Mat4,
    pub shadow_index: i32,
    pub _pad: [i32; 3],
}

impl DirLightData {
    pub fn new(euler: Vec3, color: Vec3) -> Self {
        Self {
            direction: euler.extend(1.0),
            color: color.extend(1.0),
            position: Vec4::W,
            light_space_matrix: Mat4::IDENTITY,
            shadow_index: -1,
            _pad: [0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightData {
    pub position: Vec4,
    pub color: Vec4,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub far_plane: f32,
    pub shadow_index: i32,
    pub _pad: [i32; 3],
}

impl PointLightData {
    pub fn new(position: Vec3, color: Vec3, attenuation: Attenuation) -> Self {
        Self {
            position: position.extend(1.0),
            color: color.extend(1.0),
            constant: attenuation.constant,
            linear: attenuation.linear,
            quadratic: attenuation.quadratic,
            far_plane: super::shadow::POINT_FAR_PLANE,
            shadow_index: -1,
            _pad: [0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpotLightData {
    pub position: Vec4,
    /// Euler angles, same convention as [`DirLightData::direction`].
    pub direction: Vec4,
    pub color: Vec4,
    /// Cosine of the inner cone half-angle.
    pub cut_off: f32,
    /// Cosine of the outer cone half-angle.
    pub outer_cut_off: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub shadow_index: i32,
    pub _pad: [i32; 2],
    pub light_space_matrix: Mat4,
}

impl SpotLightData {
    pub fn new(position: Vec3, euler: Vec3, color: Vec3, cone: Cone, attenuation: Attenuation) -> Self {
        Self {
            position: position.extend(1.0),
            direction: euler.extend(1.0),
            color: color.extend(1.0),
            cut_off: cone.inner_deg.to_radians().cos(),
            outer_cut_off: cone.outer_deg.to_radians().cos(),
            constant: attenuation.constant,
            linear: attenuation.linear,
            quadratic: attenuation.quadratic,
            shadow_index: -1,
            _pad: [0; 2],
            light_space_matrix: Mat4::IDENTITY,
        }
    }
}

/// Distance falloff `1 / (constant + linear*d + quadratic*d²)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    /// Coefficients that fade to roughly zero at `radius`.
    pub fn for_radius(radius: f32) -> Self {
        Self {
            constant: 1.0,
            linear: 4.5 / radius,
            quadratic: 75.0 / (radius * radius),
        }
    }
}

/// Spot cone angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    pub inner_deg: f32,
    pub outer_deg: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, offset_of, size_of};

    #[test]
    fn records_match_std430_sizes() {
        assert_eq!(size_of::<DirLightData>(), 128);
        assert_eq!(size_of::<PointLightData>(), 64);
        assert_eq!(size_of::<SpotLightData>(), 144);
        assert_eq!(align_of::<SpotLightData>(), 16);
    }

    #[test]
    fn spot_matrix_sits_on_a_vec4_boundary() {
        assert_eq!(offset_of!(SpotLightData, cut_off), 48);
        assert_eq!(offset_of!(SpotLightData, shadow_index), 68);
        assert_eq!(offset_of!(SpotLightData, light_space_matrix), 80);
        assert_eq!(offset_of!(DirLightData, shadow_index), 112);
        assert_eq!(offset_of!(PointLightData, shadow_index), 48);
    }

    #[test]
    fn spot_cone_is_stored_as_cosines() {
        let data = SpotLightData::new(
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::ONE,
            Cone {
                inner_deg: 0.0,
                outer_deg: 60.0,
            },
            Attenuation::for_radius(10.0),
        );
        assert_eq!(data.cut_off, 1.0);
        assert!((data.outer_cut_off - 0.5).abs() < 1e-6);
        assert_eq!(data.linear, 0.45);
    }
}

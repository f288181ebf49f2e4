use std::fmt::Write;

use super::light::{LightKind, LightSource};
use super::registry::{LightHandle, LightRegistry};

/// Human-readable dump of every light in registration order. Each line shows
/// the buffer slot, shadow state and the fields of that light's record.
pub fn light_tree(registry: &LightRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Lights ({})", registry.len());

    for (handle, light) in registry.iter() {
        let _ = writeln!(out, "  {} {}", header(handle, light), fields(registry, handle));
    }
    out
}

fn fields(registry: &LightRegistry, handle: LightHandle) -> String {
    match handle.kind {
        LightKind::Directional => registry.directional().get(handle.slot).map(|light| {
            let data = light.data();
            format!(
                "euler={:.3} color={:.2} position={:.1}",
                data.direction.truncate(),
                data.color.truncate(),
                data.position.truncate()
            )
        }),
        LightKind::Point => registry.point().get(handle.slot).map(|light| {
            let data = light.data();
            format!(
                "position={:.2} color={:.2} atten=({:.3}, {:.4}, {:.5})",
                data.position.truncate(),
                data.color.truncate(),
                data.constant,
                data.linear,
                data.quadratic
            )
        }),
        LightKind::Spot => registry.spot().get(handle.slot).map(|light| {
            let data = light.data();
            format!(
                "position={:.2} euler={:.3} color={:.2} cutoff=({:.3}, {:.3})",
                data.position.truncate(),
                data.direction.truncate(),
                data.color.truncate(),
                data.cut_off,
                data.outer_cut_off
            )
        }),
    }
    .unwrap_or_default()
}

fn header(handle: LightHandle, light: &dyn LightSource) -> String {
    let kind = match handle.kind {
        LightKind::Directional => "directional",
        LightKind::Point => "point",
        LightKind::Spot => "spot",
    };
    let shadow = match light.shadow_map() {
        Some(map) => format!("tex {} fb {}", map.texture().0, map.framebuffer().0),
        None => "no shadow".to_string(),
    };
    let index = light
        .shadow_index()
        .map_or_else(|| "-".to_string(), |i| i.to_string());
    format!(
        "#{:<3} {kind:<11} slot {} shadow[{index}] {shadow}{}",
        light.id().0,
        handle.slot,
        if light.is_dirty() { " *dirty*" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::data::{Attenuation, Cone};
    use crate::lighting::{DirLight, PointLight, SpotLight};
    use glam::Vec3;

    fn lamp() -> PointLight {
        PointLight::new(Vec3::Y, Vec3::ONE, Attenuation::for_radius(10.0))
    }

    #[test]
    fn tree_lists_every_light_and_its_state() {
        let mut registry = LightRegistry::new();
        registry.add(DirLight::new(Vec3::ZERO, Vec3::ONE));
        registry.add(lamp());
        registry.point_mut()[0].set_color(Vec3::X);

        let tree = light_tree(&registry);
        assert!(tree.starts_with("Lights (2)"));
        assert_eq!(tree.lines().count(), 3);
        assert!(tree.contains("directional"));
        let point_line = tree.lines().find(|l| l.contains(" point ")).unwrap();
        assert!(point_line.contains("*dirty*"));
        assert!(point_line.contains("no shadow"));
    }

    #[test]
    fn lines_follow_registration_order_with_slots() {
        let mut registry = LightRegistry::new();
        registry.add(lamp());
        registry.add(SpotLight::new(
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::ONE,
            Cone {
                inner_deg: 10.0,
                outer_deg: 15.0,
            },
            Attenuation::for_radius(20.0),
        ));
        registry.add(DirLight::new(Vec3::ZERO, Vec3::ONE));
        registry.add(lamp());

        let tree = light_tree(&registry);
        let lines: Vec<&str> = tree.lines().skip(1).collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains(" point ") && lines[0].contains("slot 0"));
        assert!(lines[1].contains(" spot ") && lines[1].contains("slot 0"));
        assert!(lines[2].contains(" directional ") && lines[2].contains("slot 0"));
        assert!(lines[3].contains(" point ") && lines[3].contains("slot 1"));
        assert!(lines[3].contains("shadow[1]"));
    }
}

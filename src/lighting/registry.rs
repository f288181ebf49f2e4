//! Canonical storage for every light, partitioned by kind.
//!
//! A light's slot is its index in the collection of its kind. Slots are handed
//! out in registration order and never reused, so the storage-buffer offset of
//! a record (`slot * size_of::<Record>()`) stays valid for the whole session.

use hecs::Entity;

use super::directional::DirLight;
use super::light::{Light, LightKind, LightSource};
use super::point::PointLight;
use super::spot::SpotLight;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightHandle {
    pub kind: LightKind,
    pub slot: usize,
}

#[derive(Debug, Default)]
pub struct LightRegistry {
    directional: Vec<DirLight>,
    point: Vec<PointLight>,
    spot: Vec<SpotLight>,
    order: Vec<LightHandle>,
    plane_shadows: u32,
    cube_shadows: u32,
}

impl LightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a light to its kind's collection and to the registration order.
    /// Also hands out the light's sampler-array slot: directional and spot
    /// lights share the 2D range, point lights take the cube range.
    pub fn add(&mut self, light: impl Into<Light>) -> LightHandle {
        let handle = match light.into() {
            Light::Directional(mut light) => {
                light.assign_shadow_index(self.next_plane_index());
                self.directional.push(light);
                LightHandle {
                    kind: LightKind::Directional,
                    slot: self.directional.len() - 1,
                }
            }
            Light::Point(mut light) => {
                light.assign_shadow_index(self.cube_shadows);
                self.cube_shadows += 1;
                self.point.push(light);
                LightHandle {
                    kind: LightKind::Point,
                    slot: self.point.len() - 1,
                }
            }
            Light::Spot(mut light) => {
                light.assign_shadow_index(self.next_plane_index());
                self.spot.push(light);
                LightHandle {
                    kind: LightKind::Spot,
                    slot: self.spot.len() - 1,
                }
            }
        };
        self.order.push(handle);
        handle
    }

    fn next_plane_index(&mut self) -> u32 {
        let index = self.plane_shadows;
        self.plane_shadows += 1;
        index
    }

    /// Ties a light to the entity whose transform drives it.
    pub fn link_entity(&mut self, handle: LightHandle, entity: Entity) -> bool {
        match self.get_mut(handle) {
            Some(light) => {
                light.common_mut().entity = Some(entity);
                true
            }
            None => false,
        }
    }

    pub fn find_by_entity(&self, entity: Entity) -> Option<LightHandle> {
        self.iter()
            .find(|(_, light)| light.entity() == Some(entity))
            .map(|(handle, _)| handle)
    }

    pub fn get(&self, handle: LightHandle) -> Option<&dyn LightSource> {
        match handle.kind {
            LightKind::Directional => self.directional.get(handle.slot).map(|l| l as &dyn LightSource),
            LightKind::Point => self.point.get(handle.slot).map(|l| l as &dyn LightSource),
            LightKind::Spot => self.spot.get(handle.slot).map(|l| l as &dyn LightSource),
        }
    }

    pub fn get_mut(&mut self, handle: LightHandle) -> Option<&mut dyn LightSource> {
        match handle.kind {
            LightKind::Directional => self
                .directional
                .get_mut(handle.slot)
                .map(|l| l as &mut dyn LightSource),
            LightKind::Point => self.point.get_mut(handle.slot).map(|l| l as &mut dyn LightSource),
            LightKind::Spot => self.spot.get_mut(handle.slot).map(|l| l as &mut dyn LightSource),
        }
    }

    pub fn directional(&self) -> &[DirLight] {
        &self.directional
    }

    pub fn point(&self) -> &[PointLight] {
        &self.point
    }

    pub fn spot(&self) -> &[SpotLight] {
        &self.spot
    }

    // Slices, not Vecs: callers may edit lights but never reorder or resize.
    pub fn directional_mut(&mut self) -> &mut [DirLight] {
        &mut self.directional
    }

    pub fn point_mut(&mut self) -> &mut [PointLight] {
        &mut self.point
    }

    pub fn spot_mut(&mut self) -> &mut [SpotLight] {
        &mut self.spot
    }

    /// Handles in registration order.
    pub fn handles(&self) -> &[LightHandle] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (LightHandle, &dyn LightSource)> + '_ {
        self.order
            .iter()
            .filter_map(move |&handle| self.get(handle).map(|light| (handle, light)))
    }

    /// Visits every light mutably, in registration order.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(LightHandle, &mut dyn LightSource)) {
        for index in 0..self.order.len() {
            let handle = self.order[index];
            if let Some(light) = self.get_mut(handle) {
                f(handle, light);
            }
        }
    }

    pub fn count(&self, kind: LightKind) -> usize {
        match kind {
            LightKind::Directional => self.directional.len(),
            LightKind::Point => self.point.len(),
            LightKind::Spot => self.spot.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn dirty_count(&self) -> usize {
        self.iter().filter(|(_, light)| light.is_dirty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::data::{Attenuation, Cone};
    use glam::Vec3;

    fn point_at(x: f32) -> PointLight {
        PointLight::new(Vec3::new(x, 0.0, 0.0), Vec3::ONE, Attenuation::for_radius(10.0))
    }

    fn spot() -> SpotLight {
        SpotLight::new(
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::ONE,
            Cone {
                inner_deg: 10.0,
                outer_deg: 15.0,
            },
            Attenuation::for_radius(10.0),
        )
    }

    #[test]
    fn slots_follow_per_kind_registration_order() {
        let mut registry = LightRegistry::new();
        let a = registry.add(point_at(0.0));
        let sun = registry.add(DirLight::new(Vec3::ZERO, Vec3::ONE));
        let b = registry.add(point_at(1.0));
        let c = registry.add(point_at(2.0));

        assert_eq!((a.slot, b.slot, c.slot), (0, 1, 2));
        assert_eq!(sun, LightHandle { kind: LightKind::Directional, slot: 0 });
        assert_eq!(registry.handles(), &[a, sun, b, c]);
        assert_eq!(registry.point()[1].position(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(registry.count(LightKind::Point), 3);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn shadow_indices_split_plane_and_cube_ranges() {
        let mut registry = LightRegistry::new();
        let sun = registry.add(DirLight::new(Vec3::ZERO, Vec3::ONE));
        let lamp = registry.add(point_at(0.0));
        let torch = registry.add(spot());
        let lamp2 = registry.add(point_at(3.0));

        let index = |h| registry.get(h).and_then(|l| l.shadow_index());
        assert_eq!(index(sun), Some(0));
        assert_eq!(index(torch), Some(1));
        assert_eq!(index(lamp), Some(0));
        assert_eq!(index(lamp2), Some(1));
        assert_eq!(registry.spot()[0].data().shadow_index, 1);
        assert_eq!(registry.point()[1].data().shadow_index, 1);
    }

    #[test]
    fn unknown_handle_is_none() {
        let mut registry = LightRegistry::new();
        registry.add(point_at(0.0));
        let stale = LightHandle {
            kind: LightKind::Spot,
            slot: 0,
        };
        assert!(registry.get(stale).is_none());
        assert!(registry.get_mut(stale).is_none());
    }

    #[test]
    fn entities_resolve_to_their_light() {
        let mut world = hecs::World::new();
        let entity = world.spawn(());
        let other = world.spawn(());
        let mut registry = LightRegistry::new();
        registry.add(point_at(0.0));
        let torch = registry.add(spot());

        assert!(registry.link_entity(torch, entity));
        assert_eq!(registry.find_by_entity(entity), Some(torch));
        assert_eq!(registry.find_by_entity(other), None);
    }

    #[test]
    fn for_each_mut_visits_in_registration_order() {
        let mut registry = LightRegistry::new();
        registry.add(spot());
        registry.add(point_at(0.0));
        registry.add(DirLight::new(Vec3::ZERO, Vec3::ONE));

        let mut kinds = Vec::new();
        registry.for_each_mut(|_, light| {
            light.mark_dirty();
            kinds.push(light.kind());
        });
        assert_eq!(kinds, vec![LightKind::Spot, LightKind::Point, LightKind::Directional]);
        assert_eq!(registry.dirty_count(), 3);
    }
}

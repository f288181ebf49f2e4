//! Keeps one shader-storage buffer per light kind in step with the registry.
//!
//! A full upload replaces every buffer wholesale. Between full uploads only
//! dirty records are written back, each at `slot * size_of::<Record>()`.

use std::mem::size_of;

use bytemuck::Pod;

use super::directional::DirLight;
use super::light::{LightKind, LightSource};
use super::point::PointLight;
use super::registry::LightRegistry;
use super::spot::SpotLight;
use crate::config::LightBufferBindings;
use crate::error::LightingError;
use crate::gpu::{BufferId, SharedDevice};

/// A light whose GPU record is a single `Pod` struct.
pub trait LightRecord: LightSource {
    type Data: Pod;

    fn record(&self) -> &Self::Data;
}

impl LightRecord for DirLight {
    type Data = super::data::DirLightData;

    fn record(&self) -> &Self::Data {
        self.data()
    }
}

impl LightRecord for PointLight {
    type Data = super::data::PointLightData;

    fn record(&self) -> &Self::Data {
        self.data()
    }
}

impl LightRecord for SpotLight {
    type Data = super::data::SpotLightData;

    fn record(&self) -> &Self::Data {
        self.data()
    }
}

/// Storage buffer attached to a binding point, deleted on drop.
pub struct StorageBuffer {
    device: SharedDevice,
    id: BufferId,
    binding: u32,
    len: usize,
}

impl StorageBuffer {
    pub fn new(device: &SharedDevice, binding: u32, contents: &[u8]) -> Self {
        let id = device.create_storage_buffer(binding, contents);
        Self {
            device: device.clone(),
            id,
            binding,
            len: contents.len(),
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn binding(&self) -> u32 {
        self.binding
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn write(&self, offset: usize, contents: &[u8]) {
        self.device.write_storage_buffer(self.id, offset, contents);
    }
}

impl Drop for StorageBuffer {
    fn drop(&mut self) {
        self.device.delete_buffer(self.id);
    }
}

impl std::fmt::Debug for StorageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBuffer")
            .field("id", &self.id.0)
            .field("binding", &self.binding)
            .field("len", &self.len)
            .finish()
    }
}

/// What a sync pass sent to the GPU.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub full_upload: bool,
    pub records: usize,
    pub bytes: usize,
}

impl SyncStats {
    pub fn is_empty(&self) -> bool {
        !self.full_upload && self.records == 0
    }

    fn add(&mut self, records: usize, bytes: usize) {
        self.records += records;
        self.bytes += bytes;
    }
}

pub struct LightBufferSync {
    device: SharedDevice,
    bindings: LightBufferBindings,
    directional: Option<StorageBuffer>,
    point: Option<StorageBuffer>,
    spot: Option<StorageBuffer>,
}

impl std::fmt::Debug for LightBufferSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightBufferSync")
            .field("bindings", &self.bindings)
            .field("directional", &self.directional)
            .field("point", &self.point)
            .field("spot", &self.spot)
            .finish()
    }
}

impl LightBufferSync {
    pub fn new(device: SharedDevice, bindings: LightBufferBindings) -> Self {
        Self {
            device,
            bindings,
            directional: None,
            point: None,
            spot: None,
        }
    }

    pub fn bindings(&self) -> LightBufferBindings {
        self.bindings
    }

    pub fn buffer(&self, kind: LightKind) -> Option<&StorageBuffer> {
        match kind {
            LightKind::Directional => self.directional.as_ref(),
            LightKind::Point => self.point.as_ref(),
            LightKind::Spot => self.spot.as_ref(),
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.directional.is_some() && self.point.is_some() && self.spot.is_some()
    }

    /// Re-creates all three buffers from the registry and clears every dirty
    /// flag. Old buffers are released before the new ones are created.
    pub fn full_upload(&mut self, registry: &mut LightRegistry) -> SyncStats {
        self.directional = None;
        self.point = None;
        self.spot = None;

        let mut stats = SyncStats {
            full_upload: true,
            ..Default::default()
        };
        let (buffer, bytes) = upload_all(&self.device, self.bindings.directional, registry.directional_mut());
        stats.add(registry.count(LightKind::Directional), bytes);
        self.directional = Some(buffer);

        let (buffer, bytes) = upload_all(&self.device, self.bindings.point, registry.point_mut());
        stats.add(registry.count(LightKind::Point), bytes);
        self.point = Some(buffer);

        let (buffer, bytes) = upload_all(&self.device, self.bindings.spot, registry.spot_mut());
        stats.add(registry.count(LightKind::Spot), bytes);
        self.spot = Some(buffer);

        log::info!(
            "uploaded light buffers: {} directional, {} point, {} spot ({} bytes)",
            registry.count(LightKind::Directional),
            registry.count(LightKind::Point),
            registry.count(LightKind::Spot),
            stats.bytes
        );
        stats
    }

    /// Writes back only dirty records, in registration order within each kind,
    /// clearing each flag after its write.
    pub fn incremental_update(&mut self, registry: &mut LightRegistry) -> Result<SyncStats, LightingError> {
        let mut stats = SyncStats::default();
        let (records, bytes) = write_dirty(LightKind::Directional, self.directional.as_ref(), registry.directional_mut())?;
        stats.add(records, bytes);
        let (records, bytes) = write_dirty(LightKind::Point, self.point.as_ref(), registry.point_mut())?;
        stats.add(records, bytes);
        let (records, bytes) = write_dirty(LightKind::Spot, self.spot.as_ref(), registry.spot_mut())?;
        stats.add(records, bytes);
        Ok(stats)
    }
}

fn upload_all<L: LightRecord>(device: &SharedDevice, binding: u32, lights: &mut [L]) -> (StorageBuffer, usize) {
    let records: Vec<L::Data> = lights.iter().map(|light| *light.record()).collect();
    let bytes: &[u8] = bytemuck::cast_slice(&records);
    let buffer = StorageBuffer::new(device, binding, bytes);
    for light in lights.iter_mut() {
        light.common_mut().dirty = false;
    }
    (buffer, bytes.len())
}

fn write_dirty<L: LightRecord>(
    kind: LightKind,
    buffer: Option<&StorageBuffer>,
    lights: &mut [L],
) -> Result<(usize, usize), LightingError> {
    let buffer = buffer.ok_or(LightingError::BufferNotAllocated { kind })?;
    let size = size_of::<L::Data>();
    let capacity = buffer.len() / size;
    if lights.len() > capacity {
        return Err(LightingError::StaleBuffer {
            kind,
            records: lights.len(),
            capacity,
        });
    }

    let mut written = 0;
    for (slot, light) in lights.iter_mut().enumerate() {
        if !light.is_dirty() {
            continue;
        }
        buffer.write(slot * size, bytemuck::bytes_of(light.record()));
        light.common_mut().dirty = false;
        written += 1;
    }
    Ok((written, written * size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{BufferWrite, HeadlessDevice};
    use crate::lighting::data::Attenuation;
    use glam::Vec3;
    use std::rc::Rc;

    fn setup() -> (Rc<HeadlessDevice>, LightBufferSync) {
        let headless = Rc::new(HeadlessDevice::new());
        let device: SharedDevice = headless.clone();
        (headless, LightBufferSync::new(device, LightBufferBindings::default()))
    }

    fn three_point_lights() -> LightRegistry {
        let mut registry = LightRegistry::new();
        for x in [0.0, 5.0, 10.0] {
            registry.add(PointLight::new(
                Vec3::new(x, 1.0, 0.0),
                Vec3::ONE,
                Attenuation::for_radius(20.0),
            ));
        }
        registry
    }

    #[test]
    fn full_upload_then_single_record_update() {
        let (headless, mut sync) = setup();
        let mut registry = three_point_lights();
        let stats = sync.full_upload(&mut registry);
        assert_eq!(stats.records, 3);
        assert_eq!(stats.bytes, 3 * 64);

        let buffer = sync.buffer(LightKind::Point).unwrap().id();
        let before = headless.buffer_contents(buffer).unwrap();
        assert_eq!(before.len(), 3 * 64);

        registry.point_mut()[1].set_color(Vec3::new(0.0, 0.0, 1.0));
        let stats = sync.incremental_update(&mut registry).unwrap();
        assert_eq!(stats.records, 1);

        assert_eq!(
            headless.take_writes(),
            vec![BufferWrite {
                buffer,
                offset: 64,
                len: 64
            }]
        );
        let after = headless.buffer_contents(buffer).unwrap();
        assert_eq!(before[..64], after[..64]);
        assert_eq!(before[128..], after[128..]);
        assert_eq!(&after[64..128], bytemuck::bytes_of(registry.point()[1].data()));
    }

    #[test]
    fn dirty_flags_clear_only_for_synced_lights() {
        let (_headless, mut sync) = setup();
        let mut registry = three_point_lights();
        sync.full_upload(&mut registry);
        assert_eq!(registry.dirty_count(), 0);

        registry.point_mut()[2].set_position(Vec3::new(1.0, 1.0, 1.0));
        assert!(registry.point()[2].is_dirty());
        assert!(!registry.point()[0].is_dirty());

        sync.incremental_update(&mut registry).unwrap();
        assert_eq!(registry.dirty_count(), 0);
    }

    #[test]
    fn every_slot_writes_at_its_own_offset() {
        let (headless, mut sync) = setup();
        let mut registry = three_point_lights();
        sync.full_upload(&mut registry);
        for light in registry.point_mut() {
            light.set_color(Vec3::ONE * 0.5);
        }
        sync.incremental_update(&mut registry).unwrap();

        let offsets: Vec<_> = headless.take_writes().iter().map(|w| w.offset).collect();
        assert_eq!(offsets, vec![0, 64, 128]);
    }

    #[test]
    fn update_before_upload_is_an_error() {
        let (_headless, mut sync) = setup();
        let mut registry = three_point_lights();
        assert!(matches!(
            sync.incremental_update(&mut registry),
            Err(LightingError::BufferNotAllocated { .. })
        ));
    }

    #[test]
    fn lights_added_after_upload_need_a_full_upload() {
        let (_headless, mut sync) = setup();
        let mut registry = three_point_lights();
        sync.full_upload(&mut registry);
        registry.add(PointLight::new(Vec3::ZERO, Vec3::ONE, Attenuation::for_radius(5.0)));

        let err = sync.incremental_update(&mut registry).unwrap_err();
        assert!(matches!(
            err,
            LightingError::StaleBuffer {
                kind: LightKind::Point,
                records: 4,
                capacity: 3
            }
        ));
    }

    #[test]
    fn reupload_releases_previous_buffers() {
        let (headless, mut sync) = setup();
        let mut registry = three_point_lights();
        sync.full_upload(&mut registry);
        sync.full_upload(&mut registry);
        assert_eq!(headless.live_buffers(), 3);
        assert_eq!(
            headless.binding_contents(2).map(|b| b.len()),
            Some(3 * size_of::<crate::lighting::data::PointLightData>())
        );
        drop(sync);
        assert_eq!(headless.live_buffers(), 0);
    }
}

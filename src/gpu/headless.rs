use std::cell::RefCell;
use std::collections::HashMap;

use glam::{Mat4, Vec3};

use super::{BufferId, FramebufferId, FramebufferStatus, GpuDevice, TextureId, TextureTarget};
use crate::renderer::shader::ShaderUniforms;

/// `GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT`, reported when a framebuffer is
/// forced incomplete.
const INCOMPLETE_ATTACHMENT: u32 = 0x8CD6;

/// One partial write recorded by [`HeadlessDevice::write_storage_buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferWrite {
    pub buffer: BufferId,
    pub offset: usize,
    pub len: usize,
}

struct StorageBuffer {
    binding: u32,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    buffers: HashMap<u32, StorageBuffer>,
    textures: HashMap<u32, (TextureTarget, u32)>,
    framebuffers: HashMap<u32, TextureId>,
    texture_units: HashMap<u32, (TextureTarget, TextureId)>,
    writes: Vec<BufferWrite>,
    bound_framebuffer: Option<FramebufferId>,
    depth_clears: usize,
    force_incomplete: bool,
}

impl State {
    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// CPU-side device: keeps a byte-exact copy of every storage buffer and a
/// registry of live textures and framebuffers. Drives `--headless` runs and
/// the test suite.
#[derive(Default)]
pub struct HeadlessDevice {
    state: RefCell<State>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of the live buffer attached to `binding`, if any.
    pub fn binding_contents(&self, binding: u32) -> Option<Vec<u8>> {
        let state = self.state.borrow();
        state
            .buffers
            .values()
            .find(|b| b.binding == binding)
            .map(|b| b.bytes.clone())
    }

    pub fn buffer_contents(&self, buffer: BufferId) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer.0).map(|b| b.bytes.clone())
    }

    /// Drains the partial-write log.
    pub fn take_writes(&self) -> Vec<BufferWrite> {
        std::mem::take(&mut self.state.borrow_mut().writes)
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.state.borrow().framebuffers.len()
    }

    pub fn texture_size(&self, texture: TextureId) -> Option<(TextureTarget, u32)> {
        self.state.borrow().textures.get(&texture.0).copied()
    }

    pub fn texture_unit(&self, unit: u32) -> Option<(TextureTarget, TextureId)> {
        self.state.borrow().texture_units.get(&unit).copied()
    }

    pub fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.state.borrow().bound_framebuffer
    }

    pub fn depth_clears(&self) -> usize {
        self.state.borrow().depth_clears
    }

    /// Makes every subsequent completeness check fail.
    pub fn force_incomplete_framebuffers(&self, incomplete: bool) {
        self.state.borrow_mut().force_incomplete = incomplete;
    }
}

impl GpuDevice for HeadlessDevice {
    fn create_storage_buffer(&self, binding: u32, contents: &[u8]) -> BufferId {
        let mut state = self.state.borrow_mut();
        let id = state.alloc_id();
        // Rebinding a point detaches whatever buffer held it before.
        for buffer in state.buffers.values_mut() {
            if buffer.binding == binding {
                buffer.binding = u32::MAX;
            }
        }
        state.buffers.insert(
            id,
            StorageBuffer {
                binding,
                bytes: contents.to_vec(),
            },
        );
        BufferId(id)
    }

    fn write_storage_buffer(&self, buffer: BufferId, offset: usize, contents: &[u8]) {
        let mut state = self.state.borrow_mut();
        let Some(target) = state.buffers.get_mut(&buffer.0) else {
            log::error!("write to unknown buffer {}", buffer.0);
            return;
        };
        let end = offset + contents.len();
        if end > target.bytes.len() {
            log::error!(
                "write [{offset}, {end}) overruns buffer {} of {} bytes",
                buffer.0,
                target.bytes.len()
            );
            return;
        }
        target.bytes[offset..end].copy_from_slice(contents);
        state.writes.push(BufferWrite {
            buffer,
            offset,
            len: contents.len(),
        });
    }

    fn delete_buffer(&self, buffer: BufferId) {
        self.state.borrow_mut().buffers.remove(&buffer.0);
    }

    fn create_depth_texture(&self, target: TextureTarget, size: u32) -> TextureId {
        let mut state = self.state.borrow_mut();
        let id = state.alloc_id();
        state.textures.insert(id, (target, size));
        TextureId(id)
    }

    fn create_depth_framebuffer(&self, texture: TextureId, _target: TextureTarget) -> FramebufferId {
        let mut state = self.state.borrow_mut();
        let id = state.alloc_id();
        state.framebuffers.insert(id, texture);
        FramebufferId(id)
    }

    fn delete_texture(&self, texture: TextureId) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&texture.0);
        state.texture_units.retain(|_, (_, bound)| *bound != texture);
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        let mut state = self.state.borrow_mut();
        state.framebuffers.remove(&framebuffer.0);
        if state.bound_framebuffer == Some(framebuffer) {
            state.bound_framebuffer = None;
        }
    }

    fn bind_depth_target(&self, framebuffer: FramebufferId, _size: u32) -> FramebufferStatus {
        let mut state = self.state.borrow_mut();
        state.bound_framebuffer = Some(framebuffer);
        let attached = state
            .framebuffers
            .get(&framebuffer.0)
            .is_some_and(|texture| state.textures.contains_key(&texture.0));
        if attached && !state.force_incomplete {
            FramebufferStatus::Complete
        } else {
            FramebufferStatus::Incomplete(INCOMPLETE_ATTACHMENT)
        }
    }

    fn clear_depth(&self) {
        self.state.borrow_mut().depth_clears += 1;
    }

    fn bind_default_framebuffer(&self) {
        self.state.borrow_mut().bound_framebuffer = None;
    }

    fn bind_texture_unit(&self, unit: u32, target: TextureTarget, texture: TextureId) {
        self.state
            .borrow_mut()
            .texture_units
            .insert(unit, (target, texture));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Mat4(Mat4),
}

/// Shader stand-in that remembers the last value written to each uniform.
#[derive(Debug, Default)]
pub struct HeadlessShader {
    pub id: u32,
    pub uniforms: HashMap<String, UniformValue>,
    pub binds: usize,
}

impl HeadlessShader {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        match self.uniform(name)? {
            UniformValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn mat4(&self, name: &str) -> Option<Mat4> {
        match self.uniform(name)? {
            UniformValue::Mat4(m) => Some(m),
            _ => None,
        }
    }
}

impl ShaderUniforms for HeadlessShader {
    fn id(&self) -> u32 {
        self.id
    }

    fn bind(&mut self) {
        self.binds += 1;
    }

    fn set_mat4(&mut self, name: &str, mat: &Mat4) {
        self.uniforms.insert(name.to_string(), UniformValue::Mat4(*mat));
    }

    fn set_vec3(&mut self, name: &str, v: Vec3) {
        self.uniforms.insert(name.to_string(), UniformValue::Vec3(v));
    }

    fn set_float(&mut self, name: &str, val: f32) {
        self.uniforms.insert(name.to_string(), UniformValue::Float(val));
    }

    fn set_int(&mut self, name: &str, val: i32) {
        self.uniforms.insert(name.to_string(), UniformValue::Int(val));
    }
}

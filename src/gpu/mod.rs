//! Thin device layer the lighting core talks to. `GlDevice` issues the real
//! OpenGL calls; `HeadlessDevice` mirrors every resource on the CPU.

pub mod opengl;
pub mod headless;

use std::rc::Rc;

pub use opengl::GlDevice;
pub use headless::{BufferWrite, HeadlessDevice, HeadlessShader, UniformValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub u32);

/// Shape of a depth texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture2D,
    CubeMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    /// Carries the raw status code reported by the driver.
    Incomplete(u32),
}

impl FramebufferStatus {
    pub fn is_complete(self) -> bool {
        self == FramebufferStatus::Complete
    }
}

/// GPU operations needed by the lighting subsystem. All calls happen on the
/// thread that owns the context, in call order.
pub trait GpuDevice {
    /// Allocates a shader-storage buffer holding `contents` and attaches it to
    /// `binding`.
    fn create_storage_buffer(&self, binding: u32, contents: &[u8]) -> BufferId;

    /// Overwrites `contents.len()` bytes of `buffer` starting at `offset`.
    fn write_storage_buffer(&self, buffer: BufferId, offset: usize, contents: &[u8]);

    fn delete_buffer(&self, buffer: BufferId);

    /// Allocates a depth-only texture, `size`×`size` per face.
    fn create_depth_texture(&self, target: TextureTarget, size: u32) -> TextureId;

    /// Creates a framebuffer with `texture` as its sole (depth) attachment.
    fn create_depth_framebuffer(&self, texture: TextureId, target: TextureTarget) -> FramebufferId;

    fn delete_texture(&self, texture: TextureId);

    fn delete_framebuffer(&self, framebuffer: FramebufferId);

    /// Makes `framebuffer` the render target with a `size`×`size` viewport and
    /// reports its completeness.
    fn bind_depth_target(&self, framebuffer: FramebufferId, size: u32) -> FramebufferStatus;

    fn clear_depth(&self);

    fn bind_default_framebuffer(&self);

    fn bind_texture_unit(&self, unit: u32, target: TextureTarget, texture: TextureId);
}

pub type SharedDevice = Rc<dyn GpuDevice>;

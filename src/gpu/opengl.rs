use gl::types::*;

use super::{BufferId, FramebufferId, FramebufferStatus, GpuDevice, TextureId, TextureTarget};

/// OpenGL 4.3 implementation. Requires a current context on the calling thread.
pub struct GlDevice;

fn gl_target(target: TextureTarget) -> GLenum {
    match target {
        TextureTarget::Texture2D => gl::TEXTURE_2D,
        TextureTarget::CubeMap => gl::TEXTURE_CUBE_MAP,
    }
}

impl GpuDevice for GlDevice {
    fn create_storage_buffer(&self, binding: u32, contents: &[u8]) -> BufferId {
        let mut id = 0;
        unsafe {
            gl::GenBuffers(1, &mut id);
            gl::BindBuffer(gl::SHADER_STORAGE_BUFFER, id);
            gl::BufferData(
                gl::SHADER_STORAGE_BUFFER,
                contents.len() as GLsizeiptr,
                contents.as_ptr() as *const _,
                gl::DYNAMIC_DRAW,
            );
            gl::BindBufferBase(gl::SHADER_STORAGE_BUFFER, binding, id);
            gl::BindBuffer(gl::SHADER_STORAGE_BUFFER, 0);
        }
        BufferId(id)
    }

    fn write_storage_buffer(&self, buffer: BufferId, offset: usize, contents: &[u8]) {
        unsafe {
            gl::BindBuffer(gl::SHADER_STORAGE_BUFFER, buffer.0);
            gl::BufferSubData(
                gl::SHADER_STORAGE_BUFFER,
                offset as GLintptr,
                contents.len() as GLsizeiptr,
                contents.as_ptr() as *const _,
            );
            gl::BindBuffer(gl::SHADER_STORAGE_BUFFER, 0);
        }
    }

    fn delete_buffer(&self, buffer: BufferId) {
        unsafe {
            gl::DeleteBuffers(1, &buffer.0);
        }
    }

    fn create_depth_texture(&self, target: TextureTarget, size: u32) -> TextureId {
        let mut id = 0;
        let size = size as GLsizei;
        unsafe {
            gl::GenTextures(1, &mut id);
            match target {
                TextureTarget::Texture2D => {
                    gl::BindTexture(gl::TEXTURE_2D, id);
                    gl::TexImage2D(
                        gl::TEXTURE_2D,
                        0,
                        gl::DEPTH_COMPONENT as GLint,
                        size,
                        size,
                        0,
                        gl::DEPTH_COMPONENT,
                        gl::FLOAT,
                        std::ptr::null(),
                    );
                    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as GLint);
                    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as GLint);
                    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_BORDER as GLint);
                    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_BORDER as GLint);
                    // Samples outside the light frustum read as fully lit.
                    let border = [1.0f32, 1.0, 1.0, 1.0];
                    gl::TexParameterfv(gl::TEXTURE_2D, gl::TEXTURE_BORDER_COLOR, border.as_ptr());
                }
                TextureTarget::CubeMap => {
                    gl::BindTexture(gl::TEXTURE_CUBE_MAP, id);
                    for face in 0..6 {
                        gl::TexImage2D(
                            gl::TEXTURE_CUBE_MAP_POSITIVE_X + face,
                            0,
                            gl::DEPTH_COMPONENT as GLint,
                            size,
                            size,
                            0,
                            gl::DEPTH_COMPONENT,
                            gl::FLOAT,
                            std::ptr::null(),
                        );
                    }
                    gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_MAG_FILTER, gl::NEAREST as GLint);
                    gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_MIN_FILTER, gl::NEAREST as GLint);
                    gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
                    gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);
                    gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_WRAP_R, gl::CLAMP_TO_EDGE as GLint);
                }
            }
            gl::BindTexture(gl_target(target), 0);
        }
        TextureId(id)
    }

    fn create_depth_framebuffer(&self, texture: TextureId, target: TextureTarget) -> FramebufferId {
        let mut id = 0;
        unsafe {
            gl::GenFramebuffers(1, &mut id);
            gl::BindFramebuffer(gl::FRAMEBUFFER, id);
            match target {
                TextureTarget::Texture2D => gl::FramebufferTexture2D(
                    gl::FRAMEBUFFER,
                    gl::DEPTH_ATTACHMENT,
                    gl::TEXTURE_2D,
                    texture.0,
                    0,
                ),
                // Layered attachment: the geometry shader routes each face via gl_Layer.
                TextureTarget::CubeMap => {
                    gl::FramebufferTexture(gl::FRAMEBUFFER, gl::DEPTH_ATTACHMENT, texture.0, 0)
                }
            }
            gl::DrawBuffer(gl::NONE);
            gl::ReadBuffer(gl::NONE);
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        }
        FramebufferId(id)
    }

    fn delete_texture(&self, texture: TextureId) {
        unsafe {
            gl::DeleteTextures(1, &texture.0);
        }
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        unsafe {
            gl::DeleteFramebuffers(1, &framebuffer.0);
        }
    }

    fn bind_depth_target(&self, framebuffer: FramebufferId, size: u32) -> FramebufferStatus {
        unsafe {
            gl::Viewport(0, 0, size as GLsizei, size as GLsizei);
            gl::BindFramebuffer(gl::FRAMEBUFFER, framebuffer.0);
            let status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
            if status == gl::FRAMEBUFFER_COMPLETE {
                FramebufferStatus::Complete
            } else {
                FramebufferStatus::Incomplete(status)
            }
        }
    }

    fn clear_depth(&self) {
        unsafe {
            gl::Clear(gl::DEPTH_BUFFER_BIT);
        }
    }

    fn bind_default_framebuffer(&self) {
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        }
    }

    fn bind_texture_unit(&self, unit: u32, target: TextureTarget, texture: TextureId) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(gl_target(target), texture.0);
        }
    }
}

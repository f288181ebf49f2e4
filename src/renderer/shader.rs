use gl::types::*;
use glam::{Mat4, Vec3};
use std::collections::HashMap;
use std::ffi::CString;
use std::ptr;

use crate::error::ShaderError;

/// Uniform upload contract used by the lighting core. Implementors must be
/// bound (`bind`) before uniforms are set.
pub trait ShaderUniforms {
    /// Stable program handle.
    fn id(&self) -> u32;
    fn bind(&mut self);
    fn set_mat4(&mut self, name: &str, mat: &Mat4);
    fn set_vec3(&mut self, name: &str, v: Vec3);
    fn set_float(&mut self, name: &str, val: f32);
    fn set_int(&mut self, name: &str, val: i32);
}

pub struct ShaderProgram {
    pub id: GLuint,
    uniform_cache: HashMap<String, GLint>,
}

impl ShaderProgram {
    pub fn from_sources(vert_src: &str, frag_src: &str) -> Result<Self, ShaderError> {
        Self::link(&[(vert_src, gl::VERTEX_SHADER), (frag_src, gl::FRAGMENT_SHADER)])
    }

    /// Program with a geometry stage, used by the layered cube-map depth pass.
    pub fn with_geometry(vert_src: &str, geom_src: &str, frag_src: &str) -> Result<Self, ShaderError> {
        Self::link(&[
            (vert_src, gl::VERTEX_SHADER),
            (geom_src, gl::GEOMETRY_SHADER),
            (frag_src, gl::FRAGMENT_SHADER),
        ])
    }

    fn link(stages: &[(&str, GLenum)]) -> Result<Self, ShaderError> {
        unsafe {
            let mut shaders = Vec::with_capacity(stages.len());
            for &(src, kind) in stages {
                match compile_shader(src, kind) {
                    Ok(shader) => shaders.push(shader),
                    Err(err) => {
                        for shader in shaders {
                            gl::DeleteShader(shader);
                        }
                        return Err(err);
                    }
                }
            }

            let program = gl::CreateProgram();
            for &shader in &shaders {
                gl::AttachShader(program, shader);
            }
            gl::LinkProgram(program);
            for shader in shaders {
                gl::DeleteShader(shader);
            }

            let mut success = 0;
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut success);
            if success == 0 {
                let mut len = 0;
                gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
                let mut buf = vec![0u8; len.max(1) as usize];
                gl::GetProgramInfoLog(program, len, ptr::null_mut(), buf.as_mut_ptr() as *mut _);
                buf.pop(); // remove null terminator
                let msg = String::from_utf8_lossy(&buf).to_string();
                gl::DeleteProgram(program);
                return Err(ShaderError::Link(msg));
            }

            Ok(Self {
                id: program,
                uniform_cache: HashMap::new(),
            })
        }
    }

    fn get_uniform_location(&mut self, name: &str) -> GLint {
        if let Some(&loc) = self.uniform_cache.get(name) {
            return loc;
        }
        let loc = match CString::new(name) {
            Ok(cname) => unsafe { gl::GetUniformLocation(self.id, cname.as_ptr()) },
            Err(_) => {
                log::warn!("uniform name {name:?} contains a NUL byte");
                -1
            }
        };
        self.uniform_cache.insert(name.to_string(), loc);
        loc
    }
}

impl ShaderUniforms for ShaderProgram {
    fn id(&self) -> u32 {
        self.id
    }

    fn bind(&mut self) {
        unsafe {
            gl::UseProgram(self.id);
        }
    }

    fn set_mat4(&mut self, name: &str, mat: &Mat4) {
        let loc = self.get_uniform_location(name);
        unsafe {
            gl::UniformMatrix4fv(loc, 1, gl::FALSE, mat.to_cols_array().as_ptr());
        }
    }

    fn set_vec3(&mut self, name: &str, v: Vec3) {
        let loc = self.get_uniform_location(name);
        unsafe {
            gl::Uniform3f(loc, v.x, v.y, v.z);
        }
    }

    fn set_float(&mut self, name: &str, val: f32) {
        let loc = self.get_uniform_location(name);
        unsafe {
            gl::Uniform1f(loc, val);
        }
    }

    fn set_int(&mut self, name: &str, val: i32) {
        let loc = self.get_uniform_location(name);
        unsafe {
            gl::Uniform1i(loc, val);
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteProgram(self.id);
        }
    }
}

unsafe fn compile_shader(src: &str, shader_type: GLenum) -> Result<GLuint, ShaderError> {
    let c_src = CString::new(src)?;
    let shader = gl::CreateShader(shader_type);
    gl::ShaderSource(shader, 1, &c_src.as_ptr(), ptr::null());
    gl::CompileShader(shader);

    let mut success = 0;
    gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success);
    if success == 0 {
        let mut len = 0;
        gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
        let mut buf = vec![0u8; len.max(1) as usize];
        gl::GetShaderInfoLog(shader, len, ptr::null_mut(), buf.as_mut_ptr() as *mut _);
        buf.pop();
        let stage = match shader_type {
            gl::VERTEX_SHADER => "vertex",
            gl::GEOMETRY_SHADER => "geometry",
            _ => "fragment",
        };
        let log = String::from_utf8_lossy(&buf).to_string();
        gl::DeleteShader(shader);
        return Err(ShaderError::Compile { stage, log });
    }
    Ok(shader)
}

use bytemuck::cast_slice;
use gl::types::*;
use glam::Mat4;
use std::f32::consts::PI;
use std::mem;
use std::ptr;

/// Interleaved position + normal vertices (6 floats each) and triangle indices.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub const FLOATS_PER_VERTEX: usize = 6;

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / Self::FLOATS_PER_VERTEX
    }
}

/// First attribute location of the per-instance model matrix; a mat4 takes
/// four consecutive vec4 slots.
pub const INSTANCE_MATRIX_LOCATION: GLuint = 3;

pub struct Mesh {
    vao: GLuint,
    vbo: GLuint,
    ebo: GLuint,
    instance_vbo: Option<GLuint>,
    instance_count: i32,
    pub index_count: i32,
}

impl Mesh {
    pub fn upload(data: &MeshData) -> Self {
        upload_mesh(&data.vertices, &data.indices)
    }

    pub fn draw(&self) {
        unsafe {
            gl::BindVertexArray(self.vao);
            gl::DrawElements(gl::TRIANGLES, self.index_count, gl::UNSIGNED_INT, ptr::null());
            gl::BindVertexArray(0);
        }
    }

    /// Replaces the per-instance model matrices drawn by [`Mesh::draw_instanced`].
    pub fn set_instances(&mut self, models: &[Mat4]) {
        unsafe {
            gl::BindVertexArray(self.vao);
            let vbo = match self.instance_vbo {
                Some(vbo) => vbo,
                None => {
                    let mut vbo = 0;
                    gl::GenBuffers(1, &mut vbo);
                    gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
                    let stride = mem::size_of::<Mat4>() as GLsizei;
                    for column in 0..4 {
                        let location = INSTANCE_MATRIX_LOCATION + column;
                        gl::VertexAttribPointer(
                            location,
                            4,
                            gl::FLOAT,
                            gl::FALSE,
                            stride,
                            (column as usize * 4 * mem::size_of::<f32>()) as *const _,
                        );
                        gl::EnableVertexAttribArray(location);
                        gl::VertexAttribDivisor(location, 1);
                    }
                    self.instance_vbo = Some(vbo);
                    vbo
                }
            };
            let bytes: &[u8] = cast_slice(models);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                bytes.len() as GLsizeiptr,
                bytes.as_ptr() as *const _,
                gl::STATIC_DRAW,
            );
            gl::BindVertexArray(0);
        }
        self.instance_count = models.len() as i32;
    }

    pub fn instance_count(&self) -> i32 {
        self.instance_count
    }

    pub fn draw_instanced(&self) {
        if self.instance_count == 0 {
            return;
        }
        unsafe {
            gl::BindVertexArray(self.vao);
            gl::DrawElementsInstanced(
                gl::TRIANGLES,
                self.index_count,
                gl::UNSIGNED_INT,
                ptr::null(),
                self.instance_count,
            );
            gl::BindVertexArray(0);
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteVertexArrays(1, &self.vao);
            gl::DeleteBuffers(1, &self.vbo);
            gl::DeleteBuffers(1, &self.ebo);
            if let Some(vbo) = self.instance_vbo {
                gl::DeleteBuffers(1, &vbo);
            }
        }
    }
}

fn upload_mesh(vertices: &[f32], indices: &[u32]) -> Mesh {
    let mut vao = 0;
    let mut vbo = 0;
    let mut ebo = 0;

    unsafe {
        gl::GenVertexArrays(1, &mut vao);
        gl::GenBuffers(1, &mut vbo);
        gl::GenBuffers(1, &mut ebo);

        gl::BindVertexArray(vao);

        gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
        gl::BufferData(
            gl::ARRAY_BUFFER,
            (vertices.len() * mem::size_of::<f32>()) as GLsizeiptr,
            vertices.as_ptr() as *const _,
            gl::STATIC_DRAW,
        );

        gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, ebo);
        gl::BufferData(
            gl::ELEMENT_ARRAY_BUFFER,
            (indices.len() * mem::size_of::<u32>()) as GLsizeiptr,
            indices.as_ptr() as *const _,
            gl::STATIC_DRAW,
        );

        let stride = (MeshData::FLOATS_PER_VERTEX * mem::size_of::<f32>()) as GLsizei;

        // position attribute (location 0)
        gl::VertexAttribPointer(0, 3, gl::FLOAT, gl::FALSE, stride, ptr::null());
        gl::EnableVertexAttribArray(0);

        // normal attribute (location 1)
        gl::VertexAttribPointer(
            1,
            3,
            gl::FLOAT,
            gl::FALSE,
            stride,
            (3 * mem::size_of::<f32>()) as *const _,
        );
        gl::EnableVertexAttribArray(1);

        gl::BindVertexArray(0);
    }

    Mesh {
        vao,
        vbo,
        ebo,
        instance_vbo: None,
        instance_count: 0,
        index_count: indices.len() as i32,
    }
}

pub fn sphere_data(radius: f32, stacks: u32, sectors: u32) -> MeshData {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for i in 0..=stacks {
        let stack_angle = PI / 2.0 - (i as f32) * PI / (stacks as f32);
        let xy = radius * stack_angle.cos();
        let z = radius * stack_angle.sin();

        for j in 0..=sectors {
            let sector_angle = 2.0 * PI * (j as f32) / (sectors as f32);
            let x = xy * sector_angle.cos();
            let y = xy * sector_angle.sin();

            // position
            vertices.extend_from_slice(&[x, z, y]);

            // normal (unit sphere)
            let nx = stack_angle.cos() * sector_angle.cos();
            let ny = stack_angle.sin();
            let nz = stack_angle.cos() * sector_angle.sin();
            vertices.extend_from_slice(&[nx, ny, nz]);
        }
    }

    for i in 0..stacks {
        for j in 0..sectors {
            let first = i * (sectors + 1) + j;
            let second = first + sectors + 1;

            indices.extend_from_slice(&[first, second, first + 1]);
            indices.extend_from_slice(&[first + 1, second, second + 1]);
        }
    }

    MeshData { vertices, indices }
}

pub fn create_sphere(radius: f32, stacks: u32, sectors: u32) -> Mesh {
    Mesh::upload(&sphere_data(radius, stacks, sectors))
}

pub fn box_data(width: f32, height: f32, depth: f32) -> MeshData {
    let hw = width * 0.5;
    let hh = height * 0.5;
    let hd = depth * 0.5;

    #[rustfmt::skip]
    let vertices: Vec<f32> = vec![
        // Front face (+Z)
        -hw, -hh,  hd,  0.0,  0.0,  1.0,
         hw, -hh,  hd,  0.0,  0.0,  1.0,
         hw,  hh,  hd,  0.0,  0.0,  1.0,
        -hw,  hh,  hd,  0.0,  0.0,  1.0,
        // Back face (-Z)
         hw, -hh, -hd,  0.0,  0.0, -1.0,
        -hw, -hh, -hd,  0.0,  0.0, -1.0,
        -hw,  hh, -hd,  0.0,  0.0, -1.0,
         hw,  hh, -hd,  0.0,  0.0, -1.0,
        // Top face (+Y)
        -hw,  hh,  hd,  0.0,  1.0,  0.0,
         hw,  hh,  hd,  0.0,  1.0,  0.0,
         hw,  hh, -hd,  0.0,  1.0,  0.0,
        -hw,  hh, -hd,  0.0,  1.0,  0.0,
        // Bottom face (-Y)
        -hw, -hh, -hd,  0.0, -1.0,  0.0,
         hw, -hh, -hd,  0.0, -1.0,  0.0,
         hw, -hh,  hd,  0.0, -1.0,  0.0,
        -hw, -hh,  hd,  0.0, -1.0,  0.0,
        // Right face (+X)
         hw, -hh,  hd,  1.0,  0.0,  0.0,
         hw, -hh, -hd,  1.0,  0.0,  0.0,
         hw,  hh, -hd,  1.0,  0.0,  0.0,
         hw,  hh,  hd,  1.0,  0.0,  0.0,
        // Left face (-X)
        -hw, -hh, -hd, -1.0,  0.0,  0.0,
        -hw, -hh,  hd, -1.0,  0.0,  0.0,
        -hw,  hh,  hd, -1.0,  0.0,  0.0,
        -hw,  hh, -hd, -1.0,  0.0,  0.0,
    ];

    let mut indices = Vec::new();
    for face in 0..6u32 {
        let base = face * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData { vertices, indices }
}

pub fn create_box(width: f32, height: f32, depth: f32) -> Mesh {
    Mesh::upload(&box_data(width, height, depth))
}

/// Flat square in the XZ plane facing +Y, centred on the origin.
pub fn plane_data(size: f32) -> MeshData {
    let h = size * 0.5;
    #[rustfmt::skip]
    let vertices = vec![
        -h, 0.0,  h,  0.0, 1.0, 0.0,
         h, 0.0,  h,  0.0, 1.0, 0.0,
         h, 0.0, -h,  0.0, 1.0, 0.0,
        -h, 0.0, -h,  0.0, 1.0, 0.0,
    ];
    MeshData {
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

pub fn create_plane(size: f32) -> Mesh {
    Mesh::upload(&plane_data(size))
}

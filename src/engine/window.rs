use anyhow::{anyhow, Context, Result};
use sdl2::video::{GLContext, GLProfile, Window};
use sdl2::Sdl;

/// SDL2 window with a current OpenGL 4.3 core context. Storage buffers and
/// layered cube-map rendering need 4.3.
pub struct GameWindow {
    _gl_context: GLContext,
    window: Window,
}

impl GameWindow {
    pub fn new(sdl: &Sdl, title: &str, width: u32, height: u32) -> Result<Self> {
        let video = sdl.video().map_err(|e| anyhow!(e)).context("failed to init SDL2 video")?;

        let gl_attr = video.gl_attr();
        gl_attr.set_context_profile(GLProfile::Core);
        gl_attr.set_context_version(4, 3);
        gl_attr.set_depth_size(24);

        let window = video
            .window(title, width, height)
            .opengl()
            .position_centered()
            .build()
            .context("failed to create window")?;

        let gl_context = window
            .gl_create_context()
            .map_err(|e| anyhow!(e))
            .context("failed to create GL 4.3 context")?;

        gl::load_with(|s| video.gl_get_proc_address(s) as *const _);
        log::info!("created {width}x{height} window with a GL 4.3 core context");

        Ok(Self {
            _gl_context: gl_context,
            window,
        })
    }

    pub fn swap(&self) {
        self.window.gl_swap_window();
    }

    pub fn size(&self) -> (u32, u32) {
        self.window.size()
    }

    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = self.window.size();
        w as f32 / h.max(1) as f32
    }
}

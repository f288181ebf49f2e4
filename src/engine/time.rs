use std::time::Instant;

pub struct FrameTimer {
    last: Instant,
    pub dt: f32,
    pub elapsed: f32,
    pub frames: u64,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            dt: 0.0,
            elapsed: 0.0,
            frames: 0,
        }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        // Clamp so a stall (window drag, breakpoint) doesn't teleport animated lights.
        self.dt = now.duration_since(self.last).as_secs_f32().min(0.1);
        self.last = now;
        self.elapsed += self.dt;
        self.frames += 1;
    }
}

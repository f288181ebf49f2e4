use sdl2::event::Event;
use sdl2::keyboard::Scancode;
use sdl2::EventPump;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyPressed(Scancode),
}

pub struct InputState {
    pub keys: HashSet<Scancode>,
    /// Key presses of the current frame, repeats excluded.
    pub events: Vec<InputEvent>,
    pub mouse_dx: f32,
    pub mouse_dy: f32,
    pub quit: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys: HashSet::new(),
            events: Vec::new(),
            mouse_dx: 0.0,
            mouse_dy: 0.0,
            quit: false,
        }
    }

    pub fn update(&mut self, event_pump: &mut EventPump) {
        self.mouse_dx = 0.0;
        self.mouse_dy = 0.0;
        self.events.clear();

        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => self.quit = true,
                Event::KeyDown {
                    scancode: Some(Scancode::Escape),
                    ..
                } => self.quit = true,
                Event::KeyDown {
                    scancode: Some(sc),
                    repeat,
                    ..
                } => {
                    self.keys.insert(sc);
                    if !repeat {
                        self.events.push(InputEvent::KeyPressed(sc));
                    }
                }
                Event::KeyUp {
                    scancode: Some(sc), ..
                } => {
                    self.keys.remove(&sc);
                }
                Event::MouseMotion { xrel, yrel, .. } => {
                    self.mouse_dx += xrel as f32;
                    self.mouse_dy += yrel as f32;
                }
                _ => {}
            }
        }
    }

    pub fn is_key_held(&self, sc: Scancode) -> bool {
        self.keys.contains(&sc)
    }

    pub fn was_pressed(&self, sc: Scancode) -> bool {
        self.events.contains(&InputEvent::KeyPressed(sc))
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }
}

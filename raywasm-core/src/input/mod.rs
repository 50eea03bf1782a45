//! Input state tracking.
//!
//! Responsibilities:
//! - Keep a previous-frame and a current-frame snapshot of held keys and mouse buttons so
//!   the guest can ask both "held down" (level) and "pressed this frame" (edge) questions.
//! - Keep the raw mouse position and the wheel movement of the current frame.
//! - Translate physical events into guest codes ([`keymap`]) at the listener boundary.
//!
//! Event listeners record into the current snapshot at any time. The scheduler calls
//! [`InputTracker::end_frame`] once after each per-frame callback; that rollover is the
//! only point where the previous snapshot changes.

pub mod keymap;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::memory::Vector2;

/// Tracker shared between listener handles and the session.
pub type SharedInput = Arc<Mutex<InputTracker>>;

/// Lock a shared tracker. A panic while holding the lock cannot leave the sets torn,
/// so a poisoned lock is still usable.
pub fn lock(input: &Mutex<InputTracker>) -> MutexGuard<'_, InputTracker> {
    input.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default, Clone)]
pub struct InputTracker {
    prev_keys: HashSet<i32>,
    keys: HashSet<i32>,
    prev_buttons: HashSet<i32>,
    buttons: HashSet<i32>,
    prev_mouse: Vector2,
    mouse: Vector2,
    wheel: f32,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedInput {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn record_key_down(&mut self, key: i32) {
        self.keys.insert(key);
    }

    pub fn record_key_up(&mut self, key: i32) {
        self.keys.remove(&key);
    }

    pub fn record_mouse_down(&mut self, button: i32) {
        self.buttons.insert(button);
    }

    pub fn record_mouse_up(&mut self, button: i32) {
        self.buttons.remove(&button);
    }

    /// Record the pointer in raw host coordinates.
    pub fn record_mouse_move(&mut self, x: f32, y: f32) {
        self.mouse = Vector2 { x, y };
    }

    /// Record a wheel movement; `delta` is already the guest-facing sign.
    pub fn record_wheel(&mut self, delta: f32) {
        self.wheel = delta;
    }

    pub fn is_key_down(&self, key: i32) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_key_up(&self, key: i32) -> bool {
        !self.keys.contains(&key)
    }

    pub fn is_key_pressed(&self, key: i32) -> bool {
        !self.prev_keys.contains(&key) && self.keys.contains(&key)
    }

    pub fn is_key_released(&self, key: i32) -> bool {
        self.prev_keys.contains(&key) && !self.keys.contains(&key)
    }

    pub fn is_mouse_down(&self, button: i32) -> bool {
        self.buttons.contains(&button)
    }

    pub fn is_mouse_up(&self, button: i32) -> bool {
        !self.buttons.contains(&button)
    }

    pub fn is_mouse_pressed(&self, button: i32) -> bool {
        !self.prev_buttons.contains(&button) && self.buttons.contains(&button)
    }

    pub fn is_mouse_released(&self, button: i32) -> bool {
        self.prev_buttons.contains(&button) && !self.buttons.contains(&button)
    }

    /// Pointer position relative to `origin` (the surface's top-left in host coordinates).
    pub fn mouse_position(&self, origin: Vector2) -> Vector2 {
        Vector2 {
            x: self.mouse.x - origin.x,
            y: self.mouse.y - origin.y,
        }
    }

    /// Movement since the last end of frame. Both ends are taken relative to `origin`,
    /// which cancels out unless the surface itself moved.
    pub fn mouse_delta(&self, origin: Vector2) -> Vector2 {
        let cur = self.mouse_position(origin);
        let prev = Vector2 {
            x: self.prev_mouse.x - origin.x,
            y: self.prev_mouse.y - origin.y,
        };
        Vector2 {
            x: cur.x - prev.x,
            y: cur.y - prev.y,
        }
    }

    pub fn wheel_move(&self) -> f32 {
        self.wheel
    }

    /// Promote the current snapshot to previous and reset per-frame scalars.
    pub fn end_frame(&mut self) {
        self.prev_keys.clone_from(&self.keys);
        self.prev_buttons.clone_from(&self.buttons);
        self.prev_mouse = self.mouse;
        self.wheel = 0.0;
    }
}

/// A physical input event, before key mapping.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// DOM-style key code, e.g. `"KeyA"`, `"Space"`, `"ArrowLeft"`.
    KeyDown(String),
    KeyUp(String),
    /// DOM-style button index: 0 left, 1 middle, 2 right.
    MouseDown(u16),
    MouseUp(u16),
    /// Pointer position in host (viewport) coordinates.
    MouseMove { x: f32, y: f32 },
    /// Raw vertical scroll amount; positive scrolls down.
    Wheel { delta_y: f32 },
}

/// The listener side of a session's input.
///
/// Holds only a weak reference: once the session is torn down the handle is detached
/// and further events are ignored.
#[derive(Clone, Debug)]
pub struct InputHandle {
    target: Weak<Mutex<InputTracker>>,
}

impl InputHandle {
    pub fn attach(input: &SharedInput) -> Self {
        Self {
            target: Arc::downgrade(input),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Record one event. Returns `false` when the handle is detached.
    /// Unmapped keys and buttons are dropped silently.
    pub fn dispatch(&self, event: InputEvent) -> bool {
        let Some(target) = self.target.upgrade() else {
            return false;
        };
        let mut input = lock(&target);
        match event {
            InputEvent::KeyDown(code) => {
                if let Some(key) = keymap::key(&code) {
                    input.record_key_down(key);
                }
            }
            InputEvent::KeyUp(code) => {
                if let Some(key) = keymap::key(&code) {
                    input.record_key_up(key);
                }
            }
            InputEvent::MouseDown(button) => {
                if let Some(button) = keymap::mouse_button(button) {
                    input.record_mouse_down(button);
                }
            }
            InputEvent::MouseUp(button) => {
                if let Some(button) = keymap::mouse_button(button) {
                    input.record_mouse_up(button);
                }
            }
            InputEvent::MouseMove { x, y } => input.record_mouse_move(x, y),
            InputEvent::Wheel { delta_y } => input.record_wheel(wheel_sign(delta_y)),
        }
        true
    }
}

/// Scrolling down (positive raw delta) reads as -1 to the guest; no movement reads 0.
fn wheel_sign(delta_y: f32) -> f32 {
    if delta_y > 0.0 {
        -1.0
    } else if delta_y < 0.0 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::mouse_buttons;

    const SPACE: i32 = 32;

    const ORIGIN: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    #[test]
    fn key_press_is_an_edge_and_down_is_a_level() {
        let mut input = InputTracker::new();
        input.record_key_down(SPACE);
        assert!(input.is_key_pressed(SPACE));
        assert!(input.is_key_down(SPACE));

        input.end_frame();
        assert!(!input.is_key_pressed(SPACE));
        assert!(input.is_key_down(SPACE));

        input.record_key_up(SPACE);
        assert!(input.is_key_released(SPACE));
        input.end_frame();
        assert!(!input.is_key_down(SPACE));
        assert!(input.is_key_up(SPACE));
        assert!(!input.is_key_released(SPACE));
    }

    #[test]
    fn every_key_code_sees_exactly_one_pressed_frame() {
        for key in [32, 65, 90, 256, 340, 348] {
            let mut input = InputTracker::new();
            input.record_key_down(key);
            let mut pressed_frames = 0;
            for _ in 0..4 {
                if input.is_key_pressed(key) {
                    pressed_frames += 1;
                }
                input.end_frame();
            }
            assert_eq!(pressed_frames, 1, "key {key}");
            assert!(input.is_key_down(key));
        }
    }

    #[test]
    fn previous_snapshot_is_a_deep_copy() {
        let mut input = InputTracker::new();
        input.record_mouse_down(mouse_buttons::LEFT);
        input.end_frame();
        input.record_mouse_up(mouse_buttons::LEFT);
        input.record_mouse_down(mouse_buttons::RIGHT);

        assert!(input.is_mouse_released(mouse_buttons::LEFT));
        assert!(input.is_mouse_pressed(mouse_buttons::RIGHT));
        assert!(!input.is_mouse_pressed(mouse_buttons::LEFT));
    }

    #[test]
    fn mouse_delta_spans_the_whole_frame() {
        let mut input = InputTracker::new();
        input.record_mouse_move(10.0, 10.0);
        input.end_frame();

        input.record_mouse_move(12.0, 15.0);
        input.record_mouse_move(20.0, 30.0);
        assert_eq!(input.mouse_position(ORIGIN), Vector2 { x: 20.0, y: 30.0 });
        assert_eq!(input.mouse_delta(ORIGIN), Vector2 { x: 10.0, y: 20.0 });

        input.end_frame();
        assert_eq!(input.mouse_delta(ORIGIN), Vector2::default());
    }

    #[test]
    fn mouse_position_is_relative_to_the_surface_origin() {
        let mut input = InputTracker::new();
        input.record_mouse_move(110.0, 60.0);
        let origin = Vector2 { x: 100.0, y: 50.0 };
        assert_eq!(input.mouse_position(origin), Vector2 { x: 10.0, y: 10.0 });
    }

    #[test]
    fn wheel_resets_to_zero_after_end_frame() {
        let mut input = InputTracker::new();
        input.record_wheel(1.0);
        assert_eq!(input.wheel_move(), 1.0);
        input.end_frame();
        assert_eq!(input.wheel_move(), 0.0);
    }

    #[test]
    fn handle_maps_physical_events_and_drops_unknown_ones() {
        let shared = InputTracker::shared();
        let handle = InputHandle::attach(&shared);

        assert!(handle.dispatch(InputEvent::KeyDown("KeyW".into())));
        assert!(handle.dispatch(InputEvent::KeyDown("IntlRo".into())));
        assert!(handle.dispatch(InputEvent::MouseDown(2)));
        assert!(handle.dispatch(InputEvent::Wheel { delta_y: 120.0 }));

        let input = lock(&shared);
        assert!(input.is_key_down(87));
        assert!(input.is_mouse_down(mouse_buttons::RIGHT));
        assert_eq!(input.wheel_move(), -1.0);
    }

    #[test]
    fn zero_wheel_delta_records_zero() {
        assert_eq!(wheel_sign(0.0), 0.0);
        assert_eq!(wheel_sign(-3.0), 1.0);
    }

    #[test]
    fn handle_detaches_when_the_session_drops_its_tracker() {
        let shared = InputTracker::shared();
        let handle = InputHandle::attach(&shared);
        drop(shared);
        assert!(!handle.is_attached());
        assert!(!handle.dispatch(InputEvent::KeyDown("Space".into())));
    }
}

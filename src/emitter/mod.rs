//! Synthetic input emission.
//!
//! Each method is one atomic unit: a click is a down immediately followed by
//! an up, with nothing interleaved. Emission is best effort and reports
//! nothing back, like real hardware.

#[cfg(windows)]
mod sendinput;

use std::sync::Mutex;

#[cfg(windows)]
pub use sendinput::SendInputEmitter;

use crate::state::types::{DesktopBounds, MouseButton, Point, ScrollAxis};

pub trait InputEmitter: Send + Sync {
    fn key_down(&self, vk: u32);
    fn key_up(&self, vk: u32);
    /// Full press and release of `vk`.
    fn key_tap(&self, vk: u32);
    fn button_down(&self, button: MouseButton);
    fn button_up(&self, button: MouseButton);
    fn click(&self, button: MouseButton);
    /// Places the cursor at an absolute position inside the virtual desktop.
    fn move_to(&self, target: Point);
    /// Positive deltas scroll up (vertical) or right (horizontal).
    fn scroll(&self, axis: ScrollAxis, delta: i32);
    fn cursor_position(&self) -> Option<Point>;
    fn desktop_bounds(&self) -> DesktopBounds;
}

/// One emitted action as seen by [`RecordingEmitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emitted {
    KeyDown(u32),
    KeyUp(u32),
    KeyTap(u32),
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    Click(MouseButton),
    MoveTo(Point),
    Scroll(ScrollAxis, i32),
}

/// Emitter that records actions and simulates a cursor instead of
/// touching the OS.
pub struct RecordingEmitter {
    events: Mutex<Vec<Emitted>>,
    cursor: Mutex<Point>,
    bounds: DesktopBounds,
}

impl RecordingEmitter {
    pub fn new(cursor: Point, bounds: DesktopBounds) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            cursor: Mutex::new(cursor),
            bounds,
        }
    }

    fn record(&self, event: Emitted) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    pub fn events(&self) -> Vec<Emitted> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Returns and clears everything recorded so far.
    pub fn take(&self) -> Vec<Emitted> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn cursor(&self) -> Point {
        *self.cursor.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RecordingEmitter {
    fn default() -> Self {
        Self::new(Point::new(960, 540), DesktopBounds::new(0, 0, 1920, 1080))
    }
}

impl InputEmitter for RecordingEmitter {
    fn key_down(&self, vk: u32) {
        self.record(Emitted::KeyDown(vk));
    }

    fn key_up(&self, vk: u32) {
        self.record(Emitted::KeyUp(vk));
    }

    fn key_tap(&self, vk: u32) {
        self.record(Emitted::KeyTap(vk));
    }

    fn button_down(&self, button: MouseButton) {
        self.record(Emitted::ButtonDown(button));
    }

    fn button_up(&self, button: MouseButton) {
        self.record(Emitted::ButtonUp(button));
    }

    fn click(&self, button: MouseButton) {
        self.record(Emitted::Click(button));
    }

    fn move_to(&self, target: Point) {
        let target = self.bounds.clamp(target);
        *self.cursor.lock().unwrap_or_else(|e| e.into_inner()) = target;
        self.record(Emitted::MoveTo(target));
    }

    fn scroll(&self, axis: ScrollAxis, delta: i32) {
        self.record(Emitted::Scroll(axis, delta));
    }

    fn cursor_position(&self) -> Option<Point> {
        Some(self.cursor())
    }

    fn desktop_bounds(&self) -> DesktopBounds {
        self.bounds
    }
}

//! Runtime tunables and the default key layout.

use std::time::Duration;

use crate::state::types::{Direction, WHEEL_DELTA};
use crate::state::Binding;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Translator polling period.
    pub tick: Duration,
    /// Minimum spacing between wheel notches while a scroll key is held.
    pub scroll_interval: Duration,
    pub wheel_delta: i32,
    /// Pixels per tick at startup.
    pub initial_step: i32,
    pub min_step: i32,
    pub max_step: i32,
    /// Speed multiplier while Shift is held.
    pub precision_factor: f32,
    pub start_active: bool,
    /// How long shutdown waits for the translator before releasing anyway.
    pub shutdown_timeout: Duration,
    pub layout: Vec<KeyBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: String,
    pub binding: Binding,
}

impl KeyBinding {
    pub fn new(key: &str, binding: Binding) -> Self {
        Self {
            key: key.to_string(),
            binding,
        }
    }
}

fn default_layout() -> Vec<KeyBinding> {
    use Binding::*;

    [
        ("W", Move(Direction::Up)),
        ("A", Move(Direction::Left)),
        ("S", Move(Direction::Down)),
        ("D", Move(Direction::Right)),
        ("UP", Move(Direction::Up)),
        ("LEFT", Move(Direction::Left)),
        ("DOWN", Move(Direction::Down)),
        ("RIGHT", Move(Direction::Right)),
        ("LSHIFT", Shift),
        ("RSHIFT", Shift),
        ("0", Toggle),
        ("NUMPAD0", Toggle),
        ("ESC", Quit),
        ("PLUS", SpeedUp),
        ("ADD", SpeedUp),
        ("MINUS", SpeedDown),
        ("SUBTRACT", SpeedDown),
        ("1", Scroll(Direction::Up)),
        ("NUMPAD1", Scroll(Direction::Up)),
        ("2", Scroll(Direction::Down)),
        ("NUMPAD2", Scroll(Direction::Down)),
        ("3", Scroll(Direction::Left)),
        ("NUMPAD3", Scroll(Direction::Left)),
        ("4", Scroll(Direction::Right)),
        ("NUMPAD4", Scroll(Direction::Right)),
        ("5", VolumeStep(-10)),
        ("NUMPAD5", VolumeStep(-10)),
        ("6", VolumeStep(10)),
        ("NUMPAD6", VolumeStep(10)),
        ("CAPSLOCK", LockRightClick),
        ("F1", MiddleClick),
        ("TAB", Drag),
        ("F9", VolumePreset(25)),
        ("F10", VolumePreset(100)),
        ("ENTER", Confirm),
    ]
    .into_iter()
    .map(|(key, binding)| KeyBinding::new(key, binding))
    .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(10),
            scroll_interval: Duration::from_millis(50),
            wheel_delta: WHEEL_DELTA,
            initial_step: 3,
            min_step: 1,
            max_step: 50,
            precision_factor: 0.25,
            start_active: true,
            shutdown_timeout: Duration::from_secs(1),
            layout: default_layout(),
        }
    }
}

impl AppConfig {
    /// Checks that the tunables are mutually consistent.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tick.is_zero() {
            anyhow::bail!("Tick must be greater than zero");
        }
        if self.min_step < 1 || self.min_step > self.max_step {
            anyhow::bail!(
                "Step bounds must satisfy 1 <= min <= max (got {}..={})",
                self.min_step,
                self.max_step
            );
        }
        if !(self.min_step..=self.max_step).contains(&self.initial_step) {
            anyhow::bail!(
                "Initial step {} is outside {}..={}",
                self.initial_step,
                self.min_step,
                self.max_step
            );
        }
        if !(self.precision_factor > 0.0 && self.precision_factor <= 1.0) {
            anyhow::bail!(
                "Precision factor must be in (0, 1], got {}",
                self.precision_factor
            );
        }
        if self.wheel_delta == 0 {
            anyhow::bail!("Wheel delta must be non-zero");
        }
        for entry in &self.layout {
            if let Binding::VolumePreset(percent) = entry.binding
                && percent > 100
            {
                anyhow::bail!("Volume preset on {} exceeds 100%", entry.key);
            }
        }
        if !self.layout.iter().any(|e| e.binding == Binding::Toggle) {
            anyhow::bail!("Layout has no toggle key");
        }
        Ok(())
    }

    /// Cursor speed in pixels per second for a given step.
    pub fn pixels_per_second(&self, step: i32) -> i64 {
        let tick_ms = self.tick.as_millis().max(1) as i64;
        i64::from(step) * 1000 / tick_ms
    }
}

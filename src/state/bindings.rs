//! Binding table: which physical key drives which action.

use std::fmt;

use crate::config::AppConfig;

use super::keys::KeySet;
use super::parsing::{key_name_to_vk, vk_to_key_name};
use super::types::Direction;

/// Action bound to a physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// Continuous cursor movement; several keys may alias one direction.
    Move(Direction),
    /// Left click on press, precision speed while held, drag qualifier.
    Shift,
    /// Flips the active flag.
    Toggle,
    /// Stops the program.
    Quit,
    SpeedUp,
    SpeedDown,
    /// Wheel scrolling; `Left`/`Right` use the horizontal wheel.
    Scroll(Direction),
    /// Relative master volume change in percent, applied by the worker.
    VolumeStep(i8),
    /// Absolute master volume in percent, applied straight from the hook.
    VolumePreset(u8),
    /// Double lock-key tap followed by a right click.
    LockRightClick,
    MiddleClick,
    /// Hold-to-drag with the left button.
    Drag,
    /// Enter: lets Shift+Enter reach the foreground application.
    Confirm,
}

/// When the hook swallows a bound key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumePolicy {
    Always,
    WhenActive,
    Never,
}

impl Binding {
    pub fn policy(&self) -> ConsumePolicy {
        match self {
            Binding::Toggle | Binding::Quit => ConsumePolicy::Always,
            Binding::VolumePreset(_) | Binding::Confirm => ConsumePolicy::Never,
            _ => ConsumePolicy::WhenActive,
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Move(dir) => write!(f, "move {}", direction_name(*dir)),
            Binding::Shift => write!(f, "left click / precision speed"),
            Binding::Toggle => write!(f, "toggle on/off"),
            Binding::Quit => write!(f, "quit"),
            Binding::SpeedUp => write!(f, "speed up"),
            Binding::SpeedDown => write!(f, "speed down"),
            Binding::Scroll(dir) => write!(f, "scroll {}", direction_name(*dir)),
            Binding::VolumeStep(delta) => write!(f, "volume {:+}%", delta),
            Binding::VolumePreset(percent) => write!(f, "volume {}%", percent),
            Binding::LockRightClick => write!(f, "right click"),
            Binding::MiddleClick => write!(f, "middle click"),
            Binding::Drag => write!(f, "hold to drag"),
            Binding::Confirm => write!(f, "shift+enter passthrough"),
        }
    }
}

fn direction_name(dir: Direction) -> &'static str {
    match dir {
        Direction::Up => "up",
        Direction::Down => "down",
        Direction::Left => "left",
        Direction::Right => "right",
    }
}

/// Lookup table from virtual-key code to binding.
#[derive(Debug, Clone)]
pub struct KeyTable {
    slots: [Option<Binding>; 256],
}

impl Default for KeyTable {
    fn default() -> Self {
        Self { slots: [None; 256] }
    }
}

impl KeyTable {
    /// Parses the configured layout.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown key names or a key bound twice.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let mut table = Self::default();
        for entry in &config.layout {
            let vk = key_name_to_vk(&entry.key)
                .ok_or_else(|| anyhow::anyhow!("Invalid key name in layout: {}", entry.key))?;
            if let Some(existing) = table.binding(vk) {
                anyhow::bail!(
                    "Key {} is bound twice ({} and {})",
                    entry.key,
                    existing,
                    entry.binding
                );
            }
            table.bind(vk, entry.binding);
        }
        Ok(table)
    }

    pub fn bind(&mut self, vk: u32, binding: Binding) -> &mut Self {
        if let Some(slot) = self.slots.get_mut(vk as usize) {
            *slot = Some(binding);
        }
        self
    }

    #[inline(always)]
    pub fn binding(&self, vk: u32) -> Option<Binding> {
        self.slots.get(vk as usize).copied().flatten()
    }

    /// All keys carrying `binding`.
    pub fn keys_for(&self, binding: Binding) -> KeySet {
        self.entries()
            .filter(|(_, b)| *b == binding)
            .map(|(vk, _)| vk)
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = (u32, Binding)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(vk, b)| b.map(|b| (vk as u32, b)))
    }

    /// One legend line per distinct binding, keys joined with `/`.
    pub fn legend(&self) -> Vec<String> {
        let mut seen: Vec<Binding> = Vec::new();
        let mut lines = Vec::new();
        for (_, binding) in self.entries() {
            if seen.contains(&binding) {
                continue;
            }
            seen.push(binding);
            let keys: Vec<String> = self.keys_for(binding).iter().map(vk_to_key_name).collect();
            lines.push(format!("{} -> {}", keys.join("/"), binding));
        }
        lines
    }
}

//! Application state management.
//!
//! Everything the hook thread and the translator thread share lives in
//! [`InputState`] behind a single mutex. The lock is held only for a set
//! mutation or a snapshot, never across a call into the emitter.

pub mod bindings;
pub mod keys;
pub mod parsing;
pub mod types;

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

pub use bindings::{Binding, ConsumePolicy, KeyTable};
pub use keys::{KeySet, Modifiers};
pub use types::*;

static GLOBAL_STATE: OnceLock<Arc<AppState>> = OnceLock::new();

/// Lifecycle phases, in the only order they are entered.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Uninitialized = 0,
    HookInstalled = 1,
    Running = 2,
    ShuttingDown = 3,
    Terminated = 4,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Phase::HookInstalled,
            2 => Phase::Running,
            3 => Phase::ShuttingDown,
            4 => Phase::Terminated,
            _ => Phase::Uninitialized,
        }
    }
}

/// Wakes the hook thread's message loop so it can return.
pub trait QuitSignal: Send + Sync {
    fn post_quit(&self);
}

/// State written by the hook callback and read by the translator.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Physically held keys; injected events never touch it.
    pub pressed: KeySet,
    /// Written only by the translator.
    pub active: bool,
    /// Button currently held down by a drag.
    pub drag: Option<MouseButton>,
    /// Physical shift side shadowed by a synthetic shift press.
    pub synthetic_shift: Option<u32>,
}

/// What the translator samples each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub keys: KeySet,
    pub drag: Option<MouseButton>,
}

pub struct AppState {
    input: Mutex<InputState>,
    should_exit: AtomicBool,
    phase: AtomicU8,
    quit_signal: OnceLock<Arc<dyn QuitSignal>>,
}

impl AppState {
    pub fn new(start_active: bool) -> Self {
        Self {
            input: Mutex::new(InputState {
                active: start_active,
                ..InputState::default()
            }),
            should_exit: AtomicBool::new(false),
            phase: AtomicU8::new(Phase::Uninitialized as u8),
            quit_signal: OnceLock::new(),
        }
    }

    // InputState is plain data, a panic elsewhere cannot leave it half-written.
    fn lock_input(&self) -> MutexGuard<'_, InputState> {
        self.input.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` with the input state locked.
    pub fn with_input<R>(&self, f: impl FnOnce(&mut InputState) -> R) -> R {
        f(&mut self.lock_input())
    }

    pub fn snapshot(&self) -> Snapshot {
        let input = self.lock_input();
        Snapshot {
            keys: input.pressed,
            drag: input.drag,
        }
    }

    pub fn pressed_keys(&self) -> KeySet {
        self.lock_input().pressed
    }

    pub fn is_active(&self) -> bool {
        self.lock_input().active
    }

    pub fn set_active(&self, active: bool) {
        self.lock_input().active = active;
    }

    /// Records a drag on `button`. Returns `false` if a drag is already held
    /// or shutdown has begun.
    pub fn begin_drag(&self, button: MouseButton) -> bool {
        let mut input = self.lock_input();
        if input.drag.is_some() || self.should_exit() {
            return false;
        }
        input.drag = Some(button);
        true
    }

    /// Clears the drag state, returning the button that must be released.
    pub fn end_drag(&self) -> Option<MouseButton> {
        self.lock_input().drag.take()
    }

    pub fn is_dragging(&self) -> bool {
        self.lock_input().drag.is_some()
    }

    /// Clears the synthetic shift, returning the key that must be released.
    pub fn take_synthetic_modifier(&self) -> Option<u32> {
        self.lock_input().synthetic_shift.take()
    }

    /// Logical reset only; nothing is sent to the OS.
    pub fn clear_pressed(&self) {
        self.lock_input().pressed.clear();
    }

    /// Signals the translator to stop.
    pub fn exit(&self) {
        self.should_exit.store(true, Ordering::Relaxed);
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit.load(Ordering::Relaxed)
    }

    /// Stops the translator and wakes the hook thread's message loop.
    pub fn request_shutdown(&self) {
        self.exit();
        if let Some(signal) = self.quit_signal.get() {
            signal.post_quit();
        }
    }

    pub fn set_quit_signal(&self, signal: Arc<dyn QuitSignal>) {
        let _ = self.quit_signal.set(signal);
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::Release);
    }
}

pub fn set_global_state(state: Arc<AppState>) -> Result<(), Arc<AppState>> {
    GLOBAL_STATE.set(state)
}

pub fn get_global_state() -> Option<&'static Arc<AppState>> {
    GLOBAL_STATE.get()
}

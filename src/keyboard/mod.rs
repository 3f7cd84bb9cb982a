//! Hook-side key handling.
//!
//! [`decide`] is the whole policy: it updates the pressed set and returns
//! whether the OS should see the event. [`KeyboardInterceptor`] wraps it
//! with the lock, the side effects and the panic boundary; the Windows
//! hook in [`hook`] only converts OS structures.

#[cfg(windows)]
pub mod hook;

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};

use smallvec::SmallVec;

use crate::emitter::InputEmitter;
use crate::state::keys::vk;
use crate::state::{
    AppState, Binding, ConsumePolicy, Decision, InputState, KeyTable, Modifiers, RawKeyEvent,
};
use crate::util::unlikely;
use crate::volume::VolumeHandle;

#[cfg(windows)]
pub use hook::KeyboardHook;

thread_local! {
    static IN_CALLBACK: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is inside [`KeyboardInterceptor::on_key`].
pub fn in_callback() -> bool {
    IN_CALLBACK.with(Cell::get)
}

/// Wraps the panic hook so a fault inside the key callback prints nothing.
/// Panics anywhere else still reach the previous hook.
pub fn install_panic_hook() {
    static INSTALLED: Once = Once::new();
    INSTALLED.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !in_callback() {
                previous(info);
            }
        }));
    });
}

/// Work the hook does after the state lock is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEffect {
    ModifierDown(u32),
    ModifierUp(u32),
    SetVolume(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOutcome {
    pub decision: Decision,
    pub effects: SmallVec<[HookEffect; 2]>,
}

impl HookOutcome {
    fn forward() -> Self {
        Self {
            decision: Decision::Forward,
            effects: SmallVec::new(),
        }
    }
}

/// Applies one key transition to `input` and decides its fate.
pub fn decide(input: &mut InputState, table: &KeyTable, event: &RawKeyEvent) -> HookOutcome {
    let mut outcome = HookOutcome::forward();
    let binding = table.binding(event.vk);
    let press = event.is_press();

    // our own echoes (and other injectors) never change the logical state
    let repeat = if event.injected {
        false
    } else if press {
        !input.pressed.insert(event.vk)
    } else {
        input.pressed.remove(event.vk);
        false
    };
    let modifiers = Modifiers::from_keys(&input.pressed);

    if press
        && binding == Some(Binding::Confirm)
        && modifiers.shift
        && input.active
        && !modifiers.ctrl
        && input.synthetic_shift.is_none()
    {
        let side = if input.pressed.contains(vk::LSHIFT) {
            vk::LSHIFT
        } else {
            vk::RSHIFT
        };
        input.synthetic_shift = Some(side);
        outcome.effects.push(HookEffect::ModifierDown(side));
    }

    if unlikely(event.injected) {
        return outcome;
    }

    if !press && input.synthetic_shift == Some(event.vk) {
        input.synthetic_shift = None;
        outcome.effects.push(HookEffect::ModifierUp(event.vk));
    }

    let Some(binding) = binding else {
        return outcome;
    };

    if let Binding::VolumePreset(percent) = binding
        && press
        && !repeat
    {
        outcome.effects.push(HookEffect::SetVolume(percent));
    }

    let consume = match binding.policy() {
        ConsumePolicy::Always => true,
        ConsumePolicy::Never => false,
        ConsumePolicy::WhenActive => {
            input.active
                && !modifiers.passthrough()
                && !(binding == Binding::Drag && modifiers.alt)
        }
    };
    if consume {
        outcome.decision = Decision::Consume;
    }
    outcome
}

/// Everything the hook callback needs, bundled so it can live in a static.
#[derive(Clone)]
pub struct KeyboardInterceptor {
    state: Arc<AppState>,
    table: Arc<KeyTable>,
    emitter: Arc<dyn InputEmitter>,
    volume: VolumeHandle,
}

impl KeyboardInterceptor {
    pub fn new(
        state: Arc<AppState>,
        table: Arc<KeyTable>,
        emitter: Arc<dyn InputEmitter>,
        volume: VolumeHandle,
    ) -> Self {
        Self {
            state,
            table,
            emitter,
            volume,
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Handles one key transition. Never panics and never blocks on the
    /// translator; any internal fault forwards the event untouched.
    pub fn on_key(&self, event: &RawKeyEvent) -> Decision {
        IN_CALLBACK.with(|flag| flag.set(true));
        let decision = panic::catch_unwind(AssertUnwindSafe(|| {
            let outcome = self
                .state
                .with_input(|input| decide(input, &self.table, event));
            for effect in &outcome.effects {
                self.apply(*effect);
            }
            outcome.decision
        }))
        .unwrap_or(Decision::Forward);
        IN_CALLBACK.with(|flag| flag.set(false));
        decision
    }

    fn apply(&self, effect: HookEffect) {
        match effect {
            HookEffect::ModifierDown(code) => self.emitter.key_down(code),
            HookEffect::ModifierUp(code) => self.emitter.key_up(code),
            HookEffect::SetVolume(percent) => self.volume.set_percent(percent),
        }
    }
}

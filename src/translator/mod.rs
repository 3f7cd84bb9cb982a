//! Polling state machine that turns held keys into mouse actions.
//!
//! The translator owns every edge tracker and scroll cadence; the only
//! state it shares with the hook is the pressed-key snapshot, the active
//! flag and the drag state in [`AppState`].

mod edge;
#[cfg(test)]
mod tests;

pub use edge::{EdgeTracker, ScrollCadence};

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use smallvec::SmallVec;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::emitter::InputEmitter;
use crate::state::keys::vk;
use crate::state::types::{Direction, MouseButton, Point, ScrollAxis};
use crate::state::{AppState, Binding, KeySet, KeyTable, Modifiers};
use crate::util::scaled_step;
use crate::volume::VolumeHandle;

/// Keys grouped by what the translator does with them.
#[derive(Debug, Clone, Default)]
struct BoundKeys {
    up: KeySet,
    down: KeySet,
    left: KeySet,
    right: KeySet,
    shift: KeySet,
    toggle: KeySet,
    quit: KeySet,
    speed_up: KeySet,
    speed_down: KeySet,
    scroll_up: KeySet,
    scroll_down: KeySet,
    scroll_left: KeySet,
    scroll_right: KeySet,
    lock: KeySet,
    middle: KeySet,
    drag: KeySet,
    volume: SmallVec<[(i8, KeySet); 2]>,
}

impl BoundKeys {
    fn from_table(table: &KeyTable) -> Self {
        let mut keys = Self::default();
        for (code, binding) in table.entries() {
            let set = match binding {
                Binding::Move(Direction::Up) => &mut keys.up,
                Binding::Move(Direction::Down) => &mut keys.down,
                Binding::Move(Direction::Left) => &mut keys.left,
                Binding::Move(Direction::Right) => &mut keys.right,
                Binding::Shift => &mut keys.shift,
                Binding::Toggle => &mut keys.toggle,
                Binding::Quit => &mut keys.quit,
                Binding::SpeedUp => &mut keys.speed_up,
                Binding::SpeedDown => &mut keys.speed_down,
                Binding::Scroll(Direction::Up) => &mut keys.scroll_up,
                Binding::Scroll(Direction::Down) => &mut keys.scroll_down,
                Binding::Scroll(Direction::Left) => &mut keys.scroll_left,
                Binding::Scroll(Direction::Right) => &mut keys.scroll_right,
                Binding::LockRightClick => &mut keys.lock,
                Binding::MiddleClick => &mut keys.middle,
                Binding::Drag => &mut keys.drag,
                Binding::VolumeStep(delta) => {
                    if let Some((_, set)) = keys.volume.iter_mut().find(|(d, _)| *d == delta) {
                        set.insert(code);
                    } else {
                        keys.volume.push((delta, KeySet::from_iter([code])));
                    }
                    continue;
                }
                // handled entirely by the hook
                Binding::VolumePreset(_) | Binding::Confirm => continue,
            };
            set.insert(code);
        }
        keys
    }

    fn sample(&self, pressed: &KeySet) -> Held {
        let any = |set: &KeySet| set.intersects(pressed);
        let modifiers = Modifiers::from_keys(pressed);
        Held {
            up: any(&self.up),
            down: any(&self.down),
            left: any(&self.left),
            right: any(&self.right),
            shift: any(&self.shift),
            toggle: any(&self.toggle),
            quit: any(&self.quit),
            speed_up: any(&self.speed_up),
            speed_down: any(&self.speed_down),
            scroll_up: any(&self.scroll_up),
            scroll_down: any(&self.scroll_down),
            scroll_left: any(&self.scroll_left),
            scroll_right: any(&self.scroll_right),
            lock: any(&self.lock),
            middle: any(&self.middle),
            drag: any(&self.drag),
            volume: self.volume.iter().map(|(_, set)| any(set)).collect(),
            alt: modifiers.alt,
            passthrough: modifiers.passthrough(),
        }
    }
}

/// Conditions sampled once per tick.
#[derive(Debug, Clone, Default)]
struct Held {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    shift: bool,
    toggle: bool,
    quit: bool,
    speed_up: bool,
    speed_down: bool,
    scroll_up: bool,
    scroll_down: bool,
    scroll_left: bool,
    scroll_right: bool,
    lock: bool,
    middle: bool,
    drag: bool,
    volume: SmallVec<[bool; 2]>,
    alt: bool,
    passthrough: bool,
}

impl Held {
    #[inline]
    fn moving(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    #[inline]
    fn drag_wanted(&self) -> bool {
        self.drag && (self.shift || self.moving()) && !self.alt
    }
}

/// Edge trackers for the one-shot actions. The toggle and quit trackers
/// live outside so they survive resets.
#[derive(Debug, Clone, Default)]
struct Edges {
    shift: EdgeTracker,
    lock: EdgeTracker,
    middle: EdgeTracker,
    speed_up: EdgeTracker,
    speed_down: EdgeTracker,
    drag: EdgeTracker,
    volume: SmallVec<[EdgeTracker; 2]>,
}

impl Edges {
    fn new(volume_keys: usize) -> Self {
        Self {
            volume: (0..volume_keys).map(|_| EdgeTracker::default()).collect(),
            ..Self::default()
        }
    }

    fn reset(&mut self) {
        self.shift.reset();
        self.lock.reset();
        self.middle.reset();
        self.speed_up.reset();
        self.speed_down.reset();
        self.drag.reset();
        self.volume.iter_mut().for_each(EdgeTracker::reset);
    }

    fn prime(&mut self, held: &Held) {
        self.shift.prime(held.shift);
        self.lock.prime(held.lock);
        self.middle.prime(held.middle);
        self.speed_up.prime(held.speed_up);
        self.speed_down.prime(held.speed_down);
        self.drag.prime(held.drag_wanted());
        for (edge, held) in self.volume.iter_mut().zip(&held.volume) {
            edge.prime(*held);
        }
    }
}

pub struct Translator {
    config: AppConfig,
    keys: BoundKeys,
    emitter: Arc<dyn InputEmitter>,
    volume: VolumeHandle,
    active: bool,
    step: i32,
    toggle: EdgeTracker,
    quit: EdgeTracker,
    edges: Edges,
    vertical: ScrollCadence,
    horizontal: ScrollCadence,
}

impl Translator {
    pub fn new(
        config: &AppConfig,
        state: &AppState,
        table: &KeyTable,
        emitter: Arc<dyn InputEmitter>,
        volume: VolumeHandle,
    ) -> Self {
        let keys = BoundKeys::from_table(table);
        Self {
            edges: Edges::new(keys.volume.len()),
            keys,
            emitter,
            volume,
            active: state.is_active(),
            step: config.initial_step,
            toggle: EdgeTracker::default(),
            quit: EdgeTracker::default(),
            vertical: ScrollCadence::new(config.scroll_interval),
            horizontal: ScrollCadence::new(config.scroll_interval),
            config: config.clone(),
        }
    }

    /// Pixels moved per tick at normal speed.
    pub fn step(&self) -> i32 {
        self.step
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Ticks at the configured period until the exit flag is set.
    pub fn run(&mut self, state: &AppState) {
        debug!(tick_ms = self.config.tick.as_millis() as u64, "translator started");
        while !state.should_exit() {
            let started = Instant::now();
            self.tick(state, started);
            if let Some(rest) = self.config.tick.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        debug!("translator stopped");
    }

    pub fn tick(&mut self, state: &AppState, now: Instant) {
        let snapshot = state.snapshot();
        let held = self.keys.sample(&snapshot.keys);

        if self.quit.observe(held.quit) {
            info!("quit key pressed, exiting");
            self.release_drag(state);
            state.request_shutdown();
            return;
        }

        if self.toggle.observe(held.toggle) {
            self.active = !self.active;
            state.set_active(self.active);
            info!(
                "mouse mode {}",
                if self.active { "enabled" } else { "disabled" }
            );
            if self.active {
                self.edges.prime(&held);
                self.vertical.prime(held.scroll_up != held.scroll_down);
                self.horizontal.prime(held.scroll_left != held.scroll_right);
            } else {
                self.release_drag(state);
            }
        }

        if !self.active || held.passthrough {
            self.idle(state);
            return;
        }

        self.adjust_speed(&held);

        if held.alt {
            self.release_drag(state);
        }

        self.move_cursor(&held);
        self.scroll(&held, now);

        let moving = held.moving();
        let drag_started = self.edges.drag.observe(held.drag_wanted())
            && state.begin_drag(MouseButton::Left);
        if drag_started {
            self.emitter.button_down(MouseButton::Left);
            // shutdown may have released held input while we were pressing
            if state.should_exit() {
                state.end_drag();
                self.emitter.button_up(MouseButton::Left);
            }
        }
        if !held.drag {
            self.release_drag(state);
        }

        if self.edges.shift.observe(held.shift) && !moving && !state.is_dragging() {
            self.emitter.click(MouseButton::Left);
        }

        if self.edges.lock.observe(held.lock) {
            self.emitter.key_tap(vk::CAPITAL);
            self.emitter.key_tap(vk::CAPITAL);
            self.emitter.click(MouseButton::Right);
        }

        if self.edges.middle.observe(held.middle) {
            self.emitter.click(MouseButton::Middle);
        }

        for (i, (delta, _)) in self.keys.volume.iter().enumerate() {
            let pressed = held.volume.get(i).copied().unwrap_or(false);
            if let Some(edge) = self.edges.volume.get_mut(i)
                && edge.observe(pressed)
            {
                self.volume.adjust(*delta);
            }
        }
    }

    fn idle(&mut self, state: &AppState) {
        self.edges.reset();
        self.vertical.reset();
        self.horizontal.reset();
        self.release_drag(state);
    }

    fn release_drag(&self, state: &AppState) {
        if let Some(button) = state.end_drag() {
            self.emitter.button_up(button);
        }
    }

    fn adjust_speed(&mut self, held: &Held) {
        let mut step = self.step;
        if self.edges.speed_up.observe(held.speed_up) {
            step += 1;
        }
        if self.edges.speed_down.observe(held.speed_down) {
            step -= 1;
        }
        let step = step.clamp(self.config.min_step, self.config.max_step);
        if step != self.step {
            self.step = step;
            info!(
                step,
                px_per_sec = self.config.pixels_per_second(step),
                "cursor speed changed"
            );
        }
    }

    /// Magnitude of one tick of movement.
    fn magnitude(&self, precise: bool) -> i32 {
        if precise {
            scaled_step(self.step, self.config.precision_factor)
        } else {
            self.step
        }
    }

    fn move_cursor(&self, held: &Held) {
        let dx = i32::from(held.right) - i32::from(held.left);
        let dy = i32::from(held.down) - i32::from(held.up);
        if dx == 0 && dy == 0 {
            return;
        }
        let Some(cursor) = self.emitter.cursor_position() else {
            return;
        };
        let magnitude = self.magnitude(held.shift);
        let target = Point::new(
            cursor.x.saturating_add(dx * magnitude),
            cursor.y.saturating_add(dy * magnitude),
        );
        // pinned targets are still sent so hover effects keep firing
        self.emitter.move_to(self.emitter.desktop_bounds().clamp(target));
    }

    fn scroll(&mut self, held: &Held, now: Instant) {
        let notch = self.config.wheel_delta;

        let vertical = held.scroll_up != held.scroll_down;
        if self.vertical.poll(vertical, now) {
            let delta = if held.scroll_up { notch } else { -notch };
            self.emitter.scroll(ScrollAxis::Vertical, delta);
        }

        let horizontal = held.scroll_left != held.scroll_right;
        if self.horizontal.poll(horizontal, now) {
            let delta = if held.scroll_right { notch } else { -notch };
            self.emitter.scroll(ScrollAxis::Horizontal, delta);
        }
    }
}

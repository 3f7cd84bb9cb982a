use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use super::*;
use crate::emitter::{Emitted, RecordingEmitter};
use crate::state::types::DesktopBounds;
use crate::volume::VolumeRequest;

const W: u32 = 0x57;
const A: u32 = 0x41;
const S: u32 = 0x53;
const D: u32 = 0x44;
const RIGHT_ARROW: u32 = 0x27;
const TOGGLE: u32 = 0x30;
const NUMPAD_ADD: u32 = 0x6B;
const NUMPAD_SUBTRACT: u32 = 0x6D;
const SCROLL_UP: u32 = 0x31;
const SCROLL_DOWN: u32 = 0x32;
const SCROLL_LEFT: u32 = 0x33;
const VOLUME_DOWN: u32 = 0x35;
const VOLUME_UP: u32 = 0x36;
const F1: u32 = 0x70;
const ESC: u32 = 0x1B;

struct Rig {
    state: AppState,
    emitter: Arc<RecordingEmitter>,
    translator: Translator,
    volume: Receiver<VolumeRequest>,
    now: Instant,
    tick: Duration,
}

impl Rig {
    fn new() -> Self {
        Self::with(AppConfig::default(), Point::new(500, 500))
    }

    fn with(config: AppConfig, cursor: Point) -> Self {
        let state = AppState::new(config.start_active);
        let table = KeyTable::from_config(&config).unwrap();
        let emitter = Arc::new(RecordingEmitter::new(
            cursor,
            DesktopBounds::new(0, 0, 1920, 1080),
        ));
        let (handle, volume) = VolumeHandle::channel();
        let translator = Translator::new(&config, &state, &table, emitter.clone(), handle);
        Self {
            state,
            emitter,
            translator,
            volume,
            now: Instant::now(),
            tick: config.tick,
        }
    }

    fn press(&self, code: u32) {
        self.state.with_input(|input| input.pressed.insert(code));
    }

    fn release(&self, code: u32) {
        self.state.with_input(|input| input.pressed.remove(code));
    }

    fn tick(&mut self) -> Vec<Emitted> {
        self.translator.tick(&self.state, self.now);
        self.now += self.tick;
        self.emitter.take()
    }

    fn ticks(&mut self, n: usize) -> Vec<Emitted> {
        (0..n).flat_map(|_| self.tick()).collect()
    }

    fn tap(&mut self, code: u32) -> Vec<Emitted> {
        self.press(code);
        let mut events = self.tick();
        self.release(code);
        events.extend(self.tick());
        events
    }

    fn volume_requests(&self) -> Vec<VolumeRequest> {
        self.volume.try_iter().collect()
    }
}

fn moves(events: &[Emitted]) -> Vec<Point> {
    events
        .iter()
        .filter_map(|e| match e {
            Emitted::MoveTo(p) => Some(*p),
            _ => None,
        })
        .collect()
}

#[test]
fn test_held_movement_moves_once_per_tick() {
    let mut rig = Rig::new();
    rig.press(D);
    let events = rig.ticks(5);
    assert_eq!(
        moves(&events),
        (1..=5).map(|i| Point::new(500 + 3 * i, 500)).collect::<Vec<_>>()
    );
}

#[test]
fn test_diagonal_movement() {
    let mut rig = Rig::new();
    rig.press(W);
    rig.press(A);
    assert_eq!(moves(&rig.tick()), vec![Point::new(497, 497)]);
}

#[test]
fn test_arrow_keys_alias_movement() {
    let mut rig = Rig::new();
    rig.press(RIGHT_ARROW);
    assert_eq!(moves(&rig.tick()), vec![Point::new(503, 500)]);
}

#[test]
fn test_opposite_keys_cancel() {
    let mut rig = Rig::new();
    rig.press(A);
    rig.press(D);
    assert!(moves(&rig.ticks(3)).is_empty());

    rig.press(S);
    assert_eq!(moves(&rig.tick()), vec![Point::new(500, 503)]);
}

#[test]
fn test_shift_slows_movement() {
    let mut config = AppConfig::default();
    config.initial_step = 10;
    let mut rig = Rig::with(config, Point::new(500, 500));
    rig.press(vk::LSHIFT);
    rig.press(D);
    // 10 * 0.25 = 2.5 rounds to even
    assert_eq!(moves(&rig.tick()), vec![Point::new(502, 500)]);
}

#[test]
fn test_shift_magnitude_never_drops_below_one() {
    let mut config = AppConfig::default();
    config.initial_step = 1;
    let mut rig = Rig::with(config, Point::new(500, 500));
    rig.press(vk::RSHIFT);
    rig.press(W);
    assert_eq!(moves(&rig.tick()), vec![Point::new(500, 499)]);
}

#[test]
fn test_movement_is_clamped_but_still_emitted() {
    let mut rig = Rig::with(AppConfig::default(), Point::new(1918, 500));
    rig.press(D);
    let events = rig.ticks(3);
    assert_eq!(moves(&events), vec![Point::new(1919, 500); 3]);
    assert_eq!(rig.emitter.cursor(), Point::new(1919, 500));
}

#[test]
fn test_shift_press_clicks_once() {
    let mut rig = Rig::new();
    rig.press(vk::LSHIFT);
    let events = rig.ticks(4);
    assert_eq!(events, vec![Emitted::Click(MouseButton::Left)]);

    rig.release(vk::LSHIFT);
    rig.tick();
    rig.press(vk::RSHIFT);
    assert_eq!(rig.tick(), vec![Emitted::Click(MouseButton::Left)]);
}

#[test]
fn test_shift_never_clicks_while_moving() {
    let mut rig = Rig::new();
    rig.press(D);
    rig.tick();
    rig.press(vk::LSHIFT);
    let events = rig.ticks(3);
    assert!(!events.contains(&Emitted::Click(MouseButton::Left)));
}

#[test]
fn test_lock_key_taps_twice_then_right_clicks() {
    let mut rig = Rig::new();
    rig.press(vk::CAPITAL);
    let events = rig.ticks(3);
    assert_eq!(
        events,
        vec![
            Emitted::KeyTap(vk::CAPITAL),
            Emitted::KeyTap(vk::CAPITAL),
            Emitted::Click(MouseButton::Right),
        ]
    );
}

#[test]
fn test_middle_click() {
    let mut rig = Rig::new();
    assert_eq!(rig.tap(F1), vec![Emitted::Click(MouseButton::Middle)]);
}

#[test]
fn test_drag_emits_single_down_and_up() {
    let mut rig = Rig::new();
    rig.press(vk::TAB);
    rig.press(D);
    let events = rig.ticks(4);
    let downs = events
        .iter()
        .filter(|e| **e == Emitted::ButtonDown(MouseButton::Left))
        .count();
    assert_eq!(downs, 1);
    assert_eq!(moves(&events).len(), 4);
    assert!(rig.state.is_dragging());

    // the drag persists when movement stops
    rig.release(D);
    assert!(rig.ticks(2).is_empty());

    rig.release(vk::TAB);
    assert_eq!(rig.tick(), vec![Emitted::ButtonUp(MouseButton::Left)]);
    assert!(rig.ticks(3).is_empty());
    assert!(!rig.state.is_dragging());
}

#[test]
fn test_drag_with_shift_does_not_click() {
    let mut rig = Rig::new();
    rig.press(vk::TAB);
    rig.press(vk::LSHIFT);
    assert_eq!(rig.tick(), vec![Emitted::ButtonDown(MouseButton::Left)]);
}

#[test]
fn test_drag_key_alone_does_nothing() {
    let mut rig = Rig::new();
    rig.press(vk::TAB);
    assert!(rig.ticks(3).is_empty());
    assert!(!rig.state.is_dragging());
}

#[test]
fn test_alt_ends_drag() {
    let mut rig = Rig::new();
    rig.press(vk::TAB);
    rig.press(vk::LSHIFT);
    rig.tick();
    assert!(rig.state.is_dragging());

    rig.press(vk::LMENU);
    assert_eq!(rig.tick(), vec![Emitted::ButtonUp(MouseButton::Left)]);
    assert!(rig.ticks(2).is_empty());
}

#[test]
fn test_passthrough_suppresses_everything() {
    let mut rig = Rig::new();
    rig.press(vk::LCONTROL);
    for code in [W, D, vk::LSHIFT, vk::CAPITAL, F1, SCROLL_UP, NUMPAD_ADD, VOLUME_UP] {
        rig.press(code);
    }
    assert!(rig.ticks(10).is_empty());
    assert_eq!(rig.translator.step(), 3);
    assert!(rig.volume_requests().is_empty());
}

#[test]
fn test_meta_is_passthrough() {
    let mut rig = Rig::new();
    rig.press(vk::LWIN);
    rig.press(D);
    assert!(rig.ticks(3).is_empty());
}

#[test]
fn test_passthrough_releases_drag() {
    let mut rig = Rig::new();
    rig.press(vk::TAB);
    rig.press(D);
    rig.tick();
    rig.emitter.take();

    rig.press(vk::RCONTROL);
    assert_eq!(rig.tick(), vec![Emitted::ButtonUp(MouseButton::Left)]);
}

#[test]
fn test_toggle_flips_active_flag() {
    let mut rig = Rig::new();
    assert!(rig.translator.is_active());
    rig.tap(TOGGLE);
    assert!(!rig.translator.is_active());
    assert!(!rig.state.is_active());

    rig.press(D);
    assert!(rig.ticks(3).is_empty());
    rig.release(D);

    rig.tap(TOGGLE);
    assert!(rig.state.is_active());
}

#[test]
fn test_toggle_works_under_passthrough() {
    let mut rig = Rig::new();
    rig.press(vk::LCONTROL);
    rig.tap(TOGGLE);
    assert!(!rig.state.is_active());
}

#[test]
fn test_toggle_held_flips_once() {
    let mut rig = Rig::new();
    rig.press(TOGGLE);
    rig.ticks(10);
    assert!(!rig.state.is_active());
}

#[test]
fn test_deactivation_releases_drag() {
    let mut rig = Rig::new();
    rig.press(vk::TAB);
    rig.press(vk::LSHIFT);
    rig.tick();
    rig.press(TOGGLE);
    assert_eq!(rig.tick(), vec![Emitted::ButtonUp(MouseButton::Left)]);
    assert!(!rig.state.is_dragging());
}

#[test]
fn test_reactivation_does_not_fire_held_keys() {
    let mut rig = Rig::new();
    rig.tap(TOGGLE);
    assert!(!rig.state.is_active());

    rig.press(vk::LSHIFT);
    rig.press(F1);
    rig.press(vk::CAPITAL);
    rig.press(SCROLL_DOWN);
    rig.press(SCROLL_LEFT);
    rig.ticks(3);

    let events = rig.tap(TOGGLE);
    assert!(rig.state.is_active());
    assert!(events.is_empty());
    assert!(rig.ticks(10).is_empty());

    // a fresh press fires again
    rig.release(F1);
    rig.release(SCROLL_DOWN);
    rig.tick();
    rig.press(F1);
    rig.press(SCROLL_DOWN);
    assert_eq!(
        rig.tick(),
        vec![
            Emitted::Scroll(ScrollAxis::Vertical, -120),
            Emitted::Click(MouseButton::Middle),
        ]
    );
}

#[test]
fn test_speed_changes_within_bounds() {
    let mut config = AppConfig::default();
    config.initial_step = 49;
    let mut rig = Rig::with(config, Point::new(500, 500));
    rig.tap(NUMPAD_ADD);
    assert_eq!(rig.translator.step(), 50);
    rig.tap(NUMPAD_ADD);
    assert_eq!(rig.translator.step(), 50);

    let mut config = AppConfig::default();
    config.initial_step = 2;
    let mut rig = Rig::with(config, Point::new(500, 500));
    rig.tap(NUMPAD_SUBTRACT);
    rig.tap(NUMPAD_SUBTRACT);
    rig.tap(NUMPAD_SUBTRACT);
    assert_eq!(rig.translator.step(), 1);
}

#[test]
fn test_speed_key_held_steps_once() {
    let mut rig = Rig::new();
    rig.press(NUMPAD_ADD);
    rig.ticks(10);
    assert_eq!(rig.translator.step(), 4);
    rig.press(D);
    assert_eq!(moves(&rig.tick()), vec![Point::new(504, 500)]);
}

#[test]
#[tracing_test::traced_test]
fn test_speed_change_is_logged() {
    let mut rig = Rig::new();
    rig.tap(NUMPAD_ADD);
    assert!(logs_contain("cursor speed changed"));
    assert!(logs_contain("px_per_sec=400"));
}

#[test]
fn test_scroll_fires_immediately_then_every_interval() {
    let mut rig = Rig::new();
    rig.press(SCROLL_DOWN);
    let events = rig.ticks(11);
    assert_eq!(
        events,
        vec![Emitted::Scroll(ScrollAxis::Vertical, -120); 3]
    );
}

#[test]
fn test_scroll_directions() {
    let mut rig = Rig::new();
    assert_eq!(
        rig.tap(SCROLL_UP),
        vec![Emitted::Scroll(ScrollAxis::Vertical, 120)]
    );
    assert_eq!(
        rig.tap(SCROLL_LEFT),
        vec![Emitted::Scroll(ScrollAxis::Horizontal, -120)]
    );
}

#[test]
fn test_opposite_scroll_keys_cancel() {
    let mut rig = Rig::new();
    rig.press(SCROLL_UP);
    rig.press(SCROLL_DOWN);
    assert!(rig.ticks(6).is_empty());
}

#[test]
fn test_volume_steps_are_requested_on_edges() {
    let mut rig = Rig::new();
    rig.press(VOLUME_UP);
    rig.ticks(5);
    rig.release(VOLUME_UP);
    rig.tap(VOLUME_DOWN);
    assert_eq!(
        rig.volume_requests(),
        vec![VolumeRequest::Adjust(10), VolumeRequest::Adjust(-10)]
    );
}

#[test]
fn test_volume_presets_are_left_to_the_hook() {
    let mut rig = Rig::new();
    rig.tap(0x78); // F9
    assert!(rig.volume_requests().is_empty());
}

#[test]
fn test_quit_key_requests_shutdown_even_when_inactive() {
    let mut rig = Rig::new();
    rig.tap(TOGGLE);
    rig.press(vk::LCONTROL);
    rig.press(ESC);
    assert!(rig.tick().is_empty());
    assert!(rig.state.should_exit());
}

#[test]
fn test_quit_releases_drag() {
    let mut rig = Rig::new();
    rig.press(vk::TAB);
    rig.press(vk::LSHIFT);
    rig.tick();
    rig.press(ESC);
    assert_eq!(rig.tick(), vec![Emitted::ButtonUp(MouseButton::Left)]);
    assert!(rig.state.should_exit());
}

#[test]
fn test_run_stops_on_exit_flag() {
    let mut rig = Rig::new();
    rig.state.exit();
    rig.translator.run(&rig.state);
}

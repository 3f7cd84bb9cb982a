//! Type definitions shared by the hook, the translator and the emitter.

/// Marker value to identify simulated input events.
pub const SIMULATED_EVENT_MARKER: usize = 0x4B4D;

/// Scroll amount of one wheel notch.
pub const WHEEL_DELTA: i32 = 120;

const WM_KEYDOWN: u32 = 0x0100;
const WM_KEYUP: u32 = 0x0101;
const WM_SYSKEYDOWN: u32 = 0x0104;
const WM_SYSKEYUP: u32 = 0x0105;

/// Direction of a raw key transition.
///
/// Auto-repeat arrives as another `Press`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Press,
    Release,
}

impl Transition {
    /// Maps a low-level keyboard hook message to a transition.
    /// System keys (Alt combinations, F10) are treated like normal keys.
    #[inline(always)]
    pub fn from_message(message: u32) -> Option<Self> {
        match message {
            WM_KEYDOWN | WM_SYSKEYDOWN => Some(Transition::Press),
            WM_KEYUP | WM_SYSKEYUP => Some(Transition::Release),
            _ => None,
        }
    }
}

/// One key transition as delivered by the interception facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub vk: u32,
    pub transition: Transition,
    /// Set for events produced by `SendInput`, ours or anyone else's.
    pub injected: bool,
    /// Milliseconds since system start, as reported by the OS.
    pub time: u32,
}

impl RawKeyEvent {
    pub fn press(vk: u32) -> Self {
        Self {
            vk,
            transition: Transition::Press,
            injected: false,
            time: 0,
        }
    }

    pub fn release(vk: u32) -> Self {
        Self {
            vk,
            transition: Transition::Release,
            injected: false,
            time: 0,
        }
    }

    pub fn injected(mut self) -> Self {
        self.injected = true;
        self
    }

    #[inline(always)]
    pub fn is_press(&self) -> bool {
        self.transition == Transition::Press
    }
}

/// Whether the hook swallows an event or hands it down the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Consume,
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollAxis {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Absolute screen position in physical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Bounding rectangle of all monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesktopBounds {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl DesktopBounds {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Builds bounds from virtual-screen metrics, substituting the primary
    /// monitor size for any axis whose virtual size is degenerate.
    pub fn from_metrics(virtual_rect: (i32, i32, i32, i32), primary: (i32, i32)) -> Self {
        let (left, top, mut width, mut height) = virtual_rect;
        if width <= 1 {
            width = primary.0.max(1);
        }
        if height <= 1 {
            height = primary.1.max(1);
        }
        Self::new(left, top, width, height)
    }

    /// Rightmost addressable column.
    pub fn right(&self) -> i32 {
        self.left + self.width - 1
    }

    /// Bottom addressable row.
    pub fn bottom(&self) -> i32 {
        self.top + self.height - 1
    }

    pub fn clamp(&self, point: Point) -> Point {
        Point {
            x: point.x.clamp(self.left, self.right().max(self.left)),
            y: point.y.clamp(self.top, self.bottom().max(self.top)),
        }
    }

    /// Converts a clamped position to the 0..=65535 range expected by
    /// absolute `SendInput` movement over the virtual desktop.
    pub fn normalize(&self, point: Point) -> (i32, i32) {
        let point = self.clamp(point);
        let scale = |offset: i32, extent: i32| -> i32 {
            if extent <= 1 {
                0
            } else {
                (i64::from(offset) * 65535 / i64::from(extent - 1)) as i32
            }
        };
        (
            scale(point.x - self.left, self.width),
            scale(point.y - self.top, self.height),
        )
    }
}

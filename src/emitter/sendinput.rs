use smallvec::SmallVec;
use windows::Win32::Foundation::POINT;
use windows::Win32::UI::Input::KeyboardAndMouse::*;
use windows::Win32::UI::WindowsAndMessaging::{
    GetCursorPos, GetSystemMetrics, SM_CXSCREEN, SM_CXVIRTUALSCREEN, SM_CYSCREEN,
    SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN,
};

use super::InputEmitter;
use crate::state::types::{
    DesktopBounds, MouseButton, Point, SIMULATED_EVENT_MARKER, ScrollAxis,
};

/// [`InputEmitter`] backed by `SendInput`.
///
/// Every event carries [`SIMULATED_EVENT_MARKER`] so the keyboard hook can
/// recognise its own echoes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SendInputEmitter;

impl SendInputEmitter {
    pub fn new() -> Self {
        Self
    }

    #[inline(always)]
    fn keyboard(vk: u32, flags: KEYBD_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(vk as u16),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: SIMULATED_EVENT_MARKER,
                },
            },
        }
    }

    #[inline(always)]
    fn mouse(dx: i32, dy: i32, data: i32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx,
                    dy,
                    mouseData: data as u32,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: SIMULATED_EVENT_MARKER,
                },
            },
        }
    }

    fn button_flags(button: MouseButton) -> (MOUSE_EVENT_FLAGS, MOUSE_EVENT_FLAGS) {
        match button {
            MouseButton::Left => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
            MouseButton::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
            MouseButton::Middle => (MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP),
        }
    }

    // A single SendInput call is not interleaved with other input streams.
    fn send(inputs: &[INPUT]) {
        unsafe {
            SendInput(inputs, std::mem::size_of::<INPUT>() as i32);
        }
    }
}

impl InputEmitter for SendInputEmitter {
    fn key_down(&self, vk: u32) {
        Self::send(&[Self::keyboard(vk, KEYBD_EVENT_FLAGS(0))]);
    }

    fn key_up(&self, vk: u32) {
        Self::send(&[Self::keyboard(vk, KEYEVENTF_KEYUP)]);
    }

    fn key_tap(&self, vk: u32) {
        let inputs: SmallVec<[INPUT; 2]> = SmallVec::from_buf([
            Self::keyboard(vk, KEYBD_EVENT_FLAGS(0)),
            Self::keyboard(vk, KEYEVENTF_KEYUP),
        ]);
        Self::send(&inputs);
    }

    fn button_down(&self, button: MouseButton) {
        let (down, _) = Self::button_flags(button);
        Self::send(&[Self::mouse(0, 0, 0, down)]);
    }

    fn button_up(&self, button: MouseButton) {
        let (_, up) = Self::button_flags(button);
        Self::send(&[Self::mouse(0, 0, 0, up)]);
    }

    fn click(&self, button: MouseButton) {
        let (down, up) = Self::button_flags(button);
        let inputs: SmallVec<[INPUT; 2]> =
            SmallVec::from_buf([Self::mouse(0, 0, 0, down), Self::mouse(0, 0, 0, up)]);
        Self::send(&inputs);
    }

    fn move_to(&self, target: Point) {
        // Absolute placement produces the WM_MOUSEMOVE traffic hover effects rely on.
        let (x, y) = self.desktop_bounds().normalize(target);
        Self::send(&[Self::mouse(
            x,
            y,
            0,
            MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_VIRTUALDESK,
        )]);
    }

    fn scroll(&self, axis: ScrollAxis, delta: i32) {
        let flags = match axis {
            ScrollAxis::Vertical => MOUSEEVENTF_WHEEL,
            ScrollAxis::Horizontal => MOUSEEVENTF_HWHEEL,
        };
        Self::send(&[Self::mouse(0, 0, delta, flags)]);
    }

    fn cursor_position(&self) -> Option<Point> {
        let mut pt = POINT::default();
        unsafe { GetCursorPos(&mut pt) }.ok()?;
        Some(Point::new(pt.x, pt.y))
    }

    fn desktop_bounds(&self) -> DesktopBounds {
        unsafe {
            DesktopBounds::from_metrics(
                (
                    GetSystemMetrics(SM_XVIRTUALSCREEN),
                    GetSystemMetrics(SM_YVIRTUALSCREEN),
                    GetSystemMetrics(SM_CXVIRTUALSCREEN),
                    GetSystemMetrics(SM_CYVIRTUALSCREEN),
                ),
                (
                    GetSystemMetrics(SM_CXSCREEN),
                    GetSystemMetrics(SM_CYSCREEN),
                ),
            )
        }
    }
}

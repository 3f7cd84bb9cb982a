use windows::Win32::System::Console::*;
use windows::core::*;

use crate::state::get_global_state;

/// Routes Ctrl+C, Ctrl+Break and console close into a graceful shutdown.
pub fn set_control_ctrl_handler() -> Result<()> {
    unsafe { SetConsoleCtrlHandler(Some(console_handler), true) }
}

// Runs on a thread the system creates for the notification.
unsafe extern "system" fn console_handler(ctrl_type: u32) -> BOOL {
    match ctrl_type {
        CTRL_C_EVENT | CTRL_BREAK_EVENT | CTRL_CLOSE_EVENT => {
            match get_global_state() {
                // stops the translator and wakes the hook thread's pump
                Some(state) => state.request_shutdown(),
                None => std::process::exit(0), // nothing to release yet
            }
            BOOL(1)
        }
        _ => BOOL(0),
    }
}

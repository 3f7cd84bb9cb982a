//! `WH_KEYBOARD_LL` registration and message pump.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::*;
use windows::core::{HSTRING, PCWSTR};

use super::KeyboardInterceptor;
use crate::error::{HookError, RegistrationAttempt};
use crate::lifecycle::InterceptionService;
use crate::state::{Decision, QuitSignal, RawKeyEvent, SIMULATED_EVENT_MARKER, Transition};
use crate::util::unlikely;

// The hook procedure receives no user data, so the interceptor has to be
// reachable from a static.
static INTERCEPTOR: OnceLock<KeyboardInterceptor> = OnceLock::new();

unsafe extern "system" fn keyboard_proc(code: i32, w_param: WPARAM, l_param: LPARAM) -> LRESULT {
    if unlikely(code < 0) {
        return unsafe { CallNextHookEx(None, code, w_param, l_param) };
    }

    let kb_struct = unsafe { &*(l_param.0 as *const KBDLLHOOKSTRUCT) };

    if let Some(transition) = Transition::from_message(w_param.0 as u32)
        && let Some(interceptor) = INTERCEPTOR.get()
    {
        let event = RawKeyEvent {
            vk: kb_struct.vkCode,
            transition,
            injected: kb_struct.flags.contains(LLKHF_INJECTED)
                || kb_struct.dwExtraInfo == SIMULATED_EVENT_MARKER,
            time: kb_struct.time,
        };
        if interceptor.on_key(&event) == Decision::Consume {
            return LRESULT(1); // block raw key event
        }
    }

    unsafe { CallNextHookEx(None, code, w_param, l_param) }
}

/// Ways of obtaining the module handle passed to `SetWindowsHookExW`,
/// tried in order. Some hosts (embedded interpreters, unusual launchers)
/// reject one or another.
#[derive(Debug, Clone, Copy)]
enum ModuleStrategy {
    CurrentProcess,
    ExecutableName,
    NoModule,
}

impl ModuleStrategy {
    const ALL: [ModuleStrategy; 3] = [
        ModuleStrategy::CurrentProcess,
        ModuleStrategy::ExecutableName,
        ModuleStrategy::NoModule,
    ];

    fn module(self) -> Result<Option<HINSTANCE>, String> {
        match self {
            ModuleStrategy::CurrentProcess => unsafe { GetModuleHandleW(PCWSTR::null()) }
                .map(|m| Some(HINSTANCE::from(m)))
                .map_err(|e| e.to_string()),
            ModuleStrategy::ExecutableName => {
                let exe = std::env::current_exe().map_err(|e| e.to_string())?;
                let name = exe
                    .file_name()
                    .ok_or_else(|| "executable has no file name".to_string())?;
                let name = HSTRING::from(name.to_string_lossy().as_ref());
                unsafe { GetModuleHandleW(&name) }
                    .map(|m| Some(HINSTANCE::from(m)))
                    .map_err(|e| e.to_string())
            }
            ModuleStrategy::NoModule => Ok(None),
        }
    }
}

impl fmt::Display for ModuleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleStrategy::CurrentProcess => write!(f, "GetModuleHandleW(NULL)"),
            ModuleStrategy::ExecutableName => write!(f, "GetModuleHandleW(<exe name>)"),
            ModuleStrategy::NoModule => write!(f, "no module handle"),
        }
    }
}

/// Posts `WM_QUIT` to the thread that owns the hook.
struct ThreadQuit(u32);

impl QuitSignal for ThreadQuit {
    fn post_quit(&self) {
        unsafe {
            let _ = PostThreadMessageW(self.0, WM_QUIT, WPARAM(0), LPARAM(0));
        }
    }
}

/// Low-level keyboard hook owned by the thread that registers it.
///
/// The hook only receives events while that thread is inside [`pump`].
///
/// [`pump`]: InterceptionService::pump
#[derive(Default)]
pub struct KeyboardHook {
    hook_handle: Option<HHOOK>,
}

impl KeyboardHook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InterceptionService for KeyboardHook {
    fn register(&mut self, interceptor: KeyboardInterceptor) -> Result<(), HookError> {
        if self.hook_handle.is_some() || INTERCEPTOR.get().is_some() {
            return Err(HookError::AlreadyInstalled);
        }

        // Force create message queue so WM_QUIT can be posted right away
        unsafe {
            let mut msg = MSG::default();
            let _ = PeekMessageW(&mut msg, None, WM_USER, WM_USER, PM_NOREMOVE);
        }

        let mut attempts = Vec::with_capacity(ModuleStrategy::ALL.len());
        let mut os_code = 0;
        for strategy in ModuleStrategy::ALL {
            let module = match strategy.module() {
                Ok(module) => module,
                Err(e) => {
                    attempts.push(RegistrationAttempt {
                        strategy: strategy.to_string(),
                        outcome: format!("module lookup failed: {e}"),
                    });
                    continue;
                }
            };

            match unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_proc), module, 0) } {
                Ok(hook) => {
                    if INTERCEPTOR.set(interceptor.clone()).is_err() {
                        unsafe {
                            let _ = UnhookWindowsHookEx(hook);
                        }
                        return Err(HookError::AlreadyInstalled);
                    }
                    self.hook_handle = Some(hook);
                    let thread_id = unsafe { GetCurrentThreadId() };
                    interceptor
                        .state()
                        .set_quit_signal(Arc::new(ThreadQuit(thread_id)));
                    debug!(%strategy, thread_id, "keyboard hook installed");
                    return Ok(());
                }
                Err(e) => {
                    os_code = e.code().0;
                    attempts.push(RegistrationAttempt {
                        strategy: strategy.to_string(),
                        outcome: e.message(),
                    });
                }
            }
        }

        Err(HookError::Registration { attempts, os_code })
    }

    fn pump(&mut self) -> anyhow::Result<()> {
        unsafe {
            let mut msg = MSG::default();
            loop {
                let result = GetMessageW(&mut msg, None, 0, 0);
                if result.0 == -1 {
                    anyhow::bail!(
                        "Message loop failed: {}",
                        std::io::Error::last_os_error()
                    );
                }
                if result.0 == 0 {
                    break;
                }

                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        Ok(())
    }

    fn unregister(&mut self) -> anyhow::Result<()> {
        if let Some(hook) = self.hook_handle.take() {
            unsafe { UnhookWindowsHookEx(hook) }?;
            debug!("keyboard hook removed");
        }
        Ok(())
    }
}

impl Drop for KeyboardHook {
    fn drop(&mut self) {
        if let Some(hook) = self.hook_handle.take() {
            unsafe {
                let _ = UnhookWindowsHookEx(hook);
            }
        }
    }
}

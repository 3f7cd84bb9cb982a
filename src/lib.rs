//! Core modules for the keymouse keyboard-driven mouse.
//!
//! The library exposes the platform-neutral engine so it can be tested
//! without a Windows session. It is not intended for external use.

pub mod config;
pub mod emitter;
pub mod error;
pub mod keyboard;
pub mod lifecycle;
pub mod logging;
#[cfg(windows)]
pub mod signal;
pub mod state;
pub mod translator;
pub mod util;
pub mod volume;

// Re-export types for test modules
pub use config::{AppConfig, KeyBinding};
pub use lifecycle::{Coordinator, InterceptionService};

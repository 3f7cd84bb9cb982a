//! Startup and shutdown ordering.
//!
//! [`Coordinator::run`] walks the phases in order: register the hook, start
//! the translator, pump messages until asked to quit, then stop the
//! translator, release anything still held down and remove the hook. The
//! release step runs on every exit path, whether or not the translator
//! stopped in time.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::emitter::InputEmitter;
use crate::error::HookError;
use crate::keyboard::KeyboardInterceptor;
use crate::state::{AppState, KeyTable, MouseButton, Phase};
use crate::translator::Translator;
use crate::volume::VolumeHandle;

/// OS key interception facility.
///
/// `register` and `pump` are called on the same thread; the hook only
/// delivers events while that thread is pumping.
pub trait InterceptionService {
    fn register(&mut self, interceptor: KeyboardInterceptor) -> Result<(), HookError>;
    /// Blocks until a quit message arrives.
    fn pump(&mut self) -> anyhow::Result<()>;
    fn unregister(&mut self) -> anyhow::Result<()>;
}

struct Worker {
    handle: JoinHandle<()>,
    done: Receiver<()>,
}

pub struct Coordinator {
    state: Arc<AppState>,
    config: AppConfig,
    table: Arc<KeyTable>,
    emitter: Arc<dyn InputEmitter>,
    volume: VolumeHandle,
}

impl Coordinator {
    pub fn new(
        state: Arc<AppState>,
        config: AppConfig,
        table: Arc<KeyTable>,
        emitter: Arc<dyn InputEmitter>,
        volume: VolumeHandle,
    ) -> Self {
        Self {
            state,
            config,
            table,
            emitter,
            volume,
        }
    }

    /// Runs the program to completion on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`HookError`] (wrapped in `anyhow`) if the hook cannot be
    /// installed or the translator cannot be started, and the pump's error
    /// if the message loop fails. Held input is released before any error
    /// after registration is returned.
    pub fn run<S: InterceptionService>(&self, service: &mut S) -> anyhow::Result<()> {
        let interceptor = KeyboardInterceptor::new(
            self.state.clone(),
            self.table.clone(),
            self.emitter.clone(),
            self.volume.clone(),
        );
        service.register(interceptor)?;
        self.state.set_phase(Phase::HookInstalled);
        info!("keyboard hook installed");

        // a shutdown request that arrived before the quit signal existed
        // has nothing to wake the pump
        if self.state.should_exit() {
            debug!("shutdown requested during startup");
            self.shutdown(service, None);
            return Ok(());
        }

        let worker = match self.spawn_translator() {
            Ok(worker) => worker,
            Err(e) => {
                self.shutdown(service, None);
                return Err(HookError::Worker(e).into());
            }
        };

        self.state.set_phase(Phase::Running);
        debug!("message loop started");
        let pumped = service.pump();
        if let Err(e) = &pumped {
            warn!(error = %e, "message loop ended abnormally");
        }

        self.shutdown(service, Some(worker));
        pumped
    }

    fn spawn_translator(&self) -> std::io::Result<Worker> {
        let (done_tx, done) = crossbeam_channel::bounded(1);
        let mut translator = Translator::new(
            &self.config,
            &self.state,
            &self.table,
            self.emitter.clone(),
            self.volume.clone(),
        );
        let state = self.state.clone();

        let handle = thread::Builder::new()
            .name("translator".to_string())
            .spawn(move || {
                if panic::catch_unwind(AssertUnwindSafe(|| translator.run(&state))).is_err() {
                    error!("translator crashed, shutting down");
                    state.request_shutdown();
                }
                let _ = done_tx.send(());
            })?;

        Ok(Worker { handle, done })
    }

    fn shutdown<S: InterceptionService>(&self, service: &mut S, worker: Option<Worker>) {
        self.state.set_phase(Phase::ShuttingDown);
        debug!("shutting down");
        self.state.exit();

        let stopped = match worker {
            Some(worker) => match worker.done.recv_timeout(self.config.shutdown_timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    let _ = worker.handle.join();
                    true
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        timeout_ms = self.config.shutdown_timeout.as_millis() as u64,
                        "translator did not stop in time"
                    );
                    false
                }
            },
            None => true,
        };

        self.release_held_input(stopped);

        if let Err(e) = service.unregister() {
            warn!(error = %e, "failed to remove keyboard hook");
        }
        self.state.set_phase(Phase::Terminated);
        info!("stopped");
    }

    /// Releases buttons and modifiers the OS may still consider down.
    /// Repeated releases are harmless.
    fn release_held_input(&self, translator_stopped: bool) {
        match self.state.end_drag() {
            Some(button) => self.emitter.button_up(button),
            // a stuck translator may be between its down and our snapshot
            None if !translator_stopped => self.emitter.button_up(MouseButton::Left),
            None => {}
        }
        if let Some(code) = self.state.take_synthetic_modifier() {
            self.emitter.key_up(code);
        }
        self.state.clear_pressed();
    }
}

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use std::sync::Arc;

    use anyhow::Result;
    use keymouse::emitter::SendInputEmitter;
    use keymouse::error::HookError;
    use keymouse::keyboard::KeyboardHook;
    use keymouse::state::{self, AppState, KeyTable};
    use keymouse::volume::{self, EndpointVolume, VolumeHandle};
    use keymouse::{AppConfig, Coordinator, logging, signal};
    use tracing::{error, info};
    use windows::Win32::Media::{timeBeginPeriod, timeEndPeriod};
    use windows::Win32::UI::WindowsAndMessaging::SetProcessDPIAware;

    fn run() -> Result<()> {
        let config = AppConfig::default();
        config.validate()?;
        let table = Arc::new(KeyTable::from_config(&config)?);

        let app_state = Arc::new(AppState::new(config.start_active));
        state::set_global_state(app_state.clone())
            .map_err(|_| anyhow::anyhow!("Global state has already been set"))?;
        signal::set_control_ctrl_handler()?;

        let (volume, requests) = VolumeHandle::channel();
        let volume_worker = volume::spawn_volume_worker(requests, EndpointVolume::open)?;

        for line in table.legend() {
            info!("{line}");
        }
        info!(
            px_per_sec = config.pixels_per_second(config.initial_step),
            notches_per_sec = 1000 / config.scroll_interval.as_millis().max(1) as u64,
            "mouse mode {}",
            if config.start_active { "enabled" } else { "disabled" }
        );
        info!("script keys pass through while Ctrl or the Windows key is held");

        let coordinator = Coordinator::new(
            app_state,
            config,
            table,
            Arc::new(SendInputEmitter::new()),
            volume.clone(),
        );
        let result = coordinator.run(&mut KeyboardHook::new());

        volume.shutdown();
        let _ = volume_worker.join();

        if let Err(e) = &result
            && let Some(HookError::Registration { .. }) = e.downcast_ref::<HookError>()
        {
            error!("{e}");
            error!("Try running from an elevated (Administrator) prompt");
        }
        result
    }

    logging::init_tracing()?;
    keymouse::keyboard::install_panic_hook();

    // Request 1ms timer resolution so the 10ms tick stays even
    unsafe {
        timeBeginPeriod(1);
        let _ = SetProcessDPIAware();
    }

    let result = run();

    unsafe { timeEndPeriod(1) };
    result
}

#[cfg(not(windows))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("keymouse relies on the Windows low-level keyboard hook and only runs on Windows")
}

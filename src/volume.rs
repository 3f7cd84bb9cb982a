//! Master volume control.
//!
//! Requests travel over an unbounded channel to a dedicated thread, so the
//! keyboard hook can ask for a volume change without ever blocking.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::error::VolumeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeRequest {
    /// Absolute level in percent, clamped to 100.
    Set(u8),
    /// Relative change in percent, clamped to 0..=100.
    Adjust(i8),
    Shutdown,
}

pub trait VolumeControl {
    fn set_master_volume_percent(&self, percent: u8) -> Result<(), VolumeError>;
    fn master_volume_percent(&self) -> Result<u8, VolumeError>;
}

/// Sending side of the volume thread's queue.
#[derive(Debug, Clone)]
pub struct VolumeHandle {
    sender: Sender<VolumeRequest>,
}

impl VolumeHandle {
    pub fn channel() -> (Self, Receiver<VolumeRequest>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }

    /// Never blocks; a request is dropped if the volume thread is gone.
    #[inline]
    pub fn request(&self, request: VolumeRequest) {
        let _ = self.sender.try_send(request);
    }

    pub fn set_percent(&self, percent: u8) {
        self.request(VolumeRequest::Set(percent));
    }

    pub fn adjust(&self, delta: i8) {
        self.request(VolumeRequest::Adjust(delta));
    }

    pub fn shutdown(&self) {
        self.request(VolumeRequest::Shutdown);
    }
}

/// Applies one request. Returns the level that was set.
pub fn apply(
    control: &dyn VolumeControl,
    request: VolumeRequest,
) -> Result<Option<u8>, VolumeError> {
    let target = match request {
        VolumeRequest::Set(percent) => percent.min(100),
        VolumeRequest::Adjust(delta) => {
            let current = i16::from(control.master_volume_percent()?);
            (current + i16::from(delta)).clamp(0, 100) as u8
        }
        VolumeRequest::Shutdown => return Ok(None),
    };
    control.set_master_volume_percent(target)?;
    Ok(Some(target))
}

/// Drains requests until `Shutdown` arrives or every sender is dropped.
/// Failures are logged and never stop the loop.
pub fn serve(control: &dyn VolumeControl, receiver: &Receiver<VolumeRequest>) {
    while let Ok(request) = receiver.recv() {
        if request == VolumeRequest::Shutdown {
            break;
        }
        match apply(control, request) {
            Ok(Some(level)) => tracing::info!(level, "master volume set"),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, ?request, "volume change failed"),
        }
    }
}

/// Starts the volume thread. `open` runs on that thread, so per-thread
/// initialisation (COM) happens where the control is used.
///
/// If `open` fails the thread keeps draining the queue so senders never
/// notice, and every request is reported as a warning.
pub fn spawn_volume_worker<C, F>(
    receiver: Receiver<VolumeRequest>,
    open: F,
) -> std::io::Result<JoinHandle<()>>
where
    C: VolumeControl,
    F: FnOnce() -> Result<C, VolumeError> + Send + 'static,
{
    thread::Builder::new()
        .name("volume".to_string())
        .spawn(move || match open() {
            Ok(control) => serve(&control, &receiver),
            Err(e) => {
                tracing::warn!(error = %e, "volume control unavailable");
                while let Ok(request) = receiver.recv() {
                    if request == VolumeRequest::Shutdown {
                        break;
                    }
                    tracing::warn!(?request, "volume control unavailable, request dropped");
                }
            }
        })
}

#[cfg(windows)]
pub use endpoint::EndpointVolume;

#[cfg(windows)]
mod endpoint {
    use windows::Win32::Media::Audio::Endpoints::IAudioEndpointVolume;
    use windows::Win32::Media::Audio::{
        IMMDeviceEnumerator, MMDeviceEnumerator, eConsole, eRender,
    };
    use windows::Win32::System::Com::{
        CLSCTX_ALL, COINIT_MULTITHREADED, CoCreateInstance, CoInitializeEx,
    };

    use super::VolumeControl;
    use crate::error::VolumeError;

    /// Default render endpoint volume through Core Audio.
    pub struct EndpointVolume {
        endpoint: IAudioEndpointVolume,
    }

    impl EndpointVolume {
        /// Initialises COM on the calling thread and binds the default
        /// playback device.
        pub fn open() -> Result<Self, VolumeError> {
            unsafe {
                CoInitializeEx(None, COINIT_MULTITHREADED)
                    .ok()
                    .map_err(|e| VolumeError::Endpoint(e.to_string()))?;
                let enumerator: IMMDeviceEnumerator =
                    CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                        .map_err(|e| VolumeError::Endpoint(e.to_string()))?;
                let device = enumerator
                    .GetDefaultAudioEndpoint(eRender, eConsole)
                    .map_err(|e| VolumeError::Endpoint(e.to_string()))?;
                let endpoint = device
                    .Activate::<IAudioEndpointVolume>(CLSCTX_ALL, None)
                    .map_err(|e| VolumeError::Endpoint(e.to_string()))?;
                Ok(Self { endpoint })
            }
        }
    }

    impl VolumeControl for EndpointVolume {
        fn set_master_volume_percent(&self, percent: u8) -> Result<(), VolumeError> {
            let level = f32::from(percent.min(100)) / 100.0;
            unsafe {
                self.endpoint
                    .SetMasterVolumeLevelScalar(level, std::ptr::null())?;
            }
            Ok(())
        }

        fn master_volume_percent(&self) -> Result<u8, VolumeError> {
            let level = unsafe { self.endpoint.GetMasterVolumeLevelScalar()? };
            Ok((level * 100.0).round().clamp(0.0, 100.0) as u8)
        }
    }
}

//! Audio output using cpal
//!
//! `cpal::Stream` is not `Send` on every host, so each opened stream lives on
//! a dedicated thread that owns it and obeys start/pause commands sent over a
//! channel. Dropping the handle shuts the thread down and releases the device.

use bridge_traits::{
    error::{BridgeError, Result},
    AudioOutputDevice, OutputStream, PcmFormat, RenderCallback,
};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// Output device backed by the host's audio API via cpal.
#[derive(Debug, Clone, Default)]
pub struct CpalOutputDevice {
    /// `None` selects the host default.
    device_name: Option<String>,
}

impl CpalOutputDevice {
    /// The host's default output device.
    pub fn default_device() -> Self {
        Self::default()
    }

    /// A named device, falling back to the default when it is missing.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    /// List available audio output devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| BridgeError::AudioDevice(format!("Failed to enumerate devices: {e}")))?
            .filter_map(|device| device.name().ok())
            .collect();
        Ok(devices)
    }

    fn resolve(name: Option<&str>) -> Result<cpal::Device> {
        let host = cpal::default_host();
        if let Some(name) = name {
            let found = host
                .output_devices()
                .map_err(|e| BridgeError::AudioDevice(format!("Failed to enumerate devices: {e}")))?
                .find(|d| d.name().ok().as_deref() == Some(name));
            match found {
                Some(device) => return Ok(device),
                None => warn!(device = name, "Requested device not found, using default"),
            }
        }
        host.default_output_device()
            .ok_or_else(|| BridgeError::AudioDevice("No default output device found".to_string()))
    }
}

enum Command {
    Start,
    Pause,
    Shutdown,
}

/// Handle to a stream owned by its device thread.
pub struct CpalOutputStream {
    commands: Sender<(Command, Sender<Result<()>>)>,
    thread: Option<JoinHandle<()>>,
}

impl CpalOutputStream {
    fn send(&self, command: Command) -> Result<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .send((command, reply_tx))
            .map_err(|_| BridgeError::AudioDevice("Output thread has exited".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| BridgeError::AudioDevice("Output thread has exited".to_string()))?
    }
}

impl OutputStream for CpalOutputStream {
    fn start(&mut self) -> Result<()> {
        self.send(Command::Start)
    }

    fn pause(&mut self) -> Result<()> {
        self.send(Command::Pause)
    }
}

impl Drop for CpalOutputStream {
    fn drop(&mut self) {
        let _ = self.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_stream(
    device_name: Option<String>,
    format: PcmFormat,
    callback: Arc<dyn RenderCallback>,
    ready: Sender<Result<()>>,
    commands: Receiver<(Command, Sender<Result<()>>)>,
) {
    let built = CpalOutputDevice::resolve(device_name.as_deref()).and_then(|device| {
        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Opening audio output"
        );
        let config = cpal::StreamConfig {
            channels: format.channels,
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| callback.render(data),
                |err| error!(error = %err, "Audio stream error"),
                None,
            )
            .map_err(|e| BridgeError::AudioDevice(format!("Failed to build output stream: {e}")))?;
        // Streams may start running on creation; the contract says paused.
        stream
            .pause()
            .map_err(|e| BridgeError::AudioDevice(format!("Failed to pause stream: {e}")))?;
        Ok(stream)
    });

    let stream = match built {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };

    while let Ok((command, reply)) = commands.recv() {
        let result = match command {
            Command::Start => stream
                .play()
                .map_err(|e| BridgeError::AudioDevice(format!("Failed to start stream: {e}"))),
            Command::Pause => stream
                .pause()
                .map_err(|e| BridgeError::AudioDevice(format!("Failed to pause stream: {e}"))),
            Command::Shutdown => {
                let _ = reply.send(Ok(()));
                break;
            }
        };
        let _ = reply.send(result);
    }
    debug!("Audio output thread exiting");
}

impl AudioOutputDevice for CpalOutputDevice {
    fn name(&self) -> String {
        self.device_name
            .clone()
            .unwrap_or_else(|| "default".to_string())
    }

    fn open(
        &self,
        format: PcmFormat,
        callback: Arc<dyn RenderCallback>,
    ) -> Result<Box<dyn OutputStream>> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();
        let device_name = self.device_name.clone();

        let thread = std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || run_stream(device_name, format, callback, ready_tx, command_rx))
            .map_err(|e| BridgeError::AudioDevice(format!("Failed to spawn output thread: {e}")))?;

        ready_rx
            .recv()
            .map_err(|_| BridgeError::AudioDevice("Output thread exited early".to_string()))??;

        Ok(Box::new(CpalOutputStream {
            commands: command_tx,
            thread: Some(thread),
        }))
    }
}

//! Real-time output through [cpal](https://crates.io/crates/cpal).
//!
//! [`CpalHost`] opens an output stream per context and moves the context's
//! [`GraphRenderer`](crate::GraphRenderer) into the stream callback. The
//! stream is owned by the context and dropped when the context is closed.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sintetico_io::{AudioHost, BackendStreamConfig, CpalHost};
//!
//! let host = CpalHost::new(BackendStreamConfig::default()).start_suspended(true);
//! let mut ctx = host.create_context()?;
//! // Build the graph, then:
//! ctx.resume()?;
//! ```

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::backend::{AudioContext, AudioHost, BackendStreamConfig, StreamHandle};
use crate::context::SoftwareContext;
use crate::{Error, Result};

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &cpal::Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Output device information.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Whether this is the system default output.
    pub is_default: bool,
}

/// List the output devices of the platform's default audio host.
pub fn list_output_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| device_name(&d).ok());

    let outputs = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?;

    let mut devices = Vec::new();
    for device in outputs {
        if let Ok(name) = device_name(&device) {
            let default_sample_rate = device
                .default_output_config()
                .map(|c| c.sample_rate())
                .unwrap_or(48000);
            let is_default = default_name.as_deref() == Some(name.as_str());
            devices.push(AudioDevice {
                name,
                default_sample_rate,
                is_default,
            });
        }
    }
    Ok(devices)
}

/// cpal-backed [`AudioHost`].
///
/// Each [`create_context`](AudioHost::create_context) opens a fresh output
/// stream on the configured device. Failure to find a device or build the
/// stream surfaces as [`Error::ContextUnavailable`].
#[derive(Debug, Clone)]
pub struct CpalHost {
    config: BackendStreamConfig,
    start_suspended: bool,
}

impl CpalHost {
    /// Create a host for the given stream configuration.
    pub fn new(config: BackendStreamConfig) -> Self {
        tracing::info!(
            host = cpal::default_host().id().name(),
            "cpal host initialized"
        );
        Self {
            config,
            start_suspended: false,
        }
    }

    /// Start new contexts suspended, as browsers and mobile platforms do until
    /// a user gesture.
    pub fn start_suspended(mut self, suspended: bool) -> Self {
        self.start_suspended = suspended;
        self
    }

    /// The stream configuration used for new contexts.
    pub fn config(&self) -> &BackendStreamConfig {
        &self.config
    }

    /// Find an output device by case-insensitive substring, or the default.
    fn find_output_device(&self, host: &cpal::Host) -> Result<cpal::Device> {
        match self.config.device_name.as_deref() {
            Some(search) => {
                let search_lower = search.to_lowercase();
                let devices = host
                    .output_devices()
                    .map_err(|e| Error::Stream(e.to_string()))?;

                for device in devices {
                    if let Ok(dev_name) = device_name(&device)
                        && dev_name.to_lowercase().contains(search_lower.as_str())
                    {
                        return Ok(device);
                    }
                }
                Err(Error::DeviceNotFound(format!(
                    "no output device matching '{}'",
                    search
                )))
            }
            None => host.default_output_device().ok_or(Error::NoDevice),
        }
    }

    fn open(&self) -> Result<Box<dyn AudioContext>> {
        let host = cpal::default_host();
        let device = self.find_output_device(&host)?;

        let (mut context, mut renderer) =
            SoftwareContext::new(self.config.sample_rate as f32, self.start_suspended);
        let channels = usize::from(self.config.channels);

        let stream_config = cpal::StreamConfig {
            channels: self.config.channels,
            sample_rate: self.config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(self.config.buffer_size),
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    renderer.render(data, channels);
                },
                move |err| {
                    tracing::error!(error = %err, "output stream error");
                },
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            channels = self.config.channels,
            sample_rate = self.config.sample_rate,
            buffer_size = self.config.buffer_size,
            "output stream started"
        );

        context.attach_stream(StreamHandle::new(stream));
        Ok(Box::new(context))
    }
}

impl Default for CpalHost {
    fn default() -> Self {
        Self::new(BackendStreamConfig::default())
    }
}

impl AudioHost for CpalHost {
    fn name(&self) -> &str {
        "cpal"
    }

    fn create_context(&self) -> Result<Box<dyn AudioContext>> {
        self.open().map_err(|e| {
            tracing::warn!(error = %e, "cpal context unavailable");
            match e {
                Error::ContextUnavailable(_) => e,
                other => Error::ContextUnavailable(other.to_string()),
            }
        })
    }
}

//! System audio device output via cpal.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::output::{AudioOutput, OutputHandle, Renderer};
use crate::error::OutputError;
use crate::state::OutputFormat;

/// Plays through the host's default output device.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalOutput;

impl AudioOutput for CpalOutput {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn start(&self, format: &OutputFormat, renderer: Renderer) -> Result<OutputHandle, OutputError> {
        format.validate().map_err(OutputError::InvalidFormat)?;
        let format = *format;

        // cpal::Stream is not Send, so it is created and dropped on the output thread.
        OutputHandle::spawn(self.name(), move |ready, shutdown| {
            let stream = match open_stream(&format, renderer) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready.send(Err(e));
                    return;
                }
            };
            let _ = ready.send(Ok(()));
            let _ = shutdown.recv();
            drop(stream);
        })
    }
}

fn open_stream(format: &OutputFormat, renderer: Renderer) -> Result<cpal::Stream, OutputError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| OutputError::Init("no default output device".into()))?;

    let device_name = device.name().unwrap_or_else(|_| "unknown".into());
    log::info!(
        "[Output] Opening '{}' at {} Hz, {} channel(s), {} frame buffer",
        device_name,
        format.sample_rate,
        format.channels,
        format.buffer_size
    );

    let config = cpal::StreamConfig {
        channels: format.channels,
        sample_rate: cpal::SampleRate(format.sample_rate),
        buffer_size: cpal::BufferSize::Fixed(format.buffer_size as u32),
    };

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| renderer.render(data),
            |err| log::error!("[Output] Stream error: {}", err),
            None,
        )
        .map_err(|e| OutputError::Init(e.to_string()))?;

    stream
        .play()
        .map_err(|e| OutputError::Init(e.to_string()))?;
    Ok(stream)
}

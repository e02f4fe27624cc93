use std::sync::{Arc, Mutex};

use cpal::{traits::*, Sample};

use crate::audio::clock::ClockTime;
use crate::audio::rack::VoiceRack;
use crate::error::EngineError;

/// cpal output stream rendering the voice rack. The stream callback is the
/// only place output time advances, so [`ClockTime`] stays in step with
/// what the device has been asked to play even when the rack is busy.
pub struct AudioOutput {
    _stream: cpal::Stream,
}

impl AudioOutput {
    pub fn new(rack: Arc<Mutex<VoiceRack>>, time: ClockTime) -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::AudioUnavailable)?;

        let config = device
            .default_output_config()
            .map_err(|_| EngineError::AudioUnavailable)?;

        let sample_rate = config.sample_rate().0;
        time.set_sample_rate(sample_rate);
        if let Ok(mut rack) = rack.lock() {
            rack.set_sample_rate(sample_rate as f32);
        }

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => Self::run::<f32>(&device, &config.into(), rack, time)?,
            cpal::SampleFormat::I16 => Self::run::<i16>(&device, &config.into(), rack, time)?,
            cpal::SampleFormat::U16 => Self::run::<u16>(&device, &config.into(), rack, time)?,
            _ => return Err(EngineError::AudioUnavailable),
        };

        // A refusal to play is the platform gating output on a user
        // gesture; the caller surfaces it and retries after one.
        stream
            .play()
            .map_err(|_| EngineError::NeedsUserInteraction)?;

        Ok(AudioOutput { _stream: stream })
    }

    fn run<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        rack: Arc<Mutex<VoiceRack>>,
        time: ClockTime,
    ) -> Result<cpal::Stream, EngineError>
    where
        T: Sample + cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    match rack.try_lock() {
                        Ok(mut rack) => {
                            for frame in data.chunks_mut(channels) {
                                time.advance_frames(1);
                                let sample = rack.next_sample(time.now());

                                // Limiting and NaN protection
                                let sample = if sample.is_finite() {
                                    sample.clamp(-0.95, 0.95)
                                } else {
                                    0.0
                                };

                                for out in frame.iter_mut() {
                                    *out = T::from_sample(sample);
                                }
                            }
                        }
                        Err(_) => {
                            // Rack briefly held elsewhere: output silence,
                            // but keep the clock moving with real output.
                            time.advance_frames((data.len() / channels.max(1)) as u64);
                            for out in data.iter_mut() {
                                *out = T::from_sample(0.0);
                            }
                        }
                    }
                },
                |err| log::error!("audio stream error: {}", err),
                None,
            )
            .map_err(|_| EngineError::AudioUnavailable)?;

        Ok(stream)
    }
}

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use thiserror::Error;
use tracing::{info, warn};

use super::onset::{ChunkFeed, OnsetInput};

/// Mono samples per analysis chunk; long enough for two periods of a low E string at 48kHz.
pub(crate) const CHUNK_SAMPLES: usize = 1024;

#[derive(Debug, Error)]
pub(crate) enum CaptureError {
    #[error("no default audio input device")]
    NoInputDevice,
    #[error("failed to query input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("unsupported input sample format {0:?}")]
    UnsupportedFormat(SampleFormat),
    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// Downmixes interleaved frames to mono and cuts them into fixed-size chunks.
/// Frames split across callbacks are carried over.
#[derive(Debug)]
pub(crate) struct MonoChunker {
    channels: usize,
    chunk_len: usize,
    pending: Vec<f32>,
    frame_sum: f32,
    frame_fill: usize,
}

impl MonoChunker {
    pub(crate) fn new(channels: usize, chunk_len: usize) -> Self {
        let chunk_len = chunk_len.max(1);
        Self {
            channels: channels.max(1),
            chunk_len,
            pending: Vec::with_capacity(chunk_len),
            frame_sum: 0.0,
            frame_fill: 0,
        }
    }

    pub(crate) fn push_interleaved<I, F>(&mut self, samples: I, mut emit: F)
    where
        I: IntoIterator<Item = f32>,
        F: FnMut(Vec<f32>),
    {
        for sample in samples {
            self.frame_sum += sample;
            self.frame_fill += 1;
            if self.frame_fill < self.channels {
                continue;
            }
            self.pending.push(self.frame_sum / self.channels as f32);
            self.frame_sum = 0.0;
            self.frame_fill = 0;
            if self.pending.len() == self.chunk_len {
                emit(std::mem::take(&mut self.pending));
                self.pending.reserve(self.chunk_len);
            }
        }
    }
}

/// The default input device and the config it will be opened with.
pub(crate) struct InputDevice {
    device: cpal::Device,
    config: StreamConfig,
    format: SampleFormat,
}

impl InputDevice {
    pub(crate) fn open_default() -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;
        let supported = device.default_input_config()?;
        let format = supported.sample_format();
        Ok(Self {
            device,
            config: supported.config(),
            format,
        })
    }

    pub(crate) fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub(crate) fn name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Starts capturing. Chunks go to `feed` until the returned stream is dropped.
    pub(crate) fn start(&self, feed: ChunkFeed) -> Result<Stream, CaptureError> {
        let stream = match self.format {
            SampleFormat::F32 => self.build::<f32>(feed)?,
            SampleFormat::I16 => self.build::<i16>(feed)?,
            SampleFormat::U16 => self.build::<u16>(feed)?,
            other => return Err(CaptureError::UnsupportedFormat(other)),
        };
        stream.play()?;
        Ok(stream)
    }

    fn build<T>(&self, feed: ChunkFeed) -> Result<Stream, CaptureError>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let mut chunker = MonoChunker::new(usize::from(self.config.channels), CHUNK_SAMPLES);
        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mono = data.iter().map(|&sample| sample.to_sample::<f32>());
                chunker.push_interleaved(mono, |chunk| {
                    feed.push(chunk);
                });
            },
            |err| warn!(error = %err, "input_stream_error"),
            None,
        )?;
        Ok(stream)
    }
}

/// Live microphone feeding an onset worker. Both halves live on the main thread for the
/// length of the run.
pub(crate) struct OnsetCapture {
    stream: Stream,
    input: OnsetInput,
}

impl OnsetCapture {
    /// On failure the worker is shut down before the error is returned.
    pub(crate) fn start(device: &InputDevice, input: OnsetInput) -> Result<Self, CaptureError> {
        match device.start(input.feeder()) {
            Ok(stream) => {
                info!(
                    device = %device.name(),
                    sample_rate = device.sample_rate(),
                    chunk_samples = CHUNK_SAMPLES,
                    "microphone_capture_started"
                );
                Ok(Self { stream, input })
            }
            Err(err) => {
                input.shutdown();
                Err(err)
            }
        }
    }

    /// Stops the stream first so the worker sees its feed close, then joins it.
    pub(crate) fn stop(self) -> u64 {
        drop(self.stream);
        self.input.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(chunker: &mut MonoChunker, samples: &[f32]) -> Vec<Vec<f32>> {
        let mut chunks = Vec::new();
        chunker.push_interleaved(samples.iter().copied(), |chunk| chunks.push(chunk));
        chunks
    }

    #[test]
    fn stereo_frames_are_averaged_into_chunks() {
        let mut chunker = MonoChunker::new(2, 2);

        let chunks = collect(&mut chunker, &[1.0, 3.0, -1.0, 1.0, 0.5, 0.5]);

        assert_eq!(chunks, vec![vec![2.0, 0.0]]);
        assert_eq!(chunker.pending, vec![0.5]);
    }

    #[test]
    fn frames_split_across_callbacks_are_carried_over() {
        let mut chunker = MonoChunker::new(2, 2);

        assert!(collect(&mut chunker, &[1.0, 3.0, 4.0]).is_empty());
        let chunks = collect(&mut chunker, &[0.0, 7.0]);

        assert_eq!(chunks, vec![vec![2.0, 2.0]]);
        assert_eq!(chunker.frame_fill, 1);
    }

    #[test]
    fn zero_channels_is_treated_as_mono() {
        let mut chunker = MonoChunker::new(0, 3);

        let chunks = collect(&mut chunker, &[0.1, 0.2, 0.3, 0.4]);

        assert_eq!(chunks, vec![vec![0.1, 0.2, 0.3]]);
    }
}

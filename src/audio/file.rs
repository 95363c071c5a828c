use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use super::backend::{AudioChunk, FrameSource};

/// Streams a 16-bit PCM WAV recording as fixed-duration chunks
pub struct WavFrameSource {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    samples: Vec<i16>,
    samples_per_frame: usize,
    position: usize,
}

impl WavFrameSource {
    pub fn open(path: impl AsRef<Path>, frame_duration: Duration) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .context("Failed to open WAV file")?;

        let spec = reader.spec();
        anyhow::ensure!(
            spec.sample_format == SampleFormat::Int && spec.bits_per_sample == 16,
            "Expected 16-bit PCM, got {} bits ({:?})",
            spec.bits_per_sample,
            spec.sample_format
        );

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds = samples.len() as f64 /
            (spec.sample_rate as f64 * spec.channels as f64);

        // Whole sample frames only, so channels never get split across chunks
        let frames_per_chunk =
            (spec.sample_rate as u128 * frame_duration.as_millis() / 1000).max(1) as usize;
        let samples_per_frame = frames_per_chunk * spec.channels as usize;

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
            samples_per_frame,
            position: 0,
        })
    }

    fn duration_of(&self, samples: usize) -> Duration {
        let frames = (samples / self.channels.max(1) as usize) as u64;
        Duration::from_nanos(frames * 1_000_000_000 / self.sample_rate.max(1) as u64)
    }
}

#[async_trait::async_trait]
impl FrameSource for WavFrameSource {
    async fn next_frame(&mut self) -> Result<Option<AudioChunk>> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }

        let end = (self.position + self.samples_per_frame).min(self.samples.len());
        let slice = &self.samples[self.position..end];

        let pcm: Vec<u8> = slice.iter().flat_map(|s| s.to_le_bytes()).collect();
        let chunk = AudioChunk {
            pcm,
            sample_rate: self.sample_rate,
            channels: self.channels,
            offset: self.duration_of(self.position),
            duration: self.duration_of(slice.len()),
        };

        self.position = end;
        Ok(Some(chunk))
    }

    fn name(&self) -> &str {
        &self.path
    }
}

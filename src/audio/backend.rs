use anyhow::Result;
use std::time::Duration;

/// A slice of captured audio ready to be streamed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// 16-bit little-endian PCM, interleaved
    pub pcm: Vec<u8>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Offset of the first sample since capture started
    pub offset: Duration,
    /// Playback length of this chunk
    pub duration: Duration,
}

/// Producer of audio chunks for the realtime connection
///
/// Implementations:
/// - File: read from a WAV recording (for testing/replaying meetings)
///
/// The connection manager does not pace frames; callers use
/// `AudioChunk::duration` to stream in real time.
#[async_trait::async_trait]
pub trait FrameSource: Send {
    /// Next chunk, or `None` once the source is exhausted
    async fn next_frame(&mut self) -> Result<Option<AudioChunk>>;

    /// Source name for logging
    fn name(&self) -> &str;
}

// Integration tests for WAV frame streaming
//
// These tests write small WAV files with hound and verify that they are cut
// into correctly sized PCM chunks.

use anyhow::Result;
use meeting_realtime::audio::{FrameSource, WavFrameSource};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn write_wav(dir: &Path, name: &str, sample_rate: u32, channels: u16, samples: &[i16]) -> Result<PathBuf> {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(path)
}

#[tokio::test]
async fn test_wav_source_splits_into_frames() -> Result<()> {
    let temp_dir = TempDir::new()?;

    // 250ms of 16kHz mono = 4000 samples
    let samples: Vec<i16> = (0..4000).map(|i| (i % 100) as i16).collect();
    let path = write_wav(temp_dir.path(), "mono.wav", 16000, 1, &samples)?;

    let mut source = WavFrameSource::open(&path, Duration::from_millis(100))?;
    assert_eq!(source.sample_rate, 16000);
    assert_eq!(source.channels, 1);
    assert!((source.duration_seconds - 0.25).abs() < 1e-9);

    let mut chunks = Vec::new();
    while let Some(chunk) = source.next_frame().await? {
        chunks.push(chunk);
    }

    // 100ms + 100ms + 50ms
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].pcm.len(), 1600 * 2);
    assert_eq!(chunks[1].pcm.len(), 1600 * 2);
    assert_eq!(chunks[2].pcm.len(), 800 * 2);

    assert_eq!(chunks[0].offset, Duration::ZERO);
    assert_eq!(chunks[1].offset, Duration::from_millis(100));
    assert_eq!(chunks[2].duration, Duration::from_millis(50));

    Ok(())
}

#[tokio::test]
async fn test_wav_source_pcm_is_little_endian() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let samples: Vec<i16> = vec![100, -200, 300, -400];
    let path = write_wav(temp_dir.path(), "short.wav", 16000, 1, &samples)?;

    let mut source = WavFrameSource::open(&path, Duration::from_millis(100))?;
    let chunk = source.next_frame().await?.expect("one chunk");

    let decoded: Vec<i16> = chunk
        .pcm
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    assert_eq!(decoded, samples);
    assert!(source.next_frame().await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_wav_source_keeps_stereo_frames_whole() -> Result<()> {
    let temp_dir = TempDir::new()?;

    // 100ms of 8kHz stereo = 800 frames = 1600 samples
    let samples = vec![0i16; 1600];
    let path = write_wav(temp_dir.path(), "stereo.wav", 8000, 2, &samples)?;

    let mut source = WavFrameSource::open(&path, Duration::from_millis(30))?;
    while let Some(chunk) = source.next_frame().await? {
        // 2 channels * 2 bytes per sample
        assert_eq!(chunk.pcm.len() % 4, 0, "chunk must hold whole stereo frames");
        assert_eq!(chunk.channels, 2);
    }

    Ok(())
}

#[test]
fn test_wav_source_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.wav");
    let result = WavFrameSource::open(&path, Duration::from_millis(100));

    assert!(result.is_err(), "Opening nonexistent file should fail");
}

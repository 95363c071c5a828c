use anyhow::Result;
use meeting_realtime::Config;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_missing_file_uses_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("absent");

    let cfg = Config::load(path.to_str().unwrap())?;

    assert_eq!(cfg.service.name, "meeting-realtime");
    assert_eq!(cfg.realtime.max_reconnect_attempts, 5);
    assert_eq!(cfg.realtime.reconnect_base_delay(), Duration::from_millis(1000));
    assert_eq!(cfg.realtime.heartbeat_interval(), Duration::from_secs(30));
    assert_eq!(cfg.realtime.outbound_queue_limit, None);
    assert_eq!(cfg.audio.frame_duration_ms, 100);

    Ok(())
}

#[test]
fn test_file_overrides_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("realtime.toml");
    fs::write(
        &path,
        r#"
[realtime]
origin = "https://meetings.example.com"
max_reconnect_attempts = 3
outbound_queue_limit = 500
"#,
    )?;

    let cfg = Config::load(path.to_str().unwrap())?;

    assert_eq!(cfg.realtime.origin, "https://meetings.example.com");
    assert_eq!(cfg.realtime.max_reconnect_attempts, 3);
    assert_eq!(cfg.realtime.outbound_queue_limit, Some(500));
    // Untouched keys keep their defaults
    assert_eq!(cfg.realtime.heartbeat_interval_ms, 30_000);

    Ok(())
}

#[test]
fn test_invalid_origin_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("bad.toml");
    fs::write(&path, "[realtime]\norigin = \"not a url\"\n")?;

    assert!(Config::load(path.to_str().unwrap()).is_err());

    Ok(())
}

#[test]
fn test_zero_heartbeat_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("bad.toml");
    fs::write(&path, "[realtime]\nheartbeat_interval_ms = 0\n")?;

    assert!(Config::load(path.to_str().unwrap()).is_err());

    Ok(())
}

#[test]
fn test_bundled_config_loads() -> Result<()> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/meeting-realtime");
    let cfg = Config::load(path)?;
    assert_eq!(cfg.realtime.origin, "http://localhost:8000");
    Ok(())
}

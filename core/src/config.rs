/// Configuration management
use crate::decay::DECAY_WINDOW;
use crate::error::{Result, ViewerError};
use crate::gesture::{GestureThresholds, SWIPE_DOWN_THRESHOLD_PX, SWIPE_HORIZONTAL_THRESHOLD_PX};
use crate::reactions::{DEFAULT_SYMBOLS, HIGHLIGHT_DURATION};
use crate::timer::{DEFAULT_FRAME_INTERVAL, DEFAULT_ITEM_DURATION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_LOG_FILE: &str = "storyview.log";

/// Viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Display time per item
    pub item_duration: Duration,

    /// Period of the frame task driving progress
    pub frame_interval: Duration,

    /// Age at which an item is fully faded
    pub decay_window: Duration,

    /// Minimum time between content overlay recomputations
    pub decay_refresh: Duration,

    /// Downward travel that closes the viewer
    pub swipe_down_px: f32,

    /// Horizontal travel that counts as a swipe
    pub swipe_horizontal_px: f32,

    /// Small releases slower than this only end a hold
    pub max_tap_duration: Option<Duration>,

    /// "Just reacted" highlight length
    pub reaction_highlight: Duration,

    /// Reaction palette, in tray order
    pub reaction_symbols: Vec<String>,

    /// Group the viewer opens at when launched directly
    pub start_group: usize,

    /// JSON fixture with the group list (demo data when unset)
    pub fixture: Option<PathBuf>,

    /// Log destination for the interactive viewer
    pub log_file: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            item_duration: DEFAULT_ITEM_DURATION,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            decay_window: DECAY_WINDOW,
            decay_refresh: Duration::from_secs(1),
            swipe_down_px: SWIPE_DOWN_THRESHOLD_PX,
            swipe_horizontal_px: SWIPE_HORIZONTAL_THRESHOLD_PX,
            max_tap_duration: None,
            reaction_highlight: HIGHLIGHT_DURATION,
            reaction_symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            start_group: 0,
            fixture: None,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl ViewerConfig {
    /// Create config from command line arguments
    pub fn from_args(args: &[String]) -> Result<Self> {
        // a config file is the base layer; flags override it wherever they appear
        let mut config = match args.iter().skip(1).position(|a| a == "--config") {
            Some(pos) => Self::from_file(Path::new(flag_value(args, pos + 1, "--config")?))?,
            None => Self::default(),
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    flag_value(args, i, "--config")?;
                    i += 2;
                }
                "--duration-ms" => {
                    config.item_duration = Duration::from_millis(parse_ms(args, i, "--duration-ms")?);
                    i += 2;
                }
                "--frame-ms" => {
                    config.frame_interval = Duration::from_millis(parse_ms(args, i, "--frame-ms")?);
                    i += 2;
                }
                "--max-tap-ms" => {
                    config.max_tap_duration =
                        Some(Duration::from_millis(parse_ms(args, i, "--max-tap-ms")?));
                    i += 2;
                }
                "--start" => {
                    let v = flag_value(args, i, "--start")?;
                    config.start_group = v.parse::<usize>().map_err(|_| {
                        ViewerError::Config("--start must be a group index".to_string())
                    })?;
                    i += 2;
                }
                "--fixture" => {
                    config.fixture = Some(PathBuf::from(flag_value(args, i, "--fixture")?));
                    i += 2;
                }
                "--log-file" => {
                    config.log_file = PathBuf::from(flag_value(args, i, "--log-file")?);
                    i += 2;
                }
                other => {
                    return Err(ViewerError::Config(format!("Unknown argument: {}", other)));
                }
            }
        }

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| ViewerError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Env overrides (nice for scripts)
    pub fn apply_env(&mut self) {
        if let Some(ms) = env_u64("STORYVIEW_DURATION_MS") {
            self.item_duration = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("STORYVIEW_FRAME_MS") {
            self.frame_interval = Duration::from_millis(ms);
        }
        if let Ok(path) = std::env::var("STORYVIEW_FIXTURE") {
            self.fixture = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.item_duration.is_zero() {
            return Err(ViewerError::Config("item duration must be positive".to_string()));
        }
        if self.frame_interval.is_zero() {
            return Err(ViewerError::Config("frame interval must be positive".to_string()));
        }
        if self.swipe_down_px <= 0.0 || self.swipe_horizontal_px <= 0.0 {
            return Err(ViewerError::Config("swipe thresholds must be positive".to_string()));
        }
        if self.reaction_symbols.is_empty() {
            return Err(ViewerError::Config("reaction palette is empty".to_string()));
        }
        Ok(())
    }

    pub fn gesture_thresholds(&self) -> GestureThresholds {
        GestureThresholds {
            swipe_down_px: self.swipe_down_px,
            swipe_horizontal_px: self.swipe_horizontal_px,
            max_tap_duration: self.max_tap_duration,
        }
    }
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| ViewerError::Config(format!("{} requires a value", flag)))
}

fn parse_ms(args: &[String], i: usize, flag: &str) -> Result<u64> {
    flag_value(args, i, flag)?
        .parse::<u64>()
        .map_err(|_| ViewerError::Config(format!("{} must be milliseconds", flag)))
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("storyview")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.item_duration, Duration::from_millis(5000));
        assert_eq!(config.decay_window, Duration::from_secs(86_400));
        assert_eq!(config.reaction_symbols.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags() {
        let config = ViewerConfig::from_args(&args(&[
            "--frame-ms",
            "33",
            "--start",
            "2",
            "--max-tap-ms",
            "250",
            "--log-file",
            "/tmp/sv.log",
        ]))
        .unwrap();
        assert_eq!(config.frame_interval, Duration::from_millis(33));
        assert_eq!(config.start_group, 2);
        assert_eq!(config.max_tap_duration, Some(Duration::from_millis(250)));
        assert_eq!(config.log_file, PathBuf::from("/tmp/sv.log"));
        assert_eq!(
            config.gesture_thresholds().max_tap_duration,
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_bad_flags() {
        assert!(matches!(
            ViewerConfig::from_args(&args(&["--frame-ms"])),
            Err(ViewerError::Config(_))
        ));
        assert!(ViewerConfig::from_args(&args(&["--frame-ms", "fast"])).is_err());
        assert!(ViewerConfig::from_args(&args(&["--frame-ms", "0"])).is_err());
        assert!(ViewerConfig::from_args(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_config_file_partial() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("viewer.json");
        std::fs::write(&path, r#"{ "swipe_down_px": 90.0, "start_group": 1 }"#).unwrap();

        let config = ViewerConfig::from_file(&path).unwrap();
        assert_eq!(config.swipe_down_px, 90.0);
        assert_eq!(config.start_group, 1);
        assert_eq!(config.item_duration, DEFAULT_ITEM_DURATION);
    }

    #[test]
    fn test_flags_before_config_file_survive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("viewer.json");
        std::fs::write(&path, r#"{ "swipe_down_px": 90.0, "start_group": 1 }"#).unwrap();
        let path = path.to_string_lossy().to_string();

        let config = ViewerConfig::from_args(&args(&[
            "--frame-ms",
            "40",
            "--config",
            &path,
            "--start",
            "3",
        ]))
        .unwrap();
        assert_eq!(config.frame_interval, Duration::from_millis(40));
        assert_eq!(config.swipe_down_px, 90.0);
        assert_eq!(config.start_group, 3);

        assert!(ViewerConfig::from_args(&args(&["--config"])).is_err());
    }
}

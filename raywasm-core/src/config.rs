//! Host configuration.
//!
//! Defaults suit a 60 Hz display with assets next to the working directory. Every field
//! can be overridden from the environment with [`HostConfig::from_env`]; the CLI layers
//! its flags on top of that.

use std::path::PathBuf;

use crate::abi::LogLevel;

pub const ENV_ASSET_ROOT: &str = "RAYWASM_ASSET_ROOT";
pub const ENV_TARGET_FPS: &str = "RAYWASM_TARGET_FPS";
pub const ENV_DEFAULT_FONT: &str = "RAYWASM_DEFAULT_FONT";
pub const ENV_REFRESH_HZ: &str = "RAYWASM_REFRESH_HZ";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a valid {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct HostConfig {
    /// Directory that guest-relative asset paths resolve against.
    pub asset_root: PathBuf,
    /// `GetFrameTime` clamp until the guest calls `SetTargetFPS`.
    pub target_fps: i32,
    /// TTF/OTF used for the default face. Without one, text is laid out but not rasterized.
    pub default_font: Option<PathBuf>,
    /// Refresh rate of displays that generate their own timestamps.
    pub refresh_hz: f64,
    /// Guest `TraceLog` threshold until the guest calls `SetTraceLogLevel`.
    pub log_level: LogLevel,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            target_fps: 60,
            default_font: None,
            refresh_hz: 60.0,
            log_level: LogLevel::Info,
        }
    }
}

impl HostConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from defaults plus whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(root) = lookup(ENV_ASSET_ROOT) {
            config.asset_root = PathBuf::from(root);
        }
        if let Some(font) = lookup(ENV_DEFAULT_FONT).filter(|s| !s.is_empty()) {
            config.default_font = Some(PathBuf::from(font));
        }
        if let Some(raw) = lookup(ENV_TARGET_FPS) {
            config.target_fps = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: ENV_TARGET_FPS,
                value: raw.clone(),
                expected: "integer",
            })?;
        }
        if let Some(raw) = lookup(ENV_REFRESH_HZ) {
            config.refresh_hz = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|hz| hz.is_finite() && *hz > 0.0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: ENV_REFRESH_HZ,
                    value: raw.clone(),
                    expected: "positive number",
                })?;
        }

        Ok(config)
    }

    /// Milliseconds between two generated refresh timestamps.
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.refresh_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = HostConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HostConfig::default());
        assert!((config.frame_interval_ms() - 16.666).abs() < 0.01);
    }

    #[test]
    fn overrides_are_applied() {
        let config = HostConfig::from_lookup(lookup(&[
            (ENV_ASSET_ROOT, "/games/wordle"),
            (ENV_TARGET_FPS, " 30 "),
            (ENV_DEFAULT_FONT, "fonts/grixel.ttf"),
            (ENV_REFRESH_HZ, "144"),
        ]))
        .unwrap();

        assert_eq!(config.asset_root, PathBuf::from("/games/wordle"));
        assert_eq!(config.target_fps, 30);
        assert_eq!(config.default_font, Some(PathBuf::from("fonts/grixel.ttf")));
        assert_eq!(config.refresh_hz, 144.0);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = HostConfig::from_lookup(lookup(&[(ENV_TARGET_FPS, "fast")])).unwrap_err();
        assert!(err.to_string().contains(ENV_TARGET_FPS));

        assert!(HostConfig::from_lookup(lookup(&[(ENV_REFRESH_HZ, "0")])).is_err());
        assert!(HostConfig::from_lookup(lookup(&[(ENV_REFRESH_HZ, "NaN")])).is_err());
    }
}

//! Shell tunables.
//!
//! All values have stock defaults; hosts may override any subset from a JSON
//! document (`ShellConfig::from_json_str`).

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Host viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 900,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub viewport: Viewport,
    pub default_window_width: i32,
    pub default_window_height: i32,
    /// Size used for host-rendered windows such as the launcher.
    pub internal_window_width: i32,
    pub internal_window_height: i32,
    pub min_window_width: i32,
    pub min_window_height: i32,
    /// Offset applied per already-open window when no saved geometry exists.
    pub cascade_step: i32,
    pub min_margin: i32,
    pub title_bar_height: i32,
    /// First z-order value; the counter only grows from here.
    pub z_index_base: u32,
    /// Prefix of every content handle, e.g. `blob:stax`.
    pub handle_scheme: String,
    /// Recognized entry documents in priority order.
    pub entry_names: Vec<String>,
    /// Console lines retained per instance.
    pub console_history_limit: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            default_window_width: 900,
            default_window_height: 650,
            internal_window_width: 800,
            internal_window_height: 500,
            min_window_width: 200,
            min_window_height: 120,
            cascade_step: 20,
            min_margin: 20,
            title_bar_height: 36,
            z_index_base: 100,
            handle_scheme: "blob:stax".to_string(),
            entry_names: vec![
                "index.html".to_string(),
                "main.html".to_string(),
                "app.html".to_string(),
            ],
            console_history_limit: 200,
        }
    }
}

impl ShellConfig {
    /// Parses a partial override document; missing keys keep stock values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport.width <= 0 || self.viewport.height <= 0 {
            return Err(ConfigError::Invalid("viewport must be positive"));
        }
        if self.default_window_width < self.min_window_width
            || self.default_window_height < self.min_window_height
        {
            return Err(ConfigError::Invalid(
                "default window size is below the minimum window size",
            ));
        }
        if self.handle_scheme.trim().is_empty() {
            return Err(ConfigError::Invalid("handle_scheme must not be empty"));
        }
        if self.entry_names.is_empty() {
            return Err(ConfigError::Invalid("entry_names must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid shell config: {err}"),
            Self::Invalid(reason) => write!(f, "invalid shell config: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ShellConfig};

    #[test]
    fn partial_override_keeps_defaults() {
        let config = ShellConfig::from_json_str(r#"{"cascade_step": 32}"#).expect("parse");
        assert_eq!(config.cascade_step, 32);
        assert_eq!(config.default_window_width, 900);
        assert_eq!(config.entry_names[0], "index.html");
    }

    #[test]
    fn rejects_empty_entry_names() {
        let err = ShellConfig::from_json_str(r#"{"entry_names": []}"#)
            .expect_err("empty entry list must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}

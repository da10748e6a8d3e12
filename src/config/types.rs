use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::device::connection::SessionTimings;
use crate::device::constants::{DEVICE_CHECK_INTERVAL, OPEN_RETRY_DELAY, READ_TIMEOUT};
use crate::device::types::{Color, ColorAssignment};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub muted_color: String,
    pub unmuted_color: String,
    pub device_check_interval_secs: u64,
    pub retry_delay_secs: u64,
}

impl Config {
    /// The configured color names, resolved against the button's palette.
    pub fn color_assignment(&self) -> Result<ColorAssignment, ConfigError> {
        Ok(ColorAssignment {
            muted_color: self.muted_color.parse::<Color>()?,
            unmuted_color: self.unmuted_color.parse::<Color>()?,
        })
    }

    pub fn timings(&self) -> SessionTimings {
        SessionTimings {
            device_check_interval: Duration::from_secs(self.device_check_interval_secs.max(1)),
            open_retry_delay: Duration::from_secs(self.retry_delay_secs.max(1)),
            read_timeout: Duration::from_millis(READ_TIMEOUT),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let colors = ColorAssignment::default();

        Config {
            muted_color: colors.muted_color.to_string(),
            unmuted_color: colors.unmuted_color.to_string(),
            device_check_interval_secs: DEVICE_CHECK_INTERVAL / 1000,
            retry_delay_secs: OPEN_RETRY_DELAY / 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_red_and_green() {
        let config = Config::default();
        assert_eq!(config.color_assignment().expect("defaults should parse"), ColorAssignment::default());
        assert_eq!(config.timings(), SessionTimings::default());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"mutedColor":"Purple"}"#).expect("config should parse");

        assert_eq!(config.muted_color, "Purple");
        assert_eq!(config.unmuted_color, "Green");
        assert_eq!(config.device_check_interval_secs, 3);
        assert_eq!(config.retry_delay_secs, 5);
    }

    #[test]
    fn unknown_color_is_rejected() {
        let config = Config { unmuted_color: "Orange".to_string(), ..Config::default() };

        assert!(matches!(
            config.color_assignment(),
            Err(ConfigError::InvalidColor { source }) if source.name == "Orange"
        ));
    }

    #[test]
    fn zero_intervals_are_clamped() {
        let config = Config { device_check_interval_secs: 0, retry_delay_secs: 0, ..Config::default() };
        let timings = config.timings();

        assert_eq!(timings.device_check_interval, Duration::from_secs(1));
        assert_eq!(timings.open_retry_delay, Duration::from_secs(1));
    }
}

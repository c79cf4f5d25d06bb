//! Layered settings.
//!
//! Sources, lowest priority first: built-in defaults, an optional TOML file,
//! then `SENSORWATCH_*` environment variables (`__` separates sections, e.g.
//! `SENSORWATCH_BROKER__URL`). The binary applies CLI flags on top.
//!
//! ```toml
//! [broker]
//! url = "mqtt://192.168.0.127:1883"
//! keep_alive = "30s"
//!
//! [sound]
//! file = "/usr/share/sounds/alarm.ogg"
//! player = "paplay"
//!
//! [alarm]
//! temp_max = 30.0
//! cooldown = "120s"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use rumqttc::MqttOptions;
use serde::Deserialize;

use crate::alarm::Thresholds;
use crate::data::duration::parse_duration;
use crate::error::ConfigError;
use crate::notify::{BellLoader, CommandLoader, SoundLoader};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SENSORWATCH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub sound: SoundSettings,
    pub log: LogSettings,
    pub alarm: AlarmSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    /// `mqtt://host:port`, `ws://host:port/path`, ...
    pub url: String,
    /// Generated from the process id when unset.
    pub client_id: Option<String>,
    pub keep_alive: String,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            url: "mqtt://localhost:1883".to_string(),
            client_id: None,
            keep_alive: "30s".to_string(),
        }
    }
}

/// Alert sound. The terminal bell is used unless a file is configured.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SoundSettings {
    pub file: Option<PathBuf>,
    pub player: String,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            file: None,
            player: "paplay".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log destination while the TUI owns the terminal.
    pub file: PathBuf,
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from("sensorwatch.log"),
            level: "info".to_string(),
        }
    }
}

/// Thresholds for the `alarm` publisher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlarmSettings {
    pub temp_max: f64,
    pub temp_min: f64,
    pub humidity_max: f64,
    pub sound_threshold: f64,
    pub accumulate_count: usize,
    pub cooldown: String,
}

impl Default for AlarmSettings {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            temp_max: thresholds.temp_max,
            temp_min: thresholds.temp_min,
            humidity_max: thresholds.humidity_max,
            sound_threshold: thresholds.sound_threshold,
            accumulate_count: thresholds.accumulate_count,
            cooldown: "120s".to_string(),
        }
    }
}

impl Settings {
    /// Load defaults, the optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        let config = builder
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Broker keep-alive, between one second and the protocol's u16 limit.
    pub fn keep_alive(&self) -> Result<Duration, ConfigError> {
        let keep_alive = duration("broker.keep_alive", &self.broker.keep_alive)?;
        if keep_alive < Duration::from_secs(1) || keep_alive > MAX_KEEP_ALIVE {
            return Err(ConfigError::Duration {
                key: "broker.keep_alive",
                value: self.broker.keep_alive.clone(),
            });
        }
        Ok(keep_alive)
    }

    /// Build rumqttc options from the broker URL, adding a client id if absent.
    pub fn mqtt_options(&self, client_prefix: &str) -> Result<MqttOptions, ConfigError> {
        let url = &self.broker.url;
        let full_url = if url.contains("client_id=") {
            url.clone()
        } else {
            let client_id = self
                .broker
                .client_id
                .clone()
                .unwrap_or_else(|| format!("{}-{}", client_prefix, std::process::id()));
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{}{}client_id={}", url, separator, client_id)
        };

        let mut options = MqttOptions::parse_url(full_url).map_err(|e| ConfigError::Broker {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        options.set_keep_alive(self.keep_alive()?);
        Ok(options)
    }

    /// The configured alert sound backend.
    pub fn sound_loader(&self) -> Box<dyn SoundLoader> {
        match &self.sound.file {
            Some(file) => Box::new(CommandLoader::new(self.sound.player.clone(), file.clone())),
            None => Box::new(BellLoader),
        }
    }

    pub fn thresholds(&self) -> Result<Thresholds, ConfigError> {
        let alarm = &self.alarm;
        Ok(Thresholds {
            temp_max: alarm.temp_max,
            temp_min: alarm.temp_min,
            humidity_max: alarm.humidity_max,
            sound_threshold: alarm.sound_threshold,
            accumulate_count: alarm.accumulate_count.max(1),
            cooldown: duration("alarm.cooldown", &alarm.cooldown)?,
        })
    }
}

/// MQTT carries keep-alive as a u16 count of seconds.
const MAX_KEEP_ALIVE: Duration = Duration::from_secs(u16::MAX as u64);

fn duration(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).map_err(|_| ConfigError::Duration {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_env(None, env(&[])).unwrap();
        assert_eq!(settings.broker.url, "mqtt://localhost:1883");
        assert_eq!(settings.keep_alive().unwrap(), Duration::from_secs(30));
        assert_eq!(settings.log.file, PathBuf::from("sensorwatch.log"));
        assert!(settings.sound.file.is_none());

        let thresholds = settings.thresholds().unwrap();
        assert_eq!(thresholds.temp_max, 30.0);
        assert_eq!(thresholds.cooldown, Duration::from_secs(120));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [broker]
            url = "mqtt://192.168.0.127:1883"

            [alarm]
            temp_max = 35.5
            cooldown = "5m"
            "#
        )
        .unwrap();

        let settings = Settings::load_with_env(Some(file.path()), env(&[])).unwrap();
        assert_eq!(settings.broker.url, "mqtt://192.168.0.127:1883");
        assert_eq!(settings.broker.keep_alive, "30s");

        let thresholds = settings.thresholds().unwrap();
        assert_eq!(thresholds.temp_max, 35.5);
        assert_eq!(thresholds.temp_min, 10.0);
        assert_eq!(thresholds.cooldown, Duration::from_secs(300));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[broker]\nurl = \"mqtt://from-file:1883\"").unwrap();

        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[
                ("SENSORWATCH_BROKER__URL", "mqtt://from-env:1884"),
                ("SENSORWATCH_ALARM__HUMIDITY_MAX", "90"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.broker.url, "mqtt://from-env:1884");
        assert_eq!(settings.alarm.humidity_max, 90.0);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = Settings::load_with_env(Some(Path::new("/nonexistent/sw.toml")), env(&[]));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_mqtt_options_adds_client_id() {
        let mut settings = Settings::default();
        settings.broker.url = "mqtt://broker.local:1884".to_string();
        settings.broker.client_id = Some("dash-1".to_string());

        let options = settings.mqtt_options("sensorwatch").unwrap();
        assert_eq!(options.broker_address(), ("broker.local".to_string(), 1884));
        assert_eq!(options.client_id(), "dash-1");
        assert_eq!(options.keep_alive(), Duration::from_secs(30));
    }

    #[test]
    fn test_mqtt_options_rejects_bad_url() {
        let mut settings = Settings::default();
        settings.broker.url = "not a url".to_string();
        assert!(matches!(
            settings.mqtt_options("sensorwatch"),
            Err(ConfigError::Broker { .. })
        ));
    }

    #[test]
    fn test_bad_durations() {
        let mut settings = Settings::default();
        settings.broker.keep_alive = "200ms".to_string();
        assert!(matches!(settings.keep_alive(), Err(ConfigError::Duration { .. })));

        settings.alarm.cooldown = "whenever".to_string();
        assert!(matches!(settings.thresholds(), Err(ConfigError::Duration { .. })));

        settings.alarm.cooldown = "1e300s".to_string();
        assert!(matches!(settings.thresholds(), Err(ConfigError::Duration { .. })));
    }

    #[test]
    fn test_keep_alive_limits() {
        let mut settings = Settings::default();
        settings.broker.keep_alive = "65535s".to_string();
        assert_eq!(settings.keep_alive().unwrap(), Duration::from_secs(65_535));

        settings.broker.keep_alive = "70000s".to_string();
        assert!(matches!(settings.keep_alive(), Err(ConfigError::Duration { .. })));

        settings.broker.keep_alive = "1e20h".to_string();
        assert!(matches!(settings.keep_alive(), Err(ConfigError::Duration { .. })));
        assert!(settings.mqtt_options("sensorwatch").is_err());
    }

    #[test]
    fn test_sound_loader_selection() {
        let mut settings = Settings::default();
        assert_eq!(settings.sound_loader().describe(), "bell");

        settings.sound.file = Some(PathBuf::from("/tmp/beep.ogg"));
        assert_eq!(settings.sound_loader().describe(), "paplay /tmp/beep.ogg");
    }
}

//! Error types for the library.
//!
//! None of these escape the message-handling path: notification errors are
//! logged where they occur, source errors surface as status text.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The layered configuration could not be built or deserialized.
    #[error("Invalid configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A duration string did not parse.
    #[error("Invalid duration for {key}: {value}")]
    Duration { key: &'static str, value: String },

    /// The broker URL could not be turned into connection options.
    #[error("Invalid broker URL {url}: {reason}")]
    Broker { url: String, reason: String },
}

/// Errors from the alert notification channels (sound, pulse).
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The sound file could not be opened.
    #[error("Sound resource unavailable at {path}: {source}")]
    SoundUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Playback failed.
    #[error("Sound playback failed: {0}")]
    Playback(String),

    /// The pulse device rejected a state change.
    #[error("Vibration failed: {0}")]
    Vibration(String),
}

/// Errors from message sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The MQTT client rejected a request.
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// The broker connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),
}

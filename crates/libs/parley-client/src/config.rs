use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: &'static str },
}

/// Client tuning. Every key is optional in TOML.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Timeout applied by `Client::request`.
    pub default_timeout_ms: u64,
    /// Push notifications buffered per subscriber before the oldest drop.
    pub event_capacity: usize,
    /// Tokens of timed-out or cancelled calls remembered so a late reply is
    /// discarded rather than dispatched as a push event.
    pub abandoned_token_retention: usize,
    pub max_frame_bytes: usize,
    pub token_prefix: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            event_capacity: 1024,
            abandoned_token_retention: 4096,
            max_frame_bytes: 16 * 1024 * 1024,
            token_prefix: "c".to_owned(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let must_be_positive = [
            ("default_timeout_ms", self.default_timeout_ms == 0),
            ("event_capacity", self.event_capacity == 0),
            ("max_frame_bytes", self.max_frame_bytes == 0),
        ];
        if let Some((key, _)) = must_be_positive.into_iter().find(|(_, is_zero)| *is_zero) {
            return Err(ConfigError::Invalid { key, reason: "must be positive" });
        }
        if self.token_prefix.is_empty() {
            return Err(ConfigError::Invalid { key: "token_prefix", reason: "must not be empty" });
        }
        Ok(())
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ClientConfig::from_toml("").expect("defaults");
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.default_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn partial_document_overrides_keys() {
        let config = ClientConfig::from_toml(
            r#"
            default_timeout_ms = 500
            event_capacity = 8
            token_prefix = "req-"
            "#,
        )
        .expect("config");
        assert_eq!(config.default_timeout_ms, 500);
        assert_eq!(config.event_capacity, 8);
        assert_eq!(config.token_prefix, "req-");
        assert_eq!(config.abandoned_token_retention, 4096);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = ClientConfig::from_toml("event_capacity = 0").expect_err("zero capacity");
        assert!(matches!(err, ConfigError::Invalid { key: "event_capacity", .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ClientConfig::from_toml("event_capcity = 3").expect_err("typo");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "default_timeout_ms = 1234").expect("write");
        let config = ClientConfig::from_path(file.path()).expect("config");
        assert_eq!(config.default_timeout_ms, 1234);

        let missing = ClientConfig::from_path(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::errors::{to_env_var, ConfigError};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8050";
pub const STREAMING_CHAT_PATH: &str = "/streaming-chat";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Overall request timeout. Unset means a reply may stream forever.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Fail on a non-success status instead of rendering the body.
    #[serde(default)]
    pub error_for_status: bool,
}

impl ServerSettings {
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.endpoint)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint: default_endpoint(),
            timeout_secs: None,
            error_for_status: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderSettings {
    #[serde(default = "default_highlight")]
    pub highlight: bool,
    #[serde(default)]
    pub strict_utf8: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            highlight: default_highlight(),
            strict_utf8: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub render: RenderSettings,
}

impl Settings {
    /// Defaults overlaid with `MDSTREAM_*` environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Like [`Settings::new`], with a TOML file between the defaults and
    /// the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.base_url", default_base_url())?
            .set_default("server.endpoint", default_endpoint())?
            .set_default("server.error_for_status", false)?
            .set_default("render.highlight", default_highlight())?
            .set_default("render.strict_utf8", false)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("MDSTREAM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize().map_err(|err| {
            tracing::debug!("Configuration error: {:?}", &err);
            ConfigError::Other(err)
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Checks values that deserialize fine but cannot work. Callers that
    /// override fields after loading should run it again.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = &self.server.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                env_var: to_env_var("server.base_url"),
                reason: format!("expected an http(s) URL, got '{}'", base_url),
            });
        }

        if !self.server.endpoint.starts_with('/') {
            return Err(ConfigError::Invalid {
                env_var: to_env_var("server.endpoint"),
                reason: format!("path must start with '/', got '{}'", self.server.endpoint),
            });
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_endpoint() -> String {
    STREAMING_CHAT_PATH.to_string()
}

fn default_highlight() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("MDSTREAM_") {
                env::remove_var(&key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.base_url, "http://127.0.0.1:8050");
        assert_eq!(settings.server.endpoint, "/streaming-chat");
        assert_eq!(settings.server.timeout(), None);
        assert!(!settings.server.error_for_status);
        assert!(settings.render.highlight);
        assert!(!settings.render.strict_utf8);
        assert_eq!(settings.server.url(), "http://127.0.0.1:8050/streaming-chat");
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("MDSTREAM_SERVER__BASE_URL", "https://chat.example.com/");
        env::set_var("MDSTREAM_SERVER__TIMEOUT_SECS", "30");
        env::set_var("MDSTREAM_SERVER__ERROR_FOR_STATUS", "true");
        env::set_var("MDSTREAM_RENDER__HIGHLIGHT", "false");
        env::set_var("MDSTREAM_RENDER__STRICT_UTF8", "true");

        let settings = Settings::new().unwrap();
        assert_eq!(
            settings.server.url(),
            "https://chat.example.com/streaming-chat"
        );
        assert_eq!(settings.server.timeout(), Some(Duration::from_secs(30)));
        assert!(settings.server.error_for_status);
        assert!(!settings.render.highlight);
        assert!(settings.render.strict_utf8);

        clean_env();
    }

    #[test]
    #[serial]
    fn test_file_then_environment() {
        clean_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nbase_url = \"http://from-file:9000\"\nendpoint = \"/chat\"\n"
        )
        .unwrap();
        env::set_var("MDSTREAM_SERVER__ENDPOINT", "/from-env");

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.server.base_url, "http://from-file:9000");
        assert_eq!(settings.server.endpoint, "/from-env");

        clean_env();
    }

    #[test]
    #[serial]
    fn test_invalid_base_url_names_env_var() {
        clean_env();
        env::set_var("MDSTREAM_SERVER__BASE_URL", "localhost:8050");

        let err = Settings::new().unwrap_err();
        match err {
            ConfigError::Invalid { env_var, .. } => {
                assert_eq!(env_var, "MDSTREAM_SERVER__BASE_URL")
            }
            other => panic!("Expected Invalid, got {other:?}"),
        }

        clean_env();
    }

    #[test]
    fn test_validate_catches_later_overrides() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.server.base_url = "localhost:8050".to_string();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid { .. })
        ));

        settings.server.base_url = "http://localhost:8050".to_string();
        settings.server.endpoint = "streaming-chat".to_string();
        match settings.validate() {
            Err(ConfigError::Invalid { env_var, .. }) => {
                assert_eq!(env_var, "MDSTREAM_SERVER__ENDPOINT")
            }
            other => panic!("Expected Invalid, got {other:?}"),
        }
    }
}

//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/sockvar/config.toml` by default. Every field is optional:
//!
//! ```toml
//! [connection]
//! connect_timeout = 10
//! send_timeout = 10
//! receive_timeout = 10
//! receive_buffer = 4096
//! read_mode = "terminator"
//! strict_timeouts = false
//! deadline = 45
//!
//! [output]
//! format = "json"
//! count_variable = "ARRAYELEMENTS"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use sockvar_core::DEFAULT_COUNT_VARIABLE;

use crate::client::{ClientOptions, DEFAULT_RECEIVE_CAPACITY};
use crate::connection::{ReadMode, Timeouts};
use crate::error::{ClientError, ClientResult};

/// Configuration for the sockvar client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Connection settings.
    pub connection: ConnectionSettings,

    /// Output settings.
    pub output: OutputSettings,
}

/// Timeouts, buffering and read behaviour. Durations are whole seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub connect_timeout: u64,
    pub send_timeout: u64,
    pub receive_timeout: u64,

    /// Receive buffer size in bytes.
    pub receive_buffer: usize,

    pub read_mode: ReadMode,

    /// Fail on receive timeout instead of returning a partial response.
    pub strict_timeouts: bool,

    /// Bound on the whole call, name resolution included.
    pub deadline: Option<u64>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        let timeouts = Timeouts::default();
        Self {
            connect_timeout: timeouts.connect.as_secs(),
            send_timeout: timeouts.send.as_secs(),
            receive_timeout: timeouts.receive.as_secs(),
            receive_buffer: DEFAULT_RECEIVE_CAPACITY,
            read_mode: ReadMode::default(),
            strict_timeouts: false,
            deadline: None,
        }
    }
}

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `KEY=VALUE` line per binding.
    #[default]
    Plain,
    /// A single JSON object.
    Json,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,

    /// Variable that receives the number of parsed pairs.
    pub count_variable: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            count_variable: DEFAULT_COUNT_VARIABLE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if it does not
    /// exist.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> ClientResult<Self> {
        toml::from_str(content)
            .map_err(|e| ClientError::Config(format!("failed to parse config: {}", e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sockvar")
    }

    /// Returns the configured timeouts.
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.connection.connect_timeout),
            send: Duration::from_secs(self.connection.send_timeout),
            receive: Duration::from_secs(self.connection.receive_timeout),
        }
    }

    /// Returns the configured call deadline, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.connection.deadline.map(Duration::from_secs)
    }

    /// Builds validated client options.
    pub fn client_options(&self) -> ClientResult<ClientOptions> {
        let options = ClientOptions::default()
            .with_timeouts(self.timeouts())
            .with_receive_capacity(self.connection.receive_buffer)
            .with_read_mode(self.connection.read_mode)
            .with_strict_timeouts(self.connection.strict_timeouts)
            .with_count_variable(self.output.count_variable.clone());
        options
            .validate()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(options)
    }

    /// Checks every setting.
    pub fn validate(&self) -> ClientResult<()> {
        self.client_options()?;
        if self.connection.deadline == Some(0) {
            return Err(ClientError::Config(
                "deadline must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ClientConfig::parse("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.timeouts(), Timeouts::default());
        assert_eq!(config.output.count_variable, "ARRAYELEMENTS");
        assert_eq!(config.deadline(), None);
    }

    #[test]
    fn full_file() {
        let config = ClientConfig::parse(
            r#"
[connection]
connect_timeout = 2
send_timeout = 3
receive_timeout = 4
receive_buffer = 8192
read_mode = "terminator"
strict_timeouts = true
deadline = 20

[output]
format = "json"
count_variable = "COUNT"
"#,
        )
        .unwrap();

        let options = config.client_options().unwrap();
        assert_eq!(options.timeouts.connect, Duration::from_secs(2));
        assert_eq!(options.timeouts.send, Duration::from_secs(3));
        assert_eq!(options.timeouts.receive, Duration::from_secs(4));
        assert_eq!(options.receive_capacity, 8192);
        assert_eq!(options.read_mode, ReadMode::UntilTerminator);
        assert!(options.strict_timeouts);
        assert_eq!(options.count_variable, "COUNT");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.deadline(), Some(Duration::from_secs(20)));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = ClientConfig::parse("[connection]\nread_mode = \"single\"\n").unwrap();
        assert_eq!(config.connection.read_mode, ReadMode::SingleRead);
        assert_eq!(config.connection.receive_buffer, 4096);
        assert_eq!(config.connection.receive_timeout, 10);
    }

    #[test]
    fn unknown_read_mode_is_rejected() {
        let result = ClientConfig::parse("[connection]\nread_mode = \"forever\"\n");
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn zero_values_fail_validation() {
        let mut config = ClientConfig::default();
        config.connection.receive_timeout = 0;
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));

        let mut config = ClientConfig::default();
        config.connection.receive_buffer = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.connection.deadline = Some(0);
        assert!(config.validate().is_err());

        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\nformat = \"json\"").unwrap();

        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClientConfig::load_from(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn serializes_back_to_toml() {
        let text = toml::to_string_pretty(&ClientConfig::default()).unwrap();
        assert!(text.contains("[connection]"));
        assert!(text.contains("read_mode = \"single\""));
        let again = ClientConfig::parse(&text).unwrap();
        assert_eq!(again, ClientConfig::default());
    }
}

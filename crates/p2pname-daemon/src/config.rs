//! Configuration file management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Network settings.
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// The listening IP for a `node` subcommand run without `--ip`.
    #[serde(default = "default_listen_ip")]
    pub listen_ip: String,
    /// The listening port for a `node` subcommand run without `--port`.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Introduction server host used by `node --join`.
    #[serde(default = "default_intro_host")]
    pub intro_host: String,
    /// Introduction server port used by `node --join`.
    #[serde(default = "default_intro_port")]
    pub intro_port: u16,
}

fn default_listen_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_listen_port() -> u16 {
    9000
}

fn default_intro_host() -> String {
    "127.0.0.1".to_string()
}

fn default_intro_port() -> u16 {
    8888
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_ip: default_listen_ip(),
            listen_port: default_listen_port(),
            intro_host: default_intro_host(),
            intro_port: default_intro_port(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location, falling
    /// back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("P2PNAME_DATA_DIR") {
            return PathBuf::from(dir);
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".p2pname"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/p2pname"))
    }
}

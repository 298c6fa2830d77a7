use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = ".webos-remote.toml";
pub const DEFAULT_ADDR: &str = "192.168.1.237:3000";
pub const DEFAULT_KEY_FILE: &str = "key";
pub const DEFAULT_CLOSE_TIMEOUT_MS: u64 = 1000;

/// Settings read from the optional TOML config file.
/// Command-line flags take precedence over every field here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// TV address as host:port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
    /// SOCKS5 proxy as host:port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socks5_proxy: Option<String>,
    /// Grace period for the close handshake after Ctrl-C
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_timeout_ms: Option<u64>,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if it exists. A missing file is only an error when the user named it.
    pub fn load(path: impl AsRef<Path>, explicit: bool) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn addr(&self) -> &str {
        self.addr.as_deref().unwrap_or(DEFAULT_ADDR)
    }

    pub fn key_file(&self) -> PathBuf {
        self.key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE))
    }

    pub fn socks5_proxy(&self) -> Option<&str> {
        self.socks5_proxy.as_deref().filter(|p| !p.is_empty())
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms.unwrap_or(DEFAULT_CLOSE_TIMEOUT_MS))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        check_host_port("addr", self.addr())?;
        if let Some(proxy) = self.socks5_proxy() {
            check_host_port("socks5_proxy", proxy)?;
        }
        if self.close_timeout_ms == Some(0) {
            anyhow::bail!("close_timeout_ms must be greater than zero");
        }
        Ok(())
    }
}

fn check_host_port(field: &str, value: &str) -> anyhow::Result<()> {
    let Some((host, port)) = value.rsplit_once(':') else {
        anyhow::bail!("{} '{}' must be in host:port form", field, value);
    };
    if host.is_empty() {
        anyhow::bail!("{} '{}' is missing a host", field, value);
    }
    if port.parse::<u16>().is_err() {
        anyhow::bail!("{} '{}' has an invalid port", field, value);
    }
    Ok(())
}

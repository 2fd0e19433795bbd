//! Persisted client settings: last-used endpoint, login name, download
//! root and a short list of recent hosts. Stored as TOML.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use crate::protocol::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_USER};

const MAX_RECENT_HOSTS: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub download_dir: Option<PathBuf>, // None = <config dir>/downloads
    pub recent_hosts: Vec<RecentHost>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            download_dir: None,
            recent_hosts: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| config_dir().join("downloads"))
    }

    /// Remember a successful login target.
    pub fn record_login(&mut self, host: &str, port: u16) {
        self.host = host.to_string();
        self.port = port;
        add_recent_host(self, host, port);
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentHost {
    pub host: String,
    pub port: u16,
}

pub fn config_dir() -> PathBuf {
    #[cfg(windows)]
    {
        if let Ok(appdata) = std::env::var("APPDATA") { return PathBuf::from(appdata).join("Pasvlink"); }
    }
    // Unix-like default
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join("pasvlink");
    }
    PathBuf::from(".pasvlink")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("pasvlink.toml")
}

/// Missing file means defaults.
pub fn load_config(path: &Path) -> Result<ClientConfig> {
    if let Ok(data) = std::fs::read_to_string(path) {
        let c: ClientConfig = toml::from_str(&data)?;
        Ok(c)
    } else {
        Ok(ClientConfig::default())
    }
}

pub fn save_config(path: &Path, config: &ClientConfig) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir).ok();
    let data = toml::to_string(config)?;
    // atomic write
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    use std::io::Write as _;
    tmp.write_all(data.as_bytes())?;
    tmp.flush()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600));
    }
    tmp.persist(path)?;
    Ok(())
}

pub fn add_recent_host(config: &mut ClientConfig, host: &str, port: u16) {
    let entry = RecentHost {
        host: host.to_string(),
        port,
    };
    // Remove if exists
    config
        .recent_hosts
        .retain(|h| !(h.host == entry.host && h.port == entry.port));
    // Push front
    config.recent_hosts.insert(0, entry);
    // Cap list
    if config.recent_hosts.len() > MAX_RECENT_HOSTS {
        config.recent_hosts.truncate(MAX_RECENT_HOSTS);
    }
}

/// Validate `host[:port]` from the address editor. A host made only of
/// digits and dots must be a well-formed IPv4 address.
pub fn parse_endpoint(input: &str, default_port: u16) -> Result<(String, u16)> {
    let input = input.trim();
    let (host, port) = match input.rsplit_once(':') {
        Some((h, p)) => match p.parse::<u16>() {
            Ok(port) if port > 0 => (h, port),
            _ => bail!("invalid port: {p:?}"),
        },
        None => (input, default_port),
    };
    if host.is_empty() {
        bail!("host is empty");
    }
    if host.chars().any(char::is_whitespace) {
        bail!("host contains whitespace: {host:?}");
    }
    if host.chars().all(|c| c.is_ascii_digit() || c == '.') && host.parse::<Ipv4Addr>().is_err() {
        bail!("invalid IPv4 address: {host}");
    }
    Ok((host.to_string(), port))
}

/// Step the port editor by `delta`, clamped to 1..=65535.
pub fn adjust_port(port: u16, delta: i32) -> u16 {
    (i32::from(port) + delta).clamp(1, i32::from(u16::MAX)) as u16
}

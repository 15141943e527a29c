//! Configuration loading and parsing.
//!
//! Defines the hub config schema and resolves defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use jukebox_types::CommunityId;

const DEFAULT_BIND: &str = "127.0.0.1:8090";
const DEFAULT_BROWSE_TTL_SECS: u64 = 180;
const DEFAULT_SUBSONIC_TIMEOUT_SECS: u64 = 20;
const DEFAULT_SETTINGS_FILE: &str = "communities.json";

/// Top-level hub configuration loaded from TOML.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Bind address (host:port).
    pub bind: Option<String>,
    /// Idle lifetime of interactive browse surfaces, in seconds.
    pub browse_ttl_secs: Option<u64>,
    /// Path of the persisted per-community settings file.
    pub settings_path: Option<String>,
    /// Media server connection.
    pub subsonic: SubsonicConfig,
    /// Voice relays, one per community.
    pub relays: Option<Vec<RelayConfig>>,
}

/// Subsonic server credentials.
#[derive(Debug, Deserialize, Clone)]
pub struct SubsonicConfig {
    /// Base URL of the server, e.g. `https://music.example.com`.
    pub url: String,
    pub user: String,
    pub password: String,
    /// Send the plain password instead of a salted token (old servers, LDAP users).
    pub legacy_auth: Option<bool>,
    /// Per-request timeout in seconds (default: 20).
    pub timeout_secs: Option<u64>,
}

/// Voice relay config from TOML.
#[derive(Debug, Deserialize)]
pub struct RelayConfig {
    /// Community served by this relay.
    pub community_id: u64,
    /// Relay HTTP address (host:port).
    pub http_addr: String,
}

/// Resolved relay config with parsed socket address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfigResolved {
    pub community: CommunityId,
    pub http_addr: SocketAddr,
}

impl ServerConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        Self::parse(&raw).with_context(|| format!("parse config {:?}", path))
    }

    fn parse(raw: &str) -> Result<Self> {
        let cfg = toml::from_str::<ServerConfig>(raw)?;
        if cfg.subsonic.url.trim().is_empty() {
            return Err(anyhow::anyhow!("subsonic.url must not be empty"));
        }
        Ok(cfg)
    }
}

impl SubsonicConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_SUBSONIC_TIMEOUT_SECS).max(1))
    }
}

/// Parse the bind address, falling back to the default.
pub fn bind_from_config(cfg: &ServerConfig) -> Result<SocketAddr> {
    let bind = cfg.bind.as_deref().unwrap_or(DEFAULT_BIND);
    bind.parse().with_context(|| format!("parse bind {bind}"))
}

/// Browse surface idle lifetime.
pub fn browse_ttl_from_config(cfg: &ServerConfig) -> Duration {
    Duration::from_secs(cfg.browse_ttl_secs.unwrap_or(DEFAULT_BROWSE_TTL_SECS))
}

/// Settings file path, relative paths resolved against the config directory.
pub fn settings_path_from_config(cfg: &ServerConfig, config_dir: Option<&Path>) -> PathBuf {
    let raw = cfg
        .settings_path
        .as_deref()
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .unwrap_or(DEFAULT_SETTINGS_FILE);
    let path = PathBuf::from(raw);
    match config_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path,
    }
}

/// Resolve relay configs and parse their addresses.
pub fn relays_from_config(cfg: &ServerConfig) -> Result<Vec<RelayConfigResolved>> {
    let mut relays = Vec::new();
    for relay in cfg.relays.iter().flatten() {
        let http_addr: SocketAddr = relay
            .http_addr
            .parse()
            .with_context(|| format!("parse relay http_addr {}", relay.http_addr))?;
        let community = CommunityId(relay.community_id);
        if relays.iter().any(|r: &RelayConfigResolved| r.community == community) {
            return Err(anyhow::anyhow!("duplicate relay for community {community}"));
        }
        relays.push(RelayConfigResolved { community, http_addr });
    }
    Ok(relays)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [subsonic]
        url = "http://music.local"
        user = "bot"
        password = "secret"
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = ServerConfig::parse(MINIMAL).unwrap();
        assert_eq!(bind_from_config(&cfg).unwrap(), "127.0.0.1:8090".parse().unwrap());
        assert_eq!(browse_ttl_from_config(&cfg), Duration::from_secs(180));
        assert_eq!(cfg.subsonic.timeout(), Duration::from_secs(20));
        assert!(relays_from_config(&cfg).unwrap().is_empty());
    }

    #[test]
    fn relays_are_parsed() {
        let raw = format!(
            "{MINIMAL}\n[[relays]]\ncommunity_id = 7\nhttp_addr = \"10.0.0.2:5556\"\n"
        );
        let cfg = ServerConfig::parse(&raw).unwrap();
        let relays = relays_from_config(&cfg).unwrap();
        assert_eq!(
            relays,
            vec![RelayConfigResolved {
                community: CommunityId(7),
                http_addr: "10.0.0.2:5556".parse().unwrap(),
            }]
        );
    }

    #[test]
    fn duplicate_relays_are_rejected() {
        let raw = format!(
            "{MINIMAL}\n[[relays]]\ncommunity_id = 7\nhttp_addr = \"10.0.0.2:5556\"\n\
             [[relays]]\ncommunity_id = 7\nhttp_addr = \"10.0.0.3:5556\"\n"
        );
        let cfg = ServerConfig::parse(&raw).unwrap();
        assert!(relays_from_config(&cfg).is_err());
    }

    #[test]
    fn settings_path_resolves_relative_to_config_dir() {
        let cfg = ServerConfig::parse(MINIMAL).unwrap();
        let path = settings_path_from_config(&cfg, Some(Path::new("/etc/jukebox")));
        assert_eq!(path, PathBuf::from("/etc/jukebox/communities.json"));
    }

    #[test]
    fn empty_subsonic_url_is_rejected() {
        let raw = MINIMAL.replace("http://music.local", " ");
        assert!(ServerConfig::parse(&raw).is_err());
    }
}

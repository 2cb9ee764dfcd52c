//! Configuration module.
//!
//! Loads remote settings from an INI file (by default
//! `~/.intern/intern.cfg`) or from an in-memory map.  Each Boss service can
//! have its own section; services without one fall back to `[Default]`.
//! Values set as environment variables can override the `[Default]`
//! section via [`RemoteConfig::with_env_overrides`].

use crate::error::{Error, Result};
use ini::Ini;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

/// Location of the user config file, relative to the home directory.
pub const CONFIG_FILE: &str = ".intern/intern.cfg";

pub const DEFAULT_SECTION: &str = "Default";
pub const PROJECT_SECTION: &str = "Project Service";
pub const METADATA_SECTION: &str = "Metadata Service";
pub const VOLUME_SECTION: &str = "Volume Service";

const PROTOCOL_KEY: &str = "protocol";
const HOST_KEY: &str = "host";
const TOKEN_KEY: &str = "token";

const BOSSPROTOCOL_ENV_NAME: &str = "BOSSPROTOCOL";
const BOSSHOST_ENV_NAME: &str = "BOSSHOST";
const BOSSTOKEN_ENV_NAME: &str = "BOSSTOKEN";

/// Where a remote's configuration comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// `~/.intern/intern.cfg`.
    DefaultFile,
    File(PathBuf),
    /// Key/value pairs that make up the `[Default]` section.
    Map(BTreeMap<String, String>),
}

/// Protocol, host and token for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub protocol: String,
    pub host: String,
    pub token: String,
}

impl Endpoint {
    /// `protocol://host`, the prefix of every URL for this service.
    pub fn url_prefix(&self) -> String {
        format!("{}://{}", self.protocol, self.host)
    }
}

/// Parsed configuration: section name to lower-cased key to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteConfig {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

/// Absolute path of the default config file.
pub fn default_config_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new()
        .ok_or_else(|| Error::Config("could not determine home directory".to_string()))?;
    Ok(dirs.home_dir().join(CONFIG_FILE))
}

impl RemoteConfig {
    pub fn load(source: &ConfigSource) -> Result<RemoteConfig> {
        match source {
            ConfigSource::DefaultFile => RemoteConfig::from_file(default_config_path()?),
            ConfigSource::File(path) => RemoteConfig::from_file(path),
            ConfigSource::Map(map) => Ok(RemoteConfig::from_map(map)),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<RemoteConfig> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let ini = Ini::load_from_file(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(RemoteConfig::from_ini(&ini))
    }

    pub fn parse(contents: &str) -> Result<RemoteConfig> {
        let ini = Ini::load_from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        Ok(RemoteConfig::from_ini(&ini))
    }

    /// Build a config whose only section is `[Default]`.
    pub fn from_map<K: AsRef<str>, V: AsRef<str>>(map: &BTreeMap<K, V>) -> RemoteConfig {
        let mut config = RemoteConfig::default();
        for (key, value) in map {
            config.set(DEFAULT_SECTION, key.as_ref(), value.as_ref());
        }
        config
    }

    fn from_ini(ini: &Ini) -> RemoteConfig {
        let mut config = RemoteConfig::default();
        for (section, props) in ini.iter() {
            // Keys outside any section are ignored.
            let section = match section {
                Some(s) => s,
                None => continue,
            };
            config.sections.entry(section.to_string()).or_default();
            for (key, value) in props.iter() {
                config.set(section, key, value);
            }
        }
        config
    }

    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_lowercase(), value.trim().to_string());
    }

    pub fn sections(&self) -> Vec<&str> {
        self.sections.keys().map(String::as_str).collect()
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    /// Resolve the endpoint for a service.  Uses `section` when present,
    /// otherwise `[Default]`.
    pub fn endpoint(&self, section: &str) -> Result<Endpoint> {
        let used = if self.has_section(section) {
            section
        } else {
            DEFAULT_SECTION
        };
        let value = |key: &str| {
            self.get(used, key).map(str::to_string).ok_or_else(|| {
                Error::Config(format!("missing '{}' in section [{}]", key, used))
            })
        };
        Ok(Endpoint {
            protocol: value(PROTOCOL_KEY)?,
            host: value(HOST_KEY)?,
            token: value(TOKEN_KEY)?,
        })
    }

    /// Override `[Default]` values from `BOSSPROTOCOL`, `BOSSHOST` and
    /// `BOSSTOKEN` when they are set.
    pub fn with_env_overrides(mut self) -> RemoteConfig {
        for (env_name, key) in &[
            (BOSSPROTOCOL_ENV_NAME, PROTOCOL_KEY),
            (BOSSHOST_ENV_NAME, HOST_KEY),
            (BOSSTOKEN_ENV_NAME, TOKEN_KEY),
        ] {
            if let Ok(val) = env::var(env_name) {
                tracing::debug!("{} overrides configured {}", env_name, key);
                self.set(DEFAULT_SECTION, key, &val);
            }
        }
        self
    }
}

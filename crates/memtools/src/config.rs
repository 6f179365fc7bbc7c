//! Optional TOML configuration shared by the tools.
//!
//! ```toml
//! device = "/dev/mem"
//! log_level = "warn"
//! page_size = 4096
//! ```
//!
//! The file named by `MEMTOOLS_CONFIG` is used if set, otherwise `/etc/memtools.toml` if it
//! exists. Every key is optional and command line flags take precedence.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use log::LevelFilter;
use physmem::{DEFAULT_DEVICE, system_page_size};
use serde::de::{self, Deserializer};
use serde_derive::Deserialize;

pub const CONFIG_ENV: &str = "MEMTOOLS_CONFIG";
pub const SYSTEM_CONFIG: &str = "/etc/memtools.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("{}: {source}", path.display())]
    Invalid { path: PathBuf, source: toml::de::Error },

    #[error(transparent)]
    Parse(#[from] toml::de::Error),

    #[error("page size {0:#x} is not a power of two")]
    InvalidPageSize(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The memory device to map.
    pub device: PathBuf,
    #[serde(deserialize_with = "deserialize_level")]
    pub log_level: LevelFilter,
    /// Overrides the system page size.
    pub page_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            log_level: LevelFilter::Warn,
            page_size: None,
        }
    }
}

fn deserialize_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LevelFilter, D::Error> {
    let name = <String as serde::Deserialize>::deserialize(deserializer)?;
    name.parse()
        .map_err(|_| de::Error::custom(format!("unknown log level `{name}`")))
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.validate()
    }
}

impl Config {
    /// Loads the configuration from the usual locations, or the defaults if there is none.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = env::var_os(CONFIG_ENV)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        Self::load_from(explicit, Path::new(SYSTEM_CONFIG))
    }

    /// Loads `explicit` if given, otherwise `fallback` if it exists, otherwise the defaults.
    pub fn load_from(explicit: Option<PathBuf>, fallback: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(&path),
            None if fallback.exists() => Self::from_file(fallback),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded config from {}", path.display());
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        match self.page_size {
            Some(size) if !size.is_power_of_two() => Err(ConfigError::InvalidPageSize(size)),
            _ => Ok(self),
        }
    }

    /// The configured page size, or the system's.
    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or_else(system_page_size)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.device, Path::new("/dev/mem"));
        assert_eq!(config.log_level, LevelFilter::Warn);
        assert!(config.page_size().is_power_of_two());
        assert_eq!("".parse::<Config>().unwrap(), config);
    }

    #[test]
    fn test_parse_all_keys() {
        let config: Config = r#"
            device = "/tmp/fake-mem"
            log_level = "debug"
            page_size = 16384
        "#
        .parse()
        .unwrap();
        assert_eq!(config.device, Path::new("/tmp/fake-mem"));
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.page_size(), 16384);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!("log_level = \"loud\"".parse::<Config>(), Err(ConfigError::Parse(_))));
        assert!(matches!("colour = true".parse::<Config>(), Err(ConfigError::Parse(_))));
        assert!(matches!("page_size = 3000".parse::<Config>(), Err(ConfigError::InvalidPageSize(3000))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"TRACE\"").unwrap();
        file.flush().unwrap();

        let config = Config::load_from(Some(file.path().to_path_buf()), Path::new("/nonexistent")).unwrap();
        assert_eq!(config.log_level, LevelFilter::Trace);
        assert_eq!(config.device, Path::new(DEFAULT_DEVICE));
    }

    #[test]
    fn test_fallback() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "device = \"/dev/fake\"").unwrap();
        file.flush().unwrap();

        let config = Config::load_from(None, file.path()).unwrap();
        assert_eq!(config.device, Path::new("/dev/fake"));

        let config = Config::load_from(None, Path::new("/nonexistent/memtools.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load_from(Some("/nonexistent/memtools.toml".into()), Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

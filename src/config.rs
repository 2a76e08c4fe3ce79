//! Configuration file for svcscope

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use svcscope_logs::{DEFAULT_SOURCE_TAG, ReverseLineReader, StaticRegistry};

/// Default number of entries returned per query
pub const DEFAULT_COUNT: usize = 100;

/// Settings loaded from `svcscope.toml`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Literal between the time and level of every record header
    pub source_tag: String,

    /// Entries returned when no count is given
    pub default_count: usize,

    /// Bytes read per step when scanning a file backwards
    pub chunk_size: usize,

    /// Directory holding `<service>.log` files
    pub logs_dir: Option<PathBuf>,

    /// Services with explicit log files
    pub services: BTreeMap<String, ServiceConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Log files, relative paths are taken from `logs_dir`
    pub files: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
            default_count: DEFAULT_COUNT,
            chunk_size: ReverseLineReader::<fs::File>::DEFAULT_CHUNK_SIZE,
            logs_dir: None,
            services: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load the config file, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)
                .with_context(|| format!("Failed to parse config file '{}'", path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read config file '{}'", path.display())),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.source_tag.trim().is_empty() {
            anyhow::bail!("source_tag must not be empty");
        }
        if config.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than zero");
        }
        Ok(config)
    }

    /// Build the service registry described by this config.
    ///
    /// Configured services come first; with a logs directory, any other
    /// `<name>.log` file in it is picked up as service `name`.
    pub fn registry(&self) -> Result<StaticRegistry> {
        let mut registry = match &self.logs_dir {
            Some(dir) => StaticRegistry::with_logs_dir(dir),
            None => StaticRegistry::new(),
        };

        for (name, service) in &self.services {
            registry.add_service(name.clone(), service.files.clone());
        }

        if let Some(dir) = &self.logs_dir {
            registry
                .discover()
                .with_context(|| format!("Failed to list logs directory '{}'", dir.display()))?;
        }

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svcscope_logs::ServiceRegistry;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.source_tag, "NIO");
        assert_eq!(config.default_count, 100);
    }

    #[test]
    fn test_parse_services() {
        let config = Config::parse(
            r#"
            source_tag = "SVC"
            default_count = 20
            chunk_size = 4096

            [services.api]
            files = ["/var/log/api.log", "/var/log/api-worker.log"]

            [services.db]
            "#,
        )
        .unwrap();

        assert_eq!(config.source_tag, "SVC");
        assert_eq!(config.default_count, 20);
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.services["api"].files.len(), 2);
        assert!(config.services["db"].files.is_empty());

        let registry = config.registry().unwrap();
        assert_eq!(registry.resolve("api").map(|f| f.len()), Some(2));
        assert_eq!(registry.resolve("db"), Some(Vec::new()));
        assert!(registry.resolve("cache").is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::parse("chunk_size = 0").is_err());
        assert!(Config::parse("source_tag = \"\"").is_err());
        assert!(Config::parse("unknown_key = 1").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/definitely/not/svcscope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_logs_dir_discovery() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("api.log"), "").unwrap();
        let config = Config {
            logs_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };

        let registry = config.registry().unwrap();
        assert_eq!(registry.resolve("api"), Some(vec![dir.path().join("api.log")]));
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use crate::ServiceRegistry;

/// Registry built from a fixed set of services, usually loaded from config.
///
/// Services registered without explicit files log to `<logs_dir>/<name>.log`.
/// Relative file paths are resolved against `logs_dir` when one is set.
#[derive(Clone, Debug, Default)]
pub struct StaticRegistry {
    logs_dir: Option<PathBuf>,
    services: BTreeMap<String, Vec<PathBuf>>,
}

impl StaticRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry rooted at a logs directory
    pub fn with_logs_dir(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            logs_dir: Some(logs_dir.into()),
            services: BTreeMap::new(),
        }
    }

    /// Register a service and its log files, replacing any previous entry
    pub fn add_service(&mut self, name: impl Into<String>, files: Vec<PathBuf>) -> &mut Self {
        let name = name.into();
        let files = if files.is_empty() {
            self.default_files(&name)
        } else {
            files.into_iter().map(|f| self.resolve_path(f)).collect()
        };
        self.services.insert(name, files);
        self
    }

    /// Builder form of [`StaticRegistry::add_service`]
    pub fn service(mut self, name: impl Into<String>, files: Vec<PathBuf>) -> Self {
        self.add_service(name, files);
        self
    }

    /// Register every `<name>.log` file in the logs directory as service `name`.
    ///
    /// Services already registered keep their files. Returns how many services
    /// were added.
    pub fn discover(&mut self) -> io::Result<usize> {
        let Some(dir) = self.logs_dir.clone() else {
            return Ok(0);
        };

        let mut added = 0;
        for entry in fs::read_dir(&dir)?.flatten() {
            let path = entry.path();
            let Some(name) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".log"))
            else {
                continue;
            };
            if name.is_empty() || !path.is_file() || self.services.contains_key(name) {
                continue;
            }
            self.services.insert(name.to_string(), vec![path.clone()]);
            added += 1;
        }

        debug!(logs_dir = %dir.display(), added, "Discovered services");
        Ok(added)
    }

    fn default_files(&self, name: &str) -> Vec<PathBuf> {
        match &self.logs_dir {
            Some(dir) => {
                let safe_name = name.replace(['/', '\\', ':', '[', ']'], "_");
                vec![dir.join(format!("{}.log", safe_name))]
            }
            None => Vec::new(),
        }
    }

    fn resolve_path(&self, file: PathBuf) -> PathBuf {
        match &self.logs_dir {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file,
        }
    }
}

impl ServiceRegistry for StaticRegistry {
    fn resolve(&self, service: &str) -> Option<Vec<PathBuf>> {
        let files = self.services.get(service).cloned();
        debug!(service, sources = files.as_ref().map(Vec::len), "resolved service");
        files
    }

    fn services(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }
}

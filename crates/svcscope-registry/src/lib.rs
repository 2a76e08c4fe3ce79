//! Service registry for svcscope
//!
//! This crate maps logical service names to the log files they write.

mod static_registry;

pub use static_registry::StaticRegistry;

use std::path::PathBuf;

/// Resolves a logical service name to its log sources.
///
/// `None` means the service is not known. `Some` with an empty list is a
/// known service that has no log files.
pub trait ServiceRegistry: Send + Sync {
    fn resolve(&self, service: &str) -> Option<Vec<PathBuf>>;

    /// Names of every known service
    fn services(&self) -> Vec<String>;
}

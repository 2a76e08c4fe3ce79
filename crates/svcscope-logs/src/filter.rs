use svcscope_types::{LogEntry, LogLevel};

/// Severity and component filter applied to an already bounded window
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Lowest level to include (None = all)
    min_level: Option<LogLevel>,

    /// Exact component to include (None = all)
    component: Option<String>,
}

impl EntryFilter {
    /// Create a filter that matches everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep entries at or above the given level
    pub fn with_min_level(mut self, level: Option<LogLevel>) -> Self {
        self.min_level = level;
        self
    }

    /// Keep entries whose component equals the given name
    pub fn with_component(mut self, component: Option<String>) -> Self {
        self.component = component;
        self
    }

    /// Check if a log entry matches this filter
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(min_level) = self.min_level
            && !entry.level.is_at_least(min_level)
        {
            return false;
        }

        match &self.component {
            Some(component) => entry.component == *component,
            None => true,
        }
    }

    /// Check if filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.min_level.is_none() && self.component.is_none()
    }

    /// Keep matching entries, preserving order
    pub fn apply(&self, entries: Vec<LogEntry>) -> Vec<LogEntry> {
        if self.is_empty() {
            return entries;
        }
        entries.into_iter().filter(|e| self.matches(e)).collect()
    }
}

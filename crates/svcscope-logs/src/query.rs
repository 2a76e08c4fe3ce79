use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use svcscope_registry::ServiceRegistry;
use svcscope_types::{LogEntry, LogLevel};

use crate::error::{LogsError, Result};
use crate::filter::EntryFilter;
use crate::merge::merge_entries;
use crate::reader::SourceReader;

/// Request for the most recent entries of a service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogQuery {
    pub service: String,
    pub entries_count: usize,
    pub level: Option<LogLevel>,
    pub component: Option<String>,
}

impl LogQuery {
    pub fn new(service: impl Into<String>, entries_count: usize) -> Self {
        Self {
            service: service.into(),
            entries_count,
            level: None,
            component: None,
        }
    }

    /// Only return entries at or above this level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Only return entries from this component
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn filter(&self) -> EntryFilter {
        EntryFilter::new()
            .with_min_level(self.level)
            .with_component(self.component.clone())
    }
}

/// Answers log queries for services known to a registry
#[derive(Clone)]
pub struct LogQueryService {
    registry: Arc<dyn ServiceRegistry>,
    reader: SourceReader,
}

impl LogQueryService {
    pub fn new(registry: impl ServiceRegistry + 'static, reader: SourceReader) -> Self {
        Self {
            registry: Arc::new(registry),
            reader,
        }
    }

    /// Get the most recent `entries_count` entries of a service, oldest first.
    ///
    /// Filters are applied after the window is bounded, so they can only
    /// shrink the result.
    pub async fn get_log_entries(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        self.get_log_entries_with_cancel(query, &CancellationToken::new())
            .await
    }

    /// Same as [`LogQueryService::get_log_entries`], failing with
    /// [`LogsError::Aborted`] once `cancel` fires
    pub async fn get_log_entries_with_cancel(
        &self,
        query: &LogQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<LogEntry>> {
        let sources = self
            .registry
            .resolve(&query.service)
            .ok_or_else(|| LogsError::UnknownService(query.service.clone()))?;

        if sources.is_empty() || query.entries_count == 0 {
            return Ok(Vec::new());
        }

        // One blocking read per source; results come back in source order
        let reads = sources.into_iter().map(|source| {
            let reader = self.reader.clone();
            let cancel = cancel.clone();
            let count = query.entries_count;
            tokio::task::spawn_blocking(move || reader.read(&source, count, &cancel))
        });

        let mut per_source = Vec::new();
        for result in join_all(reads).await {
            match result {
                Ok(entries) => per_source.push(entries?),
                Err(e) => {
                    warn!(service = %query.service, error = %e, "Log source read task failed");
                    per_source.push(Vec::new());
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(LogsError::Aborted);
        }

        let window = merge_entries(per_source, Some(query.entries_count));
        let evicted = window.evicted();
        let bounded = window.len();
        let entries = query.filter().apply(window.into_vec());

        debug!(
            service = %query.service,
            requested = query.entries_count,
            evicted,
            bounded,
            returned = entries.len(),
            "Answered log query"
        );

        Ok(entries)
    }
}

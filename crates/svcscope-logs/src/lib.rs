//! Log processing for svcscope
//!
//! This crate provides backward reading of service log files, reassembly of
//! multi-line records, k-way merging across files, and filtering.

mod buffer;
mod error;
mod filter;
mod merge;
mod parser;
mod query;
mod reader;
mod reverse;

pub use buffer::TailWindow;
pub use error::{LogsError, Result};
pub use filter::EntryFilter;
pub use merge::{MergedEntries, merge_entries};
pub use parser::{Header, ParsedLine, RecordParser, RejectReason, TimeParser, DEFAULT_SOURCE_TAG};
pub use query::{LogQuery, LogQueryService};
pub use reader::SourceReader;
pub use reverse::{BackwardLines, FileOpener, ReverseLineReader, SourceOpener};

// Re-export types used in our public API
pub use svcscope_registry::{ServiceRegistry, StaticRegistry};
pub use svcscope_types::{LogEntry, LogLevel, Timestamp};

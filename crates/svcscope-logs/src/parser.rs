use std::fmt;
use std::sync::Arc;

use regex::Regex;

use svcscope_types::{LogEntry, LogLevel, Timestamp, parse_timestamp};

/// Literal written between the time and level of every record header
pub const DEFAULT_SOURCE_TAG: &str = "NIO";

/// Converts the textual time of a header into a comparable timestamp
pub type TimeParser = Arc<dyn Fn(&str) -> Option<Timestamp> + Send + Sync>;

/// Structured fields of a record header line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub time: Timestamp,
    pub level: LogLevel,
    pub component: String,
    pub first_line: String,
}

impl Header {
    /// Complete the record with its continuation lines, given in file order
    pub fn into_entry(self, continuation: impl IntoIterator<Item = String>) -> LogEntry {
        let mut msg = self.first_line;
        for line in continuation {
            msg.push('\n');
            msg.push_str(&line);
        }
        LogEntry::new(self.time, self.level, self.component, msg)
    }
}

/// Why a line shaped like a header was not accepted as one
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    InvalidTime(String),
    UnknownLevel(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTime(t) => write!(f, "invalid time '{}'", t),
            Self::UnknownLevel(l) => write!(f, "unknown level '{}'", l),
        }
    }
}

/// Outcome of parsing one physical line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedLine {
    /// A valid record header
    Header(Header),
    /// Header shape with an unusable time or level; the record is invalid
    Rejected(RejectReason),
    /// Anything else, possibly part of the record above it
    Continuation,
}

/// Stateless parser for record header lines.
///
/// Headers look like `[<time>] <tag> [<LEVEL>] [<component>] <message>`.
#[derive(Clone)]
pub struct RecordParser {
    header: Regex,
    source_tag: String,
    parse_time: TimeParser,
}

impl RecordParser {
    /// Create a parser for headers carrying the given source tag
    pub fn new(source_tag: &str) -> Result<Self, regex::Error> {
        let pattern = format!(
            r"^\[(?P<time>[^\]]*)\] {} \[(?P<level>[^\[\]]*)\] \[(?P<component>[^\[\]]+)\] (?P<msg>.*)$",
            regex::escape(source_tag)
        );

        Ok(Self {
            header: Regex::new(&pattern)?,
            source_tag: source_tag.to_string(),
            parse_time: Arc::new(parse_timestamp),
        })
    }

    /// Replace the time parser (the default understands [`parse_timestamp`] layouts)
    pub fn with_time_parser<F>(mut self, parse_time: F) -> Self
    where
        F: Fn(&str) -> Option<Timestamp> + Send + Sync + 'static,
    {
        self.parse_time = Arc::new(parse_time);
        self
    }

    /// Classify a single line
    pub fn parse(&self, line: &str) -> ParsedLine {
        let line = line.trim_end_matches(['\n', '\r']);

        let Some(caps) = self.header.captures(line) else {
            return ParsedLine::Continuation;
        };

        let time_text = &caps["time"];
        let Some(time) = (self.parse_time)(time_text) else {
            return ParsedLine::Rejected(RejectReason::InvalidTime(time_text.to_string()));
        };

        let level_text = &caps["level"];
        let Ok(level) = level_text.parse::<LogLevel>() else {
            return ParsedLine::Rejected(RejectReason::UnknownLevel(level_text.to_string()));
        };

        ParsedLine::Header(Header {
            time,
            level,
            component: caps["component"].to_string(),
            first_line: caps["msg"].to_string(),
        })
    }
}

impl fmt::Debug for RecordParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordParser")
            .field("source_tag", &self.source_tag)
            .field("header", &self.header.as_str())
            .finish()
    }
}

//! Bounded backward scan of a single log source

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, trace, warn};

use svcscope_types::LogEntry;

use crate::error::{LogsError, Result};
use crate::parser::{ParsedLine, RecordParser};
use crate::reverse::{BackwardLines, SourceOpener};

/// Reads the most recent records of one source.
///
/// Lines are scanned from the end of the source. Lines that are not headers
/// are held back until the header above them is found, then appended to its
/// message in file order. Scanning stops as soon as enough records are
/// complete, so only the tail of a large file is ever read.
#[derive(Clone)]
pub struct SourceReader {
    parser: Arc<RecordParser>,
    opener: Arc<dyn SourceOpener>,
}

impl SourceReader {
    pub fn new(parser: RecordParser, opener: impl SourceOpener + 'static) -> Self {
        Self {
            parser: Arc::new(parser),
            opener: Arc::new(opener),
        }
    }

    /// Read up to `count` valid records from `source`, oldest first.
    ///
    /// A source that cannot be opened yields no records. The only error is
    /// [`LogsError::Aborted`] when `cancel` fires during the scan.
    pub fn read(
        &self,
        source: &Path,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<LogEntry>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if cancel.is_cancelled() {
            return Err(LogsError::Aborted);
        }

        let _span = debug_span!("read_source", source = %source.display()).entered();

        let mut lines = match self.opener.open(source) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(error = %e, "Failed to open log source");
                return Ok(Vec::new());
            }
        };

        let entries = self.scan(&mut *lines, count, cancel)?;
        debug!(entries = entries.len(), requested = count, "Read log source");
        Ok(entries)
    }

    /// Scan already opened backward lines for up to `count` valid records
    pub fn scan<L>(
        &self,
        lines: &mut L,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<LogEntry>>
    where
        L: BackwardLines + ?Sized,
    {
        // Found newest first, reversed before returning
        let mut entries = Vec::with_capacity(count.min(1024));
        // Continuation lines below the next header up, in file order
        let mut pending: VecDeque<String> = VecDeque::new();

        while entries.len() < count {
            if cancel.is_cancelled() {
                return Err(LogsError::Aborted);
            }

            let line = match lines.prev_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read log source, keeping records read so far");
                    break;
                }
            };

            match self.parser.parse(&line) {
                ParsedLine::Header(header) => {
                    entries.push(header.into_entry(pending.drain(..)));
                }
                ParsedLine::Continuation => pending.push_front(line),
                ParsedLine::Rejected(reason) => {
                    trace!(%reason, dropped_lines = pending.len(), "Dropping invalid record");
                    pending.clear();
                }
            }
        }

        if !pending.is_empty() && lines.at_start() {
            trace!(lines = pending.len(), "Discarding continuation lines without a header");
        }

        entries.reverse();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    use crate::parser::DEFAULT_SOURCE_TAG;
    use crate::reverse::{FileOpener, ReverseLineReader};
    use svcscope_types::LogLevel;

    fn reader() -> SourceReader {
        SourceReader::new(RecordParser::new(DEFAULT_SOURCE_TAG).unwrap(), FileOpener::default())
    }

    fn scan(lines: &[&str], count: usize) -> Vec<LogEntry> {
        let content = lines.iter().map(|l| format!("{}\n", l)).collect::<String>();
        let mut source = ReverseLineReader::with_chunk_size(Cursor::new(content.into_bytes()), 16).unwrap();
        reader().scan(&mut source, count, &CancellationToken::new()).unwrap()
    }

    fn header(secs: u32, level: &str, component: &str, msg: &str) -> String {
        format!("[2024-01-15 10:00:{:02}] NIO [{}] [{}] {}", secs, level, component, msg)
    }

    fn msgs(entries: &[LogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.msg.as_str()).collect()
    }

    /// Serves lines newest first and counts how many were requested
    struct CountingLines {
        lines: Vec<String>,
        served: usize,
    }

    impl BackwardLines for CountingLines {
        fn prev_line(&mut self) -> io::Result<Option<String>> {
            let line = self.lines.pop();
            if line.is_some() {
                self.served += 1;
            }
            Ok(line)
        }

        fn at_start(&self) -> bool {
            self.lines.is_empty()
        }
    }

    #[test]
    fn test_most_recent_in_ascending_order() {
        let lines: Vec<String> = (1..=5).map(|i| header(i, "INFO", "api", &format!("m{}", i))).collect();
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();

        assert_eq!(msgs(&scan(&lines, 2)), vec!["m4", "m5"]);
        assert_eq!(msgs(&scan(&lines, 10)), vec!["m1", "m2", "m3", "m4", "m5"]);
    }

    #[test]
    fn test_entry_fields() {
        let entries = scan(&[&header(0, "DEBUG", "log component", "log msg")], 2);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Debug);
        assert_eq!(entries[0].component, "log component");
        assert_eq!(entries[0].msg, "log msg");
    }

    #[test]
    fn test_traceback_is_attached_in_order() {
        let first = header(0, "ERROR", "log component1", "log msg1");
        let entries = scan(
            &[
                &first,
                "Traceback (most recent call last):",
                "  result = execute_method(*args, **kwargs)",
                "socket.gaierror: [Errno -2] Name or service not known",
            ],
            4,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].msg,
            "log msg1\nTraceback (most recent call last):\n  result = execute_method(*args, **kwargs)\nsocket.gaierror: [Errno -2] Name or service not known"
        );
    }

    #[test]
    fn test_continuations_go_to_their_own_header() {
        let a = header(1, "INFO", "api", "a");
        let b = header(2, "ERROR", "api", "b");
        let entries = scan(&[&a, "a.1", "", "a.2", &b, "b.1"], 10);
        assert_eq!(msgs(&entries), vec!["a\na.1\n\na.2", "b\nb.1"]);
    }

    #[test]
    fn test_headerless_continuations_are_discarded() {
        let entries = scan(
            &[
                "Traceback (most recent call last):",
                "File retry.py, line 137, in execute_with_retry",
                "result = execute_method(*args, **kwargs)",
                "socket.gaierror: [Errno -2] Name or service not known",
            ],
            4,
        );
        assert!(entries.is_empty());

        let a = header(1, "INFO", "api", "a");
        let entries = scan(&["orphan", &a, "a.1"], 4);
        assert_eq!(msgs(&entries), vec!["a\na.1"]);
    }

    #[test]
    fn test_invalid_records_are_dropped() {
        assert!(scan(&["[invalid time] NIO [DEBUG] [log component] log msg"], 1).is_empty());
        assert!(scan(&[&header(0, "INVALID_LEVEL", "log component", "log msg")], 1).is_empty());
    }

    #[test]
    fn test_invalid_record_drops_its_continuations() {
        let a = header(1, "INFO", "api", "a");
        let bad = header(2, "NOPE", "api", "bad");
        let c = header(3, "INFO", "api", "c");
        let entries = scan(&[&a, "a.1", &bad, "bad.1", "bad.2", &c], 10);
        assert_eq!(msgs(&entries), vec!["a\na.1", "c"]);
    }

    #[test]
    fn test_invalid_records_do_not_use_budget() {
        let a = header(1, "INFO", "api", "a");
        let bad = header(2, "NOPE", "api", "bad");
        let c = header(3, "INFO", "api", "c");
        assert_eq!(msgs(&scan(&[&a, &bad, &c], 2)), vec!["a", "c"]);
    }

    #[test]
    fn test_stops_once_enough_records_are_found() {
        let mut source = CountingLines {
            lines: vec![
                header(1, "INFO", "api", "a"),
                header(2, "INFO", "api", "b"),
                header(3, "INFO", "api", "c"),
                "c.1".to_string(),
            ],
            served: 0,
        };
        let entries = reader().scan(&mut source, 1, &CancellationToken::new()).unwrap();
        assert_eq!(msgs(&entries), vec!["c\nc.1"]);
        assert_eq!(source.served, 2);
        assert!(!source.at_start());
    }

    #[test]
    fn test_cancelled_scan_is_aborted() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut source = CountingLines {
            lines: vec![header(1, "INFO", "api", "a")],
            served: 0,
        };
        assert_eq!(reader().scan(&mut source, 1, &cancel), Err(LogsError::Aborted));
        assert_eq!(source.served, 0);
    }

    #[test]
    fn test_zero_count_does_not_open() {
        let entries = reader()
            .read(Path::new("/definitely/not/here.log"), 0, &CancellationToken::new())
            .unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_missing_source_is_empty() {
        let entries = reader()
            .read(Path::new("/definitely/not/here.log"), 5, &CancellationToken::new())
            .unwrap();
        assert!(entries.is_empty());
    }
}

//! Rendering of query results

use std::io::{self, Write};

use svcscope_logs::LogEntry;
use svcscope_types::format_timestamp;

/// Write entries back in the header layout they were read from
pub fn write_text<W: Write>(out: &mut W, source_tag: &str, entries: &[LogEntry]) -> io::Result<()> {
    for entry in entries {
        writeln!(
            out,
            "[{}] {} [{}] [{}] {}",
            format_timestamp(&entry.time),
            source_tag,
            entry.level,
            entry.component,
            entry.msg
        )?;
    }
    Ok(())
}

/// Write entries as a JSON array
pub fn write_json<W: Write>(out: &mut W, entries: &[LogEntry]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, entries)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use svcscope_logs::{LogLevel, ParsedLine, RecordParser};

    fn entries() -> Vec<LogEntry> {
        vec![LogEntry::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            LogLevel::Error,
            "worker".to_string(),
            "job failed\nTraceback (most recent call last):".to_string(),
        )]
    }

    #[test]
    fn test_text_output_parses_back() {
        let mut out = Vec::new();
        write_text(&mut out, "NIO", &entries()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "[2024-01-15 10:30:00.000] NIO [ERROR] [worker] job failed\nTraceback (most recent call last):\n"
        );

        let first = text.lines().next().unwrap();
        let parser = RecordParser::new("NIO").unwrap();
        assert!(matches!(parser.parse(first), ParsedLine::Header(_)));
    }

    #[test]
    fn test_json_output() {
        let mut out = Vec::new();
        write_json(&mut out, &entries()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["level"], "ERROR");
        assert_eq!(value[0]["component"], "worker");
    }
}

//! Reverse log reading - reads sources backwards for efficient tail operations

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Backward line access to one open log source.
///
/// The source is released when the value is dropped.
pub trait BackwardLines {
    /// Read the line before the previously returned one, `None` at the start
    fn prev_line(&mut self) -> io::Result<Option<String>>;

    /// Whether every line has been returned
    fn at_start(&self) -> bool;
}

/// Opens log sources for backward reading
pub trait SourceOpener: Send + Sync {
    fn open(&self, source: &Path) -> io::Result<Box<dyn BackwardLines + Send>>;
}

// ============================================================================
// Reverse Line Reader - reads lines from end of a source backwards
// ============================================================================

/// Reads lines from a seekable source in reverse order (last line first).
///
/// Fixed-size chunks are read from the end and split on `\n`. A single
/// trailing newline does not produce an empty last line, and a trailing `\r`
/// is stripped from every line. Blank lines inside the source are kept.
pub struct ReverseLineReader<R> {
    inner: R,
    /// Offset of the first byte held in `buf`
    pos: u64,
    /// Bytes read but not yet returned, covering `pos..pos + buf.len()`
    buf: Vec<u8>,
    chunk_size: usize,
    /// The first chunk read (the end of the source) has been trimmed
    seen_end: bool,
    done: bool,
}

impl<R: Read + Seek> ReverseLineReader<R> {
    pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024; // 64KB chunks

    pub fn new(inner: R) -> io::Result<Self> {
        Self::with_chunk_size(inner, Self::DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(mut inner: R, chunk_size: usize) -> io::Result<Self> {
        let size = inner.seek(SeekFrom::End(0))?;
        Ok(Self {
            inner,
            pos: size,
            buf: Vec::new(),
            chunk_size: chunk_size.max(1),
            seen_end: false,
            done: size == 0,
        })
    }

    fn read_chunk_backwards(&mut self) -> io::Result<()> {
        let read_size = std::cmp::min(self.pos, self.chunk_size as u64) as usize;
        let new_pos = self.pos - read_size as u64;
        self.inner.seek(SeekFrom::Start(new_pos))?;

        let mut chunk = vec![0; read_size];
        self.inner.read_exact(&mut chunk)?;
        self.pos = new_pos;

        if !self.seen_end {
            self.seen_end = true;
            if chunk.last() == Some(&b'\n') {
                chunk.pop();
            }
        }

        // Prepend to whatever partial line is left from the later chunk
        chunk.append(&mut self.buf);
        self.buf = chunk;
        Ok(())
    }

    fn decode(bytes: &[u8]) -> String {
        let line = String::from_utf8_lossy(bytes);
        line.strip_suffix('\r').unwrap_or(&line).to_string()
    }
}

impl<R: Read + Seek> BackwardLines for ReverseLineReader<R> {
    fn prev_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if self.done {
                return Ok(None);
            }

            if let Some(newline_pos) = memchr::memrchr(b'\n', &self.buf) {
                let line = Self::decode(&self.buf[newline_pos + 1..]);
                self.buf.truncate(newline_pos);
                return Ok(Some(line));
            }

            if self.pos == 0 {
                // Whatever remains is the first line of the source
                self.done = true;
                let line = Self::decode(&self.buf);
                self.buf.clear();
                return Ok(Some(line));
            }

            self.read_chunk_backwards()?;
        }
    }

    fn at_start(&self) -> bool {
        self.done
    }
}

/// Opens log files from disk
#[derive(Clone, Debug)]
pub struct FileOpener {
    chunk_size: usize,
}

impl FileOpener {
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }
}

impl Default for FileOpener {
    fn default() -> Self {
        Self::new(ReverseLineReader::<File>::DEFAULT_CHUNK_SIZE)
    }
}

impl SourceOpener for FileOpener {
    fn open(&self, source: &Path) -> io::Result<Box<dyn BackwardLines + Send>> {
        let file = File::open(source)?;
        Ok(Box::new(ReverseLineReader::with_chunk_size(file, self.chunk_size)?))
    }
}

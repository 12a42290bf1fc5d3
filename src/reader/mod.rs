//! Streaming reader for JSONL result files.
//!
//! Lines are pulled one at a time from a buffered source; the file is never
//! loaded as a whole. Open and read failures are classified into
//! [`InputError`] variants so the caller can report which condition occurred.

use crate::error::{InputError, ParseError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A single line pulled from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// 1-based line number.
    pub number: usize,
    /// Line content without the trailing newline, or the reason it is unusable.
    pub content: Result<String, ParseError>,
}

impl RawLine {
    /// Whether the line holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        matches!(&self.content, Ok(text) if text.trim().is_empty())
    }
}

/// Line-by-line reader over a result file.
pub struct ResultReader<R> {
    source: R,
    path: PathBuf,
    line_number: usize,
    buf: Vec<u8>,
}

impl ResultReader<BufReader<File>> {
    /// Open a result file for streaming.
    pub fn open(path: &Path) -> Result<Self, InputError> {
        if path.is_dir() {
            return Err(InputError::Unreadable {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "path is a directory",
                ),
            });
        }

        let file = File::open(path).map_err(|e| InputError::from_io(path, e))?;
        debug!("Opened input file: {}", path.display());

        Ok(Self::from_reader(BufReader::new(file), path))
    }
}

impl<R: BufRead> ResultReader<R> {
    /// Wrap an already buffered source. `path` is only used in error messages.
    pub fn from_reader(source: R, path: &Path) -> Self {
        Self {
            source,
            path: path.to_path_buf(),
            line_number: 0,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for ResultReader<R> {
    type Item = Result<RawLine, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();

        match self.source.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;

                while matches!(self.buf.last(), Some(b'\n') | Some(b'\r')) {
                    self.buf.pop();
                }

                let content = std::str::from_utf8(&self.buf)
                    .map(str::to_string)
                    .map_err(|_| ParseError::InvalidUtf8);

                Some(Ok(RawLine {
                    number: self.line_number,
                    content,
                }))
            }
            Err(e) => Some(Err(InputError::from_io(&self.path, e))),
        }
    }
}

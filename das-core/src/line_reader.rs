//! Chunked ASCII line reader (C1).
//!
//! Reads text input in fixed-size chunks and exposes line bounds, word
//! extraction, quoted-string extraction and raw blob extraction. The
//! terminator is a caller-supplied byte string (`"\n"` for most line-based
//! formats, `"ENDSCOPE\n"` for scope-oriented readers).
//!
//! DAS is not a streaming format (see spec Non-goals): the whole input is
//! held in memory. The chunk window is still tracked explicitly so line
//! discovery only re-scans the KMP search over the unexplored tail of the
//! buffer, matching the original's chunk-at-a-time design.

use crate::error::{Error, Result};
use crate::kmp;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineBounds {
    pub begin: usize,
    pub end: usize,
}

pub struct LineReader {
    data: Vec<u8>,
    terminator: Vec<u8>,
    chunk_size: usize,
    /// End of the portion of `data` considered "read in" so far.
    chunk_end: usize,
    line: LineBounds,
    read_ptr: usize,
}

impl LineReader {
    pub fn new(data: Vec<u8>, terminator: impl Into<Vec<u8>>) -> Self {
        Self::with_chunk_size(data, terminator, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(data: Vec<u8>, terminator: impl Into<Vec<u8>>, chunk_size: usize) -> Self {
        let terminator = terminator.into();
        let chunk_end = chunk_size.min(data.len());
        Self {
            data,
            terminator,
            chunk_size,
            chunk_end,
            line: LineBounds { begin: 0, end: 0 },
            read_ptr: 0,
        }
    }

    pub fn from_file(path: impl AsRef<std::path::Path>, terminator: impl Into<Vec<u8>>) -> Result<Self> {
        let data = std::fs::read(path.as_ref()).map_err(|_| Error::InvalidFile {
            path: path.as_ref().display().to_string(),
        })?;
        Ok(Self::new(data, terminator))
    }

    /// Pulls more bytes into the active window. Returns `false` once the
    /// whole buffer has been brought in.
    fn read_new_chunk(&mut self) -> bool {
        if self.chunk_end >= self.data.len() {
            return false;
        }
        self.chunk_end = (self.chunk_end + self.chunk_size).min(self.data.len());
        true
    }

    /// Advances to the next logical line terminated by `self.terminator`.
    /// Returns `false` once no further terminator can be found, even after
    /// exhausting all chunks.
    pub fn next_line(&mut self) -> bool {
        let search_from = self.line.end;
        loop {
            let haystack = &self.data[search_from..self.chunk_end];
            if let Some(rel) = kmp::find(haystack, &self.terminator) {
                let begin = search_from;
                let end = search_from + rel;
                self.line = LineBounds { begin, end };
                self.read_ptr = begin;
                return true;
            }
            if !self.read_new_chunk() {
                return false;
            }
        }
    }

    /// Requires the remaining buffer to contain a full line; used by
    /// scope readers that need `UnexpectedEof` instead of a quiet `false`.
    pub fn require_next_line(&mut self) -> Result<()> {
        if self.next_line() {
            Ok(())
        } else {
            Err(Error::UnexpectedEof)
        }
    }

    pub fn get_line_bounds(&self) -> LineBounds {
        self.line
    }

    pub fn get_read_ptr(&self) -> usize {
        self.read_ptr
    }

    pub fn set_read_ptr(&mut self, ptr: usize) {
        self.read_ptr = ptr;
    }

    pub fn line_text(&self) -> &[u8] {
        &self.data[self.line.begin..self.line.end]
    }

    pub fn is_eof(&self) -> bool {
        self.read_ptr >= self.data.len()
    }

    /// Advances over spaces, tabs, zero bytes and carriage returns, and
    /// optionally newlines.
    pub fn skip_skippable(&mut self, skip_newlines: bool) {
        while self.read_ptr < self.data.len() {
            match self.data[self.read_ptr] {
                b' ' | b'\t' | 0 | b'\r' => self.read_ptr += 1,
                b'\n' if skip_newlines => self.read_ptr += 1,
                _ => break,
            }
        }
    }

    /// Tokenizes the remainder of the current line into whitespace-delimited
    /// words, honouring a trailing `\` as a line continuation.
    pub fn read_statement_args(&mut self) -> Result<Vec<String>> {
        let mut args = Vec::new();
        loop {
            self.skip_skippable(false);
            if self.read_ptr >= self.line.end {
                // Check for a line-continuation backslash just before the
                // terminator.
                if self.line.end > self.line.begin && self.data[self.line.end - 1] == b'\\' {
                    if !self.next_line() {
                        return Err(Error::UnexpectedEof);
                    }
                    self.read_ptr = self.line.begin;
                    continue;
                }
                break;
            }
            match self.extract_word()? {
                Some(word) => args.push(word),
                None => break,
            }
        }
        Ok(args)
    }

    /// Extracts the next whitespace-delimited word starting at the read
    /// pointer, stopping at the current line's end.
    pub fn extract_word(&mut self) -> Result<Option<String>> {
        self.skip_skippable(false);
        if self.read_ptr >= self.line.end {
            return Ok(None);
        }
        let start = self.read_ptr;
        while self.read_ptr < self.line.end && !self.data[self.read_ptr].is_ascii_whitespace() {
            self.read_ptr += 1;
        }
        let word = String::from_utf8_lossy(&self.data[start..self.read_ptr]).into_owned();
        Ok(Some(word))
    }

    /// Extracts a double-quoted string. Only `\"` is treated as an escape;
    /// no other escape processing is performed.
    pub fn extract_string(&mut self) -> Result<String> {
        self.skip_skippable(false);
        if self.read_ptr >= self.data.len() || self.data[self.read_ptr] != b'"' {
            return Err(Error::UnexpectedEof);
        }
        self.read_ptr += 1;
        let mut out = String::new();
        while self.read_ptr < self.data.len() {
            let b = self.data[self.read_ptr];
            if b == b'"' {
                self.read_ptr += 1;
                return Ok(out);
            }
            if b == b'\\' && self.read_ptr + 1 < self.data.len() && self.data[self.read_ptr + 1] == b'"' {
                out.push('"');
                self.read_ptr += 2;
                continue;
            }
            out.push(b as char);
            self.read_ptr += 1;
        }
        Err(Error::UnexpectedEof)
    }

    /// Raw `n`-byte copy, advancing the read pointer. Pulls in further
    /// chunks as needed; fails with `UnexpectedEof` if the file does not
    /// hold enough data.
    pub fn extract_blob(&mut self, n: usize) -> Result<Vec<u8>> {
        while self.read_ptr + n > self.chunk_end && self.read_new_chunk() {}
        if self.read_ptr + n > self.data.len() {
            return Err(Error::UnexpectedEof);
        }
        let blob = self.data[self.read_ptr..self.read_ptr + n].to_vec();
        self.read_ptr += n;
        Ok(blob)
    }

    pub fn remaining(&self) -> &[u8] {
        &self.data[self.read_ptr..]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_line_walks_scopes() {
        let mut r = LineReader::with_chunk_size(
            b"PROPERTIES\nMODEL: \"x\"\nENDSCOPE\n".to_vec(),
            "\n",
            8,
        );
        assert!(r.next_line());
        assert_eq!(r.line_text(), b"PROPERTIES");
        assert!(r.next_line());
        assert_eq!(r.line_text(), b"MODEL: \"x\"");
        assert!(r.next_line());
        assert_eq!(r.line_text(), b"ENDSCOPE");
        assert!(!r.next_line());
    }

    #[test]
    fn extract_word_and_string() {
        let mut r = LineReader::new(b"foo bar \"baz qux\"".to_vec(), "\n");
        r.next_line();
        assert_eq!(r.extract_word().unwrap().as_deref(), Some("foo"));
        assert_eq!(r.extract_word().unwrap().as_deref(), Some("bar"));
        assert_eq!(r.extract_string().unwrap(), "baz qux");
    }

    #[test]
    fn extract_blob_across_chunk_boundary() {
        let mut r = LineReader::with_chunk_size(vec![1, 2, 3, 4, 5, 6], "\n", 2);
        let blob = r.extract_blob(5).unwrap();
        assert_eq!(blob, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn line_continuation_joins_statement_args() {
        let mut r = LineReader::new(b"f 1 2 \\\n3 4\n".to_vec(), "\n");
        r.next_line();
        let args = r.read_statement_args().unwrap();
        assert_eq!(args, vec!["f", "1", "2", "3", "4"]);
    }
}

//! A plain byte cursor used by the DAS reader. Unlike the OBJ/STL line
//! reader (`das_core::LineReader`), DAS interleaves short ASCII tokens with
//! raw binary payloads whose length is known from the surrounding scope, so
//! scanning a fully materialized buffer is simpler than chunked terminator
//! search. This is consistent with the container's non-streaming contract:
//! readers load the whole file into memory before parsing.

use crate::error::{DasError, Result};

pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Skips spaces, tabs, carriage returns and zero bytes; optionally also
    /// newlines, mirroring `LineReader::skip_skippable`.
    pub fn skip_skippable(&mut self, skip_newlines: bool) {
        while let Some(b) = self.peek() {
            let skippable = matches!(b, b' ' | b'\t' | b'\r' | 0x00) || (skip_newlines && b == b'\n');
            if !skippable {
                break;
            }
            self.pos += 1;
        }
    }

    /// Reads a bare word: letters/digits/underscore, stopping at whitespace,
    /// `:` or newline.
    pub fn read_word(&mut self) -> Result<String> {
        self.skip_skippable(true);
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b':' {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(DasError::UnexpectedEndStatement("<eof>".into()));
        }
        Ok(String::from_utf8_lossy(&self.data[start..self.pos]).into_owned())
    }

    /// Consumes the `:` and the single separating space after a value name.
    pub fn expect_colon(&mut self) -> Result<()> {
        if self.peek() != Some(b':') {
            return Err(DasError::InvalidKeyword("expected `:`".into()));
        }
        self.pos += 1;
        if self.peek() == Some(b' ') {
            self.pos += 1;
        }
        Ok(())
    }

    /// Reads a `"`-quoted string, honouring only the `\"` escape.
    pub fn read_quoted_string(&mut self) -> Result<String> {
        if self.peek() != Some(b'"') {
            return Err(DasError::InvalidValue {
                slot: "expected opening quote".into(),
            });
        }
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None => return Err(DasError::Core(das_core::Error::UnexpectedEof)),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') if self.data.get(self.pos + 1) == Some(&b'"') => {
                    out.push(b'"');
                    self.pos += 2;
                }
                Some(b) => {
                    out.push(b);
                    self.pos += 1;
                }
            }
        }
        self.skip_newline();
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Reads exactly `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos + n;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(DasError::Core(das_core::Error::UnexpectedEof))?;
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_bytes(2)?.try_into().unwrap()))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_bytes(4)?.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_bytes(8)?.try_into().unwrap()))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_bytes(4)?.try_into().unwrap()))
    }

    pub fn read_f32_array(&mut self, n: usize) -> Result<Vec<f32>> {
        (0..n).map(|_| self.read_f32()).collect()
    }

    pub fn read_u32_array(&mut self, n: usize) -> Result<Vec<u32>> {
        (0..n).map(|_| self.read_u32()).collect()
    }

    /// Consumes a single trailing newline if present, tolerating `\r\n`.
    pub fn skip_newline(&mut self) {
        if self.peek() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek() == Some(b'\n') {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_word_and_colon_and_blob() {
        let mut cursor = Cursor::new(b"NAME: \x01\x02\x03\n");
        let word = cursor.read_word().unwrap();
        assert_eq!(word, "NAME");
        cursor.expect_colon().unwrap();
        let bytes = cursor.read_bytes(3).unwrap();
        assert_eq!(bytes, [1, 2, 3]);
    }

    #[test]
    fn reads_quoted_string_with_escape() {
        let mut cursor = Cursor::new(b"\"a \\\"b\\\" c\"\n");
        let s = cursor.read_quoted_string().unwrap();
        assert_eq!(s, "a \"b\" c");
    }
}

//! Bounded-buffer line scanning.
//!
//! Log lines up to `max_line_len` bytes are handed to the caller whole.
//! Longer lines are never accumulated in memory: the caller receives the
//! buffered fragment and then streams the remainder of the line with
//! [`LineScanner::drain_rest_of_line`], either into an output stream or
//! into nothing.

use std::io::{self, Read, Write};

const MIN_BUF_SIZE: usize = 65_536;

/// One scanned line. Borrowed slices have the trailing newline (and any
/// `\r` before it) already stripped.
#[derive(Debug, PartialEq, Eq)]
pub enum Line<'a> {
    /// A complete line of at most `max_line_len` bytes.
    Full(&'a [u8]),
    /// The leading fragment of a line that exceeds `max_line_len`. The rest
    /// of the line must be consumed with `drain_rest_of_line` before the
    /// next call to `next_line`.
    Overlong(&'a [u8]),
}

pub struct LineScanner<R: Read> {
    inner: R,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    max_line_len: usize,
    /// True while the tail of an overlong line is still unconsumed.
    draining: bool,
    eof: bool,
}

fn strip_cr(line: &[u8]) -> &[u8] {
    match line {
        [head @ .., b'\r'] => head,
        _ => line,
    }
}

impl<R: Read> LineScanner<R> {
    pub fn new(inner: R, max_line_len: usize) -> Self {
        let capacity = (max_line_len + 2).max(MIN_BUF_SIZE);
        LineScanner {
            inner,
            buf: vec![0; capacity],
            start: 0,
            end: 0,
            max_line_len,
            draining: false,
            eof: false,
        }
    }

    /// Slides buffered bytes to the front and reads more from the source.
    /// Returns false at end of input.
    fn fill(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        let n = self.inner.read(&mut self.buf[self.end..])?;
        if n == 0 {
            self.eof = true;
            return Ok(false);
        }
        self.end += n;
        Ok(true)
    }

    fn find_newline(&self) -> Option<usize> {
        self.buf[self.start..self.end]
            .iter()
            .position(|&b| b == b'\n')
    }

    /// Returns the next line, or `None` at end of input.
    pub fn next_line(&mut self) -> io::Result<Option<Line<'_>>> {
        debug_assert!(!self.draining, "previous overlong line was not drained");
        loop {
            if let Some(i) = self.find_newline() {
                let (line_start, line_end) = (self.start, self.start + i);
                self.start = line_end + 1;
                let line = strip_cr(&self.buf[line_start..line_end]);
                if line.len() > self.max_line_len {
                    // The whole line happened to fit in the buffer; there
                    // is nothing left to drain.
                    return Ok(Some(Line::Overlong(line)));
                }
                return Ok(Some(Line::Full(line)));
            }

            if self.end - self.start > self.max_line_len {
                // Hold back a trailing '\r': it may belong to a "\r\n"
                // split across reads.
                let mut frag_end = self.end;
                if self.buf[frag_end - 1] == b'\r' {
                    frag_end -= 1;
                }
                let frag_start = self.start;
                self.start = frag_end;
                self.draining = true;
                return Ok(Some(Line::Overlong(&self.buf[frag_start..frag_end])));
            }

            if !self.fill()? {
                // Final line without a trailing newline.
                if self.start == self.end {
                    return Ok(None);
                }
                let (line_start, line_end) = (self.start, self.end);
                self.start = self.end;
                let line = strip_cr(&self.buf[line_start..line_end]);
                if line.len() > self.max_line_len {
                    return Ok(Some(Line::Overlong(line)));
                }
                return Ok(Some(Line::Full(line)));
            }
        }
    }

    /// Consumes the remainder of an overlong line, copying it into `out`
    /// when given. A no-op if there is nothing to drain.
    pub fn drain_rest_of_line(&mut self, mut out: Option<&mut dyn Write>) -> io::Result<()> {
        while self.draining {
            if let Some(i) = self.find_newline() {
                let line_end = self.start + i;
                let chunk = strip_cr(&self.buf[self.start..line_end]);
                if let Some(w) = out.as_deref_mut() {
                    w.write_all(chunk)?;
                }
                self.start = line_end + 1;
                self.draining = false;
                return Ok(());
            }

            let chunk = &self.buf[self.start..self.end];
            // Hold back a trailing '\r': it may belong to a "\r\n" split
            // across reads.
            let keep = if chunk.ends_with(b"\r") { 1 } else { 0 };
            let writable = chunk.len() - keep;
            if let Some(w) = out.as_deref_mut() {
                w.write_all(&self.buf[self.start..self.start + writable])?;
            }
            self.start += writable;

            if !self.fill()? {
                // EOF inside the line: flush anything held back and stop.
                if let (Some(w), true) = (out.as_deref_mut(), self.start < self.end) {
                    w.write_all(&self.buf[self.start..self.end])?;
                }
                self.start = self.end;
                self.draining = false;
                return Ok(());
            }
        }
        Ok(())
    }
}

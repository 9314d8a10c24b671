//! Bounded body capture.
//!
//! Lines end at `\n`; a trailing `\r` is dropped and every captured line is
//! re-terminated with `\n`. Capture stops at whichever cap is hit first.

/// Accumulates a response body up to a line cap and a byte cap.
#[derive(Debug)]
pub struct LineCapture {
    max_lines: usize,
    max_bytes: usize,
    bytes_seen: usize,
    lines: usize,
    body: String,
    pending: Vec<u8>,
    truncated: bool,
}

impl LineCapture {
    pub fn new(max_lines: usize, max_bytes: usize) -> Self {
        Self {
            max_lines,
            max_bytes,
            bytes_seen: 0,
            lines: 0,
            body: String::new(),
            pending: Vec::new(),
            truncated: false,
        }
    }

    /// Feed one chunk. Returns `false` once no further input is wanted.
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        for &byte in chunk {
            if self.is_full() {
                self.truncated = true;
                return false;
            }
            self.bytes_seen += 1;
            if byte == b'\n' {
                self.emit_line();
            } else {
                self.pending.push(byte);
            }
        }
        !self.is_full()
    }

    /// Bytes consumed so far, including any partial line.
    pub fn bytes_seen(&self) -> usize {
        self.bytes_seen
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    fn is_full(&self) -> bool {
        self.lines >= self.max_lines || self.bytes_seen >= self.max_bytes
    }

    fn emit_line(&mut self) {
        if self.pending.last() == Some(&b'\r') {
            self.pending.pop();
        }
        self.body.push_str(&String::from_utf8_lossy(&self.pending));
        self.body.push('\n');
        self.pending.clear();
        self.lines += 1;
    }

    /// Finish the capture. `unseen_tail` reports that reading stopped before
    /// the end of the body was observed.
    pub fn finish(mut self, unseen_tail: bool) -> (String, bool) {
        if !self.pending.is_empty() && self.lines < self.max_lines {
            self.emit_line();
        }
        (self.body, self.truncated || unseen_tail)
    }
}

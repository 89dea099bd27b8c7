// ABOUTME: Splits an arbitrarily chunked byte stream into complete newline-terminated lines
// ABOUTME: Keeps the trailing partial line pending across calls so no line is split or duplicated

use std::borrow::Cow;

/// Pending size above which a single warning is logged
const OVERSIZED_PENDING_BYTES: usize = 64 * 1024;

/// Buffers stream output and yields complete lines in stream order.
///
/// Buffering happens on bytes: `\n` never occurs inside a multi-byte UTF-8
/// sequence, so a character split across two chunks is reassembled before the
/// line is decoded. Trailing `\r` is left in place for the matcher to handle.
///
/// The pending buffer has no upper bound. A stream that never emits `\n` grows it
/// indefinitely; a warning is logged once when it passes 64 KiB.
#[derive(Debug, Default)]
pub struct LineAccumulator {
    pending: Vec<u8>,
    warned_oversized: bool,
}

impl LineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completes, in order.
    pub fn feed(&mut self, chunk: impl AsRef<[u8]>) -> Vec<String> {
        let chunk = chunk.as_ref();
        // `pending` never holds a '\n' between calls, so only the new bytes need a scan
        let Some(pos) = chunk.iter().rposition(|&b| b == b'\n') else {
            self.pending.extend_from_slice(chunk);
            self.check_oversized();
            return Vec::new();
        };
        let last_newline = self.pending.len() + pos;
        self.pending.extend_from_slice(chunk);

        let remainder = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, remainder);
        self.warned_oversized = false;
        self.check_oversized();

        // `complete` ends with '\n', so the final split piece is always empty
        let mut lines: Vec<String> = complete
            .split(|&b| b == b'\n')
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect();
        lines.pop();
        lines
    }

    /// The not-yet-terminated tail of the stream
    pub fn pending(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.pending)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn check_oversized(&mut self) {
        if !self.warned_oversized && self.pending.len() > OVERSIZED_PENDING_BYTES {
            self.warned_oversized = true;
            tracing::warn!(
                pending_bytes = self.pending.len(),
                "Server output has no line break in a long time, line buffer keeps growing"
            );
        }
    }
}

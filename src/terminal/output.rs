//! `OutputBuffer`: Single-syscall output buffer for ANSI sequences.

use super::style::{Rgb, Style};
use std::io::Write;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Pre-allocated buffer for building one frame of ANSI escape sequences.
///
/// Components draw into it through the [`Surface`](super::Surface) trait and
/// the render loop flushes it in a single `write()` per frame, so a
/// half-drawn frame never reaches the terminal.
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /// Create a new output buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Create a buffer sized for a typical terminal frame (4KB).
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Clear the buffer for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Get the buffer contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get the buffer length.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a string verbatim.
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
    }

    /// Write a string, stopping before it exceeds `max_cols` display columns.
    ///
    /// Returns the number of columns written. Wide graphemes that would
    /// straddle the limit are dropped rather than split.
    pub fn write_clipped(&mut self, s: &str, max_cols: u16) -> u16 {
        let mut used: u16 = 0;
        for grapheme in s.graphemes(true) {
            let width = u16::try_from(grapheme.width()).unwrap_or(u16::MAX);
            if used.saturating_add(width) > max_cols {
                break;
            }
            self.data.extend_from_slice(grapheme.as_bytes());
            used += width;
        }
        used
    }

    /// Move cursor to (x, y) position (1-indexed for ANSI).
    #[inline]
    pub fn cursor_move(&mut self, x: u16, y: u16) {
        // CSI row ; col H
        let _ = write!(self.data, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1);
    }

    /// Set foreground color (true color).
    #[inline]
    pub fn set_fg(&mut self, color: Rgb) {
        let _ = write!(self.data, "\x1b[38;2;{};{};{}m", color.r, color.g, color.b);
    }

    /// Set background color (true color).
    #[inline]
    pub fn set_bg(&mut self, color: Rgb) {
        let _ = write!(self.data, "\x1b[48;2;{};{};{}m", color.r, color.g, color.b);
    }

    /// Turn on the given text attributes.
    pub fn set_style(&mut self, style: Style) {
        for (flag, code) in [
            (Style::BOLD, 1),
            (Style::DIM, 2),
            (Style::ITALIC, 3),
            (Style::UNDERLINE, 4),
            (Style::REVERSED, 7),
        ] {
            if style.contains(flag) {
                let _ = write!(self.data, "\x1b[{code}m");
            }
        }
    }

    /// Reset all attributes.
    #[inline]
    pub fn reset_attrs(&mut self) {
        self.data.extend_from_slice(b"\x1b[0m");
    }

    /// Clear the entire screen.
    #[inline]
    pub fn clear_screen(&mut self) {
        self.data.extend_from_slice(b"\x1b[2J");
    }

    /// Ask the terminal to resize its text area (XTWINOPS 8).
    #[inline]
    pub fn resize_window(&mut self, width: u16, height: u16) {
        let _ = write!(self.data, "\x1b[8;{height};{width}t");
    }

    /// Flush to a writer in a single syscall.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn flush_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.data)?;
        writer.flush()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_move_is_one_indexed() {
        let mut out = OutputBuffer::new();
        out.cursor_move(0, 0);
        out.cursor_move(4, 9);
        assert_eq!(out.as_bytes(), b"\x1b[1;1H\x1b[10;5H");
    }

    #[test]
    fn test_write_clipped_respects_width() {
        let mut out = OutputBuffer::new();
        assert_eq!(out.write_clipped("hello world", 5), 5);
        assert_eq!(out.as_bytes(), b"hello");
    }

    #[test]
    fn test_write_clipped_drops_straddling_wide_grapheme() {
        let mut out = OutputBuffer::new();
        // Each CJK character is two columns wide.
        assert_eq!(out.write_clipped("日本語", 5), 4);
        assert_eq!(std::str::from_utf8(out.as_bytes()).unwrap(), "日本");
    }

    #[test]
    fn test_style_codes() {
        let mut out = OutputBuffer::new();
        out.set_style(Style::BOLD | Style::REVERSED);
        assert_eq!(out.as_bytes(), b"\x1b[1m\x1b[7m");
    }
}

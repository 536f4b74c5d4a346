//! Surface: the drawing target shared by the render loop and components.
//!
//! Only the render thread ever holds a `&mut dyn Surface`. Components receive
//! it inside [`Component::draw`](crate::Component::draw) and must not keep it.

use super::output::OutputBuffer;
use super::style::{Rgb, Style};
use std::io::{self, Write};

/// An output target for one terminal frame.
///
/// The engine calls [`clear_all`](Self::clear_all),
/// [`set_cursor_position`](Self::set_cursor_position),
/// [`reset_style`](Self::reset_style),
/// [`set_viewport_size`](Self::set_viewport_size) and
/// [`present`](Self::present); components use the drawing methods.
pub trait Surface: Send {
    /// Clear the whole screen.
    fn clear_all(&mut self);

    /// Move the cursor to a zero-based cell position.
    fn set_cursor_position(&mut self, x: u16, y: u16);

    /// Reset colors and attributes to the terminal defaults.
    fn reset_style(&mut self);

    /// Request a viewport of `width` x `height` cells.
    fn set_viewport_size(&mut self, width: u16, height: u16);

    /// Write text at the cursor position.
    fn print(&mut self, text: &str);

    /// Set the foreground color.
    fn set_fg(&mut self, color: Rgb);

    /// Set the background color.
    fn set_bg(&mut self, color: Rgb);

    /// Turn on text attributes.
    fn set_style(&mut self, style: Style);

    /// Push everything drawn since the last call to the terminal.
    fn present(&mut self) -> io::Result<()>;

    /// Move the cursor and write text.
    fn print_at(&mut self, x: u16, y: u16, text: &str) {
        self.set_cursor_position(x, y);
        self.print(text);
    }
}

/// A [`Surface`] that encodes ANSI escape sequences into a frame buffer and
/// writes them to `W` once per [`present`](Surface::present).
pub struct AnsiSurface<W: Write + Send> {
    writer: W,
    output: OutputBuffer,
    /// Last viewport size requested, so resizes are only emitted on change.
    viewport: Option<(u16, u16)>,
    /// Column budget for `print`, tracked from the cursor position.
    width: u16,
    cursor_x: u16,
}

impl<W: Write + Send> AnsiSurface<W> {
    /// Create a surface writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            output: OutputBuffer::with_capacity(65536),
            viewport: None,
            width: u16::MAX,
            cursor_x: 0,
        }
    }

    /// Get a reference to the underlying writer.
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Bytes buffered for the frame in progress.
    pub fn pending(&self) -> &[u8] {
        self.output.as_bytes()
    }
}

impl AnsiSurface<io::Stdout> {
    /// Create a surface writing to the process's stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> Surface for AnsiSurface<W> {
    fn clear_all(&mut self) {
        self.output.reset_attrs();
        self.output.clear_screen();
    }

    fn set_cursor_position(&mut self, x: u16, y: u16) {
        self.output.cursor_move(x, y);
        self.cursor_x = x;
    }

    fn reset_style(&mut self) {
        self.output.reset_attrs();
    }

    fn set_viewport_size(&mut self, width: u16, height: u16) {
        if self.viewport != Some((width, height)) {
            self.output.resize_window(width, height);
            self.viewport = Some((width, height));
            self.width = width;
        }
    }

    fn print(&mut self, text: &str) {
        let budget = self.width.saturating_sub(self.cursor_x);
        let used = self.output.write_clipped(text, budget);
        self.cursor_x = self.cursor_x.saturating_add(used);
    }

    fn set_fg(&mut self, color: Rgb) {
        self.output.set_fg(color);
    }

    fn set_bg(&mut self, color: Rgb) {
        self.output.set_bg(color);
    }

    fn set_style(&mut self, style: Style) {
        self.output.set_style(style);
    }

    fn present(&mut self) -> io::Result<()> {
        if self.output.is_empty() {
            return Ok(());
        }
        let result = self.output.flush_to(&mut self.writer);
        self.output.clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(bytes: &[u8], rows: u16, cols: u16) -> vt100::Parser {
        let mut parser = vt100::Parser::new(rows, cols, 0);
        parser.process(bytes);
        parser
    }

    #[test]
    fn test_print_at_lands_on_screen() {
        let mut surface = AnsiSurface::new(Vec::new());
        surface.print_at(2, 1, "hi");
        surface.present().unwrap();

        let parser = screen(surface.writer(), 5, 20);
        assert_eq!(parser.screen().contents_between(1, 2, 1, 4), "hi");
    }

    #[test]
    fn test_print_clips_to_viewport() {
        let mut surface = AnsiSurface::new(Vec::new());
        surface.set_viewport_size(10, 3);
        surface.print_at(6, 0, "abcdefgh");
        surface.present().unwrap();

        let parser = screen(surface.writer(), 3, 20);
        let row = parser.screen().contents_between(0, 0, 0, 20);
        assert_eq!(row.trim(), "abcd");
    }

    #[test]
    fn test_viewport_only_emitted_on_change() {
        let mut surface = AnsiSurface::new(Vec::new());
        surface.set_viewport_size(100, 30);
        surface.set_viewport_size(100, 30);
        assert_eq!(surface.pending(), b"\x1b[8;30;100t");
    }

    #[test]
    fn test_present_empties_frame() {
        let mut surface = AnsiSurface::new(Vec::new());
        surface.present().unwrap();
        assert!(surface.writer().is_empty());

        surface.print("x");
        surface.present().unwrap();
        assert!(surface.pending().is_empty());
        assert_eq!(surface.writer().as_slice(), b"x");
    }
}

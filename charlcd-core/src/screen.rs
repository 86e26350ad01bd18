//! Two-line text buffers and scroll state
//!
//! Text longer than the 16 visible columns is presented through a sliding
//! window. Each call to [`Screen::next_frame`] is one render tick: it consumes
//! pending updates, captures what the panel should show, then advances the
//! scroll offsets for the following tick.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::hd44780::set_ddram_address;

/// Visible characters per line
pub const DISPLAY_COLS: usize = 16;

/// Number of lines on the panel
pub const DISPLAY_ROWS: usize = 2;

/// Longest text a line will hold; longer input is truncated
pub const MAX_TEXT_LEN: usize = 127;

/// Panel line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    Top = 0,
    Bottom = 1,
}

/// Line index outside `0..DISPLAY_ROWS`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidLine(pub u8);

impl Line {
    /// Both lines, top first
    pub const ALL: [Line; DISPLAY_ROWS] = [Line::Top, Line::Bottom];

    /// Array index of this line
    pub const fn index(self) -> usize {
        self as usize
    }

    /// DDRAM offset of the first cell on this line
    pub const fn ddram_offset(self) -> u8 {
        match self {
            Line::Top => 0x00,
            Line::Bottom => 0x40,
        }
    }

    /// Set DDRAM Address instruction for the first cell (0x80 / 0xC0)
    pub const fn ddram_address(self) -> u8 {
        set_ddram_address(self.ddram_offset())
    }
}

impl TryFrom<u8> for Line {
    type Error = InvalidLine;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Line::Top),
            1 => Ok(Line::Bottom),
            other => Err(InvalidLine(other)),
        }
    }
}

/// How overflowing text moves across the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScrollMode {
    /// Slide from the start to the end of the text, then snap back
    #[default]
    Rollback,
    /// Treat the text as a ring and keep sliding through its start
    Circular,
}

/// One line of text with its scroll position
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    text: Vec<u8, MAX_TEXT_LEN>,
    offset: usize,
    dirty: bool,
}

impl LineBuffer {
    /// Create an empty, clean line
    pub const fn new() -> Self {
        Self {
            text: Vec::new(),
            offset: 0,
            dirty: false,
        }
    }

    /// Replace the text and flag the line for redraw
    ///
    /// Input stops at the first NUL byte and is truncated to
    /// [`MAX_TEXT_LEN`] bytes.
    pub fn set(&mut self, text: &[u8]) {
        let end = text.iter().position(|&b| b == 0).unwrap_or(text.len());
        let end = end.min(MAX_TEXT_LEN);

        self.text.clear();
        // Cannot fail: `end` is bounded by the capacity
        let _ = self.text.extend_from_slice(&text[..end]);
        self.offset = 0;
        self.dirty = true;
    }

    /// Current text
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Current scroll offset
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Check if the line changed since the last tick
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag the line for redraw without changing its text
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Consume the dirty flag, returning whether it was set
    pub fn take_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }

    /// Check if the text is wider than the panel
    pub fn overflows(&self) -> bool {
        self.text.len() > DISPLAY_COLS
    }

    /// Number of distinct window positions for `mode`
    pub fn scroll_period(&self, mode: ScrollMode) -> usize {
        let len = self.text.len();
        if len <= DISPLAY_COLS {
            return 1;
        }
        match mode {
            ScrollMode::Rollback => len - DISPLAY_COLS + 1,
            ScrollMode::Circular => len,
        }
    }

    /// The 16 characters visible at the current offset
    pub fn window(&self, mode: ScrollMode) -> [u8; DISPLAY_COLS] {
        let mut row = [b' '; DISPLAY_COLS];
        let text = self.text.as_slice();

        if !self.overflows() {
            row[..text.len()].copy_from_slice(text);
            return row;
        }

        match mode {
            ScrollMode::Rollback => {
                row.copy_from_slice(&text[self.offset..self.offset + DISPLAY_COLS]);
            }
            ScrollMode::Circular => {
                for (i, cell) in row.iter_mut().enumerate() {
                    *cell = text[(self.offset + i) % text.len()];
                }
            }
        }
        row
    }

    /// Move the window one character further
    pub fn advance(&mut self, mode: ScrollMode) {
        self.offset = (self.offset + 1) % self.scroll_period(mode);
    }

    fn clear(&mut self) {
        self.text.clear();
        self.offset = 0;
        self.dirty = true;
    }
}

/// What the panel should show after one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Issue Clear Display before drawing
    pub clear: bool,
    /// Visible characters, one row per line
    pub rows: [[u8; DISPLAY_COLS]; DISPLAY_ROWS],
}

impl Frame {
    /// Two rows of spaces, no clear
    pub const fn blank() -> Self {
        Self {
            clear: false,
            rows: [[b' '; DISPLAY_COLS]; DISPLAY_ROWS],
        }
    }

    /// Characters for `line`
    pub fn row(&self, line: Line) -> &[u8; DISPLAY_COLS] {
        &self.rows[line.index()]
    }
}

/// Both panel lines plus the scroll policy
#[derive(Debug, Clone, Default)]
pub struct Screen {
    lines: [LineBuffer; DISPLAY_ROWS],
    mode: ScrollMode,
}

impl Screen {
    /// Create an empty screen
    pub const fn new(mode: ScrollMode) -> Self {
        Self {
            lines: [LineBuffer::new(), LineBuffer::new()],
            mode,
        }
    }

    /// Scroll policy in use
    pub fn mode(&self) -> ScrollMode {
        self.mode
    }

    /// Replace the text of one line
    pub fn set_line(&mut self, line: Line, text: &[u8]) {
        self.lines[line.index()].set(text);
    }

    /// Empty both lines
    pub fn clear(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
    }

    /// Flag both lines so the next frame clears and redraws everything
    pub fn invalidate(&mut self) {
        for line in &mut self.lines {
            line.mark_dirty();
        }
    }

    /// Access a line buffer
    pub fn line(&self, line: Line) -> &LineBuffer {
        &self.lines[line.index()]
    }

    /// Run one render tick
    ///
    /// Dirty flags are checked independently on both lines; any dirty line
    /// has its offset reset and requests a single Clear Display for the
    /// frame. Offsets advance after the windows are captured.
    pub fn next_frame(&mut self) -> Frame {
        let mut frame = Frame::blank();

        for buf in &mut self.lines {
            if buf.take_dirty() {
                buf.offset = 0;
                frame.clear = true;
            }
        }

        let mode = self.mode;
        for (row, buf) in frame.rows.iter_mut().zip(self.lines.iter_mut()) {
            *row = buf.window(mode);
            buf.advance(mode);
        }

        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWENTY: &[u8] = b"ABCDEFGHIJKLMNOPQRST";

    #[test]
    fn test_line_from_index() {
        assert_eq!(Line::try_from(0), Ok(Line::Top));
        assert_eq!(Line::try_from(1), Ok(Line::Bottom));
        assert_eq!(Line::try_from(2), Err(InvalidLine(2)));
        assert_eq!(Line::Top.ddram_address(), 0x80);
        assert_eq!(Line::Bottom.ddram_address(), 0xC0);
    }

    #[test]
    fn test_short_text_is_padded() {
        let mut screen = Screen::default();
        screen.set_line(Line::Top, b"Hello");

        for _ in 0..3 {
            let frame = screen.next_frame();
            assert_eq!(frame.row(Line::Top), b"Hello           ");
            assert_eq!(frame.row(Line::Bottom), b"                ");
            assert_eq!(screen.line(Line::Top).offset(), 0);
        }
    }

    #[test]
    fn test_exactly_sixteen_does_not_scroll() {
        let mut screen = Screen::default();
        screen.set_line(Line::Top, b"0123456789ABCDEF");

        let first = screen.next_frame();
        let second = screen.next_frame();
        assert_eq!(first.rows, second.rows);
        assert_eq!(screen.line(Line::Top).offset(), 0);
    }

    #[test]
    fn test_rollback_window_sequence() {
        let mut screen = Screen::default();
        screen.set_line(Line::Bottom, TWENTY);

        for start in 0..5 {
            let frame = screen.next_frame();
            assert_eq!(frame.row(Line::Bottom), &TWENTY[start..start + 16]);
        }

        // Sixth tick snaps back to the start
        let frame = screen.next_frame();
        assert_eq!(frame.row(Line::Bottom), &TWENTY[0..16]);
    }

    #[test]
    fn test_circular_wraps_through_start() {
        let mut screen = Screen::new(ScrollMode::Circular);
        screen.set_line(Line::Top, TWENTY);

        for _ in 0..6 {
            screen.next_frame();
        }
        let frame = screen.next_frame();
        assert_eq!(frame.row(Line::Top), b"GHIJKLMNOPQRSTAB");
        assert_eq!(screen.line(Line::Top).scroll_period(ScrollMode::Circular), 20);
    }

    #[test]
    fn test_set_line_resets_offset() {
        let mut screen = Screen::default();
        screen.set_line(Line::Top, TWENTY);
        for _ in 0..3 {
            screen.next_frame();
        }
        assert_eq!(screen.line(Line::Top).offset(), 3);

        screen.set_line(Line::Top, TWENTY);
        let frame = screen.next_frame();
        assert!(frame.clear);
        assert_eq!(frame.row(Line::Top), &TWENTY[0..16]);
    }

    #[test]
    fn test_dirty_flags_consumed_once() {
        let mut screen = Screen::default();
        screen.set_line(Line::Top, b"a");
        screen.set_line(Line::Bottom, b"b");

        let frame = screen.next_frame();
        assert!(frame.clear);
        assert!(!screen.line(Line::Top).is_dirty());
        assert!(!screen.line(Line::Bottom).is_dirty());

        assert!(!screen.next_frame().clear);
    }

    #[test]
    fn test_both_dirty_lines_reset_in_same_tick() {
        let mut screen = Screen::default();
        screen.set_line(Line::Top, TWENTY);
        screen.set_line(Line::Bottom, TWENTY);
        for _ in 0..2 {
            screen.next_frame();
        }

        screen.invalidate();
        let frame = screen.next_frame();
        assert!(frame.clear);
        assert_eq!(frame.row(Line::Top), &TWENTY[0..16]);
        assert_eq!(frame.row(Line::Bottom), &TWENTY[0..16]);
    }

    #[test]
    fn test_clear_blanks_both_lines() {
        let mut screen = Screen::default();
        screen.set_line(Line::Top, b"temp 21.5C");
        screen.set_line(Line::Bottom, TWENTY);
        screen.next_frame();

        screen.clear();
        let frame = screen.next_frame();
        assert!(frame.clear);
        assert_eq!(frame.rows, [[b' '; 16]; 2]);
    }

    #[test]
    fn test_truncates_long_input() {
        let long = [b'x'; 200];
        let mut line = LineBuffer::new();
        line.set(&long);
        assert_eq!(line.text().len(), MAX_TEXT_LEN);
    }

    #[test]
    fn test_text_stops_at_nul() {
        let mut line = LineBuffer::new();
        line.set(b"abc\0def");
        assert_eq!(line.text(), b"abc");
    }

    #[test]
    fn test_empty_text_is_legal() {
        let mut screen = Screen::default();
        screen.set_line(Line::Top, b"");
        let frame = screen.next_frame();
        assert!(frame.clear);
        assert_eq!(frame.row(Line::Top), b"                ");
    }
}

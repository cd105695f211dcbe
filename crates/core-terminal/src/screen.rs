//! The `Screen` capability: the only surface the display layer
//! uses to paint. `core-render::Formatter` never touches this (it only
//! produces bytes and column maps); something above it (an editor/display
//! loop) pushes those at a `Screen`.

use anyhow::Result;
use crossterm::{
    cursor, execute, queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{Clear, ClearType},
};
use std::io::{Stdout, Write, stdout};

/// A display attribute applied to a single cell or run of `puts`. Kept to a
/// single bit rather than a full style struct: the core doesn't need more
/// than "this is the point/selection/status line" to paint correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    None,
    Reverse,
    Status,
}

pub trait Screen {
    fn clear(&mut self) -> Result<()>;
    fn refresh(&mut self) -> Result<()>;
    fn alert(&mut self) -> Result<()>;
    fn move_to(&mut self, row: u16, col: u16) -> Result<()>;
    fn put(&mut self, byte: u8, highlight: Highlight) -> Result<()>;
    fn puts(&mut self, s: &str, highlight: Highlight) -> Result<()>;
    fn height(&self) -> u16;
    fn width(&self) -> u16;
}

pub struct CrosstermScreen {
    out: Stdout,
    height: u16,
    width: u16,
}

impl CrosstermScreen {
    pub fn new() -> Result<Self> {
        let (width, height) = crossterm::terminal::size()?;
        Ok(Self {
            out: stdout(),
            height,
            width,
        })
    }

    fn apply_highlight(&mut self, highlight: Highlight) -> Result<()> {
        match highlight {
            Highlight::None => queue!(self.out, SetAttribute(Attribute::Reset))?,
            Highlight::Reverse | Highlight::Status => {
                queue!(self.out, SetAttribute(Attribute::Reverse))?
            }
        }
        Ok(())
    }
}

impl Screen for CrosstermScreen {
    fn clear(&mut self) -> Result<()> {
        queue!(self.out, Clear(ClearType::All))?;
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn alert(&mut self) -> Result<()> {
        write!(self.out, "\x07")?;
        Ok(())
    }

    fn move_to(&mut self, row: u16, col: u16) -> Result<()> {
        queue!(self.out, cursor::MoveTo(col, row))?;
        Ok(())
    }

    fn put(&mut self, byte: u8, highlight: Highlight) -> Result<()> {
        self.apply_highlight(highlight)?;
        queue!(self.out, Print(byte as char))?;
        Ok(())
    }

    fn puts(&mut self, s: &str, highlight: Highlight) -> Result<()> {
        self.apply_highlight(highlight)?;
        queue!(self.out, Print(s))?;
        Ok(())
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn width(&self) -> u16 {
        self.width
    }
}

/// In-memory `Screen` for tests: records every painted cell in a flat
/// `Vec<(u8, Highlight)>` buffer of `height * width` cells plus a cursor
/// position, an alert count, and a refresh count.
pub struct MockScreen {
    pub cells: Vec<(u8, Highlight)>,
    pub cursor: (u16, u16),
    pub alerts: usize,
    pub refreshes: usize,
    height: u16,
    width: u16,
}

impl MockScreen {
    pub fn new(height: u16, width: u16) -> Self {
        Self {
            cells: vec![(b' ', Highlight::None); height as usize * width as usize],
            cursor: (0, 0),
            alerts: 0,
            refreshes: 0,
            height,
            width,
        }
    }

    fn index(&self, row: u16, col: u16) -> usize {
        row as usize * self.width as usize + col as usize
    }
}

impl Screen for MockScreen {
    fn clear(&mut self) -> Result<()> {
        self.cells.fill((b' ', Highlight::None));
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        self.refreshes += 1;
        Ok(())
    }

    fn alert(&mut self) -> Result<()> {
        self.alerts += 1;
        Ok(())
    }

    fn move_to(&mut self, row: u16, col: u16) -> Result<()> {
        self.cursor = (row, col);
        Ok(())
    }

    fn put(&mut self, byte: u8, highlight: Highlight) -> Result<()> {
        let (row, col) = self.cursor;
        if row < self.height && col < self.width {
            let idx = self.index(row, col);
            self.cells[idx] = (byte, highlight);
        }
        self.cursor.1 = self.cursor.1.saturating_add(1);
        Ok(())
    }

    fn puts(&mut self, s: &str, highlight: Highlight) -> Result<()> {
        for b in s.bytes() {
            self.put(b, highlight)?;
        }
        Ok(())
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn width(&self) -> u16 {
        self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_screen_records_painted_cells() {
        let mut screen = MockScreen::new(3, 10);
        screen.move_to(1, 2).unwrap();
        screen.puts("hi", Highlight::None).unwrap();
        assert_eq!(screen.cells[1 * 10 + 2].0, b'h');
        assert_eq!(screen.cells[1 * 10 + 3].0, b'i');
    }

    #[test]
    fn mock_screen_tracks_alerts_and_refreshes() {
        let mut screen = MockScreen::new(1, 1);
        screen.alert().unwrap();
        screen.alert().unwrap();
        screen.refresh().unwrap();
        assert_eq!(screen.alerts, 2);
        assert_eq!(screen.refreshes, 1);
    }
}

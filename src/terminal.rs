//! Terminal presentation of rendered frames

use crossterm::{
    cursor, execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, stdout, BufWriter, Stdout, Write};

/// Terminal display handler with buffered output.
///
/// Enters the alternate screen on creation and restores the terminal on drop.
/// Frames are written with explicit per-row cursor positioning instead of
/// newlines, so the last row never scrolls the screen.
pub struct TerminalDisplay {
    width: u16,
    height: u16,
    buffer: BufWriter<Stdout>,
}

impl TerminalDisplay {
    pub fn new() -> io::Result<Self> {
        let mut out = stdout();
        execute!(out, EnterAlternateScreen, cursor::Hide)?;
        execute!(out, Clear(ClearType::All))?;

        // Query size after entering the alternate screen
        let (width, height) = terminal::size()?;

        Ok(Self {
            width,
            height,
            buffer: BufWriter::new(out),
        })
    }

    /// Character-grid dimensions of the display
    pub fn size(&self) -> (usize, usize) {
        (self.width as usize, self.height as usize)
    }

    /// Write one composited frame, flushing once at the end
    pub fn present(&mut self, frame: &str) -> io::Result<()> {
        self.buffer.write_all(frame_commands(frame).as_bytes())?;
        self.buffer.flush()
    }
}

/// Prefix every frame row with a cursor-positioning escape for its line
fn frame_commands(frame: &str) -> String {
    let mut out = String::with_capacity(frame.len() + frame.lines().count() * 8);
    for (row, line) in frame.lines().enumerate() {
        out.push_str(&format!("\x1b[{};1H", row + 1));
        out.push_str(line);
    }
    out
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = self.buffer.flush();
        let _ = execute!(stdout(), cursor::Show, LeaveAlternateScreen);
    }
}

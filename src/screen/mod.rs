//! Terminal screen — the presentation surface.
//!
//! Owns terminal setup and restore, drains crossterm events for the input
//! tracker, and presents the canvas. The first presentation paints the full
//! grid; afterwards only cells that changed since the previous frame are
//! redrawn.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use crossterm::{cursor, event, execute, queue, style, terminal};

use crate::canvas::Canvas;
use crate::types::{Cell, Color, NamedColor};

pub struct TerminalScreen {
    stdout: io::Stdout,
    prev: Option<Vec<Vec<Cell>>>,
}

impl TerminalScreen {
    /// Take over the terminal: raw mode, alternate screen, mouse capture,
    /// key-release reporting, window title.
    pub fn new(title: &str) -> Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::SetTitle(title),
            cursor::Hide,
            event::EnableMouseCapture,
            event::PushKeyboardEnhancementFlags(
                event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            ),
            terminal::Clear(terminal::ClearType::All),
        )?;
        Ok(TerminalScreen {
            stdout,
            prev: None,
        })
    }

    /// Put the terminal back the way we found it. Best effort: teardown
    /// failures must not mask the error that ended the session.
    pub fn restore(&mut self) {
        let _ = execute!(
            self.stdout,
            event::PopKeyboardEnhancementFlags,
            event::DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen,
        );
        let _ = terminal::disable_raw_mode();
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        Ok(terminal::size()?)
    }

    /// Collect every pending event, waiting at most `wait` for the first.
    /// The wait doubles as the frame pacing window.
    pub fn drain_events(&mut self, wait: Duration) -> Result<Vec<event::Event>> {
        let mut events = Vec::new();
        if event::poll(wait)? {
            events.push(event::read()?);
            while event::poll(Duration::ZERO)? {
                events.push(event::read()?);
            }
        }
        Ok(events)
    }

    pub fn present(&mut self, canvas: &Canvas) -> Result<()> {
        match self.prev.take() {
            Some(prev) if grids_match(&prev, canvas) => self.present_diff(&prev, canvas)?,
            _ => self.present_full(canvas)?,
        }
        self.prev = Some(canvas.rows().to_vec());
        Ok(())
    }

    fn present_full(&mut self, canvas: &Canvas) -> Result<()> {
        queue!(self.stdout, terminal::Clear(terminal::ClearType::All))?;
        for (y, row) in canvas.rows().iter().enumerate() {
            queue!(self.stdout, cursor::MoveTo(0, y as u16))?;
            for cell in row {
                queue!(
                    self.stdout,
                    style::PrintStyledContent(style::StyledContent::new(
                        to_content_style(cell),
                        cell.ch,
                    ))
                )?;
            }
        }
        self.stdout.flush()?;
        Ok(())
    }

    fn present_diff(&mut self, prev: &[Vec<Cell>], canvas: &Canvas) -> Result<()> {
        for (y, (prev_row, row)) in prev.iter().zip(canvas.rows()).enumerate() {
            for (x, (prev_cell, cell)) in prev_row.iter().zip(row).enumerate() {
                if prev_cell != cell {
                    queue!(
                        self.stdout,
                        cursor::MoveTo(x as u16, y as u16),
                        style::PrintStyledContent(style::StyledContent::new(
                            to_content_style(cell),
                            cell.ch,
                        )),
                    )?;
                }
            }
        }
        self.stdout.flush()?;
        Ok(())
    }
}

fn grids_match(prev: &[Vec<Cell>], canvas: &Canvas) -> bool {
    prev.len() == canvas.height() as usize
        && prev.first().map_or(0, Vec::len) == canvas.width() as usize
}

// ---------------------------------------------------------------------------
// Style conversion
// ---------------------------------------------------------------------------

pub fn to_content_style(cell: &Cell) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    cs.foreground_color = Some(to_ct_color(cell.fg));
    cs.background_color = Some(to_ct_color(cell.bg));
    cs
}

pub fn to_ct_color(c: Color) -> style::Color {
    match c {
        Color::Named(n) => match n {
            NamedColor::Black => style::Color::Black,
            NamedColor::Red => style::Color::Red,
            NamedColor::Green => style::Color::Green,
            NamedColor::Yellow => style::Color::Yellow,
            NamedColor::Blue => style::Color::Blue,
            NamedColor::Magenta => style::Color::Magenta,
            NamedColor::Cyan => style::Color::Cyan,
            NamedColor::White => style::Color::White,
        },
        Color::Rgb { r, g, b } => style::Color::Rgb { r, g, b },
    }
}

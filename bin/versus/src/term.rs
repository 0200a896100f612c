//! Crossterm-backed screen. Drawing is a pure function of the frame; a
//! repaint with the same frame produces the same terminal contents.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};

use tetrion::{Piece, Rot, COLS, ROWS};

use crate::config::block_color;
use crate::view::{CellView, Frame};

const FIELD_X: u16 = 1;
const FIELD_Y: u16 = 1;
const CELL_W: u16 = 2;
const SIDE_X: u16 = FIELD_X + COLS as u16 * CELL_W + 4;
const PEER_X: u16 = SIDE_X + 20;

pub struct Screen {
    out: Stdout,
    cols: u16,
    rows: u16,
}

impl Screen {
    /// Takes over the terminal: raw mode, alternate screen, hidden cursor.
    pub fn enter() -> Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, Hide)?;
        let (cols, rows) = terminal::size()?;
        Ok(Self { out, cols, rows })
    }

    /// Non-blocking key poll. Only key presses count.
    pub fn poll_key(&mut self, timeout: Duration) -> Result<Option<KeyCode>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press | KeyEventKind::Repeat,
                ..
            }) => Ok(Some(code)),
            Event::Resize(cols, rows) => {
                self.cols = cols;
                self.rows = rows;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Blocks until any key press.
    pub fn wait_key(&mut self) -> Result<KeyCode> {
        loop {
            if let Some(code) = self.poll_key(Duration::from_millis(250))? {
                return Ok(code);
            }
        }
    }

    fn put(&mut self, x: u16, y: u16, text: &str) -> Result<()> {
        // clip instead of wrapping on small terminals
        if y >= self.rows || x >= self.cols {
            return Ok(());
        }
        queue!(self.out, MoveTo(x, y), Print(text))?;
        Ok(())
    }

    fn put_colored(&mut self, x: u16, y: u16, text: &str, color: Color) -> Result<()> {
        if y >= self.rows || x >= self.cols {
            return Ok(());
        }
        queue!(
            self.out,
            MoveTo(x, y),
            SetForegroundColor(color),
            Print(text),
            ResetColor
        )?;
        Ok(())
    }

    pub fn draw_countdown(&mut self, text: &str) -> Result<()> {
        queue!(self.out, Clear(ClearType::All))?;
        let x = (self.cols / 2).saturating_sub(text.len() as u16 / 2);
        let y = self.rows / 2;
        queue!(self.out, MoveTo(x, y), SetAttribute(Attribute::Bold))?;
        queue!(self.out, Print(text), SetAttribute(Attribute::Reset))?;
        self.out.flush()?;
        Ok(())
    }

    pub fn draw(&mut self, frame: &Frame) -> Result<()> {
        queue!(self.out, Clear(ClearType::All))?;

        self.draw_field(frame)?;
        self.draw_sidebar(frame)?;
        self.draw_peers(frame)?;
        self.draw_footer(frame)?;

        self.out.flush()?;
        Ok(())
    }

    fn draw_field(&mut self, frame: &Frame) -> Result<()> {
        let width = COLS as u16 * CELL_W;
        let border: String = "#".repeat(width as usize + 2);
        self.put(FIELD_X - 1, FIELD_Y - 1, &border)?;
        self.put(FIELD_X - 1, FIELD_Y + ROWS as u16, &border)?;

        for (y, row) in frame.board.iter().enumerate() {
            let sy = FIELD_Y + y as u16;
            self.put(FIELD_X - 1, sy, "#")?;
            self.put(FIELD_X + width, sy, "#")?;
            for (x, cell) in row.iter().enumerate() {
                let sx = FIELD_X + x as u16 * CELL_W;
                match cell {
                    CellView::Empty => {}
                    CellView::Filled(block) => {
                        self.put_colored(sx, sy, "[]", block_color(*block))?;
                    }
                    CellView::Ghost(block) => {
                        self.put_colored(sx, sy, "::", block_color(*block))?;
                    }
                }
            }
        }
        Ok(())
    }

    fn draw_sidebar(&mut self, frame: &Frame) -> Result<()> {
        let hold_label = if frame.hold_used { "HOLD (used)" } else { "HOLD" };
        self.put(SIDE_X, FIELD_Y, hold_label)?;
        self.draw_preview(SIDE_X, FIELD_Y + 1, frame.hold)?;

        self.put(SIDE_X, FIELD_Y + 6, "NEXT")?;
        self.draw_preview(SIDE_X, FIELD_Y + 7, Some(frame.next))?;

        let mut y = FIELD_Y + 12;
        self.put(SIDE_X, y, &format!("Player: {}", frame.player))?;
        y += 1;
        self.put(SIDE_X, y, &format!("Lines:  {}", frame.lines_cleared))?;
        y += 1;
        self.put(SIDE_X, y, &format!("Sent:   {}", frame.lines_sent))?;
        y += 1;
        self.put(SIDE_X, y, &format!("KOs:    {}", frame.kos))?;
        y += 1;
        if frame.b2b {
            self.put(SIDE_X, y, "BACK-TO-BACK")?;
        }
        y += 1;

        if !frame.garbage.is_empty() {
            let total: u32 = frame.garbage.iter().map(|g| u32::from(g.lines)).sum();
            self.put(SIDE_X, y, &format!("Incoming: {total}"))?;
            // one marker per queued attack, hotter as the buffer runs out
            for (i, entry) in frame.garbage.iter().take(8).enumerate() {
                let color = match entry.buffer_pieces {
                    i8::MIN..=1 => Color::Red,
                    2 => Color::Yellow,
                    _ => Color::Green,
                };
                let marker = format!("{}", entry.lines);
                self.put_colored(SIDE_X + 10 + i as u16 * 2, y, &marker, color)?;
            }
        }
        Ok(())
    }

    fn draw_preview(&mut self, x: u16, y: u16, piece: Option<Piece>) -> Result<()> {
        let Some(piece) = piece else {
            self.put(x, y, "....")?;
            return Ok(());
        };
        let shape = piece.shape(Rot::N);
        let color = block_color(piece.into());
        for row in 0..2i8 {
            let mut line = String::new();
            for col in 0..4i8 {
                line.push_str(if shape.contains(col, row) { "[]" } else { "  " });
            }
            self.put_colored(x, y + row as u16, &line, color)?;
        }
        Ok(())
    }

    fn draw_peers(&mut self, frame: &Frame) -> Result<()> {
        if frame.peers.is_empty() {
            self.put(PEER_X, FIELD_Y, "(no opponents)")?;
            return Ok(());
        }
        let i = frame.selected_peer.min(frame.peers.len() - 1);
        let peer = &frame.peers[i];
        let status = if peer.dead { " [KO]" } else { "" };
        self.put(
            PEER_X,
            FIELD_Y - 1,
            &format!("{} ({}/{}){status}", peer.player, i + 1, frame.peers.len()),
        )?;

        for (y, row) in peer.board.iter().enumerate() {
            let sy = FIELD_Y + y as u16;
            self.put(PEER_X - 1, sy, "|")?;
            self.put(PEER_X + COLS as u16, sy, "|")?;
            for (x, cell) in row.iter().enumerate() {
                if let CellView::Filled(block) = cell {
                    self.put_colored(PEER_X + x as u16, sy, "#", block_color(*block))?;
                }
            }
        }
        Ok(())
    }

    fn draw_footer(&mut self, frame: &Frame) -> Result<()> {
        let base = FIELD_Y + ROWS as u16 + 1;
        if let Some(message) = &frame.message {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
            self.put(FIELD_X - 1, base, message)?;
            queue!(self.out, SetAttribute(Attribute::Reset))?;
        }

        for (i, record) in frame.leaderboard.iter().take(5).enumerate() {
            self.put(
                FIELD_X - 1,
                base + 1 + i as u16,
                &format!(
                    "{}. {} - {} lines, {} KOs",
                    i + 1,
                    record.player,
                    record.lines_sent,
                    record.kos
                ),
            )?;
        }
        Ok(())
    }

    pub fn draw_game_over(&mut self, frame: &Frame) -> Result<()> {
        queue!(self.out, Clear(ClearType::All))?;
        let cx = self.cols / 2;
        let y = (self.rows / 2).saturating_sub(6);

        queue!(self.out, SetAttribute(Attribute::Bold))?;
        self.put(cx.saturating_sub(4), y, "GAME OVER")?;
        queue!(self.out, SetAttribute(Attribute::Reset))?;

        self.put(
            cx.saturating_sub(10),
            y + 2,
            &format!("Lines sent: {}   KOs: {}", frame.lines_sent, frame.kos),
        )?;
        self.put(cx.saturating_sub(10), y + 4, "=== LEADERBOARD ===")?;
        for (i, record) in frame.leaderboard.iter().take(10).enumerate() {
            self.put(
                cx.saturating_sub(10),
                y + 5 + i as u16,
                &format!(
                    "{}. {} - {} lines, {} KOs",
                    i + 1,
                    record.player,
                    record.lines_sent,
                    record.kos
                ),
            )?;
        }
        self.put(cx.saturating_sub(12), y + 16, "Press any key to exit...")?;
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = execute!(self.out, LeaveAlternateScreen, Show);
        let _ = terminal::disable_raw_mode();
    }
}

//! Rendering layer.
//!
//! States describe a frame through the [`Canvas`] trait: sprites at boxes and
//! text at points, all in playfield coordinates. [`TerminalCanvas`] turns
//! those calls into a grid of coloured cells scaled to the terminal, and
//! only `present` touches the terminal itself.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::entities::{Direction, Facing, PowerUpKind, Rect, Source, FIELD_HEIGHT, FIELD_WIDTH};

// ── Drawing vocabulary ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sprite {
    Ship(Facing),
    Target { dead: bool },
    Turret { direction: Direction, active: bool },
    Projectile { direction: Direction, source: Source },
    PowerUp(PowerUpKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backdrop {
    /// Starfield behind the playfield.
    Space,
    /// Empty screen for menus and result screens.
    Plain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextStyle {
    Title,
    Body,
    Highlight,
    Hint,
    Hud,
}

/// Anything a state can draw a frame onto.
pub trait Canvas {
    fn backdrop(&mut self, backdrop: Backdrop);
    fn sprite(&mut self, sprite: Sprite, rect: Rect);
    fn text(&mut self, text: &str, x: i32, y: i32, align: Align, style: TextStyle);
}

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_STAR: Color = Color::DarkGrey;
const C_SHIP: Color = Color::White;
const C_TARGET: Color = Color::Green;
const C_TARGET_DEAD: Color = Color::DarkGrey;
const C_TURRET: Color = Color::Red;
const C_TURRET_DEAD: Color = Color::DarkRed;
const C_BULLET_PLAYER: Color = Color::Cyan;
const C_BULLET_ENEMY: Color = Color::Magenta;
const C_HINT: Color = Color::DarkGrey;

/// Glyph and colour for a sprite. Solid sprites fill their whole box,
/// the rest are a single glyph at the box centre.
fn art(sprite: Sprite) -> (char, Color, bool) {
    match sprite {
        Sprite::Ship(Facing::Left) => ('◄', C_SHIP, true),
        Sprite::Ship(Facing::Idle) => ('▲', C_SHIP, true),
        Sprite::Ship(Facing::Right) => ('►', C_SHIP, true),
        Sprite::Target { dead: false } => ('◉', C_TARGET, true),
        Sprite::Target { dead: true } => ('░', C_TARGET_DEAD, true),
        Sprite::Turret { direction, active } => {
            let glyph = match direction {
                Direction::Up => '╨',
                Direction::Down => '╥',
                Direction::Left => '╡',
                Direction::Right => '╞',
            };
            let color = if active { C_TURRET } else { C_TURRET_DEAD };
            (glyph, color, true)
        }
        Sprite::Projectile { direction, source } => {
            let glyph = match direction {
                Direction::Up => '║',
                Direction::Down => '↓',
                Direction::Left => '←',
                Direction::Right => '→',
            };
            let color = match source {
                Source::Player => C_BULLET_PLAYER,
                Source::Cannon => C_BULLET_ENEMY,
            };
            (glyph, color, false)
        }
        Sprite::PowerUp(PowerUpKind::Hp) => ('♥', Color::Magenta, false),
        Sprite::PowerUp(PowerUpKind::Ammo) => ('≡', Color::Yellow, false),
        Sprite::PowerUp(PowerUpKind::Speed) => ('»', Color::Cyan, false),
    }
}

fn text_color(style: TextStyle) -> Color {
    match style {
        TextStyle::Title => Color::Cyan,
        TextStyle::Body => Color::White,
        TextStyle::Highlight => Color::Yellow,
        TextStyle::Hint => C_HINT,
        TextStyle::Hud => Color::Yellow,
    }
}

// ── Terminal canvas ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
struct Cell {
    glyph: char,
    color: Color,
}

const BLANK: Cell = Cell {
    glyph: ' ',
    color: Color::Reset,
};

/// One frame of terminal cells. Row 0 and row `rows - 2` are the border,
/// the last row holds the controls hint, and the playfield is scaled into
/// the space between.
pub struct TerminalCanvas {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
    stars: Vec<(u16, u16)>,
    hint: String,
}

impl TerminalCanvas {
    pub fn new(cols: u16, rows: u16) -> Self {
        let mut canvas = TerminalCanvas {
            cols: 0,
            rows: 0,
            cells: Vec::new(),
            stars: Vec::new(),
            hint: "← → / A D : Move   SPACE : Shoot   ENTER : Confirm   Q : Quit".to_string(),
        };
        canvas.resize(cols, rows);
        canvas
    }

    /// Re-layout for a new terminal size. The starfield is seeded from the
    /// size so it stays put from frame to frame.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        if cols == self.cols && rows == self.rows {
            return;
        }
        self.cols = cols;
        self.rows = rows;
        self.cells = vec![BLANK; cols as usize * rows as usize];

        let (inner_w, inner_h) = self.inner_size();
        let mut rng = StdRng::seed_from_u64(((cols as u64) << 16) | rows as u64);
        let count = (inner_w as usize * inner_h as usize) / 40;
        self.stars = (0..count)
            .filter(|_| inner_w > 0 && inner_h > 0)
            .map(|_| (1 + rng.gen_range(0..inner_w), 1 + rng.gen_range(0..inner_h)))
            .collect();
    }

    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    fn inner_size(&self) -> (u16, u16) {
        (self.cols.saturating_sub(2), self.rows.saturating_sub(3))
    }

    /// Playfield point → terminal cell, clipped to the inner area.
    fn to_cell(&self, x: i32, y: i32) -> Option<(u16, u16)> {
        let (inner_w, inner_h) = self.inner_size();
        if x < 0 || y < 0 || x >= FIELD_WIDTH || y >= FIELD_HEIGHT {
            return None;
        }
        let col = 1 + (x as i64 * inner_w as i64 / FIELD_WIDTH as i64) as u16;
        let row = 1 + (y as i64 * inner_h as i64 / FIELD_HEIGHT as i64) as u16;
        Some((col, row))
    }

    fn put(&mut self, col: u16, row: u16, cell: Cell) {
        if col >= self.cols || row >= self.rows {
            return;
        }
        let idx = row as usize * self.cols as usize + col as usize;
        self.cells[idx] = cell;
    }

    fn fill(&mut self, rect: Rect, cell: Cell) {
        let clipped_x0 = rect.x.max(0);
        let clipped_y0 = rect.y.max(0);
        let clipped_x1 = (rect.right() - 1).min(FIELD_WIDTH - 1);
        let clipped_y1 = (rect.bottom() - 1).min(FIELD_HEIGHT - 1);
        let (Some((c0, r0)), Some((c1, r1))) = (
            self.to_cell(clipped_x0, clipped_y0),
            self.to_cell(clipped_x1, clipped_y1),
        ) else {
            return;
        };
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.put(col, row, cell);
            }
        }
    }

    /// Write the frame to the terminal.
    pub fn present<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.queue(terminal::Clear(terminal::ClearType::All))?;
        if self.cols < 3 || self.rows < 4 {
            return out.flush();
        }
        self.draw_border(out)?;

        let mut current = Color::Reset;
        for row in 1..self.rows.saturating_sub(2) {
            out.queue(cursor::MoveTo(1, row))?;
            let start = row as usize * self.cols as usize;
            let line = &self.cells[start + 1..start + self.cols.saturating_sub(1) as usize];
            for cell in line {
                if cell.color != current {
                    out.queue(style::SetForegroundColor(cell.color))?;
                    current = cell.color;
                }
                out.queue(Print(cell.glyph))?;
            }
        }

        // Controls hint (last row)
        out.queue(cursor::MoveTo(1, self.rows.saturating_sub(1)))?;
        out.queue(style::SetForegroundColor(C_HINT))?;
        out.queue(Print(&self.hint))?;

        // Park cursor in a harmless spot and flush
        out.queue(style::ResetColor)?;
        out.queue(cursor::MoveTo(0, self.rows.saturating_sub(1)))?;
        out.flush()?;
        Ok(())
    }

    fn draw_border<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let w = self.cols as usize;
        let bottom = self.rows.saturating_sub(2);

        out.queue(style::SetForegroundColor(C_BORDER))?;

        out.queue(cursor::MoveTo(0, 0))?;
        out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

        out.queue(cursor::MoveTo(0, bottom))?;
        out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

        for row in 1..bottom {
            out.queue(cursor::MoveTo(0, row))?;
            out.queue(Print("│"))?;
            out.queue(cursor::MoveTo(self.cols.saturating_sub(1), row))?;
            out.queue(Print("│"))?;
        }

        Ok(())
    }
}

impl Canvas for TerminalCanvas {
    fn backdrop(&mut self, backdrop: Backdrop) {
        self.cells.fill(BLANK);
        if backdrop == Backdrop::Space {
            let star = Cell {
                glyph: '·',
                color: C_STAR,
            };
            for (col, row) in self.stars.clone() {
                self.put(col, row, star);
            }
        }
    }

    fn sprite(&mut self, sprite: Sprite, rect: Rect) {
        let (glyph, color, solid) = art(sprite);
        let cell = Cell { glyph, color };
        if solid {
            self.fill(rect, cell);
        } else if let Some((col, row)) = self.to_cell(rect.center_x(), rect.center_y()) {
            self.put(col, row, cell);
        }
    }

    fn text(&mut self, text: &str, x: i32, y: i32, align: Align, style: TextStyle) {
        let x = x.clamp(0, FIELD_WIDTH - 1);
        let y = y.clamp(0, FIELD_HEIGHT - 1);
        let Some((col, row)) = self.to_cell(x, y) else {
            return;
        };
        let len = text.chars().count() as u16;
        let start = match align {
            Align::Left => col,
            Align::Center => col.saturating_sub(len / 2).max(1),
        };
        let color = text_color(style);
        let limit = self.cols.saturating_sub(1);
        for (i, glyph) in text.chars().enumerate() {
            let c = start + i as u16;
            if c >= limit {
                break;
            }
            self.put(c, row, Cell { glyph, color });
        }
    }
}

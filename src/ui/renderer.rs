/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into the `front` buffer
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Emit terminal commands only for cells that changed, batched with `queue!`
///   4. Flush once, then swap front/back
///
/// Screen layout:
///   row 0   header: progress percent, title, key help
///   row 1   divider line
///   row 2+  the field, one game cell = `CELL_W` terminal columns
///
/// The renderer only reads the engine; it never mutates game state.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::Cell;
use crate::sim::world::GameState;
use super::viewport::{CELL_W, FIELD_ROW};

const FOX: char = '🦊';
const LEAF: char = '🌿';
const HAPPY: char = '😀';

const HEADER_ROW: usize = 0;
const DIVIDER_ROW: usize = 1;

const HEADER_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const BANNER_BG: Color = Color::Rgb { r: 40, g: 40, b: 40 };
const SHADOW_BG: Color = Color::Rgb { r: 8, g: 8, b: 12 };

// ── ScreenCell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct ScreenCell {
    ch: [u8; 4],   // one UTF-8 scalar
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // true = this char occupies 2 terminal columns
    cont: bool,    // true = right half of the previous wide char (skip render)
}

impl ScreenCell {
    /// Explicit dark background for every cell. Using the same RGB for
    /// `Clear` and cell backgrounds avoids visible gaps between rows on
    /// VTE-based terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: ScreenCell = ScreenCell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: ScreenCell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: ScreenCell = ScreenCell {
        ch: [0; 4],
        ch_len: 0,
        fg: Color::White,
        bg: ScreenCell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel used to invalidate the back buffer: differs from any real cell.
    const INVALID: ScreenCell = ScreenCell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char) -> Self {
        let mut cell = Self::from_char(c, Color::Reset, Color::Reset);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
    }
}

// ── FrameBuffer: a 2D grid of ScreenCells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<ScreenCell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![ScreenCell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![ScreenCell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(ScreenCell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: ScreenCell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> ScreenCell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            ScreenCell::BLANK
        }
    }

    /// Place a double-width glyph at (x, y). Dropped if it would be cut at the edge.
    fn put_wide(&mut self, x: usize, y: usize, c: char) {
        if x + 1 >= self.width { return; }
        self.set(x, y, ScreenCell::from_char_wide(c));
        self.set(x + 1, y, ScreenCell::WIDE_CONT);
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, ScreenCell::from_char(ch, fg, bg));
        }
    }

    /// Write a string centered on the row.
    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill_row(&mut self, y: usize, ch: char, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, ScreenCell::from_char(ch, fg, bg));
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for yy in y..y + h {
            for xx in x..x + w {
                self.set(xx, yy, ScreenCell::from_char(' ', Color::White, bg));
            }
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen.
    /// Returns whether the terminal will report key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(ScreenCell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        let (tw, th) = self.size();
        self.resize(tw, th);
        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Current terminal size, with a classic 80x24 fallback.
    pub fn size(&self) -> (u16, u16) {
        terminal::size().unwrap_or((80, 24))
    }

    /// Adopt a new terminal size and force a full repaint on the next frame.
    pub fn resize(&mut self, tw: u16, th: u16) {
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(ScreenCell::INVALID);
    }

    pub fn render(&mut self, world: &GameState) -> io::Result<()> {
        self.front.clear();
        compose(&mut self.front, world);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = ScreenCell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(ScreenCell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

// ── Compose: build front buffer content ──

fn compose(buf: &mut FrameBuffer, w: &GameState) {
    compose_header(buf, w);
    buf.fill_row(DIVIDER_ROW, '─', Color::White, Color::Reset);
    compose_field(buf, w);
    if !w.is_running() {
        compose_game_over(buf, w);
    }
}

fn compose_header(buf: &mut FrameBuffer, w: &GameState) {
    buf.fill_row(HEADER_ROW, ' ', Color::White, HEADER_BG);
    buf.put_str(1, HEADER_ROW, &format!("{}%", w.percent_mowed()), Color::White, HEADER_BG);
    buf.put_centered(HEADER_ROW, "Mower", Color::White, HEADER_BG);

    let help = "Arrows/WASD move  R restart  Q quit ";
    let help_len = help.chars().count();
    // Only when it clears the centered title
    if buf.width >= help_len * 2 + 8 {
        buf.put_str(buf.width - help_len, HEADER_ROW, help, Color::DarkGrey, HEADER_BG);
    }
}

/// Enemy drawn over player drawn over grass; mowed cells stay blank.
fn compose_field(buf: &mut FrameBuffer, w: &GameState) {
    let player = w.player_pos();
    let enemy = w.enemy_pos();

    for y in 0..w.height() {
        let row = FIELD_ROW + y;
        if row >= buf.height { break; }
        for x in 0..w.width() {
            let col = x * CELL_W;
            let glyph = if enemy.x == x && enemy.y == y {
                Some(FOX)
            } else if player.x == x && player.y == y {
                Some(HAPPY)
            } else if w.cell(x, y) == Cell::Grass {
                Some(LEAF)
            } else {
                None
            };
            if let Some(c) = glyph {
                buf.put_wide(col, row, c);
            }
        }
    }
}

/// Centered banner with a drop shadow on its right and bottom edges.
fn compose_game_over(buf: &mut FrameBuffer, w: &GameState) {
    let headline = if w.player_won() { "You Won!" } else { "You Lose!" };
    let total = format!(
        "Total: {}% ({}/{})",
        w.percent_mowed(), w.mowed_count(), w.total_cells(),
    );
    let hint = "ENTER/R: play again   ESC/Q: quit";

    let text_w = [headline, total.as_str(), hint]
        .iter()
        .map(|s| s.chars().count())
        .max()
        .unwrap_or(0);
    // Even width and even x keep wide glyphs whole under the banner.
    let box_w = ((text_w + 4 + 1) & !1).min(buf.width & !1);
    let box_h = 7_usize.min(buf.height);
    let box_x = (buf.width.saturating_sub(box_w) / 2) & !1;
    let box_y = buf.height.saturating_sub(box_h) / 2;

    buf.fill_rect(box_x + 2, box_y + 1, box_w, box_h, SHADOW_BG);
    buf.fill_rect(box_x, box_y, box_w, box_h, BANNER_BG);

    let head_fg = if w.player_won() {
        Color::Rgb { r: 80, g: 255, b: 80 }
    } else {
        Color::Rgb { r: 255, g: 80, b: 80 }
    };
    let lines: [(&str, Color, usize); 3] = [
        (headline, head_fg, 1),
        (total.as_str(), Color::White, 3),
        (hint, Color::Grey, 5),
    ];
    for (text, fg, dy) in lines {
        if dy >= box_h { continue; }
        let len = text.chars().count();
        let x = box_x + box_w.saturating_sub(len) / 2;
        buf.put_str(x, box_y + dy, text, fg, BANNER_BG);
    }
}

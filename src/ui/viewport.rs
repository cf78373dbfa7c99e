/// Viewport sizer: derives the field size from the terminal size.
///
/// Each game cell is `CELL_W` terminal columns wide (emoji are double-width).
/// The top `FIELD_ROW` rows hold the header and the divider line.
/// Degenerate sizes are ignored; the engine never sees a 0-wide grid.

use crate::config::GridConfig;
use crate::sim::world::GameState;

pub const CELL_W: usize = 2;

/// Header row + divider row.
pub const FIELD_ROW: usize = 2;

/// Field dimensions for a `term_w`×`term_h` terminal, capped by config.
/// `None` if the terminal cannot hold even one cell.
pub fn grid_size(term_w: u16, term_h: u16, caps: &GridConfig) -> Option<(usize, usize)> {
    let mut w = term_w as usize / CELL_W;
    let mut h = (term_h as usize).saturating_sub(FIELD_ROW);
    if let Some(max) = caps.max_width { w = w.min(max); }
    if let Some(max) = caps.max_height { h = h.min(max); }
    if w == 0 || h == 0 { None } else { Some((w, h)) }
}

pub struct ViewportSizer {
    caps: GridConfig,
    current: Option<(usize, usize)>,
}

impl ViewportSizer {
    pub fn new(caps: GridConfig) -> Self {
        ViewportSizer { caps, current: None }
    }

    /// Size for the first game. Falls back to a single cell on a tiny terminal.
    pub fn initial(&mut self, term_w: u16, term_h: u16) -> (usize, usize) {
        let size = grid_size(term_w, term_h, &self.caps).unwrap_or((1, 1));
        self.current = Some(size);
        size
    }

    /// React to a terminal resize: if the field size changes, resize the
    /// engine and start a fresh game. Returns true when the game was reset.
    pub fn apply(&mut self, term_w: u16, term_h: u16, world: &mut GameState) -> bool {
        let size = match grid_size(term_w, term_h, &self.caps) {
            Some(s) => s,
            None => {
                log::debug!("ignoring resize to {}x{}: no room for the field", term_w, term_h);
                return false;
            }
        };
        if self.current == Some(size) { return false; }

        log::info!("terminal resized to {}x{}", term_w, term_h);
        self.current = Some(size);
        world.resize(size.0, size.1);
        world.start_new_game();
        true
    }
}

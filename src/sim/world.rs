/// GameState: the complete state of one mowing session.
///
/// ## Grid
///
/// `grid[x][y]`, column-major, `x` in `0..width` and `y` in `0..height`.
/// Created whole by `start_new_game()`. Only `advance()` mutates cells.
///
/// ## Mutators
///
/// The engine changes only through five operations:
///   - `advance(now)`     : one frame of simulation (see `sim::step`)
///   - `resize(w, h)`     : new grid capacity, must be followed by `start_new_game()`
///   - `start_new_game()` : fresh all-grass grid, actors back to their corners
///   - `key_down(dir)` / `key_up(dir)`: pending input set
///
/// Everything else is read-only and safe for the renderer to call.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::domain::cell::Cell;
use crate::domain::entity::{Direction, Position};
use super::event::GameEvent;
use super::step;

/// Minimum time between two enemy moves.
pub const DEFAULT_ENEMY_MOVE_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Running,
    Won,
    Lost,
}

#[derive(Clone, Debug)]
pub struct GameState {
    // ── Field ──
    pub(super) grid: Vec<Vec<Cell>>,
    pub(super) width: usize,
    pub(super) height: usize,
    pub(super) total_cells: usize,
    pub(super) mowed_count: usize,

    // ── Actors ──
    pub(super) player: Position,
    pub(super) enemy: Position,

    // ── Outcome ──
    pub(super) running: bool,
    pub(super) player_won: bool,

    // ── Timing ──
    /// `None` until the enemy first moves; the first frame always moves it.
    pub(super) last_enemy_move: Option<Instant>,
    pub(super) enemy_move_delay: Duration,

    // ── Input ──
    pub(super) pending_keys: HashSet<Direction>,
}

// ── Construction / lifecycle ──

impl GameState {
    /// Create an engine for a `width`×`height` field and start the first game.
    /// Both dimensions must be at least 1.
    pub fn new(width: usize, height: usize) -> Self {
        let mut state = GameState {
            grid: vec![],
            width: 0,
            height: 0,
            total_cells: 0,
            mowed_count: 0,
            player: Position::default(),
            enemy: Position::default(),
            running: false,
            player_won: false,
            last_enemy_move: None,
            enemy_move_delay: DEFAULT_ENEMY_MOVE_DELAY,
            pending_keys: HashSet::with_capacity(4),
        };
        state.resize(width, height);
        state.start_new_game();
        state
    }

    /// Override the enemy pacing (from config).
    pub fn with_enemy_move_delay(mut self, delay: Duration) -> Self {
        self.enemy_move_delay = delay;
        self
    }

    /// Record new grid capacity. The old grid stays until `start_new_game()`.
    pub fn resize(&mut self, width: usize, height: usize) {
        debug_assert!(width >= 1 && height >= 1, "grid must be at least 1x1");
        self.width = width;
        self.height = height;
        self.total_cells = width * height;
    }

    /// Replace the grid with fresh grass and put both actors in their corners.
    ///
    /// Pending keys and the enemy clock carry over.
    pub fn start_new_game(&mut self) {
        log::info!("creating a new board ({}, {})", self.width, self.height);
        self.grid = vec![vec![Cell::Grass; self.height]; self.width];
        self.player = Position::new(0, 0);
        self.enemy = Position::new(self.width - 1, self.height - 1);
        self.mowed_count = 0;
        self.running = true;
        self.player_won = false;
    }

    /// Run one frame. No-op once the game is over.
    pub fn advance(&mut self, now: Instant) -> Vec<GameEvent> {
        step::advance(self, now)
    }
}

// ── Input ──

impl GameState {
    pub fn key_down(&mut self, dir: Direction) {
        self.pending_keys.insert(dir);
    }

    pub fn key_up(&mut self, dir: Direction) {
        self.pending_keys.remove(&dir);
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_pending(&self, dir: Direction) -> bool {
        self.pending_keys.contains(&dir)
    }
}

// ── Read-only view for the renderer ──

impl GameState {
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn player_won(&self) -> bool {
        self.player_won
    }

    pub fn phase(&self) -> Phase {
        match (self.running, self.player_won) {
            (true, _) => Phase::Running,
            (false, true) => Phase::Won,
            (false, false) => Phase::Lost,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn total_cells(&self) -> usize {
        self.total_cells
    }

    #[inline]
    pub fn mowed_count(&self) -> usize {
        self.mowed_count
    }

    /// Whole-number percentage mowed, rounded down.
    pub fn percent_mowed(&self) -> usize {
        if self.total_cells == 0 { return 0; }
        self.mowed_count * 100 / self.total_cells
    }

    #[inline]
    pub fn player_pos(&self) -> Position {
        self.player
    }

    #[inline]
    pub fn enemy_pos(&self) -> Position {
        self.enemy
    }

    /// Cell at (x, y). Out of bounds reads as Empty (nothing to draw).
    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.grid
            .get(x)
            .and_then(|col| col.get(y))
            .copied()
            .unwrap_or(Cell::Empty)
    }

    /// Full scan of mowed cells. Authoritative; never tracked incrementally.
    pub(super) fn count_mowed(&self) -> usize {
        self.grid
            .iter()
            .map(|col| col.iter().filter(|c| c.is_mowed()).count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_layout() {
        let g = GameState::new(7, 4);
        assert_eq!(g.width(), 7);
        assert_eq!(g.height(), 4);
        assert_eq!(g.total_cells(), 28);
        assert_eq!(g.player_pos(), Position::new(0, 0));
        assert_eq!(g.enemy_pos(), Position::new(6, 3));
        assert_eq!(g.mowed_count(), 0);
        assert!(g.is_running());
        assert!(!g.player_won());
        assert_eq!(g.phase(), Phase::Running);
        for x in 0..7 {
            for y in 0..4 {
                assert_eq!(g.cell(x, y), Cell::Grass);
            }
        }
    }

    #[test]
    fn resize_then_new_game_rebuilds_grid() {
        let mut g = GameState::new(3, 3);
        g.grid[1][1] = Cell::Empty;
        g.resize(5, 2);
        g.start_new_game();
        assert_eq!(g.grid.len(), 5);
        assert!(g.grid.iter().all(|col| col.len() == 2));
        assert_eq!(g.total_cells(), 10);
        assert_eq!(g.enemy_pos(), Position::new(4, 1));
        assert_eq!(g.count_mowed(), 0);
    }

    #[test]
    fn new_game_clears_game_over() {
        let mut g = GameState::new(3, 3);
        g.running = false;
        g.player_won = true;
        g.mowed_count = 9;
        g.start_new_game();
        assert!(g.is_running());
        assert!(!g.player_won());
        assert_eq!(g.mowed_count(), 0);
    }

    #[test]
    fn key_down_and_up_edit_pending_set() {
        let mut g = GameState::new(3, 3);
        g.key_down(Direction::Left);
        g.key_down(Direction::Left);
        g.key_down(Direction::Up);
        assert!(g.is_pending(Direction::Left));
        assert!(g.is_pending(Direction::Up));
        assert_eq!(g.pending_keys.len(), 2);
        g.key_up(Direction::Left);
        assert!(!g.is_pending(Direction::Left));
        // Releasing a key that was never pressed is harmless.
        g.key_up(Direction::Down);
        assert_eq!(g.pending_keys.len(), 1);
    }

    #[test]
    fn recount_matches_direct_mutation() {
        let mut g = GameState::new(4, 4);
        g.grid[0][0] = Cell::Empty;
        g.grid[3][2] = Cell::Empty;
        g.grid[2][3] = Cell::Empty;
        assert_eq!(g.count_mowed(), 3);
        g.grid[3][2] = Cell::Grass;
        assert_eq!(g.count_mowed(), 2);
    }

    #[test]
    fn phase_reflects_outcome() {
        let mut g = GameState::new(2, 2);
        g.running = false;
        assert_eq!(g.phase(), Phase::Lost);
        g.player_won = true;
        assert_eq!(g.phase(), Phase::Won);
    }

    #[test]
    fn percent_rounds_down() {
        let mut g = GameState::new(3, 1);
        g.mowed_count = 2;
        assert_eq!(g.percent_mowed(), 66);
        g.mowed_count = 3;
        assert_eq!(g.percent_mowed(), 100);
    }

    #[test]
    fn cell_out_of_bounds_reads_empty() {
        let g = GameState::new(2, 2);
        assert_eq!(g.cell(2, 0), Cell::Empty);
        assert_eq!(g.cell(0, 5), Cell::Empty);
    }
}

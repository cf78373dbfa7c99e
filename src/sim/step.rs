/// The step function: advances the game by one frame.
///
/// Processing order:
///   1. Input resolution (down → up → left → right, toroidal wrap)
///   2. Mowing (previous cell if moved, then current cell)
///   3. Mowed-count recompute (full scan)
///   4. Win check
///   5. Enemy movement (rate-limited by wall clock)
///   6. Game-over check (win takes precedence over catch)
///
/// Frames arrive at no guaranteed interval, so the enemy clock compares
/// the caller-supplied `now` against the last move instead of counting ticks.

use std::time::Instant;

use crate::domain::cell::Cell;
use crate::domain::chase;
use crate::domain::entity::{Direction, Position};
use super::event::GameEvent;
use super::world::GameState;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn advance(state: &mut GameState, now: Instant) -> Vec<GameEvent> {
    if !state.running { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();

    let prev = state.player;
    resolve_input(state);
    resolve_mowing(state, prev, &mut events);
    state.mowed_count = state.count_mowed();
    let is_player_done = state.mowed_count == state.total_cells;
    resolve_enemy_movement(state, now, &mut events);
    resolve_game_over(state, is_player_done, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Input
// ══════════════════════════════════════════════════════════════

/// Apply every pending direction once, then drop it from the pending set.
/// A held key therefore moves the player only once per fresh press.
fn resolve_input(state: &mut GameState) {
    for dir in Direction::RESOLVE_ORDER {
        if state.pending_keys.remove(&dir) {
            state.player = state.player.wrapped_step(dir, state.width, state.height);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Mowing
// ══════════════════════════════════════════════════════════════

fn resolve_mowing(state: &mut GameState, prev: Position, events: &mut Vec<GameEvent>) {
    if prev != state.player {
        mow(state, prev, events);
    }
    let here = state.player;
    mow(state, here, events);
}

fn mow(state: &mut GameState, pos: Position, events: &mut Vec<GameEvent>) {
    let cell = &mut state.grid[pos.x][pos.y];
    if *cell == Cell::Grass {
        *cell = Cell::Empty;
        events.push(GameEvent::CellMowed { x: pos.x, y: pos.y });
    }
}

// ══════════════════════════════════════════════════════════════
// Enemy
// ══════════════════════════════════════════════════════════════

fn resolve_enemy_movement(state: &mut GameState, now: Instant, events: &mut Vec<GameEvent>) {
    let due = match state.last_enemy_move {
        Some(t) => now.saturating_duration_since(t) > state.enemy_move_delay,
        None => true,
    };
    if !due { return; }

    state.enemy = chase::next_position(state.enemy, state.player);
    state.last_enemy_move = Some(now);
    log::trace!("enemy moved to ({}, {})", state.enemy.x, state.enemy.y);
    events.push(GameEvent::EnemyMoved { x: state.enemy.x, y: state.enemy.y });
}

// ══════════════════════════════════════════════════════════════
// Win / lose
// ══════════════════════════════════════════════════════════════

fn resolve_game_over(state: &mut GameState, is_player_done: bool, events: &mut Vec<GameEvent>) {
    let enemy_caught_player = state.enemy == state.player;
    if !enemy_caught_player && !is_player_done { return; }

    state.player_won = is_player_done;
    state.running = false;

    if is_player_done {
        log::info!("player won: {}/{} mowed", state.mowed_count, state.total_cells);
        events.push(GameEvent::PlayerWon);
    } else {
        log::info!(
            "player caught at ({}, {}): {}/{} mowed",
            state.player.x, state.player.y, state.mowed_count, state.total_cells,
        );
        events.push(GameEvent::PlayerCaught);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::sim::world::Phase;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Engine whose enemy clock was just reset at `t0`, so the enemy holds still
    /// for the next 500 ms of frames.
    fn frozen_enemy(w: usize, h: usize, t0: Instant) -> GameState {
        let mut g = GameState::new(w, h);
        g.last_enemy_move = Some(t0);
        g
    }

    fn assert_in_bounds(g: &GameState) {
        let (p, e) = (g.player_pos(), g.enemy_pos());
        assert!(p.x < g.width() && p.y < g.height(), "player out of bounds: {:?}", p);
        assert!(e.x < g.width() && e.y < g.height(), "enemy out of bounds: {:?}", e);
    }

    // ── Input ──

    #[test]
    fn left_wraps_to_right_edge() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(5, 5, t0);
        g.player = Position::new(0, 2);
        g.key_down(Direction::Left);
        g.advance(t0 + ms(1));
        assert_eq!(g.player_pos(), Position::new(4, 2));
    }

    #[test]
    fn right_wraps_to_left_edge() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(5, 5, t0);
        g.player = Position::new(4, 2);
        g.key_down(Direction::Right);
        g.advance(t0 + ms(1));
        assert_eq!(g.player_pos(), Position::new(0, 2));
    }

    #[test]
    fn pending_key_is_consumed_once() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(6, 6, t0);
        g.key_down(Direction::Right);
        g.advance(t0 + ms(1));
        assert_eq!(g.player_pos(), Position::new(1, 0));
        assert!(!g.is_pending(Direction::Right));

        // Still physically held: no further movement.
        g.advance(t0 + ms(2));
        g.advance(t0 + ms(3));
        assert_eq!(g.player_pos(), Position::new(1, 0));

        // Fresh press moves again.
        g.key_down(Direction::Right);
        g.advance(t0 + ms(4));
        assert_eq!(g.player_pos(), Position::new(2, 0));
    }

    #[test]
    fn released_before_frame_does_not_move() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(6, 6, t0);
        g.key_down(Direction::Down);
        g.key_up(Direction::Down);
        g.advance(t0 + ms(1));
        assert_eq!(g.player_pos(), Position::new(0, 0));
    }

    #[test]
    fn opposite_keys_cancel_on_same_axis() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(6, 6, t0);
        g.player = Position::new(2, 2);
        g.key_down(Direction::Up);
        g.key_down(Direction::Down);
        g.key_down(Direction::Right);
        g.advance(t0 + ms(1));
        assert_eq!(g.player_pos(), Position::new(3, 2));
        assert!(g.pending_keys.is_empty());
    }

    #[test]
    fn diagonal_press_applies_both_axes() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(6, 6, t0);
        g.key_down(Direction::Down);
        g.key_down(Direction::Right);
        g.advance(t0 + ms(1));
        assert_eq!(g.player_pos(), Position::new(1, 1));
        // Starting cell mowed on the way out, landing cell mowed on arrival.
        assert_eq!(g.cell(0, 0), Cell::Empty);
        assert_eq!(g.cell(1, 1), Cell::Empty);
        assert_eq!(g.mowed_count(), 2);
    }

    // ── Mowing ──

    #[test]
    fn cell_under_player_is_mowed_every_frame() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(8, 8, t0);
        let path = [
            Direction::Right, Direction::Right, Direction::Down,
            Direction::Left, Direction::Up, Direction::Up,
        ];
        for (i, dir) in path.iter().enumerate() {
            g.key_down(*dir);
            g.advance(t0 + ms(i as u64 + 1));
            let p = g.player_pos();
            assert_eq!(g.cell(p.x, p.y), Cell::Empty);
            assert_eq!(g.mowed_count(), g.count_mowed());
            assert_in_bounds(&g);
        }
    }

    #[test]
    fn idle_frame_keeps_count() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(5, 5, t0);
        let events = g.advance(t0 + ms(1));
        assert_eq!(events, vec![GameEvent::CellMowed { x: 0, y: 0 }]);
        assert_eq!(g.mowed_count(), 1);

        let events = g.advance(t0 + ms(2));
        assert!(events.is_empty());
        assert_eq!(g.mowed_count(), 1);
    }

    #[test]
    fn recount_picks_up_direct_grid_edits() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(5, 5, t0);
        g.grid[3][3] = Cell::Empty;
        g.grid[4][1] = Cell::Empty;
        g.advance(t0 + ms(1));
        // (0,0) under the player plus the two edited cells.
        assert_eq!(g.mowed_count(), 3);

        g.grid[4][1] = Cell::Grass;
        g.advance(t0 + ms(2));
        assert_eq!(g.mowed_count(), 2);
    }

    // ── Win / lose ──

    #[test]
    fn mowing_last_cell_wins() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(2, 2, t0);
        g.grid[0][1] = Cell::Empty;
        g.grid[1][0] = Cell::Empty;
        g.grid[1][1] = Cell::Empty;

        let events = g.advance(t0 + ms(1));
        assert_eq!(g.mowed_count(), 4);
        assert!(!g.is_running());
        assert!(g.player_won());
        assert_eq!(g.phase(), Phase::Won);
        assert!(events.contains(&GameEvent::PlayerWon));
        // Enemy never touched the player.
        assert_ne!(g.enemy_pos(), g.player_pos());
    }

    #[test]
    fn catch_loses() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(6, 6, t0);
        g.enemy = g.player;
        let events = g.advance(t0 + ms(1));
        assert!(!g.is_running());
        assert!(!g.player_won());
        assert_eq!(g.phase(), Phase::Lost);
        assert!(events.contains(&GameEvent::PlayerCaught));
    }

    #[test]
    fn walking_into_enemy_loses() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(6, 6, t0);
        g.enemy = Position::new(1, 0);
        g.key_down(Direction::Right);
        g.advance(t0 + ms(1));
        assert_eq!(g.phase(), Phase::Lost);
    }

    #[test]
    fn walking_into_enemy_on_its_move_frame_loses() {
        // Fresh clock: the enemy's move is due on this very frame.
        let mut g = GameState::new(4, 1);
        g.enemy = Position::new(1, 0);
        g.key_down(Direction::Right);
        let events = g.advance(Instant::now());

        assert_eq!(g.player_pos(), Position::new(1, 0));
        assert_eq!(g.enemy_pos(), Position::new(1, 0));
        assert!(events.contains(&GameEvent::EnemyMoved { x: 1, y: 0 }));
        assert!(events.contains(&GameEvent::PlayerCaught));
        assert_eq!(g.phase(), Phase::Lost);
        assert_in_bounds(&g);
    }

    #[test]
    fn win_takes_precedence_over_catch() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(2, 2, t0);
        g.grid[0][1] = Cell::Empty;
        g.grid[1][0] = Cell::Empty;
        g.player = Position::new(1, 0);
        g.enemy = Position::new(1, 1);
        // (0,0) and (1,1) remain; step onto the enemy's cell from a mowed one.
        g.grid[0][0] = Cell::Empty;
        g.key_down(Direction::Down);
        let events = g.advance(t0 + ms(1));
        assert_eq!(g.player_pos(), g.enemy_pos());
        assert_eq!(g.phase(), Phase::Won);
        assert_eq!(events.last(), Some(&GameEvent::PlayerWon));
    }

    #[test]
    fn game_over_freezes_state() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(6, 6, t0);
        g.enemy = g.player;
        g.advance(t0 + ms(1));
        assert!(!g.is_running());

        let before = (g.player_pos(), g.enemy_pos(), g.mowed_count());
        g.key_down(Direction::Right);
        let events = g.advance(t0 + ms(2_000));
        assert!(events.is_empty());
        assert_eq!((g.player_pos(), g.enemy_pos(), g.mowed_count()), before);
        assert_eq!(g.phase(), Phase::Lost);
        // Input is left pending, untouched by a frozen engine.
        assert!(g.is_pending(Direction::Right));
    }

    #[test]
    fn restart_after_game_over() {
        let t0 = Instant::now();
        let mut g = frozen_enemy(4, 4, t0);
        g.enemy = g.player;
        g.advance(t0 + ms(1));
        g.start_new_game();
        assert!(g.is_running());
        g.advance(t0 + ms(2));
        assert!(g.is_running());
        assert_eq!(g.mowed_count(), 1);
    }

    // ── Enemy pacing ──

    #[test]
    fn first_frame_moves_enemy() {
        let mut g = GameState::new(10, 10);
        let events = g.advance(Instant::now());
        assert_eq!(g.enemy_pos(), Position::new(9, 8));
        assert!(events.contains(&GameEvent::EnemyMoved { x: 9, y: 8 }));
    }

    #[test]
    fn enemy_moves_at_most_once_per_delay() {
        let t0 = Instant::now();
        let mut g = GameState::new(10, 10);
        g.advance(t0);
        let after_first = g.enemy_pos();

        g.advance(t0 + ms(100));
        assert_eq!(g.enemy_pos(), after_first);

        // Exactly the delay is not enough: the gate is strict.
        g.advance(t0 + ms(500));
        assert_eq!(g.enemy_pos(), after_first);

        g.advance(t0 + ms(501));
        assert_ne!(g.enemy_pos(), after_first);
        let after_second = g.enemy_pos();

        // Clock was reset at 501 ms.
        g.advance(t0 + ms(900));
        assert_eq!(g.enemy_pos(), after_second);
        g.advance(t0 + ms(1_100));
        assert_ne!(g.enemy_pos(), after_second);
    }

    #[test]
    fn custom_delay_is_honored() {
        let t0 = Instant::now();
        let mut g = GameState::new(10, 10).with_enemy_move_delay(ms(50));
        g.advance(t0);
        let p = g.enemy_pos();
        g.advance(t0 + ms(51));
        assert_ne!(g.enemy_pos(), p);
    }

    #[test]
    fn enemy_tie_breaks_toward_y() {
        let t0 = Instant::now();
        let mut g = GameState::new(9, 9);
        g.player = Position::new(2, 2);
        g.grid[0][0] = Cell::Empty;
        g.enemy = Position::new(5, 5);
        g.advance(t0);
        assert_eq!(g.enemy_pos(), Position::new(5, 4));
    }

    #[test]
    fn enemy_clock_resets_even_without_distance_change() {
        let t0 = Instant::now();
        let mut g = GameState::new(9, 9);
        g.advance(t0);
        assert_eq!(g.last_enemy_move, Some(t0));
        g.advance(t0 + ms(600));
        assert_eq!(g.last_enemy_move, Some(t0 + ms(600)));
    }

    #[test]
    fn long_random_walk_stays_in_bounds() {
        let t0 = Instant::now();
        let mut g = GameState::new(7, 5);
        let mut seed: u32 = 0x9e37_79b9;
        for frame in 0..2_000u64 {
            if !g.is_running() {
                g.start_new_game();
            }
            // Small LCG so the walk is deterministic.
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let dir = Direction::RESOLVE_ORDER[(seed >> 16) as usize % 4];
            g.key_down(dir);
            g.advance(t0 + ms(frame * 120));
            assert_in_bounds(&g);
            let p = g.player_pos();
            assert_eq!(g.cell(p.x, p.y), Cell::Empty);
            assert_eq!(g.mowed_count(), g.count_mowed());
        }
    }
}

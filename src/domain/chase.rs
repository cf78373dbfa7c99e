/// Enemy AI: greedy single-step chase.
///
/// The enemy closes the larger of the two axis gaps, one cell per move.
/// Ties go to the y-axis: x is only chosen when its gap is strictly larger.
/// No wraparound: the enemy approaches in a straight line, so it never
/// leaves the grid as long as the player is inside it.

use super::entity::Position;

/// Offset (dx, dy) the enemy at `enemy` should take toward `player`.
/// Returns (0, 0) when the enemy already stands on the player, which happens
/// when the player walks into it on a frame where its move is due.
pub fn chase_step(enemy: Position, player: Position) -> (i32, i32) {
    let x_diff = (player.x as i32 - enemy.x as i32).abs();
    let y_diff = (player.y as i32 - enemy.y as i32).abs();

    if x_diff > y_diff {
        ((player.x as i32 - enemy.x as i32).signum(), 0)
    } else {
        (0, (player.y as i32 - enemy.y as i32).signum())
    }
}

/// Apply `chase_step` and return the enemy's next position.
pub fn next_position(enemy: Position, player: Position) -> Position {
    let (dx, dy) = chase_step(enemy, player);
    Position {
        x: (enemy.x as i32 + dx) as usize,
        y: (enemy.y as i32 + dy) as usize,
    }
}

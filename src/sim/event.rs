/// Events emitted during `GameState::advance`.
/// The presentation layer consumes these for sound and logging.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// A grass cell turned Empty under (or behind) the player.
    CellMowed { x: usize, y: usize },
    /// The enemy's rate-limited move fired and it now stands at (x, y).
    EnemyMoved { x: usize, y: usize },
    PlayerWon,
    PlayerCaught,
}

/// Grid cell states.
/// Properties are queried via methods so cell semantics live in one place.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Cell {
    Empty, // Mowed
    #[default]
    Grass,
}

impl Cell {
    /// Has the player already been over this cell?
    pub fn is_mowed(self) -> bool {
        matches!(self, Cell::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cell_is_grass() {
        assert_eq!(Cell::default(), Cell::Grass);
        assert!(!Cell::default().is_mowed());
        assert!(Cell::Empty.is_mowed());
    }
}

//! Ordering direction

/// Sort direction of an `$orderby` item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    /// Returns `true` for descending order.
    pub fn is_descending(self) -> bool {
        matches!(self, Self::Desc)
    }
}

use std::fmt;

/// Tie-break applied when two genes share a raw signature value.
///
/// Ranks are always a bijection onto `1..=N`; the tie-break only decides
/// which of two equal values receives the smaller rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// The gene encountered first in matrix order gets the smaller rank.
    #[default]
    First,
    /// The gene encountered last in matrix order gets the smaller rank.
    Last,
}

/// Ordering policy for the down-regulated gene list.
///
/// Upstream analyses disagree on whether the strongest down-regulation should
/// lead or trail the list, so the choice is an explicit parameter rather than
/// a fixed behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DownListOrder {
    /// Descending signed fold change: the least negative gene first.
    #[default]
    Descending,
    /// Ascending signed fold change: the most negative gene first.
    Ascending,
}

/// Direction of a differential-expression gene list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

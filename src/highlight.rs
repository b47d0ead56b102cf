//! Search-result cursor.
//!
//! The navigator is a small state machine over an empty and a positioned
//! state; the positioned state is only reachable from a non-empty result set.
//! Transitions are pure: they take the current state by value and hand back
//! the next state together with a [`NavigationSignal`] for the presentation
//! layer.

use crate::search::SearchMatch;
use serde::Serialize;

/// Cursor over a result set. `current` always indexes a non-empty `matches`;
/// only [`HighlightNavigator::with_matches`] can reach the positioned state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightNavigator {
    state: CursorState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum CursorState {
    #[default]
    Empty,
    Positioned {
        matches: Vec<SearchMatch>,
        current: usize,
    },
}

/// Outcome of a `next`/`previous` move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavigationSignal {
    /// There is nothing to navigate.
    NoResults,
    /// Moved to an adjacent match without crossing either end.
    Moved { found: SearchMatch },
    /// Moved past the last (or before the first) match and came around.
    Wrapped { found: SearchMatch },
}

impl NavigationSignal {
    pub fn found(&self) -> Option<SearchMatch> {
        match self {
            NavigationSignal::NoResults => None,
            NavigationSignal::Moved { found } | NavigationSignal::Wrapped { found } => {
                Some(*found)
            }
        }
    }
}

/// Presentation-facing highlight for one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightSpan {
    pub paragraph_index: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub is_current: bool,
}

impl HighlightNavigator {
    /// Fresh cursor for a new result set; always starts at the first match.
    pub fn with_matches(matches: Vec<SearchMatch>) -> Self {
        let state = if matches.is_empty() {
            CursorState::Empty
        } else {
            CursorState::Positioned {
                matches,
                current: 0,
            }
        };
        Self { state }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, CursorState::Empty)
    }

    /// Replace the cursor state in place, discarding the previous position.
    pub fn set_matches(&mut self, matches: Vec<SearchMatch>) {
        *self = Self::with_matches(matches);
    }

    pub fn next(self) -> (Self, NavigationSignal) {
        self.step(Direction::Forward)
    }

    pub fn previous(self) -> (Self, NavigationSignal) {
        self.step(Direction::Backward)
    }

    /// In-place wrapper around [`HighlightNavigator::next`].
    pub fn advance(&mut self) -> NavigationSignal {
        let (next, signal) = std::mem::take(self).next();
        *self = next;
        signal
    }

    /// In-place wrapper around [`HighlightNavigator::previous`].
    pub fn retreat(&mut self) -> NavigationSignal {
        let (next, signal) = std::mem::take(self).previous();
        *self = next;
        signal
    }

    pub fn current(&self) -> Option<&SearchMatch> {
        match &self.state {
            CursorState::Empty => None,
            CursorState::Positioned { matches, current } => matches.get(*current),
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        match &self.state {
            CursorState::Empty => None,
            CursorState::Positioned { current, .. } => Some(*current),
        }
    }

    pub fn matches(&self) -> &[SearchMatch] {
        match &self.state {
            CursorState::Empty => &[],
            CursorState::Positioned { matches, .. } => matches,
        }
    }

    /// `(current, total)` for a "3 of 12" style counter.
    pub fn position(&self) -> Option<(usize, usize)> {
        match &self.state {
            CursorState::Empty => None,
            CursorState::Positioned { matches, current } => Some((*current, matches.len())),
        }
    }

    /// Every match as a span, with the cursor's match flagged as current.
    pub fn spans(&self) -> Vec<HighlightSpan> {
        let current = self.current_index();
        self.matches()
            .iter()
            .enumerate()
            .map(|(idx, found)| HighlightSpan {
                paragraph_index: found.paragraph_index,
                start_offset: found.start_offset,
                end_offset: found.end_offset,
                is_current: Some(idx) == current,
            })
            .collect()
    }

    fn step(self, direction: Direction) -> (Self, NavigationSignal) {
        let CursorState::Positioned { matches, current } = self.state else {
            return (Self::default(), NavigationSignal::NoResults);
        };
        let len = matches.len();
        let (next, wrapped) = match direction {
            Direction::Forward => ((current + 1) % len, current + 1 == len),
            Direction::Backward => ((current + len - 1) % len, current == 0),
        };
        let found = matches[next];
        let signal = if wrapped {
            NavigationSignal::Wrapped { found }
        } else {
            NavigationSignal::Moved { found }
        };
        let state = CursorState::Positioned {
            matches,
            current: next,
        };
        (Self { state }, signal)
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

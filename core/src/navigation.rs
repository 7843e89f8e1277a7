/// Two-level navigation over (group, item) with a terminal closed state
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Position of the currently displayed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cursor {
    pub group: usize,
    pub item: usize,
}

impl Cursor {
    pub fn new(group: usize, item: usize) -> Self {
        Self { group, item }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Open(Cursor),
    Closed,
}

/// Outcome of one navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved {
        from: Cursor,
        to: Cursor,
        /// The move crossed into a different group
        entered_group: bool,
    },
    Unchanged,
    Closed,
}

/// Navigation state machine.
///
/// Only the shape of the group list (item count per group) matters here;
/// groups with no items are skipped in both directions.
#[derive(Debug, Clone)]
pub struct Navigator {
    lengths: Vec<usize>,
    state: NavState,
}

impl Navigator {
    /// Open at `(start_group, 0)`. A start beyond the end is clamped to the
    /// last group; an empty start group moves forward to the next non-empty
    /// one. With nothing to show the navigator starts closed.
    pub fn open(lengths: Vec<usize>, start_group: usize) -> Self {
        let start = start_group.min(lengths.len().saturating_sub(1));
        let state = match first_non_empty(&lengths, start) {
            Some(group) => NavState::Open(Cursor::new(group, 0)),
            None => NavState::Closed,
        };
        debug!("nav: open at {:?} over {} groups", state, lengths.len());
        Self { lengths, state }
    }

    pub fn cursor(&self) -> Option<Cursor> {
        match self.state {
            NavState::Open(cursor) => Some(cursor),
            NavState::Closed => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == NavState::Closed
    }

    pub fn next(&mut self) -> Transition {
        let NavState::Open(from) = self.state else {
            return Transition::Unchanged;
        };

        if from.item + 1 < self.lengths[from.group] {
            return self.move_to(from, Cursor::new(from.group, from.item + 1));
        }
        match first_non_empty(&self.lengths, from.group + 1) {
            Some(group) => self.move_to(from, Cursor::new(group, 0)),
            None => self.close(),
        }
    }

    pub fn previous(&mut self) -> Transition {
        let NavState::Open(from) = self.state else {
            return Transition::Unchanged;
        };

        if from.item > 0 {
            return self.move_to(from, Cursor::new(from.group, from.item - 1));
        }
        match last_non_empty_before(&self.lengths, from.group) {
            Some(group) => {
                let last = self.lengths[group] - 1;
                self.move_to(from, Cursor::new(group, last))
            }
            None => Transition::Unchanged,
        }
    }

    pub fn close(&mut self) -> Transition {
        if self.state == NavState::Closed {
            return Transition::Unchanged;
        }
        debug!("nav: closed from {:?}", self.state);
        self.state = NavState::Closed;
        Transition::Closed
    }

    fn move_to(&mut self, from: Cursor, to: Cursor) -> Transition {
        self.state = NavState::Open(to);
        debug!("nav: {:?} -> {:?}", from, to);
        Transition::Moved {
            from,
            to,
            entered_group: from.group != to.group,
        }
    }
}

fn first_non_empty(lengths: &[usize], from: usize) -> Option<usize> {
    (from..lengths.len()).find(|&g| lengths[g] > 0)
}

fn last_non_empty_before(lengths: &[usize], before: usize) -> Option<usize> {
    (0..before.min(lengths.len())).rev().find(|&g| lengths[g] > 0)
}

/// Rail of author entry points shown above the feed
use crate::decay::{freshness_with_window, DECAY_WINDOW, ENTRY_BRIGHTNESS};
use crate::model::Group;
use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingStyle {
    /// Group still has unseen items
    UnseenGradient,
    Muted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RailEntry {
    pub group_index: usize,
    pub display_name: String,
    pub avatar_url: Option<String>,
    /// Brightness multiplier in [0.65, 1.0]
    pub brightness: f32,
    pub ring: RingStyle,
    pub item_count: usize,
}

pub fn entry_for(index: usize, group: &Group, now: DateTime<Utc>, window: Duration) -> RailEntry {
    // a group with no items renders fully faded
    let fresh = group
        .most_recent()
        .map(|item| freshness_with_window(item.created_at, now, window))
        .unwrap_or(1.0);

    RailEntry {
        group_index: index,
        display_name: group.author.display_name.clone(),
        avatar_url: group.author.avatar_url.clone(),
        brightness: ENTRY_BRIGHTNESS.apply(fresh),
        ring: if group.has_unseen {
            RingStyle::UnseenGradient
        } else {
            RingStyle::Muted
        },
        item_count: group.items.len(),
    }
}

/// Entry-point list with a selection cursor
#[derive(Debug, Clone, Default)]
pub struct Rail {
    groups: Vec<Group>,
    selected: usize,
    window: Option<Duration>,
}

impl Rail {
    pub fn new(groups: Vec<Group>) -> Self {
        Self {
            groups,
            selected: 0,
            window: None,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = Some(window);
        self
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn entries(&self, now: DateTime<Utc>) -> Vec<RailEntry> {
        let window = self.window.unwrap_or(DECAY_WINDOW);
        self.groups
            .iter()
            .enumerate()
            .map(|(i, g)| entry_for(i, g, now, window))
            .collect()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.groups.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Group index the viewer should open at, item 0
    pub fn activate(&self, index: usize) -> Option<usize> {
        self.groups
            .get(index)
            .filter(|g| !g.is_empty())
            .map(|_| index)
    }

    pub fn activate_selected(&self) -> Option<usize> {
        self.activate(self.selected)
    }

    /// Take the viewer's updated group list (unseen flags cleared)
    pub fn apply_groups_changed(&mut self, groups: Vec<Group>) {
        self.groups = groups;
        if self.selected >= self.groups.len() {
            self.selected = self.groups.len().saturating_sub(1);
        }
    }
}

/// Reaction tray with optimistic local counts
///
/// Counts change locally the moment the user reacts and are never rolled
/// back if the service call fails. Server refreshes overwrite whatever is
/// stored for that item when they arrive.
use crate::model::{Group, ItemId, ReactionCounts};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_SYMBOLS: [&str; 6] = ["❤️", "😂", "😮", "😢", "😡", "👍"];
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(350);

/// Local effect of one `react` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionChange {
    Added { symbol: String },
    Removed { symbol: String },
    Replaced { previous: String, symbol: String },
}

#[derive(Debug, Clone)]
struct Highlight {
    item_id: ItemId,
    symbol: String,
    until: Instant,
}

#[derive(Debug, Clone)]
pub struct ReactionOverlay {
    symbols: Vec<String>,
    counts: HashMap<ItemId, ReactionCounts>,
    own: HashMap<ItemId, Option<String>>,
    highlight: Option<Highlight>,
    highlight_duration: Duration,
    tray_open: bool,
}

impl ReactionOverlay {
    pub fn new(symbols: Vec<String>, highlight_duration: Duration) -> Self {
        Self {
            symbols,
            counts: HashMap::new(),
            own: HashMap::new(),
            highlight: None,
            highlight_duration,
            tray_open: false,
        }
    }

    /// Seed counts and own reactions from the items handed to the viewer
    pub fn seed(&mut self, groups: &[Group]) {
        for item in groups.iter().flat_map(|g| g.items.iter()) {
            self.counts.insert(item.id.clone(), item.reactions.clone());
            self.own.insert(item.id.clone(), item.own_reaction.clone());
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn symbol_at(&self, index: usize) -> Option<&str> {
        self.symbols.get(index).map(String::as_str)
    }

    pub fn tray_open(&self) -> bool {
        self.tray_open
    }

    pub fn set_tray_open(&mut self, open: bool) {
        self.tray_open = open;
    }

    pub fn toggle_tray(&mut self) -> bool {
        self.tray_open = !self.tray_open;
        self.tray_open
    }

    pub fn counts(&self, item_id: &str) -> Option<&ReactionCounts> {
        self.counts.get(item_id)
    }

    pub fn count(&self, item_id: &str, symbol: &str) -> u32 {
        self.counts
            .get(item_id)
            .and_then(|c| c.get(symbol))
            .copied()
            .unwrap_or(0)
    }

    pub fn own_reaction(&self, item_id: &str) -> Option<&str> {
        self.own.get(item_id).and_then(|s| s.as_deref())
    }

    /// Apply a reaction optimistically. Same symbol twice removes it; a
    /// different symbol moves the user's reaction.
    pub fn react(&mut self, item_id: &str, symbol: &str, now: Instant) -> ReactionChange {
        let previous = self.own.get(item_id).cloned().flatten();
        let counts = self.counts.entry(item_id.to_string()).or_default();

        let change = match previous {
            Some(prev) if prev == symbol => {
                decrement(counts, symbol);
                self.own.insert(item_id.to_string(), None);
                ReactionChange::Removed {
                    symbol: symbol.to_string(),
                }
            }
            Some(prev) => {
                decrement(counts, &prev);
                *counts.entry(symbol.to_string()).or_insert(0) += 1;
                self.own.insert(item_id.to_string(), Some(symbol.to_string()));
                ReactionChange::Replaced {
                    previous: prev,
                    symbol: symbol.to_string(),
                }
            }
            None => {
                *counts.entry(symbol.to_string()).or_insert(0) += 1;
                self.own.insert(item_id.to_string(), Some(symbol.to_string()));
                ReactionChange::Added {
                    symbol: symbol.to_string(),
                }
            }
        };

        self.highlight = Some(Highlight {
            item_id: item_id.to_string(),
            symbol: symbol.to_string(),
            until: now + self.highlight_duration,
        });
        debug!("reactions: {} {:?}", item_id, change);
        change
    }

    /// Whether `symbol` on `item_id` is inside its "just reacted" window
    pub fn is_highlighted(&self, item_id: &str, symbol: &str, now: Instant) -> bool {
        self.highlight
            .as_ref()
            .is_some_and(|h| h.item_id == item_id && h.symbol == symbol && now < h.until)
    }

    pub fn merge_counts(&mut self, item_id: ItemId, counts: ReactionCounts) {
        self.counts.insert(item_id, counts);
    }

    pub fn merge_own(&mut self, item_id: ItemId, symbol: Option<String>) {
        self.own.insert(item_id, symbol);
    }
}

fn decrement(counts: &mut ReactionCounts, symbol: &str) {
    if let Some(n) = counts.get_mut(symbol) {
        *n = n.saturating_sub(1);
        if *n == 0 {
            counts.remove(symbol);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay() -> ReactionOverlay {
        ReactionOverlay::new(
            DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            HIGHLIGHT_DURATION,
        )
    }

    #[test]
    fn test_react_twice_toggles_off() {
        let mut ov = overlay();
        let now = Instant::now();
        ov.merge_counts("i1".into(), ReactionCounts::from([("👍".to_string(), 4)]));

        assert!(matches!(ov.react("i1", "👍", now), ReactionChange::Added { .. }));
        assert_eq!(ov.count("i1", "👍"), 5);
        assert_eq!(ov.own_reaction("i1"), Some("👍"));

        assert!(matches!(ov.react("i1", "👍", now), ReactionChange::Removed { .. }));
        assert_eq!(ov.count("i1", "👍"), 4);
        assert_eq!(ov.own_reaction("i1"), None);
    }

    #[test]
    fn test_toggle_never_goes_negative() {
        let mut ov = overlay();
        let now = Instant::now();
        // the server says we reacted, but has no count for it yet
        ov.merge_own("i1".into(), Some("😂".to_string()));
        ov.react("i1", "😂", now);
        assert_eq!(ov.count("i1", "😂"), 0);
        assert!(ov.counts("i1").unwrap().get("😂").is_none());
    }

    #[test]
    fn test_switching_symbol_moves_reaction() {
        let mut ov = overlay();
        let now = Instant::now();
        ov.react("i1", "❤️", now);
        let change = ov.react("i1", "😮", now);
        assert_eq!(
            change,
            ReactionChange::Replaced {
                previous: "❤️".to_string(),
                symbol: "😮".to_string()
            }
        );
        assert_eq!(ov.count("i1", "❤️"), 0);
        assert_eq!(ov.count("i1", "😮"), 1);
    }

    #[test]
    fn test_highlight_window() {
        let mut ov = overlay();
        let now = Instant::now();
        ov.react("i1", "❤️", now);
        assert!(ov.is_highlighted("i1", "❤️", now + Duration::from_millis(100)));
        assert!(!ov.is_highlighted("i1", "😂", now));
        assert!(!ov.is_highlighted("i2", "❤️", now));
        assert!(!ov.is_highlighted("i1", "❤️", now + Duration::from_millis(350)));
    }

    #[test]
    fn test_tray_toggle() {
        let mut ov = overlay();
        assert!(!ov.tray_open());
        assert!(ov.toggle_tray());
        assert!(!ov.toggle_tray());
        assert_eq!(ov.symbol_at(0), Some("❤️"));
        assert_eq!(ov.symbol_at(6), None);
    }
}

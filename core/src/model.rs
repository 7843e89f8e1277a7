/// Story data model: items grouped by author
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ItemId = String;

/// Reaction symbol -> count
pub type ReactionCounts = BTreeMap<String, u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub url: String,
}

/// One ephemeral unit of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub group_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub media: Option<MediaRef>,
    /// Fallback text shown when there is no media
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub reactions: ReactionCounts,
    /// The current user's own reaction, if any
    #[serde(default)]
    pub own_reaction: Option<String>,
}

/// What the viewer actually draws for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Content<'a> {
    Media(&'a MediaRef),
    Text(&'a str),
    Placeholder,
}

impl Item {
    pub fn content(&self) -> Content<'_> {
        if let Some(media) = self.media.as_ref().filter(|m| !m.url.trim().is_empty()) {
            return Content::Media(media);
        }
        match self.body.as_deref().map(str::trim) {
            Some(body) if !body.is_empty() => Content::Text(body),
            _ => Content::Placeholder,
        }
    }
}

/// Display identity of a group's author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// All items from one author, navigated as a unit.
/// Item order is caller-supplied and never re-sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub author: Author,
    pub items: Vec<Item>,
    #[serde(default)]
    pub has_unseen: bool,
}

impl Group {
    /// Newest item by creation time, regardless of list order
    pub fn most_recent(&self) -> Option<&Item> {
        self.items.iter().max_by_key(|item| item.created_at)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Remote collaborators the viewer talks to, and an in-memory implementation
use crate::error::{Result, ViewerError};
use crate::model::{Author, Group, Item, ItemId, MediaKind, MediaRef, ReactionCounts};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Data, reaction and seen-ledger service behind the viewer.
///
/// Every call is best-effort from the viewer's point of view; errors are
/// logged and dropped by the caller.
#[async_trait]
pub trait StoryService: Send + Sync {
    /// Full ordered dataset at open time
    async fn fetch_groups(&self) -> Result<Vec<Group>>;

    /// Idempotent
    async fn mark_seen(&self, item_id: &str) -> Result<()>;

    async fn reaction_counts(&self, item_ids: &[ItemId]) -> Result<HashMap<ItemId, ReactionCounts>>;

    async fn user_reaction(&self, item_id: &str) -> Result<Option<String>>;

    /// Toggles: the same symbol twice removes the reaction
    async fn react(&self, item_id: &str, symbol: &str) -> Result<()>;
}

#[derive(Default)]
struct Inner {
    groups: Vec<Group>,
    counts: HashMap<ItemId, ReactionCounts>,
    own: HashMap<ItemId, String>,
    seen: HashSet<ItemId>,
}

/// In-process service used by the terminal front ends and tests
#[derive(Default)]
pub struct InMemoryStoryService {
    inner: RwLock<Inner>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryStoryService {
    pub fn new(groups: Vec<Group>) -> Self {
        let mut inner = Inner::default();
        for item in groups.iter().flat_map(|g| g.items.iter()) {
            inner.counts.insert(item.id.clone(), item.reactions.clone());
            if let Some(symbol) = &item.own_reaction {
                inner.own.insert(item.id.clone(), symbol.clone());
            }
        }
        inner.groups = groups;
        Self {
            inner: RwLock::new(inner),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Load groups from a JSON fixture (array of groups)
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let groups: Vec<Group> = serde_json::from_str(&raw)
            .map_err(|e| ViewerError::Fixture(format!("{}: {}", path.display(), e)))?;
        info!("Loaded {} groups from {:?}", groups.len(), path);
        Ok(Self::new(groups))
    }

    pub async fn save_json_file(&self, path: &Path) -> Result<()> {
        let inner = self.inner.read().await;
        let json = serde_json::to_vec_pretty(&inner.groups)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Make every call fail until switched back
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of calls received, failed ones included
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn is_seen(&self, item_id: &str) -> bool {
        self.inner.read().await.seen.contains(item_id)
    }

    pub async fn seen_count(&self) -> usize {
        self.inner.read().await.seen.len()
    }

    fn enter(&self, op: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ViewerError::Service(format!("{} unavailable", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl StoryService for InMemoryStoryService {
    async fn fetch_groups(&self) -> Result<Vec<Group>> {
        self.enter("fetch_groups")?;
        let inner = self.inner.read().await;
        let mut groups = inner.groups.clone();
        for item in groups.iter_mut().flat_map(|g| g.items.iter_mut()) {
            if let Some(counts) = inner.counts.get(&item.id) {
                item.reactions = counts.clone();
            }
            item.own_reaction = inner.own.get(&item.id).cloned();
        }
        Ok(groups)
    }

    async fn mark_seen(&self, item_id: &str) -> Result<()> {
        self.enter("mark_seen")?;
        let mut inner = self.inner.write().await;
        if inner.seen.insert(item_id.to_string()) {
            debug!("seen: {}", item_id);
        }
        Ok(())
    }

    async fn reaction_counts(&self, item_ids: &[ItemId]) -> Result<HashMap<ItemId, ReactionCounts>> {
        self.enter("reaction_counts")?;
        let inner = self.inner.read().await;
        Ok(item_ids
            .iter()
            .map(|id| (id.clone(), inner.counts.get(id).cloned().unwrap_or_default()))
            .collect())
    }

    async fn user_reaction(&self, item_id: &str) -> Result<Option<String>> {
        self.enter("user_reaction")?;
        Ok(self.inner.read().await.own.get(item_id).cloned())
    }

    async fn react(&self, item_id: &str, symbol: &str) -> Result<()> {
        self.enter("react")?;
        let mut inner = self.inner.write().await;
        let previous = inner.own.remove(item_id);
        let counts = inner.counts.entry(item_id.to_string()).or_default();

        if let Some(prev) = &previous {
            if let Some(n) = counts.get_mut(prev) {
                *n = n.saturating_sub(1);
                if *n == 0 {
                    counts.remove(prev);
                }
            }
        }
        if previous.as_deref() != Some(symbol) {
            *counts.entry(symbol.to_string()).or_insert(0) += 1;
            inner.own.insert(item_id.to_string(), symbol.to_string());
        }
        Ok(())
    }
}

const DEMO_NAMES: [&str; 6] = ["ada", "grace", "linus", "margaret", "ken", "barbara"];
const DEMO_BODIES: [&str; 5] = [
    "coffee first",
    "shipping today",
    "look at this sunset",
    "new desk setup",
    "guess where I am",
];

/// Deterministic demo dataset with items spread across the last day
pub fn demo_groups(seed: u64, now: DateTime<Utc>) -> Vec<Group> {
    let mut rng = StdRng::seed_from_u64(seed);
    DEMO_NAMES
        .iter()
        .map(|name| {
            let group_id = Uuid::from_u128(rng.gen()).to_string();
            let count = rng.gen_range(1..=4);
            let mut ages: Vec<i64> = (0..count).map(|_| rng.gen_range(0..24 * 60)).collect();
            // oldest first
            ages.sort_unstable_by(|a, b| b.cmp(a));

            let items = ages
                .into_iter()
                .map(|age_min| {
                    let media = match rng.gen_range(0..3) {
                        0 => Some(MediaRef {
                            kind: MediaKind::Image,
                            url: format!("https://media.example/{}.jpg", Uuid::from_u128(rng.gen())),
                        }),
                        1 => Some(MediaRef {
                            kind: MediaKind::Video,
                            url: format!("https://media.example/{}.mp4", Uuid::from_u128(rng.gen())),
                        }),
                        _ => None,
                    };
                    let body = DEMO_BODIES[rng.gen_range(0..DEMO_BODIES.len())].to_string();
                    let mut reactions = ReactionCounts::new();
                    if rng.gen_bool(0.6) {
                        reactions.insert("❤️".to_string(), rng.gen_range(1..40));
                    }
                    if rng.gen_bool(0.3) {
                        reactions.insert("😂".to_string(), rng.gen_range(1..10));
                    }
                    Item {
                        id: Uuid::from_u128(rng.gen()).to_string(),
                        group_id: group_id.clone(),
                        created_at: now - ChronoDuration::minutes(age_min),
                        media,
                        body: Some(body),
                        reactions,
                        own_reaction: None,
                    }
                })
                .collect();

            Group {
                id: group_id,
                author: Author {
                    id: Uuid::from_u128(rng.gen()).to_string(),
                    display_name: name.to_string(),
                    avatar_url: Some(format!("https://media.example/avatars/{}.png", name)),
                },
                items,
                has_unseen: true,
            }
        })
        .collect()
}

/// Story viewer: wires navigation, playback, gestures and reactions together
///
/// The viewer is driven from a single task. Frame ticks come from its own
/// `FrameTicker`; service calls run as spawned tasks whose replies are queued
/// and merged on the next frame, before a react or hold change, or on an
/// explicit `drain_replies`.
use crate::config::ViewerConfig;
use crate::decay::{freshness_with_window, CONTENT_OVERLAY};
use crate::events::{ViewerEvent, ViewerObserver};
use crate::gesture::{Gesture, GestureTracker, Point};
use crate::input::{gesture_command, Command, ViewerKey};
use crate::model::{Group, Item, ItemId, ReactionCounts};
use crate::navigation::{Cursor, Navigator, Transition};
use crate::reactions::{ReactionChange, ReactionOverlay};
use crate::service::StoryService;
use crate::timer::{FrameTick, FrameTicker, PlaybackState, PlaybackTimer, TimerEvent};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Service answers routed back to the viewer task
#[derive(Debug)]
enum ServiceReply {
    Counts {
        item_id: ItemId,
        seq: u64,
        counts: ReactionCounts,
    },
    OwnReaction {
        item_id: ItemId,
        seq: u64,
        symbol: Option<String>,
    },
    /// A background react call returned (either way)
    ReactDone { item_id: ItemId },
}

pub struct StoryViewer {
    service: Arc<dyn StoryService>,
    config: ViewerConfig,
    groups: Vec<Group>,
    nav: Navigator,
    timer: Option<PlaybackTimer>,
    frames: FrameTicker,
    gestures: GestureTracker,
    reactions: ReactionOverlay,
    observers: Vec<Arc<dyn ViewerObserver>>,
    replies_tx: mpsc::UnboundedSender<ServiceReply>,
    replies_rx: mpsc::UnboundedReceiver<ServiceReply>,
    /// Request counter shared by refreshes and local reactions
    seq: u64,
    /// Last local reaction per item; refresh replies up to this seq are dropped
    local_edits: HashMap<ItemId, u64>,
    /// React calls still in flight per item
    pending_reacts: HashMap<ItemId, u32>,
    pointer_hold: bool,
    key_hold: bool,
    close_notified: bool,
    overlay_cache: Option<(Instant, f32)>,
}

impl StoryViewer {
    /// Build a viewer over `groups`. Nothing plays until `open`.
    pub fn new(
        service: Arc<dyn StoryService>,
        groups: Vec<Group>,
        config: ViewerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<FrameTick>) {
        let (frames, frame_rx) = FrameTicker::new(config.frame_interval);
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        let mut reactions =
            ReactionOverlay::new(config.reaction_symbols.clone(), config.reaction_highlight);
        reactions.seed(&groups);

        let viewer = Self {
            service,
            gestures: GestureTracker::new(config.gesture_thresholds()),
            config,
            groups,
            nav: Navigator::open(Vec::new(), 0),
            timer: None,
            frames,
            reactions,
            observers: Vec::new(),
            replies_tx,
            replies_rx,
            seq: 0,
            local_edits: HashMap::new(),
            pending_reacts: HashMap::new(),
            pointer_hold: false,
            key_hold: false,
            close_notified: false,
            overlay_cache: None,
        };
        (viewer, frame_rx)
    }

    /// Fetch the dataset from the service, then build. A failed fetch yields
    /// an empty viewer that closes as soon as it is opened.
    pub async fn load(
        service: Arc<dyn StoryService>,
        config: ViewerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<FrameTick>) {
        let groups = match service.fetch_groups().await {
            Ok(groups) => groups,
            Err(e) => {
                warn!("fetch_groups failed: {}", e);
                Vec::new()
            }
        };
        Self::new(service, groups, config)
    }

    pub fn add_observer(&mut self, observer: Arc<dyn ViewerObserver>) {
        self.observers.push(observer);
    }

    /// Start playback at `(start_group, 0)`; out-of-range starts are clamped
    /// and an empty dataset closes immediately.
    pub fn open(&mut self, start_group: usize, now: Instant) {
        let lengths = self.groups.iter().map(|g| g.items.len()).collect();
        self.nav = Navigator::open(lengths, start_group);
        self.close_notified = false;
        self.pointer_hold = false;
        self.key_hold = false;

        match self.nav.cursor() {
            Some(cursor) => {
                info!("Viewer opened at {:?} ({} groups)", cursor, self.groups.len());
                self.enter_item(cursor, true, now);
            }
            None => {
                info!("Viewer has nothing to show, closing");
                self.shutdown();
            }
        }
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    pub fn is_closed(&self) -> bool {
        self.nav.is_closed()
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.nav.cursor()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn current_group(&self) -> Option<&Group> {
        self.cursor().and_then(|c| self.groups.get(c.group))
    }

    pub fn current_item(&self) -> Option<&Item> {
        let cursor = self.cursor()?;
        self.groups.get(cursor.group)?.items.get(cursor.item)
    }

    pub fn reactions(&self) -> &ReactionOverlay {
        &self.reactions
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn progress(&self, now: Instant) -> f32 {
        self.timer.as_ref().map(|t| t.progress(now)).unwrap_or(0.0)
    }

    pub fn playback_state(&self) -> Option<PlaybackState> {
        self.timer.as_ref().map(|t| t.state())
    }

    pub fn frames_active(&self) -> bool {
        self.frames.is_active()
    }

    pub fn frame_generation(&self) -> u64 {
        self.frames.generation()
    }

    /// Darkness alpha for the current item, recomputed at most once per
    /// `decay_refresh`
    pub fn content_overlay_alpha(&mut self, wall: DateTime<Utc>, now: Instant) -> f32 {
        if let Some((at, alpha)) = self.overlay_cache {
            if now.saturating_duration_since(at) < self.config.decay_refresh {
                return alpha;
            }
        }
        let alpha = match self.current_item() {
            Some(item) => CONTENT_OVERLAY.apply(freshness_with_window(
                item.created_at,
                wall,
                self.config.decay_window,
            )),
            None => CONTENT_OVERLAY.apply(1.0),
        };
        self.overlay_cache = Some((now, alpha));
        alpha
    }

    // ─── Navigation ─────────────────────────────────────────────────────────

    pub fn next(&mut self, now: Instant) {
        let transition = self.nav.next();
        self.after_transition(transition, now);
    }

    pub fn previous(&mut self, now: Instant) {
        let transition = self.nav.previous();
        self.after_transition(transition, now);
    }

    pub fn close(&mut self) {
        let transition = self.nav.close();
        if transition == Transition::Closed {
            self.shutdown();
        }
    }

    pub fn apply(&mut self, command: Command, now: Instant) {
        if self.is_closed() {
            return;
        }
        match command {
            Command::Next => self.next(now),
            Command::Previous => self.previous(now),
            Command::Close => self.close(),
            Command::ToggleHold => {
                self.key_hold = !self.key_hold;
                self.update_hold(now);
            }
        }
    }

    pub fn handle_key(&mut self, key: ViewerKey, now: Instant) {
        self.apply(Command::from(key), now);
    }

    /// Apply an already-classified gesture
    pub fn handle_gesture(&mut self, gesture: Gesture, now: Instant) {
        if let Some(command) = gesture_command(gesture) {
            self.apply(command, now);
        }
    }

    // ─── Pointer channel ────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, pos: Point, now: Instant) {
        if self.is_closed() {
            return;
        }
        if self.gestures.pointer_down(pos, now) == Gesture::Hold {
            self.pointer_hold = true;
            self.update_hold(now);
        }
    }

    pub fn pointer_up(&mut self, pos: Point, surface_width: f32, now: Instant) -> Option<Gesture> {
        if self.is_closed() {
            return None;
        }
        let gesture = self.gestures.pointer_up(pos, now, surface_width);
        self.pointer_hold = false;
        self.update_hold(now);
        if let Some(g) = gesture {
            self.handle_gesture(g, now);
        }
        gesture
    }

    /// OS interruption: resume playback, navigate nowhere
    pub fn pointer_cancel(&mut self, now: Instant) {
        self.gestures.pointer_cancel();
        self.pointer_hold = false;
        if !self.is_closed() {
            self.update_hold(now);
        }
    }

    // ─── Frame loop ─────────────────────────────────────────────────────────

    /// Entry point for ticks from the frame receiver; stale ones are ignored
    pub fn on_frame(&mut self, tick: FrameTick, now: Instant) -> bool {
        if !self.frames.is_current(tick) {
            return false;
        }
        self.tick(now)
    }

    /// Advance playback by one frame. Returns true when the cursor moved or
    /// the viewer closed because the current item finished.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.drain_replies();
        let event = self.timer.as_mut().and_then(|t| t.tick(now));
        match event {
            Some(TimerEvent::Advance) => {
                debug!("viewer: item finished, advancing");
                self.next(now);
                true
            }
            None => false,
        }
    }

    /// Merge queued service replies. Replies for items that are no longer
    /// current are stored for later display.
    pub fn drain_replies(&mut self) -> usize {
        let mut merged = 0;
        while let Ok(reply) = self.replies_rx.try_recv() {
            match reply {
                ServiceReply::Counts {
                    item_id,
                    seq,
                    counts,
                } => {
                    if self.is_superseded(&item_id, seq) {
                        continue;
                    }
                    self.reactions.merge_counts(item_id, counts);
                }
                ServiceReply::OwnReaction {
                    item_id,
                    seq,
                    symbol,
                } => {
                    if self.is_superseded(&item_id, seq) {
                        continue;
                    }
                    self.reactions.merge_own(item_id, symbol);
                }
                ServiceReply::ReactDone { item_id } => {
                    self.finish_react(item_id);
                    continue;
                }
            }
            merged += 1;
        }
        merged
    }

    // ─── Reactions ──────────────────────────────────────────────────────────

    /// React on the current item. Counts change immediately; the service
    /// call runs in the background and is never rolled back.
    pub fn react(&mut self, symbol: &str, now: Instant) -> Option<ReactionChange> {
        // toggle against the freshest counts we have
        self.drain_replies();
        let item_id = self.current_item()?.id.clone();
        let change = self.reactions.react(&item_id, symbol, now);
        self.seq += 1;
        self.local_edits.insert(item_id.clone(), self.seq);
        *self.pending_reacts.entry(item_id.clone()).or_default() += 1;

        self.emit(ViewerEvent::Reacted {
            item_id: item_id.clone(),
            symbol: symbol.to_string(),
        });

        let service = self.service.clone();
        let tx = self.replies_tx.clone();
        let symbol = symbol.to_string();
        tokio::spawn(async move {
            if let Err(e) = service.react(&item_id, &symbol).await {
                warn!("react {} on {} failed: {}", symbol, item_id, e);
            }
            let _ = tx.send(ServiceReply::ReactDone { item_id });
        });
        Some(change)
    }

    /// React with the palette symbol at `index`
    pub fn react_at(&mut self, index: usize, now: Instant) -> Option<ReactionChange> {
        let symbol = self.reactions.symbol_at(index)?.to_string();
        self.react(&symbol, now)
    }

    pub fn toggle_tray(&mut self) -> bool {
        self.reactions.toggle_tray()
    }

    // ─── Internals ──────────────────────────────────────────────────────────

    fn after_transition(&mut self, transition: Transition, now: Instant) {
        match transition {
            Transition::Moved {
                to, entered_group, ..
            } => self.enter_item(to, entered_group, now),
            Transition::Closed => self.shutdown(),
            Transition::Unchanged => {}
        }
    }

    fn enter_item(&mut self, cursor: Cursor, entered_group: bool, now: Instant) {
        if entered_group {
            self.clear_unseen(cursor.group);
        }

        // a keyboard hold does not survive navigation; a pointer still down does
        self.key_hold = false;
        match self.timer.as_mut() {
            Some(timer) => timer.restart(cursor, now),
            None => self.timer = Some(PlaybackTimer::new(self.config.item_duration, cursor, now)),
        }
        self.overlay_cache = None;
        self.reactions.set_tray_open(false);

        if self.pointer_hold {
            if let Some(timer) = self.timer.as_mut() {
                timer.pause(now);
            }
            self.frames.cancel();
        } else {
            self.frames.start();
        }

        let Some(item_id) = self.current_item().map(|i| i.id.clone()) else {
            return;
        };
        debug!("viewer: showing {} at {:?}", item_id, cursor);
        self.spawn_mark_seen(item_id.clone());
        self.spawn_refresh(item_id.clone());
        self.emit(ViewerEvent::CursorChanged { cursor, item_id });
    }

    fn update_hold(&mut self, now: Instant) {
        // frames stop while held, so merge whatever arrived before pausing
        self.drain_replies();
        let held = self.pointer_hold || self.key_hold;
        let Some(timer) = self.timer.as_mut() else {
            return;
        };
        match (held, timer.state()) {
            (true, PlaybackState::Running) => {
                timer.pause(now);
                self.frames.cancel();
            }
            (false, PlaybackState::Paused) => {
                timer.resume(now);
                self.frames.start();
            }
            _ => {}
        }
    }

    fn clear_unseen(&mut self, group: usize) {
        let Some(g) = self.groups.get_mut(group) else {
            return;
        };
        if !g.has_unseen {
            return;
        }
        g.has_unseen = false;
        debug!("viewer: group {} no longer unseen", g.id);
        self.emit(ViewerEvent::GroupsChanged {
            groups: self.groups.clone(),
        });
    }

    fn shutdown(&mut self) {
        self.frames.cancel();
        self.timer = None;
        self.gestures.pointer_cancel();
        self.pointer_hold = false;
        self.key_hold = false;
        if !self.close_notified {
            self.close_notified = true;
            info!("Viewer closed");
            self.emit(ViewerEvent::Closed);
        }
    }

    /// Any refresh requested before the last react call on `item_id` returned
    /// may predate the write, so it loses to the local counts.
    fn is_superseded(&self, item_id: &str, seq: u64) -> bool {
        self.pending_reacts.contains_key(item_id)
            || self
                .local_edits
                .get(item_id)
                .is_some_and(|&edited| seq <= edited)
    }

    fn finish_react(&mut self, item_id: ItemId) {
        let Some(pending) = self.pending_reacts.get_mut(&item_id) else {
            return;
        };
        *pending -= 1;
        if *pending == 0 {
            self.pending_reacts.remove(&item_id);
            self.local_edits.insert(item_id, self.seq);
        }
    }

    fn spawn_mark_seen(&self, item_id: ItemId) {
        let service = self.service.clone();
        tokio::spawn(async move {
            if let Err(e) = service.mark_seen(&item_id).await {
                warn!("mark_seen {} failed: {}", item_id, e);
            }
        });
    }

    fn spawn_refresh(&mut self, item_id: ItemId) {
        self.seq += 1;
        let seq = self.seq;
        let service = self.service.clone();
        let tx = self.replies_tx.clone();
        tokio::spawn(async move {
            match service.reaction_counts(std::slice::from_ref(&item_id)).await {
                Ok(mut counts) => {
                    let counts = counts.remove(&item_id).unwrap_or_default();
                    let _ = tx.send(ServiceReply::Counts {
                        item_id: item_id.clone(),
                        seq,
                        counts,
                    });
                }
                Err(e) => warn!("reaction_counts {} failed: {}", item_id, e),
            }
            match service.user_reaction(&item_id).await {
                Ok(symbol) => {
                    let _ = tx.send(ServiceReply::OwnReaction {
                        item_id,
                        seq,
                        symbol,
                    });
                }
                Err(e) => warn!("user_reaction {} failed: {}", item_id, e),
            }
        });
    }

    fn emit(&self, event: ViewerEvent) {
        for observer in &self.observers {
            match &event {
                ViewerEvent::GroupsChanged { groups } => observer.on_groups_changed(groups),
                ViewerEvent::Closed => observer.on_close(),
                _ => {}
            }
            observer.on_event(&event);
        }
    }
}

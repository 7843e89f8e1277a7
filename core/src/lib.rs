/// Storyview - Ephemeral Content Viewer
///
/// Timed, navigable presentation of short-lived story items grouped by
/// author: auto-advance, hold-to-pause, tap/swipe/keyboard navigation,
/// 24-hour decay, and an optimistic reaction tray.

pub mod error;
pub mod config;
pub mod model;
pub mod decay;
pub mod gesture;
pub mod timer;
pub mod navigation;
pub mod input;
pub mod reactions;
pub mod rail;
pub mod events;
pub mod service;
pub mod viewer;
pub mod cli_app;

pub use error::{ViewerError, Result};
pub use config::ViewerConfig;
pub use viewer::StoryViewer;

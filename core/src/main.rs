/// Storyview - interactive terminal story viewer
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use storyview_core::{
    cli_app::open_service,
    events::{BroadcastObserver, ViewerEvent},
    gesture::Point,
    input::ViewerKey,
    model::{Content, MediaKind},
    rail::{Rail, RingStyle},
    service::{InMemoryStoryService, StoryService},
    timer::FrameTick,
    StoryViewer, ViewerConfig,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Terminal cells are mapped to pixels so gesture thresholds keep their meaning
const CELL_WIDTH_PX: f32 = 8.0;
const CELL_HEIGHT_PX: f32 = 16.0;

struct App {
    service: Arc<InMemoryStoryService>,
    config: ViewerConfig,
    rail: Rail,
    viewer: Option<StoryViewer>,
    frame_rx: Option<mpsc::UnboundedReceiver<FrameTick>>,
    observer: BroadcastObserver,
    events_rx: broadcast::Receiver<ViewerEvent>,
    /// Content area from the last draw, used for pointer coordinates
    surface: Rect,
    quit: bool,
}

impl App {
    fn open_viewer(&mut self, group: usize) {
        let service: Arc<dyn StoryService> = self.service.clone();
        let (mut viewer, frame_rx) =
            StoryViewer::new(service, self.rail.groups().to_vec(), self.config.clone());
        viewer.add_observer(Arc::new(self.observer.clone()));
        viewer.open(group, Instant::now());
        self.viewer = Some(viewer);
        self.frame_rx = Some(frame_rx);
    }

    fn close_viewer(&mut self) {
        if let Some(viewer) = self.viewer.take() {
            self.rail.apply_groups_changed(viewer.groups().to_vec());
        }
        self.frame_rx = None;
    }

    fn drain_events(&mut self) {
        loop {
            match self.events_rx.try_recv() {
                Ok(ViewerEvent::GroupsChanged { groups }) => self.rail.apply_groups_changed(groups),
                Ok(ViewerEvent::Closed) => self.close_viewer(),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("viewer events lagged {} events", n);
                }
                Err(_) => break,
            }
        }
    }

    fn on_frame(&mut self, tick: FrameTick) {
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.on_frame(tick, Instant::now());
        }
    }

    fn on_event(&mut self, ev: Event) {
        let now = Instant::now();
        match self.viewer.as_mut() {
            None => self.on_rail_event(ev),
            Some(viewer) => match ev {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Esc => viewer.handle_key(ViewerKey::Escape, now),
                    KeyCode::Left => viewer.handle_key(ViewerKey::ArrowLeft, now),
                    KeyCode::Right => viewer.handle_key(ViewerKey::ArrowRight, now),
                    KeyCode::Char(' ') => viewer.handle_key(ViewerKey::Space, now),
                    KeyCode::Char('t') => {
                        viewer.toggle_tray();
                    }
                    KeyCode::Char('q') => viewer.close(),
                    KeyCode::Char(c @ '1'..='9') => {
                        let index = c as usize - '1' as usize;
                        viewer.react_at(index, now);
                    }
                    _ => {}
                },
                Event::Mouse(mouse) => {
                    let pos = to_surface_point(self.surface, mouse.column, mouse.row);
                    let width = self.surface.width as f32 * CELL_WIDTH_PX;
                    match mouse.kind {
                        MouseEventKind::Down(MouseButton::Left) => viewer.pointer_down(pos, now),
                        MouseEventKind::Up(MouseButton::Left) => {
                            viewer.pointer_up(pos, width, now);
                        }
                        _ => {}
                    }
                }
                Event::FocusLost => viewer.pointer_cancel(now),
                _ => {}
            },
        }
    }

    fn on_rail_event(&mut self, ev: Event) {
        let Event::Key(key) = ev else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Left => self.rail.select_previous(),
            KeyCode::Right => self.rail.select_next(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(group) = self.rail.activate_selected() {
                    self.open_viewer(group);
                }
            }
            _ => {}
        }
    }
}

fn to_surface_point(surface: Rect, column: u16, row: u16) -> Point {
    Point::new(
        column.saturating_sub(surface.x) as f32 * CELL_WIDTH_PX,
        row.saturating_sub(surface.y) as f32 * CELL_HEIGHT_PX,
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = ViewerConfig::from_args(&args)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    // stdout belongs to the terminal UI, so logs go to a file
    let log_file = std::fs::File::create(&config.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();

    let service = Arc::new(open_service(&config)?);
    let groups = match service.fetch_groups().await {
        Ok(groups) => groups,
        Err(e) => {
            error!("fetch_groups failed: {}", e);
            Vec::new()
        }
    };
    info!("Starting storyview with {} groups", groups.len());

    // Input reader thread
    let (tx, mut input_rx) = mpsc::unbounded_channel::<Event>();
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("input error: {}", e);
                break;
            }
        }
    });

    let observer = BroadcastObserver::new(64);
    let events_rx = observer.subscribe();
    let mut app = App {
        service,
        rail: Rail::new(groups).with_window(config.decay_window),
        config,
        viewer: None,
        frame_rx: None,
        observer,
        events_rx,
        surface: Rect::default(),
        quit: false,
    };

    // TUI setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &mut input_rx).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        eprintln!("TUI error: {e}");
    }
    Ok(())
}

async fn next_frame(rx: &mut Option<mpsc::UnboundedReceiver<FrameTick>>) -> Option<FrameTick> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    input_rx: &mut mpsc::UnboundedReceiver<Event>,
) -> std::io::Result<()> {
    // Rail brightness drifts slowly; a coarse redraw is enough there
    let mut idle = tokio::time::interval(Duration::from_millis(250));
    let mut last_redraw = Instant::now() - Duration::from_secs(1);

    while !app.quit {
        tokio::select! {
            Some(ev) = input_rx.recv() => app.on_event(ev),
            Some(tick) = next_frame(&mut app.frame_rx) => app.on_frame(tick),
            _ = idle.tick() => {}
        }
        // replies keep arriving while playback is held and frames are stopped
        if let Some(viewer) = app.viewer.as_mut() {
            viewer.drain_replies();
        }
        app.drain_events();
        if app.viewer.as_ref().is_some_and(|v| v.is_closed()) {
            app.close_viewer();
        }

        // Redraw ~60 FPS cap
        if last_redraw.elapsed() >= Duration::from_millis(16) {
            terminal.draw(|f| draw(f, app))?;
            last_redraw = Instant::now();
        }
    }
    Ok(())
}

fn draw(f: &mut Frame, app: &mut App) {
    let area = f.size();
    match app.viewer.as_mut() {
        Some(viewer) => app.surface = draw_viewer(f, area, viewer),
        None => draw_rail(f, area, &app.rail),
    }
}

fn draw_rail(f: &mut Frame, area: Rect, rail: &Rail) {
    let now = chrono::Utc::now();
    let mut spans = Vec::new();
    for entry in rail.entries(now) {
        let (ring, ring_style) = match entry.ring {
            RingStyle::UnseenGradient => ("◉", Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
            RingStyle::Muted => ("○", Style::default().fg(Color::DarkGray)),
        };
        let level = (entry.brightness * 255.0).round() as u8;
        let mut name_style = Style::default().fg(Color::Rgb(level, level, level));
        if entry.group_index == rail.selected() {
            name_style = name_style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
        }
        spans.push(Span::styled(ring, ring_style));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(entry.display_name, name_style));
        spans.push(Span::raw("   "));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)].as_ref())
        .split(area);

    let rail_para = Paragraph::new(Line::from(spans))
        .block(Block::default().title("Stories").borders(Borders::ALL));
    f.render_widget(rail_para, chunks[0]);

    let help = Paragraph::new(vec![
        Line::from("←/→ select   Enter open   q quit"),
        Line::from(Span::styled(
            "In the viewer: click halves or swipe, hold to pause, Space pause, t tray, 1-6 react, Esc close",
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(Block::default().title("Info").borders(Borders::ALL));
    f.render_widget(help, chunks[1]);
}

/// Draws the viewer and returns the content surface rect
fn draw_viewer(f: &mut Frame, area: Rect, viewer: &mut StoryViewer) -> Rect {
    let now = Instant::now();
    let wall = chrono::Utc::now();
    let progress = viewer.progress(now);
    let alpha = viewer.content_overlay_alpha(wall, now);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let (Some(cursor), Some(group), Some(item)) =
        (viewer.cursor(), viewer.current_group(), viewer.current_item())
    else {
        return chunks[2];
    };

    // Progress segments, one per item in the group
    let count = group.items.len().max(1);
    let seg_width = ((area.width as usize).saturating_sub(count) / count).max(1);
    let mut bar = Vec::new();
    for i in 0..group.items.len() {
        let fill = if i < cursor.item {
            1.0
        } else if i == cursor.item {
            progress
        } else {
            0.0
        };
        let filled = (fill * seg_width as f32).round() as usize;
        bar.push(Span::styled("━".repeat(filled), Style::default().fg(Color::White)));
        bar.push(Span::styled(
            "─".repeat(seg_width - filled.min(seg_width)),
            Style::default().fg(Color::DarkGray),
        ));
        bar.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(bar)), chunks[0]);

    let age = wall - item.created_at;
    let paused = matches!(
        viewer.playback_state(),
        Some(storyview_core::timer::PlaybackState::Paused)
    );
    let header = Line::from(vec![
        Span::styled(
            group.author.display_name.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{}h {}m ago", age.num_hours(), age.num_minutes() % 60),
            Style::default().fg(Color::Gray),
        ),
        Span::raw(if paused { "  ⏸" } else { "" }),
    ]);
    f.render_widget(Paragraph::new(header), chunks[1]);

    // Darker as the item ages
    let level = ((1.0 - alpha) * 255.0).round() as u8;
    let content_style = Style::default().fg(Color::Rgb(level, level, level));
    let text = match item.content() {
        Content::Media(media) => match media.kind {
            MediaKind::Image => format!("[image] {}", media.url),
            MediaKind::Video => format!("[video] {}", media.url),
        },
        Content::Text(body) => body.to_string(),
        Content::Placeholder => "·".to_string(),
    };
    let mut lines = vec![Line::from(Span::styled(text, content_style))];
    if let (Content::Media(_), Some(body)) = (item.content(), item.body.as_deref()) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(body.to_string(), content_style)));
    }
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(body, chunks[2]);

    let reactions = viewer.reactions();
    let footer = if reactions.tray_open() {
        let mut spans = Vec::new();
        for (i, symbol) in reactions.symbols().iter().enumerate() {
            let mut style = Style::default();
            if reactions.own_reaction(&item.id) == Some(symbol.as_str()) {
                style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            }
            if reactions.is_highlighted(&item.id, symbol, now) {
                style = style.bg(Color::DarkGray);
            }
            spans.push(Span::styled(
                format!("{}:{} {}  ", i + 1, symbol, reactions.count(&item.id, symbol)),
                style,
            ));
        }
        Line::from(spans)
    } else {
        let total: u32 = reactions
            .counts(&item.id)
            .map(|c| c.values().sum())
            .unwrap_or(0);
        Line::from(Span::styled(
            format!("{} reactions   t: react", total),
            Style::default().fg(Color::Gray),
        ))
    };
    f.render_widget(Paragraph::new(footer), chunks[3]);

    chunks[2]
}

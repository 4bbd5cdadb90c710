//! Main application orchestrator.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind};
use futures_util::StreamExt;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};
use tokio::sync::{mpsc, watch};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::application::services::{
    BatchProgress, CategoryFilter, CollectionBrowser, LoadController, LoadEvent, LoaderConfig,
    PageMode, Preloader, RowSpan, VisibilityGate, WARM_AHEAD,
};
use crate::domain::entities::AssetRecord;
use crate::domain::ports::{
    AssetStorePort, ImageFetchPort, PreloadCachePort, UrlResolverPort,
};
use crate::infrastructure::media::MemoryImageCache;
use crate::presentation::widgets::{AssetCard, CARD_HEIGHT, StatusBar, StatusLevel};

const TICK_RATE: Duration = Duration::from_millis(120);

// Leading window cards treated as above-the-fold: they load eagerly
// instead of waiting for a visibility observation.
const PRIORITY_COUNT: usize = 2;

/// Adapters the gallery application runs against.
pub struct AppServices {
    /// The asset record store.
    pub store: Arc<dyn AssetStorePort>,
    /// Storage-key to URL resolution.
    pub resolver: Arc<dyn UrlResolverPort>,
    /// Image byte transport.
    pub fetcher: Arc<dyn ImageFetchPort>,
    /// Persistent preload cache.
    pub preload_cache: Arc<dyn PreloadCachePort>,
    /// Decoded-image memory cache.
    pub memory_cache: Arc<MemoryImageCache>,
}

/// The terminal gallery application.
pub struct GalleryApp {
    browser: CollectionBrowser,
    resolver: Arc<dyn UrlResolverPort>,
    fetcher: Arc<dyn ImageFetchPort>,
    preload_cache: Arc<dyn PreloadCachePort>,
    memory_cache: Arc<MemoryImageCache>,
    preloader: Arc<Preloader>,
    loader_config: LoaderConfig,
    cards: Vec<AssetCard>,
    selected: usize,
    first_visible: usize,
    load_tx: mpsc::UnboundedSender<LoadEvent>,
    load_rx: mpsc::UnboundedReceiver<LoadEvent>,
    progress_rx: watch::Receiver<BatchProgress>,
    status: Option<(String, StatusLevel)>,
    running: bool,
}

impl GalleryApp {
    /// Creates the application in discrete paging mode.
    #[must_use]
    pub fn new(services: AppServices, loader_config: LoaderConfig, page_size: usize) -> Self {
        let browser = CollectionBrowser::new(services.store, PageMode::Discrete, page_size);
        let preloader = Arc::new(Preloader::new(
            services.fetcher.clone(),
            services.preload_cache.clone(),
        ));
        let progress_rx = preloader.progress();
        let (load_tx, load_rx) = mpsc::unbounded_channel();

        Self {
            browser,
            resolver: services.resolver,
            fetcher: services.fetcher,
            preload_cache: services.preload_cache,
            memory_cache: services.memory_cache,
            preloader,
            loader_config,
            cards: Vec::new(),
            selected: 0,
            first_visible: 0,
            load_tx,
            load_rx,
            progress_rx,
            status: None,
            running: true,
        }
    }

    /// Runs the application until the user quits.
    ///
    /// # Errors
    /// Returns terminal I/O errors.
    pub async fn run(mut self, terminal: &mut ratatui::DefaultTerminal) -> color_eyre::Result<()> {
        match self.browser.load().await {
            Ok(()) => {
                self.rebuild_cards();
                self.warm_window();
            }
            Err(e) => self.set_status(format!("Failed to load images: {e}"), StatusLevel::Error),
        }

        let mut events = EventStream::new();
        let mut ticker = interval(TICK_RATE);
        let mut tick: usize = 0;

        while self.running {
            terminal.draw(|frame| self.draw(frame, tick))?;

            tokio::select! {
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key).await;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    tick = tick.wrapping_add(1);
                }
                Some(event) = self.load_rx.recv() => {
                    Self::on_load_event(&event);
                }
                _ = self.progress_rx.changed() => {}
            }
        }

        info!("gallery session ended");
        Ok(())
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.cards.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('n') => {
                if self.browser.mode() == PageMode::Discrete && self.browser.next_page() {
                    self.on_window_changed();
                }
            }
            KeyCode::Left | KeyCode::Char('p') => {
                if self.browser.mode() == PageMode::Discrete && self.browser.prev_page() {
                    self.on_window_changed();
                }
            }
            KeyCode::Char(' ') => {
                if self.browser.mode() == PageMode::Progressive && self.browser.load_more() {
                    self.rebuild_cards();
                }
            }
            KeyCode::Char('s') => {
                if self.browser.mode() == PageMode::Progressive && self.browser.can_see_less() {
                    self.browser.see_less();
                    self.rebuild_cards();
                }
            }
            KeyCode::Char('m') => {
                let mode = match self.browser.mode() {
                    PageMode::Discrete => PageMode::Progressive,
                    PageMode::Progressive => PageMode::Discrete,
                };
                self.browser.set_mode(mode);
                self.on_window_changed();
            }
            KeyCode::Char('c') => {
                self.cycle_category();
                self.on_window_changed();
            }
            KeyCode::Char('r') => {
                if let Some(card) = self.cards.get(self.selected)
                    && card.state().phase.is_failed()
                {
                    card.retry();
                    self.set_status("Retrying…", StatusLevel::Info);
                }
            }
            KeyCode::Char('d') => self.delete_selected().await,
            KeyCode::Char('g') => self.refresh().await,
            _ => {}
        }
    }

    async fn delete_selected(&mut self) {
        let Some(card) = self.cards.get(self.selected) else {
            return;
        };
        let id = card.record().id.clone();
        let title = card.record().title.clone();

        match self.browser.delete(&id).await {
            Ok(()) => {
                self.set_status(format!("Deleted \"{title}\""), StatusLevel::Success);
                self.rebuild_cards();
                self.warm_window();
            }
            Err(e) => {
                self.set_status(format!("Failed to delete image: {e}"), StatusLevel::Error);
            }
        }
    }

    async fn refresh(&mut self) {
        match self.browser.load().await {
            Ok(()) => {
                self.set_status("Collection refreshed", StatusLevel::Info);
                self.on_window_changed();
            }
            Err(e) => {
                self.set_status(format!("Failed to load images: {e}"), StatusLevel::Error);
            }
        }
    }

    fn cycle_category(&mut self) {
        let categories = self.browser.categories();
        let current = self.browser.category().label().to_string();
        let index = categories
            .iter()
            .position(|c| *c == current)
            .unwrap_or(0);
        let next = &categories[(index + 1) % categories.len()];
        let filter = if next == "All" {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(next.clone())
        };
        self.browser.set_category(filter);
    }

    fn on_window_changed(&mut self) {
        self.rebuild_cards();
        self.warm_window();
    }

    /// Rebuilds the card list from the current window, keeping existing
    /// cards (and their load state) for records that remain visible.
    fn rebuild_cards(&mut self) {
        let window: Vec<AssetRecord> = self.browser.window().into_iter().cloned().collect();
        let mut existing: HashMap<_, _> = self
            .cards
            .drain(..)
            .map(|card| (card.record().id.clone(), card))
            .collect();

        self.cards = window
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                existing.remove(&record.id).unwrap_or_else(|| {
                    let url = self.resolver.resolve_url(&record.storage_key);
                    let controller = LoadController::with_config(
                        url,
                        self.fetcher.clone(),
                        self.loader_config.clone(),
                    )
                    .with_preload_cache(self.preload_cache.clone())
                    .with_memory_cache(self.memory_cache.clone())
                    .with_events(self.load_tx.clone());
                    let gate = VisibilityGate::new(index < PRIORITY_COUNT);
                    AssetCard::new(record, gate, controller)
                })
            })
            .collect();

        self.selected = self.selected.min(self.cards.len().saturating_sub(1));
        self.first_visible = self.first_visible.min(self.selected);
    }

    /// Warms the preload cache for the head of the current window.
    /// Advisory only; card load states are untouched.
    fn warm_window(&self) {
        let urls: Vec<String> = self
            .browser
            .window()
            .iter()
            .take(WARM_AHEAD)
            .map(|record| self.resolver.resolve_url(&record.storage_key))
            .collect();
        if urls.is_empty() {
            return;
        }
        debug!(count = urls.len(), "warming window head");
        let preloader = self.preloader.clone();
        tokio::spawn(async move {
            let progress = preloader.preload_all(&urls).await;
            debug!(
                loaded = progress.loaded_count,
                total = progress.total_count,
                "window warm settled"
            );
        });
    }

    fn on_load_event(event: &LoadEvent) {
        match &event.result {
            Ok(source) => debug!(url = %event.url, source = %source, "card finished loading"),
            Err(error) => warn!(url = %event.url, error, "card load failed terminally"),
        }
    }

    fn set_status(&mut self, message: impl Into<String>, level: StatusLevel) {
        self.status = Some((message.into(), level));
    }

    fn draw(&mut self, frame: &mut Frame<'_>, tick: usize) {
        let [header, body, footer] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.draw_header(frame, header);
        self.draw_cards(frame, body, tick);
        self.draw_footer(frame, footer);
    }

    fn draw_header(&self, frame: &mut Frame<'_>, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                crate::NAME,
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" v{} · {} images", crate::VERSION, self.browser.filtered_count()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);

        let active = self.browser.category().label().to_string();
        let mut tabs: Vec<Span<'_>> = Vec::new();
        for category in self.browser.categories() {
            let style = if category == active {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            tabs.push(Span::styled(format!(" {category} "), style));
        }

        Paragraph::new(vec![title, Line::from(tabs)]).render(area, frame.buffer_mut());
    }

    fn draw_cards(&mut self, frame: &mut Frame<'_>, area: Rect, tick: usize) {
        if self.cards.is_empty() {
            let message = format!(
                "No images found in {}",
                self.browser.category().label()
            );
            Paragraph::new(Span::styled(message, Style::default().fg(Color::DarkGray)))
                .render(area, frame.buffer_mut());
            return;
        }

        let capacity = (area.height as usize / CARD_HEIGHT).max(1);
        if self.selected < self.first_visible {
            self.first_visible = self.selected;
        } else if self.selected >= self.first_visible + capacity {
            self.first_visible = self.selected + 1 - capacity;
        }

        // Feed every gate the scroll position; off-screen cards only see
        // the lookahead margin.
        let viewport = RowSpan::new(self.first_visible * CARD_HEIGHT, capacity * CARD_HEIGHT);
        for (index, card) in self.cards.iter_mut().enumerate() {
            card.observe(RowSpan::new(index * CARD_HEIGHT, CARD_HEIGHT), viewport);
        }

        let buf = frame.buffer_mut();
        let end = (self.first_visible + capacity).min(self.cards.len());
        for (slot, index) in (self.first_visible..end).enumerate() {
            let Ok(offset) = u16::try_from(slot * CARD_HEIGHT) else {
                break;
            };
            let Ok(height) = u16::try_from(CARD_HEIGHT) else {
                break;
            };
            if offset + height > area.height {
                break;
            }
            let card_area = Rect::new(area.x, area.y + offset, area.width, height);
            self.cards[index].render(card_area, buf, index == self.selected, tick);
        }
    }

    fn draw_footer(&self, frame: &mut Frame<'_>, area: Rect) {
        let (left, level) = self.status.clone().map_or_else(
            || {
                (
                    "q quit · j/k move · c category · m mode · r retry · d delete · g refresh"
                        .to_string(),
                    StatusLevel::Info,
                )
            },
            |(message, level)| (message, level),
        );

        let center = match self.browser.mode() {
            PageMode::Discrete => {
                let (current, total) = self.browser.page_display();
                let mut text = format!("page {current}/{total}");
                if self.browser.has_prev() {
                    text.push_str(" · [p]rev");
                }
                if self.browser.has_next() {
                    text.push_str(" · [n]ext");
                }
                text
            }
            PageMode::Progressive => {
                let mut text = format!(
                    "{} of {}",
                    self.cards.len(),
                    self.browser.filtered_count()
                );
                if self.browser.has_more() {
                    text.push_str(" · [space] load more");
                }
                if self.browser.can_see_less() {
                    text.push_str(" · [s]ee less");
                }
                text
            }
        };

        let progress = *self.progress_rx.borrow();
        let mut right = String::new();
        if progress.total_count > 0 && !progress.is_complete {
            right.push_str(&format!(
                "warming {}/{} · ",
                progress.loaded_count + progress.failed_count,
                progress.total_count
            ));
        }
        right.push_str(&format!("cache: {}", self.memory_cache.stats()));

        StatusBar::new()
            .left(left)
            .center(center)
            .right(right)
            .level(level)
            .render(area, frame.buffer_mut());
    }
}

impl std::fmt::Debug for GalleryApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryApp")
            .field("cards", &self.cards.len())
            .field("selected", &self.selected)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::{
        MapPreloadCache, MockAssetStore, PrefixResolver, ScriptedFetcher, sample_records,
    };

    fn test_app(records: usize, page_size: usize) -> GalleryApp {
        let services = AppServices {
            store: Arc::new(MockAssetStore::with_records(sample_records(
                records,
                &["Nature", "Street"],
            ))),
            resolver: Arc::new(PrefixResolver::new("https://gallery.test/storage")),
            fetcher: Arc::new(ScriptedFetcher::ok()),
            preload_cache: Arc::new(MapPreloadCache::new()),
            memory_cache: Arc::new(MemoryImageCache::with_default_capacity()),
        };
        GalleryApp::new(services, LoaderConfig::default(), page_size)
    }

    #[tokio::test]
    async fn cards_track_the_window() {
        let mut app = test_app(10, 8);
        app.browser.load().await.unwrap();
        app.rebuild_cards();

        assert_eq!(app.cards.len(), 8);
        // Priority head starts loading without an observation.
        assert!(app.cards[0].state().phase.is_loading());
        assert!(app.cards[PRIORITY_COUNT].state().phase.is_idle());
    }

    #[tokio::test]
    async fn rebuild_preserves_existing_cards() {
        let mut app = test_app(10, 8);
        app.browser.load().await.unwrap();
        app.browser.set_mode(PageMode::Progressive);
        app.rebuild_cards();

        let before = app.cards[0].record().id.clone();
        app.browser.load_more();
        app.rebuild_cards();

        assert_eq!(app.cards.len(), 10);
        assert_eq!(app.cards[0].record().id, before);
        // The head card kept its controller, so it is not back to idle.
        assert!(!app.cards[0].state().phase.is_idle());
    }

    #[tokio::test]
    async fn category_cycle_walks_the_tabs() {
        let mut app = test_app(10, 8);
        app.browser.load().await.unwrap();

        assert_eq!(app.browser.category().label(), "All");
        app.cycle_category();
        assert_eq!(app.browser.category().label(), "Nature");
        app.cycle_category();
        assert_eq!(app.browser.category().label(), "Street");
        app.cycle_category();
        assert_eq!(app.browser.category().label(), "All");
    }
}

//! Per-asset card widget pairing a visibility gate with a load controller.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};
use unicode_width::UnicodeWidthChar;

use crate::application::services::{LoadController, RowSpan, VisibilityGate};
use crate::domain::entities::{AssetRecord, LoadPhase, LoadState};

/// Rows one card occupies in the list, border included.
pub const CARD_HEIGHT: usize = 4;

const SPINNER: [char; 6] = ['⠋', '⠙', '⠸', '⠴', '⠦', '⠇'];

/// One rendered asset instance: record, gate, and load controller.
///
/// The card is created when its record enters the window and dropped when
/// it leaves; dropping tears the controller down and cancels any pending
/// retry.
pub struct AssetCard {
    record: AssetRecord,
    gate: VisibilityGate,
    controller: LoadController,
}

impl AssetCard {
    /// Creates a card. A gate that is already open (priority assets)
    /// unblocks the load immediately.
    #[must_use]
    pub fn new(record: AssetRecord, gate: VisibilityGate, controller: LoadController) -> Self {
        if gate.has_entered() {
            controller.mark_visible();
        }
        Self {
            record,
            gate,
            controller,
        }
    }

    /// The asset record behind this card.
    #[must_use]
    pub fn record(&self) -> &AssetRecord {
        &self.record
    }

    /// Current load state snapshot.
    #[must_use]
    pub fn state(&self) -> LoadState {
        self.controller.state()
    }

    /// Feeds the gate one layout observation; unblocks the load on the
    /// transition into view.
    pub fn observe(&mut self, item: RowSpan, viewport: RowSpan) {
        if self.gate.observe(item, viewport) {
            self.controller.mark_visible();
        }
    }

    /// Manually retries a failed load.
    pub fn retry(&self) {
        self.controller.retry();
    }

    /// Renders the card into `area`.
    pub fn render(&self, area: Rect, buf: &mut Buffer, selected: bool, tick: usize) {
        let border_style = if selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let title = truncate_to_width(&self.record.title, area.width.saturating_sub(4) as usize);
        let block = Block::bordered().border_style(border_style).title(title);
        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(self.body_lines(inner.width as usize, tick)).render(inner, buf);
    }

    fn body_lines(&self, width: usize, tick: usize) -> Vec<Line<'static>> {
        let state = self.state();
        let meta = Span::styled(
            format!("{} · {}", self.record.category, self.record.storage_key),
            Style::default().fg(Color::DarkGray),
        );

        let status = match state.phase {
            LoadPhase::Idle | LoadPhase::Loading => {
                return vec![Line::from(meta), skeleton_line(width, tick, &state)];
            }
            LoadPhase::Loaded => {
                let dimensions = self
                    .controller
                    .image()
                    .map_or_else(String::new, |img| format!("{}×{} · ", img.width(), img.height()));
                let time = state
                    .load_time_ms()
                    .map_or_else(String::new, |ms| format!("{ms} ms · "));
                let source = state
                    .source
                    .map_or_else(String::new, |s| s.to_string());
                Span::styled(
                    format!("{dimensions}{time}{source}"),
                    Style::default().fg(Color::Green),
                )
            }
            LoadPhase::Failed => {
                let hint = if self.controller.fallback_url().is_some() {
                    "✗ failed — fallback shown · r to retry"
                } else {
                    "✗ failed to load · r to retry"
                };
                Span::styled(hint.to_string(), Style::default().fg(Color::Red))
            }
        };

        vec![Line::from(meta), Line::from(status)]
    }
}

impl std::fmt::Debug for AssetCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCard")
            .field("id", &self.record.id)
            .field("entered", &self.gate.has_entered())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Pulsing placeholder shown while a card is idle or loading.
fn skeleton_line(width: usize, tick: usize, state: &LoadState) -> Line<'static> {
    let shade = if tick % 2 == 0 { '░' } else { '▒' };
    let mut line = String::new();
    if state.phase.is_loading() {
        line.push(SPINNER[tick % SPINNER.len()]);
        line.push(' ');
        if state.retry_attempts > 0 {
            line.push_str(&format!("retry {} · ", state.retry_attempts));
        }
    }
    let fill = width.saturating_sub(line.chars().map(|c| c.width().unwrap_or(1)).sum());
    line.extend(std::iter::repeat_n(shade, fill));
    Line::from(Span::styled(
        line,
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),
    ))
}

/// Truncates a string to a display width, appending an ellipsis.
#[must_use]
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(1);
        if width + w > max_width.saturating_sub(1) {
            out.push('…');
            return out;
        }
        width += w;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::application::services::LoadController;
    use crate::domain::entities::AssetId;
    use crate::domain::ports::mocks::ScriptedFetcher;

    fn record() -> AssetRecord {
        AssetRecord {
            id: AssetId::new("a1"),
            title: "Morning Dunes".to_string(),
            description: None,
            category: "Nature".to_string(),
            storage_key: "portfolio/1.png".to_string(),
            created_at: Utc::now(),
        }
    }

    fn controller() -> LoadController {
        LoadController::new(
            "https://gallery.test/portfolio/1.png",
            Arc::new(ScriptedFetcher::ok()),
        )
    }

    #[tokio::test]
    async fn priority_card_starts_loading_at_mount() {
        let card = AssetCard::new(record(), VisibilityGate::new(true), controller());
        assert!(card.state().phase.is_loading());
    }

    #[tokio::test]
    async fn deferred_card_waits_for_the_gate() {
        let mut card = AssetCard::new(record(), VisibilityGate::new(false), controller());
        assert!(card.state().phase.is_idle());

        // Far off screen: still idle.
        card.observe(RowSpan::new(400, CARD_HEIGHT), RowSpan::new(0, 40));
        assert!(card.state().phase.is_idle());

        // Scrolled into view: load unblocks.
        card.observe(RowSpan::new(8, CARD_HEIGHT), RowSpan::new(0, 40));
        assert!(card.state().phase.is_loading());
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("a long title here", 8), "a long …");
    }
}

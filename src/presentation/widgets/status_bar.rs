//! Footer status bar widget.

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Span;
use ratatui::widgets::{Paragraph, Widget};

/// Status bar severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Informational.
    Info,
    /// Success.
    Success,
    /// Warning.
    Warning,
    /// Error.
    Error,
}

impl StatusLevel {
    /// Returns the color for this level.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Info => Color::Cyan,
            Self::Success => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
        }
    }
}

/// Single-line footer with left, center, and right segments.
#[derive(Debug, Clone)]
pub struct StatusBar {
    left: String,
    center: String,
    right: String,
    level: StatusLevel,
}

impl StatusBar {
    /// Creates an empty status bar.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            left: String::new(),
            center: String::new(),
            right: String::new(),
            level: StatusLevel::Info,
        }
    }

    /// Sets the left segment.
    #[must_use]
    pub fn left(mut self, content: impl Into<String>) -> Self {
        self.left = content.into();
        self
    }

    /// Sets the center segment.
    #[must_use]
    pub fn center(mut self, content: impl Into<String>) -> Self {
        self.center = content.into();
        self
    }

    /// Sets the right segment.
    #[must_use]
    pub fn right(mut self, content: impl Into<String>) -> Self {
        self.right = content.into();
        self
    }

    /// Sets the severity coloring the left segment.
    #[must_use]
    pub const fn level(mut self, level: StatusLevel) -> Self {
        self.level = level;
        self
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for StatusBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dim = Style::default().fg(Color::DarkGray);

        Paragraph::new(Span::styled(
            self.right,
            dim,
        ))
        .alignment(Alignment::Right)
        .render(area, buf);

        Paragraph::new(Span::styled(self.center, dim))
            .alignment(Alignment::Center)
            .render(area, buf);

        Paragraph::new(Span::styled(
            self.left,
            Style::default().fg(self.level.color()),
        ))
        .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_all_segments() {
        let bar = StatusBar::new()
            .left("l")
            .center("c")
            .right("r")
            .level(StatusLevel::Error);
        assert_eq!(bar.left, "l");
        assert_eq!(bar.center, "c");
        assert_eq!(bar.right, "r");
        assert_eq!(bar.level, StatusLevel::Error);
    }

    #[test]
    fn levels_map_to_distinct_colors() {
        assert_ne!(StatusLevel::Info.color(), StatusLevel::Error.color());
        assert_ne!(StatusLevel::Success.color(), StatusLevel::Warning.color());
    }
}

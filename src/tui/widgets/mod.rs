pub mod concept_detail;
pub mod concepts;
pub mod dashboard;
pub mod due;
pub mod weak;

use chrono::{DateTime, Utc};
use ratatui::style::Color;

pub use crate::format::truncate;

const BAR_WIDTH: usize = 10;

/// Ten-cell bar for a value in `[0, 1]`.
pub fn confidence_bar(confidence: f64) -> String {
    let filled = (confidence.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled)
    )
}

pub fn confidence_color(confidence: f64) -> Color {
    if confidence < 0.3 {
        Color::Red
    } else if confidence < 0.6 {
        Color::Yellow
    } else if confidence < 0.8 {
        Color::Cyan
    } else {
        Color::Green
    }
}

pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(dt) => dt.format("%b %d").to_string(),
        None => "never".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_is_always_full_width() {
        for c in [0.0, 0.05, 0.5, 0.99, 1.0, 1.7, -0.2] {
            assert_eq!(confidence_bar(c).chars().count(), BAR_WIDTH);
        }
        assert_eq!(confidence_bar(0.5), "█████░░░░░");
    }

    #[test]
    fn colors_follow_mastery_bands() {
        assert_eq!(confidence_color(0.1), Color::Red);
        assert_eq!(confidence_color(0.8), Color::Green);
    }
}

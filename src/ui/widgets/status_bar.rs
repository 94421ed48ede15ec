use ratatui::{
    layout::{Alignment, Rect},
    widgets::Paragraph,
    Frame,
};
use std::path::Path;

use crate::types::Mode;

/// Build the status line text
pub fn status_text(mode: Mode, elapsed: &str, file: &Path) -> String {
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_else(|| file.to_string_lossy());

    // Add 2 spaces of left padding
    format!("  state: {}; time: {}; file: {}", mode.as_str(), elapsed, file_name)
}

/// Render the status bar
pub fn render_status_bar(frame: &mut Frame, area: Rect, mode: Mode, elapsed: &str, file: &Path) {
    let status_widget = Paragraph::new(status_text(mode, elapsed, file)).alignment(Alignment::Left);

    frame.render_widget(status_widget, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        let text = status_text(Mode::Recording, "00:01.50", Path::new("/tmp/take.wav"));
        assert_eq!(text, "  state: recording; time: 00:01.50; file: take.wav");
    }
}

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, MessageType};
use crate::ui::widgets::{render_controls, render_help_view, render_status_bar, render_waveform};
use crate::waveform::Viewport;

/// Virtual pixels per terminal cell, horizontally
pub const CELL_WIDTH: f32 = 8.0;

/// Virtual pixels per terminal cell, vertically
pub const CELL_HEIGHT: f32 = 16.0;

/// Screen regions of the main view
struct Regions {
    status: Rect,
    message: Option<Rect>,
    waveform: Rect,
    controls: Rect,
}

fn split(area: Rect, has_message: bool) -> Regions {
    if has_message {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Status bar
                Constraint::Length(1), // Line break
                Constraint::Length(3), // Message bar
                Constraint::Min(3),    // Waveform
                Constraint::Length(1), // Controls
            ])
            .split(area);
        Regions {
            status: chunks[0],
            message: Some(chunks[2]),
            waveform: chunks[3],
            controls: chunks[4],
        }
    } else {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Status bar
                Constraint::Length(1), // Line break
                Constraint::Min(3),    // Waveform
                Constraint::Length(1), // Controls
            ])
            .split(area);
        Regions {
            status: chunks[0],
            message: None,
            waveform: chunks[2],
            controls: chunks[3],
        }
    }
}

/// Drawing surface of the waveform for a screen of `area`, in virtual pixels
pub fn waveform_viewport(area: Rect, has_message: bool) -> Viewport {
    let inner = Block::default()
        .borders(Borders::ALL)
        .inner(split(area, has_message).waveform);
    Viewport::new(
        inner.width as f32 * CELL_WIDTH,
        inner.height as f32 * CELL_HEIGHT,
    )
}

/// Render the main UI
pub fn render_ui(frame: &mut Frame, app: &App) {
    // If help is shown, render help view instead of normal UI
    if app.show_help {
        render_help_view(frame, frame.area());
        return;
    }

    let regions = split(frame.area(), app.message.is_some());

    render_status_bar(
        frame,
        regions.status,
        app.mode(),
        app.elapsed_str(),
        app.session.output_path(),
    );

    // Render message bar if present
    if let (Some(area), Some(msg)) = (regions.message, app.message.as_ref()) {
        let (color, prefix) = match msg.msg_type {
            MessageType::Warning => (Color::Yellow, "⚠ "),
            MessageType::Error => (Color::Red, "✖ "),
        };

        let text = format!("{}{}", prefix, msg.text);
        let message_widget = Paragraph::new(Line::from(text))
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL));

        frame.render_widget(message_widget, area);
    }

    render_waveform(
        frame,
        regions.waveform,
        app.session.bars(),
        app.viewport,
        app.mode(),
    );

    render_controls(frame, regions.controls, app.mode());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_viewport_excludes_chrome() {
        // 80x24: status + blank + controls leave 21 rows, borders take 2
        let viewport = waveform_viewport(Rect::new(0, 0, 80, 24), false);
        assert_eq!(viewport, Viewport::new(78.0 * CELL_WIDTH, 19.0 * CELL_HEIGHT));

        let with_message = waveform_viewport(Rect::new(0, 0, 80, 24), true);
        assert_eq!(with_message.height, 16.0 * CELL_HEIGHT);
    }

    #[test]
    fn test_tiny_screen_has_no_viewport() {
        let viewport = waveform_viewport(Rect::new(0, 0, 1, 2), false);
        assert_eq!(viewport.width, 0.0);
    }
}

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::types::Mode;

fn key_style(enabled: bool) -> Style {
    if enabled {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn label_style(enabled: bool) -> Style {
    if enabled {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// Key hints; actions that the current mode would ignore are dimmed
pub fn controls_line(mode: Mode) -> Line<'static> {
    let record_label = if mode == Mode::Recording { " stop rec   " } else { " record   " };
    let can_stop = mode == Mode::Playing;

    Line::from(vec![
        Span::raw("  "),
        Span::styled("r", key_style(mode.can_record())),
        Span::styled(record_label, label_style(mode.can_record())),
        Span::styled("p", key_style(mode.can_play())),
        Span::styled(" play   ", label_style(mode.can_play())),
        Span::styled("s", key_style(can_stop)),
        Span::styled(" stop   ", label_style(can_stop)),
        Span::styled("?", key_style(true)),
        Span::raw(" help   "),
        Span::styled("q", key_style(true)),
        Span::raw(" quit"),
    ])
}

/// Render the controls line
pub fn render_controls(frame: &mut Frame, area: Rect, mode: Mode) {
    frame.render_widget(Paragraph::new(controls_line(mode)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_record_label_follows_mode() {
        assert!(text(&controls_line(Mode::Idle)).contains("r record"));
        assert!(text(&controls_line(Mode::Recording)).contains("r stop rec"));
    }

    #[test]
    fn test_record_dimmed_while_playing() {
        let line = controls_line(Mode::Playing);
        assert_eq!(line.spans[1].style.fg, Some(Color::DarkGray));
        assert_eq!(line.spans[3].style.fg, None);
        assert_eq!(line.spans[5].style.fg, None);
    }

    #[test]
    fn test_play_dimmed_while_recording() {
        let line = controls_line(Mode::Recording);
        assert_eq!(line.spans[1].style.fg, None);
        assert_eq!(line.spans[3].style.fg, Some(Color::DarkGray));
        assert_eq!(line.spans[5].style.fg, Some(Color::DarkGray));
    }
}

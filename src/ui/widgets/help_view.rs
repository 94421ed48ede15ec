use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the help view
pub fn render_help_view(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(""),
        Line::from("  waverec - record and replay a single take"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Recording", Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from("    r                Start recording (overwrites the previous take)"),
        Line::from("    r (recording)    Stop recording and save the file"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Playback", Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from("    p                Play the last take and replay its waveform"),
        Line::from("    s                Stop playback"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Other", Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from("    ?                Toggle this help"),
        Line::from("    q or Ctrl+c      Quit"),
        Line::from(""),
        Line::from("  Press ? to close"),
    ];

    let paragraph = Paragraph::new(help_text).alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

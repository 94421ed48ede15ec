use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    widgets::canvas::{Canvas, Line as CanvasLine},
    widgets::{Block, Borders},
    Frame,
};

use crate::types::Mode;
use crate::ui::app_ui::CELL_WIDTH;
use crate::waveform::{Bar, Viewport};

fn bar_color(mode: Mode) -> Color {
    match mode {
        Mode::Recording => Color::Red,
        Mode::Playing => Color::Green,
        Mode::Idle => Color::Gray,
    }
}

/// Vertical strokes covering one bar, in canvas coordinates (y grows upwards)
fn bar_strokes(bar: &Bar, viewport: Viewport, color: Color) -> Vec<CanvasLine> {
    let step = (CELL_WIDTH / 2.0) as f64;
    let top = (viewport.height - bar.top) as f64;
    let bottom = (viewport.height - bar.bottom) as f64;

    let mut strokes = Vec::new();
    let mut x = bar.left as f64;
    while x < bar.right as f64 {
        strokes.push(CanvasLine {
            x1: x,
            y1: bottom,
            x2: x,
            y2: top,
            color,
        });
        x += step;
    }
    strokes
}

/// Render the waveform bars inside a bordered canvas
pub fn render_waveform(frame: &mut Frame, area: Rect, bars: &[Bar], viewport: Viewport, mode: Mode) {
    let color = bar_color(mode);
    let title = match mode {
        Mode::Recording => " input ",
        Mode::Playing => " replay ",
        Mode::Idle => " waveform ",
    };

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(color)),
        )
        .marker(Marker::Braille)
        .x_bounds([0.0, viewport.width.max(1.0) as f64])
        .y_bounds([0.0, viewport.height.max(1.0) as f64])
        .paint(|ctx| {
            for bar in bars {
                for stroke in bar_strokes(bar, viewport, color) {
                    ctx.draw(&stroke);
                }
            }
        });

    frame.render_widget(canvas, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_strokes_span_bar() {
        let viewport = Viewport::new(100.0, 100.0);
        let bar = Bar {
            left: 13.0,
            top: 30.0,
            right: 21.0,
            bottom: 70.0,
        };
        let strokes = bar_strokes(&bar, viewport, Color::Red);
        assert_eq!(strokes.len(), 2);
        assert_eq!(strokes[0].x1, 13.0);
        assert_eq!(strokes[1].x1, 17.0);
        assert_eq!(strokes[0].y1, 30.0);
        assert_eq!(strokes[0].y2, 70.0);
    }

    #[test]
    fn test_flat_bar_still_draws() {
        let viewport = Viewport::new(100.0, 100.0);
        let bar = Bar {
            left: 0.0,
            top: 50.0,
            right: 8.0,
            bottom: 50.0,
        };
        let strokes = bar_strokes(&bar, viewport, Color::Gray);
        assert!(strokes.iter().all(|s| s.y1 == s.y2));
    }
}

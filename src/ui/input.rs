use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

use crate::app::App;

/// Handle keyboard input
pub fn handle_input(app: &mut App) -> anyhow::Result<()> {
    // Short timeout keeps waveform ticks flowing between key presses
    if event::poll(Duration::from_millis(10))? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                handle_key_event(app, key);
            }
        }
    }

    Ok(())
}

/// Handle a key event
fn handle_key_event(app: &mut App, key: KeyEvent) {
    // While help is open only the help and quit keys do anything
    if app.show_help {
        match key.code {
            KeyCode::Char('?') | KeyCode::Esc => app.toggle_help(),
            KeyCode::Char('q') => app.quit(),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),
            _ => {}
        }
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => {
            app.quit();
        }

        // Ctrl+C - quit
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.quit();
        }

        // Record / stop recording
        KeyCode::Char('r') => {
            app.record();
        }

        // Play
        KeyCode::Char('p') => {
            app.play();
        }

        // Stop playback
        KeyCode::Char('s') => {
            app.stop();
        }

        // ? - toggle help
        KeyCode::Char('?') => {
            app.toggle_help();
        }

        _ => {}
    }
}

//! Keyboard input handling for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::runtime::App;

/// Share step for `+` / `-`.
const COARSE_STEP: i16 = 5;

/// Maps a key event to an application action.
///
/// Guards on [`KeyEventKind::Press`] to avoid double-fire on some terminals.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit = true,
        KeyCode::Char(' ') => app.toggle_pause(),
        KeyCode::Char('+' | '=') => app.adjust_share(COARSE_STEP),
        KeyCode::Char('-') => app.adjust_share(-COARSE_STEP),
        KeyCode::Right | KeyCode::Up => app.adjust_share(1),
        KeyCode::Left | KeyCode::Down => app.adjust_share(-1),
        KeyCode::Char('e') => app.export_report(),
        KeyCode::Char('r') => app.tick(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(dir: &tempfile::TempDir) -> App {
        let mut cfg = AuditConfig::default();
        cfg.dashboard.store_path = dir.path().join("energy.csv");
        cfg.dashboard.report_path = dir.path().join("report.txt");
        App::new(&cfg)
    }

    #[test]
    fn share_keys_move_in_coarse_and_fine_steps() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let mut app = app(&dir);
        assert_eq!(app.share_percent(), 25);

        handle_key(&mut app, press(KeyCode::Char('+')));
        assert_eq!(app.share_percent(), 30);
        handle_key(&mut app, press(KeyCode::Left));
        assert_eq!(app.share_percent(), 29);
        handle_key(&mut app, press(KeyCode::Char('-')));
        assert_eq!(app.share_percent(), 24);
    }

    #[test]
    fn release_events_are_ignored() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let mut app = app(&dir);
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_key(&mut app, release);
        assert!(!app.quit);
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(app.quit);
    }

    #[test]
    fn space_toggles_pause() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let mut app = app(&dir);
        handle_key(&mut app, press(KeyCode::Char(' ')));
        assert!(app.paused);
    }
}

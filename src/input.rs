//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Adding a new keybinding is
//! a single match arm in [`handle_key_event`].
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action (if one doesn't exist).
//! 2. Add a `KeyCode` match arm in [`handle_key_event`] that calls it.
//! 3. Update the help text in `ui::draw_status_bar`.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Left | KeyCode::Down | KeyCode::Char('h') | KeyCode::Char('j') => {
            app.select_older()
        }
        KeyCode::Right | KeyCode::Up | KeyCode::Char('l') | KeyCode::Char('k') => {
            app.select_newer()
        }
        KeyCode::Home | KeyCode::Char('g') => app.select_newest(),
        KeyCode::End | KeyCode::Char('G') => app.select_oldest(),
        KeyCode::Char('r') => app.request_retry(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetcher::FetchEvent;
    use crate::source::make_item;
    use chrono::NaiveDate;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ready_app() -> App {
        let mut app = App::new(7);
        for d in [7, 6, 5] {
            let item = make_item(NaiveDate::from_ymd_opt(2025, 10, d).unwrap(), "x");
            let ev = if d == 7 {
                FetchEvent::Primary(item)
            } else {
                FetchEvent::History(item)
            };
            app.handle_fetch_event(ev);
        }
        app
    }

    #[test]
    fn q_and_esc_quit() {
        let mut app = App::new(7);
        handle_key_event(&mut app, press(KeyCode::Char('q')));
        assert!(app.quit);

        let mut app = App::new(7);
        handle_key_event(&mut app, press(KeyCode::Esc));
        assert!(app.quit);
    }

    #[test]
    fn arrows_move_through_history() {
        let mut app = ready_app();
        handle_key_event(&mut app, press(KeyCode::Left));
        handle_key_event(&mut app, press(KeyCode::Char('j')));
        assert_eq!(app.state.selected(), Some(2));

        handle_key_event(&mut app, press(KeyCode::Right));
        assert_eq!(app.state.selected(), Some(1));

        handle_key_event(&mut app, press(KeyCode::End));
        assert_eq!(app.state.selected(), Some(2));
        handle_key_event(&mut app, press(KeyCode::Char('g')));
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn release_events_are_ignored() {
        let mut app = App::new(7);
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_key_event(&mut app, release);
        assert!(!app.quit);
    }

    #[test]
    fn r_requests_retry_after_error() {
        let mut app = App::new(7);
        app.handle_fetch_event(FetchEvent::Failed(FetchError::RateLimited));
        handle_key_event(&mut app, press(KeyCode::Char('r')));
        assert!(app.restart_requested);
    }
}

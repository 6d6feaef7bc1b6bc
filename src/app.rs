use crate::fetcher::FetchEvent;
use crate::state::FetchState;

pub struct App {
    /// Loading / error / ready view of the current fetch sequence.
    pub state: FetchState,
    /// Configured window size, used when a retry resets the state.
    history_days: u32,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Set by the retry key; the main loop starts a fresh sequence.
    pub restart_requested: bool,
    /// Last progress message.
    pub status: String,
}

impl App {
    pub fn new(history_days: u32) -> Self {
        Self {
            state: FetchState::new(history_days),
            history_days,
            quit: false,
            restart_requested: false,
            status: "Starting…".into(),
        }
    }

    /// Apply one message from the fetch task and refresh the status line.
    pub fn handle_fetch_event(&mut self, event: FetchEvent) {
        match &event {
            FetchEvent::Attempt { attempt: 0 } => self.status = "Fetching…".into(),
            FetchEvent::Attempt { attempt } => {
                self.status = format!("Fetching (attempt {})…", attempt + 1);
            }
            FetchEvent::Retrying { delay, reason, .. } => {
                self.status = format!("{reason}; retrying in {:.0}s", delay.as_secs_f64());
            }
            FetchEvent::Primary(_) => self.status = "Loading history…".into(),
            FetchEvent::History(_) => {}
            FetchEvent::HistoryComplete { fetched, attempted } => {
                self.status = format!("History: {fetched}/{attempted} earlier days");
            }
            FetchEvent::Failed(_) => self.status = "Press r to retry".into(),
        }
        self.state.apply(event);
    }

    /// Ask for a fresh fetch.  Only honoured after a terminal error.
    pub fn request_retry(&mut self) {
        if self.state.error().is_some() {
            self.restart_requested = true;
        }
    }

    /// Called by the main loop once the new sequence has been started.
    pub fn reset_for_restart(&mut self) {
        self.state = FetchState::new(self.history_days);
        self.restart_requested = false;
        self.status = "Retrying…".into();
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_older(&mut self) {
        self.state.select_older();
    }

    pub fn select_newer(&mut self) {
        self.state.select_newer();
    }

    pub fn select_newest(&mut self) {
        self.state.select_newest();
    }

    pub fn select_oldest(&mut self) {
        self.state.select_oldest();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::source::make_item;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    fn ready_app() -> App {
        let mut app = App::new(7);
        app.handle_fetch_event(FetchEvent::Primary(make_item(day(7), "Today")));
        app.handle_fetch_event(FetchEvent::History(make_item(day(6), "Yesterday")));
        app.handle_fetch_event(FetchEvent::History(make_item(day(5), "Before")));
        app
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn new_app_starts_loading() {
        let app = App::new(7);
        assert!(app.state.is_loading());
        assert!(!app.quit);
        assert!(!app.restart_requested);
    }

    // -- fetch events --------------------------------------------------------

    #[test]
    fn retry_event_updates_status() {
        let mut app = App::new(7);
        app.handle_fetch_event(FetchEvent::Retrying {
            attempt: 1,
            delay: Duration::from_secs(4),
            reason: "HTTP 503".into(),
        });
        assert_eq!(app.status, "HTTP 503; retrying in 4s");
        assert!(app.state.is_loading());
    }

    #[test]
    fn later_attempts_are_numbered_from_one() {
        let mut app = App::new(7);
        app.handle_fetch_event(FetchEvent::Attempt { attempt: 2 });
        assert_eq!(app.status, "Fetching (attempt 3)…");
    }

    #[test]
    fn history_complete_reports_counts() {
        let mut app = ready_app();
        app.handle_fetch_event(FetchEvent::HistoryComplete {
            fetched: 2,
            attempted: 6,
        });
        assert_eq!(app.status, "History: 2/6 earlier days");
        assert!(app.state.window().unwrap().is_complete());
    }

    // -- retry ---------------------------------------------------------------

    #[test]
    fn retry_ignored_unless_failed() {
        let mut app = ready_app();
        app.request_retry();
        assert!(!app.restart_requested);
    }

    #[test]
    fn retry_after_failure_resets_state() {
        let mut app = App::new(7);
        app.handle_fetch_event(FetchEvent::Failed(FetchError::Exhausted { attempts: 6 }));
        app.request_retry();
        assert!(app.restart_requested);

        app.reset_for_restart();
        assert!(app.state.is_loading());
        assert!(!app.restart_requested);
    }

    // -- navigation ----------------------------------------------------------

    #[test]
    fn navigation_walks_window() {
        let mut app = ready_app();

        app.select_older();
        assert_eq!(app.state.selected_item().unwrap().title, "Yesterday");

        app.select_oldest();
        assert_eq!(app.state.selected_item().unwrap().title, "Before");

        app.select_older();
        assert_eq!(app.state.selected(), Some(2));

        app.select_newest();
        assert_eq!(app.state.selected(), Some(0));

        app.select_newer();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn navigation_while_loading_is_noop() {
        let mut app = App::new(7);
        app.select_older();
        app.select_oldest();
        assert!(app.state.selected().is_none());
    }
}

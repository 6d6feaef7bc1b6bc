//! What the UI sees of a fetch sequence.
//!
//! [`FetchState`] folds [`FetchEvent`]s into one of three states:
//!
//! ```text
//!            Primary               History* / HistoryComplete
//! Loading ───────────► Ready ◄──────────────────────────────┐
//!    │                   └──────────────────────────────────┘
//!    │ Failed
//!    ▼
//!  Error   (terminal; every later event is ignored)
//! ```
//!
//! Navigation only moves `selected` inside the window that already exists.
//! It never asks for more data.

use crate::error::FetchError;
use crate::fetcher::FetchEvent;
use crate::source::RemoteItem;

/// Primary entry plus whatever older entries were fetched, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryWindow {
    items: Vec<RemoteItem>,
    capacity: usize,
    complete: bool,
}

impl HistoryWindow {
    /// A window holding just the primary entry.
    pub fn new(primary: RemoteItem, capacity: usize) -> Self {
        Self {
            items: vec![primary],
            capacity: capacity.max(1),
            complete: false,
        }
    }

    /// Append an older entry.  Returns `false` (and drops the item) once the
    /// window is full or frozen.
    pub fn push(&mut self, item: RemoteItem) -> bool {
        if self.complete || self.items.len() >= self.capacity {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Freeze the window; later pushes are rejected.
    pub fn finish(&mut self) {
        self.complete = true;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    #[cfg(test)]
    pub fn primary(&self) -> &RemoteItem {
        &self.items[0]
    }

    #[cfg(test)]
    pub fn items(&self) -> &[RemoteItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&RemoteItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    fn last_index(&self) -> usize {
        self.items.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    /// No entry yet.  `capacity` is remembered for the window to come.
    Loading { capacity: usize },
    Error(FetchError),
    Ready {
        window: HistoryWindow,
        selected: usize,
    },
}

impl FetchState {
    pub fn new(history_days: u32) -> Self {
        Self::Loading {
            capacity: history_days as usize,
        }
    }

    /// Fold one event into the state.  Returns `true` if anything changed.
    pub fn apply(&mut self, event: FetchEvent) -> bool {
        match event {
            FetchEvent::Primary(item) => match self {
                Self::Loading { capacity } => {
                    let window = HistoryWindow::new(item, *capacity);
                    *self = Self::Ready {
                        window,
                        selected: 0,
                    };
                    true
                }
                _ => self.ignore("primary"),
            },
            FetchEvent::Failed(err) => match self {
                Self::Loading { .. } => {
                    *self = Self::Error(err);
                    true
                }
                _ => self.ignore("failed"),
            },
            FetchEvent::History(item) => match self {
                Self::Ready { window, .. } => window.push(item),
                _ => self.ignore("history"),
            },
            FetchEvent::HistoryComplete { .. } => match self {
                Self::Ready { window, .. } => {
                    let changed = !window.is_complete();
                    window.finish();
                    changed
                }
                _ => self.ignore("history-complete"),
            },
            // Progress only; the app shows these in the status bar.
            FetchEvent::Attempt { .. } | FetchEvent::Retrying { .. } => false,
        }
    }

    fn ignore(&self, event: &str) -> bool {
        tracing::debug!(event, state = self.label(), "ignoring event");
        false
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading { .. } => "loading",
            Self::Error(_) => "error",
            Self::Ready { .. } => "ready",
        }
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn window(&self) -> Option<&HistoryWindow> {
        match self {
            Self::Ready { window, .. } => Some(window),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn selected(&self) -> Option<usize> {
        match self {
            Self::Ready { selected, .. } => Some(*selected),
            _ => None,
        }
    }

    pub fn selected_item(&self) -> Option<&RemoteItem> {
        match self {
            Self::Ready { window, selected } => window.get(*selected),
            _ => None,
        }
    }

    /// 1-based position and window length, e.g. `(2, 7)` for "2/7".
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Self::Ready { window, selected } => Some((selected + 1, window.len())),
            _ => None,
        }
    }

    pub fn can_go_older(&self) -> bool {
        match self {
            Self::Ready { window, selected } => *selected < window.last_index(),
            _ => false,
        }
    }

    pub fn can_go_newer(&self) -> bool {
        matches!(self, Self::Ready { selected, .. } if *selected > 0)
    }

    // -- navigation ------------------------------------------------------------

    pub fn select_older(&mut self) {
        if let Self::Ready { window, selected } = self {
            *selected = (*selected + 1).min(window.last_index());
        }
    }

    pub fn select_newer(&mut self) {
        if let Self::Ready { selected, .. } = self {
            *selected = selected.saturating_sub(1);
        }
    }

    pub fn select_newest(&mut self) {
        if let Self::Ready { selected, .. } = self {
            *selected = 0;
        }
    }

    pub fn select_oldest(&mut self) {
        if let Self::Ready { window, selected } = self {
            *selected = window.last_index();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::make_item;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    fn ready_with(n: u32) -> FetchState {
        let mut state = FetchState::new(7);
        state.apply(FetchEvent::Primary(make_item(day(10), "primary")));
        for i in 1..n {
            state.apply(FetchEvent::History(make_item(day(10 - i), "older")));
        }
        state
    }

    // -- transitions -----------------------------------------------------------

    #[test]
    fn starts_loading_without_items() {
        let state = FetchState::new(7);
        assert!(state.is_loading());
        assert!(state.selected_item().is_none());
        assert!(state.window().is_none());
        assert!(state.position().is_none());
    }

    #[test]
    fn progress_events_keep_loading() {
        let mut state = FetchState::new(7);
        assert!(!state.apply(FetchEvent::Attempt { attempt: 0 }));
        assert!(!state.apply(FetchEvent::Retrying {
            attempt: 0,
            delay: Duration::from_secs(2),
            reason: "HTTP 503".into(),
        }));
        assert!(state.is_loading());
    }

    #[test]
    fn primary_makes_ready_at_index_zero() {
        let state = ready_with(1);
        assert_eq!(state.selected(), Some(0));
        assert_eq!(state.selected_item().unwrap().title, "primary");
        assert_eq!(state.position(), Some((1, 1)));
    }

    #[test]
    fn history_is_appended_behind_primary() {
        let mut state = ready_with(1);
        assert!(state.apply(FetchEvent::History(make_item(day(8), "b"))));
        assert!(state.apply(FetchEvent::History(make_item(day(6), "c"))));

        let window = state.window().unwrap();
        assert_eq!(window.primary().title, "primary");
        let dates: Vec<_> = window.items().iter().map(|i| i.date).collect();
        assert_eq!(dates, vec![day(10), day(8), day(6)]);
    }

    #[test]
    fn late_primary_never_replaces_position_zero() {
        let mut state = ready_with(2);
        assert!(!state.apply(FetchEvent::Primary(make_item(day(11), "impostor"))));
        assert_eq!(state.window().unwrap().primary().title, "primary");
    }

    #[test]
    fn window_never_exceeds_capacity() {
        let mut state = FetchState::new(2);
        state.apply(FetchEvent::Primary(make_item(day(10), "p")));
        assert!(state.apply(FetchEvent::History(make_item(day(9), "a"))));
        assert!(!state.apply(FetchEvent::History(make_item(day(8), "b"))));
        assert_eq!(state.window().unwrap().len(), 2);
    }

    #[test]
    fn completed_window_is_frozen() {
        let mut state = ready_with(2);
        assert!(state.apply(FetchEvent::HistoryComplete {
            fetched: 1,
            attempted: 6
        }));
        assert!(state.window().unwrap().is_complete());
        assert!(!state.apply(FetchEvent::History(make_item(day(1), "late"))));
        assert_eq!(state.window().unwrap().len(), 2);
    }

    #[test]
    fn failure_is_terminal() {
        let mut state = FetchState::new(7);
        assert!(state.apply(FetchEvent::Failed(FetchError::RateLimited)));
        assert!(state.error().unwrap().is_rate_limited());

        assert!(!state.apply(FetchEvent::Primary(make_item(day(10), "late"))));
        assert!(!state.apply(FetchEvent::Failed(FetchError::Exhausted { attempts: 6 })));
        assert_eq!(state.error(), Some(&FetchError::RateLimited));
        assert!(state.selected_item().is_none());
    }

    #[test]
    fn failure_after_ready_is_ignored() {
        let mut state = ready_with(1);
        assert!(!state.apply(FetchEvent::Failed(FetchError::RateLimited)));
        assert_eq!(state.label(), "ready");
    }

    // -- navigation ------------------------------------------------------------

    #[test]
    fn select_older_clamps_at_oldest() {
        let mut state = ready_with(3);
        let mut seen = vec![state.selected().unwrap()];
        for _ in 0..3 {
            state.select_older();
            seen.push(state.selected().unwrap());
        }
        assert_eq!(seen, vec![0, 1, 2, 2]);
    }

    #[test]
    fn select_newer_clamps_at_zero() {
        let mut state = ready_with(3);
        state.select_oldest();
        let mut seen = vec![state.selected().unwrap()];
        for _ in 0..3 {
            state.select_newer();
            seen.push(state.selected().unwrap());
        }
        assert_eq!(seen, vec![2, 1, 0, 0]);
    }

    #[test]
    fn navigation_never_changes_window_contents() {
        let mut state = ready_with(3);
        let before = state.window().unwrap().clone();
        for _ in 0..10 {
            state.select_older();
            state.select_newer();
            state.select_oldest();
            state.select_newest();
        }
        assert_eq!(state.window().unwrap(), &before);
    }

    #[test]
    fn navigation_is_noop_outside_ready() {
        let mut loading = FetchState::new(7);
        loading.select_older();
        loading.select_newer();
        assert!(loading.is_loading());
        assert!(!loading.can_go_older());
        assert!(!loading.can_go_newer());

        let mut failed = FetchState::Error(FetchError::Exhausted { attempts: 6 });
        failed.select_oldest();
        assert!(failed.selected().is_none());
    }

    #[test]
    fn single_item_window_cannot_move() {
        let mut state = ready_with(1);
        assert!(!state.can_go_older());
        assert!(!state.can_go_newer());
        state.select_older();
        assert_eq!(state.selected(), Some(0));
    }

    #[test]
    fn can_go_flags_follow_selection() {
        let mut state = ready_with(3);
        assert!(state.can_go_older());
        assert!(!state.can_go_newer());
        state.select_oldest();
        assert!(!state.can_go_older());
        assert!(state.can_go_newer());
        assert_eq!(state.position(), Some((3, 3)));
    }
}

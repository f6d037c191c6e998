//! Reducer-style state slices and the observable store that owns them.

use std::fmt::Debug;

use tokio::sync::watch;
use tracing::debug;

pub mod auth;
pub mod calendar;
pub mod ui;

pub use auth::{AuthAction, AuthState};
pub use calendar::{CalendarAction, CalendarState};
pub use ui::{UiAction, UiState};

/// A named state plus the pure transitions it accepts.
pub trait Slice: Clone + Default + PartialEq + Send + Sync + 'static {
    type Action: Debug + Send;

    const NAME: &'static str;

    fn reduce(&mut self, action: Self::Action);
}

/// Owns one slice and notifies subscribers whenever a dispatch changes it.
pub struct Store<S: Slice> {
    state: watch::Sender<S>,
}

impl<S: Slice> Store<S> {
    pub fn new() -> Self {
        Self::with_state(S::default())
    }

    pub fn with_state(state: S) -> Self {
        let (state, _) = watch::channel(state);
        Self { state }
    }

    /// Applies `action` and returns whether the state changed. Subscribers
    /// are only woken for changes.
    pub fn dispatch(&self, action: S::Action) -> bool {
        debug!(slice = S::NAME, ?action, "dispatch");
        self.state.send_if_modified(|state| {
            let before = state.clone();
            state.reduce(action);
            *state != before
        })
    }

    pub fn snapshot(&self) -> S {
        self.state.borrow().clone()
    }

    pub fn select<T>(&self, selector: impl FnOnce(&S) -> T) -> T {
        selector(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }
}

impl<S: Slice> Default for Store<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;

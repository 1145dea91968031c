// Query state store - single writer, synchronous listeners
use crate::domain::query::{Aggregator, QueryState, Scale};

/// What a mutation touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryChange {
    Filters,
    Scale,
    Aggregator,
    FreeText,
}

pub type QueryListener = Box<dyn FnMut(QueryChange, &QueryState) + Send>;

pub struct QueryStateStore {
    state: QueryState,
    listeners: Vec<QueryListener>,
}

impl QueryStateStore {
    pub fn new(state: QueryState) -> Self {
        Self {
            state,
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Register a listener, called after every mutation in registration order
    pub fn subscribe(&mut self, listener: QueryListener) {
        self.listeners.push(listener);
    }

    /// Append `value` unless already present.
    ///
    /// A value containing `location` sets the tracked location to the segment between
    /// the first and second `:`, but only while no location is tracked yet.
    pub fn add_filter(&mut self, value: &str) {
        if self.state.filters.iter().any(|f| f == value) {
            tracing::debug!("Ignoring duplicate filter {}", value);
            return;
        }

        self.state.filters.push(value.to_string());
        if value.contains("location") && self.state.location.is_empty() {
            self.state.location = value.split(':').nth(1).unwrap_or_default().to_string();
        }

        self.notify(QueryChange::Filters);
    }

    /// Remove the exact match. The tracked location is cleared when it is a substring
    /// of `value`, not when the keys match.
    pub fn remove_filter(&mut self, value: &str) {
        self.state.filters.retain(|f| f != value);
        if value.contains(self.state.location.as_str()) {
            self.state.location.clear();
        }
        self.notify(QueryChange::Filters);

        // The input box empties once the last chip is gone
        if self.state.filters.is_empty() && !self.state.free_text.is_empty() {
            self.state.free_text.clear();
            self.notify(QueryChange::FreeText);
        }
    }

    pub fn set_scale(&mut self, scale: Scale) {
        if self.state.scale != scale {
            self.state.scale = scale;
            self.notify(QueryChange::Scale);
        }
    }

    pub fn set_aggregator(&mut self, aggregator: Aggregator) {
        if self.state.aggregator != aggregator {
            self.state.aggregator = aggregator;
            self.notify(QueryChange::Aggregator);
        }
    }

    pub fn set_free_text(&mut self, text: &str) {
        if self.state.free_text != text {
            self.state.free_text = text.to_string();
            self.notify(QueryChange::FreeText);
        }
    }

    fn notify(&mut self, change: QueryChange) {
        for listener in &mut self.listeners {
            listener(change, &self.state);
        }
    }
}

impl Default for QueryStateStore {
    fn default() -> Self {
        Self::new(QueryState::default())
    }
}

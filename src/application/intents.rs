// UI intents and where they come from
use crate::domain::query::{Aggregator, Scale};
use async_trait::async_trait;

/// Everything the presentation layer can ask the dashboard to do
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    OpenDropdown(bool),
    AddFilter(String),
    RemoveFilter(String),
    /// Pick a dropdown entry: add it, put it in the input box, close the dropdown
    SelectSuggestion(String),
    SetScale(Scale),
    SetAggregator(Aggregator),
    SetFreeText(String),
}

#[async_trait]
pub trait IntentSource: Send {
    /// Next intent, or `None` when the user is done
    async fn next_intent(&mut self) -> Option<Intent>;
}

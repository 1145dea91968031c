// Filter feed binder - free text in, suggestions out
use crate::application::query_store::{QueryChange, QueryStateStore};
use crate::domain::chart::FeedError;
use crate::domain::feed::ConnectionState;
use crate::domain::query::QueryState;
use crate::infrastructure::connection::ConnectionHandle;
use serde_json::Value;

pub struct FilterFeedBinder {
    connection: ConnectionHandle,
    /// `None` until the first suggestion list arrives
    suggestions: Option<Vec<String>>,
}

impl FilterFeedBinder {
    pub fn attach(store: &mut QueryStateStore, connection: ConnectionHandle) -> Self {
        let outbound = connection.clone();
        store.subscribe(Box::new(move |change: QueryChange, state: &QueryState| {
            if change == QueryChange::FreeText {
                outbound.send(&state.filter_query());
            }
        }));

        Self {
            connection,
            suggestions: None,
        }
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    pub fn on_dropdown_opened(&self, query: &QueryState) {
        self.connection.send(&query.filter_query());
    }

    pub fn on_connection_state(&self, connection_state: ConnectionState, query: &QueryState) {
        if connection_state == ConnectionState::Open {
            self.connection.send(&query.filter_query());
        }
    }

    pub fn on_message(&mut self, payload: &Value) -> Result<(), FeedError> {
        let suggestions: Vec<String> = serde_json::from_value(payload.clone())?;
        self.suggestions = Some(suggestions);
        Ok(())
    }

    /// Suggestions to draw. `None` suppresses the dropdown container entirely, which
    /// happens while it is closed or before any list has arrived; an empty list that
    /// did arrive still yields an (empty) container.
    pub fn visible_suggestions(&self, dropdown_open: bool) -> Option<&[String]> {
        if !dropdown_open {
            return None;
        }
        self.suggestions.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn bound(
        state: ConnectionState,
    ) -> (QueryStateStore, FilterFeedBinder, mpsc::UnboundedReceiver<Value>) {
        let (handle, _state, outbound) =
            ConnectionHandle::detached("ws://localhost:8080/getFilters", state);
        let mut store = QueryStateStore::default();
        let binder = FilterFeedBinder::attach(&mut store, handle);
        (store, binder, outbound)
    }

    #[test]
    fn test_free_text_change_sends_query() {
        let (mut store, _binder, mut outbound) = bound(ConnectionState::Open);
        store.set_free_text("gen");
        assert_eq!(outbound.try_recv().unwrap(), json!({ "query": "gen" }));
    }

    #[test]
    fn test_filter_changes_do_not_send() {
        let (mut store, _binder, mut outbound) = bound(ConnectionState::Open);
        store.add_filter("gender:F");
        store.set_scale(crate::domain::query::Scale::Daily);
        assert!(outbound.try_recv().is_err());
    }

    #[test]
    fn test_opening_dropdown_sends_current_text() {
        let (mut store, binder, mut outbound) = bound(ConnectionState::Open);
        store.set_free_text("loc");
        let _ = outbound.try_recv();

        binder.on_dropdown_opened(store.state());
        assert_eq!(outbound.try_recv().unwrap(), json!({ "query": "loc" }));
    }

    #[test]
    fn test_visibility_rules() {
        let (_store, mut binder, _outbound) = bound(ConnectionState::Open);

        // never received
        assert_eq!(binder.visible_suggestions(true), None);
        assert_eq!(binder.visible_suggestions(false), None);

        // received but empty
        binder.on_message(&json!([])).unwrap();
        assert_eq!(binder.visible_suggestions(true), Some(&[][..]));
        assert_eq!(binder.visible_suggestions(false), None);

        binder.on_message(&json!(["gender:F", "gender:M"])).unwrap();
        assert_eq!(
            binder.visible_suggestions(true),
            Some(&["gender:F".to_string(), "gender:M".to_string()][..])
        );
    }

    #[test]
    fn test_list_replaced_wholesale() {
        let (_store, mut binder, _outbound) = bound(ConnectionState::Open);
        binder.on_message(&json!(["a", "b", "c"])).unwrap();
        binder.on_message(&json!(["d"])).unwrap();
        assert_eq!(binder.visible_suggestions(true), Some(&["d".to_string()][..]));
    }

    #[test]
    fn test_bad_payload_keeps_previous_list() {
        let (_store, mut binder, _outbound) = bound(ConnectionState::Open);
        binder.on_message(&json!(["a"])).unwrap();
        assert!(binder.on_message(&json!([1, 2])).is_err());
        assert_eq!(binder.visible_suggestions(true), Some(&["a".to_string()][..]));
    }
}

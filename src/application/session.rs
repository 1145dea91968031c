// Dashboard session - owns the query state and both binders, processes one event at a time
use crate::application::data_feed::DataFeedBinder;
use crate::application::filter_feed::FilterFeedBinder;
use crate::application::intents::{Intent, IntentSource};
use crate::application::query_store::QueryStateStore;
use crate::domain::dashboard::DashboardView;
use crate::domain::feed::{ConnectionState, FeedEvent};
use crate::domain::query::QueryState;
use crate::infrastructure::connection::ConnectionHandle;
use tokio::sync::{mpsc, watch};

pub struct DashboardSession {
    store: QueryStateStore,
    data_feed: DataFeedBinder,
    filter_feed: FilterFeedBinder,
    dropdown_open: bool,
    data_connection: ConnectionState,
    filter_connection: ConnectionState,
    view_tx: watch::Sender<DashboardView>,
}

impl DashboardSession {
    /// Wire both feeds to a fresh query state. The returned receiver observes every
    /// view change.
    pub fn new(
        data_connection: ConnectionHandle,
        filter_connection: ConnectionHandle,
    ) -> (Self, watch::Receiver<DashboardView>) {
        let mut store = QueryStateStore::new(QueryState::default());
        let data_state = data_connection.state();
        let filter_state = filter_connection.state();
        let data_feed = DataFeedBinder::attach(&mut store, data_connection);
        let filter_feed = FilterFeedBinder::attach(&mut store, filter_connection);
        let (view_tx, view_rx) = watch::channel(DashboardView::default());

        let session = Self {
            store,
            data_feed,
            filter_feed,
            dropdown_open: false,
            data_connection: data_state,
            filter_connection: filter_state,
            view_tx,
        };
        session.publish();

        (session, view_rx)
    }

    pub fn apply(&mut self, intent: Intent) {
        tracing::debug!("Applying intent {:?}", intent);
        match intent {
            Intent::OpenDropdown(open) => self.set_dropdown(open),
            Intent::AddFilter(value) => self.store.add_filter(&value),
            Intent::RemoveFilter(value) => self.store.remove_filter(&value),
            Intent::SelectSuggestion(value) => {
                self.store.add_filter(&value);
                self.store.set_free_text(&value);
                self.set_dropdown(false);
            }
            Intent::SetScale(scale) => self.store.set_scale(scale),
            Intent::SetAggregator(aggregator) => self.store.set_aggregator(aggregator),
            Intent::SetFreeText(text) => self.store.set_free_text(&text),
        }
        self.publish();
    }

    pub fn on_data_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::StateChanged(state) => {
                let connection = self.data_feed.connection();
                tracing::debug!("Data feed {} is now {:?}", connection.url(), state);
                if state == ConnectionState::Closed && connection.last_message().is_some() {
                    tracing::info!(
                        "Data feed lost, chart shows the last received data until it reconnects"
                    );
                }
                self.data_connection = state;
                self.data_feed.on_connection_state(state, self.store.state());
            }
            FeedEvent::Message(payload) => {
                if let Err(e) = self.data_feed.on_message(&payload, self.store.state().scale) {
                    tracing::warn!("Ignoring data feed message: {}", e);
                }
            }
        }
        self.publish();
    }

    pub fn on_filter_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::StateChanged(state) => {
                let url = self.filter_feed.connection().url();
                tracing::debug!("Filter feed {} is now {:?}", url, state);
                self.filter_connection = state;
                self.filter_feed.on_connection_state(state, self.store.state());
            }
            FeedEvent::Message(payload) => {
                if let Err(e) = self.filter_feed.on_message(&payload) {
                    tracing::warn!("Ignoring filter feed message: {}", e);
                }
            }
        }
        self.publish();
    }

    pub fn view(&self) -> DashboardView {
        let state = self.store.state();
        DashboardView {
            caption: DashboardView::caption_for(&state.location),
            data_points: self.data_feed.points().to_vec(),
            suggestions: self
                .filter_feed
                .visible_suggestions(self.dropdown_open)
                .map(|s| s.to_vec()),
            is_dropdown_open: self.dropdown_open,
            active_filters: state.filters.clone(),
            active_location: state.location.clone(),
            scale: state.scale,
            aggregator: state.aggregator,
            free_text: state.free_text.clone(),
            data_connection: self.data_connection,
            filter_connection: self.filter_connection,
        }
    }

    /// Process feed events and intents until the intent source is exhausted
    pub async fn run<S: IntentSource>(
        mut self,
        mut data_events: mpsc::Receiver<FeedEvent>,
        mut filter_events: mpsc::Receiver<FeedEvent>,
        mut intents: S,
    ) {
        loop {
            tokio::select! {
                Some(event) = data_events.recv() => self.on_data_event(event),
                Some(event) = filter_events.recv() => self.on_filter_event(event),
                intent = intents.next_intent() => match intent {
                    Some(intent) => self.apply(intent),
                    None => {
                        tracing::info!("Intent source closed, stopping dashboard session");
                        break;
                    }
                },
            }
        }
    }

    fn set_dropdown(&mut self, open: bool) {
        let opened = open && !self.dropdown_open;
        self.dropdown_open = open;
        if opened {
            self.filter_feed.on_dropdown_opened(self.store.state());
        }
    }

    fn publish(&self) {
        let view = self.view();
        self.view_tx.send_if_modified(|current| {
            if *current != view {
                *current = view;
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::domain::chart::ScaleLabel;
    use crate::domain::query::{Aggregator, Scale};
    use serde_json::{json, Value};

    struct ChannelIntentSource {
        rx: mpsc::Receiver<Intent>,
    }

    #[async_trait]
    impl IntentSource for ChannelIntentSource {
        async fn next_intent(&mut self) -> Option<Intent> {
            self.rx.recv().await
        }
    }

    struct Harness {
        session: DashboardSession,
        view: watch::Receiver<DashboardView>,
        data_state: watch::Sender<ConnectionState>,
        filter_state: watch::Sender<ConnectionState>,
        data_out: mpsc::UnboundedReceiver<Value>,
        filter_out: mpsc::UnboundedReceiver<Value>,
    }

    fn harness(state: ConnectionState) -> Harness {
        let (data, data_state, data_out) =
            ConnectionHandle::detached("ws://localhost:8080/getData", state);
        let (filters, filter_state, filter_out) =
            ConnectionHandle::detached("ws://localhost:8080/getFilters", state);
        let (session, view) = DashboardSession::new(data, filters);
        Harness {
            session,
            view,
            data_state,
            filter_state,
            data_out,
            filter_out,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Value>) -> Vec<Value> {
        let mut sent = Vec::new();
        while let Ok(v) = rx.try_recv() {
            sent.push(v);
        }
        sent
    }

    #[test]
    fn test_initial_view() {
        let h = harness(ConnectionState::Closed);
        let view = h.view.borrow().clone();
        assert_eq!(view, DashboardView::default());
        assert_eq!(view.scale, Scale::Monthly);
        assert_eq!(view.aggregator, Aggregator::Sum);
    }

    #[test]
    fn test_location_caption_follows_filters() {
        let mut h = harness(ConnectionState::Open);
        h.session.apply(Intent::AddFilter("location:Paris".into()));
        assert_eq!(h.view.borrow().caption, "Sales Data for Paris");
        assert_eq!(h.view.borrow().active_location, "Paris");

        h.session.apply(Intent::RemoveFilter("location:Paris".into()));
        assert_eq!(h.view.borrow().caption, "Sales Data");
    }

    #[test]
    fn test_select_suggestion() {
        let mut h = harness(ConnectionState::Open);
        h.session.apply(Intent::OpenDropdown(true));
        h.session.on_filter_event(FeedEvent::Message(json!(["gender:F", "gender:M"])));
        assert_eq!(
            h.view.borrow().suggestions,
            Some(vec!["gender:F".to_string(), "gender:M".to_string()])
        );
        drain(&mut h.data_out);
        drain(&mut h.filter_out);

        h.session.apply(Intent::SelectSuggestion("gender:F".into()));

        let view = h.view.borrow().clone();
        assert_eq!(view.active_filters, vec!["gender:F"]);
        assert_eq!(view.free_text, "gender:F");
        assert!(!view.is_dropdown_open);
        assert_eq!(view.suggestions, None);

        assert_eq!(
            drain(&mut h.data_out),
            vec![json!({ "filters": ["gender:F"], "scale": "Monthly", "aggregator": "Sum" })]
        );
        assert_eq!(drain(&mut h.filter_out), vec![json!({ "query": "gender:F" })]);
    }

    #[test]
    fn test_dropdown_sends_only_when_becoming_visible() {
        let mut h = harness(ConnectionState::Open);
        h.session.apply(Intent::OpenDropdown(true));
        h.session.apply(Intent::OpenDropdown(true));
        h.session.apply(Intent::OpenDropdown(false));
        assert_eq!(drain(&mut h.filter_out), vec![json!({ "query": "" })]);
    }

    #[test]
    fn test_suggestions_hidden_until_received() {
        let mut h = harness(ConnectionState::Open);
        h.session.apply(Intent::OpenDropdown(true));
        assert_eq!(h.view.borrow().suggestions, None);

        h.session.on_filter_event(FeedEvent::Message(json!([])));
        assert_eq!(h.view.borrow().suggestions, Some(Vec::new()));
    }

    #[test]
    fn test_reopen_resends_current_query() {
        let mut h = harness(ConnectionState::Closed);
        h.session.apply(Intent::AddFilter("gender:F".into()));
        h.session.apply(Intent::SetScale(Scale::Daily));
        h.session.apply(Intent::SetFreeText("loc".into()));
        assert!(drain(&mut h.data_out).is_empty());
        assert!(drain(&mut h.filter_out).is_empty());

        h.data_state.send_replace(ConnectionState::Open);
        h.session.on_data_event(FeedEvent::StateChanged(ConnectionState::Open));
        h.filter_state.send_replace(ConnectionState::Open);
        h.session.on_filter_event(FeedEvent::StateChanged(ConnectionState::Open));

        assert_eq!(
            drain(&mut h.data_out),
            vec![json!({ "filters": ["gender:F"], "scale": "Daily", "aggregator": "Sum" })]
        );
        assert_eq!(drain(&mut h.filter_out), vec![json!({ "query": "loc" })]);
        assert_eq!(h.view.borrow().data_connection, ConnectionState::Open);
        assert_eq!(h.view.borrow().filter_connection, ConnectionState::Open);
    }

    #[test]
    fn test_bad_data_message_keeps_chart() {
        let mut h = harness(ConnectionState::Open);
        h.session.on_data_event(FeedEvent::Message(json!([
            { "timestamp": "2024-03-15T12:00:00Z", "value": 3.5 }
        ])));
        h.session.on_data_event(FeedEvent::Message(json!("oops")));

        let view = h.view.borrow().clone();
        assert_eq!(view.data_points.len(), 1);
        assert_eq!(view.data_points[0].scale, ScaleLabel::Month(3));
        assert_eq!(view.data_points[0].value, 3.5);
    }

    #[tokio::test]
    async fn test_run_until_intents_close() {
        let h = harness(ConnectionState::Open);
        let Harness {
            session,
            mut view,
            mut data_out,
            ..
        } = h;

        let (data_tx, data_rx) = mpsc::channel(8);
        let (_filter_tx, filter_rx) = mpsc::channel(8);
        let (intent_tx, intent_rx) = mpsc::channel(8);

        intent_tx.send(Intent::SetAggregator(Aggregator::Avg)).await.unwrap();
        data_tx
            .send(FeedEvent::Message(json!([{ "timestamp": "2024-05-20T12:00:00Z", "value": 1 }])))
            .await
            .unwrap();

        let intents = ChannelIntentSource { rx: intent_rx };
        let task = tokio::spawn(session.run(data_rx, filter_rx, intents));

        // wait for both events to land
        loop {
            {
                let current = view.borrow_and_update();
                if current.aggregator == Aggregator::Avg && current.data_points.len() == 1 {
                    break;
                }
            }
            view.changed().await.unwrap();
        }

        drop(intent_tx);
        task.await.unwrap();

        assert_eq!(
            drain(&mut data_out),
            vec![json!({ "filters": [], "scale": "Monthly", "aggregator": "Avg" })]
        );
    }
}

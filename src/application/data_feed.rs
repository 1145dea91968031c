// Data feed binder - query state in, chart points out
use crate::application::query_store::{QueryChange, QueryStateStore};
use crate::domain::chart::{to_local_data_points, DataPoint, FeedError};
use crate::domain::feed::ConnectionState;
use crate::domain::query::{QueryState, Scale};
use crate::infrastructure::connection::ConnectionHandle;
use serde_json::Value;

pub struct DataFeedBinder {
    connection: ConnectionHandle,
    points: Vec<DataPoint>,
}

impl DataFeedBinder {
    /// Bind the data connection to `store`: every filter, scale or aggregator change
    /// sends a fresh query.
    pub fn attach(store: &mut QueryStateStore, connection: ConnectionHandle) -> Self {
        let outbound = connection.clone();
        store.subscribe(Box::new(move |change: QueryChange, state: &QueryState| {
            if change != QueryChange::FreeText {
                outbound.send(&state.data_query());
            }
        }));

        Self {
            connection,
            points: Vec::new(),
        }
    }

    /// Re-send the current query once the feed (re)opens
    pub fn on_connection_state(&self, connection_state: ConnectionState, query: &QueryState) {
        if connection_state == ConnectionState::Open {
            self.connection.send(&query.data_query());
        }
    }

    /// Replace all points with the ones carried by `payload`.
    ///
    /// Labels use the scale active now, not the one the query was sent with; late
    /// responses are applied as current. On error the previous points stay.
    pub fn on_message(&mut self, payload: &Value, scale: Scale) -> Result<(), FeedError> {
        self.points = to_local_data_points(payload, scale)?;
        Ok(())
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }
}

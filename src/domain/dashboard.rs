// Dashboard view model - everything the presentation layer draws
use super::chart::DataPoint;
use super::feed::ConnectionState;
use super::query::{Aggregator, Scale};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub caption: String,
    pub data_points: Vec<DataPoint>,
    /// `None` means the dropdown container is not drawn at all
    pub suggestions: Option<Vec<String>>,
    pub is_dropdown_open: bool,
    pub active_filters: Vec<String>,
    pub active_location: String,
    pub scale: Scale,
    pub aggregator: Aggregator,
    pub free_text: String,
    pub data_connection: ConnectionState,
    pub filter_connection: ConnectionState,
}

impl DashboardView {
    pub fn caption_for(location: &str) -> String {
        if location.is_empty() {
            "Sales Data".to_string()
        } else {
            format!("Sales Data for {}", location)
        }
    }
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            caption: Self::caption_for(""),
            data_points: Vec::new(),
            suggestions: None,
            is_dropdown_open: false,
            active_filters: Vec::new(),
            active_location: String::new(),
            scale: Scale::default(),
            aggregator: Aggregator::default(),
            free_text: String::new(),
            data_connection: ConnectionState::Closed,
            filter_connection: ConnectionState::Closed,
        }
    }
}

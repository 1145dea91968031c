// Query domain models - what the dashboard asks the feeds for
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Time granularity of the sales chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Scale {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

/// Value aggregation requested from the server. Never applied client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Aggregator {
    #[default]
    Sum,
    Avg,
    Count,
}

impl Scale {
    pub const ALL: [Scale; 3] = [Scale::Daily, Scale::Weekly, Scale::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Daily => "Daily",
            Scale::Weekly => "Weekly",
            Scale::Monthly => "Monthly",
        }
    }
}

impl Aggregator {
    pub const ALL: [Aggregator; 3] = [Aggregator::Sum, Aggregator::Avg, Aggregator::Count];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregator::Sum => "Sum",
            Aggregator::Avg => "Avg",
            Aggregator::Count => "Count",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scale::ALL
            .into_iter()
            .find(|scale| scale.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown scale '{}'", s))
    }
}

impl FromStr for Aggregator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aggregator::ALL
            .into_iter()
            .find(|agg| agg.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown aggregator '{}'", s))
    }
}

/// The single source of truth for both feeds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    /// Insertion-ordered, no duplicates by raw string equality
    pub filters: Vec<String>,
    pub scale: Scale,
    pub aggregator: Aggregator,
    pub free_text: String,
    /// Value part of the tracked `location` filter, empty when none
    pub location: String,
}

impl QueryState {
    pub fn data_query(&self) -> DataQuery {
        DataQuery {
            filters: self.filters.clone(),
            scale: self.scale,
            aggregator: self.aggregator,
        }
    }

    pub fn filter_query(&self) -> FilterQuery {
        FilterQuery {
            query: self.free_text.clone(),
        }
    }
}

/// Outbound message on the data feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQuery {
    pub filters: Vec<String>,
    pub scale: Scale,
    pub aggregator: Aggregator,
}

/// Outbound message on the filter-suggestion feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterQuery {
    pub query: String,
}

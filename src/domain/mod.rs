// Domain layer - Queries, chart points and the view model
pub mod chart;
pub mod dashboard;
pub mod feed;
pub mod query;

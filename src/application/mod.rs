// Application layer - Query state, feed binders and the session that drives them
pub mod data_feed;
pub mod filter_feed;
pub mod intents;
pub mod query_store;
pub mod session;

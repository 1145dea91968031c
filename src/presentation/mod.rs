// Presentation layer - Terminal stand-in for the dashboard UI
pub mod commands;
pub mod terminal;

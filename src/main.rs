// Main entry point - Dependency wiring and the dashboard session
mod application;
mod domain;
mod infrastructure;
mod presentation;

use tracing_subscriber::EnvFilter;

use crate::application::session::DashboardSession;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::connection::ConnectionManager;
use crate::presentation::commands::HELP;
use crate::presentation::terminal::{render, TerminalIntentSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with rendered views
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_dashboard_config()?;

    // One connection manager per feed
    let (data_connection, data_events) = ConnectionManager::spawn(config.data_settings());
    let (filter_connection, filter_events) = ConnectionManager::spawn(config.filter_settings());

    let (session, mut views) = DashboardSession::new(data_connection, filter_connection);

    let format = config.presentation.format;
    tokio::spawn(async move {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            match render(&view, format) {
                Ok(rendered) => println!("{}", rendered),
                Err(e) => tracing::warn!("Failed to render view: {}", e),
            }
        }
    });

    println!(
        "Sales dashboard following {} and {}",
        config.feeds.data_url, config.feeds.filters_url
    );
    println!("{}", HELP);

    session
        .run(data_events, filter_events, TerminalIntentSource::stdin())
        .await;

    Ok(())
}

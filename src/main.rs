mod app;
mod config;
mod domain;
mod flow;
mod services;
mod session;
#[cfg(test)]
mod testing;

use crate::app::App;
use crate::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load();
    tracing::info!("Using study API at {}", config.api_base);

    let mut app = App::new(&config);
    app.run().await
}

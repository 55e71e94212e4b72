//! questline-server: the Questline HTTP API daemon.
use questline_server::config::ServerConfig;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter};

fn env_filter(log_level: &str) -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive(format!("questline={log_level}").parse()?)
        .add_directive("tower_http=info".parse()?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // default level until the config is read
    let (filter, filter_handle) = reload::Layer::new(env_filter("info")?);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {:#}", e);
            return Err(e);
        }
    };
    filter_handle.reload(env_filter(&config.advanced.log_level)?)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Questline server starting");
    questline_server::run(config).await
}

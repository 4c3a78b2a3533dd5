// src/main.rs
use shipment_packer::api;
use shipment_packer::config::{AppConfig, LoggingConfig};
use shipment_packer::logging;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    logging::init(&LoggingConfig::from_env());

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let AppConfig {
        api: api_config,
        packer: packer_config,
    } = AppConfig::from_env();

    info!("🚀 Shipment packing service starting...");
    if let Err(err) = api::start_api_server(api_config, packer_config).await {
        error!("❌ API server stopped: {}", err);
        std::process::exit(1);
    }
}

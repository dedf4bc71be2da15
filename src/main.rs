use std::sync::Arc;

use tracing::{error, info};

use fileupload::{Config, LocalFileService, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    fileupload::logging::init_with_fallback(&config.logging);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("File upload service");
    info!("Storage root: {}", config.storage.root);

    let service = match LocalFileService::from_config(&config.storage) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("Failed to initialize file service: {}", e);
            std::process::exit(1);
        }
    };

    let server = match WebServer::new(&config.web, &config.storage, service) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to configure web server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        std::process::exit(1);
    }
}

mod admission;
mod config;
mod error;
mod prompt;
mod retry;
mod throttle;
mod upstream;
mod web;

use std::sync::Arc;

use actix_web::{web::Data, App, HttpServer};
use dotenv::dotenv;
use log::{error, info, warn};

use admission::{AdmissionCap, ADMISSION_MAX_REQUESTS, ADMISSION_WINDOW};
use config::GatewayConfig;
use throttle::Throttle;
use upstream::{ChatBackend, UpstreamClient};
use web::routes;

// App state structure
pub struct AppState {
    pub backend: Option<Arc<dyn ChatBackend>>,
    pub throttle: Throttle,
    pub admission: AdmissionCap,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = GatewayConfig::from_env();
    info!("Starting trainer gateway");

    let backend: Option<Arc<dyn ChatBackend>> = match &config.api_key {
        Some(api_key) => {
            match UpstreamClient::new(&config.upstream_url, &config.upstream_model, api_key) {
                Ok(client) => {
                    info!("Upstream client ready for {}", config.upstream_url);
                    Some(Arc::new(client))
                }
                Err(e) => {
                    error!("Failed to initialize upstream client: {}", e);
                    std::process::exit(1);
                }
            }
        }
        None => {
            warn!("UPSTREAM_API_KEY is not set; chat requests will be refused");
            None
        }
    };

    let app_state = Data::new(AppState {
        backend,
        throttle: Throttle::new(config.min_call_interval),
        admission: AdmissionCap::new(ADMISSION_MAX_REQUESTS, ADMISSION_WINDOW),
    });

    info!("Listening on {}:{}", config.host, config.port);
    let bind_addr = (config.host.clone(), config.port);

    // Start web server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}

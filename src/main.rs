// src/main.rs
//! Loadmaster: freighter cargo load planning service.
//!
//! Plans B747-400F loads from booking requests: consolidates cargo into
//! ULDs and assigns aircraft positions while honoring
//! - door-fit and dangerous-goods segregation rules
//! - floor pressure, linear load and cumulative zone limits
//! - pairwise position interlocks between adjacent berths

mod aircraft;
mod allocator;
mod api;
mod config;
mod gatekeeper;
mod model;
mod packer;
mod planner;
mod revenue;
mod sales;
mod segregation;
mod shoring;
mod solver;
mod structural;
mod uld;

use config::AppConfig;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();

    println!("🚀 Load planning service starting...");
    api::start_api_server(app_config.api, app_config.planner).await;
}

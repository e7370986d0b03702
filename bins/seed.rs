//! One-shot fixture loader: flushes the configured backend and inserts the
//! development carts. Refuses to run without `--yes`.

use std::time::Duration;

use dotenvy::dotenv;
use service::cart::CartStore;
use tracing::{error, info};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenv().ok();

    let confirmed = std::env::args().skip(1).any(|a| a == "--yes");
    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(service = "cart-seed", event = "config_invalid", error = %e, "cannot load configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    common::utils::logging::init_logging(&cfg.log.format);

    if !confirmed {
        error!(
            service = "cart-seed",
            event = "not_confirmed",
            backend = ?cfg.backend.kind,
            "seeding wipes every stored cart; re-run with --yes to proceed"
        );
        return std::process::ExitCode::FAILURE;
    }

    let backend = match service::backend::connect(&cfg.backend).await {
        Ok(b) => b,
        Err(e) => {
            error!(service = "cart-seed", event = "backend_unavailable", error = %e, "cannot connect to backend");
            return std::process::ExitCode::FAILURE;
        }
    };
    let carts = CartStore::new(backend, Duration::from_millis(cfg.backend.lock_timeout_ms));
    match carts.reset_with_seed_data().await {
        Ok(()) => {
            info!(service = "cart-seed", event = "done", "seed carts loaded");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "cart-seed", event = "failed", error = %e, "seeding failed");
            std::process::ExitCode::FAILURE
        }
    }
}

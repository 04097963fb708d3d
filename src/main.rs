use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use class_placement::config::Config;
use class_placement::server::start_api;
use class_placement::{PlacementService, TrainingStore};

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("class_placement=info,actix_web=warn,warn")
        }
    });
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let settings = config.classifier_settings()?;

    // The table is reloaded per request; this only reports its state at startup.
    match TrainingStore::load(&config.training_data) {
        Ok(store) => info!(
            path = %config.training_data.display(),
            records = store.len(),
            "training data available"
        ),
        Err(e) => warn!("{}", e),
    }

    let mut service = PlacementService::new(&config.training_data, settings, config.locale);
    if config.no_cache {
        service = service.without_cache();
    }

    info!(
        bind = %config.bind,
        seed = settings.seed,
        n_runs = settings.n_runs,
        cache = !config.no_cache,
        "starting class placement API"
    );
    start_api(service, config.bind)
        .await
        .with_context(|| format!("server on {} failed", config.bind))?;

    Ok(())
}

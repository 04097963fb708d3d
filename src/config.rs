use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;

use crate::classifier::{ClassifierSettings, MIN_RUNS};
use crate::model::Locale;

#[derive(Parser, Debug, Clone)]
#[command(name = "class_placement")]
#[command(about = "Class placement service: looks up or predicts a student's performance category")]
#[command(version)]
pub struct Config {
    /// Labeled training table (CSV)
    #[arg(long, env = "PLACEMENT_TRAINING_DATA", default_value = "data/data_latih.csv")]
    pub training_data: PathBuf,

    /// Server bind address
    #[arg(long, env = "PLACEMENT_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Language for category, class and document labels
    #[arg(long, env = "PLACEMENT_LOCALE", value_enum, default_value_t = Locale::En)]
    pub locale: Locale,

    /// Seed for k-means initialisation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Independent k-means initialisations (at least 10)
    #[arg(long, default_value_t = MIN_RUNS)]
    pub n_runs: usize,

    #[arg(long, default_value_t = 300)]
    pub max_iterations: u64,

    #[arg(long, default_value_t = 1e-4)]
    pub tolerance: f64,

    /// Refit the model on every request instead of caching it
    #[arg(long)]
    pub no_cache: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn classifier_settings(&self) -> Result<ClassifierSettings> {
        ensure!(
            self.n_runs >= MIN_RUNS,
            "--n-runs must be at least {}, got {}",
            MIN_RUNS,
            self.n_runs
        );
        ensure!(self.max_iterations > 0, "--max-iterations must be positive");
        ensure!(
            self.tolerance.is_finite() && self.tolerance > 0.0,
            "--tolerance must be a positive number, got {}",
            self.tolerance
        );
        Ok(ClassifierSettings {
            seed: self.seed,
            n_runs: self.n_runs,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        })
    }
}

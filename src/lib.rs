//! Class placement: assigns a student to a performance category and class
//! section from four report-card scores.
//!
//! Known students are looked up in the labeled training table by name.
//! Unknown students are placed by a seeded three-cluster k-means model fitted
//! on that table, with clusters ranked Low/Medium/High by mean score.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod model;
pub mod scaler;
pub mod server;
pub mod service;

pub use classifier::{classify, order_clusters, ClassifierSettings, FittedClassifier};
pub use data::{TrainingRecord, TrainingStore};
pub use error::{PlacementError, Result};
pub use model::{Category, ClassLabel, ClassificationResult, Locale, Provenance, Query, Scores};
pub use service::PlacementService;

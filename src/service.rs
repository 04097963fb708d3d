//! Request boundary: one query in, one result or one error out.

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::cache::ModelCache;
use crate::classifier::{ClassifierSettings, FittedClassifier};
use crate::data::TrainingStore;
use crate::error::Result;
use crate::model::{ClassificationResult, Locale, Provenance, Query};

pub struct PlacementService {
    training_data: PathBuf,
    settings: ClassifierSettings,
    locale: Locale,
    cache: Option<ModelCache>,
}

impl PlacementService {
    pub fn new(training_data: impl Into<PathBuf>, settings: ClassifierSettings, locale: Locale) -> Self {
        Self {
            training_data: training_data.into(),
            settings,
            locale,
            cache: Some(ModelCache::new()),
        }
    }

    /// Refit on every request.
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn place(&self, query: Query) -> Result<ClassificationResult> {
        let outcome = self.resolve(&query);
        match &outcome {
            Ok(result) => info!(
                name = %result.name,
                category = %result.category,
                class = %result.class,
                provenance = ?result.provenance,
                "placement resolved"
            ),
            Err(e) if e.is_client_error() => warn!(kind = e.kind(), "rejected placement request: {}", e),
            Err(e) => error!(kind = e.kind(), "placement failed: {}", e),
        }
        outcome
    }

    fn resolve(&self, query: &Query) -> Result<ClassificationResult> {
        query.validate()?;
        let store = TrainingStore::load(&self.training_data)?;

        if let Some(record) = store.lookup(&query.name) {
            return Ok(ClassificationResult::new(
                query,
                record.category,
                record.class,
                Provenance::Store,
            ));
        }

        let category = match &self.cache {
            Some(cache) => cache.get_or_fit(&store, &self.settings)?.classify(&query.scores),
            None => FittedClassifier::fit(&store, &self.settings)?.classify(&query.scores),
        };
        Ok(ClassificationResult::new(
            query,
            category,
            category.class_label(),
            Provenance::Model,
        ))
    }
}

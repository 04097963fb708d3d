//! K-means placement model.
//!
//! Fitting standardises the training scores, runs seeded k-means with three
//! clusters and then ranks the clusters by their mean standardised score.
//! Cluster indices stay internal: the only way out of this module is a
//! [`Category`], produced by [`order_clusters`].

use linfa::traits::Fit;
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::{aview1, Array2, ArrayView1, ArrayView2};
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use tracing::{debug, warn};

use crate::data::TrainingStore;
use crate::error::{PlacementError, Result};
use crate::model::{Category, Scores, FEATURE_COLUMNS, FEATURE_COUNT};
use crate::scaler::StandardScaler;

pub const N_CLUSTERS: usize = 3;
pub const MIN_RUNS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierSettings {
    /// Seed for centroid initialisation.
    pub seed: u64,
    /// Independent initialisations; the lowest-inertia run is kept.
    pub n_runs: usize,
    pub max_iterations: u64,
    pub tolerance: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            n_runs: MIN_RUNS,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

/// Maps opaque cluster indices onto ordered categories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOrdering {
    categories: [Category; N_CLUSTERS],
    means: [f64; N_CLUSTERS],
}

impl ClusterOrdering {
    pub fn category_of(&self, cluster: usize) -> Category {
        self.categories[cluster]
    }

    pub fn mean_of(&self, category: Category) -> f64 {
        self.categories
            .iter()
            .position(|c| *c == category)
            .map(|cluster| self.means[cluster])
            .unwrap_or(f64::NAN)
    }

    /// Cluster indices from lowest to highest category.
    #[cfg(test)]
    fn ranked(&self) -> [usize; N_CLUSTERS] {
        let mut ranked = [0; N_CLUSTERS];
        for (cluster, category) in self.categories.iter().enumerate() {
            ranked[*category as usize] = cluster;
        }
        ranked
    }
}

/// Ranks clusters by mean score, ascending. Equal means keep index order,
/// so the lower cluster index gets the lower category.
pub fn order_clusters(means: &[f64; N_CLUSTERS]) -> ClusterOrdering {
    let mut ranked: [usize; N_CLUSTERS] = std::array::from_fn(|k| k);
    ranked.sort_by(|&a, &b| means[a].total_cmp(&means[b]));

    let mut categories = [Category::Low; N_CLUSTERS];
    for (category, cluster) in Category::ASCENDING.into_iter().zip(ranked) {
        categories[cluster] = category;
    }
    ClusterOrdering {
        categories,
        means: *means,
    }
}

/// Per cluster: the average over members of each member's mean feature.
/// A cluster with no members falls back to its centroid's mean coordinate.
pub fn cluster_means(
    scaled: ArrayView2<'_, f64>,
    assignments: &[usize],
    centroids: ArrayView2<'_, f64>,
) -> [f64; N_CLUSTERS] {
    let mut sums = [0.0; N_CLUSTERS];
    let mut counts = [0usize; N_CLUSTERS];
    for (row, &cluster) in scaled.outer_iter().zip(assignments) {
        sums[cluster] += row.mean().unwrap_or(0.0);
        counts[cluster] += 1;
    }
    std::array::from_fn(|k| {
        if counts[k] > 0 {
            sums[k] / counts[k] as f64
        } else {
            centroids.row(k).mean().unwrap_or(0.0)
        }
    })
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Index of the closest centroid; the first one wins a tie.
pub fn nearest_centroid(centroids: ArrayView2<'_, f64>, point: ArrayView1<'_, f64>) -> usize {
    centroids
        .outer_iter()
        .map(|centroid| squared_distance(centroid, point))
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(cluster, _)| cluster)
        .unwrap_or(0)
}

/// Scaler, centroids and cluster ranking fitted on one training snapshot.
#[derive(Debug, Clone)]
pub struct FittedClassifier {
    scaler: StandardScaler,
    centroids: Array2<f64>,
    assignments: Vec<usize>,
    ordering: ClusterOrdering,
    inertia: f64,
    fingerprint: blake3::Hash,
}

impl FittedClassifier {
    pub fn fit(store: &TrainingStore, settings: &ClassifierSettings) -> Result<Self> {
        let distinct = store.distinct_rows();
        if store.len() < N_CLUSTERS || distinct < N_CLUSTERS {
            return Err(PlacementError::SourceMalformed(format!(
                "too few rows to form {} clusters ({} rows, {} distinct)",
                N_CLUSTERS,
                store.len(),
                distinct
            )));
        }

        let features = store.features();
        let scaler = StandardScaler::fit(features.view())?;
        for column in scaler.constant_columns() {
            warn!(
                feature = FEATURE_COLUMNS[column],
                "feature has zero variance, left unscaled"
            );
        }
        let scaled = scaler.transform(features.view());

        let dataset = DatasetBase::from(scaled.clone());
        let model = KMeans::params_with_rng(N_CLUSTERS, Xoshiro256Plus::seed_from_u64(settings.seed))
            .n_runs(settings.n_runs)
            .max_n_iterations(settings.max_iterations)
            .tolerance(settings.tolerance)
            .fit(&dataset)
            .map_err(|e| PlacementError::UnexpectedFailure(format!("k-means fit failed: {}", e)))?;

        let centroids = model.centroids().to_owned();
        if centroids.dim() != (N_CLUSTERS, FEATURE_COUNT) {
            return Err(PlacementError::UnexpectedFailure(format!(
                "k-means returned centroids of shape {:?}",
                centroids.dim()
            )));
        }
        if centroids.iter().any(|v| !v.is_finite()) {
            return Err(PlacementError::UnexpectedFailure("centroids are not finite".into()));
        }

        let assignments: Vec<usize> = scaled
            .outer_iter()
            .map(|row| nearest_centroid(centroids.view(), row))
            .collect();
        let inertia: f64 = scaled
            .outer_iter()
            .zip(&assignments)
            .map(|(row, &cluster)| squared_distance(row, centroids.row(cluster)))
            .sum();
        let ordering = order_clusters(&cluster_means(scaled.view(), &assignments, centroids.view()));

        debug!(
            records = store.len(),
            inertia,
            low = ordering.mean_of(Category::Low),
            medium = ordering.mean_of(Category::Medium),
            high = ordering.mean_of(Category::High),
            "fitted placement model"
        );

        Ok(Self {
            scaler,
            centroids,
            assignments,
            ordering,
            inertia,
            fingerprint: store.fingerprint(),
        })
    }

    pub fn classify(&self, scores: &Scores) -> Category {
        let features = scores.to_array();
        let scaled = self.scaler.transform_row(aview1(&features));
        let cluster = nearest_centroid(self.centroids.view(), scaled.view());
        self.ordering.category_of(cluster)
    }

    /// Category of each training row, in file order.
    pub fn training_categories(&self) -> Vec<Category> {
        self.assignments
            .iter()
            .map(|&cluster| self.ordering.category_of(cluster))
            .collect()
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn ordering(&self) -> &ClusterOrdering {
        &self.ordering
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Fingerprint of the training snapshot this model was fitted on.
    pub fn fingerprint(&self) -> blake3::Hash {
        self.fingerprint
    }
}

/// Fits on `store` and places one score vector.
pub fn classify(scores: &Scores, store: &TrainingStore, settings: &ClassifierSettings) -> Result<Category> {
    Ok(FittedClassifier::fit(store, settings)?.classify(scores))
}

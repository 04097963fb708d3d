//! Column-wise z-score standardisation.
//!
//! Statistics are population statistics (ddof = 0) taken from the training
//! matrix only. Columns whose standard deviation is effectively zero are
//! centred but left unscaled.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{PlacementError, Result};

const ZERO_VARIANCE_EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    std: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(data: ArrayView2<'_, f64>) -> Result<Self> {
        let mean = data.mean_axis(Axis(0)).ok_or_else(|| {
            PlacementError::SourceMalformed("cannot standardise an empty table".into())
        })?;
        let std = data.std_axis(Axis(0), 0.0);
        if mean.iter().chain(std.iter()).any(|v| !v.is_finite()) {
            return Err(PlacementError::UnexpectedFailure(
                "feature statistics are not finite".into(),
            ));
        }
        let scale = std.mapv(|s| if s > ZERO_VARIANCE_EPS { s } else { 1.0 });
        Ok(Self { mean, std, scale })
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    /// Indices of columns that are only centred, never divided.
    pub fn constant_columns(&self) -> Vec<usize> {
        self.std
            .iter()
            .enumerate()
            .filter(|(_, s)| **s <= ZERO_VARIANCE_EPS)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn transform(&self, data: ArrayView2<'_, f64>) -> Array2<f64> {
        (&data - &self.mean) / &self.scale
    }

    pub fn transform_row(&self, row: ArrayView1<'_, f64>) -> Array1<f64> {
        (&row - &self.mean) / &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_population_statistics() {
        let data = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let scaler = StandardScaler::fit(data.view()).unwrap();
        assert_eq!(scaler.mean(), &array![2.5, 25.0]);
        // population std of 1..4 is sqrt(1.25)
        assert!((scaler.std()[0] - 1.25_f64.sqrt()).abs() < 1e-12);

        let scaled = scaler.transform(data.view());
        for column in scaled.columns() {
            assert!(column.sum().abs() < 1e-9);
            let var = column.mapv(|v| v * v).mean().unwrap();
            assert!((var - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_query_reuses_fitted_statistics() {
        let data = array![[0.0, 0.0], [10.0, 20.0]];
        let scaler = StandardScaler::fit(data.view()).unwrap();
        let row = scaler.transform_row(array![15.0, 10.0].view());
        assert!((row[0] - 2.0).abs() < 1e-12);
        assert!(row[1].abs() < 1e-12);
        // fitting is untouched by transform
        assert_eq!(scaler.mean(), &array![5.0, 10.0]);
    }

    #[test]
    fn test_constant_column_is_centred_not_divided() {
        let data = array![[70.0, 1.0], [70.0, 2.0], [70.0, 3.0]];
        let scaler = StandardScaler::fit(data.view()).unwrap();
        assert_eq!(scaler.constant_columns(), vec![0]);
        let scaled = scaler.transform(data.view());
        assert!(scaled.iter().all(|v| v.is_finite()));
        assert!(scaled.column(0).iter().all(|v| *v == 0.0));
        let query = scaler.transform_row(array![80.0, 2.0].view());
        assert_eq!(query[0], 10.0);
    }

    #[test]
    fn test_empty_table_is_malformed() {
        let data = Array2::<f64>::zeros((0, 4));
        assert!(matches!(
            StandardScaler::fit(data.view()),
            Err(PlacementError::SourceMalformed(_))
        ));
    }
}

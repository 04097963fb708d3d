use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use ndarray::Array2;
use serde::Deserialize;
use tracing::debug;

use crate::error::{PlacementError, Result};
use crate::model::{normalize_name, Category, ClassLabel, Scores, FEATURE_COLUMNS, FEATURE_COUNT};

pub const NAME_COLUMN: &str = "NAMA";
pub const CATEGORY_COLUMN: &str = "Kategori";
pub const CLASS_COLUMN: &str = "Kelas";

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub name: String,
    pub scores: Scores,
    pub category: Category,
    pub class: ClassLabel,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "NAMA")]
    name: String,
    #[serde(rename = "PA/BP")]
    religion: f64,
    #[serde(rename = "Bahasa Indonesia")]
    indonesian: f64,
    #[serde(rename = "Matematika")]
    mathematics: f64,
    #[serde(rename = "Bahasa Inggris")]
    english: f64,
    #[serde(rename = "Kategori")]
    category: String,
    #[serde(rename = "Kelas")]
    class: String,
}

impl RawRecord {
    fn into_record(self, line: usize) -> Result<TrainingRecord> {
        let scores = Scores::new(self.religion, self.indonesian, self.mathematics, self.english);
        if !scores.is_in_range() {
            return Err(PlacementError::SourceMalformed(format!(
                "line {}: scores {:?} must be finite and within 0-100",
                line,
                scores.to_array()
            )));
        }
        let category = Category::parse(&self.category).ok_or_else(|| {
            PlacementError::SourceMalformed(format!(
                "line {}: unknown category '{}'",
                line, self.category
            ))
        })?;
        let class = ClassLabel::parse(&self.class).ok_or_else(|| {
            PlacementError::SourceMalformed(format!("line {}: unknown class '{}'", line, self.class))
        })?;
        if category.class_label() != class {
            return Err(PlacementError::SourceMalformed(format!(
                "line {}: category '{}' does not belong in class '{}'",
                line, self.category, self.class
            )));
        }
        Ok(TrainingRecord {
            name: self.name,
            scores,
            category,
            class,
        })
    }
}

/// Labeled students, loaded as one immutable snapshot.
#[derive(Debug, Clone)]
pub struct TrainingStore {
    records: Vec<TrainingRecord>,
    by_name: HashMap<String, usize>,
    fingerprint: blake3::Hash,
}

impl TrainingStore {
    /// Reads the whole file before parsing, so a request never sees a
    /// half-written table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| PlacementError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_csv_bytes(&bytes)?;
        debug!(
            path = %path.display(),
            records = store.len(),
            fingerprint = %store.fingerprint.to_hex(),
            "loaded training data"
        );
        Ok(store)
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(bytes);
        let headers = rdr
            .headers()
            .map_err(|e| PlacementError::SourceMalformed(format!("unreadable header: {}", e)))?
            .clone();

        let required = [NAME_COLUMN]
            .into_iter()
            .chain(FEATURE_COLUMNS)
            .chain([CATEGORY_COLUMN, CLASS_COLUMN]);
        let missing: Vec<&str> = required
            .filter(|column| !headers.iter().any(|h| h == *column))
            .collect();
        if !missing.is_empty() {
            return Err(PlacementError::SourceMalformed(format!(
                "missing column(s): {}",
                missing.join(", ")
            )));
        }

        let mut records = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            // header is line 1
            let line = idx + 2;
            let row = result
                .map_err(|e| PlacementError::SourceMalformed(format!("line {}: {}", line, e)))?;
            let raw: RawRecord = row
                .deserialize(Some(&headers))
                .map_err(|e| PlacementError::SourceMalformed(format!("line {}: {}", line, e)))?;
            records.push(raw.into_record(line)?);
        }

        Ok(Self::with_fingerprint(records, blake3::hash(bytes)))
    }

    pub fn from_records(records: Vec<TrainingRecord>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for record in &records {
            hasher.update(record.name.as_bytes());
            for score in record.scores.to_array() {
                hasher.update(&score.to_le_bytes());
            }
            hasher.update(&[record.category as u8]);
        }
        Self::with_fingerprint(records, hasher.finalize())
    }

    fn with_fingerprint(records: Vec<TrainingRecord>, fingerprint: blake3::Hash) -> Self {
        let mut by_name = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            let key = normalize_name(&record.name);
            if key.is_empty() {
                continue;
            }
            // first row wins on duplicate names
            by_name.entry(key).or_insert(idx);
        }
        Self {
            records,
            by_name,
            fingerprint,
        }
    }

    /// Exact match on the normalized name.
    pub fn lookup(&self, name: &str) -> Option<&TrainingRecord> {
        self.by_name
            .get(&normalize_name(name))
            .map(|&idx| &self.records[idx])
    }

    pub fn records(&self) -> &[TrainingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn fingerprint(&self) -> blake3::Hash {
        self.fingerprint
    }

    /// N x 4 feature matrix in file order.
    pub fn features(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.records.len(), FEATURE_COUNT), |(i, j)| {
            self.records[i].scores.to_array()[j]
        })
    }

    pub fn distinct_rows(&self) -> usize {
        self.records
            .iter()
            // + 0.0 folds -0.0 into 0.0
            .map(|r| r.scores.to_array().map(|s| (s + 0.0).to_bits()))
            .collect::<HashSet<_>>()
            .len()
    }
}

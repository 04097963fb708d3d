use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PlacementError, Result};

pub const FEATURE_COUNT: usize = 4;

/// Column headers of the four report-card scores, in feature order.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] =
    ["PA/BP", "Bahasa Indonesia", "Matematika", "Bahasa Inggris"];

/// Language used when rendering categories, classes and export documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Id,
}

/// Ordered performance category. Variant order is the performance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Low,
    Medium,
    High,
}

impl Category {
    pub const ASCENDING: [Category; 3] = [Category::Low, Category::Medium, Category::High];

    pub fn class_label(self) -> ClassLabel {
        match self {
            Category::High => ClassLabel::A,
            Category::Medium => ClassLabel::B,
            Category::Low => ClassLabel::C,
        }
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Category::Low, Locale::En) => "Low",
            (Category::Medium, Locale::En) => "Medium",
            (Category::High, Locale::En) => "High",
            (Category::Low, Locale::Id) => "Rendah",
            (Category::Medium, Locale::Id) => "Sedang",
            (Category::High, Locale::Id) => "Tinggi",
        }
    }

    /// Accepts the English or Indonesian label, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" | "rendah" => Some(Category::Low),
            "medium" | "sedang" => Some(Category::Medium),
            "high" | "tinggi" => Some(Category::High),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label(Locale::En))
    }
}

/// Recommended class section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassLabel {
    A,
    B,
    C,
}

impl ClassLabel {
    pub fn category(self) -> Category {
        match self {
            ClassLabel::A => Category::High,
            ClassLabel::B => Category::Medium,
            ClassLabel::C => Category::Low,
        }
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (ClassLabel::A, Locale::En) => "Class A",
            (ClassLabel::B, Locale::En) => "Class B",
            (ClassLabel::C, Locale::En) => "Class C",
            (ClassLabel::A, Locale::Id) => "Kelas A",
            (ClassLabel::B, Locale::Id) => "Kelas B",
            (ClassLabel::C, Locale::Id) => "Kelas C",
        }
    }

    /// Accepts "Class A", "Kelas A" or a bare "A", case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        let letter = lowered
            .strip_prefix("class")
            .or_else(|| lowered.strip_prefix("kelas"))
            .unwrap_or(&lowered)
            .trim();
        match letter {
            "a" => Some(ClassLabel::A),
            "b" => Some(ClassLabel::B),
            "c" => Some(ClassLabel::C),
            _ => None,
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label(Locale::En))
    }
}

/// Where a placement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Store,
    Model,
}

impl Provenance {
    pub fn description(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Provenance::Store, Locale::En) => "Looked up from training data",
            (Provenance::Model, Locale::En) => "Predicted by the k-means model",
            (Provenance::Store, Locale::Id) => "Data berhasil diproses",
            (Provenance::Model, Locale::Id) => "Prediksi berdasarkan model KMeans",
        }
    }
}

/// The four report-card scores, each in [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(default, alias = "pa_bp")]
    pub religion: f64,
    #[serde(default, alias = "bahasa_indonesia")]
    pub indonesian: f64,
    #[serde(default, alias = "matematika")]
    pub mathematics: f64,
    #[serde(default, alias = "bahasa_inggris")]
    pub english: f64,
}

impl Scores {
    pub fn new(religion: f64, indonesian: f64, mathematics: f64, english: f64) -> Self {
        Self {
            religion,
            indonesian,
            mathematics,
            english,
        }
    }

    pub fn uniform(score: f64) -> Self {
        Self::new(score, score, score, score)
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [self.religion, self.indonesian, self.mathematics, self.english]
    }

    pub fn is_in_range(&self) -> bool {
        self.to_array()
            .iter()
            .all(|s| s.is_finite() && (0.0..=100.0).contains(s))
    }
}

/// Trims surrounding whitespace and uppercases, the form names are matched in.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// One form submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub nis: String,
    #[serde(default, alias = "nama")]
    pub name: String,
    #[serde(default, alias = "asal_sekolah")]
    pub school: String,
    #[serde(default)]
    pub scores: Scores,
}

impl Query {
    pub fn new(nis: &str, name: &str, school: &str, scores: Scores) -> Self {
        Self {
            nis: nis.to_string(),
            name: name.to_string(),
            school: school.to_string(),
            scores,
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Blank text fields and 0.0 scores count as unset.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.nis.trim().is_empty() {
            missing.push("NIS");
        }
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.school.trim().is_empty() {
            missing.push("school");
        }
        for (column, score) in FEATURE_COLUMNS.iter().zip(self.scores.to_array()) {
            if score == 0.0 {
                missing.push(*column);
            }
        }
        if !missing.is_empty() {
            return Err(PlacementError::MissingInput(missing.join(", ")));
        }

        for (column, score) in FEATURE_COLUMNS.iter().zip(self.scores.to_array()) {
            if !score.is_finite() || !(0.0..=100.0).contains(&score) {
                return Err(PlacementError::InvalidInput(format!(
                    "{} score {} is outside 0-100",
                    column, score
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub name: String,
    pub nis: String,
    pub school: String,
    pub category: Category,
    pub class: ClassLabel,
    pub provenance: Provenance,
}

impl ClassificationResult {
    pub fn new(query: &Query, category: Category, class: ClassLabel, provenance: Provenance) -> Self {
        Self {
            name: query.normalized_name(),
            nis: query.nis.trim().to_string(),
            school: query.school.trim().to_string(),
            category,
            class,
            provenance,
        }
    }
}

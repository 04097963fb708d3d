//! Single-entry cache of the fitted placement model.
//!
//! An entry is valid for exactly one (training fingerprint, settings) pair.
//! The store is still reloaded on every request, so a change in file content
//! shows up as a new fingerprint and forces a refit on that same request.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::classifier::{ClassifierSettings, FittedClassifier};
use crate::data::TrainingStore;
use crate::error::Result;

struct CachedModel {
    fingerprint: blake3::Hash,
    settings: ClassifierSettings,
    model: Arc<FittedClassifier>,
}

#[derive(Default)]
pub struct ModelCache {
    slot: Mutex<Option<CachedModel>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached model when the key matches, otherwise fits and
    /// replaces the entry. A failed fit leaves the previous entry in place.
    pub fn get_or_fit(
        &self,
        store: &TrainingStore,
        settings: &ClassifierSettings,
    ) -> Result<Arc<FittedClassifier>> {
        let fingerprint = store.fingerprint();
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(cached) = slot.as_ref() {
            if cached.fingerprint == fingerprint && cached.settings == *settings {
                debug!(fingerprint = %fingerprint.to_hex(), "reusing cached model");
                return Ok(Arc::clone(&cached.model));
            }
        }

        debug!(fingerprint = %fingerprint.to_hex(), "fitting model");
        let model = Arc::new(FittedClassifier::fit(store, settings)?);
        *slot = Some(CachedModel {
            fingerprint,
            settings: *settings,
            model: Arc::clone(&model),
        });
        Ok(model)
    }

    pub fn cached_fingerprint(&self) -> Option<blake3::Hash> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|cached| cached.fingerprint)
    }

    #[cfg(test)]
    fn invalidate(&self) {
        *self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "NAMA,PA/BP,Bahasa Indonesia,Matematika,Bahasa Inggris,Kategori,Kelas
A,30,31,29,30,Rendah,Kelas C
B,31,30,30,29,Rendah,Kelas C
C,60,61,59,60,Sedang,Kelas B
D,59,60,61,60,Sedang,Kelas B
E,90,91,89,90,Tinggi,Kelas A
F,91,90,90,89,Tinggi,Kelas A
";

    fn store(extra: &str) -> TrainingStore {
        TrainingStore::from_csv_bytes(format!("{}{}", TABLE, extra).as_bytes()).unwrap()
    }

    #[test]
    fn test_unchanged_snapshot_reuses_model() {
        let cache = ModelCache::new();
        let settings = ClassifierSettings::default();
        let first = cache.get_or_fit(&store(""), &settings).unwrap();
        let second = cache.get_or_fit(&store(""), &settings).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.cached_fingerprint(), Some(store("").fingerprint()));
    }

    #[test]
    fn test_content_change_forces_refit() {
        let cache = ModelCache::new();
        let settings = ClassifierSettings::default();
        let first = cache.get_or_fit(&store(""), &settings).unwrap();
        let changed = store("G,92,93,91,90,Tinggi,Kelas A\n");
        let second = cache.get_or_fit(&changed, &settings).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn test_settings_change_forces_refit() {
        let cache = ModelCache::new();
        let first = cache.get_or_fit(&store(""), &ClassifierSettings::default()).unwrap();
        let reseeded = ClassifierSettings {
            seed: 7,
            ..ClassifierSettings::default()
        };
        let second = cache.get_or_fit(&store(""), &reseeded).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failed_fit_keeps_previous_entry() {
        let cache = ModelCache::new();
        let settings = ClassifierSettings::default();
        let good = store("");
        cache.get_or_fit(&good, &settings).unwrap();

        let tiny = TrainingStore::from_csv_bytes(
            "NAMA,PA/BP,Bahasa Indonesia,Matematika,Bahasa Inggris,Kategori,Kelas\nA,1,1,1,1,Rendah,Kelas C\n"
                .as_bytes(),
        )
        .unwrap();
        assert!(cache.get_or_fit(&tiny, &settings).is_err());
        assert_eq!(cache.cached_fingerprint(), Some(good.fingerprint()));

        cache.invalidate();
        assert_eq!(cache.cached_fingerprint(), None);
    }
}

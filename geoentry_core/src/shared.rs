// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A tree shared between loader threads.
//!
//! Metadata fetches for sibling layers run in parallel, and each reports
//! status for its own leaf when it finishes. [`SharedEntryTree`] serializes
//! those reports: every call holds the lock for one whole mutation, cascade
//! and observer notification included, so no two mutations interleave.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::entry::{EntryId, EntryTree};
use crate::error::ConfigError;
use crate::status::LayerStatus;

/// A cloneable, thread-safe handle to one [`EntryTree`].
#[derive(Clone, Debug)]
pub struct SharedEntryTree {
    inner: Arc<Mutex<EntryTree>>,
}

impl SharedEntryTree {
    /// Wraps a tree for sharing.
    #[must_use]
    pub fn new(tree: EntryTree) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tree)),
        }
    }

    /// Locks the tree for a sequence of operations.
    ///
    /// Observers run while the lock is held and must not lock the same tree.
    pub fn lock(&self) -> MutexGuard<'_, EntryTree> {
        self.inner.lock()
    }

    /// Runs `f` with exclusive access to the tree.
    pub fn with<R>(&self, f: impl FnOnce(&mut EntryTree) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Sets the status of an entry by handle.
    pub fn set_status(&self, id: EntryId, status: LayerStatus) {
        self.inner.lock().set_status(id, status);
    }

    /// Sets the status of the attached entry at `layer_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if no attached entry has the path.
    pub fn set_status_by_path(&self, layer_path: &str, status: LayerStatus) -> Result<EntryId, ConfigError> {
        let mut tree = self.inner.lock();
        let id = tree.require_path(layer_path)?;
        tree.set_status(id, status);
        Ok(id)
    }

    /// Returns the status of the entry at `layer_path`.
    #[must_use]
    pub fn status_by_path(&self, layer_path: &str) -> Option<LayerStatus> {
        let tree = self.inner.lock();
        tree.find_by_path(layer_path).map(|id| tree.status(id))
    }
}

impl From<EntryTree> for SharedEntryTree {
    fn from(tree: EntryTree) -> Self {
        Self::new(tree)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::vec::Vec;

    use serde_json::json;

    use super::*;

    #[test]
    fn parallel_loaders_settle_the_group() {
        let record = json!({
            "geoviewLayerId": "geo",
            "geoviewLayerType": "ogcFeature",
            "listOfLayerEntryConfig": [{
                "layerId": "g",
                "listOfLayerEntryConfig": [
                    { "layerId": "0" }, { "layerId": "1" }, { "layerId": "2" }, { "layerId": "3" }
                ]
            }]
        });
        let shared = SharedEntryTree::new(EntryTree::from_record(&record).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let path = std::format!("geo/g/{i}");
                    shared.set_status_by_path(&path, LayerStatus::Loading).unwrap();
                    shared.set_status_by_path(&path, LayerStatus::Loaded).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.status_by_path("geo/g"), Some(LayerStatus::Loaded));
        let loaded = shared.with(|tree| {
            tree.iter()
                .filter(|&id| tree.status(id) == LayerStatus::Loaded)
                .count()
        });
        assert_eq!(loaded, 5);
    }

    #[test]
    fn handler_work_runs_after_the_lock_is_released() {
        let record = json!({
            "geoviewLayerId": "geo",
            "geoviewLayerType": "ogcFeature",
            "listOfLayerEntryConfig": [{ "layerId": "a" }, { "layerId": "b" }]
        });
        let shared = SharedEntryTree::new(EntryTree::from_record(&record).unwrap());
        let failed = Arc::new(Mutex::new(Vec::<std::string::String>::new()));

        let sink = Arc::clone(&failed);
        shared.with(|tree| {
            let a = tree.require_path("geo/a").unwrap();
            tree.on_status_changed(a, move |e| {
                if e.status == LayerStatus::Error {
                    sink.lock().push(e.layer_path.into());
                }
            });
        });

        shared.set_status_by_path("geo/a", LayerStatus::Error).unwrap();
        let pending: Vec<_> = failed.lock().drain(..).collect();
        assert_eq!(pending, ["geo/a"]);
        // The handler only recorded the failure; the follow-up takes the lock.
        shared.set_status_by_path("geo/b", LayerStatus::Error).unwrap();
        assert_eq!(shared.status_by_path("geo/b"), Some(LayerStatus::Error));
    }

    #[test]
    fn unknown_path_is_not_found() {
        let shared = SharedEntryTree::from(EntryTree::new(
            "geo",
            crate::layer_type::GeoviewLayerType::Csv,
        ));
        let err = shared
            .set_status_by_path("geo/missing", LayerStatus::Error)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert_eq!(shared.status_by_path("geo/missing"), None);
    }
}

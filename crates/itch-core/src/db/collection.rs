// ── Entity collection ──
//
// One table of the cache. Concurrent id-keyed storage with merge-upsert
// writes and a version counter on a `watch` channel for change
// notification.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use tokio::sync::watch;

use super::query::Filter;
use super::{Record, TableName, json_field};
use crate::model::EntityId;

/// A single table of rows keyed by id.
///
/// Rows are immutable `Arc<Record>`s: a write builds the merged row and
/// swaps it in under the shard lock, so a reader sees either the old row or
/// the fully patched one, never a half-applied patch.
pub struct EntityCollection {
    name: TableName,

    /// Primary storage: id -> row.
    rows: DashMap<EntityId, Arc<Record>>,

    /// Version counter, bumped once per write call that changed something.
    version: watch::Sender<u64>,
}

impl EntityCollection {
    pub(crate) fn new(name: TableName) -> Self {
        let (version, _) = watch::channel(0u64);
        Self {
            name,
            rows: DashMap::new(),
            version,
        }
    }

    pub fn name(&self) -> TableName {
        self.name
    }

    /// Look up a row by id.
    pub fn find_one_by_id(&self, id: &EntityId) -> Option<Arc<Record>> {
        self.rows.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Every row matching `filter`, ordered by id.
    pub fn all(&self, filter: &Filter) -> Vec<Arc<Record>> {
        let mut hits: Vec<(EntityId, Arc<Record>)> = self
            .rows
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        hits.sort_by(|a, b| a.0.cmp(&b.0));
        hits.into_iter().map(|(_, row)| row).collect()
    }

    /// Merge `patch` into the row `id`, inserting it if absent. Fields in the
    /// patch overwrite, others are preserved. Structured values are encoded.
    ///
    /// The stored `id` is always the canonical form of `id`, whatever shape
    /// the patch carried.
    ///
    /// Returns `true` if the stored row changed.
    pub(crate) fn merge(&self, id: &EntityId, patch: &Record) -> bool {
        let mut encoded: Record = patch
            .iter()
            .map(|(k, v)| (k.clone(), json_field::encode(v.clone())))
            .collect();
        encoded.insert("id".into(), Value::from(id));

        match self.rows.entry(id.clone()) {
            Entry::Occupied(mut e) => {
                let current = e.get();
                if encoded.iter().all(|(k, v)| current.get(k) == Some(v)) {
                    return false;
                }
                let mut merged = (**current).clone();
                merged.extend(encoded);
                e.insert(Arc::new(merged));
                true
            }
            Entry::Vacant(e) => {
                e.insert(Arc::new(encoded));
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Subscribe to version bumps.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Increment the version counter.
    pub(crate) fn bump_version(&self) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.version.send_modify(|v| *v += 1);
    }
}

//! Workout history store with analytics.
//!
//! The store owns the full collection for the session. It is loaded once from
//! a [`HistoryStorage`] slot and rewritten wholesale on every mutation.

use crate::export::{self, DateStyle};
use crate::storage::HistoryStorage;
use crate::{Result, WorkoutRecord, WorkoutStats};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory workout collection backed by a storage slot
#[derive(Debug)]
pub struct HistoryStore<S: HistoryStorage> {
    records: Vec<WorkoutRecord>,
    storage: S,
}

impl<S: HistoryStorage> HistoryStore<S> {
    /// Load the collection from `storage`
    ///
    /// Returns an empty history if nothing is stored. If the slot cannot be
    /// read or parsed, logs a warning and starts empty; nothing is salvaged
    /// from a malformed slot.
    pub fn load(storage: S) -> Self {
        let records = match storage.read() {
            Ok(None) => {
                tracing::info!("No workout history found, starting empty");
                Vec::new()
            }
            Ok(Some(contents)) => match serde_json::from_str::<Vec<WorkoutRecord>>(&contents) {
                Ok(records) => {
                    tracing::debug!("Loaded {} workouts", records.len());
                    records
                }
                Err(e) => {
                    tracing::warn!("Failed to parse workout history: {}. Starting empty.", e);
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::warn!("Unable to read workout history: {}. Starting empty.", e);
                Vec::new()
            }
        };

        Self { records, storage }
    }

    /// Append a record and persist the whole collection
    ///
    /// No deduplication by id is performed.
    pub fn append(&mut self, record: WorkoutRecord) -> Result<()> {
        let mut updated = self.records.clone();
        updated.push(record);
        self.persist(&updated)?;
        self.records = updated;
        Ok(())
    }

    /// Remove every record with `id` and persist; returns how many were removed
    ///
    /// An unknown id is a no-op.
    pub fn delete(&mut self, id: &str) -> Result<usize> {
        let updated: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.id() != id)
            .cloned()
            .collect();
        let removed = self.records.len() - updated.len();

        self.persist(&updated)?;
        self.records = updated;

        if removed == 0 {
            tracing::debug!("No workout with id {} to delete", id);
        } else {
            tracing::info!("Deleted workout {}", id);
        }
        Ok(removed)
    }

    /// Aggregate statistics, or `None` for an empty history
    pub fn stats(&self) -> Option<WorkoutStats> {
        compute_stats(&self.records)
    }

    /// Pretty-printed JSON snapshot
    pub fn export_json(&self) -> Result<String> {
        export::to_json(&self.records)
    }

    /// CSV snapshot with one row per record in collection order
    pub fn export_csv(&self, dates: &DateStyle) -> Result<String> {
        export::to_csv(&self.records, dates)
    }

    pub fn records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&WorkoutRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn persist(&mut self, records: &[WorkoutRecord]) -> Result<()> {
        let contents = serde_json::to_string(records)?;
        self.storage.write(&contents)
    }
}

/// History store shared between threads
///
/// Every load, append and delete runs inside one critical section, since
/// whole-collection rewrites are unsafe under concurrent writers.
pub struct SharedHistoryStore<S: HistoryStorage> {
    inner: Arc<Mutex<HistoryStore<S>>>,
}

impl<S: HistoryStorage> Clone for SharedHistoryStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: HistoryStorage> SharedHistoryStore<S> {
    pub fn load(storage: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HistoryStore::load(storage))),
        }
    }

    pub fn append(&self, record: WorkoutRecord) -> Result<()> {
        self.inner.lock().append(record)
    }

    pub fn delete(&self, id: &str) -> Result<usize> {
        self.inner.lock().delete(id)
    }

    pub fn stats(&self) -> Option<WorkoutStats> {
        self.inner.lock().stats()
    }

    /// Run `f` with exclusive access to the store
    pub fn with<R>(&self, f: impl FnOnce(&mut HistoryStore<S>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

/// Compute statistics over `records`
///
/// Ties for the most frequent workout type go to the type seen first.
pub fn compute_stats(records: &[WorkoutRecord]) -> Option<WorkoutStats> {
    if records.is_empty() {
        return None;
    }

    let count = records.len() as u64;
    let total_calories: u64 = records.iter().map(|r| u64::from(r.calories())).sum();
    let total_duration: u64 = records.iter().map(|r| u64::from(r.duration_minutes())).sum();

    // Counts kept in first-seen order
    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let kind = record.workout_type();
        match index.get(kind).copied() {
            Some(i) => order[i].1 += 1,
            None => {
                index.insert(kind, order.len());
                order.push((kind, 1));
            }
        }
    }

    let mut most_frequent = order[0];
    for &(kind, n) in &order[1..] {
        if n > most_frequent.1 {
            most_frequent = (kind, n);
        }
    }

    Some(WorkoutStats {
        total_workouts: records.len(),
        total_calories,
        total_duration,
        avg_calories_per_workout: rounded_mean(total_calories, count),
        avg_duration: rounded_mean(total_duration, count),
        most_frequent_workout: most_frequent.0.to_string(),
    })
}

/// Integer mean rounded half up
fn rounded_mean(total: u64, count: u64) -> u64 {
    (total * 2 + count) / (count * 2)
}

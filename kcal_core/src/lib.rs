#![forbid(unsafe_code)]

//! Core domain model and business logic for kcal.
//!
//! This crate provides:
//! - Domain types (intensity, workout records, statistics, request contract)
//! - Calorie estimation (remote estimator with deterministic fallback)
//! - Persistence (storage slot abstraction, JSON file slot)
//! - History store with analytics and JSON/CSV export
//! - Quick-start presets

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod fallback;
pub mod estimator;
pub mod estimation;
pub mod storage;
pub mod export;
pub mod history;
pub mod presets;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, EstimatorConfig};
pub use estimator::{Estimator, GeminiEstimator};
pub use estimation::{Estimate, EstimateSource, EstimationService};
pub use storage::{HistoryStorage, JsonFileStorage, MemoryStorage, SlotLock};
pub use export::{DateStyle, ExportFormat};
pub use history::{HistoryStore, SharedHistoryStore};
pub use presets::{default_presets, find_preset, WorkoutPreset};

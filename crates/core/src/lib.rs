//! # vramsim
//!
//! The arithmetic and animation primitives behind a visual simulator of how
//! LLM inference and training consume accelerator memory and time.
//!
//! Nothing here measures real hardware. Memory figures come from simple
//! closed-form estimates; timing and throughput are synthesized with seeded
//! jitter so the animation looks alive.
//!
//! ## Quick Start
//!
//! ```
//! use vramsim::prelude::*;
//!
//! let catalog = Catalog::builtin();
//! let gpu = catalog.gpu("h100").unwrap();
//! let model = catalog.inference_model("llama-3.3-70b").unwrap();
//!
//! let est = MemoryEstimate::estimate(model.params_b, Precision::Int8, Workload::Inference, gpu.vram_gb);
//! assert_eq!(est.used_gb, 70.0);
//! assert!(!est.overflow);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): JSON loading of catalogs and [`config::SimConfig`]
//!
//! ## Modules
//!
//! - [`catalog`]: accelerator, model, dataset and chip tables
//! - [`metrics`]: memory footprint calculator
//! - [`particles`]: interpolated data-flow particles
//! - [`throughput`]: smoothed tokens/s from arrival times
//! - [`event_log`]: bounded newest-first event log
//! - [`prng`]: seeded and scripted randomness

#[path = "core/catalog.rs"]
pub mod catalog;

#[path = "core/config.rs"]
pub mod config;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/event_log.rs"]
pub mod event_log;

#[path = "core/metrics.rs"]
pub mod metrics;

#[path = "core/particles.rs"]
pub mod particles;

#[path = "core/precision.rs"]
pub mod precision;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/throughput.rs"]
pub mod throughput;

/// Prelude module for convenient imports.
///
/// ```
/// use vramsim::prelude::*;
/// ```
pub mod prelude {
    pub use crate::catalog::{
        AsicProfile, Catalog, DatasetProfile, HardwareProfile, Keyed, ModelArch, ModelProfile,
    };
    pub use crate::config::SimConfig;
    pub use crate::error::{SimError, SimResult};
    pub use crate::event_log::{EventLog, LogEntry};
    pub use crate::metrics::{KvFootprint, MemoryEstimate, Workload};
    pub use crate::particles::{Arrival, ParticleField, Vec2};
    pub use crate::precision::Precision;
    pub use crate::prng::{Prng, RandomSource, ScriptedRandom};
    pub use crate::throughput::ThroughputMeter;
}

//! Per-view simulation state for the visualiser.
//!
//! Each view owns one state record and advances it through an explicit
//! `transition(phase, event)` table. Scheduled callbacks (`frame`, `tick`)
//! mutate the record; renderers only read it.
//!
//! Everything here is host-testable: randomness is injected through
//! [`vramsim::prng::RandomSource`] and time is passed in as milliseconds.

pub mod inference;
pub mod pipeline;
pub mod showcase;
pub mod time;
pub mod training;

pub use inference::{QuickInferenceSim, QuickPhase};
pub use pipeline::{PipelinePhase, PipelineSim};
pub use showcase::{AsicShowcase, TpuShowcase};
pub use training::{TrainingPhase, TrainingSim};

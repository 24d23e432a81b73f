use std::sync::Arc;

use vramsim::catalog::{Catalog, HardwareProfile, ModelProfile};
use vramsim::error::SimResult;
use vramsim::metrics::{MemoryEstimate, Workload};
use vramsim::precision::Precision;

pub const DEFAULT_GPU: &str = "h100";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuickPhase {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickEvent {
    Toggle,
    Reset,
}

impl QuickPhase {
    pub fn transition(self, event: QuickEvent) -> Self {
        match (self, event) {
            (_, QuickEvent::Reset) => QuickPhase::Idle,
            (QuickPhase::Idle, QuickEvent::Toggle) => QuickPhase::Running,
            (QuickPhase::Running, QuickEvent::Toggle) => QuickPhase::Idle,
        }
    }

    /// Fill colour of the GPU box.
    pub fn color(self) -> &'static str {
        match self {
            QuickPhase::Idle => "#6366f1",
            QuickPhase::Running => "#10b981",
        }
    }

    pub fn button_label(self) -> &'static str {
        match self {
            QuickPhase::Idle => "Run Inference",
            QuickPhase::Running => "Stop",
        }
    }
}

/// The quick inference card: pick a GPU, a model and a precision and see
/// whether the weights fit.
#[derive(Debug, Clone)]
pub struct QuickInferenceSim {
    catalog: Arc<Catalog>,
    gpu: HardwareProfile,
    model: ModelProfile,
    precision: Precision,
    phase: QuickPhase,
}

impl QuickInferenceSim {
    pub fn new(catalog: Arc<Catalog>) -> SimResult<Self> {
        let gpu = catalog.gpu(DEFAULT_GPU)?.clone();
        let model = catalog.inference_model(DEFAULT_MODEL)?.clone();
        Ok(Self {
            catalog,
            gpu,
            model,
            precision: Precision::Int8,
            phase: QuickPhase::Idle,
        })
    }

    pub fn select_gpu(&mut self, key: &str) -> SimResult<()> {
        self.gpu = self.catalog.gpu(key)?.clone();
        Ok(())
    }

    pub fn select_model(&mut self, key: &str) -> SimResult<()> {
        self.model = self.catalog.inference_model(key)?.clone();
        Ok(())
    }

    pub fn set_precision(&mut self, precision: Precision) {
        self.precision = precision;
    }

    pub fn toggle(&mut self) {
        self.apply(QuickEvent::Toggle);
    }

    pub fn reset(&mut self) {
        self.apply(QuickEvent::Reset);
    }

    fn apply(&mut self, event: QuickEvent) {
        let next = self.phase.transition(event);
        if next != self.phase {
            tracing::debug!(from = ?self.phase, to = ?next, "quick inference phase");
            self.phase = next;
        }
    }

    pub fn estimate(&self) -> MemoryEstimate {
        MemoryEstimate::estimate(
            self.model.params_b,
            self.precision,
            Workload::Inference,
            self.gpu.vram_gb,
        )
    }

    pub fn phase(&self) -> QuickPhase {
        self.phase
    }

    pub fn gpu(&self) -> &HardwareProfile {
        &self.gpu
    }

    pub fn model(&self) -> &ModelProfile {
        &self.model
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

use std::sync::Arc;

use vramsim::catalog::{Catalog, DatasetProfile, HardwareProfile, ModelProfile};
use vramsim::config::SimConfig;
use vramsim::error::{SimError, SimResult};
use vramsim::event_log::EventLog;
use vramsim::metrics::{MemoryEstimate, Workload};
use vramsim::precision::Precision;
use vramsim::prng::{Prng, RandomSource};

pub const DEFAULT_GPU: &str = "h100";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b";
pub const DEFAULT_DATASET: &str = "pile-1tb";

/// Cross-entropy at initialisation, roughly ln(vocab).
pub const INITIAL_LOSS: f32 = 10.5;
const LOSS_FLOOR: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingPhase {
    Idle,
    LoadingData,
    Preprocessing,
    Forward,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingEvent {
    Start,
    PhaseElapsed,
    TargetReached,
    Reset,
}

impl TrainingPhase {
    pub fn transition(self, event: TrainingEvent) -> Self {
        use TrainingEvent as E;
        use TrainingPhase as P;
        match (self, event) {
            (_, E::Reset) => P::Idle,
            (P::Idle | P::Completed, E::Start) => P::LoadingData,
            (P::LoadingData, E::PhaseElapsed) => P::Preprocessing,
            (P::Preprocessing, E::PhaseElapsed) => P::Forward,
            (P::Forward, E::TargetReached) => P::Completed,
            (p, _) => p,
        }
    }

    pub fn is_running(self) -> bool {
        matches!(
            self,
            TrainingPhase::LoadingData | TrainingPhase::Preprocessing | TrainingPhase::Forward
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            TrainingPhase::Idle => "Idle",
            TrainingPhase::LoadingData => "Loading Data",
            TrainingPhase::Preprocessing => "Preprocessing",
            TrainingPhase::Forward => "Forward / Backward",
            TrainingPhase::Completed => "Completed",
        }
    }
}

/// Number of optimizer steps shown for a run, scaled down to demo length.
pub fn target_steps(dataset_tokens: f64, batch: u32, cfg: &SimConfig) -> u64 {
    let per_step = batch.max(1) as f64 * cfg.seq_len.max(1) as f64;
    let raw = (dataset_tokens / per_step / cfg.step_scale).round();
    let raw = if raw.is_finite() && raw > 0.0 { raw as u64 } else { 0 };
    raw.clamp(cfg.min_steps, cfg.max_steps)
}

/// A pre-training run: dataset load, tokenisation, then forward/backward
/// steps until the scaled step target is reached.
#[derive(Debug, Clone)]
pub struct TrainingSim<R: RandomSource = Prng> {
    cfg: SimConfig,
    catalog: Arc<Catalog>,

    gpu: HardwareProfile,
    model: ModelProfile,
    dataset: DatasetProfile,
    precision: Precision,
    batch_size: u32,
    speed: f64,

    phase: TrainingPhase,
    phase_ms: f64,
    last_tick_ms: Option<f64>,
    step_accum: f64,
    step: u64,
    target_steps: u64,
    tokens: u64,
    loss: f32,
    grad_norm: f32,
    throughput: f64,
    loss_history: Vec<f32>,

    log: EventLog,
    rng: R,
}

impl TrainingSim<Prng> {
    pub fn new(catalog: Arc<Catalog>, cfg: SimConfig) -> SimResult<Self> {
        let rng = Prng::new(cfg.seed ^ 0x7A11);
        Self::with_rng(catalog, cfg, rng)
    }
}

impl<R: RandomSource> TrainingSim<R> {
    pub fn with_rng(catalog: Arc<Catalog>, cfg: SimConfig, rng: R) -> SimResult<Self> {
        let gpu = catalog.gpu(DEFAULT_GPU)?.clone();
        let model = catalog.training_model(DEFAULT_MODEL)?.clone();
        let dataset = catalog.dataset(DEFAULT_DATASET)?.clone();
        let batch_size = cfg.default_batch_size;
        let target = target_steps(dataset.tokens, batch_size, &cfg);
        Ok(Self {
            gpu,
            model,
            dataset,
            precision: Precision::Fp16,
            batch_size,
            speed: cfg.speed.default,
            phase: TrainingPhase::Idle,
            phase_ms: 0.0,
            last_tick_ms: None,
            step_accum: 0.0,
            step: 0,
            target_steps: target,
            tokens: 0,
            loss: INITIAL_LOSS,
            grad_norm: 0.0,
            throughput: 0.0,
            loss_history: Vec::new(),
            log: EventLog::new(cfg.log_capacity),
            rng,
            catalog,
            cfg,
        })
    }

    pub fn controls_locked(&self) -> bool {
        self.phase.is_running()
    }

    pub fn select_gpu(&mut self, key: &str) -> SimResult<bool> {
        if self.controls_locked() {
            return Ok(false);
        }
        self.gpu = self.catalog.gpu(key)?.clone();
        Ok(true)
    }

    pub fn select_model(&mut self, key: &str) -> SimResult<bool> {
        if self.controls_locked() {
            return Ok(false);
        }
        self.model = self.catalog.training_model(key)?.clone();
        self.reset();
        Ok(true)
    }

    pub fn select_dataset(&mut self, key: &str) -> SimResult<bool> {
        if self.controls_locked() {
            return Ok(false);
        }
        self.dataset = self.catalog.dataset(key)?.clone();
        self.target_steps = target_steps(self.dataset.tokens, self.batch_size, &self.cfg);
        Ok(true)
    }

    pub fn set_precision(&mut self, precision: Precision) -> bool {
        if self.controls_locked() {
            return false;
        }
        self.precision = precision;
        true
    }

    pub fn set_batch_size(&mut self, batch: u32) -> SimResult<bool> {
        if !self.cfg.batch_sizes.contains(&batch) {
            return Err(SimError::InvalidConfig(format!(
                "batch size {batch} is not offered"
            )));
        }
        if self.controls_locked() {
            return Ok(false);
        }
        self.batch_size = batch;
        self.target_steps = target_steps(self.dataset.tokens, batch, &self.cfg);
        Ok(true)
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = self.cfg.speed.snap(speed);
    }

    pub fn start(&mut self, now_ms: f64) -> bool {
        let next = self.phase.transition(TrainingEvent::Start);
        if next == self.phase {
            return false;
        }
        self.clear_counters();
        self.target_steps = target_steps(self.dataset.tokens, self.batch_size, &self.cfg);
        self.last_tick_ms = Some(now_ms);
        self.phase = next;

        let est = self.estimate();
        if est.overflow {
            tracing::warn!(
                used_gb = est.used_gb,
                capacity_gb = est.capacity_gb,
                "training footprint exceeds accelerator memory"
            );
            self.log.push(
                now_ms,
                format!(
                    "WARNING: {:.0} GB needed, {} has {:.0} GB.",
                    est.used_gb, self.gpu.name, est.capacity_gb
                ),
            );
        }
        tracing::info!(model = %self.model.name, dataset = %self.dataset.name, target = self.target_steps, "training started");
        self.log
            .push(now_ms, format!("Loading {}...", self.dataset.name));
        true
    }

    pub fn reset(&mut self) {
        self.phase = self.phase.transition(TrainingEvent::Reset);
        self.clear_counters();
        self.log.clear();
        tracing::info!(model = %self.model.name, "training reset");
    }

    pub fn toggle(&mut self, now_ms: f64) {
        if self.phase.is_running() {
            self.reset();
        } else {
            self.start(now_ms);
        }
    }

    fn clear_counters(&mut self) {
        self.phase_ms = 0.0;
        self.last_tick_ms = None;
        self.step_accum = 0.0;
        self.step = 0;
        self.tokens = 0;
        self.loss = INITIAL_LOSS;
        self.grad_norm = 0.0;
        self.throughput = 0.0;
        self.loss_history.clear();
    }

    fn apply(&mut self, event: TrainingEvent) {
        let next = self.phase.transition(event);
        if next != self.phase {
            tracing::debug!(from = ?self.phase, to = ?next, ?event, "training phase");
            self.phase = next;
        }
    }

    /// Driven by the fixed-period counter timer.
    pub fn tick(&mut self, now_ms: f64) {
        let dt = match self.last_tick_ms {
            Some(last) => (now_ms - last).max(0.0),
            None => self.cfg.tick_ms as f64,
        };
        self.last_tick_ms = Some(now_ms);
        if !self.phase.is_running() {
            return;
        }
        let sim_dt = dt * self.speed;

        match self.phase {
            TrainingPhase::LoadingData => {
                self.phase_ms += sim_dt;
                if self.phase_ms >= self.cfg.loading_ms {
                    self.phase_ms -= self.cfg.loading_ms;
                    self.apply(TrainingEvent::PhaseElapsed);
                    self.log.push(
                        now_ms,
                        format!("Tokenizing {} (seq len {}).", self.dataset.name, self.cfg.seq_len),
                    );
                }
            }
            TrainingPhase::Preprocessing => {
                self.phase_ms += sim_dt;
                if self.phase_ms >= self.cfg.preprocessing_ms {
                    // Leftover time counts towards the first steps.
                    self.step_accum = (self.phase_ms - self.cfg.preprocessing_ms)
                        / self.cfg.tick_ms as f64;
                    self.phase_ms = 0.0;
                    self.apply(TrainingEvent::PhaseElapsed);
                    self.log.push(
                        now_ms,
                        format!(
                            "Forward pass: {} steps @ batch {}.",
                            self.target_steps, self.batch_size
                        ),
                    );
                }
            }
            TrainingPhase::Forward => {
                self.step_accum += sim_dt / self.cfg.tick_ms as f64;
                while self.step_accum >= 1.0 && self.step < self.target_steps {
                    self.step_accum -= 1.0;
                    self.advance_step();
                }
                if self.step >= self.target_steps {
                    self.apply(TrainingEvent::TargetReached);
                    self.throughput = 0.0;
                    tracing::info!(steps = self.step, loss = self.loss, "training completed");
                    self.log.push(
                        now_ms,
                        format!(
                            "Training complete: {} steps, loss {:.3}.",
                            self.step, self.loss
                        ),
                    );
                }
            }
            TrainingPhase::Idle | TrainingPhase::Completed => {}
        }
    }

    fn advance_step(&mut self) {
        let per_step = self.batch_size as u64 * self.cfg.seq_len as u64;
        self.step += 1;
        self.tokens += per_step;

        let noise = self.rng.gen_range_f32(-0.02, 0.02);
        self.loss = (self.loss * 0.995 - 0.002 + noise).max(LOSS_FLOOR);
        self.loss_history.push(self.loss);

        let decay = (-(self.step as f32) / 50.0).exp();
        self.grad_norm = (0.5 + 1.5 * decay + self.rng.gen_range_f32(-0.1, 0.1)).max(0.0);

        let jitter = 1.0 + self.rng.gen_range_f32(-0.05, 0.05) as f64;
        let ticks_per_sec = 1000.0 / self.cfg.tick_ms as f64;
        self.throughput = per_step as f64 * ticks_per_sec * self.speed * jitter;
    }

    pub fn estimate(&self) -> MemoryEstimate {
        MemoryEstimate::estimate(
            self.model.params_b,
            self.precision,
            Workload::Training,
            self.gpu.vram_gb,
        )
    }

    /// Fraction of the step target completed.
    pub fn progress(&self) -> f64 {
        if self.target_steps == 0 {
            return 0.0;
        }
        (self.step as f64 / self.target_steps as f64).min(1.0)
    }

    pub fn phase(&self) -> TrainingPhase {
        self.phase
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn target_steps(&self) -> u64 {
        self.target_steps
    }

    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    pub fn loss(&self) -> f32 {
        self.loss
    }

    pub fn grad_norm(&self) -> f32 {
        self.grad_norm
    }

    pub fn throughput(&self) -> f64 {
        self.throughput
    }

    pub fn loss_history(&self) -> &[f32] {
        &self.loss_history
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn gpu(&self) -> &HardwareProfile {
        &self.gpu
    }

    pub fn model(&self) -> &ModelProfile {
        &self.model
    }

    pub fn dataset(&self) -> &DatasetProfile {
        &self.dataset
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &SimConfig {
        &self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vramsim::prng::ScriptedRandom;

    fn sim() -> TrainingSim<ScriptedRandom> {
        // 0.5 maps every jitter range to its midpoint.
        TrainingSim::with_rng(
            Arc::new(Catalog::builtin()),
            SimConfig::default(),
            ScriptedRandom::constant(0.5),
        )
        .unwrap()
    }

    fn tick_until(
        s: &mut TrainingSim<ScriptedRandom>,
        t: &mut f64,
        max_ticks: usize,
        mut done: impl FnMut(&TrainingSim<ScriptedRandom>) -> bool,
    ) -> bool {
        for _ in 0..max_ticks {
            *t += 100.0;
            s.tick(*t);
            if done(s) {
                return true;
            }
        }
        false
    }

    #[test]
    fn transition_table() {
        use TrainingEvent as E;
        use TrainingPhase as P;
        assert_eq!(P::Idle.transition(E::Start), P::LoadingData);
        assert_eq!(P::LoadingData.transition(E::PhaseElapsed), P::Preprocessing);
        assert_eq!(P::Preprocessing.transition(E::PhaseElapsed), P::Forward);
        assert_eq!(P::Forward.transition(E::TargetReached), P::Completed);
        assert_eq!(P::Forward.transition(E::PhaseElapsed), P::Forward);
        assert_eq!(P::LoadingData.transition(E::TargetReached), P::LoadingData);
        assert_eq!(P::Forward.transition(E::Reset), P::Idle);
    }

    #[test]
    fn target_steps_scale_and_clamp() {
        let cfg = SimConfig::default();
        // 300e9 / (8 * 4096) / 1e5 = 91.55
        assert_eq!(target_steps(300e9, 8, &cfg), 92);
        assert_eq!(target_steps(2e9, 8, &cfg), 50);
        assert_eq!(target_steps(12e12, 1, &cfg), 500);
        assert_eq!(target_steps(0.0, 8, &cfg), 50);
    }

    #[test]
    fn run_visits_each_phase_once_in_order() {
        let mut s = sim();
        s.set_speed(5.0);
        let mut t = 0.0;
        assert!(s.start(t));

        let mut seen = vec![s.phase()];
        let finished = tick_until(&mut s, &mut t, 10_000, |s| {
            if seen.last() != Some(&s.phase()) {
                seen.push(s.phase());
            }
            s.phase() == TrainingPhase::Completed
        });
        assert!(finished);
        assert_eq!(
            seen,
            vec![
                TrainingPhase::LoadingData,
                TrainingPhase::Preprocessing,
                TrainingPhase::Forward,
                TrainingPhase::Completed,
            ]
        );
        assert_eq!(s.step(), 92);
        assert_eq!(s.tokens(), 92 * 8 * 4096);
        assert_eq!(s.loss_history().len(), 92);
        assert!(s.loss() < INITIAL_LOSS);
        assert_eq!(s.progress(), 1.0);
        assert!(s
            .log()
            .latest()
            .is_some_and(|e| e.message.starts_with("Training complete")));
    }

    #[test]
    fn loading_and_preprocessing_take_their_delays() {
        let mut s = sim();
        s.set_speed(1.0);
        let mut t = 0.0;
        s.start(t);
        tick_until(&mut s, &mut t, 14, |_| false);
        assert_eq!(s.phase(), TrainingPhase::LoadingData);
        tick_until(&mut s, &mut t, 1, |_| false);
        assert_eq!(s.phase(), TrainingPhase::Preprocessing);
        tick_until(&mut s, &mut t, 19, |_| false);
        assert_eq!(s.phase(), TrainingPhase::Preprocessing);
        tick_until(&mut s, &mut t, 1, |_| false);
        assert_eq!(s.phase(), TrainingPhase::Forward);
        assert_eq!(s.step(), 0);
    }

    #[test]
    fn forward_step_updates_counters() {
        let mut s = sim();
        s.set_speed(1.0);
        let mut t = 0.0;
        s.start(t);
        tick_until(&mut s, &mut t, 100, |s| s.step() == 1);
        assert_eq!(s.step(), 1);
        assert!((s.loss() - (INITIAL_LOSS * 0.995 - 0.002)).abs() < 1e-5);
        let expected_grad = 0.5 + 1.5 * (-1.0f32 / 50.0).exp();
        assert!((s.grad_norm() - expected_grad).abs() < 1e-5);
        assert!((s.throughput() / (8.0 * 4096.0 * 10.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn loss_never_drops_below_floor() {
        let mut s = TrainingSim::with_rng(
            Arc::new(Catalog::builtin()),
            SimConfig::default(),
            ScriptedRandom::constant(0.0),
        )
        .unwrap();
        s.loss = 0.06;
        s.advance_step();
        assert_eq!(s.loss(), LOSS_FLOOR);
    }

    #[test]
    fn reset_zeroes_counters_and_log() {
        let mut s = sim();
        s.set_speed(5.0);
        let mut t = 0.0;
        s.start(t);
        tick_until(&mut s, &mut t, 10_000, |s| s.step() >= 10);
        s.reset();
        assert_eq!(s.phase(), TrainingPhase::Idle);
        assert_eq!(s.step(), 0);
        assert_eq!(s.tokens(), 0);
        assert_eq!(s.loss(), INITIAL_LOSS);
        assert_eq!(s.throughput(), 0.0);
        assert!(s.loss_history().is_empty());
        assert!(s.log().is_empty());
    }

    #[test]
    fn memory_uses_training_multiplier_and_overflow_does_not_block() {
        let mut s = sim();
        assert_eq!(s.estimate().used_gb, 64.0);
        assert!(!s.estimate().overflow);

        s.select_model("llama-3.1-70b").unwrap();
        assert!(s.estimate().overflow);
        assert!(s.start(0.0));
        assert!(s.phase().is_running());
        assert_eq!(s.log().len(), 2);
        assert!(s.log().entries()[1].message.starts_with("WARNING"));
    }

    #[test]
    fn completed_run_accepts_new_selection_and_recomputes_memory() {
        let mut s = sim();
        s.set_speed(5.0);
        let mut t = 0.0;
        s.start(t);
        assert!(tick_until(&mut s, &mut t, 10_000, |s| s.phase() == TrainingPhase::Completed));
        assert!(!s.controls_locked());

        assert!(s.select_gpu("rtx4090").unwrap());
        assert_eq!(s.estimate().capacity_gb, 24.0);
        assert!(s.estimate().overflow);

        assert!(s.set_precision(Precision::Int4));
        assert_eq!(s.estimate().used_gb, 16.0);
        assert!(!s.estimate().overflow);
        assert_eq!(s.phase(), TrainingPhase::Completed);
    }

    #[test]
    fn selections_lock_while_running() {
        let mut s = sim();
        assert!(s.set_batch_size(32).unwrap());
        assert_eq!(s.target_steps(), 50);
        assert!(s.set_batch_size(3).is_err());

        s.start(0.0);
        assert!(!s.select_dataset("fineweb-10tb").unwrap());
        assert!(!s.set_batch_size(1).unwrap());
        assert!(!s.set_precision(Precision::Int4));
        assert_eq!(s.batch_size(), 32);
    }
}

use std::sync::Arc;

use vramsim::catalog::{Catalog, HardwareProfile, ModelArch, ModelProfile};
use vramsim::config::SimConfig;
use vramsim::error::{SimError, SimResult};
use vramsim::event_log::EventLog;
use vramsim::metrics::{kv_formula, KvFootprint};
use vramsim::particles::{ParticleField, Vec2};
use vramsim::precision::Precision;
use vramsim::prng::{Prng, RandomSource};
use vramsim::throughput::ThroughputMeter;

pub const DEFAULT_GPU: &str = "h100";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b";

/// Length of one decode cycle at 1x speed.
const DECODE_CYCLE_MS: f64 = 2000.0;

pub mod colors {
    pub const INPUT: &str = "#3b82f6";
    pub const FETCH: &str = "#ef4444";
    pub const STREAM: &str = "#f59e0b";
    pub const CACHE_WRITE: &str = "#10b981";
    pub const OUTPUT: &str = "#60a5fa";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Idle,
    Prefill,
    Decode,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    Start,
    PrefillComplete,
    StreamExhausted,
    Reset,
}

impl PipelinePhase {
    /// Pure transition table. Events that don't apply leave the phase as is.
    pub fn transition(self, event: PipelineEvent) -> Self {
        use PipelineEvent as E;
        use PipelinePhase as P;
        match (self, event) {
            (_, E::Reset) => P::Idle,
            (P::Idle | P::Completed, E::Start) => P::Prefill,
            (P::Prefill, E::PrefillComplete) => P::Decode,
            (P::Decode, E::StreamExhausted) => P::Completed,
            (p, _) => p,
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, PipelinePhase::Prefill | PipelinePhase::Decode)
    }

    pub fn label(self) -> &'static str {
        match self {
            PipelinePhase::Idle => "IDLE",
            PipelinePhase::Prefill => "PREFILL",
            PipelinePhase::Decode => "DECODE",
            PipelinePhase::Completed => "COMPLETED",
        }
    }
}

/// Where the current decode cycle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    FetchWeights,
    StreamingBus,
    AttnCompute,
    WriteCache,
}

impl DecodeStage {
    pub fn from_cycle(cycle: f64) -> Self {
        if cycle < 0.25 {
            DecodeStage::FetchWeights
        } else if cycle < 0.6 {
            DecodeStage::StreamingBus
        } else if cycle < 0.85 {
            DecodeStage::AttnCompute
        } else {
            DecodeStage::WriteCache
        }
    }

    pub fn status(self) -> &'static str {
        match self {
            DecodeStage::FetchWeights => "FETCH_WEIGHTS",
            DecodeStage::StreamingBus => "STREAMING_BUS",
            DecodeStage::AttnCompute => "ATN_COMPUTE",
            DecodeStage::WriteCache => "WRITE_CACHE",
        }
    }
}

pub const STATUS_READY: &str = "SYSTEM_READY";
pub const STATUS_INIT: &str = "INITIALIZING_TENSORS";
pub const STATUS_COMPLETED: &str = "COMPLETED";

/// The canned response streamed during decode. Mentions the active model.
pub fn sample_story(model_name: &str) -> Vec<String> {
    let text = "SUMMARY: In the year 2026, AI models like {} have surpassed human \
                benchmarks in coding and complex reasoning. However, the physical laws \
                of memory bandwidth still apply. As the KV cache fills the HBM3e stacks, \
                the GPU must efficiently pipeline gigabytes of weights for every single \
                token generated. The bottleneck is no longer the math, but the speed of \
                light across the bus.";
    text.split_whitespace()
        .map(|w| {
            if w == "{}" {
                model_name.to_string()
            } else {
                w.to_string()
            }
        })
        .collect()
}

/// Fixed scene geometry shared by the simulation and the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineLayout {
    pub width: f64,
    pub height: f64,
}

impl PipelineLayout {
    pub const RAIL_INSET: f64 = 175.0;
    pub const HOST_INSET: f64 = 100.0;

    pub fn left_rail(&self) -> f64 {
        Self::RAIL_INSET
    }

    pub fn right_rail(&self) -> f64 {
        self.width - Self::RAIL_INSET
    }

    pub fn host_x(&self) -> f64 {
        self.width - Self::HOST_INSET
    }

    pub fn bus_lanes(&self) -> Vec<f64> {
        (0..8).map(|i| 80.0 + i as f64 * 20.0).collect()
    }
}

/// Detailed inference view: prompt prefill, token-by-token decode, KV-cache
/// growth and a measured tokens/s readout.
#[derive(Debug, Clone)]
pub struct PipelineSim<R: RandomSource = Prng> {
    cfg: SimConfig,
    catalog: Arc<Catalog>,
    layout: PipelineLayout,

    gpu: HardwareProfile,
    model: ModelProfile,
    arch: ModelArch,
    precision: Precision,
    prompt_size: u32,
    speed: f64,

    phase: PipelinePhase,
    status: &'static str,
    tokens: u64,
    prefill_accum: f64,
    kv_resident: u64,
    words: Vec<String>,
    story: Vec<String>,
    started_at_ms: Option<f64>,
    elapsed_ms: f64,
    last_frame_ms: Option<f64>,
    /// Decode cycles completed, advanced by frame time × speed.
    decode_pos: f64,
    prev_cycle: Option<u64>,
    emitted_cycle: Option<u64>,

    meter: ThroughputMeter,
    log: EventLog,
    particles: ParticleField,
    rng: R,
}

impl PipelineSim<Prng> {
    pub fn new(catalog: Arc<Catalog>, cfg: SimConfig) -> SimResult<Self> {
        let rng = Prng::new(cfg.seed);
        Self::with_rng(catalog, cfg, rng)
    }
}

impl<R: RandomSource> PipelineSim<R> {
    pub fn with_rng(catalog: Arc<Catalog>, cfg: SimConfig, rng: R) -> SimResult<Self> {
        let gpu = catalog.pipeline_gpu(DEFAULT_GPU)?.clone();
        let model = catalog.pipeline_model(DEFAULT_MODEL)?.clone();
        let arch = arch_of(&model)?;
        let layout = PipelineLayout {
            width: cfg.pipeline_canvas.width as f64,
            height: cfg.pipeline_canvas.height as f64,
        };
        let particles = ParticleField::new(layout.left_rail(), layout.right_rail(), layout.bus_lanes());
        Ok(Self {
            layout,
            gpu,
            story: sample_story(&model.name),
            model,
            arch,
            precision: Precision::Int8,
            prompt_size: cfg.prompt_size.default as u32,
            speed: cfg.speed.default,
            phase: PipelinePhase::Idle,
            status: STATUS_READY,
            tokens: 0,
            prefill_accum: 0.0,
            kv_resident: 0,
            words: Vec::new(),
            started_at_ms: None,
            elapsed_ms: 0.0,
            last_frame_ms: None,
            decode_pos: 0.0,
            prev_cycle: None,
            emitted_cycle: None,
            meter: ThroughputMeter::new(cfg.throughput_window),
            log: EventLog::new(cfg.log_capacity),
            particles,
            rng,
            catalog,
            cfg,
        })
    }

    // ---- selections -------------------------------------------------------

    /// Hardware, precision and prompt size are locked while a run is active.
    pub fn controls_locked(&self) -> bool {
        self.phase.is_running()
    }

    pub fn select_gpu(&mut self, key: &str) -> SimResult<bool> {
        if self.controls_locked() {
            return Ok(false);
        }
        self.gpu = self.catalog.pipeline_gpu(key)?.clone();
        Ok(true)
    }

    /// Switching models always resets the run and adopts the model's default
    /// precision.
    pub fn select_model(&mut self, key: &str, now_ms: f64) -> SimResult<bool> {
        if self.controls_locked() {
            return Ok(false);
        }
        let model = self.catalog.pipeline_model(key)?.clone();
        self.arch = arch_of(&model)?;
        self.precision = self.arch.default_precision;
        self.story = sample_story(&model.name);
        self.model = model;
        self.reset();
        self.log
            .push(now_ms, format!("Switched to {}.", self.model.name));
        Ok(true)
    }

    pub fn set_precision(&mut self, precision: Precision) -> bool {
        if self.controls_locked() {
            return false;
        }
        self.precision = precision;
        true
    }

    pub fn set_prompt_size(&mut self, tokens: u32) -> bool {
        if self.controls_locked() {
            return false;
        }
        self.prompt_size = self.cfg.prompt_size.snap(tokens as f64) as u32;
        true
    }

    /// Playback speed may change mid-run.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = self.cfg.speed.snap(speed);
    }

    // ---- run control ------------------------------------------------------

    pub fn start(&mut self, now_ms: f64) -> bool {
        let next = self.phase.transition(PipelineEvent::Start);
        if next == self.phase {
            return false;
        }
        self.clear_run();
        self.phase = next;
        self.started_at_ms = Some(now_ms);
        self.status = STATUS_INIT;
        tracing::info!(model = %self.model.name, bits = self.precision.bits(), "pipeline started");
        self.log.push(
            now_ms,
            format!("STARTING: {} ({}-bit)", self.model.name, self.precision.bits()),
        );
        true
    }

    /// Unconditionally returns to idle, clearing counters, the log and
    /// in-flight particles.
    pub fn reset(&mut self) {
        self.phase = self.phase.transition(PipelineEvent::Reset);
        self.clear_run();
        self.log.clear();
        tracing::info!(model = %self.model.name, "pipeline reset");
    }

    /// The single Run/Halt button.
    pub fn toggle(&mut self, now_ms: f64) {
        if self.phase.is_running() {
            self.reset();
        } else {
            self.start(now_ms);
        }
    }

    fn clear_run(&mut self) {
        self.status = STATUS_READY;
        self.tokens = 0;
        self.prefill_accum = 0.0;
        self.kv_resident = 0;
        self.words.clear();
        self.started_at_ms = None;
        self.elapsed_ms = 0.0;
        self.decode_pos = 0.0;
        self.prev_cycle = None;
        self.emitted_cycle = None;
        self.meter.reset();
        self.particles.clear();
    }

    fn apply(&mut self, event: PipelineEvent) {
        let next = self.phase.transition(event);
        if next != self.phase {
            tracing::debug!(from = ?self.phase, to = ?next, ?event, "pipeline phase");
            self.phase = next;
        }
    }

    // ---- scheduled callbacks ----------------------------------------------

    /// Elapsed-time clock; driven by a fixed interval while the view is mounted.
    pub fn tick_clock(&mut self, now_ms: f64) {
        if !self.phase.is_running() {
            return;
        }
        if let Some(start) = self.started_at_ms {
            self.elapsed_ms = (now_ms - start).max(0.0);
        }
    }

    /// Per-frame physics. Runs every animation frame regardless of phase;
    /// only the work done depends on it.
    pub fn frame(&mut self, now_ms: f64) {
        let dt = match self.last_frame_ms {
            Some(last) => now_ms - last,
            None => self.cfg.reference_frame_ms,
        };
        self.last_frame_ms = Some(now_ms);
        let scale = self.cfg.frame_scale(dt);

        match self.phase {
            PipelinePhase::Prefill => self.advance_prefill(scale),
            PipelinePhase::Decode => self.advance_decode(now_ms, scale),
            PipelinePhase::Idle | PipelinePhase::Completed => {}
        }

        let factor = self.cfg.move_rate * self.speed * scale;
        for arrival in self.particles.step(factor) {
            self.meter.record_arrival(now_ms);
            self.words.push(arrival.payload);
        }
    }

    fn advance_prefill(&mut self, scale: f64) {
        let prompt = self.prompt_size.max(1) as f64;
        self.prefill_accum = (self.prefill_accum + 3.0 * self.speed * scale).min(prompt);
        let progress = self.prefill_accum / prompt;
        self.tokens = self.prefill_accum.floor() as u64;

        let w = self.layout.width;
        let host_x = self.layout.host_x();
        let spawn_p = self.speed * scale;
        if self.rng.chance((0.4 * spawn_p) as f32) {
            self.particles.spawn_direct(
                Vec2::new(host_x, -10.0),
                Vec2::new(host_x, 100.0),
                colors::INPUT,
                2.0,
                None,
            );
        }
        if progress > 0.4 && self.rng.chance((0.3 * spawn_p) as f32) {
            let ty = 50.0 + self.rng.next_f32_01() as f64 * 200.0;
            self.particles.spawn_bus(
                Vec2::new(w - PipelineLayout::RAIL_INSET, 130.0),
                Vec2::new(PipelineLayout::RAIL_INSET, ty),
                colors::INPUT,
                2.5,
                &mut self.rng,
            );
        }

        if progress >= 1.0 {
            self.tokens = self.prompt_size as u64;
            self.kv_resident = self.tokens;
            self.apply(PipelineEvent::PrefillComplete);
        }
    }

    fn advance_decode(&mut self, now_ms: f64, scale: f64) {
        // Monotonic across speed changes.
        let dt = scale * self.cfg.reference_frame_ms;
        self.decode_pos += dt * self.speed / DECODE_CYCLE_MS;
        let cycle_idx = self.decode_pos.floor() as u64;
        let cycle = self.decode_pos.fract();
        self.status = DecodeStage::from_cycle(cycle).status();

        let w = self.layout.width;
        let inset = PipelineLayout::RAIL_INSET;
        // Per-frame odds tuned at 60 Hz, scaled by the real frame time.
        if cycle < 0.25 && self.rng.chance((scale / 15.0) as f32) {
            self.particles.spawn_bus(
                Vec2::new(w - inset, 150.0),
                Vec2::new(inset, 100.0),
                colors::FETCH,
                3.0,
                &mut self.rng,
            );
        }
        if (0.25..0.6).contains(&cycle) && self.rng.chance((scale / 10.0) as f32) {
            self.particles.spawn_bus(
                Vec2::new(inset, 100.0),
                Vec2::new(w - inset, 150.0),
                colors::STREAM,
                4.0,
                &mut self.rng,
            );
        }
        if (0.85..0.98).contains(&cycle) && self.rng.chance((scale / 8.0) as f32) {
            let row = (self.tokens % 25) as f64;
            self.particles.spawn_bus(
                Vec2::new(w - inset, 150.0),
                Vec2::new(inset, 50.0 + row * 8.0),
                colors::CACHE_WRITE,
                5.0,
                &mut self.rng,
            );
        }

        // One token per cycle: in the write-back window, or on the first
        // frame after a cycle whose window fell between two frames.
        let due = if cycle >= 0.98 {
            Some(cycle_idx)
        } else {
            self.prev_cycle.filter(|&prev| prev < cycle_idx)
        };
        self.prev_cycle = Some(cycle_idx);
        if let Some(idx) = due {
            if self.emitted_cycle.map_or(true, |done| done < idx) {
                self.emitted_cycle = Some(idx);
                self.emit_token(now_ms);
            }
        }
    }

    fn emit_token(&mut self, now_ms: f64) {
        let generated = self.tokens.saturating_sub(self.prompt_size as u64) as usize;
        match self.story.get(generated) {
            Some(word) => {
                let host_x = self.layout.host_x();
                self.particles.spawn_direct(
                    Vec2::new(host_x, 50.0),
                    Vec2::new(host_x, -10.0),
                    colors::OUTPUT,
                    4.0,
                    Some(word.clone()),
                );
                self.tokens += 1;
                self.kv_resident += 1;
            }
            None => {
                self.apply(PipelineEvent::StreamExhausted);
                self.status = STATUS_COMPLETED;
                tracing::info!(tokens = self.tokens, "pipeline stream finished");
                self.log.push(
                    now_ms,
                    format!("STREAM FINISHED: {} total tokens.", self.tokens),
                );
            }
        }
    }

    // ---- derived state ----------------------------------------------------

    /// Recomputed from the current selection on every call.
    pub fn footprint(&self) -> KvFootprint {
        KvFootprint::new(
            &self.arch,
            self.model.params_b,
            self.precision,
            self.kv_resident,
            self.gpu.vram_gb,
        )
    }

    pub fn formula(&self) -> String {
        kv_formula(self.tokens, &self.arch, self.precision)
    }

    /// Smoothed tokens/s; reads zero outside an active run.
    pub fn throughput(&self) -> f64 {
        if self.phase.is_running() {
            self.meter.tokens_per_sec()
        } else {
            0.0
        }
    }

    /// Arithmetic-intensity badge: (value, caption).
    pub fn arithmetic_intensity(&self) -> (&'static str, &'static str) {
        match self.phase {
            PipelinePhase::Prefill => ("HIGH", "Prefill Phase"),
            PipelinePhase::Completed => ("IDLE", "Decoding Phase"),
            _ => ("LOW", "Decoding Phase"),
        }
    }

    /// Prompt fraction processed so far; drives the prefill scan line.
    pub fn prefill_progress(&self) -> f64 {
        (self.prefill_accum / self.prompt_size.max(1) as f64).min(1.0)
    }

    /// Rows filled in the KV-cache grid.
    pub fn kv_rows(&self) -> u64 {
        self.tokens
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    pub fn status(&self) -> &'static str {
        self.status
    }

    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn story_len(&self) -> usize {
        self.story.len()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn layout(&self) -> PipelineLayout {
        self.layout
    }

    pub fn gpu(&self) -> &HardwareProfile {
        &self.gpu
    }

    pub fn model(&self) -> &ModelProfile {
        &self.model
    }

    pub fn arch(&self) -> &ModelArch {
        &self.arch
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn prompt_size(&self) -> u32 {
        self.prompt_size
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

fn arch_of(model: &ModelProfile) -> SimResult<ModelArch> {
    model.arch.ok_or_else(|| {
        SimError::InvalidCatalog(format!("pipeline model {:?} has no architecture", model.key))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vramsim::prng::ScriptedRandom;

    const FRAME: f64 = 1000.0 / 60.0;

    fn sim() -> PipelineSim<ScriptedRandom> {
        // 0.99 never passes a spawn roll, keeping the scene quiet.
        PipelineSim::with_rng(
            Arc::new(Catalog::builtin()),
            SimConfig::default(),
            ScriptedRandom::constant(0.99),
        )
        .unwrap()
    }

    /// Drives frames until `done` holds or the frame budget runs out.
    fn run_frames(
        s: &mut PipelineSim<ScriptedRandom>,
        t: &mut f64,
        max_frames: usize,
        mut done: impl FnMut(&PipelineSim<ScriptedRandom>) -> bool,
    ) -> bool {
        for _ in 0..max_frames {
            *t += FRAME;
            s.frame(*t);
            s.tick_clock(*t);
            if done(s) {
                return true;
            }
        }
        false
    }

    #[test]
    fn transition_table_is_a_single_forward_pipeline() {
        use PipelineEvent as E;
        use PipelinePhase as P;
        assert_eq!(P::Idle.transition(E::Start), P::Prefill);
        assert_eq!(P::Prefill.transition(E::PrefillComplete), P::Decode);
        assert_eq!(P::Decode.transition(E::StreamExhausted), P::Completed);
        assert_eq!(P::Completed.transition(E::Start), P::Prefill);

        // Out-of-order events are ignored.
        assert_eq!(P::Idle.transition(E::PrefillComplete), P::Idle);
        assert_eq!(P::Prefill.transition(E::StreamExhausted), P::Prefill);
        assert_eq!(P::Decode.transition(E::Start), P::Decode);

        for p in [P::Idle, P::Prefill, P::Decode, P::Completed] {
            assert_eq!(p.transition(E::Reset), P::Idle);
        }
    }

    #[test]
    fn decode_stage_boundaries() {
        assert_eq!(DecodeStage::from_cycle(0.0), DecodeStage::FetchWeights);
        assert_eq!(DecodeStage::from_cycle(0.25), DecodeStage::StreamingBus);
        assert_eq!(DecodeStage::from_cycle(0.6), DecodeStage::AttnCompute);
        assert_eq!(DecodeStage::from_cycle(0.85), DecodeStage::WriteCache);
    }

    #[test]
    fn story_names_the_model() {
        let story = sample_story("Phi-4 (14B)");
        assert_eq!(story[0], "SUMMARY:");
        assert_eq!(story[8], "Phi-4 (14B)");
        assert_eq!(story.last().map(String::as_str), Some("bus."));
    }

    #[test]
    fn full_run_visits_each_phase_once_in_order() {
        let mut s = sim();
        s.set_speed(5.0);
        s.set_prompt_size(128);
        let mut t = 0.0;
        assert!(s.start(t));

        let mut seen = vec![s.phase()];
        let finished = run_frames(&mut s, &mut t, 200_000, |s| {
            if seen.last() != Some(&s.phase()) {
                seen.push(s.phase());
            }
            s.phase() == PipelinePhase::Completed
        });
        assert!(finished);
        assert_eq!(
            seen,
            vec![
                PipelinePhase::Prefill,
                PipelinePhase::Decode,
                PipelinePhase::Completed
            ]
        );

        // Every story word was generated exactly once.
        assert_eq!(s.tokens(), 128 + s.story_len() as u64);
        assert_eq!(s.status(), STATUS_COMPLETED);
        assert_eq!(s.throughput(), 0.0);
        assert!(s
            .log()
            .latest()
            .is_some_and(|e| e.message.starts_with("STREAM FINISHED")));

        // Completed runs can start again.
        assert!(s.start(t));
        assert_eq!(s.phase(), PipelinePhase::Prefill);
        assert_eq!(s.tokens(), 0);
    }

    #[test]
    fn words_arrive_in_order_and_feed_the_meter() {
        let mut s = sim();
        s.set_speed(5.0);
        s.set_prompt_size(128);
        let mut t = 0.0;
        s.start(t);
        assert!(run_frames(&mut s, &mut t, 200_000, |s| s.words().len() >= 6));
        assert_eq!(&s.words()[..3], ["SUMMARY:", "In", "the"]);
        assert!(s.throughput() > 0.0);
    }

    #[test]
    fn prefill_loads_kv_for_the_prompt() {
        let mut s = sim();
        s.set_prompt_size(256);
        let mut t = 0.0;
        s.start(t);
        assert_eq!(s.footprint().kv_gb, 0.0);
        assert!(run_frames(&mut s, &mut t, 100_000, |s| s.phase() == PipelinePhase::Decode));
        assert_eq!(s.tokens(), 256);
        let per_token = vramsim::metrics::kv_gb_per_token(80, 8192, Precision::Int8);
        assert!((s.footprint().kv_gb - 256.0 * per_token).abs() < 1e-12);
        assert_eq!(s.footprint().weights_gb, 70.0);
        assert_eq!(s.arithmetic_intensity().0, "LOW");
    }

    #[test]
    fn slow_speed_still_makes_prefill_progress_at_high_refresh() {
        let mut s = sim();
        s.set_speed(0.5);
        s.set_prompt_size(128);
        let mut t = 0.0;
        s.start(t);
        // 240 Hz frames.
        for _ in 0..10 {
            t += 1000.0 / 240.0;
            s.frame(t);
        }
        assert!(s.tokens() > 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut s = sim();
        s.set_speed(5.0);
        s.set_prompt_size(128);
        let mut t = 0.0;
        s.start(t);
        run_frames(&mut s, &mut t, 200_000, |s| s.words().len() >= 3);
        assert!(s.tokens() > 0);

        s.reset();
        assert_eq!(s.phase(), PipelinePhase::Idle);
        assert_eq!(s.status(), STATUS_READY);
        assert_eq!(s.tokens(), 0);
        assert!(s.words().is_empty());
        assert_eq!(s.elapsed_ms(), 0.0);
        assert_eq!(s.throughput(), 0.0);
        assert!(s.log().is_empty());
        assert!(s.particles().is_empty());
        assert_eq!(s.footprint().kv_gb, 0.0);
    }

    #[test]
    fn controls_lock_while_running() {
        let mut s = sim();
        s.start(0.0);
        assert!(!s.select_gpu("rtx4090").unwrap());
        assert!(!s.set_precision(Precision::Fp16));
        assert!(!s.set_prompt_size(1024));
        assert_eq!(s.gpu().key, "h100");
        s.set_speed(3.0);
        assert_eq!(s.speed(), 3.0);

        s.toggle(10.0);
        assert_eq!(s.phase(), PipelinePhase::Idle);
        assert!(s.select_gpu("rtx4090").unwrap());
        assert!(s.footprint().overflow());
    }

    #[test]
    fn switching_selection_recomputes_memory_immediately() {
        let mut s = sim();
        assert_eq!(s.footprint().total_gb(), 70.0);
        assert!(!s.footprint().overflow());

        s.set_precision(Precision::Fp16);
        assert_eq!(s.footprint().total_gb(), 140.0);
        assert!(s.footprint().overflow());

        s.select_model("phi-4", 5.0).unwrap();
        assert_eq!(s.precision(), Precision::Fp16);
        assert_eq!(s.footprint().total_gb(), 28.0);
        assert_eq!(s.log().len(), 1);

        assert!(matches!(
            s.select_model("gpt-9", 6.0),
            Err(SimError::UnknownKey { .. })
        ));
        assert_eq!(s.model().key, "phi-4");
    }

    #[test]
    fn decode_keeps_emitting_when_speed_changes_mid_run() {
        let mut s = sim();
        s.set_speed(5.0);
        s.set_prompt_size(128);
        let mut t = 100_000.0;
        s.start(t);
        assert!(run_frames(&mut s, &mut t, 200_000, |s| s.tokens() >= 131));
        assert_eq!(s.phase(), PipelinePhase::Decode);

        // 60 s at 0.5x is 4 s per cycle, so roughly 15 tokens.
        s.set_speed(0.5);
        let before = s.tokens();
        run_frames(&mut s, &mut t, 3_600, |_| false);
        assert_eq!(s.phase(), PipelinePhase::Decode);
        assert!(s.tokens() >= before + 12, "slowed decode emitted {}", s.tokens() - before);
        assert!(s.tokens() <= before + 16);

        // Speeding back up never emits more than one token per frame.
        s.set_speed(5.0);
        let mut last = s.tokens();
        let finished = run_frames(&mut s, &mut t, 200_000, |s| {
            let step_ok = s.tokens() <= last + 1;
            last = s.tokens();
            assert!(step_ok);
            s.phase() == PipelinePhase::Completed
        });
        assert!(finished);
        assert_eq!(s.tokens(), 128 + s.story_len() as u64);
    }

    #[test]
    fn completed_run_accepts_new_selection_and_recomputes_memory() {
        let mut s = sim();
        s.set_speed(5.0);
        s.set_prompt_size(128);
        let mut t = 0.0;
        s.start(t);
        assert!(run_frames(&mut s, &mut t, 200_000, |s| s.phase() == PipelinePhase::Completed));
        let kv_gb = s.footprint().kv_gb;
        assert!(kv_gb > 0.0);

        assert!(s.select_gpu("rtx4090").unwrap());
        assert_eq!(s.footprint().capacity_gb, 24.0);
        assert!(s.footprint().overflow());

        assert!(s.set_precision(Precision::Int4));
        assert_eq!(s.footprint().weights_gb, 35.0);
        // KV rows now read at 4-bit, half the 8-bit figure.
        assert!((s.footprint().kv_gb - kv_gb / 2.0).abs() < 1e-12);
        assert_eq!(s.phase(), PipelinePhase::Completed);
    }

    #[test]
    fn elapsed_clock_only_runs_during_a_run() {
        let mut s = sim();
        s.tick_clock(500.0);
        assert_eq!(s.elapsed_ms(), 0.0);
        s.start(1000.0);
        s.tick_clock(1750.0);
        assert_eq!(s.elapsed_ms(), 750.0);
    }
}

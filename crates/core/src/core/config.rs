//! Simulation tunables.
//!
//! Defaults reproduce the stock behaviour; a JSON document can override any
//! subset of fields.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Inclusive slider range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl SliderRange {
    /// Clamps and snaps `v` onto the slider grid.
    pub fn snap(&self, v: f64) -> f64 {
        if !v.is_finite() {
            return self.default;
        }
        let clamped = v.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).min(self.max)
    }

    fn is_valid(&self) -> bool {
        self.min <= self.max
            && self.step >= 0.0
            && (self.min..=self.max).contains(&self.default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Period of the counter timer driving the training run.
    pub tick_ms: u32,
    /// Period of the elapsed-time clock in the pipeline view.
    pub clock_tick_ms: u32,
    pub log_capacity: usize,
    pub throughput_window: usize,
    /// Fraction of remaining distance a particle covers per reference frame.
    pub move_rate: f64,
    /// Frame duration that per-frame rates were tuned against (60 Hz).
    pub reference_frame_ms: f64,
    pub speed: SliderRange,
    pub prompt_size: SliderRange,
    pub simple_canvas: CanvasSize,
    pub pipeline_canvas: CanvasSize,
    pub loading_ms: f64,
    pub preprocessing_ms: f64,
    pub batch_sizes: Vec<u32>,
    pub default_batch_size: u32,
    pub seq_len: u32,
    /// Divides the real step count so a demo run finishes in seconds.
    pub step_scale: f64,
    pub min_steps: u64,
    pub max_steps: u64,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            clock_tick_ms: 50,
            log_capacity: 10,
            throughput_window: 5,
            move_rate: 0.18,
            reference_frame_ms: 1000.0 / 60.0,
            speed: SliderRange {
                min: 0.5,
                max: 5.0,
                step: 0.5,
                default: 1.5,
            },
            prompt_size: SliderRange {
                min: 128.0,
                max: 4096.0,
                step: 128.0,
                default: 540.0,
            },
            simple_canvas: CanvasSize {
                width: 800,
                height: 350,
            },
            pipeline_canvas: CanvasSize {
                width: 800,
                height: 400,
            },
            loading_ms: 1500.0,
            preprocessing_ms: 2000.0,
            batch_sizes: vec![1, 2, 4, 8, 16, 32],
            default_batch_size: 8,
            seq_len: 4096,
            step_scale: 100_000.0,
            min_steps: 50,
            max_steps: 500,
            seed: 0x5EED_2026,
        }
    }
}

impl SimConfig {
    #[cfg(feature = "serde")]
    pub fn from_json_str(s: &str) -> SimResult<Self> {
        let cfg: SimConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> SimResult<()> {
        let fail = |msg: &str| Err(SimError::InvalidConfig(msg.to_string()));
        if self.tick_ms == 0 || self.clock_tick_ms == 0 {
            return fail("timer periods must be positive");
        }
        if !(self.reference_frame_ms > 0.0) {
            return fail("reference_frame_ms must be positive");
        }
        if !(self.move_rate > 0.0 && self.move_rate <= 1.0) {
            return fail("move_rate must be in (0, 1]");
        }
        if !self.speed.is_valid() || !self.prompt_size.is_valid() {
            return fail("slider ranges must be ordered and contain their default");
        }
        if self.batch_sizes.is_empty() || self.batch_sizes.contains(&0) {
            return fail("batch_sizes must be non-empty and positive");
        }
        if !self.batch_sizes.contains(&self.default_batch_size) {
            return fail("default_batch_size must be one of batch_sizes");
        }
        if self.seq_len == 0 || !(self.step_scale > 0.0) {
            return fail("seq_len and step_scale must be positive");
        }
        if self.min_steps == 0 || self.min_steps > self.max_steps {
            return fail("min_steps must be positive and <= max_steps");
        }
        if self.loading_ms < 0.0 || self.preprocessing_ms < 0.0 {
            return fail("phase delays must be non-negative");
        }
        Ok(())
    }

    /// Scales a per-reference-frame rate to a frame that took `dt_ms`.
    pub fn frame_scale(&self, dt_ms: f64) -> f64 {
        if !(dt_ms > 0.0) {
            return 0.0;
        }
        // A stalled tab should not teleport particles across the canvas.
        (dt_ms / self.reference_frame_ms).min(4.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn slider_snaps_to_grid() {
        let s = SimConfig::default().speed;
        assert_eq!(s.snap(1.3), 1.5);
        assert_eq!(s.snap(0.1), 0.5);
        assert_eq!(s.snap(9.0), 5.0);
        assert_eq!(s.snap(f64::NAN), 1.5);
        let p = SimConfig::default().prompt_size;
        assert_eq!(p.snap(540.0), 512.0);
        assert_eq!(p.snap(4000.0), 4096.0);
    }

    #[test]
    fn frame_scale_is_relative_to_sixty_hz() {
        let c = SimConfig::default();
        assert!((c.frame_scale(1000.0 / 60.0) - 1.0).abs() < 1e-12);
        assert!((c.frame_scale(1000.0 / 120.0) - 0.5).abs() < 1e-12);
        assert_eq!(c.frame_scale(0.0), 0.0);
        assert_eq!(c.frame_scale(10_000.0), 4.0);
    }

    #[test]
    fn rejects_bad_batch_menu() {
        let mut c = SimConfig::default();
        c.default_batch_size = 3;
        assert!(matches!(c.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_overrides_keep_other_defaults() {
        let c = SimConfig::from_json_str(r#"{ "tick_ms": 250, "log_capacity": 4 }"#).unwrap();
        assert_eq!(c.tick_ms, 250);
        assert_eq!(c.log_capacity, 4);
        assert_eq!(c.seq_len, 4096);

        assert!(SimConfig::from_json_str(r#"{ "tick_ms": 0 }"#).is_err());
    }
}

//! Memory-footprint arithmetic shared by every view.
//!
//! All functions are pure. Callers recompute on every read instead of caching,
//! so a changed selection is reflected immediately.

use crate::catalog::ModelArch;
use crate::precision::Precision;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// What the accelerator is being asked to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// Weights only.
    Inference,
    /// Weights + gradients + optimizer state, approximated as 4x weights.
    Training,
}

impl Workload {
    pub fn multiplier(self) -> f64 {
        match self {
            Workload::Inference => 1.0,
            Workload::Training => 4.0,
        }
    }
}

/// Weight memory in GB for `params_b` billion parameters.
pub fn weights_gb(params_b: f64, precision: Precision, workload: Workload) -> f64 {
    params_b * precision.bytes_per_param() * workload.multiplier()
}

/// Equality is not an overflow.
pub fn is_overflow(used_gb: f64, capacity_gb: f64) -> bool {
    used_gb > capacity_gb
}

/// KV-cache growth per resident token, in GB.
pub fn kv_gb_per_token(layers: u32, hidden: u32, precision: Precision) -> f64 {
    2.0 * layers as f64 * hidden as f64 * precision.bytes_per_param() / GIB
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryEstimate {
    pub used_gb: f64,
    pub capacity_gb: f64,
    pub overflow: bool,
}

impl MemoryEstimate {
    pub fn estimate(
        params_b: f64,
        precision: Precision,
        workload: Workload,
        capacity_gb: f64,
    ) -> Self {
        let used_gb = weights_gb(params_b, precision, workload);
        Self {
            used_gb,
            capacity_gb,
            overflow: is_overflow(used_gb, capacity_gb),
        }
    }

    pub fn utilization(&self) -> f64 {
        if self.capacity_gb <= 0.0 {
            return 0.0;
        }
        self.used_gb / self.capacity_gb
    }

    /// Fill fraction for a usage bar.
    pub fn bar_fraction(&self) -> f64 {
        self.utilization().clamp(0.0, 1.0)
    }
}

/// Weights plus the KV cache accumulated so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KvFootprint {
    pub kv_gb: f64,
    pub weights_gb: f64,
    pub capacity_gb: f64,
}

impl KvFootprint {
    pub fn new(
        arch: &ModelArch,
        params_b: f64,
        precision: Precision,
        resident_tokens: u64,
        capacity_gb: f64,
    ) -> Self {
        Self {
            kv_gb: kv_gb_per_token(arch.layers, arch.hidden, precision) * resident_tokens as f64,
            weights_gb: weights_gb(params_b, precision, Workload::Inference),
            capacity_gb,
        }
    }

    pub fn total_gb(&self) -> f64 {
        self.kv_gb + self.weights_gb
    }

    pub fn overflow(&self) -> bool {
        is_overflow(self.total_gb(), self.capacity_gb)
    }

    pub fn bar_fraction(&self) -> f64 {
        if self.capacity_gb <= 0.0 {
            return 0.0;
        }
        (self.total_gb() / self.capacity_gb).clamp(0.0, 1.0)
    }
}

/// The formula line shown under the VRAM bar.
pub fn kv_formula(tokens: u64, arch: &ModelArch, precision: Precision) -> String {
    format!(
        "{tokens} × 2 × {} layers × {} hidden × ({}/8) B ÷ 1024³",
        arch.layers,
        arch.hidden,
        precision.bits()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arch(layers: u32, hidden: u32) -> ModelArch {
        ModelArch {
            layers,
            hidden,
            heads: 64,
            moe: false,
            default_precision: Precision::Int8,
        }
    }

    #[test]
    fn inference_memory_is_params_times_bytes() {
        for p in Precision::ALL {
            for params in [0.0, 2.0, 70.0, 671.0] {
                let expected = params * p.bits() as f64 / 8.0;
                assert_eq!(weights_gb(params, p, Workload::Inference), expected);
            }
        }
    }

    #[test]
    fn memory_is_monotonic_in_params_and_precision() {
        let mut last = -1.0;
        for p in [Precision::Int4, Precision::Int8, Precision::Fp16] {
            let m = weights_gb(70.0, p, Workload::Inference);
            assert!(m > last);
            last = m;
        }
        assert!(
            weights_gb(71.0, Precision::Int8, Workload::Inference)
                > weights_gb(70.0, Precision::Int8, Workload::Inference)
        );
    }

    #[test]
    fn h100_fits_70b_at_8_bit_but_not_16_bit() {
        let e = MemoryEstimate::estimate(70.0, Precision::Int8, Workload::Inference, 80.0);
        assert_eq!(e.used_gb, 70.0);
        assert!(!e.overflow);

        let e = MemoryEstimate::estimate(70.0, Precision::Fp16, Workload::Inference, 80.0);
        assert_eq!(e.used_gb, 140.0);
        assert!(e.overflow);
        assert_eq!(e.bar_fraction(), 1.0);
    }

    #[test]
    fn training_applies_four_x_overhead() {
        assert_eq!(weights_gb(8.0, Precision::Fp16, Workload::Training), 64.0);
    }

    #[test]
    fn equality_is_not_overflow() {
        assert!(!is_overflow(80.0, 80.0));
        assert!(is_overflow(80.000_001, 80.0));
    }

    #[test]
    fn kv_footprint_grows_per_token() {
        let a = arch(80, 8192);
        let per_token = kv_gb_per_token(80, 8192, Precision::Int8);
        assert!((per_token - 1_310_720.0 / GIB).abs() < 1e-15);

        let empty = KvFootprint::new(&a, 70.0, Precision::Int8, 0, 80.0);
        assert_eq!(empty.kv_gb, 0.0);
        assert_eq!(empty.total_gb(), 70.0);

        let full = KvFootprint::new(&a, 70.0, Precision::Int8, 540, 80.0);
        assert!((full.kv_gb - per_token * 540.0).abs() < 1e-12);
        assert!(full.total_gb() > empty.total_gb());
        assert!(!full.overflow());
    }

    #[test]
    fn formula_mentions_every_factor() {
        let s = kv_formula(12, &arch(40, 5120), Precision::Fp16);
        assert_eq!(s, "12 × 2 × 40 layers × 5120 hidden × (16/8) B ÷ 1024³");
    }
}

// Jitter sources for the simulations.
//
// Not cryptographically secure. Every simulation takes a `RandomSource` so
// tests can pin the sequence.

/// Uniform randomness consumed by the simulations.
pub trait RandomSource {
    /// Uniform sample in [0, 1).
    fn next_f32_01(&mut self) -> f32;

    #[inline]
    fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.next_f32_01()
    }

    #[inline]
    fn gen_range_usize(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        let span = (high - low) as f32;
        low + ((self.next_f32_01() * span) as usize).min(high - low - 1)
    }

    /// True with probability `p` (clamped to [0, 1]).
    #[inline]
    fn chance(&mut self, p: f32) -> bool {
        self.next_f32_01() < p.clamp(0.0, 1.0)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_f32_01(&mut self) -> f32 {
        (**self).next_f32_01()
    }
}

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // Avoid a zero state.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }
}

impl RandomSource for Prng {
    #[inline]
    fn next_f32_01(&mut self) -> f32 {
        // 24 bits keeps the result strictly below 1.0 in f32.
        let x = self.next_u32() >> 8;
        (x as f32) / ((1u32 << 24) as f32)
    }
}

/// Replays a fixed list of samples, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    samples: Vec<f32>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(samples: Vec<f32>) -> Self {
        let samples = if samples.is_empty() { vec![0.5] } else { samples };
        Self { samples, cursor: 0 }
    }

    /// Always returns `value`.
    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f32_01(&mut self) -> f32 {
        let v = self.samples[self.cursor % self.samples.len()];
        self.cursor = self.cursor.wrapping_add(1);
        v.clamp(0.0, 0.999_999)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prng_is_reproducible_and_in_range() {
        let mut a = Prng::new(42);
        let mut b = Prng::new(42);
        for _ in 0..1000 {
            let x = a.next_f32_01();
            assert_eq!(x, b.next_f32_01());
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn zero_seed_still_produces_noise() {
        let mut r = Prng::new(0);
        let first = r.next_u32();
        assert_ne!(first, r.next_u32());
    }

    #[test]
    fn scripted_source_cycles() {
        let mut r = ScriptedRandom::new(vec![0.1, 0.9]);
        assert!(r.chance(0.5));
        assert!(!r.chance(0.5));
        assert!(r.chance(0.5));
        assert_eq!(r.gen_range_usize(0, 8), 7);
    }

    #[test]
    fn gen_range_usize_stays_in_bounds() {
        let mut r = ScriptedRandom::constant(1.0);
        assert_eq!(r.gen_range_usize(0, 8), 7);
        assert_eq!(r.gen_range_usize(3, 3), 3);
        let mut r = Prng::new(7);
        for _ in 0..500 {
            let v = r.gen_range_usize(2, 5);
            assert!((2..5).contains(&v));
        }
    }
}

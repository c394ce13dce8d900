//! Normal-variate generation via the Box–Muller transform.

use crate::error::{Error, Result};
use rand::Rng;
use std::f64::consts::PI;

/// Source of N(mean, variance) samples.
///
/// Each Box–Muller draw converts two uniform samples into two independent
/// normal samples; the second is cached and returned by the next call
/// without touching the uniform engine.
///
/// The source does not own an engine. The caller passes one into every
/// [`sample`](Self::sample) call, so tests can inject a seeded `StdRng` and
/// deterministic replay is a property of that engine's sequence alone. A
/// single engine shared across threads needs external synchronization; the
/// source itself holds no shared state.
#[derive(Debug, Clone)]
pub struct NormalSource {
    mean: f64,
    std_dev: f64,
    spare: Option<f64>,
}

impl NormalSource {
    /// Create a source with the given mean and variance.
    pub fn new(mean: f64, variance: f64) -> Result<Self> {
        if !variance.is_finite() || variance < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "variance must be finite and non-negative, got {}",
                variance
            )));
        }
        Ok(Self {
            mean,
            std_dev: variance.sqrt(),
            spare: None,
        })
    }

    /// Draw the next normal sample.
    pub fn sample<R: Rng>(&mut self, rng: &mut R) -> f64 {
        if let Some(value) = self.spare.take() {
            return value;
        }

        // The engine yields [0, 1); remap to (0, 1] so ln() never sees zero.
        let u1 = 1.0 - rng.gen::<f64>();
        let u2 = 1.0 - rng.gen::<f64>();
        debug_assert!(u1 > 0.0 && u1 <= 1.0);

        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;
        let z0 = radius * theta.cos();
        let z1 = radius * theta.sin();

        self.spare = Some(z1 * self.std_dev + self.mean);
        z0 * self.std_dev + self.mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_negative_variance_rejected() {
        let result = NormalSource::new(0.0, -1.0);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
        assert!(matches!(
            NormalSource::new(0.0, f64::NAN),
            Err(Error::InvalidParameter(_))
        ));
        assert!(NormalSource::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_pair_from_single_draw() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut source = NormalSource::new(0.0, 1.0).unwrap();
        let first = source.sample(&mut rng);
        let second = source.sample(&mut rng);

        // Recompute both values from the same uniform sequence.
        let mut replay = StdRng::seed_from_u64(11);
        let u1 = 1.0 - replay.gen::<f64>();
        let u2 = 1.0 - replay.gen::<f64>();
        let radius = (-2.0 * u1.ln()).sqrt();
        let expected_first = radius * (2.0 * PI * u2).cos();
        let expected_second = radius * (2.0 * PI * u2).sin();

        assert_eq!(first, expected_first);
        assert_eq!(second, expected_second);
        assert_ne!(first, second);
    }

    #[test]
    fn test_cached_sample_skips_engine() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut source = NormalSource::new(0.0, 1.0).unwrap();
        source.sample(&mut rng);

        // The second value comes from the cache, so the engine passed here
        // must not matter.
        let mut other = StdRng::seed_from_u64(99);
        let cached = source.sample(&mut other);

        let mut replay = StdRng::seed_from_u64(3);
        let u1 = 1.0 - replay.gen::<f64>();
        let u2 = 1.0 - replay.gen::<f64>();
        let expected = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).sin();
        assert_eq!(cached, expected);
    }

    #[test]
    fn test_replay_reproduces_sequence() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let mut source_a = NormalSource::new(2.0, 0.25).unwrap();
        let mut source_b = NormalSource::new(2.0, 0.25).unwrap();

        for _ in 0..16 {
            assert_eq!(source_a.sample(&mut a), source_b.sample(&mut b));
        }
    }

    #[test]
    fn test_mean_and_spread() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut source = NormalSource::new(5.0, 4.0).unwrap();
        let samples: Vec<f64> = (0..20_000).map(|_| source.sample(&mut rng)).collect();

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        assert!((mean - 5.0).abs() < 0.1, "sample mean {}", mean);
        assert!((variance - 4.0).abs() < 0.3, "sample variance {}", variance);
    }
}

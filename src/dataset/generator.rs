//! Deterministic synthetic event generator
//!
//! A batch is a pure function of `(seed, n)`: every call re-seeds a ChaCha8
//! stream and draws columns in a fixed order (all timestamps, then user ids,
//! then event types, then values), so two runs with the same inputs produce
//! bit-identical batches on any platform.

use std::ops::Range;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use tracing::debug;

use super::schema::EventBatch;
use crate::utils::{BenchmarkError, Result};

/// Number of distinct metadata templates cycled through a batch
pub const METADATA_POOL_SIZE: usize = 1000;

/// Exclusive upper bound for timestamps
pub const TIMESTAMP_UPPER: u64 = 1_000_000_000;

/// User id domain
pub const USER_ID_RANGE: Range<u16> = 100..9999;

/// Number of event types (the grouping key domain is `0..EVENT_TYPE_COUNT`)
pub const EVENT_TYPE_COUNT: u8 = 4;

/// Default metadata templates: `{"info": "test_<i>"}`
pub fn default_metadata_pool() -> Vec<String> {
    (0..METADATA_POOL_SIZE)
        .map(|i| format!("{{\"info\": \"test_{}\"}}", i))
        .collect()
}

/// Seeded batch generator
#[derive(Debug, Clone)]
pub struct DataGenerator {
    seed: u64,
    pool: Vec<String>,
}

impl DataGenerator {
    /// Create a generator with the default metadata pool
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            pool: default_metadata_pool(),
        }
    }

    /// Replace the metadata pool. Rows cycle through it by index.
    pub fn with_metadata_pool(mut self, pool: Vec<String>) -> Result<Self> {
        if pool.is_empty() {
            return Err(BenchmarkError::Config(
                "metadata pool must contain at least one entry".to_string(),
            ));
        }
        self.pool = pool;
        Ok(self)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate `n` rows. `n == 0` yields an empty batch.
    pub fn generate(&self, n: usize) -> EventBatch {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let event_id: Vec<u64> = (0..n as u64).collect();

        let mut timestamp: Vec<u64> = (0..n)
            .map(|_| rng.random_range(0..TIMESTAMP_UPPER))
            .collect();
        timestamp.sort_unstable();

        let user_id: Vec<u16> = (0..n).map(|_| rng.random_range(USER_ID_RANGE)).collect();
        let event_type: Vec<u8> = (0..n)
            .map(|_| rng.random_range(0..EVENT_TYPE_COUNT))
            .collect();
        let value: Vec<f64> = (0..n).map(|_| rng.sample::<f64, _>(StandardNormal)).collect();

        let metadata: Vec<String> = (0..n)
            .map(|i| self.pool[i % self.pool.len()].clone())
            .collect();

        debug!(seed = self.seed, rows = n, "generated batch");

        EventBatch::from_columns(event_id, timestamp, user_id, event_type, value, metadata)
    }
}

/// Generate a batch of `n` rows from `seed` with the default pool
pub fn generate(seed: u64, n: usize) -> EventBatch {
    DataGenerator::new(seed).generate(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::schema::MAX_METADATA_LEN;

    #[test]
    fn test_deterministic() {
        for n in [0usize, 1, 7, 1000, 2500] {
            let a = generate(42, n);
            let b = generate(42, n);
            assert!(a.bit_eq(&b), "batches differ for n={}", n);
        }
    }

    #[test]
    fn test_seed_changes_output() {
        let a = generate(1, 500);
        let b = generate(2, 500);
        assert_ne!(a.timestamps(), b.timestamps());
    }

    #[test]
    fn test_domains_and_ordering() {
        let batch = generate(7, 5000);
        assert_eq!(batch.len(), 5000);
        assert!(batch.timestamps().windows(2).all(|w| w[0] <= w[1]));
        assert!(batch.timestamps().iter().all(|&t| t < TIMESTAMP_UPPER));
        assert!(batch.event_types().iter().all(|&t| t < EVENT_TYPE_COUNT));
        assert!(batch
            .user_ids()
            .iter()
            .all(|u| USER_ID_RANGE.contains(u)));
        assert!(batch
            .metadata()
            .iter()
            .all(|m| m.len() <= MAX_METADATA_LEN));
        assert_eq!(batch.event_ids(), (0..5000u64).collect::<Vec<_>>().as_slice());
    }

    #[test]
    fn test_metadata_cycles() {
        let batch = generate(3, 2001);
        let meta = batch.metadata();
        assert_eq!(meta[0], "{\"info\": \"test_0\"}");
        assert_eq!(meta[999], "{\"info\": \"test_999\"}");
        assert_eq!(meta[1000], meta[0]);
        assert_eq!(meta[2000], meta[0]);
    }

    #[test]
    fn test_values_look_standard_normal() {
        let batch = generate(11, 20_000);
        let n = batch.len() as f64;
        let mean = batch.values().iter().sum::<f64>() / n;
        let var = batch
            .values()
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / n;
        assert!(mean.abs() < 0.05, "mean {}", mean);
        assert!((var - 1.0).abs() < 0.05, "variance {}", var);
    }

    #[test]
    fn test_custom_pool() {
        let generator = DataGenerator::new(5)
            .with_metadata_pool(vec!["x".to_string(), "y".to_string()])
            .unwrap();
        let batch = generator.generate(5);
        assert_eq!(batch.metadata(), &["x", "y", "x", "y", "x"]);
        // Pool does not affect the numeric columns
        assert_eq!(batch.values(), generate(5, 5).values());
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert!(DataGenerator::new(1).with_metadata_pool(Vec::new()).is_err());
    }
}

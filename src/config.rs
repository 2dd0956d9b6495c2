//! Options for a fuzzing run.

use crate::source::UniformValueSource;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Options shared by the generators of one fuzzing run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FuzzerOptions {
    /// Seed for reproducibility (None = random).
    pub seed: Option<u64>,

    /// Rows per generated batch.
    pub batch_size: usize,

    /// Fraction of unconstrained values that are null (0.0-1.0).
    pub null_ratio: f64,

    /// Upper bound on array, map and string lengths.
    pub max_container_len: usize,
}

impl Default for FuzzerOptions {
    fn default() -> Self {
        Self {
            seed: None,
            batch_size: 100,
            null_ratio: 0.1,
            max_container_len: 10,
        }
    }
}

impl FuzzerOptions {
    /// Small, deterministic options for fast tests.
    pub fn minimal() -> Self {
        Self {
            seed: Some(42),
            batch_size: 10,
            null_ratio: 0.0,
            max_container_len: 3,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_random_seed(mut self) -> Self {
        self.seed = None;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_null_ratio(mut self, ratio: f64) -> Self {
        self.null_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_container_len(mut self, len: usize) -> Self {
        self.max_container_len = len;
        self
    }

    /// The configured seed, or a fresh random one.
    ///
    /// Log the returned seed so a failing run can be replayed.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    /// A random stream seeded from [`resolve_seed`](Self::resolve_seed).
    pub fn rng(&self) -> SmallRng {
        let seed = self.resolve_seed();
        tracing::debug!(seed, "seeding fuzzer");
        SmallRng::seed_from_u64(seed)
    }

    pub fn value_source(&self) -> UniformValueSource {
        UniformValueSource::new(self.batch_size)
            .with_null_ratio(self.null_ratio)
            .with_max_container_len(self.max_container_len)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

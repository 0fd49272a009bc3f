//! Distance threshold estimation from sampled near-neighbor gaps.
//!
//! When no explicit tau is supplied, the pipeline samples points and takes
//! the median of their second-nearest-neighbor distances (the nearest
//! neighbor of a stored point is typically the point itself). The median of
//! near-neighbor gaps approximates a natural clustering granularity and is
//! robust to outliers.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::config::DEFAULT_SAMPLE_SIZE;
use crate::error::{ClusterError, ClusterResult};
use crate::index::NeighborIndex;

/// Estimates tau as the median second-nearest-neighbor distance of a random
/// sample. Deterministic for a fixed seed.
#[derive(Debug, Clone)]
pub struct ThresholdEstimator {
    sample_size: usize,
    seed: u64,
}

impl Default for ThresholdEstimator {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: 0,
        }
    }
}

impl ThresholdEstimator {
    /// Create an estimator sampling `sample_size` points with the given
    /// seed. The sample size is silently clamped to the population at
    /// estimation time; requesting fewer points than asked is not an error.
    pub fn new(sample_size: usize, seed: u64) -> Self {
        Self { sample_size, seed }
    }

    /// Estimate tau over the indexed population.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidParameter` if the sample size is 0 or
    /// the population holds fewer than two points (no second neighbor
    /// exists).
    pub fn estimate(&self, index: &dyn NeighborIndex) -> ClusterResult<f32> {
        if self.sample_size == 0 {
            return Err(ClusterError::invalid_parameter(
                "estimation sample size must be > 0",
            ));
        }
        let population = index.len();
        if population < 2 {
            return Err(ClusterError::invalid_parameter(format!(
                "population of {population} is too small to estimate tau"
            )));
        }

        let sample_size = self.sample_size.min(population);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let sampled = rand::seq::index::sample(&mut rng, population, sample_size);

        let mut gaps: Vec<f32> = Vec::with_capacity(sample_size);
        for i in sampled {
            let neighbors = index.query_k_nearest(index.vector(i), 2);
            // [0] is the point itself at distance zero
            gaps.push(neighbors[1].1);
        }

        let tau = median(&mut gaps);
        info!(tau, sample_size, population, "estimated distance threshold");
        Ok(tau)
    }
}

/// Median of the slice; mean of the two middle values for even lengths.
fn median(values: &mut [f32]) -> f32 {
    values.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

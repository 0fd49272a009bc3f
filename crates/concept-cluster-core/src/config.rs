//! Run configuration for the leaders clustering pipeline.
//!
//! Command-line parsing lives in the CLI crate; the core receives an explicit
//! validated configuration value and keeps no process-wide state.

use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, ClusterResult};

/// Default sample size for threshold estimation.
pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

/// Nearest-neighbor search strategy for the clique-building pass.
///
/// The two modes are genuinely different algorithms, not two speeds of the
/// same one: exact mode assigns each point first-fit against moving clique
/// centroids, approximate mode carves a fixed window around each unconsumed
/// leader. They can produce different clusterings on the same input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SearchMode {
    /// First-fit scan against existing clique centroids. O(cliques) per
    /// point; intended for small populations.
    #[default]
    Exact,
    /// Leader-fixed adaptive windows over a prebuilt spatial index.
    Approximate,
}

/// Configuration for a leaders clustering run.
///
/// # Validation
///
/// Values are NOT clamped on construction - call [`LeadersConfig::validate`]
/// before handing the config to the pipeline. The pipeline validates on
/// entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadersConfig {
    /// Target number of final clusters (K). Must be > 0 and at most the
    /// number of cliques the greedy pass produces.
    pub clusters: usize,

    /// Distance threshold tau controlling clique granularity. Estimated from
    /// a sample when absent. Must be > 0 and finite when present.
    pub tau: Option<f32>,

    /// Clique-building strategy.
    pub mode: SearchMode,

    /// Optional prefix fraction of the input to process, in (0, 1].
    pub subsample: Option<f32>,

    /// Sample size for threshold estimation. Silently clamped to the
    /// population size at estimation time.
    pub sample_size: usize,

    /// Seed for the estimation sample. Fixed seed makes the estimate
    /// deterministic.
    pub seed: u64,
}

impl Default for LeadersConfig {
    fn default() -> Self {
        Self {
            clusters: 10,
            tau: None,
            mode: SearchMode::Exact,
            subsample: None,
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: 0,
        }
    }
}

impl LeadersConfig {
    /// Create a configuration targeting `clusters` final clusters.
    pub fn new(clusters: usize) -> Self {
        Self {
            clusters,
            ..Self::default()
        }
    }

    /// Set the distance threshold.
    #[must_use]
    pub fn with_tau(mut self, tau: f32) -> Self {
        self.tau = Some(tau);
        self
    }

    /// Set the search mode.
    #[must_use]
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Restrict processing to a prefix fraction of the input.
    #[must_use]
    pub fn with_subsample(mut self, ratio: f32) -> Self {
        self.subsample = Some(ratio);
        self
    }

    /// Set the threshold-estimation sample size.
    #[must_use]
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Set the threshold-estimation seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidParameter` if:
    /// - `clusters` is 0
    /// - `tau` is present and not a finite positive number
    /// - `subsample` is present and outside (0, 1]
    /// - `sample_size` is 0
    pub fn validate(&self) -> ClusterResult<()> {
        if self.clusters == 0 {
            return Err(ClusterError::invalid_parameter(
                "cluster count must be > 0",
            ));
        }

        if let Some(tau) = self.tau {
            if !(tau > 0.0) || !tau.is_finite() {
                return Err(ClusterError::invalid_parameter(format!(
                    "tau must be a finite positive number, got {tau}"
                )));
            }
        }

        if let Some(ratio) = self.subsample {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(ClusterError::invalid_parameter(format!(
                    "subsample ratio must be in (0, 1], got {ratio}"
                )));
            }
        }

        if self.sample_size == 0 {
            return Err(ClusterError::invalid_parameter(
                "estimation sample size must be > 0",
            ));
        }

        Ok(())
    }
}

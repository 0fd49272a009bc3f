//! First-fit clique formation against moving centroids.

use tracing::debug;

use crate::clique::Clique;
use crate::error::{ClusterError, ClusterResult};
use crate::store::OccurrenceStore;

/// Progress is logged every this many points.
const LOG_EVERY_POINTS: usize = 1000;

/// Exact-mode clique builder.
///
/// Each point is compared against existing cliques in creation order and
/// joins the first one whose centroid lies strictly within tau - the first
/// qualifying clique, not the closest. The tie-break is deliberate and makes
/// the result depend on traversal order; with a fixed store order the pass
/// is deterministic. Every join moves that clique's centroid, so cost grows
/// with the clique count: O(points x cliques) overall, intended for small
/// populations.
#[derive(Debug, Clone)]
pub struct ExactFirstFit {
    tau: f32,
}

impl ExactFirstFit {
    /// Create a builder with distance threshold `tau`.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidParameter` unless tau is a finite
    /// positive number.
    pub fn new(tau: f32) -> ClusterResult<Self> {
        if !(tau > 0.0) || !tau.is_finite() {
            return Err(ClusterError::invalid_parameter(format!(
                "tau must be a finite positive number, got {tau}"
            )));
        }
        Ok(Self { tau })
    }

    /// The configured threshold.
    #[inline]
    pub fn tau(&self) -> f32 {
        self.tau
    }

    /// Partition the store into cliques.
    pub fn build(&self, store: &OccurrenceStore) -> Vec<Clique> {
        let mut cliques: Vec<Clique> = Vec::new();

        for (j, point) in store.points().iter().enumerate() {
            if j > 0 && j % LOG_EVERY_POINTS == 0 {
                debug!(
                    point = j,
                    cliques = cliques.len(),
                    ratio = cliques.len() as f32 / j as f32,
                    "first-fit progress"
                );
            }

            // first qualifying clique in creation order, not the closest
            let found = cliques.iter().position(|c| c.distance_to(point) < self.tau);
            match found {
                Some(idx) => cliques[idx].add(j, point),
                None => cliques.push(Clique::seed(j, point)),
            }
        }

        debug!(
            points = store.len(),
            cliques = cliques.len(),
            "first-fit pass complete"
        );
        cliques
    }
}

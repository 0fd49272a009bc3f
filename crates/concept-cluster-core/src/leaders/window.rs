//! Leader-fixed clique formation over adaptive neighbor windows.

use tracing::debug;

use crate::clique::Clique;
use crate::error::{ClusterError, ClusterResult};
use crate::index::{neighbors_within, NeighborIndex};
use crate::store::OccurrenceStore;

/// Progress is logged every this many cliques.
const LOG_EVERY_CLIQUES: usize = 100;

/// Approximate-mode clique builder.
///
/// Maintains a used-mask over the store. Each still-unused point, met in
/// store order, becomes the leader of a new clique; the clique's membership
/// is the leader's adaptive neighbor window (every unused index within tau
/// of the *leader's own vector*), consumed in one shot. Used neighbors are
/// skipped without affecting the window. Unlike the first-fit pass, a
/// clique here is never revisited after formation.
#[derive(Debug, Clone)]
pub struct LeaderWindow {
    tau: f32,
}

impl LeaderWindow {
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

    /// Partition the store into cliques using `index` for neighbor lookups.
    ///
    /// The index is expected to be built over exactly the store's points;
    /// the used-mask guarantees the result is a partition regardless of
    /// approximation error in the returned windows.
    pub fn build(&self, store: &OccurrenceStore, index: &dyn NeighborIndex) -> Vec<Clique> {
        let n = store.len();
        let mut used = vec![false; n];
        let mut consumed = 0usize;
        let mut cliques: Vec<Clique> = Vec::new();

        for i in 0..n {
            if used[i] {
                continue;
            }

            let window = neighbors_within(index, store.point(i), self.tau);

            let mut clique = Clique::seed(i, store.point(i));
            used[i] = true;
            consumed += 1;

            for &(neighbor, _) in &window {
                if used[neighbor] {
                    continue;
                }
                clique.add(neighbor, store.point(neighbor));
                used[neighbor] = true;
                consumed += 1;
            }

            cliques.push(clique);
            if cliques.len() % LOG_EVERY_CLIQUES == 0 {
                debug!(
                    cliques = cliques.len(),
                    consumed,
                    total = n,
                    "leader-window progress"
                );
            }
        }

        debug!(
            points = n,
            cliques = cliques.len(),
            "leader-window pass complete"
        );
        cliques
    }
}

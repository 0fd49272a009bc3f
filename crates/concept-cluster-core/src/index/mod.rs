//! Pluggable nearest-neighbor search over the vector set.
//!
//! Two interchangeable strategies sit behind [`NeighborIndex`]:
//!
//! - [`ExactIndex`] - no prebuilt structure, O(n) linear scan per query
//! - [`HnswIndex`] - a spatial index built once over all points, with
//!   optional persistence to amortize rebuild cost across runs
//!
//! The clique-building pass never depends on a specific backend; it sees the
//! trait plus the adaptive-window query [`neighbors_within`].

use std::path::Path;

use crate::error::ClusterResult;

mod exact;
mod hnsw;

pub use exact::ExactIndex;
pub use hnsw::HnswIndex;

/// Initial requested neighbor count for the adaptive-window protocol.
pub const INITIAL_WINDOW: usize = 100;

/// Nearest-neighbor search over a fixed point set.
///
/// Queries return `(point index, Euclidean distance)` pairs sorted by
/// ascending distance, ties broken by ascending index. A query vector that
/// is itself a stored point returns that point at distance zero.
pub trait NeighborIndex {
    /// Build the index over the given points.
    fn build(points: &[Vec<f32>]) -> ClusterResult<Self>
    where
        Self: Sized;

    /// Reload a previously persisted index artifact.
    ///
    /// The artifact is an external cache keyed by dataset identity; whether
    /// it actually matches the current dataset is the caller's
    /// responsibility.
    fn load(path: &Path) -> ClusterResult<Self>
    where
        Self: Sized;

    /// Number of indexed points.
    fn len(&self) -> usize;

    /// Whether the index holds no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension of the indexed vectors.
    fn dim(&self) -> usize;

    /// The stored vector at `index`. Supports query-by-item callers such as
    /// threshold estimation.
    fn vector(&self, index: usize) -> &[f32];

    /// The `k` nearest stored points to `query`, sorted by ascending
    /// distance. Returns fewer than `k` pairs only when the index holds
    /// fewer than `k` points.
    fn query_k_nearest(&self, query: &[f32], k: usize) -> Vec<(usize, f32)>;

    /// Persist the index to disk for reuse by a later run.
    fn persist(&self, path: &Path) -> ClusterResult<()>;
}

/// All neighbors of `query` within distance `tau`, via the adaptive-window
/// protocol.
///
/// Starts by requesting [`INITIAL_WINDOW`] neighbors; while the farthest
/// returned distance is still within `tau`, doubles the request and queries
/// again, clamping at the population size. Once the result contains a
/// distance exceeding `tau` (or the whole population has been fetched), the
/// window is cut at the smallest index whose distance exceeds `tau`: every
/// returned pair is within `tau`, and the first excluded neighbor (when one
/// exists) is beyond it.
pub fn neighbors_within(
    index: &dyn NeighborIndex,
    query: &[f32],
    tau: f32,
) -> Vec<(usize, f32)> {
    let n = index.len();
    if n == 0 {
        return Vec::new();
    }

    let mut k = INITIAL_WINDOW.min(n);
    loop {
        let neighbors = index.query_k_nearest(query, k);
        let exhausted = k >= n;
        let saw_cutoff = neighbors.last().map_or(true, |&(_, d)| d > tau);

        if saw_cutoff || exhausted {
            let cutoff = neighbors
                .iter()
                .position(|&(_, d)| d > tau)
                .unwrap_or(neighbors.len());
            let mut window = neighbors;
            window.truncate(cutoff);
            return window;
        }

        k = (k * 2).min(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1-D points at integer coordinates 0..n.
    fn line(n: usize) -> Vec<Vec<f32>> {
        (0..n).map(|i| vec![i as f32]).collect()
    }

    #[test]
    fn window_respects_cutoff() {
        let index = ExactIndex::build(&line(10)).unwrap();
        let window = neighbors_within(&index, &[0.0], 3.5);

        let indices: Vec<usize> = window.iter().map(|&(i, _)| i).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(window.iter().all(|&(_, d)| d <= 3.5));

        // the first excluded neighbor is beyond tau
        let all = index.query_k_nearest(&[0.0], 10);
        assert!(all[window.len()].1 > 3.5);
    }

    #[test]
    fn window_doubles_past_initial_request() {
        // 200 points force at least one doubling of the initial 100.
        let index = ExactIndex::build(&line(200)).unwrap();
        let window = neighbors_within(&index, &[0.0], 150.5);
        assert_eq!(window.len(), 151);
        assert!(window.iter().all(|&(_, d)| d <= 150.5));
    }

    #[test]
    fn window_covers_population_when_all_within_tau() {
        let index = ExactIndex::build(&line(200)).unwrap();
        let window = neighbors_within(&index, &[0.0], 1e6);
        assert_eq!(window.len(), 200);
    }

    #[test]
    fn window_on_empty_index_is_empty() {
        let index = ExactIndex::build(&[]).unwrap();
        assert!(neighbors_within(&index, &[0.0], 1.0).is_empty());
    }

    #[test]
    fn window_may_hold_only_the_query_point() {
        let index = ExactIndex::build(&line(5)).unwrap();
        let window = neighbors_within(&index, &[0.0], 0.5);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].0, 0);
    }
}

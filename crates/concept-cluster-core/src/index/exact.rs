//! Exact nearest-neighbor search by linear scan.

use std::cmp::Ordering;
use std::path::Path;

use crate::distance::euclidean;
use crate::error::{ClusterError, ClusterResult};

use super::NeighborIndex;

/// Brute-force backend: every query scans the whole point set.
///
/// No prebuilt structure and nothing to persist; intended for small
/// populations and for threshold estimation when no spatial index exists.
#[derive(Debug, Clone)]
pub struct ExactIndex {
    dim: usize,
    points: Vec<Vec<f32>>,
}

impl NeighborIndex for ExactIndex {
    fn build(points: &[Vec<f32>]) -> ClusterResult<Self> {
        let dim = points.first().map_or(0, Vec::len);
        for (row, point) in points.iter().enumerate() {
            if point.len() != dim {
                return Err(ClusterError::DimensionMismatch {
                    row,
                    expected: dim,
                    actual: point.len(),
                });
            }
        }
        Ok(Self {
            dim,
            points: points.to_vec(),
        })
    }

    fn load(_path: &Path) -> ClusterResult<Self> {
        Err(ClusterError::invalid_parameter(
            "exact index has no persisted form; rebuild it from the point set",
        ))
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn vector(&self, index: usize) -> &[f32] {
        &self.points[index]
    }

    fn query_k_nearest(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, euclidean(query, p)))
            .collect();
        scored.sort_unstable_by(|a, b| match a.1.partial_cmp(&b.1) {
            Some(Ordering::Equal) | None => a.0.cmp(&b.0),
            Some(order) => order,
        });
        scored.truncate(k);
        scored
    }

    fn persist(&self, _path: &Path) -> ClusterResult<()> {
        Err(ClusterError::invalid_parameter(
            "exact index has no persisted form",
        ))
    }
}

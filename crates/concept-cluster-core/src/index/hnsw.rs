//! Approximate nearest-neighbor search backed by an HNSW graph.
//!
//! Built once over all points at ~O(n log n) cost, then queried per leader
//! during the approximate clique pass. The graph itself is not serialized;
//! persistence stores the vectors and rebuilds the graph by re-insertion on
//! load, so an artifact is self-contained.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use hnsw_rs::hnsw::Hnsw;
use hnsw_rs::prelude::*;
use tracing::{debug, info};

use crate::error::{ClusterError, ClusterResult};

use super::NeighborIndex;

/// Maximum connections per node in the HNSW graph.
const MAX_NB_CONNECTION: usize = 16;
/// Construction-time candidate list width.
const EF_CONSTRUCTION: usize = 200;
/// Maximum graph layer count.
const MAX_LAYER: usize = 16;
/// Search-time candidate list floor; raised to k for large queries.
const EF_SEARCH: usize = 64;

/// HNSW-backed approximate index over the occurrence vectors.
pub struct HnswIndex {
    graph: Hnsw<'static, f32, DistL2>,
    vectors: Vec<Vec<f32>>,
    dim: usize,
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("points", &self.vectors.len())
            .field("dim", &self.dim)
            .finish()
    }
}

impl NeighborIndex for HnswIndex {
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

        let graph = Hnsw::<f32, DistL2>::new(
            MAX_NB_CONNECTION,
            points.len().max(1),
            MAX_LAYER,
            EF_CONSTRUCTION,
            DistL2 {},
        );
        for (i, point) in points.iter().enumerate() {
            graph.insert_slice((point.as_slice(), i));
        }

        info!(points = points.len(), dim, "built hnsw index");
        Ok(Self {
            graph,
            vectors: points.to_vec(),
            dim,
        })
    }

    /// Reload an index artifact written by [`HnswIndex::persist`].
    ///
    /// Only decodability and internal dimension consistency are checked:
    /// whether the artifact was built from the dataset now being clustered
    /// is the caller's responsibility.
    fn load(path: &Path) -> ClusterResult<Self> {
        let file = File::open(path)
            .map_err(|e| ClusterError::io(format!("opening index artifact {path:?}"), e))?;
        let reader = BufReader::new(file);
        let (dim, vectors): (usize, Vec<Vec<f32>>) = bincode::deserialize_from(reader)
            .map_err(|e| ClusterError::serialization("decoding index artifact", e))?;

        let index = Self::build(&vectors)?;
        if index.dim != dim {
            return Err(ClusterError::serialization(
                "decoding index artifact",
                format!(
                    "recorded dimension {dim} disagrees with vector dimension {}",
                    index.dim
                ),
            ));
        }

        info!(points = index.vectors.len(), dim, "reloaded hnsw index");
        Ok(index)
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn vector(&self, index: usize) -> &[f32] {
        &self.vectors[index]
    }

    fn query_k_nearest(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if self.vectors.is_empty() || k == 0 {
            return Vec::new();
        }

        let k = k.min(self.vectors.len());
        let ef = EF_SEARCH.max(k);
        let mut neighbors: Vec<(usize, f32)> = self
            .graph
            .search(query, k, ef)
            .into_iter()
            .map(|n| (n.d_id, n.distance))
            .collect();
        neighbors.sort_unstable_by(|a, b| match a.1.partial_cmp(&b.1) {
            Some(Ordering::Equal) | None => a.0.cmp(&b.0),
            Some(order) => order,
        });

        debug!(k, returned = neighbors.len(), "hnsw query");
        neighbors
    }

    fn persist(&self, path: &Path) -> ClusterResult<()> {
        let file = File::create(path)
            .map_err(|e| ClusterError::io(format!("creating index artifact {path:?}"), e))?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, &(self.dim, &self.vectors))
            .map_err(|e| ClusterError::serialization("encoding index artifact", e))?;

        info!(points = self.vectors.len(), path = ?path, "persisted hnsw index");
        Ok(())
    }
}

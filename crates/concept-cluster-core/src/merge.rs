//! Hierarchical agglomeration of clique centroids into K final clusters.
//!
//! # Algorithm
//!
//! Classic bottom-up agglomeration with Ward linkage over Euclidean
//! distance:
//!
//! 1. Start with every centroid as its own group
//! 2. Repeatedly merge the pair of groups with the smallest Ward
//!    dissimilarity, updating the remaining dissimilarities through the
//!    Lance-Williams recurrence
//! 3. Stop when exactly K groups remain
//!
//! Deterministic given centroid order: equal dissimilarities break toward
//! the lexicographically smallest active pair, and final cluster ids are
//! assigned 0..K in order of first appearance over the input order. The
//! recurrence runs on squared Euclidean dissimilarities; recorded step
//! values share that internal scale.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::distance::euclidean_sq;
use crate::error::{ClusterError, ClusterResult};

/// One agglomeration step: `right` was folded into `left`.
///
/// `left`/`right` are representative centroid indices at merge time;
/// `size` is the merged group's member count afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeStep {
    /// Surviving group representative
    pub left: usize,
    /// Absorbed group representative
    pub right: usize,
    /// Ward dissimilarity at which the merge happened
    pub dissimilarity: f32,
    /// Size of the merged group
    pub size: usize,
}

/// The merge-phase model: per-clique final-cluster assignments plus the
/// merge history. Serializable as the optional intermediate artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeModel {
    assignments: Vec<usize>,
    clusters: usize,
    steps: Vec<MergeStep>,
}

impl MergeModel {
    /// Final cluster id for each input centroid, in input order. Ids are
    /// 0..num_clusters, assigned in order of first appearance.
    #[inline]
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// Number of final clusters (K).
    #[inline]
    pub fn num_clusters(&self) -> usize {
        self.clusters
    }

    /// Number of input centroids.
    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.assignments.len()
    }

    /// The agglomeration history, in merge order.
    #[inline]
    pub fn steps(&self) -> &[MergeStep] {
        &self.steps
    }

    /// Serialize the model to disk.
    pub fn save(&self, path: &Path) -> ClusterResult<()> {
        let file = File::create(path)
            .map_err(|e| ClusterError::io(format!("creating merge model {path:?}"), e))?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, self)
            .map_err(|e| ClusterError::serialization("encoding merge model", e))?;
        info!(path = ?path, "saved merge model");
        Ok(())
    }

    /// Reload a model written by [`MergeModel::save`].
    pub fn load(path: &Path) -> ClusterResult<Self> {
        let file = File::open(path)
            .map_err(|e| ClusterError::io(format!("opening merge model {path:?}"), e))?;
        let reader = BufReader::new(file);
        bincode::deserialize_from(reader)
            .map_err(|e| ClusterError::serialization("decoding merge model", e))
    }
}

/// Strategy interface for the merge phase, so the pipeline never depends on
/// a specific backend.
pub trait HierarchicalMerger {
    /// Group `centroids` into exactly `clusters` final clusters.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidParameter` if `clusters` is 0 or
    /// exceeds the centroid count.
    fn merge(&self, centroids: &[Vec<f32>], clusters: usize) -> ClusterResult<MergeModel>;
}

/// Ward-linkage agglomerative merger.
#[derive(Debug, Clone, Copy, Default)]
pub struct WardMerger;

impl WardMerger {
    /// Create a merger.
    pub fn new() -> Self {
        Self
    }
}

impl HierarchicalMerger for WardMerger {
    fn merge(&self, centroids: &[Vec<f32>], clusters: usize) -> ClusterResult<MergeModel> {
        let n = centroids.len();
        if clusters == 0 {
            return Err(ClusterError::invalid_parameter(
                "cluster count must be > 0",
            ));
        }
        if clusters > n {
            return Err(ClusterError::invalid_parameter(format!(
                "target cluster count ({clusters}) exceeds centroid count ({n})"
            )));
        }
        let dim = centroids[0].len();
        for (row, centroid) in centroids.iter().enumerate() {
            if centroid.len() != dim {
                return Err(ClusterError::DimensionMismatch {
                    row,
                    expected: dim,
                    actual: centroid.len(),
                });
            }
        }

        // Pairwise squared Euclidean dissimilarities; Ward initial state.
        let mut dist = vec![vec![0.0f32; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = euclidean_sq(&centroids[i], &centroids[j]);
                dist[i][j] = d;
                dist[j][i] = d;
            }
        }

        let mut size = vec![1usize; n];
        let mut alive = vec![true; n];
        // leaf -> current group representative
        let mut labels: Vec<usize> = (0..n).collect();
        let mut steps: Vec<MergeStep> = Vec::with_capacity(n - clusters);

        for _ in 0..(n - clusters) {
            // Closest alive pair; ascending scan keeps ties on the smallest
            // (i, j).
            let mut best: Option<(usize, usize, f32)> = None;
            for i in 0..n {
                if !alive[i] {
                    continue;
                }
                for j in (i + 1)..n {
                    if !alive[j] {
                        continue;
                    }
                    if best.map_or(true, |(_, _, bd)| dist[i][j] < bd) {
                        best = Some((i, j, dist[i][j]));
                    }
                }
            }
            let Some((i, j, d)) = best else {
                break;
            };

            // Lance-Williams update for Ward linkage:
            // d(i∪j, m) = ((s_i+s_m)·d(i,m) + (s_j+s_m)·d(j,m) - s_m·d(i,j))
            //             / (s_i+s_j+s_m)
            for m in 0..n {
                if !alive[m] || m == i || m == j {
                    continue;
                }
                let (si, sj, sm) = (size[i] as f32, size[j] as f32, size[m] as f32);
                let updated =
                    ((si + sm) * dist[i][m] + (sj + sm) * dist[j][m] - sm * d) / (si + sj + sm);
                dist[i][m] = updated;
                dist[m][i] = updated;
            }

            size[i] += size[j];
            alive[j] = false;
            for label in labels.iter_mut() {
                if *label == j {
                    *label = i;
                }
            }
            steps.push(MergeStep {
                left: i,
                right: j,
                dissimilarity: d,
                size: size[i],
            });
            debug!(left = i, right = j, dissimilarity = d, "merged groups");
        }

        // Compact representatives to 0..clusters by first appearance.
        let mut compact = vec![usize::MAX; n];
        let mut next = 0usize;
        let mut assignments = Vec::with_capacity(n);
        for leaf in 0..n {
            let rep = labels[leaf];
            if compact[rep] == usize::MAX {
                compact[rep] = next;
                next += 1;
            }
            assignments.push(compact[rep]);
        }
        debug_assert_eq!(next, clusters);

        info!(
            centroids = n,
            clusters,
            merges = steps.len(),
            "agglomerative merge complete"
        );
        Ok(MergeModel {
            assignments,
            clusters,
            steps,
        })
    }
}

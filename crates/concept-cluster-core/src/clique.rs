//! Clique: a group of points anchored on a leader.
//!
//! A clique is created the moment a point fails to join any existing clique
//! (exact mode) or is selected as an unconsumed seed (approximate mode). Its
//! centroid is the running arithmetic mean of all member vectors, updated
//! incrementally on every add - never recomputed from scratch - and the
//! member list is append-only. The clique is discarded once its centroid has
//! been handed to the merge phase.

use crate::distance::euclidean;

/// One step of the incremental mean: fold `point` into a centroid currently
/// averaging `count` members.
///
/// Pure transition on owned state; [`Clique::add`] is its only caller in the
/// clustering pass, but keeping it free-standing keeps the arithmetic
/// independently checkable.
pub fn advance_mean(centroid: &[f32], count: usize, point: &[f32]) -> Vec<f32> {
    debug_assert_eq!(centroid.len(), point.len());
    let n = count as f32;
    centroid
        .iter()
        .zip(point.iter())
        .map(|(c, p)| (c * n + p) / (n + 1.0))
        .collect()
}

/// A leader-anchored group of occurrence indices with a running mean
/// centroid.
#[derive(Debug, Clone)]
pub struct Clique {
    leader: usize,
    centroid: Vec<f32>,
    members: Vec<usize>,
}

impl Clique {
    /// Create a clique from its leader. The centroid starts as the leader's
    /// raw vector.
    pub fn seed(leader: usize, point: &[f32]) -> Self {
        Self {
            leader,
            centroid: point.to_vec(),
            members: vec![leader],
        }
    }

    /// Add a follower and fold its vector into the centroid.
    pub fn add(&mut self, index: usize, point: &[f32]) {
        self.centroid = advance_mean(&self.centroid, self.members.len(), point);
        self.members.push(index);
    }

    /// Euclidean distance from `point` to the current centroid.
    #[inline]
    pub fn distance_to(&self, point: &[f32]) -> f32 {
        euclidean(point, &self.centroid)
    }

    /// The index that established this clique.
    #[inline]
    pub fn leader(&self) -> usize {
        self.leader
    }

    /// Current centroid.
    #[inline]
    pub fn centroid(&self) -> &[f32] {
        &self.centroid
    }

    /// Member indices in insertion order (leader first).
    #[inline]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// A clique always holds at least its leader.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

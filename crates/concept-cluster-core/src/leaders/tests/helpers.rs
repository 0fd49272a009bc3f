//! Shared fixtures for clique-building tests.

use crate::clique::Clique;
use crate::store::OccurrenceStore;

/// Store over the given points with synthetic single-letter-ish vocab.
pub fn store_from(points: Vec<Vec<f32>>) -> OccurrenceStore {
    let vocab = (0..points.len()).map(|i| format!("w{i}")).collect();
    OccurrenceStore::from_parts(points, vocab).unwrap()
}

/// 1-D store with points at integer coordinates 0..n.
pub fn line_store(n: usize) -> OccurrenceStore {
    store_from((0..n).map(|i| vec![i as f32]).collect())
}

/// 2-D store with three well-separated blobs of `per_blob` points each,
/// jittered deterministically.
pub fn blob_store(per_blob: usize) -> OccurrenceStore {
    let centers = [[0.0f32, 0.0], [20.0, 0.0], [0.0, 20.0]];
    let mut points = Vec::with_capacity(3 * per_blob);
    for (b, center) in centers.iter().enumerate() {
        for i in 0..per_blob {
            // deterministic jitter in [-0.4, 0.4]
            let dx = ((i * 7 + b * 3) % 9) as f32 / 10.0 - 0.4;
            let dy = ((i * 5 + b * 11) % 9) as f32 / 10.0 - 0.4;
            points.push(vec![center[0] + dx, center[1] + dy]);
        }
    }
    store_from(points)
}

/// Assert the cliques cover 0..n exactly once.
pub fn assert_partition(cliques: &[Clique], n: usize) {
    let mut seen = vec![false; n];
    for clique in cliques {
        for &member in clique.members() {
            assert!(member < n, "member {member} out of range");
            assert!(!seen[member], "index {member} assigned twice");
            seen[member] = true;
        }
    }
    let missing: Vec<usize> = (0..n).filter(|&i| !seen[i]).collect();
    assert!(missing.is_empty(), "indices never assigned: {missing:?}");
}

/// Assert every clique's centroid equals the mean of its members' vectors.
pub fn assert_centroids_are_means(cliques: &[Clique], store: &OccurrenceStore) {
    for clique in cliques {
        let dim = store.dim();
        let mut mean = vec![0.0f32; dim];
        for &member in clique.members() {
            for (m, v) in mean.iter_mut().zip(store.point(member)) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= clique.len() as f32;
        }

        for (got, want) in clique.centroid().iter().zip(mean.iter()) {
            assert!(
                (got - want).abs() < 1e-4,
                "clique led by {} has centroid drift: {got} vs {want}",
                clique.leader()
            );
        }
    }
}

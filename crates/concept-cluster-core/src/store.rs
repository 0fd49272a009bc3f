//! Occurrence vector store: ordered points with parallel vocabulary labels.
//!
//! Read-only input to the clustering pass. A point is identified by its
//! position in the store; the word at the same position labels that
//! occurrence. Many positions may carry the same surface word - repeated
//! occurrences are distinct entities.
//!
//! # On-disk formats
//!
//! - Point file: bincode-encoded `(dim, row-major Vec<f32>)` pair, produced
//!   by the representation-extraction pipeline.
//! - Vocabulary file: UTF-8 text, one token per line, same length and order
//!   as the point rows.
//!
//! A length mismatch between the two sources is detected here, before any
//! clustering work begins, and is fatal.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::error::{ClusterError, ClusterResult};

/// Ordered occurrence vectors plus parallel vocabulary labels.
#[derive(Debug, Clone)]
pub struct OccurrenceStore {
    dim: usize,
    points: Vec<Vec<f32>>,
    vocab: Vec<String>,
}

impl OccurrenceStore {
    /// Build a store from in-memory arrays.
    ///
    /// # Errors
    ///
    /// - `ClusterError::InputMismatch` if the arrays differ in length
    /// - `ClusterError::DimensionMismatch` if any row's dimension differs
    ///   from the first row's
    pub fn from_parts(points: Vec<Vec<f32>>, vocab: Vec<String>) -> ClusterResult<Self> {
        if points.len() != vocab.len() {
            return Err(ClusterError::InputMismatch {
                points: points.len(),
                vocab: vocab.len(),
            });
        }

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

        Ok(Self { dim, points, vocab })
    }

    /// Load a store from a point file and a vocabulary file.
    ///
    /// # Errors
    ///
    /// - `ClusterError::Io` if either file is missing or unreadable
    /// - `ClusterError::Serialization` if the point file cannot be decoded
    ///   or its flat data is not a whole number of `dim`-sized rows
    /// - `ClusterError::InputMismatch` if row and vocabulary counts differ
    pub fn load(point_path: &Path, vocab_path: &Path) -> ClusterResult<Self> {
        let file = File::open(point_path)
            .map_err(|e| ClusterError::io(format!("opening point file {point_path:?}"), e))?;
        let reader = BufReader::new(file);
        let (dim, flat): (usize, Vec<f32>) = bincode::deserialize_from(reader)
            .map_err(|e| ClusterError::serialization("decoding point file", e))?;

        if dim == 0 && !flat.is_empty() {
            return Err(ClusterError::serialization(
                "decoding point file",
                "zero dimension with non-empty data",
            ));
        }
        if dim > 0 && flat.len() % dim != 0 {
            return Err(ClusterError::serialization(
                "decoding point file",
                format!("{} floats is not a multiple of dim {dim}", flat.len()),
            ));
        }

        let points: Vec<Vec<f32>> = if dim == 0 {
            Vec::new()
        } else {
            flat.chunks_exact(dim).map(<[f32]>::to_vec).collect()
        };

        let file = File::open(vocab_path)
            .map_err(|e| ClusterError::io(format!("opening vocab file {vocab_path:?}"), e))?;
        let vocab = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| ClusterError::io("reading vocab file", e))?;

        let store = Self::from_parts(points, vocab)?;
        info!(
            points = store.len(),
            dim = store.dim(),
            "loaded occurrence store"
        );
        Ok(store)
    }

    /// Restrict the store to a prefix fraction of its rows.
    ///
    /// Mirrors the extraction pipeline's point-count ratio: the retained
    /// count is `floor(ratio * len)`.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidParameter` if `ratio` is outside (0, 1].
    pub fn subsample(&mut self, ratio: f32) -> ClusterResult<()> {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ClusterError::invalid_parameter(format!(
                "subsample ratio must be in (0, 1], got {ratio}"
            )));
        }
        let keep = (ratio * self.points.len() as f32) as usize;
        self.points.truncate(keep);
        self.vocab.truncate(keep);
        info!(kept = keep, ratio, "subsampled occurrence store");
        Ok(())
    }

    /// Number of occurrences.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the store holds no occurrences.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Vector dimension (0 for an empty store built from parts).
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Vector at `index`.
    #[inline]
    pub fn point(&self, index: usize) -> &[f32] {
        &self.points[index]
    }

    /// Word at `index`.
    #[inline]
    pub fn word(&self, index: usize) -> &str {
        &self.vocab[index]
    }

    /// All vectors in store order.
    #[inline]
    pub fn points(&self) -> &[Vec<f32>] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_point_file(path: &Path, dim: usize, rows: &[Vec<f32>]) {
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        let bytes = bincode::serialize(&(dim, flat)).unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn from_parts_rejects_length_mismatch() {
        let err = OccurrenceStore::from_parts(
            vec![vec![0.0, 0.0], vec![1.0, 1.0]],
            vec!["only".to_string()],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ClusterError::InputMismatch { points: 2, vocab: 1 }
        ));
    }

    #[test]
    fn from_parts_rejects_ragged_rows() {
        let err = OccurrenceStore::from_parts(
            vec![vec![0.0, 0.0], vec![1.0]],
            vec!["a".to_string(), "b".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, ClusterError::DimensionMismatch { row: 1, .. }));
    }

    #[test]
    fn load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let point_path = dir.path().join("points.bin");
        let vocab_path = dir.path().join("vocab.txt");

        write_point_file(
            &point_path,
            2,
            &[vec![0.0, 1.0], vec![2.0, 3.0], vec![4.0, 5.0]],
        );
        let mut f = File::create(&vocab_path).unwrap();
        writeln!(f, "the").unwrap();
        writeln!(f, "bank").unwrap();
        writeln!(f, "the").unwrap();
        drop(f);

        let store = OccurrenceStore::load(&point_path, &vocab_path).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.dim(), 2);
        assert_eq!(store.point(1), &[2.0, 3.0]);
        assert_eq!(store.word(2), "the");
    }

    #[test]
    fn load_detects_mismatch_before_clustering() {
        let dir = tempfile::tempdir().unwrap();
        let point_path = dir.path().join("points.bin");
        let vocab_path = dir.path().join("vocab.txt");

        write_point_file(&point_path, 2, &[vec![0.0, 1.0], vec![2.0, 3.0]]);
        std::fs::write(&vocab_path, "one\n").unwrap();

        let err = OccurrenceStore::load(&point_path, &vocab_path).unwrap_err();
        assert!(matches!(err, ClusterError::InputMismatch { .. }));
    }

    #[test]
    fn load_rejects_partial_row() {
        let dir = tempfile::tempdir().unwrap();
        let point_path = dir.path().join("points.bin");
        let bytes = bincode::serialize(&(3usize, vec![0.0f32, 1.0, 2.0, 3.0])).unwrap();
        std::fs::write(&point_path, bytes).unwrap();
        let vocab_path = dir.path().join("vocab.txt");
        std::fs::write(&vocab_path, "a\n").unwrap();

        let err = OccurrenceStore::load(&point_path, &vocab_path).unwrap_err();
        assert!(matches!(err, ClusterError::Serialization { .. }));
    }

    #[test]
    fn missing_point_file_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = OccurrenceStore::load(
            &dir.path().join("absent.bin"),
            &dir.path().join("absent.txt"),
        )
        .unwrap_err();
        assert!(matches!(err, ClusterError::Io { .. }));
    }

    #[test]
    fn subsample_keeps_prefix() {
        let mut store = OccurrenceStore::from_parts(
            vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]],
            vec!["a", "b", "c", "d"].into_iter().map(String::from).collect(),
        )
        .unwrap();

        store.subsample(0.5).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.word(1), "b");

        assert!(store.subsample(0.0).is_err());
        assert!(store.subsample(1.5).is_err());
    }
}

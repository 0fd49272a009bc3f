//! End-to-end batch run: load, cluster, merge, write.
//!
//! Single-threaded, single-shot. The only state intended to outlive a run is
//! the persisted approximate-index artifact; everything else is owned by the
//! pass and dropped on exit, success or failure.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::info;

use crate::clique::Clique;
use crate::config::{LeadersConfig, SearchMode};
use crate::error::{ClusterError, ClusterResult};
use crate::index::{ExactIndex, HnswIndex, NeighborIndex};
use crate::leaders::{ExactFirstFit, LeaderWindow};
use crate::merge::{HierarchicalMerger, WardMerger};
use crate::output;
use crate::store::OccurrenceStore;
use crate::threshold::ThresholdEstimator;

/// File locations for a run.
#[derive(Debug, Clone)]
pub struct RunPaths {
    /// Point source (bincode `(dim, row-major floats)`).
    pub point_file: PathBuf,
    /// Vocabulary source (one token per line).
    pub vocab_file: PathBuf,
    /// Directory receiving the record file and any artifacts. Must exist.
    pub output_dir: PathBuf,
    /// Previously persisted index artifact to reload instead of rebuilding
    /// (approximate mode only). No staleness validation is performed.
    pub index_artifact: Option<PathBuf>,
    /// Whether to serialize the merge-phase model next to the records.
    pub save_model: bool,
}

impl RunPaths {
    /// Paths with no artifact reuse and no model serialization.
    pub fn new(
        point_file: impl Into<PathBuf>,
        vocab_file: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            point_file: point_file.into(),
            vocab_file: vocab_file.into(),
            output_dir: output_dir.into(),
            index_artifact: None,
            save_model: false,
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Threshold actually used (supplied or estimated).
    pub tau: f32,
    /// Cliques formed by the greedy pass.
    pub cliques: usize,
    /// Final cluster count (K).
    pub clusters: usize,
    /// Records written (one per retained occurrence).
    pub records: usize,
    /// Cluster record file.
    pub output_file: PathBuf,
    /// Index artifact written this run, if any.
    pub index_file: Option<PathBuf>,
    /// Merge model artifact written this run, if any.
    pub model_file: Option<PathBuf>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Run the full pipeline.
///
/// Validates the configuration, loads the store (a point/vocabulary length
/// mismatch aborts before any clustering work), applies the subsample
/// prefix, resolves tau, builds cliques in the configured mode, merges
/// centroids down to K clusters, and writes the records. All failures are
/// fatal; there is no retry and no partial progress.
pub fn run(config: &LeadersConfig, paths: &RunPaths) -> ClusterResult<RunSummary> {
    let started = Instant::now();
    config.validate()?;

    let mut store = OccurrenceStore::load(&paths.point_file, &paths.vocab_file)?;
    if let Some(ratio) = config.subsample {
        store.subsample(ratio)?;
    }

    let (tau, cliques, index_file) = match config.mode {
        SearchMode::Exact => {
            let tau = resolve_tau_exact(config, &store)?;
            let cliques = ExactFirstFit::new(tau)?.build(&store);
            (tau, cliques, None)
        }
        SearchMode::Approximate => build_approximate(config, paths, &store)?,
    };

    if config.clusters > cliques.len() {
        return Err(ClusterError::invalid_parameter(format!(
            "target cluster count ({}) exceeds clique count ({})",
            config.clusters,
            cliques.len()
        )));
    }

    let centroids: Vec<Vec<f32>> = cliques.iter().map(|c| c.centroid().to_vec()).collect();
    let model = WardMerger::new().merge(&centroids, config.clusters)?;

    let model_file = if paths.save_model {
        let file = paths
            .output_dir
            .join(output::model_file_name(config.clusters, config.subsample));
        model.save(&file)?;
        Some(file)
    } else {
        None
    };

    let groups = output::cluster_members(&model, &cliques);
    let output_file = paths
        .output_dir
        .join(output::output_file_name(config.clusters, tau, config.subsample));
    output::write_records_to(&output_file, &groups, &store)?;

    let summary = RunSummary {
        tau,
        cliques: cliques.len(),
        clusters: config.clusters,
        records: store.len(),
        output_file,
        index_file,
        model_file,
        elapsed: started.elapsed(),
    };
    info!(
        tau = summary.tau,
        cliques = summary.cliques,
        clusters = summary.clusters,
        records = summary.records,
        elapsed = ?summary.elapsed,
        "leaders clustering complete"
    );
    Ok(summary)
}

/// Supplied tau, or an estimate over a linear-scan index.
fn resolve_tau_exact(config: &LeadersConfig, store: &OccurrenceStore) -> ClusterResult<f32> {
    match config.tau {
        Some(tau) => Ok(tau),
        None => {
            let index = ExactIndex::build(store.points())?;
            ThresholdEstimator::new(config.sample_size, config.seed).estimate(&index)
        }
    }
}

/// Approximate-mode clique formation: reload or build (and persist) the
/// spatial index, resolve tau against it, run the leader-window pass.
fn build_approximate(
    config: &LeadersConfig,
    paths: &RunPaths,
    store: &OccurrenceStore,
) -> ClusterResult<(f32, Vec<Clique>, Option<PathBuf>)> {
    let (index, index_file) = match &paths.index_artifact {
        Some(artifact) => (HnswIndex::load(artifact)?, None),
        None => {
            let index = HnswIndex::build(store.points())?;
            let file = paths
                .output_dir
                .join(output::index_file_name(config.subsample));
            index.persist(&file)?;
            (index, Some(file))
        }
    };

    let tau = match config.tau {
        Some(tau) => tau,
        None => ThresholdEstimator::new(config.sample_size, config.seed).estimate(&index)?,
    };

    let cliques = LeaderWindow::new(tau)?.build(store, &index);
    Ok((tau, cliques, index_file))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use super::*;

    const EXAMPLE_POINTS: [[f32; 2]; 5] = [
        [0.0, 0.0],
        [0.0, 0.01],
        [5.0, 5.0],
        [5.0, 5.01],
        [10.0, 10.0],
    ];

    fn write_fixture(dir: &Path, words: &[&str], rows: &[[f32; 2]]) -> (PathBuf, PathBuf) {
        let point_path = dir.join("points.bin");
        let vocab_path = dir.join("vocab.txt");

        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        std::fs::write(&point_path, bincode::serialize(&(2usize, flat)).unwrap()).unwrap();

        let mut f = std::fs::File::create(&vocab_path).unwrap();
        for w in words {
            writeln!(f, "{w}").unwrap();
        }
        (point_path, vocab_path)
    }

    fn read_sorted_records(path: &Path) -> Vec<String> {
        let mut lines: Vec<String> = std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        lines.sort();
        lines
    }

    #[test]
    fn exact_run_reproduces_worked_example() {
        let dir = tempfile::tempdir().unwrap();
        let (points, vocab) =
            write_fixture(dir.path(), &["a", "b", "c", "d", "e"], &EXAMPLE_POINTS);

        let config = LeadersConfig::new(2).with_tau(1.0);
        let paths = RunPaths::new(points, vocab, dir.path());
        let summary = run(&config, &paths).unwrap();

        assert_eq!(summary.cliques, 3);
        assert_eq!(summary.clusters, 2);
        assert_eq!(summary.records, 5);
        assert_eq!(summary.tau, 1.0);
        assert!(summary.index_file.is_none());

        // {a,b} alone; the lone point joins the nearer (5,5) pair.
        let records = read_sorted_records(&summary.output_file);
        assert_eq!(
            records,
            vec!["a|||0", "b|||0", "c|||1", "d|||1", "e|||1"]
        );
    }

    #[test]
    fn approximate_run_partitions_and_persists_index() {
        let dir = tempfile::tempdir().unwrap();
        let (points, vocab) =
            write_fixture(dir.path(), &["a", "b", "c", "d", "e"], &EXAMPLE_POINTS);

        let config = LeadersConfig::new(2)
            .with_tau(1.0)
            .with_mode(SearchMode::Approximate);
        let paths = RunPaths::new(points.clone(), vocab.clone(), dir.path());
        let summary = run(&config, &paths).unwrap();

        assert_eq!(summary.records, 5);
        let index_file = summary.index_file.clone().unwrap();
        assert!(index_file.exists());

        let first = read_sorted_records(&summary.output_file);

        // Rerun against the persisted artifact; same dataset, same result.
        let reuse = RunPaths {
            index_artifact: Some(index_file),
            ..RunPaths::new(points, vocab, dir.path())
        };
        let second_summary = run(&config, &reuse).unwrap();
        assert!(second_summary.index_file.is_none());
        assert_eq!(first, read_sorted_records(&second_summary.output_file));
    }

    #[test]
    fn estimated_tau_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (points, vocab) =
            write_fixture(dir.path(), &["a", "b", "c", "d", "e"], &EXAMPLE_POINTS);

        let config = LeadersConfig::new(1);
        let paths = RunPaths::new(points, vocab, dir.path());
        let summary = run(&config, &paths).unwrap();

        // gaps: 0.01, 0.01, 0.01, 0.01, ~7.07 -> median 0.01
        assert!(summary.tau > 0.0);
        assert!((summary.tau - 0.01).abs() < 1e-4);
    }

    #[test]
    fn oversized_k_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let (points, vocab) =
            write_fixture(dir.path(), &["a", "b", "c", "d", "e"], &EXAMPLE_POINTS);

        let config = LeadersConfig::new(4).with_tau(1.0);
        let paths = RunPaths::new(points, vocab, dir.path());
        let err = run(&config, &paths).unwrap_err();
        assert!(err.to_string().contains("exceeds clique count"));
    }

    #[test]
    fn mismatched_sources_abort_before_clustering() {
        let dir = tempfile::tempdir().unwrap();
        let (points, vocab) = write_fixture(dir.path(), &["a", "b"], &EXAMPLE_POINTS);

        let config = LeadersConfig::new(1).with_tau(1.0);
        let paths = RunPaths::new(points, vocab, dir.path());
        let err = run(&config, &paths).unwrap_err();
        assert!(matches!(err, ClusterError::InputMismatch { .. }));
    }

    #[test]
    fn subsample_restricts_to_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let (points, vocab) =
            write_fixture(dir.path(), &["a", "b", "c", "d", "e"], &EXAMPLE_POINTS);

        // 0.4 of 5 rows keeps the first two occurrences
        let config = LeadersConfig::new(1).with_tau(1.0).with_subsample(0.4);
        let paths = RunPaths::new(points, vocab, dir.path());
        let summary = run(&config, &paths).unwrap();

        assert_eq!(summary.records, 2);
        assert_eq!(summary.cliques, 1);
        let records = read_sorted_records(&summary.output_file);
        assert_eq!(records, vec!["a|||0", "b|||0"]);
    }

    #[test]
    fn merge_model_artifact_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let (points, vocab) =
            write_fixture(dir.path(), &["a", "b", "c", "d", "e"], &EXAMPLE_POINTS);

        let config = LeadersConfig::new(2).with_tau(1.0);
        let paths = RunPaths {
            save_model: true,
            ..RunPaths::new(points, vocab, dir.path())
        };
        let summary = run(&config, &paths).unwrap();

        let model_file = summary.model_file.unwrap();
        let model = crate::merge::MergeModel::load(&model_file).unwrap();
        assert_eq!(model.num_clusters(), 2);
        assert_eq!(model.num_inputs(), 3);
        assert_eq!(model.assignments(), &[0, 1, 1]);
    }
}

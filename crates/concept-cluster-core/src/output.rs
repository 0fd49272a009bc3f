//! Expansion of final clusters to per-occurrence records.
//!
//! One `word|||cluster_id` record per retained occurrence. The same surface
//! word may appear under multiple cluster ids across different occurrences;
//! nothing is deduplicated. Records are grouped by final cluster (cliques in
//! creation order within each), so round-tripping does not preserve input
//! ordering.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::clique::Clique;
use crate::error::{ClusterError, ClusterResult};
use crate::merge::MergeModel;
use crate::store::OccurrenceStore;

/// Occurrence indices of every final cluster: the union of member indices of
/// every clique merged into it, cliques in creation order.
pub fn cluster_members(model: &MergeModel, cliques: &[Clique]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); model.num_clusters()];
    for (clique, &cluster) in cliques.iter().zip(model.assignments()) {
        groups[cluster].extend_from_slice(clique.members());
    }
    groups
}

/// Write `word|||cluster_id` records for every occurrence, grouped by
/// cluster.
pub fn write_records<W: Write>(
    mut writer: W,
    groups: &[Vec<usize>],
    store: &OccurrenceStore,
) -> ClusterResult<()> {
    for (cluster_id, members) in groups.iter().enumerate() {
        for &index in members {
            writeln!(writer, "{}|||{}", store.word(index), cluster_id)
                .map_err(|e| ClusterError::io("writing cluster records", e))?;
        }
    }
    Ok(())
}

/// Write records to `path`, creating or truncating the file.
pub fn write_records_to(
    path: &Path,
    groups: &[Vec<usize>],
    store: &OccurrenceStore,
) -> ClusterResult<()> {
    let file = File::create(path)
        .map_err(|e| ClusterError::io(format!("creating output file {path:?}"), e))?;
    let mut writer = BufWriter::new(file);
    write_records(&mut writer, groups, store)?;
    writer
        .flush()
        .map_err(|e| ClusterError::io("flushing cluster records", e))?;

    let records: usize = groups.iter().map(Vec::len).sum();
    info!(records, path = ?path, "wrote cluster records");
    Ok(())
}

/// `-{ratio}` suffix marking subsampled runs, empty otherwise.
pub fn subsample_ref(subsample: Option<f32>) -> String {
    subsample.map_or_else(String::new, |ratio| format!("-{ratio}"))
}

/// Default name for the cluster record file.
pub fn output_file_name(clusters: usize, tau: f32, subsample: Option<f32>) -> String {
    format!(
        "clusters-leaders-{clusters}-{tau}{}.txt",
        subsample_ref(subsample)
    )
}

/// Default name for the persisted approximate-index artifact.
pub fn index_file_name(subsample: Option<f32>) -> String {
    format!("leaders{}.ann.bin", subsample_ref(subsample))
}

/// Default name for the serialized merge-phase model.
pub fn model_file_name(clusters: usize, subsample: Option<f32>) -> String {
    format!("model-{clusters}-leaders{}.bin", subsample_ref(subsample))
}

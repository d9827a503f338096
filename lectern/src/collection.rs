use serde::Serialize;

use lectern_cluster::Label;
use lectern_corpus::Corpus;
use lectern_micro::{MicroCluster, SelectionResult};
use lectern_theme::{Theme, ThemeLabeler};

use crate::error::LecternError;
use crate::reading::{ReadingSequence, reading_sequence};

/// Presentation record of one selected micro-cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    /// `FC-01`, `FC-02`, ... in selection order.
    pub id: String,
    pub micro_cluster_id: String,
    pub parent_cluster_id: Label,
    pub title: String,
    pub significance: String,
    pub size: usize,
    pub avg_similarity: f64,
    pub primary_works: Vec<String>,
    pub themes: Vec<Theme>,
    pub reading: ReadingSequence,
}

/// Labels and orders every selected micro-cluster.
pub fn collections(
    corpus: &Corpus,
    selection: &SelectionResult,
    labeler: &ThemeLabeler,
) -> Result<Vec<Collection>, LecternError> {
    selection
        .iter()
        .enumerate()
        .map(|(i, mc)| collection(corpus, i + 1, mc, labeler))
        .collect()
}

fn collection(
    corpus: &Corpus,
    n: usize,
    mc: &MicroCluster,
    labeler: &ThemeLabeler,
) -> Result<Collection, LecternError> {
    let titles = mc
        .member_ids
        .iter()
        .map(|id| {
            corpus
                .by_id(id)
                .map(|d| d.title.as_str())
                .ok_or_else(|| LecternError::UnknownDocument(id.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let label = labeler.label(&titles);

    Ok(Collection {
        id: format!("FC-{n:02}"),
        micro_cluster_id: mc.id.clone(),
        parent_cluster_id: mc.parent_cluster_id,
        title: label.title,
        significance: label.significance,
        size: mc.size(),
        avg_similarity: mc.avg_pairwise_similarity,
        primary_works: label.primary_works,
        themes: label.themes,
        reading: reading_sequence(corpus, &mc.member_ids)?,
    })
}

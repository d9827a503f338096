use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CorpusError;

/// Identifier of a document within a corpus.
pub type DocId = String;

/// Per-document metadata, supplied by the caller alongside the vector array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub id: DocId,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub word_count: usize,

    /// Extracted body text. May be empty when only titles are available.
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// A document record: embedding vector plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub vector: Vec<f64>,
    pub title: String,
    pub word_count: usize,
    pub text: String,
    pub date: Option<NaiveDate>,
}

impl Document {
    /// Joins a metadata record with its embedding vector.
    pub fn from_metadata(meta: Metadata, vector: Vec<f64>) -> Self {
        Self {
            id: meta.id,
            vector,
            title: meta.title,
            word_count: meta.word_count,
            text: meta.text,
            date: meta.date,
        }
    }
}

/// An ordered, validated collection of documents sharing one embedding
/// dimension. Read-only once built.
#[derive(Debug, Clone)]
pub struct Corpus {
    docs: Vec<Document>,
    dim: usize,
    index: HashMap<DocId, usize>,
}

impl Corpus {
    /// Builds a corpus from ready documents.
    ///
    /// Fails when the corpus is empty, vectors are zero-dimensional or of
    /// mixed dimension, or ids repeat.
    pub fn new(docs: Vec<Document>) -> Result<Self, CorpusError> {
        let first = docs.first().ok_or(CorpusError::Empty)?;
        let dim = first.vector.len();
        if dim == 0 {
            return Err(CorpusError::ZeroDimension(first.id.clone()));
        }

        let mut index = HashMap::with_capacity(docs.len());
        for (i, doc) in docs.iter().enumerate() {
            if doc.vector.len() != dim {
                return Err(CorpusError::DimensionMismatch {
                    id: doc.id.clone(),
                    expected: dim,
                    got: doc.vector.len(),
                });
            }
            if index.insert(doc.id.clone(), i).is_some() {
                return Err(CorpusError::DuplicateId(doc.id.clone()));
            }
        }

        Ok(Self { docs, dim, index })
    }

    /// Builds a corpus from an N×D vector array and a parallel metadata
    /// table. Row `i` of `vectors` belongs to `metadata[i]`.
    pub fn from_parts(vectors: Vec<Vec<f64>>, metadata: Vec<Metadata>) -> Result<Self, CorpusError> {
        if vectors.len() != metadata.len() {
            return Err(CorpusError::LengthMismatch {
                vectors: vectors.len(),
                records: metadata.len(),
            });
        }
        let docs = metadata
            .into_iter()
            .zip(vectors)
            .map(|(meta, vector)| Document::from_metadata(meta, vector))
            .collect();
        Self::new(docs)
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Always false for a constructed corpus; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Embedding dimension shared by every document.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn get(&self, i: usize) -> Option<&Document> {
        self.docs.get(i)
    }

    /// Looks up a document by id.
    pub fn by_id(&self, id: &str) -> Option<&Document> {
        self.index.get(id).map(|&i| &self.docs[i])
    }

    /// Position of a document id in corpus order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Document ids in corpus order.
    pub fn ids(&self) -> Vec<DocId> {
        self.docs.iter().map(|d| d.id.clone()).collect()
    }

    /// Borrowed embedding rows in corpus order.
    pub fn vectors(&self) -> Vec<&[f64]> {
        self.docs.iter().map(|d| d.vector.as_slice()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: &str) -> Metadata {
        Metadata {
            id: id.into(),
            title: format!("Post {id}"),
            word_count: 100,
            ..Default::default()
        }
    }

    #[test]
    fn from_parts_joins_rows() {
        let corpus = Corpus::from_parts(
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![meta("a"), meta("b")],
        )
        .unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.dim(), 2);
        assert_eq!(corpus.ids(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(corpus.by_id("b").unwrap().vector, vec![0.0, 1.0]);
        assert_eq!(corpus.position("a"), Some(0));
        assert!(corpus.by_id("zzz").is_none());
    }

    #[test]
    fn length_mismatch_rejected() {
        let err = Corpus::from_parts(vec![vec![1.0]], vec![meta("a"), meta("b")]).unwrap_err();
        assert!(matches!(err, CorpusError::LengthMismatch { vectors: 1, records: 2 }));
    }

    #[test]
    fn empty_rejected() {
        assert!(matches!(Corpus::new(Vec::new()), Err(CorpusError::Empty)));
        assert!(matches!(
            Corpus::from_parts(Vec::new(), Vec::new()),
            Err(CorpusError::Empty)
        ));
    }

    #[test]
    fn dimension_checks() {
        let err = Corpus::from_parts(vec![vec![1.0, 0.0], vec![1.0]], vec![meta("a"), meta("b")])
            .unwrap_err();
        assert!(matches!(err, CorpusError::DimensionMismatch { expected: 2, got: 1, .. }));

        let err = Corpus::from_parts(vec![vec![]], vec![meta("a")]).unwrap_err();
        assert!(matches!(err, CorpusError::ZeroDimension(_)));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let err = Corpus::from_parts(vec![vec![1.0], vec![2.0]], vec![meta("a"), meta("a")])
            .unwrap_err();
        assert!(matches!(err, CorpusError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn metadata_deserializes_with_defaults() {
        let m: Metadata =
            serde_json::from_str(r#"{"id":"p1","title":"Hello","date":"2023-04-01"}"#).unwrap();
        assert_eq!(m.word_count, 0);
        assert_eq!(m.date, NaiveDate::from_ymd_opt(2023, 4, 1));
    }
}

//! Document corpus and shared similarity utilities.
//!
//! A [`Corpus`] is the read-only input of every clustering run: N documents,
//! each with a D-dimensional embedding and its metadata. Construction
//! validates the input once so downstream crates can index freely.
//!
//! ```
//! use lectern_corpus::{Corpus, Metadata};
//!
//! let corpus = Corpus::from_parts(
//!     vec![vec![1.0, 0.0], vec![0.9, 0.1]],
//!     vec![
//!         Metadata { id: "a".into(), ..Default::default() },
//!         Metadata { id: "b".into(), ..Default::default() },
//!     ],
//! )
//! .unwrap();
//! assert_eq!(corpus.len(), 2);
//! ```

mod corpus;
pub mod cosine;
mod error;

pub use corpus::{Corpus, DocId, Document, Metadata};
pub use cosine::{
    SimilarityMatrix, average_pairwise_similarity, cosine_distance, cosine_sim,
    euclidean_distance, squared_euclidean,
};
pub use error::CorpusError;

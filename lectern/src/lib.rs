//! Thematic reading collections from document embeddings.
//!
//! The pipeline takes a [`Corpus`] of embedded documents and:
//!
//! 1. standardizes the vectors and clusters them with k-means and, when
//!    configured, every agglomerative linkage and DBSCAN, choosing k and the
//!    density parameters from internal quality metrics, then summarizes the
//!    content of every run's clusters;
//! 2. subdivides the k-means clusters into micro-clusters of a handful of
//!    highly similar documents and selects a diverse set of them;
//! 3. labels each selection with themes and cited works and orders its
//!    documents into a reading sequence.
//!
//! # Usage
//!
//! ```no_run
//! use lectern::{Corpus, Lectern, LecternConfig};
//!
//! # fn load() -> Corpus { unimplemented!() }
//! let corpus = load();
//! let config = LecternConfig::from_yaml("engine: { k_range: { min: 2, max: 20 } }").unwrap();
//! let report = Lectern::new(config).unwrap().run(&corpus).unwrap();
//! for c in &report.collections {
//!     println!("{}: {} ({} documents)", c.id, c.title, c.size);
//! }
//! ```
//!
//! The stages are usable on their own through the re-exported crates.

mod collection;
mod config;
mod error;
mod lectern;
mod reading;
mod summary;

pub use collection::{Collection, collections};
pub use config::{LecternConfig, SummaryConfig};
pub use error::LecternError;
pub use lectern::{LargeCluster, Lectern, Report, RunReport, large_clusters};
pub use reading::{ReadingItem, ReadingSequence, reading_sequence, reading_time};
pub use summary::{ClusterSummary, DateRange, TermCount, summarize, term_counts};

pub use lectern_cluster as cluster;
pub use lectern_corpus::{Corpus, DocId, Document, Metadata};
pub use lectern_micro as micro;
pub use lectern_theme as theme;

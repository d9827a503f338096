//! Micro-cluster construction.
//!
//! Coarse clusters are too broad for a focused reading session. The
//! [`MicroClusterBuilder`] splits every large cluster with seeded k-means
//! into groups of roughly `target_size` documents, keeps the groups whose
//! members are similar enough, and [`select`]s a small, diverse set: the
//! most coherent groups first, never more than `per_parent_cap` from the
//! same coarse cluster.
//!
//! Micro-clusters copy their member ids and hold no reference to the
//! assignment they came from.

mod config;
mod error;
mod micro;

pub use config::MicroConfig;
pub use error::MicroError;
pub use micro::{MicroCluster, MicroClusterBuilder, SelectionResult, select};

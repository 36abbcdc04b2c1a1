//! Set-overlap clustering of named entities.
//!
//! `setclump` groups entities (for example procedures, described by the fields
//! and methods they touch) by how much their reference sets overlap:
//! - [`distance`]: pairwise Jaccard distances, rounded to two decimals
//! - [`cluster`]: average-linkage agglomerative clustering, full or flat-cut
//! - [`ingest`]: delimited text records into an [`EntityCatalog`]
//! - [`report`]: plain-text and JSON views of the result

#![forbid(unsafe_code)]

pub mod catalog;
pub mod cluster;
pub mod distance;
pub mod error;
pub mod ingest;
pub mod report;

pub use catalog::{Entity, EntityCatalog};
pub use cluster::{AverageLinkage, ClusterNode, Clustering, CutMode, Hierarchy, Merge, NodeRef};
pub use distance::DistanceMatrix;
pub use error::{Error, Result};
pub use ingest::IngestOptions;

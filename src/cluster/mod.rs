//! Hierarchical agglomerative clustering of catalog entities.
//!
//! ## Average linkage
//!
//! Every entity starts as its own cluster. At each step the two clusters with
//! the smallest mean pairwise distance are joined:
//!
//! ```text
//! d(Ci, Cj) = mean { D[a][b] : a ∈ Ci, b ∈ Cj }
//! ```
//!
//! Average linkage sits between single linkage (chains) and complete linkage
//! (compact blobs) and is the usual choice for set-overlap distances, where
//! many pairs share the same discrete Jaccard bucket.
//!
//! ## Output
//!
//! A run yields a [`Hierarchy`]: an arena of [`ClusterNode`]s plus the list of
//! top-level roots. With [`CutMode::Full`] there is one root (the dendrogram);
//! with [`CutMode::FlatCut`] each root is one flat cluster.
//!
//! ## Usage
//!
//! ```rust
//! use setclump::catalog::{Entity, EntityCatalog};
//! use setclump::cluster::{AverageLinkage, Clustering};
//!
//! let catalog = EntityCatalog::from_entities([
//!     Entity::new("P1", ["a", "b", "c"]),
//!     Entity::new("P2", ["a", "b"]),
//!     Entity::new("P3", ["x", "y"]),
//! ])
//! .unwrap();
//!
//! // Full dendrogram
//! let tree = AverageLinkage::full().fit(&catalog).unwrap();
//! assert_eq!(tree.merges().len(), 2);
//!
//! // Flat clusters: no merge above distance 0.5
//! let labels = AverageLinkage::flat(0.5).fit_predict(&catalog).unwrap();
//! assert_eq!(labels, vec![0, 0, 1]);
//! ```

mod hac;
mod traits;
mod tree;

pub use hac::{AverageLinkage, CutMode};
pub use traits::Clustering;
pub use tree::{ClusterNode, Hierarchy, Merge, NodeRef};

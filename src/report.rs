//! Text and JSON views of a clustering result.
//!
//! These only walk the [`Hierarchy`] through [`NodeRef`]; they never recompute
//! distances. Image rendering is left to external tools, which can consume
//! [`to_json`].

use std::fmt;

use serde::Serialize;

use crate::cluster::{Hierarchy, NodeRef};
use crate::error::Result;

/// Indented dump of every tree in the hierarchy.
///
/// ```text
/// + 1.00 (3 entities)
///   + 0.33 (2 entities)
///     - P1
///     - P2
///   - P3
/// ```
pub fn render_tree(tree: &Hierarchy) -> String {
    TreeView(tree).to_string()
}

/// One line per top-level cluster with its members.
///
/// ```text
/// Cluster 0: P1, P2 (merged at 0.33)
/// Cluster 1: P3 (singleton)
/// ```
pub fn render_clusters(tree: &Hierarchy) -> String {
    ClustersView(tree).to_string()
}

/// `identifier<TAB>cluster` per entity, in catalog order.
pub fn render_labels(tree: &Hierarchy) -> String {
    LabelsView(tree).to_string()
}

struct TreeView<'a>(&'a Hierarchy);

impl fmt::Display for TreeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for root in self.0.roots() {
            let mut stack = vec![(root, 0usize)];
            while let Some((node, depth)) = stack.pop() {
                let indent = "  ".repeat(depth);
                match (node.entity_identifier(), node.merge_distance()) {
                    (Some(id), _) => writeln!(f, "{indent}- {id}")?,
                    (None, distance) => writeln!(
                        f,
                        "{indent}+ {:.2} ({} entities)",
                        distance.unwrap_or_default(),
                        node.size()
                    )?,
                }
                // reversed so the first child prints first
                let children: Vec<NodeRef<'_>> = node.children().collect();
                for child in children.into_iter().rev() {
                    stack.push((child, depth + 1));
                }
            }
        }
        Ok(())
    }
}

struct ClustersView<'a>(&'a Hierarchy);

impl fmt::Display for ClustersView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, root) in self.0.roots().enumerate() {
            let members = root.leaf_identifiers().join(", ");
            match root.merge_distance() {
                Some(d) => writeln!(f, "Cluster {k}: {members} (merged at {d:.2})")?,
                None => writeln!(f, "Cluster {k}: {members} (singleton)")?,
            }
        }
        Ok(())
    }
}

struct LabelsView<'a>(&'a Hierarchy);

impl fmt::Display for LabelsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, label) in self.0.labels().iter().zip(self.0.assignments()) {
            writeln!(f, "{id}\t{label}")?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum JsonNode<'a> {
    Leaf {
        entity: &'a str,
    },
    Merge {
        distance: f64,
        size: usize,
        children: Vec<JsonNode<'a>>,
    },
}

impl<'a> JsonNode<'a> {
    fn build(node: NodeRef<'a>) -> Self {
        match node.entity_identifier() {
            Some(entity) => Self::Leaf { entity },
            None => Self::Merge {
                distance: node.merge_distance().unwrap_or_default(),
                size: node.size(),
                children: node.children().map(Self::build).collect(),
            },
        }
    }
}

/// Nested JSON export: an array with one tree per top-level cluster.
///
/// Leaves are `{"entity": id}`; merges are
/// `{"distance": d, "size": n, "children": [...]}`.
pub fn to_json(tree: &Hierarchy) -> Result<String> {
    let roots: Vec<JsonNode<'_>> = tree.roots().map(JsonNode::build).collect();
    Ok(serde_json::to_string_pretty(&roots)?)
}

//! Arena-backed merge tree.
//!
//! Nodes live in a single `Vec` and refer to their children by index. Leaves
//! occupy ids `0..n` (one per catalog entity, same index), and the k-th merge
//! creates node `n + k`. A full clustering has a single root; a flat cut leaves
//! several roots, each the top of one cluster.

use serde::Serialize;

/// A node in the merge tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusterNode {
    /// Arena slot; equals the catalog index for leaves, `n + k` for the k-th merge.
    pub id: usize,

    /// Slots of the two joined clusters; empty when the node wraps one entity.
    pub children: Vec<usize>,

    /// Average-linkage distance of the merge; 0.0 for an entity.
    pub distance: f64,

    /// How many catalog entities this cluster holds.
    pub size: usize,

    /// Catalog index of the wrapped entity (leaves only).
    pub entity: Option<usize>,
}

/// One agglomeration step, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Merge {
    /// Node id of the first child (the one holding the lower catalog index).
    pub left: usize,
    /// Node id of the second child.
    pub right: usize,
    /// Average-linkage distance of the merge.
    pub distance: f64,
    /// Number of entities in the merged cluster.
    pub size: usize,
}

/// Result of a clustering run: the merge tree (or forest) over catalog entities.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Hierarchy {
    labels: Vec<String>,
    nodes: Vec<ClusterNode>,
    merges: Vec<Merge>,
    roots: Vec<usize>,
}

impl Hierarchy {
    /// Start a hierarchy with one leaf per identifier and no merges.
    pub(crate) fn with_leaves(labels: Vec<String>) -> Self {
        let n = labels.len();
        let mut nodes = Vec::with_capacity(n.saturating_mul(2).saturating_sub(1));
        for i in 0..n {
            nodes.push(ClusterNode {
                id: i,
                children: Vec::new(),
                distance: 0.0,
                size: 1,
                entity: Some(i),
            });
        }
        Self {
            labels,
            nodes,
            merges: Vec::with_capacity(n.saturating_sub(1)),
            roots: (0..n).collect(),
        }
    }

    /// Join two existing nodes under a new one and return its id.
    pub(crate) fn push_merge(&mut self, left: usize, right: usize, distance: f64) -> usize {
        let id = self.nodes.len();
        let size = self.nodes[left].size + self.nodes[right].size;
        self.nodes.push(ClusterNode {
            id,
            children: vec![left, right],
            distance,
            size,
            entity: None,
        });
        self.merges.push(Merge {
            left,
            right,
            distance,
            size,
        });
        id
    }

    pub(crate) fn set_roots(&mut self, roots: Vec<usize>) {
        self.roots = roots;
    }

    /// Number of clustered entities (leaves).
    pub fn n_entities(&self) -> usize {
        self.labels.len()
    }

    /// Number of top-level clusters (1 for a full clustering).
    pub fn n_clusters(&self) -> usize {
        self.roots.len()
    }

    /// Entity identifiers in catalog order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Access all nodes.
    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    /// Merge records in merge order.
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Root node ids, ordered by the lowest catalog index each cluster holds.
    pub fn root_ids(&self) -> &[usize] {
        &self.roots
    }

    /// Top-level clusters as traversable views.
    pub fn roots(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.roots.iter().map(move |&id| NodeRef { tree: self, id })
    }

    /// The single root, when the hierarchy is one tree.
    pub fn root(&self) -> Option<NodeRef<'_>> {
        match self.roots.as_slice() {
            [id] => Some(NodeRef { tree: self, id: *id }),
            _ => None,
        }
    }

    /// View of a node by id.
    pub fn node(&self, id: usize) -> Option<NodeRef<'_>> {
        (id < self.nodes.len()).then_some(NodeRef { tree: self, id })
    }

    /// Get all merge distances (internal nodes only), in merge order.
    pub fn get_all_distances(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.distance).collect()
    }

    /// Cluster number per entity: position of the root that contains it.
    pub fn assignments(&self) -> Vec<usize> {
        let mut out = vec![0; self.labels.len()];
        for (cluster, root) in self.roots().enumerate() {
            for entity in root.leaves() {
                out[entity] = cluster;
            }
        }
        out
    }
}

/// Read-only view of one node, sufficient for rendering without clustering logic.
#[derive(Clone, Copy, Debug)]
pub struct NodeRef<'a> {
    tree: &'a Hierarchy,
    id: usize,
}

impl<'a> NodeRef<'a> {
    fn raw(&self) -> &'a ClusterNode {
        &self.tree.nodes[self.id]
    }

    /// Node id in the arena.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Whether this node wraps a single entity.
    pub fn is_leaf(&self) -> bool {
        self.raw().children.is_empty()
    }

    /// Child nodes (empty for leaves).
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.raw()
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    /// Distance at which the children were joined; `None` for leaves.
    pub fn merge_distance(&self) -> Option<f64> {
        (!self.is_leaf()).then(|| self.raw().distance)
    }

    /// Identifier of the wrapped entity; `None` for merge nodes.
    pub fn entity_identifier(&self) -> Option<&'a str> {
        self.raw()
            .entity
            .map(|idx| self.tree.labels[idx].as_str())
    }

    /// Catalog index of the wrapped entity; `None` for merge nodes.
    pub fn entity_index(&self) -> Option<usize> {
        self.raw().entity
    }

    /// Number of entities under this node.
    pub fn size(&self) -> usize {
        self.raw().size
    }

    /// Catalog indices of all entities under this node, ascending.
    pub fn leaves(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.size());
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            let node = &self.tree.nodes[id];
            match node.entity {
                Some(idx) => out.push(idx),
                None => stack.extend(node.children.iter().copied()),
            }
        }
        out.sort_unstable();
        out
    }

    /// Identifiers of all entities under this node, in catalog order.
    pub fn leaf_identifiers(&self) -> Vec<&'a str> {
        let labels = &self.tree.labels;
        self.leaves()
            .into_iter()
            .map(|idx| labels[idx].as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_leaves() -> Hierarchy {
        Hierarchy::with_leaves(vec!["a".into(), "b".into(), "c".into()])
    }

    #[test]
    fn test_leaves_start_as_roots() {
        let h = three_leaves();
        assert_eq!(h.n_clusters(), 3);
        assert!(h.root().is_none());
        assert!(h.roots().all(|r| r.is_leaf()));
        assert_eq!(h.assignments(), vec![0, 1, 2]);
    }

    #[test]
    fn test_push_merge_builds_tree() {
        let mut h = three_leaves();
        let ab = h.push_merge(0, 1, 0.25);
        let abc = h.push_merge(ab, 2, 0.75);
        h.set_roots(vec![abc]);

        assert_eq!(ab, 3);
        assert_eq!(abc, 4);
        let root = h.root().unwrap();
        assert!(!root.is_leaf());
        assert_eq!(root.size(), 3);
        assert_eq!(root.merge_distance(), Some(0.75));
        assert_eq!(root.leaf_identifiers(), vec!["a", "b", "c"]);

        let kids: Vec<_> = root.children().collect();
        assert_eq!(kids.len(), 2);
        assert_eq!(kids[0].merge_distance(), Some(0.25));
        assert_eq!(kids[1].entity_identifier(), Some("c"));
        assert_eq!(kids[1].merge_distance(), None);
        assert_eq!(h.get_all_distances(), vec![0.25, 0.75]);
        assert_eq!(h.assignments(), vec![0, 0, 0]);
    }

    #[test]
    fn test_node_out_of_range() {
        let h = three_leaves();
        assert!(h.node(2).is_some());
        assert!(h.node(3).is_none());
    }
}

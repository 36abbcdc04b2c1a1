//! Average-linkage hierarchical agglomerative clustering.
//!
//! # Algorithm
//!
//! Start with one cluster per entity. Repeatedly join the pair of active
//! clusters with the smallest average-linkage distance
//!
//! ```text
//! d(Ci, Cj) = (1 / |Ci||Cj|) Σ_{a ∈ Ci} Σ_{b ∈ Cj} D[a][b]
//! ```
//!
//! until one cluster remains ([`CutMode::Full`]), the smallest available
//! distance exceeds the threshold ([`CutMode::FlatCut`]), or the requested
//! number of clusters is reached ([`CutMode::Clusters`]).
//!
//! ## Ties
//!
//! Each active cluster is keyed by the lowest catalog index among its members.
//! Among equally distant pairs, the pair with the lowest `(lower key, higher key)`
//! wins. Linkage sums are integers (hundredths), so equal averages compare
//! exactly equal and the tie-break always applies.
//!
//! ## Complexity
//!
//! Candidate pairs sit in a binary heap with lazy invalidation: a merge pushes
//! one candidate per surviving cluster, and stale entries are dropped when
//! popped. O(n² log n) time, O(n²) space.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::{debug, trace};

use super::traits::Clustering;
use super::tree::Hierarchy;
use crate::catalog::EntityCatalog;
use crate::distance::{DistanceMatrix, SCALE};
use crate::error::{Error, Result};

/// How far agglomeration proceeds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CutMode {
    /// Merge until a single root remains (the full dendrogram).
    #[default]
    Full,
    /// Stop once the smallest available merge distance exceeds `threshold`.
    ///
    /// `threshold` is a maximum allowed merge distance in `[0, 1]`; a merge at
    /// exactly the threshold still happens.
    FlatCut {
        /// Maximum allowed merge distance.
        threshold: f64,
    },
    /// Stop once exactly `k` clusters remain.
    Clusters {
        /// Number of clusters to keep, in `1..=n`.
        k: usize,
    },
}

impl CutMode {
    /// Checks that need no input: the threshold range.
    fn validate(self) -> Result<()> {
        match self {
            Self::FlatCut { threshold } if !(0.0..=1.0).contains(&threshold) => {
                Err(Error::InvalidThreshold(threshold))
            }
            _ => Ok(()),
        }
    }

    /// Checks against the entity count: the cluster count range.
    fn validate_for(self, n_items: usize) -> Result<()> {
        match self {
            Self::Clusters { k } if k == 0 || k > n_items => Err(Error::InvalidClusterCount {
                requested: k,
                n_items,
            }),
            _ => Ok(()),
        }
    }

    fn allows(self, distance: f64, active: usize) -> bool {
        match self {
            Self::Full => true,
            Self::FlatCut { threshold } => distance <= threshold,
            Self::Clusters { k } => active > k,
        }
    }
}

/// Average-linkage agglomerative clusterer.
#[derive(Clone, Debug, Default)]
pub struct AverageLinkage {
    mode: CutMode,
}

impl AverageLinkage {
    /// Create a clusterer with the given cut mode.
    pub fn new(mode: CutMode) -> Self {
        Self { mode }
    }

    /// Clusterer producing the full dendrogram.
    pub fn full() -> Self {
        Self::new(CutMode::Full)
    }

    /// Clusterer producing a flat partition at a maximum merge distance.
    pub fn flat(threshold: f64) -> Self {
        Self::new(CutMode::FlatCut { threshold })
    }

    /// Clusterer producing exactly `k` flat clusters.
    pub fn clusters(k: usize) -> Self {
        Self::new(CutMode::Clusters { k })
    }

    /// Set the cut mode.
    pub fn with_mode(mut self, mode: CutMode) -> Self {
        self.mode = mode;
        self
    }

    /// The configured cut mode.
    pub fn mode(&self) -> CutMode {
        self.mode
    }

    /// Cluster over a precomputed distance matrix.
    pub fn fit_matrix(&self, matrix: &DistanceMatrix) -> Result<Hierarchy> {
        self.mode.validate()?;
        self.mode.validate_for(matrix.len())?;
        Ok(self.agglomerate(matrix))
    }

    fn agglomerate(&self, matrix: &DistanceMatrix) -> Hierarchy {
        let n = matrix.len();
        debug!(entities = n, mode = ?self.mode, "starting average-linkage clustering");

        let mut tree = Hierarchy::with_leaves(matrix.labels().to_vec());
        let mut state = ActiveSet::new(matrix);

        let mut heap = BinaryHeap::with_capacity(n * (n - 1) / 2);
        for j in 1..n {
            for i in 0..j {
                heap.push(Reverse(state.candidate(i, j)));
            }
        }

        while let Some(Reverse(best)) = heap.pop() {
            let (a, b) = best.slots;
            if !state.alive[a] || !state.alive[b] {
                continue;
            }

            let distance = best.distance();
            let active = n - tree.merges().len();
            if !self.mode.allows(distance, active) {
                trace!(distance, active, "cut reached");
                break;
            }

            let c = tree.push_merge(a, b, distance);
            trace!(
                left = a,
                right = b,
                node = c,
                keys = ?best.keys,
                distance,
                "merged clusters"
            );

            for k in state.merge(a, b) {
                heap.push(Reverse(state.candidate(k, c)));
            }
        }

        let roots = state.roots();
        debug!(
            merges = tree.merges().len(),
            clusters = roots.len(),
            "clustering finished"
        );
        tree.set_roots(roots);
        tree
    }
}

impl Clustering for AverageLinkage {
    fn fit(&self, catalog: &EntityCatalog) -> Result<Hierarchy> {
        self.mode.validate()?;
        if catalog.is_empty() {
            return Err(Error::EmptyInput);
        }
        self.mode.validate_for(catalog.len())?;
        match catalog.entities() {
            [] => Err(Error::EmptyInput),
            [only] => {
                debug!(entity = only.id(), "single entity, nothing to merge");
                Ok(Hierarchy::with_leaves(vec![only.id().to_string()]))
            }
            _ => {
                let matrix = DistanceMatrix::from_catalog(catalog)?;
                Ok(self.agglomerate(&matrix))
            }
        }
    }
}

/// Working set of one run. Slot ids coincide with tree node ids.
struct ActiveSet {
    alive: Vec<bool>,
    /// Lowest catalog index among members.
    key: Vec<usize>,
    size: Vec<u64>,
    /// `sums[hi][lo]`: sum of member-pair distances (hundredths) between slots.
    sums: Vec<Vec<u64>>,
}

impl ActiveSet {
    fn new(matrix: &DistanceMatrix) -> Self {
        let n = matrix.len();
        let cap = 2 * n - 1;
        let mut sums: Vec<Vec<u64>> = Vec::with_capacity(cap);
        for i in 0..n {
            sums.push((0..i).map(|j| u64::from(matrix.units(i, j))).collect());
        }

        let mut alive = Vec::with_capacity(cap);
        alive.resize(n, true);
        let mut key = Vec::with_capacity(cap);
        key.extend(0..n);
        let mut size = Vec::with_capacity(cap);
        size.resize(n, 1);

        Self {
            alive,
            key,
            size,
            sums,
        }
    }

    fn sum(&self, x: usize, y: usize) -> u64 {
        if x > y {
            self.sums[x][y]
        } else {
            self.sums[y][x]
        }
    }

    fn candidate(&self, x: usize, y: usize) -> Candidate {
        // first slot holds the lower key
        let (first, second) = if self.key[x] <= self.key[y] {
            (x, y)
        } else {
            (y, x)
        };
        Candidate {
            sum: self.sum(x, y),
            pairs: self.size[x] * self.size[y],
            keys: (self.key[first], self.key[second]),
            slots: (first, second),
        }
    }

    /// Retire `a` and `b`, append their union, and return the surviving slots.
    fn merge(&mut self, a: usize, b: usize) -> Vec<usize> {
        let c = self.alive.len();
        self.alive[a] = false;
        self.alive[b] = false;

        let mut row = vec![0u64; c];
        let mut survivors = Vec::new();
        for k in 0..c {
            if self.alive[k] {
                row[k] = self.sum(a, k) + self.sum(b, k);
                survivors.push(k);
            }
        }

        self.sums.push(row);
        self.alive.push(true);
        self.key.push(self.key[a].min(self.key[b]));
        self.size.push(self.size[a] + self.size[b]);
        survivors
    }

    fn roots(&self) -> Vec<usize> {
        let mut roots: Vec<usize> = (0..self.alive.len()).filter(|&s| self.alive[s]).collect();
        roots.sort_by_key(|&s| self.key[s]);
        roots
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    sum: u64,
    pairs: u64,
    keys: (usize, usize),
    slots: (usize, usize),
}

impl Candidate {
    fn distance(&self) -> f64 {
        self.sum as f64 / (self.pairs as f64 * f64::from(SCALE))
    }

    fn cmp_linkage(&self, other: &Self) -> Ordering {
        let lhs = u128::from(self.sum) * u128::from(other.pairs);
        let rhs = u128::from(other.sum) * u128::from(self.pairs);
        lhs.cmp(&rhs)
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_linkage(other)
            .then_with(|| self.keys.cmp(&other.keys))
            .then_with(|| self.slots.cmp(&other.slots))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

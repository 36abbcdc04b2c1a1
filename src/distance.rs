//! Jaccard distances between entity reference sets.
//!
//! ```text
//! J(A, B) = |A ∩ B| / |A ∪ B|        d(A, B) = 1 - J(A, B)
//! ```
//!
//! Two empty sets share nothing demonstrable, so their similarity is taken to
//! be 0 and their distance 1.
//!
//! ## Precision
//!
//! Stored distances are rounded to two decimal digits, half away from zero.
//! The rounding is done on the exact rational `|A Δ B| / |A ∪ B|`, so values
//! such as `1/8 = 0.125` round to `0.13` regardless of binary floating point.
//! Precomputed distances given as `f64` are read as the decimal they were
//! written as: `0.145` (stored as `0.14499999...`) becomes `0.15`.
//! The matrix keeps each cell as an integer number of hundredths; averages
//! over those cells are therefore exact, which makes tie detection during
//! clustering reproducible.

use std::collections::BTreeSet;
use std::fmt;

use crate::catalog::EntityCatalog;
use crate::error::{Error, Result};

/// Number of stored units per distance 1.0 (two decimal digits).
pub const SCALE: u16 = 100;

/// Jaccard similarity of two sets; `0.0` when both are empty.
pub fn jaccard_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let (inter, union) = overlap(a, b);
    if union == 0 {
        return 0.0;
    }
    inter as f64 / union as f64
}

/// Jaccard distance of two sets (unrounded); `1.0` when both are empty.
pub fn jaccard_distance(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    1.0 - jaccard_similarity(a, b)
}

/// Jaccard distance in hundredths, rounded half away from zero.
pub fn jaccard_units(a: &BTreeSet<String>, b: &BTreeSet<String>) -> u16 {
    let (inter, union) = overlap(a, b);
    if union == 0 {
        return SCALE;
    }
    round_ratio(union - inter, union)
}

/// Round a value in `[0, 1]` to hundredths, half away from zero.
pub fn round_distance(d: f64) -> f64 {
    f64::from(to_units(d)) / f64::from(SCALE)
}

// Slack absorbs the representation error of decimal half-way points.
const HALF_SLACK: f64 = 1e-9;

/// Convert a distance in `[0, 1]` to hundredths, half away from zero.
fn to_units(d: f64) -> u16 {
    let scale = f64::from(SCALE);
    (d * scale + HALF_SLACK).round().clamp(0.0, scale) as u16
}

fn overlap(a: &BTreeSet<String>, b: &BTreeSet<String>) -> (usize, usize) {
    let inter = a.intersection(b).count();
    (inter, a.len() + b.len() - inter)
}

// floor(SCALE * num / den + 1/2), exact for num <= den
fn round_ratio(num: usize, den: usize) -> u16 {
    let scale = usize::from(SCALE);
    let units = (2 * scale * num + den) / (2 * den);
    // bounded by SCALE since num <= den
    units.min(scale) as u16
}

/// Symmetric matrix of pairwise distances, zero on the diagonal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistanceMatrix {
    labels: Vec<String>,
    units: Vec<u16>,
}

impl DistanceMatrix {
    /// Compute pairwise Jaccard distances over a catalog.
    ///
    /// Fails with [`Error::EmptyInput`] for an empty catalog and with
    /// [`Error::SingleEntity`] when there is only one entity.
    pub fn from_catalog(catalog: &EntityCatalog) -> Result<Self> {
        let n = catalog.len();
        match catalog.entities() {
            [] => return Err(Error::EmptyInput),
            [only] => {
                return Err(Error::SingleEntity {
                    identifier: only.id().to_string(),
                })
            }
            _ => {}
        }

        let entities = catalog.entities();
        let mut units = vec![0u16; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = jaccard_units(entities[i].references(), entities[j].references());
                units[i * n + j] = d;
                units[j * n + i] = d;
            }
        }

        Ok(Self {
            labels: catalog.identifiers(),
            units,
        })
    }

    /// Build a matrix from precomputed distances.
    ///
    /// Values are rounded to hundredths. The input must be square, match the
    /// label count, be symmetric after rounding, have a zero diagonal, and stay
    /// within `[0, 1]`.
    pub fn from_rows(labels: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        let n = labels.len();
        match n {
            0 => return Err(Error::EmptyInput),
            1 => {
                return Err(Error::SingleEntity {
                    identifier: labels[0].clone(),
                })
            }
            _ => {}
        }
        if rows.len() != n || rows.iter().any(|r| r.len() != n) {
            return Err(Error::InvalidParameter {
                name: "rows",
                message: "must be a square matrix matching the label count",
            });
        }

        let mut units = vec![0u16; n * n];
        for (i, row) in rows.iter().enumerate() {
            for (j, &d) in row.iter().enumerate() {
                if !(0.0..=1.0).contains(&d) {
                    return Err(Error::InvalidParameter {
                        name: "rows",
                        message: "distances must lie in [0, 1]",
                    });
                }
                units[i * n + j] = to_units(d);
            }
        }

        for i in 0..n {
            if units[i * n + i] != 0 {
                return Err(Error::InvalidParameter {
                    name: "rows",
                    message: "diagonal must be zero",
                });
            }
            for j in (i + 1)..n {
                if units[i * n + j] != units[j * n + i] {
                    return Err(Error::InvalidParameter {
                        name: "rows",
                        message: "matrix must be symmetric",
                    });
                }
            }
        }

        Ok(Self { labels, units })
    }

    /// Matrix dimension.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false: construction requires at least two entities.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Entity identifiers, in row order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Distance between entities `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        f64::from(self.units(i, j)) / f64::from(SCALE)
    }

    /// Distance between entities `i` and `j`, in hundredths.
    #[inline]
    pub fn units(&self, i: usize, j: usize) -> u16 {
        let n = self.len();
        assert!(i < n && j < n, "index ({i}, {j}) out of bounds for {n}x{n} matrix");
        self.units[i * n + j]
    }

    /// Materialize the matrix as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        let n = self.len();
        (0..n)
            .map(|i| (0..n).map(|j| self.get(i, j)).collect())
            .collect()
    }
}

impl fmt::Display for DistanceMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max(4);

        write!(f, "{:width$}", "")?;
        for label in &self.labels {
            write!(f, " {label:>width$}")?;
        }
        writeln!(f)?;

        for (i, label) in self.labels.iter().enumerate() {
            write!(f, "{label:width$}")?;
            for j in 0..self.len() {
                write!(f, " {:>width$.2}", self.get(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Entity;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn scenario() -> EntityCatalog {
        EntityCatalog::from_entities([
            Entity::new("P1", ["a", "b", "c"]),
            Entity::new("P2", ["a", "b"]),
            Entity::new("P3", ["x", "y"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_jaccard_basic() {
        assert!((jaccard_similarity(&set(&["a", "b", "c"]), &set(&["a", "b"])) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(jaccard_distance(&set(&["a"]), &set(&["a"])), 0.0);
        assert_eq!(jaccard_distance(&set(&["a"]), &set(&["b"])), 1.0);
    }

    #[test]
    fn test_both_empty_is_max_distance() {
        let empty = BTreeSet::new();
        assert_eq!(jaccard_similarity(&empty, &empty), 0.0);
        assert_eq!(jaccard_distance(&empty, &empty), 1.0);
        assert_eq!(jaccard_units(&empty, &empty), 100);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // 1/8 = 0.125 -> 0.13; 7/8 = 0.875 -> 0.88
        let a = set(&["a"]);
        let b = set(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        assert_eq!(jaccard_units(&a, &b), 88);
        let c = set(&["a", "b", "c", "d", "e", "f", "g"]);
        assert_eq!(jaccard_units(&c, &b), 13);
        // 1/3 -> 0.33, 2/3 -> 0.67
        assert_eq!(round_ratio(1, 3), 33);
        assert_eq!(round_ratio(2, 3), 67);
        assert_eq!(round_distance(0.125), 0.13);
    }

    #[test]
    fn test_decimal_half_way_points_round_up() {
        // 0.145 and 0.575 sit just below the half-way point in binary
        assert_eq!(round_distance(0.145), 0.15);
        assert_eq!(round_distance(0.575), 0.58);
        assert_eq!(round_distance(0.144), 0.14);
        assert_eq!(round_distance(1.0), 1.0);
        assert_eq!(round_distance(0.0), 0.0);

        let labels = vec!["a".to_string(), "b".to_string()];
        let m = DistanceMatrix::from_rows(labels, &[vec![0.0, 0.145], vec![0.145, 0.0]]).unwrap();
        assert_eq!(m.get(0, 1), 0.15);
        assert_eq!(m.units(1, 0), 15);
    }

    #[test]
    fn test_matrix_scenario() {
        let m = DistanceMatrix::from_catalog(&scenario()).unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.get(0, 1), 0.33);
        assert_eq!(m.get(0, 2), 1.0);
        assert_eq!(m.get(1, 2), 1.0);
        for i in 0..3 {
            assert_eq!(m.get(i, i), 0.0);
            for j in 0..3 {
                assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
    }

    #[test]
    fn test_matrix_rejects_degenerate_catalogs() {
        let empty = EntityCatalog::new();
        assert!(matches!(
            DistanceMatrix::from_catalog(&empty),
            Err(Error::EmptyInput)
        ));

        let single = EntityCatalog::from_entities([Entity::new("only", ["a"])]).unwrap();
        assert!(matches!(
            DistanceMatrix::from_catalog(&single),
            Err(Error::SingleEntity { ref identifier }) if identifier == "only"
        ));
    }

    #[test]
    fn test_matrix_empty_reference_sets() {
        let catalog = EntityCatalog::from_entities([
            Entity::new("e1", Vec::<String>::new()),
            Entity::new("e2", Vec::<String>::new()),
        ])
        .unwrap();
        let m = DistanceMatrix::from_catalog(&catalog).unwrap();
        assert_eq!(m.get(0, 1), 1.0);
        assert_eq!(m.get(0, 0), 0.0);
    }

    #[test]
    fn test_from_rows_validation() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert!(DistanceMatrix::from_rows(labels.clone(), &[vec![0.0, 0.5], vec![0.5, 0.0]]).is_ok());
        assert!(DistanceMatrix::from_rows(labels.clone(), &[vec![0.0, 0.5], vec![0.4, 0.0]]).is_err());
        assert!(DistanceMatrix::from_rows(labels.clone(), &[vec![0.1, 0.5], vec![0.5, 0.0]]).is_err());
        assert!(DistanceMatrix::from_rows(labels.clone(), &[vec![0.0, 1.5], vec![1.5, 0.0]]).is_err());
        assert!(DistanceMatrix::from_rows(labels, &[vec![0.0, 0.5]]).is_err());
    }

    #[test]
    fn test_display_has_two_decimals() {
        let m = DistanceMatrix::from_catalog(&scenario()).unwrap();
        let text = m.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("P1") && lines[0].contains("P3"));
        assert!(lines[1].starts_with("P1"));
        assert!(lines[1].contains("0.33"));
        assert!(lines[3].contains("1.00"));
    }
}

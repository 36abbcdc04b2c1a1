use super::tree::Hierarchy;
use crate::catalog::EntityCatalog;
use crate::error::Result;

/// Common interface for hierarchical clusterers over an entity catalog.
pub trait Clustering {
    /// Cluster the catalog and return the merge tree (or flat forest).
    fn fit(&self, catalog: &EntityCatalog) -> Result<Hierarchy>;

    /// Cluster the catalog and return one cluster label per entity, in catalog order.
    ///
    /// Labels number the top-level clusters by their first member in catalog order.
    fn fit_predict(&self, catalog: &EntityCatalog) -> Result<Vec<usize>> {
        Ok(self.fit(catalog)?.assignments())
    }
}

use thiserror::Error;

/// Errors returned by catalog construction, distance computation and clustering.
#[derive(Debug, Error)]
pub enum Error {
    /// The catalog holds no entities.
    #[error("empty input")]
    EmptyInput,

    /// A pairwise structure was requested for a catalog holding a single entity.
    #[error("single entity {identifier:?}: at least two entities are required")]
    SingleEntity {
        /// Identifier of the lone entity.
        identifier: String,
    },

    /// Flat-cut threshold outside `[0, 1]` (or NaN).
    #[error("invalid threshold {0}: must be a merge distance in [0, 1]")]
    InvalidThreshold(f64),

    /// Requested cluster count is incompatible with the catalog.
    #[error("invalid cluster count: requested {requested}, but catalog has {n_items} entities")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of entities in the catalog.
        n_items: usize,
    },

    /// Two entities share an identifier.
    #[error("duplicate entity identifier {0:?}")]
    DuplicateEntity(String),

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Reading records failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON export failed.
    #[error("json export failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;

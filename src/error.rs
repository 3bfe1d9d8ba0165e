// src/error.rs

use thiserror::Error;

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;

/// The kind of a [`ProjectionError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotSquare,
    NotSymmetric,
    TooFewSamples,
    TooFewControlPoints,
    ControlCountMismatch,
    DimensionMismatch,
    ControlIndexOutOfRange,
    DuplicateControlIndex,
    InvalidComponentCount,
    InvalidTolerance,
    NumericalFailure,
    Io,
    Serialization,
}

/// Errors returned by the MDS and LAMP engines.
///
/// Every shape problem is detected before any numeric work starts, so a
/// returned error never comes with a partial result.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// Distance matrix has a different number of rows and columns.
    #[error("matrix is not square [{rows}, {cols}]")]
    NotSquare { rows: usize, cols: usize },

    /// `dist[row][col]` differs from `dist[col][row]`.
    #[error("matrix is not symmetric: entry ({row}, {col}) differs from its transpose")]
    NotSymmetric { row: usize, col: usize },

    #[error("too few samples provided ({samples}); at least {minimum} are required")]
    TooFewSamples { samples: usize, minimum: usize },

    #[error("too few control points ({count}); at least 2 are required")]
    TooFewControlPoints { count: usize },

    /// Number of control indices and number of control projections differ.
    #[error("{indices} control points given but {projections} control projections provided")]
    ControlCountMismatch { indices: usize, projections: usize },

    /// Projected space has more dimensions than the original space, or a
    /// matrix to transform has the wrong width.
    #[error("dimension mismatch: original data has {original} dimensions, projection data has {projected}")]
    DimensionMismatch { original: usize, projected: usize },

    #[error("control index {index} is out of range for {samples} samples")]
    ControlIndexOutOfRange { index: usize, samples: usize },

    #[error("control index {index} appears more than once")]
    DuplicateControlIndex { index: usize },

    #[error("requested {requested} components from {samples} samples")]
    InvalidComponentCount { requested: usize, samples: usize },

    #[error("tolerance must be finite and in range, got {0}")]
    InvalidTolerance(f64),

    /// Eigendecomposition or SVD failed inside the linear algebra backend.
    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ProjectionError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProjectionError::NotSquare { .. } => ErrorKind::NotSquare,
            ProjectionError::NotSymmetric { .. } => ErrorKind::NotSymmetric,
            ProjectionError::TooFewSamples { .. } => ErrorKind::TooFewSamples,
            ProjectionError::TooFewControlPoints { .. } => ErrorKind::TooFewControlPoints,
            ProjectionError::ControlCountMismatch { .. } => ErrorKind::ControlCountMismatch,
            ProjectionError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            ProjectionError::ControlIndexOutOfRange { .. } => ErrorKind::ControlIndexOutOfRange,
            ProjectionError::DuplicateControlIndex { .. } => ErrorKind::DuplicateControlIndex,
            ProjectionError::InvalidComponentCount { .. } => ErrorKind::InvalidComponentCount,
            ProjectionError::InvalidTolerance(_) => ErrorKind::InvalidTolerance,
            ProjectionError::NumericalFailure(_) => ErrorKind::NumericalFailure,
            ProjectionError::Io(_) => ErrorKind::Io,
            ProjectionError::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// True for the shape/size failures reported by the input validators.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotSquare
                | ErrorKind::NotSymmetric
                | ErrorKind::TooFewSamples
                | ErrorKind::TooFewControlPoints
                | ErrorKind::ControlCountMismatch
                | ErrorKind::DimensionMismatch
                | ErrorKind::ControlIndexOutOfRange
                | ErrorKind::DuplicateControlIndex
                | ErrorKind::InvalidComponentCount
        )
    }
}

/// Backend decomposition errors cross the trait seam boxed; they all become
/// `NumericalFailure`.
impl From<Box<dyn std::error::Error + Send + Sync>> for ProjectionError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        ProjectionError::NumericalFailure(err.to_string())
    }
}

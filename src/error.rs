//! Error types for checkpoint remapping
//!
//! Weight loading is all-or-nothing: every error here aborts the current
//! load pass. A partially loaded model is worse than a failed load, so no
//! variant is ever downgraded to a warning or retried.

use std::fmt;

/// Crate-wide error type
#[derive(Debug)]
pub enum InjertarError {
    /// A checkpoint variable name matched no skip rule and no mapping rule.
    ///
    /// Indicates a checkpoint/architecture mismatch or a missing catalog
    /// entry. Silently dropping the tensor would risk loading a
    /// structurally incomplete model, so this is fatal.
    UnresolvedName {
        /// The offending checkpoint variable name
        name: String,
    },

    /// A resolved target path does not exist in the parameter tree.
    PathNotFound {
        /// Dotted path that failed to resolve
        path: String,
    },

    /// Transformed checkpoint shape differs from the destination shape.
    ///
    /// Never coerced: no reshape, no broadcast.
    ShapeMismatch {
        /// Checkpoint variable name being assigned
        name: String,
        /// Shape of the (possibly transposed) source tensor
        source: Vec<usize>,
        /// Shape of the destination parameter
        target: Vec<usize>,
    },

    /// The checkpoint could not be opened or mapped into memory.
    ///
    /// Reported once, before any mapping work begins.
    MissingDependency {
        /// Checkpoint location that was probed
        path: String,
        /// Underlying I/O failure
        reason: String,
    },

    /// The same target path was assigned twice within one load pass.
    ///
    /// Each parameter is written at most once per pass; a second write
    /// means two source names resolved to the same slot.
    DuplicateAssignment {
        /// Dotted path that was targeted twice
        path: String,
    },

    /// A tensor could not be constructed from the given shape and data.
    InvalidShape {
        /// Why the shape was rejected
        reason: String,
    },

    /// The checkpoint container itself is malformed.
    FormatError {
        /// What failed while parsing the container
        reason: String,
    },
}

// Display is written by hand because `ShapeMismatch` has a field named
// `source`, which thiserror's derive would force to implement
// `std::error::Error`.
impl fmt::Display for InjertarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedName { name } => {
                write!(f, "unresolved checkpoint variable '{name}': no mapping rule matches")
            }
            Self::PathNotFound { path } => {
                write!(f, "parameter path '{path}' not found in target model")
            }
            Self::ShapeMismatch { name, source, target } => {
                write!(
                    f,
                    "shape mismatch for '{name}': checkpoint {source:?} vs parameter {target:?}"
                )
            }
            Self::MissingDependency { path, reason } => {
                write!(
                    f,
                    "checkpoint unavailable at '{path}': {reason}. \
                     Download the pretrained checkpoint and point the checkpoint path at it"
                )
            }
            Self::DuplicateAssignment { path } => {
                write!(f, "parameter '{path}' assigned more than once in a single load pass")
            }
            Self::InvalidShape { reason } => {
                write!(f, "invalid shape: {reason}")
            }
            Self::FormatError { reason } => {
                write!(f, "checkpoint format error: {reason}")
            }
        }
    }
}

impl std::error::Error for InjertarError {}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, InjertarError>;

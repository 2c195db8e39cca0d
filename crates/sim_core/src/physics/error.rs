//! Error types for the collision core

use crate::scene::BodyId;
use thiserror::Error;

/// Failures of the small linear-equation solver
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverError {
    /// One of the basis vectors has (near) zero length
    #[error("basis vector {index} has zero length")]
    ZeroLengthBasis {
        /// Position of the offending vector in the argument list
        index: usize,
    },

    /// The basis does not span the space
    #[error("basis vectors are linearly dependent")]
    LinearlyDependent,
}

/// Programmer errors surfaced by collision queries
///
/// Geometric degeneracies never show up here; resolvers turn those into
/// "no collision" results.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionError {
    /// A composite primitive with no members was queried
    #[error("composite primitive has no members")]
    EmptyComposite,

    /// A primitive refers to a body that is not in the body store
    #[error("primitive refers to unknown body {0:?}")]
    UnknownBody(BodyId),
}

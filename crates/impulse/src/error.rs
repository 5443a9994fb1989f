use thiserror::Error;

use crate::body::BodyHandle;
use crate::constraints::ConstraintHandle;

/// Errors raised by integration mistakes in the caller.
///
/// Geometric "no contact" outcomes are never errors; narrow-phase routines
/// return `None` for those.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("no pool registered under key `{0}`")]
    UnregisteredPoolKey(&'static str),
    #[error("pool `{0}` holds a different object type")]
    PoolTypeMismatch(&'static str),
    #[error("unknown body {0:?}")]
    UnknownBody(BodyHandle),
    #[error("unknown constraint {0:?}")]
    UnknownConstraint(ConstraintHandle),
    #[error("invalid shape: {0}")]
    InvalidShape(&'static str),
}

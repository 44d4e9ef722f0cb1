use thiserror::Error;

use crate::Dir;

/// A rotation was requested at a node lacking the child it would lift.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum RotateError {
    #[error("node has no {0} child to rotate up")]
    MissingChild(Dir),
}

/// A shape transformation was requested between trees it cannot relate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("trees hold different key sets (target has {target_len} keys, source has {source_len})")]
    KeySetMismatch { target_len: usize, source_len: usize },
}

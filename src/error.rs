use crate::tag::{tag_name, TypeTag};
use std::collections::TryReserveError;
use thiserror::Error;

/// Errors that can occur when using the dynamic containers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DynError {
    /// Growing or creating storage failed; the container is left as it was
    #[error("failed to allocate storage for {requested} elements")]
    AllocationFailure {
        requested: usize,
        /// The allocator's report, absent when the size itself overflowed
        #[source]
        source: Option<TryReserveError>,
    },

    /// The data does not have the type the container stores
    #[error("type mismatch: expected {}, found {}", tag_name(.expected), tag_name(.found))]
    TypeMismatch {
        expected: Option<TypeTag>,
        found: Option<TypeTag>,
    },

    /// The index does not name an existing element
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The raw payload cannot be read as the requested tag
    #[error("invalid {tag} payload: {reason}")]
    InvalidPayload { tag: TypeTag, reason: &'static str },

    /// The operation has no defined behaviour for this tag (0 is the empty tag)
    #[error("unsupported data type (tag {tag})")]
    UnsupportedType { tag: u16 },
}

impl DynError {
    pub(crate) fn allocation(requested: usize, source: TryReserveError) -> Self {
        DynError::AllocationFailure {
            requested,
            source: Some(source),
        }
    }

    /// A requested size that does not fit in `usize`.
    pub(crate) fn overflow() -> Self {
        DynError::AllocationFailure {
            requested: usize::MAX,
            source: None,
        }
    }

    /// Emits the error on the diagnostic channel and hands it back for returning.
    pub(crate) fn logged(self, operation: &'static str) -> Self {
        tracing::error!(operation, error = %self, "dynamic container operation failed");
        self
    }

    /// Emits the error on the diagnostic channel where the operation degrades
    /// instead of failing.
    pub(crate) fn report(self, operation: &'static str) {
        tracing::error!(operation, error = %self, "dynamic container operation degraded");
    }

    pub(crate) fn unsupported(tag: Option<TypeTag>) -> Self {
        DynError::UnsupportedType {
            tag: tag.map_or(0, TypeTag::raw),
        }
    }
}

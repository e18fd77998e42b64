//! Error and outcome types for palette operations.

use thiserror::Error;

/// Failure to decode a stored palette record.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed palette record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("palette record field '{field}' is not valid percent-encoded UTF-8")]
    Encoding { field: String },

    #[error("palette record uuid '{found}' does not match its key '{key}'")]
    KeyMismatch { key: String, found: String },
}

/// Recoverable failures of store operations. No state changes when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    #[error("palette not found: {uuid}")]
    PaletteNotFound { uuid: String },

    #[error("palette uuid {uuid} appears more than once")]
    DuplicatePaletteUuid { uuid: String },

    #[error("color {id} not found in palette {uuid}")]
    ColorNotFound { uuid: String, id: String },

    #[error("color id {id} appears more than once in palette {uuid}")]
    DuplicateColorId { uuid: String, id: String },

    #[error("invalid reorder for palette {uuid}: {violation}")]
    InvalidReorder { uuid: String, violation: ReorderViolation },
}

/// Why an ordering is not a permutation of a palette's current color ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderViolation {
    #[error("expected {expected} ids, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("id {0} is listed twice")]
    Duplicate(String),

    #[error("id {0} is not in the palette")]
    Unknown(String),
}

/// Whether the durable record kept up with an in-memory change.
///
/// The in-memory change is applied in both cases; `NotPersisted` means the
/// change may not survive a reload.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Persisted,
    NotPersisted { key: String, reason: String },
}

impl WriteOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }
}

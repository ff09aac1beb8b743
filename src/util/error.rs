//! Errors raised while building catalogs or generating a unit.
//!
//! Every error here is a defect in static input, never a transient condition, so nothing is
//! retried. A run either produces the complete unit or stops before writing anything.

use crate::collector::{CollectorVariant, Operation};
use crate::schema::ObjectKind;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenError {
    /// A kind was named or looked up that the registry does not know.
    #[error("unknown object kind `{0}`")]
    UnknownKind(String),

    /// A variant was named or looked up that the catalog does not know.
    #[error("unknown collector variant `{0}`")]
    UnknownVariant(String),

    /// The schema contradicts itself. Reported with the offending kind.
    #[error("malformed schema for {kind}: {reason}")]
    MalformedSchema { kind: ObjectKind, reason: String },

    /// A variant contradicts itself.
    #[error("malformed collector variant {variant}: {reason}")]
    MalformedVariant {
        variant: CollectorVariant,
        reason: String,
    },

    /// The caller asked to emit a routine the host never declares for this kind.
    #[error("{kind} declares no {operation} routine for {variant}")]
    UnsupportedCombinationRequested {
        kind: ObjectKind,
        operation: Operation,
        variant: CollectorVariant,
    },

    /// An option value failed to parse or validate.
    #[error("invalid option {name}={value}: {reason}")]
    Options {
        name: String,
        value: String,
        reason: String,
    },

    /// The output sink refused a write.
    #[error("output sink rejected generated text")]
    Sink(#[from] std::fmt::Error),
}

impl GenError {
    pub(crate) fn malformed(kind: ObjectKind, reason: impl Into<String>) -> Self {
        GenError::MalformedSchema {
            kind,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GenError>;

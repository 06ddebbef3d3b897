//! Change Detection Exceptions
//!
//! Corresponds to angular2/src/core/change_detection/exceptions.ts

use crate::change_detection::value::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChangeDetectionError>;

#[derive(Debug, Error)]
pub enum ChangeDetectionError {
    /// A binding changed during the verification pass.
    #[error("Expression '{expression}' has changed after it was checked. Previous value: '{previous}'. Current value: '{current}'")]
    ExpressionChangedAfterItHasBeenChecked {
        expression: String,
        previous: Value,
        current: Value,
    },

    #[error("Unknown lifecycle event '{0}'")]
    UnknownLifecycleEvent(String),

    #[error("Unknown operation {0}")]
    UnknownOperation(String),

    #[error("Record {record} reads record {dependency}, which does not precede it")]
    RecordOrder { record: usize, dependency: usize },

    #[error("Skip record {record} has an invalid block end {end:?}")]
    SkipRegion { record: usize, end: Option<usize> },

    #[error("Record {record} ({mode}) is malformed: {reason}")]
    MalformedRecord {
        record: usize,
        mode: String,
        reason: String,
    },

    #[error("Binding {0} does not exist")]
    MissingBinding(usize),

    #[error("Binding {0} has no target")]
    MissingBindingTarget(usize),

    #[error("Binding {0} is not owned by a directive")]
    MissingDirectiveRecord(usize),

    #[error("Cannot find directive {0}")]
    MissingDirective(String),

    #[error("Cannot find change detector for directive {0}")]
    MissingDetector(String),

    #[error("Cannot find pipe '{0}'")]
    PipeNotFound(String),

    #[error("Invalid argument '{value}' for pipe '{pipe}'")]
    InvalidPipeArgument { pipe: String, value: Value },

    #[error("Cannot find '{0}'")]
    UnknownLocal(String),

    #[error("Cannot {operation} of {receiver}")]
    InvalidReceiver { operation: String, receiver: String },

    #[error("{0} is not a function")]
    NotAFunction(String),

    #[error("Attempt to use a dehydrated detector: {0}")]
    DehydratedDetector(String),

    #[error("Failed to read change detector definition: {0}")]
    Definition(#[from] serde_json::Error),
}

impl ChangeDetectionError {
    /// Verification failures leave the detector usable; every other error
    /// puts it into the errored state.
    pub fn is_expression_changed(&self) -> bool {
        matches!(
            self,
            ChangeDetectionError::ExpressionChangedAfterItHasBeenChecked { .. }
        )
    }
}

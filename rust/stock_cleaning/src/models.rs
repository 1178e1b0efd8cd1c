// src/models.rs

use serde::{Deserialize, Serialize};

/// Pass/fail result of a validation stage. An error verdict is the routine
/// outcome for malformed upstream data, not a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub error: bool,
    pub message: String,
}

impl ValidationVerdict {
    pub fn pass(message: impl Into<String>) -> Self {
        ValidationVerdict {
            error: false,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        ValidationVerdict {
            error: true,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.error
    }
}

// Per-type checks short-circuit with `?` on a String message
impl From<Result<(), String>> for ValidationVerdict {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => ValidationVerdict::pass("Validation successful."),
            Err(message) => ValidationVerdict::fail(message),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::consts::STATUS_SELECT_FILES;

/// What a client polls while a batch is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStatus {
    pub status: String,
    pub progress_percent: f64,
    pub output_ready: bool,
}

impl Default for BatchStatus {
    fn default() -> Self {
        Self {
            status: STATUS_SELECT_FILES.to_owned(),
            progress_percent: 0.0,
            output_ready: false,
        }
    }
}

/// A file that did not make it into the output, with the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: String,
    pub message: String,
}

/// Response to an upload once the whole batch went through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertReport {
    #[serde(flatten)]
    pub status: BatchStatus,
    /// Files that made it into the output, in output order.
    pub files: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

//! Environment setup instructions returned by external stages.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Instructions for installing a missing external tool.
///
/// Returned by the transcription service when the environment lacks a
/// required dependency. Displayed to the user; never acted on automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InstallationInstructions {
    /// Short title (e.g. the missing tool's name)
    pub title: String,

    /// Human-readable explanation
    pub message: String,

    /// Shell commands to run, in order
    #[serde(default)]
    pub commands: Vec<String>,

    /// Link to installation documentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
}

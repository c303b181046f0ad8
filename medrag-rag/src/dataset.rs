//! Loader for line-delimited JSON QA datasets used by batch evaluation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// One QA record: an identifier, a question, up to five lettered options,
/// and the ground-truth answer label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaRecord {
    /// Record identifier.
    pub uuid: String,
    /// The question text.
    pub question: String,
    /// Option A, when present and non-blank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "A")]
    pub option_a: Option<String>,
    /// Option B.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "B")]
    pub option_b: Option<String>,
    /// Option C.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "C")]
    pub option_c: Option<String>,
    /// Option D.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "D")]
    pub option_d: Option<String>,
    /// Option E.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "E")]
    pub option_e: Option<String>,
    /// The ground-truth answer label (e.g. `"A"`).
    pub answer: String,
}

impl QaRecord {
    /// Format the lettered options block, skipping absent or blank options.
    ///
    /// Returns a single space when the record has no options, so the block
    /// can be substituted into prompts unconditionally.
    pub fn format_options(&self) -> String {
        let letters = [
            ("A", &self.option_a),
            ("B", &self.option_b),
            ("C", &self.option_c),
            ("D", &self.option_d),
            ("E", &self.option_e),
        ];
        let mut out = String::new();
        for (letter, option) in letters {
            if let Some(text) = option {
                if !text.trim().is_empty() {
                    out.push_str(&format!("{letter}. {text} \n"));
                }
            }
        }
        if out.is_empty() { " ".to_string() } else { out }
    }
}

/// Load a QA dataset from a line-delimited JSON file.
///
/// # Errors
///
/// Returns [`RagError::InvalidArgument`] if the file is missing or a line
/// cannot be parsed.
pub async fn load_qa_dataset(path: impl AsRef<Path>) -> Result<Vec<QaRecord>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RagError::InvalidArgument(format!("cannot read '{}': {e}", path.display())))?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                RagError::InvalidArgument(format!(
                    "malformed record on line {} of '{}': {e}",
                    i + 1,
                    path.display()
                ))
            })
        })
        .collect()
}

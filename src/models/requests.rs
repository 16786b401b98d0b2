//! Request DTOs for the gateway API
//!
//! Defines the query strings accepted by the gateway's read endpoints.

use serde::Deserialize;

/// Query string carrying an exam name (`?exam=...`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamQuery {
    #[serde(default)]
    pub exam: Option<String>,
}

impl ExamQuery {
    /// Returns the exam name, rejecting a missing or blank value.
    pub fn require(&self) -> Result<&str, String> {
        match self.exam.as_deref().map(str::trim) {
            Some(exam) if !exam.is_empty() => Ok(exam),
            _ => Err("Query parameter 'exam' is required".to_string()),
        }
    }
}

//! Exam domain payloads
//!
//! Mirrors the JSON documents the exam REST API returns. Field names follow the
//! upstream's camelCase wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A registered candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Document id assigned by the store, absent before the first save
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
}

/// Registration payload for `POST /users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
}

impl NewUser {
    /// Returns an error message if the registration cannot be submitted.
    pub fn validate(&self) -> Option<String> {
        if self.email.trim().is_empty() {
            return Some("Email cannot be empty".to_string());
        }
        if !self.email.contains('@') {
            return Some("Email must contain '@'".to_string());
        }
        None
    }
}

/// One answer choice of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A multiple-choice exam question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "enunciado")]
    pub statement: String,
    #[serde(
        rename = "enunciadoImageUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub statement_image_url: Option<String>,
    pub options: Vec<QuestionOption>,
    pub correct_option_id: String,
    pub explanation: String,
    pub category: String,
    pub exam: String,
}

/// The candidate's choice for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub selected_option_id: String,
    pub is_correct: bool,
}

/// A graded exam attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub score: u32,
    pub total_questions: u32,
    pub answers: Vec<Answer>,
}

/// Submission payload for `POST /results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExamResult {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub score: u32,
    pub total_questions: u32,
    pub answers: Vec<Answer>,
}

impl NewExamResult {
    /// Returns an error message if the result cannot be submitted.
    pub fn validate(&self) -> Option<String> {
        if self.user_id.trim().is_empty() {
            return Some("userId cannot be empty".to_string());
        }
        if self.score > self.total_questions {
            return Some(format!(
                "score {} exceeds totalQuestions {}",
                self.score, self.total_questions
            ));
        }
        None
    }
}

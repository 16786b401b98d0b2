//! Request, response and domain models
//!
//! DTOs for the gateway's own endpoints and the exam payloads it proxies.

pub mod exam;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use exam::{Answer, ExamResult, NewExamResult, NewUser, Question, QuestionOption, User};
pub use requests::ExamQuery;
pub use responses::{HealthResponse, InvalidateResponse, StatsResponse};

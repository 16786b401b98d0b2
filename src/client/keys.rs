//! Cache key construction
//!
//! Keys are `"operation:arg1:arg2"`, one per logical read, so different
//! reads never collide in the shared cache. Arguments have `%` and `:`
//! escaped, so a `:` inside an id can never shift an argument boundary.

/// Operation names used as key prefixes.
pub const GET_EXAMS: &str = "getExams";
pub const GET_ANSWERED_QUESTIONS: &str = "getAnsweredQuestions";
pub const GET_USER_BY_EMAIL: &str = "getUserByEmail";
pub const GET_USER_RESULTS: &str = "getUserResults";

/// Builders for the keys of every cached read.
pub struct CacheKey;

impl CacheKey {
    pub fn exams() -> String {
        GET_EXAMS.to_string()
    }

    pub fn answered_questions(user_id: &str, exam: &str) -> String {
        format!(
            "{}{}",
            Self::answered_questions_prefix(user_id),
            escape(exam)
        )
    }

    pub fn user_by_email(email: &str) -> String {
        format!("{}:{}", GET_USER_BY_EMAIL, escape(email))
    }

    pub fn user_results(user_id: &str, exam: &str) -> String {
        format!("{}{}", Self::user_results_prefix(user_id), escape(exam))
    }

    /// Prefix shared by every answered-questions key of `user_id`.
    pub fn answered_questions_prefix(user_id: &str) -> String {
        format!("{}:{}:", GET_ANSWERED_QUESTIONS, escape(user_id))
    }

    /// Prefix shared by every results key of `user_id`.
    pub fn user_results_prefix(user_id: &str) -> String {
        format!("{}:{}:", GET_USER_RESULTS, escape(user_id))
    }
}

/// Percent-escapes the separator and the escape character itself.
fn escape(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len());
    for c in arg.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            c => out.push(c),
        }
    }
    out
}

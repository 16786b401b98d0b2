//! Upstream backend
//!
//! The seam where network I/O happens. `ExamClient` only talks to the exam
//! REST API through `ExamBackend`, so tests can swap in an in-memory fake.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};

// == Endpoint ==
/// An upstream path as raw segments plus query pairs.
///
/// Segments and query values are kept unencoded; the HTTP backend encodes
/// them when building the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
        }
    }

    /// Appends a query pair.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        for (i, (name, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, name, value)?;
        }
        Ok(())
    }
}

// == Backend Trait ==
/// Transport to the exam REST API.
#[async_trait]
pub trait ExamBackend: Send + Sync {
    /// Performs a GET and returns the decoded JSON body.
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value>;

    /// Performs a POST with a JSON body and returns the decoded JSON body.
    async fn post_json(&self, endpoint: &Endpoint, body: Value) -> Result<Value>;
}

// == HTTP Backend ==
/// Error body the exam API sends with non-success statuses.
#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: Option<String>,
}

/// `ExamBackend` over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    /// Creates a backend for the API rooted at `base_url`
    /// (for example `http://localhost:3001/api`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid upstream url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "Upstream url cannot be a base: {}",
                base_url
            )));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the full URL for `endpoint`, percent-encoding every segment and
    /// query value.
    pub fn url(&self, endpoint: &Endpoint) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Internal("Upstream url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(endpoint.segments());

        if !endpoint.query().is_empty() {
            url.query_pairs_mut().extend_pairs(endpoint.query());
        }
        Ok(url)
    }

    async fn handle_response(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<UpstreamErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| "Request failed".to_string());

        warn!(status = status.as_u16(), %message, "Upstream request failed");
        Err(ApiError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ExamBackend for HttpBackend {
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value> {
        let url = self.url(endpoint)?;
        debug!(%url, "GET upstream");
        let response = self.http.get(url).send().await?;
        Self::handle_response(response).await
    }

    async fn post_json(&self, endpoint: &Endpoint, body: Value) -> Result<Value> {
        let url = self.url(endpoint)?;
        debug!(%url, "POST upstream");
        let response = self.http.post(url).json(&body).send().await?;
        Self::handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_display() {
        let endpoint = Endpoint::new(["results", "user", "u1"]).with_query("exam", "associate");
        assert_eq!(endpoint.to_string(), "/results/user/u1?exam=associate");
    }

    #[test]
    fn test_url_encodes_segments_and_query() {
        let backend = backend("http://localhost:3001/api");
        let endpoint = Endpoint::new(["users", "email", "a b/c@x.com"]).with_query("exam", "a&b");

        let url = backend.url(&endpoint).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3001/api/users/email/a%20b%2Fc@x.com?exam=a%26b"
        );
    }

    #[test]
    fn test_url_with_trailing_slash_base() {
        let backend = backend("http://localhost:3001/api/");
        assert_eq!(backend.base_url().as_str(), "http://localhost:3001/api/");
        let url = backend.url(&Endpoint::new(["questions", "exams"])).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/api/questions/exams");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpBackend::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/questions/exams"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["associate", "professional"])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend(&format!("{}/api", server.uri()));
        let value = backend
            .get_json(&Endpoint::new(["questions", "exams"]))
            .await
            .unwrap();

        assert_eq!(value, json!(["associate", "professional"]));
    }

    #[tokio::test]
    async fn test_get_json_forwards_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/questions"))
            .and(query_param("exam", "associate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend(&format!("{}/api", server.uri()));
        let endpoint = Endpoint::new(["questions"]).with_query("exam", "associate");
        assert_eq!(backend.get_json(&endpoint).await.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users"))
            .and(body_json(json!({"email": "ana@example.com"})))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({"error": "User with this email already exists"})),
            )
            .mount(&server)
            .await;

        let backend = backend(&format!("{}/api", server.uri()));
        let err = backend
            .post_json(&Endpoint::new(["users"]), json!({"email": "ana@example.com"}))
            .await
            .unwrap_err();

        match err {
            ApiError::Upstream { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "User with this email already exists");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let backend = backend(&format!("{}/api", server.uri()));
        let err = backend
            .get_json(&Endpoint::new(["questions"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApiError::Upstream { status: 500, ref message } if message == "Request failed"
        ));
    }
}

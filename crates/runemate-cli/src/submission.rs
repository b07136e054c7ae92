//! Store submission client
//!
//! The archive is posted as the raw request body with a private-token header.
//! Network access sits behind [`Transport`] so response handling can be
//! exercised without a server.

use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const AUTH_HEADER: &str = "Authentication";
pub const CREDENTIAL_ENV: &str = "RUNEMATE_SUBMISSION_KEY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Error, Debug)]
pub enum SubmissionError {
    /// The review service answered 404; nothing is wrong with the submission
    #[error("The submission system is currently offline - please try again later.")]
    Offline,

    #[error("Submission rejected: {0}")]
    Rejected(String),

    #[error("Submission rejected: Unknown reason. Please contact the RuneMate team.")]
    UnknownRejection,

    #[error("Invalid response: {status}")]
    InvalidResponse { status: u16 },

    #[error("Submission request failed: {0}")]
    Transport(String),

    #[error("Failed to read archive {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SubmissionError {
    /// Whether re-running later may succeed without changes
    pub fn is_retry_later(&self) -> bool {
        matches!(self, SubmissionError::Offline)
    }
}

/// Status and body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

pub trait Transport {
    fn post(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: Vec<u8>,
    ) -> Result<TransportResponse, SubmissionError>;
}

/// Blocking HTTPS transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, SubmissionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("runemate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;
        Ok(ReqwestTransport { client })
    }
}

impl Transport for ReqwestTransport {
    fn post(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: Vec<u8>,
    ) -> Result<TransportResponse, SubmissionError> {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/gzip")
            .body(body);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request
            .send()
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

/// Outcome of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub archive: PathBuf,
    pub bytes: usize,
}

/// Map a review-service response onto success or a typed failure
pub fn interpret(status: u16, body: &str) -> Result<(), SubmissionError> {
    match status {
        200 => Ok(()),
        404 => Err(SubmissionError::Offline),
        _ => {
            let parsed: Value = serde_json::from_str(body)
                .map_err(|_| SubmissionError::InvalidResponse { status })?;
            match parsed.get("error") {
                Some(Value::String(message)) => Err(SubmissionError::Rejected(message.clone())),
                Some(other) => Err(SubmissionError::Rejected(other.to_string())),
                None => Err(SubmissionError::UnknownRejection),
            }
        }
    }
}

pub struct SubmissionClient {
    url: String,
    transport: Box<dyn Transport>,
}

impl SubmissionClient {
    pub fn new(url: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        SubmissionClient {
            url: url.into(),
            transport,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn submit(
        &self,
        archive: &Path,
        credential: &str,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let body = fs::read(archive).map_err(|source| SubmissionError::Io {
            path: archive.to_path_buf(),
            source,
        })?;
        let bytes = body.len();
        debug!("Posting {} bytes to {}", bytes, self.url);

        let headers = [(AUTH_HEADER, format!("Private-Token {}", credential))];
        let response = self.transport.post(&self.url, &headers, body)?;
        debug!("Review service answered {}", response.status);

        interpret(response.status, &response.body)?;
        Ok(SubmissionReceipt {
            archive: archive.to_path_buf(),
            bytes,
        })
    }
}

/// First non-empty credential among the flag, the environment and the config
pub fn resolve_credential(
    flag: Option<&str>,
    env: Option<&str>,
    config: Option<&str>,
) -> Option<String> {
    [flag, env, config]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// A request seen by [`FakeTransport`]
    #[derive(Debug, Clone)]
    pub(crate) struct Recorded {
        pub url: String,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    /// Answers every request with a canned response and records what it saw
    #[derive(Clone)]
    pub(crate) struct FakeTransport {
        pub response: Result<TransportResponse, String>,
        pub seen: Rc<RefCell<Vec<Recorded>>>,
    }

    impl FakeTransport {
        pub(crate) fn answering(status: u16, body: &str) -> Self {
            FakeTransport {
                response: Ok(TransportResponse {
                    status,
                    body: body.to_string(),
                }),
                seen: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl Transport for FakeTransport {
        fn post(
            &self,
            url: &str,
            headers: &[(&str, String)],
            body: Vec<u8>,
        ) -> Result<TransportResponse, SubmissionError> {
            self.seen.borrow_mut().push(Recorded {
                url: url.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), v.clone()))
                    .collect(),
                body,
            });
            self.response.clone().map_err(SubmissionError::Transport)
        }
    }

    fn archive() -> (TempDir, PathBuf) {
        let Ok(dir) = TempDir::new() else {
            panic!("tempdir");
        };
        let path = dir.path().join("runemate-publish.tar.gz");
        assert!(fs::write(&path, b"archive-bytes").is_ok());
        (dir, path)
    }

    #[test]
    fn test_success_sends_archive_and_token() {
        let (_dir, path) = archive();
        let fake = FakeTransport::answering(200, "");
        let client = SubmissionClient::new("https://example.test/submit", Box::new(fake.clone()));

        let result = client.submit(&path, "secret-key");
        assert!(result.is_ok_and(|r| r.bytes == 13));

        let seen = fake.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "https://example.test/submit");
        assert_eq!(seen[0].body, b"archive-bytes");
        assert_eq!(
            seen[0].headers,
            vec![(
                "Authentication".to_string(),
                "Private-Token secret-key".to_string()
            )]
        );
    }

    #[test]
    fn test_not_found_is_offline() {
        let (_dir, path) = archive();
        let client = SubmissionClient::new("u", Box::new(FakeTransport::answering(404, "")));
        let result = client.submit(&path, "k");
        let Err(err) = result else {
            panic!("expected failure");
        };
        assert!(matches!(err, SubmissionError::Offline));
        assert!(err.is_retry_later());
    }

    #[test]
    fn test_error_field_is_surfaced() {
        let result = interpret(500, r#"{"error":"duplicate submission"}"#);
        let Err(SubmissionError::Rejected(message)) = result else {
            panic!("expected rejection, got {result:?}");
        };
        assert_eq!(message, "duplicate submission");
    }

    #[test]
    fn test_json_without_error_is_unknown_rejection() {
        assert!(matches!(
            interpret(400, r#"{"status":"nope"}"#),
            Err(SubmissionError::UnknownRejection)
        ));
    }

    #[test]
    fn test_non_json_is_invalid_response() {
        let result = interpret(502, "<html>Bad Gateway</html>");
        assert!(matches!(
            result,
            Err(SubmissionError::InvalidResponse { status: 502 })
        ));
        assert!(result.is_err_and(|e| e.to_string() == "Invalid response: 502"));
    }

    #[test]
    fn test_missing_archive_is_io_error() {
        let client = SubmissionClient::new("u", Box::new(FakeTransport::answering(200, "")));
        let result = client.submit(Path::new("/nonexistent/runemate-publish.tar.gz"), "k");
        assert!(matches!(result, Err(SubmissionError::Io { .. })));
    }

    #[test]
    fn test_credential_resolution_order() {
        assert_eq!(
            resolve_credential(Some("flag"), Some("env"), Some("cfg")),
            Some("flag".to_string())
        );
        assert_eq!(
            resolve_credential(None, Some("env"), Some("cfg")),
            Some("env".to_string())
        );
        assert_eq!(
            resolve_credential(Some("  "), None, Some("cfg")),
            Some("cfg".to_string())
        );
        assert_eq!(resolve_credential(None, None, None), None);
    }
}

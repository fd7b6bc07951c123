use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{ExamBackend, ExamSession, JoinRequest, JoinRequestAck, JoinStatusReport, RoomCredential};
use crate::config::BackendConfig;
use crate::error::{Result, SessionError};

/// REST implementation of [`ExamBackend`] over reqwest.
///
/// Every call carries the fixed request timeout from [`BackendConfig`];
/// there is no retry layer here — failed calls surface to the initiating
/// user and the next poll cycle re-establishes truth.
pub struct HttpExamBackend {
    client: reqwest::Client,
    base_url: String,
}

/// Error payload shape shared by all backend endpoints
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl HttpExamBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Extract the backend's error message from a non-2xx response
    async fn failure_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(ErrorBody { message: Some(m) }) => m,
            _ => status.to_string(),
        }
    }
}

#[async_trait]
impl ExamBackend for HttpExamBackend {
    async fn exam_details(&self, exam_id: &str) -> Result<ExamSession> {
        let url = self.url(&format!("/exams/{}", urlencoding::encode(exam_id)));
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(SessionError::backend(Self::failure_message(response).await));
        }

        Ok(response.json().await?)
    }

    async fn request_join(&self, exam_id: &str) -> Result<JoinRequestAck> {
        let url = self.url(&format!("/exams/{}/join-requests", urlencoding::encode(exam_id)));
        let response = self.client.post(&url).send().await?;

        if !response.status().is_success() {
            return Err(SessionError::Admission(Self::failure_message(response).await));
        }

        let ack: JoinRequestAck = response.json().await?;
        tracing::info!(
            exam_id = %exam_id,
            request_id = %ack.request_id,
            is_rejoin = ack.is_rejoin,
            "Join request queued"
        );
        Ok(ack)
    }

    async fn join_status(&self, request_id: &str) -> Result<JoinStatusReport> {
        let url = self.url(&format!(
            "/join-requests/{}/status",
            urlencoding::encode(request_id)
        ));
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(SessionError::backend(Self::failure_message(response).await));
        }

        Ok(response.json().await?)
    }

    async fn join_room(&self, request_id: &str) -> Result<RoomCredential> {
        let url = self.url(&format!(
            "/join-requests/{}/room",
            urlencoding::encode(request_id)
        ));
        let response = self.client.post(&url).send().await?;

        if !response.status().is_success() {
            return Err(SessionError::Credential(Self::failure_message(response).await));
        }

        let credential: RoomCredential = response.json().await?;
        tracing::info!(
            request_id = %request_id,
            room_code = %credential.room_code,
            "Room credential minted"
        );
        Ok(credential)
    }

    async fn update_left_status(&self, exam_id: &str) -> Result<()> {
        let url = self.url(&format!(
            "/exams/{}/participants/left",
            urlencoding::encode(exam_id)
        ));
        let response = self.client.post(&url).send().await?;

        if !response.status().is_success() {
            return Err(SessionError::backend(Self::failure_message(response).await));
        }
        Ok(())
    }

    async fn pending_requests(&self, exam_id: &str) -> Result<Vec<JoinRequest>> {
        let url = self.url(&format!(
            "/exams/{}/join-requests/pending",
            urlencoding::encode(exam_id)
        ));
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(SessionError::backend(Self::failure_message(response).await));
        }

        Ok(response.json().await?)
    }

    async fn approve_request(&self, request_id: &str) -> Result<()> {
        let url = self.url(&format!(
            "/join-requests/{}/approve",
            urlencoding::encode(request_id)
        ));
        let response = self.client.post(&url).send().await?;

        if !response.status().is_success() {
            return Err(SessionError::Admission(Self::failure_message(response).await));
        }

        tracing::info!(request_id = %request_id, "Join request approved");
        Ok(())
    }

    async fn reject_request(&self, request_id: &str, reason: &str) -> Result<()> {
        let url = self.url(&format!(
            "/join-requests/{}/reject",
            urlencoding::encode(request_id)
        ));
        let response = self
            .client
            .post(&url)
            .json(&json!({ "reason": reason }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SessionError::Admission(Self::failure_message(response).await));
        }

        tracing::info!(request_id = %request_id, reason = %reason, "Join request rejected");
        Ok(())
    }

    async fn remove_student(&self, exam_id: &str, student_id: &str, reason: &str) -> Result<()> {
        let url = self.url(&format!(
            "/exams/{}/students/{}/remove",
            urlencoding::encode(exam_id),
            urlencoding::encode(student_id)
        ));
        let response = self
            .client
            .post(&url)
            .json(&json!({ "reason": reason }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SessionError::backend(Self::failure_message(response).await));
        }

        tracing::info!(
            exam_id = %exam_id,
            student_id = %student_id,
            "Student removal issued"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_backend(base_url: &str) -> HttpExamBackend {
        HttpExamBackend::new(&BackendConfig {
            base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let backend = test_backend("http://localhost:8080/api/");
        assert_eq!(
            backend.url("/exams/ex-1/join-requests"),
            "http://localhost:8080/api/exams/ex-1/join-requests"
        );
    }

    #[test]
    fn test_url_encodes_identifier_segments() {
        let backend = test_backend("http://localhost:8080/api");
        let encoded = format!(
            "/exams/{}/join-requests",
            urlencoding::encode("exam 2025/01")
        );
        assert_eq!(
            backend.url(&encoded),
            "http://localhost:8080/api/exams/exam%202025%2F01/join-requests"
        );
    }

    #[test]
    fn test_error_body_parses_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"message": "Exam window closed"}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("Exam window closed"));
    }
}

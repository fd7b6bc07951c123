//! Backend boundary: the REST contracts the coordinator consumes.
//!
//! The backend is authoritative for the admission queue and room presence;
//! clients only read it through polling and issue privileged writes. The
//! [`ExamBackend`] trait is the seam that lets tests substitute an
//! in-memory implementation for the HTTP client.

pub mod client;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Resolution state of a join request. Closed enumeration: the backend
/// never reports anything outside these three states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinStatus {
    Pending,
    Approved,
    Rejected,
}

impl JoinStatus {
    /// Terminal statuses release the request id: once observed, no further
    /// poll of the same request changes client-visible behavior.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JoinStatus::Pending)
    }
}

/// One student's attempt to enter the room for a given exam.
///
/// Created by the student action "request to join", resolved exclusively by
/// faculty action on the backend, terminal once resolved. A new disconnect
/// produces a new request, never a resurrection of a resolved one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub request_id: String,
    pub student_id: String,
    #[serde(default)]
    pub student_name: Option<String>,
    pub status: JoinStatus,
    #[serde(default)]
    pub is_rejoin: bool,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// Acknowledgement returned when a join request is queued.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequestAck {
    pub request_id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_rejoin: bool,
}

/// Level-triggered status snapshot for one join request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinStatusReport {
    pub status: JoinStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// Short-lived authorization artifact minted on approval and consumed
/// exactly once by the room session manager. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCredential {
    pub room_code: String,
    pub auth_token: String,
    #[serde(default)]
    pub exam_name: Option<String>,
    #[serde(default, rename = "duration")]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub exam_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub total_students: Option<u32>,
}

/// One scheduled exam instance. `end_time` is always resolved against
/// `exam_date` to produce the absolute expiry instant; expiry logic is
/// never relative to session start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSession {
    pub exam_id: String,
    #[serde(default)]
    pub exam_date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub total_students: Option<u32>,
}

/// The REST surface the coordinator consumes. All cross-role coordination
/// is mediated by the backend behind these operations.
#[async_trait]
pub trait ExamBackend: Send + Sync {
    /// Read one exam's schedule and mode
    async fn exam_details(&self, exam_id: &str) -> Result<ExamSession>;

    /// Student: queue a join (or rejoin) request for an exam
    async fn request_join(&self, exam_id: &str) -> Result<JoinRequestAck>;

    /// Student: re-read the full status of a pending request
    async fn join_status(&self, request_id: &str) -> Result<JoinStatusReport>;

    /// Student: consume an approved request to mint room credentials
    async fn join_room(&self, request_id: &str) -> Result<RoomCredential>;

    /// Best-effort presence update after a leave or disconnect
    async fn update_left_status(&self, exam_id: &str) -> Result<()>;

    /// Faculty: poll the pending join request queue
    async fn pending_requests(&self, exam_id: &str) -> Result<Vec<JoinRequest>>;

    /// Faculty: resolve a pending request as approved
    async fn approve_request(&self, request_id: &str) -> Result<()>;

    /// Faculty: resolve a pending request as rejected, with a reason shown
    /// to the student
    async fn reject_request(&self, request_id: &str, reason: &str) -> Result<()>;

    /// Faculty: privileged removal command; the backend forces the target's
    /// transport disconnection
    async fn remove_student(&self, exam_id: &str, student_id: &str, reason: &str) -> Result<()>;
}

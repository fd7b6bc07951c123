//! Live exam session coordination: admission, room membership, timing.
//!
//! Both roles share the same core (session clock + room session manager)
//! and diverge in how they use the admission controller: students request
//! and poll their own join status, faculty polls the pending queue and
//! resolves it. [`student::StudentFlow`] and [`proctor::ProctorControlPlane`]
//! are the two variants of that shared participant abstraction.

pub mod admission;
pub mod clock;
pub mod proctor;
pub mod room;
pub mod student;
pub mod transport;

use serde::{Deserialize, Serialize};

use admission::AdmissionEvent;
use clock::ClockEvent;
use room::RoomEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Proctor,
    Student,
}

impl ParticipantRole {
    /// Parse a transport-reported role tag. Backends and transports label
    /// the proctor role either "proctor" or "faculty".
    pub fn from_role_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "proctor" | "faculty" => Some(ParticipantRole::Proctor),
            "student" => Some(ParticipantRole::Student),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Proctor => "proctor",
            ParticipantRole::Student => "student",
        }
    }

    pub fn is_student(&self) -> bool {
        matches!(self, ParticipantRole::Student)
    }
}

/// User-visible session notifications.
///
/// Every transition that matters to the human behind the screen produces
/// one of these; polling-based coordination depends on visible feedback to
/// keep both roles' mental models in sync with backend truth.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Admission(AdmissionEvent),
    Room(RoomEvent),
    Clock(ClockEvent),
    /// Recoverable condition reported to the user; state machine unchanged
    Notice(String),
    /// Irrecoverable join failure; the user is returned to the exam list
    Fatal(String),
}

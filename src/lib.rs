//! Client-side coordinator for live proctored exam sessions.
//!
//! Moves a student from "wants to join" through a faculty-mediated
//! admission queue into a monitored real-time room, keeps both roles'
//! state synchronized by polling the authoritative backend, detects
//! involuntary disconnects with a bounded rejoin path, and forcibly ends
//! the session at the scheduled exam end time.
//!
//! The REST backend and the audio/video transport are external
//! collaborators behind the [`backend::ExamBackend`] and
//! [`session::transport::RoomTransport`] traits.

pub mod backend;
pub mod config;
pub mod error;
pub mod session;

pub use config::{Config, TimingConfig};
pub use error::{Result, SessionError};
pub use session::{ParticipantRole, SessionEvent};

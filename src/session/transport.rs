//! Capability interface over the real-time audio/video transport.
//!
//! The transport's internal protocol is out of scope; the coordinator only
//! consumes this surface: join/leave, connection state, the live peer
//! roster, track attachment, and broadcast/direct messaging. Peers are
//! ephemeral and owned by the transport — the application observes them,
//! never constructs or destroys them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::{broadcast, watch};

use super::ParticipantRole;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

/// A participant currently attached to the room, as reported by the
/// transport's live roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peer {
    pub id: String,
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_role")]
    pub role: ParticipantRole,
    pub audio_enabled: bool,
    pub video_enabled: bool,
    /// Identifier of the peer's published video track, when one exists
    pub video_track: Option<String>,
}

/// Transports label the proctor role either "proctor" or "faculty";
/// normalize through the shared parser rather than the derived enum form.
fn deserialize_role<'de, D>(deserializer: D) -> std::result::Result<ParticipantRole, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    ParticipantRole::from_role_name(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown participant role {:?}", raw)))
}

/// In-room chat message, broadcast or direct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMessage {
    pub sender: String,
    /// `None` for broadcast, the target peer id for direct messages
    pub recipient: Option<String>,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RoomJoinParams {
    pub identity: String,
    pub display_name: Option<String>,
    pub role: ParticipantRole,
    pub room_code: String,
    pub auth_token: String,
    pub initial_audio_muted: bool,
    pub initial_video_muted: bool,
}

/// The transport surface consumed by the coordinator.
///
/// `connection_state` and `roster_changes` are watch channels: observers
/// see the latest value, and intermediate states may be coalesced — the
/// session manager's one-shot latches make that safe.
#[async_trait]
pub trait RoomTransport: Send + Sync {
    async fn join(&self, params: RoomJoinParams) -> Result<()>;

    async fn leave(&self) -> Result<()>;

    fn connection_state(&self) -> watch::Receiver<ConnectionState>;

    /// Snapshot of the live peer roster
    fn peers(&self) -> Vec<Peer>;

    /// Generation counter bumped whenever the peer/track set changes
    fn roster_changes(&self) -> watch::Receiver<u64>;

    /// Subscribe to chat messages the room delivers to this participant,
    /// broadcast and direct alike. Slow consumers may observe lag.
    fn incoming_messages(&self) -> broadcast::Receiver<RoomMessage>;

    /// Attach a video track to a rendering surface, identified opaquely
    async fn attach_video(&self, track_id: &str, render_target: &str) -> Result<()>;

    async fn detach_video(&self, track_id: &str) -> Result<()>;

    async fn send_broadcast_message(&self, text: &str) -> Result<()>;

    async fn send_direct_message(&self, text: &str, peer_id: &str) -> Result<()>;

    async fn set_local_audio_enabled(&self, enabled: bool) -> Result<()>;

    async fn set_local_video_enabled(&self, enabled: bool) -> Result<()>;
}

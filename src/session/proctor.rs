//! Proctor control plane: the faculty-side composition of admission and
//! room membership across all connected students, plus the privileged
//! commands that act on other participants.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};

use super::admission::{AdmissionController, AdmissionEvent, PollHandle};
use super::clock::{ClockEvent, SessionClock};
use super::room::{LeaveReason, RoomEvent, RoomSessionManager};
use super::transport::{Peer, RoomMessage, RoomTransport};
use super::{ParticipantRole, SessionEvent};
use crate::backend::{ExamBackend, RoomCredential};
use crate::config::TimingConfig;
use crate::error::{Result, SessionError};

/// Messaging addressing mode. Exactly one mode is active at any instant;
/// switching modes clears the previous target selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTarget {
    Broadcast,
    Direct(String),
}

pub struct ProctorControlPlane {
    exam_id: String,
    identity: String,
    backend: Arc<dyn ExamBackend>,
    transport: Arc<dyn RoomTransport>,
    admission: AdmissionController,
    room: Arc<RoomSessionManager>,
    ui: mpsc::UnboundedSender<SessionEvent>,
    timing: TimingConfig,
    clock: Mutex<Option<SessionClock>>,
    queue_watch: Mutex<Option<PollHandle>>,
    target: Mutex<MessageTarget>,
    sent_log: Mutex<Vec<RoomMessage>>,
    admission_rx: Mutex<Option<mpsc::UnboundedReceiver<AdmissionEvent>>>,
    room_rx: Mutex<Option<mpsc::UnboundedReceiver<RoomEvent>>>,
}

impl ProctorControlPlane {
    pub fn new(
        exam_id: String,
        identity: String,
        display_name: Option<String>,
        backend: Arc<dyn ExamBackend>,
        transport: Arc<dyn RoomTransport>,
        ui: mpsc::UnboundedSender<SessionEvent>,
        timing: TimingConfig,
    ) -> Arc<Self> {
        let (admission_tx, admission_rx) = mpsc::unbounded_channel();
        let (room_tx, room_rx) = mpsc::unbounded_channel();

        let admission =
            AdmissionController::new(Arc::clone(&backend), timing.poll_interval, admission_tx);
        let room = RoomSessionManager::new(
            exam_id.clone(),
            identity.clone(),
            display_name,
            ParticipantRole::Proctor,
            Arc::clone(&backend),
            Arc::clone(&transport),
            room_tx,
        );

        Arc::new(Self {
            exam_id,
            identity,
            backend,
            transport,
            admission,
            room,
            ui,
            timing,
            clock: Mutex::new(None),
            queue_watch: Mutex::new(None),
            target: Mutex::new(MessageTarget::Broadcast),
            sent_log: Mutex::new(Vec::new()),
            admission_rx: Mutex::new(Some(admission_rx)),
            room_rx: Mutex::new(Some(room_rx)),
        })
    }

    pub fn room(&self) -> &Arc<RoomSessionManager> {
        &self.room
    }

    /// Spawn the event pumps. Must be called once before `enter_room`.
    pub async fn start(self: &Arc<Self>) {
        if let Some(mut rx) = self.admission_rx.lock().await.take() {
            let plane = Arc::clone(self);
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    let _ = plane.ui.send(SessionEvent::Admission(event));
                }
            });
        }

        if let Some(mut rx) = self.room_rx.lock().await.take() {
            let plane = Arc::clone(self);
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    let _ = plane.ui.send(SessionEvent::Room(event.clone()));
                    if matches!(event, RoomEvent::Left { .. } | RoomEvent::SessionExpired) {
                        plane.stop_clock().await;
                        *plane.queue_watch.lock().await = None;
                    }
                }
            });
        }
    }

    /// Join the room with faculty credentials, start the session clock,
    /// and open the admission queue poll.
    pub async fn enter_room(self: &Arc<Self>, credential: RoomCredential) -> Result<()> {
        self.room.join(credential).await?;
        self.start_clock().await;
        self.open_queue().await;
        Ok(())
    }

    /// Start polling the pending join request queue ("panel open").
    pub async fn open_queue(&self) {
        let watch = self.admission.watch_pending(self.exam_id.clone());
        *self.queue_watch.lock().await = Some(watch);
    }

    /// Stop polling the queue ("panel closed").
    pub async fn close_queue(&self) {
        *self.queue_watch.lock().await = None;
    }

    pub async fn approve(&self, request_id: &str) -> Result<()> {
        self.admission.approve(request_id).await
    }

    pub async fn reject(&self, request_id: &str, reason: &str) -> Result<()> {
        self.admission.reject(request_id, reason).await
    }

    /// The live student roster: recomputed from the transport on every
    /// call, never cached.
    pub fn student_peers(&self) -> Vec<Peer> {
        self.transport
            .peers()
            .into_iter()
            .filter(|peer| peer.role.is_student())
            .collect()
    }

    /// Privileged removal, routed through the backend — not a direct
    /// transport operation. The backend forces the target's disconnect;
    /// this side only issues the intent and reports the outcome.
    pub async fn remove_student(&self, student_id: &str, reason: &str) -> Result<()> {
        self.backend
            .remove_student(&self.exam_id, student_id, reason)
            .await?;
        tracing::info!(
            exam_id = %self.exam_id,
            student_id = %student_id,
            reason = %reason,
            "Student removal requested"
        );
        Ok(())
    }

    pub async fn set_broadcast_target(&self) {
        *self.target.lock().await = MessageTarget::Broadcast;
    }

    /// Select one student for direct messaging, replacing any previous
    /// selection.
    pub async fn set_direct_target(&self, peer_id: String) {
        *self.target.lock().await = MessageTarget::Direct(peer_id);
    }

    pub async fn message_target(&self) -> MessageTarget {
        self.target.lock().await.clone()
    }

    /// Send a message through the active addressing mode. Failures are
    /// retryable and leave the target selection unchanged.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let target = self.target.lock().await.clone();

        let recipient = match &target {
            MessageTarget::Broadcast => {
                self.transport
                    .send_broadcast_message(text)
                    .await
                    .map_err(|e| SessionError::MessageSend(e.to_string()))?;
                None
            }
            MessageTarget::Direct(peer_id) => {
                self.transport
                    .send_direct_message(text, peer_id)
                    .await
                    .map_err(|e| SessionError::MessageSend(e.to_string()))?;
                Some(peer_id.clone())
            }
        };

        self.sent_log.lock().await.push(RoomMessage {
            sender: self.identity.clone(),
            recipient,
            text: text.to_string(),
            sent_at: Utc::now(),
        });
        Ok(())
    }

    pub async fn sent_messages(&self) -> Vec<RoomMessage> {
        self.sent_log.lock().await.clone()
    }

    /// Forced end of session at exam expiry: leave the transport, update
    /// presence, and return to the exam list. The faculty-side analogue of
    /// the student's expired leave, driven by this role's own clock.
    pub async fn handle_end_exam(&self) -> Result<()> {
        self.close_queue().await;
        self.stop_clock().await;
        self.room.leave(LeaveReason::Expired).await
    }

    /// Manual exit before the end of the exam.
    pub async fn leave(&self) -> Result<()> {
        self.close_queue().await;
        self.stop_clock().await;
        self.room.leave(LeaveReason::Manual).await
    }

    pub async fn set_audio_enabled(&self, enabled: bool) -> Result<()> {
        self.room.set_audio_enabled(enabled).await
    }

    pub async fn set_video_enabled(&self, enabled: bool) -> Result<()> {
        self.room.set_video_enabled(enabled).await
    }

    async fn start_clock(self: &Arc<Self>) {
        let Some(deadline) = self.room.deadline().await else {
            return;
        };

        let (clock, mut events) = SessionClock::start(
            deadline,
            self.timing.clock_tick,
            self.timing.warning_threshold,
        );
        *self.clock.lock().await = Some(clock);

        let plane = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let expired = matches!(event, ClockEvent::Expired);
                let _ = plane.ui.send(SessionEvent::Clock(event));
                if expired {
                    if let Err(e) = plane.handle_end_exam().await {
                        tracing::warn!(error = %e, "Forced end-of-exam failed");
                    }
                    break;
                }
            }
        });
    }

    async fn stop_clock(&self) {
        if let Some(clock) = self.clock.lock().await.take() {
            clock.stop();
        }
    }
}

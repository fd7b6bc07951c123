//! Student-side composition of admission, room membership, and timing.
//!
//! The flow is the coordinator's student variant: it queues the join
//! request, watches its status, consumes the minted credential, and wires
//! the session clock and the rejoin path. The faculty variant lives in
//! [`super::proctor`]; both share the clock and room session manager core.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use super::admission::{AdmissionController, AdmissionEvent, PollHandle};
use super::clock::{ClockEvent, SessionClock};
use super::room::{LeaveReason, RoomEvent, RoomSessionManager};
use super::transport::RoomTransport;
use super::{ParticipantRole, SessionEvent};
use crate::backend::{ExamBackend, JoinRequestAck};
use crate::config::TimingConfig;
use crate::error::Result;

pub struct StudentFlow {
    exam_id: String,
    backend: Arc<dyn ExamBackend>,
    admission: AdmissionController,
    room: Arc<RoomSessionManager>,
    ui: mpsc::UnboundedSender<SessionEvent>,
    timing: TimingConfig,
    clock: Mutex<Option<SessionClock>>,
    status_watch: Mutex<Option<PollHandle>>,
    admission_rx: Mutex<Option<mpsc::UnboundedReceiver<AdmissionEvent>>>,
    room_rx: Mutex<Option<mpsc::UnboundedReceiver<RoomEvent>>>,
}

impl StudentFlow {
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
            identity,
            display_name,
            ParticipantRole::Student,
            Arc::clone(&backend),
            transport,
            room_tx,
        );

        Arc::new(Self {
            exam_id,
            backend,
            admission,
            room,
            ui,
            timing,
            clock: Mutex::new(None),
            status_watch: Mutex::new(None),
            admission_rx: Mutex::new(Some(admission_rx)),
            room_rx: Mutex::new(Some(room_rx)),
        })
    }

    pub fn room(&self) -> &Arc<RoomSessionManager> {
        &self.room
    }

    /// Spawn the event pumps. Must be called once before `begin`.
    pub async fn start(self: &Arc<Self>) {
        if let Some(mut rx) = self.admission_rx.lock().await.take() {
            let flow = Arc::clone(self);
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    let _ = flow.ui.send(SessionEvent::Admission(event.clone()));
                    if let AdmissionEvent::Approved { request_id } = event {
                        flow.complete_join(&request_id).await;
                    }
                }
            });
        }

        if let Some(mut rx) = self.room_rx.lock().await.take() {
            let flow = Arc::clone(self);
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    let _ = flow.ui.send(SessionEvent::Room(event.clone()));
                    match event {
                        RoomEvent::RejoinRequired => flow.begin_rejoin().await,
                        RoomEvent::Left { .. } | RoomEvent::SessionExpired => {
                            flow.stop_clock().await;
                        }
                        _ => {}
                    }
                }
            });
        }
    }

    /// First entry: queue a join request and start watching its status.
    pub async fn begin(&self) -> Result<JoinRequestAck> {
        let ack = self.admission.request_join(&self.exam_id).await?;
        let watch = self.admission.watch_request(ack.request_id.clone());
        *self.status_watch.lock().await = Some(watch);
        Ok(ack)
    }

    /// Re-entry after an involuntary disconnect, still inside the window.
    /// Failures here are retryable notices, not fatal: the student can
    /// trigger the request again.
    async fn begin_rejoin(self: &Arc<Self>) {
        self.room.reset_for_attempt();

        match self.admission.request_join(&self.exam_id).await {
            Ok(ack) => {
                tracing::info!(
                    exam_id = %self.exam_id,
                    request_id = %ack.request_id,
                    is_rejoin = ack.is_rejoin,
                    "Rejoin request queued"
                );
                let watch = self.admission.watch_request(ack.request_id);
                *self.status_watch.lock().await = Some(watch);
            }
            Err(e) => {
                let _ = self
                    .ui
                    .send(SessionEvent::Notice(format!("Rejoin request failed: {}", e)));
            }
        }
    }

    /// Approval observed: mint the credential and join the room. Join
    /// failures are fatal to the attempt and return the student to the
    /// exam list.
    async fn complete_join(self: &Arc<Self>, request_id: &str) {
        let credential = match self.backend.join_room(request_id).await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Credential mint failed");
                let _ = self.ui.send(SessionEvent::Fatal(e.to_string()));
                return;
            }
        };

        if let Err(e) = self.room.join(credential).await {
            tracing::error!(request_id = %request_id, error = %e, "Room join failed");
            let _ = self.ui.send(SessionEvent::Fatal(e.to_string()));
            return;
        }

        self.start_clock().await;
    }

    /// Start (or restart, on rejoin) the session clock from the deadline
    /// the credential carried. No deadline means an unbounded session.
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

        let flow = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let expired = matches!(event, ClockEvent::Expired);
                let _ = flow.ui.send(SessionEvent::Clock(event));
                if expired {
                    if let Err(e) = flow.room.leave(LeaveReason::Expired).await {
                        tracing::warn!(error = %e, "Forced leave at expiry failed");
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

    /// User-initiated exit; also tears down the admission watch so a late
    /// poll result cannot act on a dead screen.
    pub async fn leave(&self) -> Result<()> {
        self.admission.supersede();
        *self.status_watch.lock().await = None;
        self.room.leave(LeaveReason::Manual).await
    }

    pub async fn set_audio_enabled(&self, enabled: bool) -> Result<()> {
        self.room.set_audio_enabled(enabled).await
    }

    pub async fn set_video_enabled(&self, enabled: bool) -> Result<()> {
        self.room.set_video_enabled(enabled).await
    }

    /// Poll interval in use, exposed for UI hints ("checking every Ns")
    pub fn poll_interval(&self) -> Duration {
        self.timing.poll_interval
    }
}

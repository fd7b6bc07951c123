//! Room session manager: owns exactly one client's membership in the
//! real-time room and classifies every loss of connection as either a
//! controlled exit or an involuntary disconnect requiring recovery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use tokio::sync::{broadcast, mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use super::clock::ExamDeadline;
use super::transport::{ConnectionState, RoomJoinParams, RoomMessage, RoomTransport};
use super::ParticipantRole;
use crate::backend::{ExamBackend, RoomCredential};
use crate::error::{Result, SessionError};

/// Per-participant, per-attempt connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Idle,
    Joining,
    Connected,
    /// Involuntary disconnect inside the exam window; a rejoin request is
    /// the way back in
    Recoverable,
    /// User-initiated leave; terminal for this attempt
    LeftVoluntary,
    /// The exam window closed, either by clock expiry or by a disconnect
    /// observed past the end instant; terminal for the session
    LeftExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    Manual,
    Expired,
}

#[derive(Debug, Clone)]
pub enum RoomEvent {
    Connected,
    /// Involuntary disconnect inside the window: route back through
    /// admission with a fresh rejoin request
    RejoinRequired,
    /// Disconnect observed past the exam end; no rejoin path
    SessionExpired,
    /// Chat message delivered by the transport, broadcast or direct
    MessageReceived(RoomMessage),
    Left { reason: LeaveReason },
}

pub struct RoomSessionManager {
    exam_id: String,
    identity: String,
    display_name: Option<String>,
    role: ParticipantRole,
    backend: Arc<dyn ExamBackend>,
    transport: Arc<dyn RoomTransport>,
    events: mpsc::UnboundedSender<RoomEvent>,
    phase: watch::Sender<RoomPhase>,
    deadline: RwLock<Option<ExamDeadline>>,
    /// Set before the transport leave is issued so the connection watcher
    /// never classifies a requested leave as an involuntary disconnect
    leave_requested: AtomicBool,
    /// One-shot latch: the disconnect-recovery routine runs at most once
    /// per actual connection loss, even if the underlying signal repeats
    recovery_latch: AtomicBool,
    watchers: Mutex<Vec<JoinHandle<()>>>,
}

impl RoomSessionManager {
    pub fn new(
        exam_id: String,
        identity: String,
        display_name: Option<String>,
        role: ParticipantRole,
        backend: Arc<dyn ExamBackend>,
        transport: Arc<dyn RoomTransport>,
        events: mpsc::UnboundedSender<RoomEvent>,
    ) -> Arc<Self> {
        let (phase, _) = watch::channel(RoomPhase::Idle);
        Arc::new(Self {
            exam_id,
            identity,
            display_name,
            role,
            backend,
            transport,
            events,
            phase,
            deadline: RwLock::new(None),
            leave_requested: AtomicBool::new(false),
            recovery_latch: AtomicBool::new(false),
            watchers: Mutex::new(Vec::new()),
        })
    }

    pub fn phase(&self) -> RoomPhase {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<RoomPhase> {
        self.phase.subscribe()
    }

    pub async fn deadline(&self) -> Option<ExamDeadline> {
        *self.deadline.read().await
    }

    /// Consume a room credential and join the transport.
    ///
    /// A missing credential is fatal to this attempt (the caller returns
    /// to the exam list), as is a transport join failure. Neither is
    /// retried automatically.
    pub async fn join(self: &Arc<Self>, credential: RoomCredential) -> Result<()> {
        let phase = self.phase();
        if !matches!(phase, RoomPhase::Idle) {
            return Err(SessionError::internal(format!(
                "join attempted in phase {:?}",
                phase
            )));
        }

        if credential.room_code.trim().is_empty() || credential.auth_token.trim().is_empty() {
            return Err(SessionError::Credential(
                "room code or auth token missing from navigation state".to_string(),
            ));
        }

        let deadline = ExamDeadline::resolve(credential.exam_date, credential.end_time.as_deref());
        if deadline.is_none() {
            // Degraded mode: no clock, no expiry side effects
            tracing::warn!(
                exam_id = %self.exam_id,
                "Exam end time missing or malformed, session runs unbounded"
            );
        }
        *self.deadline.write().await = deadline;

        self.phase.send_replace(RoomPhase::Joining);
        tracing::info!(
            exam_id = %self.exam_id,
            identity = %self.identity,
            room_code = %credential.room_code,
            role = %self.role.as_str(),
            "Joining exam room"
        );

        let params = RoomJoinParams {
            identity: self.identity.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            room_code: credential.room_code,
            auth_token: credential.auth_token,
            initial_audio_muted: false,
            initial_video_muted: false,
        };

        if let Err(e) = self.transport.join(params).await {
            self.phase.send_replace(RoomPhase::Idle);
            return Err(SessionError::TransportJoin(e.to_string()));
        }

        self.phase.send_replace(RoomPhase::Connected);
        let _ = self.events.send(RoomEvent::Connected);

        self.spawn_watchers().await;

        if let Err(e) = self.sync_tracks().await {
            tracing::warn!(error = %e, "Initial track attach failed");
        }

        Ok(())
    }

    async fn spawn_watchers(self: &Arc<Self>) {
        let mut watchers = self.watchers.lock().await;
        for handle in watchers.drain(..) {
            handle.abort();
        }

        let manager = Arc::clone(self);
        let mut connection = self.transport.connection_state();
        watchers.push(tokio::spawn(async move {
            while connection.changed().await.is_ok() {
                let state = *connection.borrow_and_update();
                if state == ConnectionState::Disconnected {
                    manager.handle_disconnect().await;
                    break;
                }
            }
        }));

        let manager = Arc::clone(self);
        let mut roster = self.transport.roster_changes();
        watchers.push(tokio::spawn(async move {
            while roster.changed().await.is_ok() {
                if let Err(e) = manager.sync_tracks().await {
                    tracing::warn!(error = %e, "Track reattach after roster change failed");
                }
            }
        }));

        let manager = Arc::clone(self);
        let mut messages = self.transport.incoming_messages();
        watchers.push(tokio::spawn(async move {
            loop {
                match messages.recv().await {
                    Ok(message) => {
                        let _ = manager.events.send(RoomEvent::MessageReceived(message));
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Incoming message stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    /// Recovery decision for an involuntary connection loss.
    async fn handle_disconnect(&self) {
        if self.leave_requested.load(Ordering::SeqCst) {
            tracing::debug!(identity = %self.identity, "Ignoring disconnect during requested leave");
            return;
        }

        if self.recovery_latch.swap(true, Ordering::SeqCst) {
            tracing::debug!(identity = %self.identity, "Duplicate disconnect signal suppressed");
            return;
        }

        tracing::warn!(
            exam_id = %self.exam_id,
            identity = %self.identity,
            "Transport connection lost"
        );

        // Best-effort presence update so the proctor's roster view stays
        // accurate; failure here never blocks the recovery decision
        if let Err(e) = self.backend.update_left_status(&self.exam_id).await {
            tracing::warn!(error = %e, "Presence update after disconnect failed");
        }

        // The presence update awaited; a leave may have started meanwhile
        // and owns the exit
        if self.leave_requested.load(Ordering::SeqCst) {
            tracing::debug!(identity = %self.identity, "Leave started during disconnect handling");
            return;
        }

        let within_window = match *self.deadline.read().await {
            Some(deadline) => !deadline.has_passed(Local::now()),
            // Unbounded session: always rejoin-eligible
            None => true,
        };

        if within_window {
            self.phase.send_replace(RoomPhase::Recoverable);
            let _ = self.events.send(RoomEvent::RejoinRequired);
        } else {
            self.phase.send_replace(RoomPhase::LeftExpired);
            let _ = self.events.send(RoomEvent::SessionExpired);
        }
    }

    /// Controlled exit. Strictly ordered for every trigger: transport
    /// leave first, then the backend presence update, then the exit event
    /// — so the backend's record of who is present only changes once
    /// detachment is in flight. Best effort, not atomic.
    pub async fn leave(&self, reason: LeaveReason) -> Result<()> {
        if self.leave_requested.swap(true, Ordering::SeqCst) {
            tracing::debug!(identity = %self.identity, "Leave already in progress");
            return Ok(());
        }

        tracing::info!(
            exam_id = %self.exam_id,
            identity = %self.identity,
            reason = ?reason,
            "Leaving exam room"
        );

        if let Err(e) = self.transport.leave().await {
            tracing::warn!(error = %e, "Transport leave failed, continuing teardown");
        }

        if let Err(e) = self.backend.update_left_status(&self.exam_id).await {
            tracing::warn!(error = %e, "Left-status update failed (best effort)");
        }

        let phase = match reason {
            LeaveReason::Manual => RoomPhase::LeftVoluntary,
            LeaveReason::Expired => RoomPhase::LeftExpired,
        };
        self.phase.send_replace(phase);
        let _ = self.events.send(RoomEvent::Left { reason });

        let mut watchers = self.watchers.lock().await;
        for handle in watchers.drain(..) {
            handle.abort();
        }

        Ok(())
    }

    /// Arm the manager for a fresh attempt after a rejoin request was
    /// approved. Resets the per-attempt latches.
    pub fn reset_for_attempt(&self) {
        self.leave_requested.store(false, Ordering::SeqCst);
        self.recovery_latch.store(false, Ordering::SeqCst);
        self.phase.send_replace(RoomPhase::Idle);
    }

    /// Re-apply the projection of remote video tracks onto rendering
    /// surfaces. Pure projection with no state of its own; called on join
    /// and on every roster change.
    pub async fn sync_tracks(&self) -> Result<()> {
        for peer in self.transport.peers() {
            if peer.id == self.identity {
                continue;
            }
            if !peer.video_enabled {
                continue;
            }
            if let Some(track_id) = &peer.video_track {
                let render_target = format!("video-{}", peer.id);
                self.transport.attach_video(track_id, &render_target).await?;
            }
        }
        Ok(())
    }

    pub async fn set_audio_enabled(&self, enabled: bool) -> Result<()> {
        self.transport.set_local_audio_enabled(enabled).await
    }

    pub async fn set_video_enabled(&self, enabled: bool) -> Result<()> {
        self.transport.set_local_video_enabled(enabled).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ExamSession, JoinRequest, JoinRequestAck, JoinStatusReport};
    use crate::session::transport::Peer;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    /// Records the order of boundary calls across backend and transport.
    #[derive(Default)]
    struct CallLog(StdMutex<Vec<String>>);

    impl CallLog {
        fn push(&self, entry: &str) {
            self.0.lock().unwrap().push(entry.to_string());
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct FakeBackend {
        log: Arc<CallLog>,
        /// When set, the next left-status update blocks until released,
        /// signalling entry first
        gate_first_left: AtomicBool,
        left_entered: Notify,
        left_release: Notify,
    }

    impl FakeBackend {
        fn new(log: Arc<CallLog>) -> Self {
            Self {
                log,
                gate_first_left: AtomicBool::new(false),
                left_entered: Notify::new(),
                left_release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl ExamBackend for FakeBackend {
        async fn exam_details(&self, _exam_id: &str) -> Result<ExamSession> {
            Err(SessionError::internal("not used"))
        }

        async fn request_join(&self, _exam_id: &str) -> Result<JoinRequestAck> {
            Err(SessionError::internal("not used"))
        }

        async fn join_status(&self, _request_id: &str) -> Result<JoinStatusReport> {
            Err(SessionError::internal("not used"))
        }

        async fn join_room(&self, _request_id: &str) -> Result<RoomCredential> {
            Err(SessionError::internal("not used"))
        }

        async fn update_left_status(&self, _exam_id: &str) -> Result<()> {
            if self.gate_first_left.swap(false, Ordering::SeqCst) {
                self.left_entered.notify_one();
                self.left_release.notified().await;
            }
            self.log.push("backend.left_status");
            Ok(())
        }

        async fn pending_requests(&self, _exam_id: &str) -> Result<Vec<JoinRequest>> {
            Ok(Vec::new())
        }

        async fn approve_request(&self, _request_id: &str) -> Result<()> {
            Ok(())
        }

        async fn reject_request(&self, _request_id: &str, _reason: &str) -> Result<()> {
            Ok(())
        }

        async fn remove_student(
            &self,
            _exam_id: &str,
            _student_id: &str,
            _reason: &str,
        ) -> Result<()> {
            Ok(())
        }
    }

    struct FakeTransport {
        log: Arc<CallLog>,
        connection: watch::Sender<ConnectionState>,
        roster: watch::Sender<u64>,
        messages: broadcast::Sender<RoomMessage>,
    }

    impl FakeTransport {
        fn new(log: Arc<CallLog>) -> Arc<Self> {
            let (connection, _) = watch::channel(ConnectionState::Idle);
            let (roster, _) = watch::channel(0);
            let (messages, _) = broadcast::channel(16);
            Arc::new(Self {
                log,
                connection,
                roster,
                messages,
            })
        }
    }

    #[async_trait]
    impl RoomTransport for FakeTransport {
        async fn join(&self, _params: RoomJoinParams) -> Result<()> {
            self.log.push("transport.join");
            self.connection.send_replace(ConnectionState::Connected);
            Ok(())
        }

        async fn leave(&self) -> Result<()> {
            self.log.push("transport.leave");
            self.connection.send_replace(ConnectionState::Idle);
            Ok(())
        }

        fn connection_state(&self) -> watch::Receiver<ConnectionState> {
            self.connection.subscribe()
        }

        fn peers(&self) -> Vec<Peer> {
            Vec::new()
        }

        fn roster_changes(&self) -> watch::Receiver<u64> {
            self.roster.subscribe()
        }

        fn incoming_messages(&self) -> broadcast::Receiver<RoomMessage> {
            self.messages.subscribe()
        }

        async fn attach_video(&self, _track_id: &str, _render_target: &str) -> Result<()> {
            Ok(())
        }

        async fn detach_video(&self, _track_id: &str) -> Result<()> {
            Ok(())
        }

        async fn send_broadcast_message(&self, _text: &str) -> Result<()> {
            Ok(())
        }

        async fn send_direct_message(&self, _text: &str, _peer_id: &str) -> Result<()> {
            Ok(())
        }

        async fn set_local_audio_enabled(&self, _enabled: bool) -> Result<()> {
            Ok(())
        }

        async fn set_local_video_enabled(&self, _enabled: bool) -> Result<()> {
            Ok(())
        }
    }

    fn credential(end_offset: ChronoDuration) -> RoomCredential {
        let end = Local::now() + end_offset;
        RoomCredential {
            room_code: "482913".to_string(),
            auth_token: "tok".to_string(),
            exam_name: Some("Algorithms Final".to_string()),
            duration_minutes: Some(90),
            exam_date: Some(end.date_naive()),
            end_time: Some(end.format("%H:%M:%S").to_string()),
            total_students: Some(20),
        }
    }

    fn manager(
        log: Arc<CallLog>,
    ) -> (
        Arc<RoomSessionManager>,
        mpsc::UnboundedReceiver<RoomEvent>,
        Arc<FakeTransport>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = FakeTransport::new(log.clone());
        let backend = Arc::new(FakeBackend::new(log));
        let mgr = RoomSessionManager::new(
            "exam-1".to_string(),
            "stu-3".to_string(),
            Some("Ada".to_string()),
            ParticipantRole::Student,
            backend,
            transport.clone(),
            tx,
        );
        (mgr, rx, transport)
    }

    #[tokio::test]
    async fn test_join_rejects_empty_credential() {
        let (mgr, _rx, _transport) = manager(Arc::new(CallLog::default()));
        let mut cred = credential(ChronoDuration::hours(1));
        cred.auth_token = "".to_string();

        let err = mgr.join(cred).await.unwrap_err();
        assert!(matches!(err, SessionError::Credential(_)));
        assert_eq!(mgr.phase(), RoomPhase::Idle);
    }

    #[tokio::test]
    async fn test_join_reaches_connected() {
        let (mgr, mut rx, _transport) = manager(Arc::new(CallLog::default()));
        mgr.join(credential(ChronoDuration::hours(1))).await.unwrap();

        assert_eq!(mgr.phase(), RoomPhase::Connected);
        assert!(matches!(rx.recv().await, Some(RoomEvent::Connected)));
        assert!(mgr.deadline().await.is_some());
    }

    #[tokio::test]
    async fn test_disconnect_inside_window_is_recoverable() {
        let (mgr, mut rx, transport) = manager(Arc::new(CallLog::default()));
        mgr.join(credential(ChronoDuration::hours(1))).await.unwrap();
        let _ = rx.recv().await; // Connected

        transport.connection.send_replace(ConnectionState::Disconnected);

        assert!(matches!(rx.recv().await, Some(RoomEvent::RejoinRequired)));
        assert_eq!(mgr.phase(), RoomPhase::Recoverable);
    }

    #[tokio::test]
    async fn test_disconnect_after_window_is_terminal() {
        let (mgr, mut rx, transport) = manager(Arc::new(CallLog::default()));
        // End time already in the past
        mgr.join(credential(ChronoDuration::minutes(-1))).await.unwrap();
        let _ = rx.recv().await; // Connected

        transport.connection.send_replace(ConnectionState::Disconnected);

        assert!(matches!(rx.recv().await, Some(RoomEvent::SessionExpired)));
        assert_eq!(mgr.phase(), RoomPhase::LeftExpired);
    }

    #[tokio::test]
    async fn test_recovery_runs_once_per_disconnect() {
        let log = Arc::new(CallLog::default());
        let (mgr, mut rx, _transport) = manager(log.clone());
        mgr.join(credential(ChronoDuration::hours(1))).await.unwrap();
        let _ = rx.recv().await; // Connected

        // The same underlying loss surfacing twice
        mgr.handle_disconnect().await;
        mgr.handle_disconnect().await;

        assert!(matches!(rx.recv().await, Some(RoomEvent::RejoinRequired)));
        assert!(rx.try_recv().is_err());
        assert_eq!(
            log.entries()
                .iter()
                .filter(|e| *e == "backend.left_status")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_leave_orders_transport_before_backend() {
        let log = Arc::new(CallLog::default());
        let (mgr, mut rx, _transport) = manager(log.clone());
        mgr.join(credential(ChronoDuration::hours(1))).await.unwrap();
        let _ = rx.recv().await; // Connected

        mgr.leave(LeaveReason::Manual).await.unwrap();

        let entries = log.entries();
        let leave_pos = entries.iter().position(|e| e == "transport.leave").unwrap();
        let notify_pos = entries.iter().position(|e| e == "backend.left_status").unwrap();
        assert!(leave_pos < notify_pos, "transport leave must precede backend notify");
        assert_eq!(mgr.phase(), RoomPhase::LeftVoluntary);
        assert!(matches!(
            rx.recv().await,
            Some(RoomEvent::Left {
                reason: LeaveReason::Manual
            })
        ));
    }

    #[tokio::test]
    async fn test_expiry_leave_is_idempotent() {
        let (mgr, mut rx, _transport) = manager(Arc::new(CallLog::default()));
        mgr.join(credential(ChronoDuration::hours(1))).await.unwrap();
        let _ = rx.recv().await; // Connected

        mgr.leave(LeaveReason::Expired).await.unwrap();
        mgr.leave(LeaveReason::Expired).await.unwrap();

        assert_eq!(mgr.phase(), RoomPhase::LeftExpired);
        assert!(matches!(
            rx.recv().await,
            Some(RoomEvent::Left {
                reason: LeaveReason::Expired
            })
        ));
        // Second leave was a no-op: no second event
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_requested_leave_suppresses_disconnect_classification() {
        let (mgr, mut rx, transport) = manager(Arc::new(CallLog::default()));
        mgr.join(credential(ChronoDuration::hours(1))).await.unwrap();
        let _ = rx.recv().await; // Connected

        mgr.leave(LeaveReason::Manual).await.unwrap();
        // Transport drop racing the leave must not trigger recovery
        transport.connection.send_replace(ConnectionState::Disconnected);
        mgr.handle_disconnect().await;

        assert!(matches!(rx.recv().await, Some(RoomEvent::Left { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reset_for_attempt_allows_rejoin() {
        let (mgr, mut rx, transport) = manager(Arc::new(CallLog::default()));
        mgr.join(credential(ChronoDuration::hours(1))).await.unwrap();
        let _ = rx.recv().await; // Connected

        transport.connection.send_replace(ConnectionState::Disconnected);
        assert!(matches!(rx.recv().await, Some(RoomEvent::RejoinRequired)));

        mgr.reset_for_attempt();
        assert_eq!(mgr.phase(), RoomPhase::Idle);

        mgr.join(credential(ChronoDuration::hours(1))).await.unwrap();
        assert_eq!(mgr.phase(), RoomPhase::Connected);
    }

    #[tokio::test]
    async fn test_incoming_message_surfaces_as_event() {
        let (mgr, mut rx, transport) = manager(Arc::new(CallLog::default()));
        mgr.join(credential(ChronoDuration::hours(1))).await.unwrap();
        let _ = rx.recv().await; // Connected

        transport
            .messages
            .send(RoomMessage {
                sender: "fac-1".to_string(),
                recipient: None,
                text: "five minutes left".to_string(),
                sent_at: chrono::Utc::now(),
            })
            .unwrap();

        match rx.recv().await {
            Some(RoomEvent::MessageReceived(message)) => {
                assert_eq!(message.sender, "fac-1");
                assert!(message.recipient.is_none());
                assert_eq!(message.text, "five minutes left");
            }
            other => panic!("expected message event, got {:?}", other),
        }
        assert_eq!(mgr.phase(), RoomPhase::Connected);
    }

    #[tokio::test]
    async fn test_missing_schedule_keeps_disconnect_recoverable() {
        let (mgr, mut rx, transport) = manager(Arc::new(CallLog::default()));
        let mut cred = credential(ChronoDuration::hours(1));
        cred.exam_date = None;
        cred.end_time = None;

        mgr.join(cred).await.unwrap();
        assert!(mgr.deadline().await.is_none());
        let _ = rx.recv().await; // Connected

        transport.connection.send_replace(ConnectionState::Disconnected);

        assert!(matches!(rx.recv().await, Some(RoomEvent::RejoinRequired)));
        assert_eq!(mgr.phase(), RoomPhase::Recoverable);
    }

    #[tokio::test]
    async fn test_leave_racing_disconnect_produces_single_exit() {
        let log = Arc::new(CallLog::default());
        let transport = FakeTransport::new(log.clone());
        let backend = Arc::new(FakeBackend::new(log));
        backend.gate_first_left.store(true, Ordering::SeqCst);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mgr = RoomSessionManager::new(
            "exam-1".to_string(),
            "stu-3".to_string(),
            None,
            ParticipantRole::Student,
            backend.clone(),
            transport,
            tx,
        );
        mgr.join(credential(ChronoDuration::hours(1))).await.unwrap();
        let _ = rx.recv().await; // Connected

        // Disconnect handling blocks inside the presence update
        let racing = Arc::clone(&mgr);
        let disconnect = tokio::spawn(async move { racing.handle_disconnect().await });
        backend.left_entered.notified().await;

        mgr.leave(LeaveReason::Manual).await.unwrap();
        backend.left_release.notify_one();
        disconnect.await.unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(RoomEvent::Left {
                reason: LeaveReason::Manual
            })
        ));
        // The resumed disconnect handler must not add a second exit
        assert!(rx.try_recv().is_err());
        assert_eq!(mgr.phase(), RoomPhase::LeftVoluntary);
    }
}

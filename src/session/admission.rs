//! Admission controller: the request/approve/reject protocol gating entry
//! into a proctored room.
//!
//! The backend is authoritative; this side polls. Status polling is
//! level-triggered — each cycle re-reads the full status rather than
//! consuming a diff stream — and stops the instant a terminal status is
//! observed. A generation counter ties every poll loop to the current
//! attempt so results arriving after teardown or supersession are
//! discarded silently.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::backend::{ExamBackend, JoinRequest, JoinRequestAck, JoinStatus};
use crate::error::Result;

#[derive(Debug, Clone)]
pub enum AdmissionEvent {
    /// The student's pending request was approved; room credentials can be
    /// minted for this request id
    Approved { request_id: String },
    /// The request was rejected; the reason is shown to the student and
    /// the request id is abandoned
    Rejected {
        request_id: String,
        reason: Option<String>,
    },
    /// Faculty-side snapshot of who is waiting, one per poll cycle
    PendingQueue(Vec<JoinRequest>),
}

/// Guard over a spawned poll loop. Dropping it cancels the loop, which is
/// how "panel closed" and screen teardown stop faculty queue polling.
pub struct PollHandle {
    handle: JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct AdmissionController {
    backend: Arc<dyn ExamBackend>,
    poll_interval: Duration,
    events: mpsc::UnboundedSender<AdmissionEvent>,
    /// Current attempt generation; in-flight poll loops carry the value
    /// they were spawned under and go silent once it moves on
    generation: Arc<AtomicU64>,
}

impl AdmissionController {
    pub fn new(
        backend: Arc<dyn ExamBackend>,
        poll_interval: Duration,
        events: mpsc::UnboundedSender<AdmissionEvent>,
    ) -> Self {
        Self {
            backend,
            poll_interval,
            events,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Student: queue a join request for the exam. Joinability (window,
    /// prior rejection) is decided by the backend, never computed here; a
    /// denial surfaces as a retryable error with local state untouched.
    pub async fn request_join(&self, exam_id: &str) -> Result<JoinRequestAck> {
        let ack = self.backend.request_join(exam_id).await?;
        tracing::info!(
            exam_id = %exam_id,
            request_id = %ack.request_id,
            is_rejoin = ack.is_rejoin,
            "Admission request accepted by backend"
        );
        Ok(ack)
    }

    /// Student: poll the request's status until it resolves. Supersedes
    /// any earlier watch — one pending request per participant at a time.
    pub fn watch_request(&self, request_id: String) -> PollHandle {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.generation);
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let poll_interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if current.load(Ordering::SeqCst) != generation {
                    tracing::debug!(request_id = %request_id, "Poll loop superseded, discarding");
                    break;
                }

                let report = match backend.join_status(&request_id).await {
                    Ok(report) => report,
                    Err(e) => {
                        tracing::warn!(
                            request_id = %request_id,
                            error = %e,
                            "Status poll failed, retrying next cycle"
                        );
                        continue;
                    }
                };

                if !report.status.is_terminal() {
                    continue;
                }

                // Terminal status observed: emit once and release the id.
                // The stale check repeats here because the network call
                // may have raced a supersession.
                if current.load(Ordering::SeqCst) != generation {
                    tracing::debug!(request_id = %request_id, "Stale terminal status discarded");
                    break;
                }

                match report.status {
                    JoinStatus::Approved => {
                        tracing::info!(request_id = %request_id, "Join request approved");
                        let _ = events.send(AdmissionEvent::Approved {
                            request_id: request_id.clone(),
                        });
                    }
                    JoinStatus::Rejected => {
                        tracing::info!(
                            request_id = %request_id,
                            reason = ?report.rejection_reason,
                            "Join request rejected"
                        );
                        let _ = events.send(AdmissionEvent::Rejected {
                            request_id: request_id.clone(),
                            reason: report.rejection_reason,
                        });
                    }
                    JoinStatus::Pending => unreachable!("terminal check above"),
                }
                break;
            }
        });

        PollHandle { handle }
    }

    /// Invalidate all in-flight poll loops without starting a new one
    /// (screen teardown).
    pub fn supersede(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Faculty: poll the pending queue while the approval panel is open.
    /// The poll result is the sole source of truth for who is waiting.
    pub fn watch_pending(&self, exam_id: String) -> PollHandle {
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let poll_interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match backend.pending_requests(&exam_id).await {
                    Ok(pending) => {
                        if events.send(AdmissionEvent::PendingQueue(pending)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            exam_id = %exam_id,
                            error = %e,
                            "Pending queue poll failed, retrying next cycle"
                        );
                    }
                }
            }
        });

        PollHandle { handle }
    }

    /// Faculty: resolve a pending request as approved. A failure is
    /// surfaced to the faculty user; the next poll cycle re-establishes
    /// queue truth.
    pub async fn approve(&self, request_id: &str) -> Result<()> {
        self.backend.approve_request(request_id).await?;
        tracing::info!(request_id = %request_id, "Approved join request");
        Ok(())
    }

    /// Faculty: resolve a pending request as rejected with a reason.
    pub async fn reject(&self, request_id: &str, reason: &str) -> Result<()> {
        self.backend.reject_request(request_id, reason).await?;
        tracing::info!(request_id = %request_id, reason = %reason, "Rejected join request");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ExamSession, JoinStatusReport, RoomCredential};
    use crate::error::SessionError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted backend: serves join_status responses in order, then keeps
    /// repeating the last one. Counts every status read.
    struct ScriptedBackend {
        statuses: Mutex<VecDeque<JoinStatusReport>>,
        last: Mutex<Option<JoinStatusReport>>,
        status_reads: AtomicU64,
        pending: Mutex<Vec<JoinRequest>>,
    }

    impl ScriptedBackend {
        fn new(statuses: Vec<JoinStatusReport>) -> Arc<Self> {
            Arc::new(Self {
                statuses: Mutex::new(statuses.into()),
                last: Mutex::new(None),
                status_reads: AtomicU64::new(0),
                pending: Mutex::new(Vec::new()),
            })
        }

        fn reads(&self) -> u64 {
            self.status_reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExamBackend for ScriptedBackend {
        async fn exam_details(&self, _exam_id: &str) -> Result<ExamSession> {
            Err(SessionError::internal("not used in this test"))
        }

        async fn request_join(&self, _exam_id: &str) -> Result<JoinRequestAck> {
            Ok(JoinRequestAck {
                request_id: "req-1".to_string(),
                message: None,
                is_rejoin: false,
            })
        }

        async fn join_status(&self, _request_id: &str) -> Result<JoinStatusReport> {
            self.status_reads.fetch_add(1, Ordering::SeqCst);
            let mut queue = self.statuses.lock().unwrap();
            if let Some(report) = queue.pop_front() {
                *self.last.lock().unwrap() = Some(report.clone());
                Ok(report)
            } else {
                self.last
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or_else(|| SessionError::backend("no scripted status"))
            }
        }

        async fn join_room(&self, _request_id: &str) -> Result<RoomCredential> {
            Err(SessionError::internal("not used in this test"))
        }

        async fn update_left_status(&self, _exam_id: &str) -> Result<()> {
            Ok(())
        }

        async fn pending_requests(&self, _exam_id: &str) -> Result<Vec<JoinRequest>> {
            Ok(self.pending.lock().unwrap().clone())
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

    fn pending() -> JoinStatusReport {
        JoinStatusReport {
            status: JoinStatus::Pending,
            rejection_reason: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_stops_on_approval() {
        let backend = ScriptedBackend::new(vec![
            pending(),
            pending(),
            JoinStatusReport {
                status: JoinStatus::Approved,
                rejection_reason: None,
            },
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller =
            AdmissionController::new(backend.clone(), Duration::from_secs(3), tx);

        let watch = controller.watch_request("req-1".to_string());

        match rx.recv().await {
            Some(AdmissionEvent::Approved { request_id }) => assert_eq!(request_id, "req-1"),
            other => panic!("expected approval, got {:?}", other),
        }

        // Polling stopped on the terminal status: the read count stays put
        // even as intervals keep elapsing.
        let reads_at_terminal = backend.reads();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.reads(), reads_at_terminal);
        assert!(watch.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_reports_rejection_reason() {
        let backend = ScriptedBackend::new(vec![
            pending(),
            JoinStatusReport {
                status: JoinStatus::Rejected,
                rejection_reason: Some("ID mismatch".to_string()),
            },
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller = AdmissionController::new(backend, Duration::from_secs(3), tx);

        let _watch = controller.watch_request("req-1".to_string());

        match rx.recv().await {
            Some(AdmissionEvent::Rejected { reason, .. }) => {
                assert_eq!(reason.as_deref(), Some("ID mismatch"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_watch_goes_silent() {
        let backend = ScriptedBackend::new(vec![
            pending(),
            pending(),
            JoinStatusReport {
                status: JoinStatus::Approved,
                rejection_reason: None,
            },
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller = AdmissionController::new(backend, Duration::from_secs(3), tx);

        let _watch = controller.watch_request("req-1".to_string());
        controller.supersede();

        // The superseded loop must never emit, even once the scripted
        // approval becomes observable.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_watch_emits_snapshots_until_dropped() {
        let backend = ScriptedBackend::new(vec![]);
        backend.pending.lock().unwrap().push(JoinRequest {
            request_id: "req-9".to_string(),
            student_id: "stu-3".to_string(),
            student_name: Some("Ada".to_string()),
            status: JoinStatus::Pending,
            is_rejoin: false,
            rejection_reason: None,
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller =
            AdmissionController::new(backend.clone(), Duration::from_secs(3), tx);

        let watch = controller.watch_pending("exam-1".to_string());

        match rx.recv().await {
            Some(AdmissionEvent::PendingQueue(queue)) => {
                assert_eq!(queue.len(), 1);
                assert_eq!(queue[0].request_id, "req-9");
            }
            other => panic!("expected pending snapshot, got {:?}", other),
        }

        // Closing the panel stops the loop
        drop(watch);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_retries_next_cycle() {
        // Empty script: join_status errors until a status is seeded
        let backend = ScriptedBackend::new(vec![]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller =
            AdmissionController::new(backend.clone(), Duration::from_secs(3), tx);

        let _watch = controller.watch_request("req-1".to_string());
        tokio::time::sleep(Duration::from_secs(7)).await;
        assert!(rx.try_recv().is_err());

        backend
            .statuses
            .lock()
            .unwrap()
            .push_back(JoinStatusReport {
                status: JoinStatus::Approved,
                rejection_reason: None,
            });

        match rx.recv().await {
            Some(AdmissionEvent::Approved { .. }) => {}
            other => panic!("expected approval after recovery, got {:?}", other),
        }
    }
}

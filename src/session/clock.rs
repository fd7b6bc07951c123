use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// The absolute instant an exam ends, resolved once from the exam's
/// calendar date and local end time-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamDeadline(DateTime<Local>);

impl ExamDeadline {
    /// Resolve `exam_date` at `end_time` in the local time zone.
    ///
    /// Absent or unparseable inputs yield `None`: the session runs
    /// unbounded, with no expiry side effects. That is a degraded mode,
    /// not an error.
    pub fn resolve(exam_date: Option<NaiveDate>, end_time: Option<&str>) -> Option<Self> {
        let date = exam_date?;
        let time = parse_time_of_day(end_time?)?;
        date.and_time(time).and_local_timezone(Local).earliest().map(Self)
    }

    pub fn instant(&self) -> DateTime<Local> {
        self.0
    }

    pub fn remaining(&self, now: DateTime<Local>) -> chrono::Duration {
        self.0 - now
    }

    pub fn has_passed(&self, now: DateTime<Local>) -> bool {
        now >= self.0
    }
}

fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockEvent {
    /// Fired once when remaining time crosses below the warning threshold
    Warning { remaining: Duration },
    /// Fired exactly once when the exam end instant is reached
    Expired,
}

/// Pure clock transition logic, separated from the ticker so the one-shot
/// guarantees can be tested against arbitrary tick sequences.
#[derive(Debug)]
pub struct ClockState {
    deadline: ExamDeadline,
    warning_threshold: chrono::Duration,
    warning_emitted: bool,
    expired: bool,
}

impl ClockState {
    pub fn new(deadline: ExamDeadline, warning_threshold: Duration) -> Self {
        Self {
            deadline,
            warning_threshold: chrono::Duration::from_std(warning_threshold)
                .unwrap_or_else(|_| chrono::Duration::minutes(5)),
            warning_emitted: false,
            expired: false,
        }
    }

    /// Observe the current time and return the event this tick produces,
    /// if any. Expiry and the warning each fire at most once per session
    /// instance, regardless of tick granularity or drift.
    pub fn observe(&mut self, now: DateTime<Local>) -> Option<ClockEvent> {
        if self.expired {
            return None;
        }

        let remaining = self.deadline.remaining(now);
        if remaining <= chrono::Duration::zero() {
            self.expired = true;
            return Some(ClockEvent::Expired);
        }

        if !self.warning_emitted && remaining <= self.warning_threshold {
            self.warning_emitted = true;
            return Some(ClockEvent::Warning {
                remaining: remaining.to_std().unwrap_or_default(),
            });
        }

        None
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }
}

/// Ticker that drives a [`ClockState`] on a fixed interval and publishes
/// its events. Stops after expiry, when the receiver goes away, or when
/// the handle is dropped on screen teardown.
pub struct SessionClock {
    handle: JoinHandle<()>,
}

impl SessionClock {
    pub fn start(
        deadline: ExamDeadline,
        tick: Duration,
        warning_threshold: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ClockEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            let mut state = ClockState::new(deadline, warning_threshold);
            let mut ticker = tokio::time::interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                match state.observe(Local::now()) {
                    Some(ClockEvent::Expired) => {
                        tracing::info!("Exam end instant reached, clock expired");
                        let _ = events.send(ClockEvent::Expired);
                        break;
                    }
                    Some(event) => {
                        if events.send(event).is_err() {
                            break;
                        }
                    }
                    None => {
                        if events.is_closed() {
                            break;
                        }
                    }
                }
            }
        });

        (Self { handle }, receiver)
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

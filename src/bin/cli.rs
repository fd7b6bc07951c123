// Exam session coordinator CLI validation tool
// Drives the student and proctor flows against a live backend so the
// admission protocol and session timing can be exercised from a terminal.

use clap::{Parser, Subcommand};
use colored::*;
use rand::Rng;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, watch};

use proctor_session::backend::client::HttpExamBackend;
use proctor_session::backend::{ExamBackend, RoomCredential};
use proctor_session::config::Config;
use proctor_session::error::Result;
use proctor_session::session::admission::AdmissionEvent;
use proctor_session::session::clock::ClockEvent;
use proctor_session::session::proctor::ProctorControlPlane;
use proctor_session::session::room::RoomEvent;
use proctor_session::session::student::StudentFlow;
use proctor_session::session::transport::{
    ConnectionState, Peer, RoomJoinParams, RoomMessage, RoomTransport,
};
use proctor_session::SessionEvent;

#[derive(Parser)]
#[command(name = "proctor-cli")]
#[command(about = "Exam session coordinator validation tool", long_about = None)]
struct Cli {
    /// Backend base URL (overrides BACKEND_URL)
    #[arg(short, long)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an exam's schedule and mode
    Exam {
        /// Exam identifier
        #[arg(short, long)]
        exam_id: String,
    },

    /// List pending join requests for an exam
    Pending {
        /// Exam identifier
        #[arg(short, long)]
        exam_id: String,
    },

    /// Approve a pending join request
    Approve {
        /// Request identifier
        #[arg(short, long)]
        request_id: String,
    },

    /// Reject a pending join request with a reason
    Reject {
        /// Request identifier
        #[arg(short, long)]
        request_id: String,

        /// Reason shown to the student
        #[arg(long, default_value = "Not eligible")]
        reason: String,
    },

    /// Remove a connected student from the room
    Remove {
        /// Exam identifier
        #[arg(short, long)]
        exam_id: String,

        /// Student identifier
        #[arg(short, long)]
        student_id: String,

        /// Removal reason
        #[arg(long, default_value = "Removed by proctor")]
        reason: String,
    },

    /// Run the full student flow: request, poll, join, run the clock
    Student {
        /// Exam identifier
        #[arg(short, long)]
        exam_id: String,

        /// Student identity (random suffix if omitted)
        #[arg(short, long)]
        identity: Option<String>,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Run the proctor flow: join the room and watch the admission queue
    Proctor {
        /// Exam identifier
        #[arg(short, long)]
        exam_id: String,

        /// Proctor identity (random suffix if omitted)
        #[arg(short, long)]
        identity: Option<String>,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Room code from the faculty exam view
        #[arg(long)]
        room_code: String,

        /// Room auth token from the faculty exam view
        #[arg(long)]
        auth_token: String,

        /// Exam date (YYYY-MM-DD) for the session clock
        #[arg(long)]
        exam_date: Option<String>,

        /// Exam end time (HH:MM) for the session clock
        #[arg(long)]
        end_time: Option<String>,

        /// Approve every pending request as it appears
        #[arg(long)]
        auto_approve: bool,
    },

    /// List the manual validation scenarios
    Scenarios,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(backend) = &cli.backend {
        config.backend.base_url = backend.clone();
    }

    let backend: Arc<dyn ExamBackend> = match HttpExamBackend::new(&config.backend) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            println!("{} Failed to build backend client: {}", "✗".red(), e);
            return;
        }
    };

    match cli.command {
        Commands::Exam { exam_id } => {
            show_exam(backend, &exam_id).await;
        }
        Commands::Pending { exam_id } => {
            list_pending(backend, &exam_id).await;
        }
        Commands::Approve { request_id } => {
            report("Approve", backend.approve_request(&request_id).await);
        }
        Commands::Reject { request_id, reason } => {
            report("Reject", backend.reject_request(&request_id, &reason).await);
        }
        Commands::Remove {
            exam_id,
            student_id,
            reason,
        } => {
            report(
                "Remove",
                backend.remove_student(&exam_id, &student_id, &reason).await,
            );
        }
        Commands::Student {
            exam_id,
            identity,
            name,
        } => {
            let identity = identity.unwrap_or_else(|| random_identity("student"));
            run_student(backend, config, exam_id, identity, name).await;
        }
        Commands::Proctor {
            exam_id,
            identity,
            name,
            room_code,
            auth_token,
            exam_date,
            end_time,
            auto_approve,
        } => {
            let identity = identity.unwrap_or_else(|| random_identity("proctor"));
            let credential = RoomCredential {
                room_code,
                auth_token,
                exam_name: None,
                duration_minutes: None,
                exam_date: exam_date.and_then(|d| d.parse().ok()),
                end_time,
                total_students: None,
            };
            run_proctor(backend, config, exam_id, identity, name, credential, auto_approve).await;
        }
        Commands::Scenarios => {
            list_scenarios();
        }
    }
}

fn random_identity(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    format!("{}_{:04}", prefix, rng.gen_range(0..10000))
}

fn report(action: &str, result: Result<()>) {
    match result {
        Ok(()) => println!("{} {} succeeded", "✓".green(), action),
        Err(e) => println!("{} {} failed: {}", "✗".red(), action, e),
    }
}

async fn show_exam(backend: Arc<dyn ExamBackend>, exam_id: &str) {
    match backend.exam_details(exam_id).await {
        Ok(exam) => {
            println!("{} {}", "Exam".bold(), exam.exam_id);
            println!(
                "  date:     {}",
                exam.exam_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "unset".to_string())
            );
            println!("  starts:   {}", exam.start_time.as_deref().unwrap_or("unset"));
            println!("  ends:     {}", exam.end_time.as_deref().unwrap_or("unset"));
            println!("  mode:     {}", exam.mode.as_deref().unwrap_or("unset"));
            if let Some(total) = exam.total_students {
                println!("  students: {}", total);
            }
        }
        Err(e) => println!("{} Exam fetch failed: {}", "✗".red(), e),
    }
}

async fn list_pending(backend: Arc<dyn ExamBackend>, exam_id: &str) {
    println!("{}", "Fetching pending join requests...".cyan());

    match backend.pending_requests(exam_id).await {
        Ok(pending) if pending.is_empty() => {
            println!("{} No pending requests", "·".yellow());
        }
        Ok(pending) => {
            for request in pending {
                let rejoin = if request.is_rejoin { " (rejoin)" } else { "" };
                println!(
                    "{} {} — {}{}",
                    "•".green(),
                    request.request_id,
                    request.student_name.as_deref().unwrap_or(&request.student_id),
                    rejoin.yellow()
                );
            }
        }
        Err(e) => println!("{} Queue fetch failed: {}", "✗".red(), e),
    }
}

async fn run_student(
    backend: Arc<dyn ExamBackend>,
    config: Config,
    exam_id: String,
    identity: String,
    name: Option<String>,
) {
    println!(
        "{} Starting student flow as {}",
        "→".cyan(),
        identity.bold()
    );

    let transport = ConsoleTransport::new(identity.clone());
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();
    let flow = StudentFlow::new(
        exam_id,
        identity,
        name,
        backend,
        transport,
        ui_tx,
        config.timing,
    );
    flow.start().await;

    match flow.begin().await {
        Ok(ack) => {
            println!(
                "{} Join request {} queued{}",
                "✓".green(),
                ack.request_id,
                if ack.is_rejoin { " (rejoin)".yellow() } else { "".normal() }
            );
        }
        Err(e) => {
            println!("{} Join request failed: {}", "✗".red(), e);
            return;
        }
    }

    loop {
        tokio::select! {
            event = ui_rx.recv() => {
                let Some(event) = event else { break };
                if print_event(&event) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Leaving session...".yellow());
                if let Err(e) = flow.leave().await {
                    println!("{} Leave failed: {}", "✗".red(), e);
                }
                break;
            }
        }
    }
}

async fn run_proctor(
    backend: Arc<dyn ExamBackend>,
    config: Config,
    exam_id: String,
    identity: String,
    name: Option<String>,
    credential: RoomCredential,
    auto_approve: bool,
) {
    println!(
        "{} Starting proctor flow as {}",
        "→".cyan(),
        identity.bold()
    );

    let transport = ConsoleTransport::new(identity.clone());
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();
    let plane = ProctorControlPlane::new(
        exam_id,
        identity,
        name,
        backend,
        transport,
        ui_tx,
        config.timing,
    );
    plane.start().await;

    if let Err(e) = plane.enter_room(credential).await {
        println!("{} Room join failed: {}", "✗".red(), e);
        return;
    }

    loop {
        tokio::select! {
            event = ui_rx.recv() => {
                let Some(event) = event else { break };
                if let SessionEvent::Admission(AdmissionEvent::PendingQueue(queue)) = &event {
                    if auto_approve {
                        for request in queue {
                            report("Approve", plane.approve(&request.request_id).await);
                        }
                    }
                }
                if print_event(&event) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Ending session...".yellow());
                if let Err(e) = plane.leave().await {
                    println!("{} Leave failed: {}", "✗".red(), e);
                }
                break;
            }
        }
    }
}

/// Render a session event. Returns true when the session is over.
fn print_event(event: &SessionEvent) -> bool {
    match event {
        SessionEvent::Admission(AdmissionEvent::Approved { request_id }) => {
            println!("{} Request {} approved", "✓".green(), request_id);
        }
        SessionEvent::Admission(AdmissionEvent::Rejected { request_id, reason }) => {
            println!(
                "{} Request {} rejected: {}",
                "✗".red(),
                request_id,
                reason.as_deref().unwrap_or("no reason given")
            );
            return true;
        }
        SessionEvent::Admission(AdmissionEvent::PendingQueue(queue)) => {
            println!("{} {} student(s) waiting", "·".cyan(), queue.len());
        }
        SessionEvent::Room(RoomEvent::Connected) => {
            println!("{} Connected to exam room", "✓".green());
        }
        SessionEvent::Room(RoomEvent::RejoinRequired) => {
            println!(
                "{} Connection lost — requesting readmission",
                "!".yellow()
            );
        }
        SessionEvent::Room(RoomEvent::SessionExpired) => {
            println!("{} Session expired, no rejoin possible", "✗".red());
            return true;
        }
        SessionEvent::Room(RoomEvent::MessageReceived(message)) => {
            let kind = if message.recipient.is_some() {
                "direct"
            } else {
                "broadcast"
            };
            println!(
                "{} [{}] {}: {}",
                "✉".cyan(),
                kind,
                message.sender,
                message.text
            );
        }
        SessionEvent::Room(RoomEvent::Left { reason }) => {
            println!("{} Left room ({:?})", "·".yellow(), reason);
            return true;
        }
        SessionEvent::Clock(ClockEvent::Warning { remaining }) => {
            println!(
                "{} {} minutes remaining",
                "⏰".yellow(),
                remaining.as_secs() / 60
            );
        }
        SessionEvent::Clock(ClockEvent::Expired) => {
            println!("{} Exam time is up", "⏰".red());
        }
        SessionEvent::Notice(message) => {
            println!("{} {}", "!".yellow(), message);
        }
        SessionEvent::Fatal(message) => {
            println!("{} {}", "✗".red(), message);
            return true;
        }
    }
    false
}

fn list_scenarios() {
    println!("{}", "Manual validation scenarios:".bold());
    println!("  1. student + approve  — student requests, proctor approves, student joins");
    println!("  2. student + reject   — rejection reason reaches the student, polling stops");
    println!("  3. disconnect rejoin  — kill connectivity before the end time, expect rejoin");
    println!("  4. disconnect expired — kill connectivity after the end time, expect terminal");
    println!("  5. warning            — five-minute warning fires once");
    println!("  6. expiry             — clock expiry forces leave on both roles");
}

/// Terminal-backed transport stand-in: logs the media operations a real
/// transport adapter would perform. Lets the CLI validate the admission
/// protocol and session timing against a live backend without an SFU.
struct ConsoleTransport {
    identity: String,
    connection: watch::Sender<ConnectionState>,
    roster: watch::Sender<u64>,
    messages: broadcast::Sender<RoomMessage>,
}

impl ConsoleTransport {
    fn new(identity: String) -> Arc<Self> {
        let (connection, _) = watch::channel(ConnectionState::Idle);
        let (roster, _) = watch::channel(0);
        let (messages, _) = broadcast::channel(16);
        Arc::new(Self {
            identity,
            connection,
            roster,
            messages,
        })
    }
}

#[async_trait]
impl RoomTransport for ConsoleTransport {
    async fn join(&self, params: RoomJoinParams) -> Result<()> {
        println!(
            "{} [transport] {} joining room {} as {}",
            "·".cyan(),
            self.identity,
            params.room_code,
            params.role.as_str()
        );
        self.connection.send_replace(ConnectionState::Connected);
        Ok(())
    }

    async fn leave(&self) -> Result<()> {
        println!("{} [transport] {} leaving room", "·".cyan(), self.identity);
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

    async fn attach_video(&self, track_id: &str, render_target: &str) -> Result<()> {
        println!(
            "{} [transport] attach {} -> {}",
            "·".cyan(),
            track_id,
            render_target
        );
        Ok(())
    }

    async fn detach_video(&self, track_id: &str) -> Result<()> {
        println!("{} [transport] detach {}", "·".cyan(), track_id);
        Ok(())
    }

    async fn send_broadcast_message(&self, text: &str) -> Result<()> {
        println!("{} [broadcast] {}", "»".cyan(), text);
        Ok(())
    }

    async fn send_direct_message(&self, text: &str, peer_id: &str) -> Result<()> {
        println!("{} [direct -> {}] {}", "»".cyan(), peer_id, text);
        Ok(())
    }

    async fn set_local_audio_enabled(&self, enabled: bool) -> Result<()> {
        println!("{} [transport] audio enabled: {}", "·".cyan(), enabled);
        Ok(())
    }

    async fn set_local_video_enabled(&self, enabled: bool) -> Result<()> {
        println!("{} [transport] video enabled: {}", "·".cyan(), enabled);
        Ok(())
    }
}

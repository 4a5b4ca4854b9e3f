use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rollcall_core::{AttendanceRecord, ConfidenceBand, IdentitySummary};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rollcall", about = "Face recognition attendance CLI")]
struct Cli {
    /// Talk to a daemon on the system bus instead of the session bus
    #[arg(long, global = true)]
    system: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the face in a frame and mark attendance
    Mark {
        /// Frame file handed to the detection pipeline
        #[arg(short, long)]
        frame: PathBuf,
    },
    /// Name the unknown face from the last `mark`
    Register {
        /// Name to register (surrounding whitespace is trimmed)
        name: String,
    },
    /// Discard the unknown face from the last `mark`
    Cancel,
    /// List attendance records, newest first
    Records,
    /// List registered identities
    Identities,
    /// Show daemon status
    Status,
}

#[zbus::proxy(
    interface = "org.rollcall.Attendance1",
    default_service = "org.rollcall.Attendance1",
    default_path = "/org/rollcall/Attendance1"
)]
trait Attendance {
    async fn detect(&self, frame: &[u8]) -> zbus::Result<String>;
    async fn register(&self, name: &str) -> zbus::Result<String>;
    async fn cancel(&self) -> zbus::Result<bool>;
    async fn records(&self) -> zbus::Result<String>;
    async fn identities(&self) -> zbus::Result<String>;
    async fn status(&self) -> zbus::Result<String>;
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let connection = if cli.system {
        zbus::Connection::system().await
    } else {
        zbus::Connection::session().await
    }
    .context("connecting to D-Bus")?;
    let proxy = AttendanceProxy::new(&connection)
        .await
        .context("rollcalld not reachable")?;

    match cli.command {
        Commands::Mark { frame } => {
            let bytes = std::fs::read(&frame)
                .with_context(|| format!("reading frame {}", frame.display()))?;
            tracing::debug!(frame = %frame.display(), bytes = bytes.len(), "sending frame");
            let reply = parse_reply("detect", &proxy.detect(&bytes).await?)?;
            match reply["outcome"].as_str() {
                Some("marked") => {
                    let record: AttendanceRecord = serde_json::from_value(reply["record"].clone())?;
                    println!("Attendance marked: {}", format_record(&record));
                }
                Some("registration_required") => {
                    println!("New face detected. Run `rollcall register <name>` or `rollcall cancel`.");
                }
                _ => bail!("unexpected reply: {reply}"),
            }
            print_warnings(&reply);
        }
        Commands::Register { name } => {
            let reply = parse_reply("register", &proxy.register(&name).await?)?;
            match reply["outcome"].as_str() {
                Some("registered") => {
                    let record: AttendanceRecord = serde_json::from_value(reply["record"].clone())?;
                    println!("{}", registered_message(&record, &reply));
                }
                Some("blank_name") => println!("Name must not be blank"),
                _ => bail!("unexpected reply: {reply}"),
            }
            print_warnings(&reply);
        }
        Commands::Cancel => {
            if proxy.cancel().await? {
                println!("Pending face discarded");
            } else {
                println!("Nothing to cancel");
            }
        }
        Commands::Records => {
            let records: Vec<AttendanceRecord> = serde_json::from_str(&proxy.records().await?)?;
            if records.is_empty() {
                println!("No attendance records yet");
            }
            for record in &records {
                println!("{}", format_record(record));
            }
        }
        Commands::Identities => {
            let identities: Vec<IdentitySummary> =
                serde_json::from_str(&proxy.identities().await?)?;
            if identities.is_empty() {
                println!("No faces registered");
            }
            for identity in &identities {
                println!("{}  {}", identity.id, identity.name);
            }
        }
        Commands::Status => {
            let status: serde_json::Value = serde_json::from_str(&proxy.status().await?)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

fn format_record(record: &AttendanceRecord) -> String {
    let marker = match record.band() {
        ConfidenceBand::High => "✓",
        ConfidenceBand::Low => "?",
    };
    format!(
        "{marker} {:<24} {}  {}",
        record.name,
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.confidence_label()
    )
}

fn registered_message(record: &AttendanceRecord, reply: &serde_json::Value) -> String {
    format!(
        "Registered {} ({})",
        record.name,
        reply["identity_id"].as_str().unwrap_or_default()
    )
}

fn parse_reply(method: &str, raw: &str) -> Result<serde_json::Value> {
    tracing::debug!(method, reply = raw, "daemon reply");
    serde_json::from_str(raw).with_context(|| format!("unreadable {method} reply"))
}

fn print_warnings(reply: &serde_json::Value) {
    if let Some(warnings) = reply["warnings"].as_array() {
        for warning in warnings {
            eprintln!("warning: {}", warning.as_str().unwrap_or_default());
        }
    }
}

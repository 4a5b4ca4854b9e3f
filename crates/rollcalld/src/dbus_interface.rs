use crate::config::Config;
use crate::engine::{EngineError, EngineHandle};
use rollcall_core::{DetectionOutcome, PersistenceError, RegistrationOutcome};
use serde_json::json;
use zbus::interface;

pub const BUS_NAME: &str = "org.rollcall.Attendance1";
pub const OBJECT_PATH: &str = "/org/rollcall/Attendance1";

/// D-Bus interface for the attendance daemon.
///
/// Bus name: org.rollcall.Attendance1
/// Object path: /org/rollcall/Attendance1
///
/// Replies are JSON documents; errors come back as `org.freedesktop.DBus.Error.Failed`.
pub struct AttendanceService {
    engine: EngineHandle,
    config: Config,
}

impl AttendanceService {
    pub fn new(engine: EngineHandle, config: Config) -> Self {
        Self { engine, config }
    }
}

#[interface(name = "org.rollcall.Attendance1")]
impl AttendanceService {
    /// Detect the face in `frame` and mark attendance, or ask for a name.
    async fn detect(&self, frame: Vec<u8>) -> zbus::fdo::Result<String> {
        tracing::info!(bytes = frame.len(), "detect requested");
        let outcome = self.engine.detect(frame).await.map_err(failed)?;
        Ok(detection_json(&outcome).to_string())
    }

    /// Register the pending face under `name`.
    async fn register(&self, name: &str) -> zbus::fdo::Result<String> {
        tracing::info!(name, "register requested");
        let outcome = self.engine.register(name.to_string()).await.map_err(failed)?;
        Ok(registration_json(&outcome).to_string())
    }

    /// Discard the pending face. Returns false if none was pending.
    async fn cancel(&self) -> zbus::fdo::Result<bool> {
        self.engine.cancel().await.map_err(failed)
    }

    /// Attendance records, newest first.
    async fn records(&self) -> zbus::fdo::Result<String> {
        let snapshot = self.engine.snapshot().await.map_err(failed)?;
        serde_json::to_string(&snapshot.records).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
    }

    /// Registered identities in registry order (names and ids only).
    async fn identities(&self) -> zbus::fdo::Result<String> {
        let snapshot = self.engine.snapshot().await.map_err(failed)?;
        serde_json::to_string(&snapshot.identities)
            .map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
    }

    /// Return daemon status information.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let snapshot = self.engine.snapshot().await.map_err(failed)?;
        Ok(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "state": snapshot.state,
            "identities": snapshot.identities.len(),
            "records": snapshot.records.len(),
            "match_threshold": self.config.match_threshold,
            "match_policy": self.config.match_policy.as_str(),
            "pipeline": if self.config.pipeline_command.is_some() { "command" } else { "precomputed" },
            "db_path": self.config.db_path.display().to_string(),
        })
        .to_string())
    }
}

fn failed(err: EngineError) -> zbus::fdo::Error {
    tracing::info!(error = %err, "request failed");
    zbus::fdo::Error::Failed(err.to_string())
}

fn warnings(failures: &[PersistenceError]) -> Vec<String> {
    failures.iter().map(|e| e.to_string()).collect()
}

fn detection_json(outcome: &DetectionOutcome) -> serde_json::Value {
    match outcome {
        DetectionOutcome::Marked {
            candidate,
            record,
            save_failures,
        } => json!({
            "outcome": "marked",
            "record": record,
            "identity_id": candidate.id,
            "distance": candidate.distance,
            "warnings": warnings(save_failures),
        }),
        DetectionOutcome::RegistrationRequired => json!({ "outcome": "registration_required" }),
    }
}

fn registration_json(outcome: &RegistrationOutcome) -> serde_json::Value {
    match outcome {
        RegistrationOutcome::Registered {
            id,
            record,
            save_failures,
        } => json!({
            "outcome": "registered",
            "identity_id": id,
            "record": record,
            "warnings": warnings(save_failures),
        }),
        RegistrationOutcome::BlankName => json!({ "outcome": "blank_name" }),
    }
}

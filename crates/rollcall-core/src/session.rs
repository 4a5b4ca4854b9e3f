//! Attendance session orchestrator.
//!
//! Drives detect → match → (register) → append, owns the registry and the
//! ledger, and writes both back through the persistence gateway after every
//! mutation.
//!
//! ```text
//!  Idle ──begin_detection──▶ Detecting ──0 / >1 faces, pipeline error──▶ Idle (Err)
//!                                │
//!                                ├── match ──▶ append + persist ──▶ Idle
//!                                └── no match ──▶ AwaitingRegistration
//!  AwaitingRegistration ──submit(name)──▶ insert + append + persist ──▶ Idle
//!  AwaitingRegistration ──cancel──▶ Idle
//! ```
//!
//! Detection is split into [`Session::begin_detection`] and
//! [`Session::complete_detection`] so a caller can run the pipeline off the
//! owning thread and still have overlapping attempts rejected.

use crate::descriptor::{Descriptor, DescriptorError};
use crate::ledger::{AttendanceLedger, AttendanceRecord};
use crate::matcher::{Candidate, MatchPolicy, MatchResult, Matcher, DEFAULT_MATCH_THRESHOLD};
use crate::persistence::{
    self, PersistenceError, PersistenceGateway, ATTENDANCE_RECORDS_KEY, KNOWN_FACES_KEY,
};
use crate::pipeline::{DetectionPipeline, PipelineError};
use crate::registry::{IdentityId, IdentityRegistry, KnownIdentity};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Confidence recorded for a freshly registered face.
pub const REGISTRATION_CONFIDENCE: f32 = 100.0;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no face detected")]
    NoFaceDetected,
    #[error("multiple faces detected ({count}); ensure only one face is visible")]
    MultipleFacesDetected { count: usize },
    #[error("detection pipeline unavailable: {0}")]
    PipelineUnavailable(String),
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(#[from] DescriptorError),
    #[error("a detection is already in progress")]
    DetectionInFlight,
    #[error("a detected face is awaiting registration")]
    AwaitingRegistration,
    #[error("no detection in progress")]
    NotDetecting,
    #[error("no face is awaiting registration")]
    NotAwaitingRegistration,
    #[error("failed to load session state: {0}")]
    Load(#[from] PersistenceError),
}

impl From<PipelineError> for SessionError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Unavailable(reason) => SessionError::PipelineUnavailable(reason),
            PipelineError::InvalidDescriptor(e) => SessionError::InvalidDescriptor(e),
        }
    }
}

/// Externally visible orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Detecting,
    AwaitingRegistration,
}

enum Phase {
    Idle,
    Detecting,
    AwaitingRegistration(Descriptor),
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Distance below which a registry entry qualifies as a match.
    pub threshold: f32,
    pub policy: MatchPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            policy: MatchPolicy::default(),
        }
    }
}

#[derive(Debug)]
pub enum DetectionOutcome {
    /// The face matched a known identity and attendance was recorded.
    Marked {
        candidate: Candidate,
        record: AttendanceRecord,
        /// Saves that failed; the in-memory state still holds the record.
        save_failures: Vec<PersistenceError>,
    },
    /// Unknown face; the session now waits for a name.
    RegistrationRequired,
}

#[derive(Debug)]
pub enum RegistrationOutcome {
    Registered {
        id: IdentityId,
        record: AttendanceRecord,
        save_failures: Vec<PersistenceError>,
    },
    /// Blank or whitespace-only name; nothing changed.
    BlankName,
}

/// Registry entry without its descriptor, for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub id: IdentityId,
    pub name: String,
}

impl From<&KnownIdentity> for IdentitySummary {
    fn from(identity: &KnownIdentity) -> Self {
        Self {
            id: identity.id,
            name: identity.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub identities: Vec<IdentitySummary>,
    /// Newest first.
    pub records: Vec<AttendanceRecord>,
}

pub struct Session {
    registry: IdentityRegistry,
    ledger: AttendanceLedger,
    gateway: Box<dyn PersistenceGateway>,
    matcher: Box<dyn Matcher>,
    config: SessionConfig,
    phase: Phase,
    registry_dirty: bool,
}

impl Session {
    /// Load both collections from `gateway` and start in `Idle`.
    ///
    /// Missing keys start empty. A blob that cannot be decoded is an error.
    pub fn open<G>(gateway: G, config: SessionConfig) -> Result<Self, SessionError>
    where
        G: PersistenceGateway + 'static,
    {
        let identities = persistence::load_identities(&gateway)?;
        let records = persistence::load_records(&gateway)?;

        tracing::info!(
            identities = identities.len(),
            records = records.len(),
            threshold = config.threshold,
            policy = config.policy.as_str(),
            "session state loaded"
        );

        Ok(Self {
            registry: IdentityRegistry::from_identities(identities),
            ledger: AttendanceLedger::from_records(records),
            gateway: Box::new(gateway),
            matcher: config.policy.matcher(),
            config,
            phase: Phase::Idle,
            registry_dirty: false,
        })
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Idle => SessionState::Idle,
            Phase::Detecting => SessionState::Detecting,
            Phase::AwaitingRegistration(_) => SessionState::AwaitingRegistration,
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn identities(&self) -> &[KnownIdentity] {
        self.registry.all()
    }

    /// Attendance records, newest first.
    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.ledger.all()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            identities: self.registry.all().iter().map(IdentitySummary::from).collect(),
            records: self.ledger.all(),
        }
    }

    /// `Idle → Detecting`. Rejected without a state change otherwise.
    pub fn begin_detection(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Detecting;
                Ok(())
            }
            Phase::Detecting => {
                tracing::debug!("detect rejected: detection already in flight");
                Err(SessionError::DetectionInFlight)
            }
            Phase::AwaitingRegistration(_) => {
                tracing::debug!("detect rejected: awaiting registration");
                Err(SessionError::AwaitingRegistration)
            }
        }
    }

    /// Feed the pipeline result for the outstanding detection.
    ///
    /// Errors leave the session `Idle` with no registry or ledger change.
    pub fn complete_detection(
        &mut self,
        detected: Result<Vec<Descriptor>, PipelineError>,
    ) -> Result<DetectionOutcome, SessionError> {
        if !matches!(self.phase, Phase::Detecting) {
            return Err(SessionError::NotDetecting);
        }
        self.phase = Phase::Idle;

        let mut descriptors = detected.map_err(|e| {
            tracing::warn!(error = %e, "detection failed");
            SessionError::from(e)
        })?;

        let descriptor = match descriptors.len() {
            0 => return Err(SessionError::NoFaceDetected),
            1 => descriptors.remove(0),
            count => return Err(SessionError::MultipleFacesDetected { count }),
        };

        match self
            .matcher
            .find(&descriptor, self.registry.all(), self.config.threshold)
        {
            MatchResult::Matched(candidate) => {
                let record =
                    AttendanceRecord::new(candidate.name.clone(), Utc::now(), candidate.confidence());
                tracing::info!(
                    name = %record.name,
                    confidence = record.confidence,
                    distance = candidate.distance,
                    "attendance marked"
                );
                self.ledger.append(record.clone());
                let save_failures = self.persist(false);
                Ok(DetectionOutcome::Marked {
                    candidate,
                    record,
                    save_failures,
                })
            }
            MatchResult::NoMatch => {
                tracing::info!("unknown face; awaiting registration");
                self.phase = Phase::AwaitingRegistration(descriptor);
                Ok(DetectionOutcome::RegistrationRequired)
            }
        }
    }

    /// Run one full detection against `pipeline`.
    pub fn detect(
        &mut self,
        pipeline: &dyn DetectionPipeline,
        frame: &[u8],
    ) -> Result<DetectionOutcome, SessionError> {
        self.begin_detection()?;
        let detected = pipeline.detect(frame);
        self.complete_detection(detected)
    }

    /// Register the pending face under `name` (trimmed) and record attendance.
    pub fn submit_registration(&mut self, name: &str) -> Result<RegistrationOutcome, SessionError> {
        if !matches!(self.phase, Phase::AwaitingRegistration(_)) {
            return Err(SessionError::NotAwaitingRegistration);
        }

        let name = name.trim();
        if name.is_empty() {
            return Ok(RegistrationOutcome::BlankName);
        }

        let Phase::AwaitingRegistration(descriptor) = std::mem::replace(&mut self.phase, Phase::Idle)
        else {
            return Err(SessionError::NotAwaitingRegistration);
        };

        let id = self.registry.insert(name, descriptor);
        let record = AttendanceRecord::new(name, Utc::now(), REGISTRATION_CONFIDENCE);
        self.ledger.append(record.clone());
        tracing::info!(%id, name, "new face registered");

        let save_failures = self.persist(true);
        Ok(RegistrationOutcome::Registered {
            id,
            record,
            save_failures,
        })
    }

    /// Drop the pending face. Returns `false` if nothing was pending.
    pub fn cancel_registration(&mut self) -> bool {
        if matches!(self.phase, Phase::AwaitingRegistration(_)) {
            self.phase = Phase::Idle;
            tracing::debug!("registration cancelled");
            true
        } else {
            false
        }
    }

    /// Save the ledger, plus the registry when it changed or an earlier save
    /// of it failed. Failures are returned, never rolled back.
    fn persist(&mut self, registry_changed: bool) -> Vec<PersistenceError> {
        self.registry_dirty |= registry_changed;
        let mut failures = Vec::new();

        if self.registry_dirty {
            match persistence::encode_identities(self.registry.all())
                .and_then(|blob| self.gateway.save(KNOWN_FACES_KEY, &blob))
            {
                Ok(()) => self.registry_dirty = false,
                Err(e) => {
                    tracing::warn!(key = KNOWN_FACES_KEY, error = %e, "persistence write failed");
                    failures.push(e);
                }
            }
        }

        if let Err(e) = persistence::encode_records(self.ledger.in_append_order())
            .and_then(|blob| self.gateway.save(ATTENDANCE_RECORDS_KEY, &blob))
        {
            tracing::warn!(key = ATTENDANCE_RECORDS_KEY, error = %e, "persistence write failed");
            failures.push(e);
        }

        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DESCRIPTOR_DIM;
    use crate::persistence::MemoryGateway;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn at(offset: f32) -> Descriptor {
        let mut values = vec![0.0; DESCRIPTOR_DIM];
        values[0] = offset;
        Descriptor::new(values).unwrap()
    }

    struct FixedPipeline {
        faces: Vec<Descriptor>,
        calls: AtomicUsize,
    }

    impl FixedPipeline {
        fn new(faces: Vec<Descriptor>) -> Self {
            Self {
                faces,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DetectionPipeline for FixedPipeline {
        fn detect(&self, _frame: &[u8]) -> Result<Vec<Descriptor>, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.faces.clone())
        }
    }

    struct OfflinePipeline;

    impl DetectionPipeline for OfflinePipeline {
        fn detect(&self, _frame: &[u8]) -> Result<Vec<Descriptor>, PipelineError> {
            Err(PipelineError::Unavailable("camera unplugged".into()))
        }
    }

    fn open(gateway: &Arc<MemoryGateway>) -> Session {
        Session::open(Arc::clone(gateway), SessionConfig::default()).unwrap()
    }

    #[test]
    fn test_unknown_face_then_register() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);
        let pipeline = FixedPipeline::new(vec![at(0.0)]);

        let outcome = session.detect(&pipeline, b"frame").unwrap();
        assert!(matches!(outcome, DetectionOutcome::RegistrationRequired));
        assert_eq!(session.state(), SessionState::AwaitingRegistration);
        assert!(session.identities().is_empty());
        assert!(session.records().is_empty());

        let outcome = session.submit_registration("Alice").unwrap();
        let RegistrationOutcome::Registered { record, save_failures, .. } = outcome else {
            panic!("expected registration");
        };
        assert!(save_failures.is_empty());
        assert_eq!(record.name, "Alice");
        assert_eq!(record.confidence, 100.0);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.identities().len(), 1);
        assert_eq!(session.identities()[0].name, "Alice");
        assert_eq!(session.records().len(), 1);
        assert_eq!(session.records()[0].name, "Alice");
    }

    #[test]
    fn test_known_face_marks_attendance() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);
        session.detect(&FixedPipeline::new(vec![at(0.0)]), b"").unwrap();
        session.submit_registration("Bob").unwrap();

        let outcome = session
            .detect(&FixedPipeline::new(vec![at(0.3)]), b"")
            .unwrap();
        let DetectionOutcome::Marked { record, candidate, save_failures } = outcome else {
            panic!("expected a match");
        };
        assert!(save_failures.is_empty());
        assert_eq!(record.name, "Bob");
        assert_eq!(candidate.name, "Bob");
        assert!((record.confidence - 70.0).abs() < 1e-3, "got {}", record.confidence);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.records().len(), 2);
        assert_eq!(session.records()[0].confidence, record.confidence);
    }

    #[test]
    fn test_repeated_detections_append_repeated_records() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);
        session.detect(&FixedPipeline::new(vec![at(0.0)]), b"").unwrap();
        session.submit_registration("Cy").unwrap();

        let pipeline = FixedPipeline::new(vec![at(0.1)]);
        for _ in 0..3 {
            session.detect(&pipeline, b"").unwrap();
        }
        assert_eq!(session.records().len(), 4);
        assert!(session.records().iter().all(|r| r.name == "Cy"));
        assert_eq!(session.identities().len(), 1);
    }

    #[test]
    fn test_multiple_faces_rejected_without_mutation() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);
        let pipeline = FixedPipeline::new(vec![at(0.0), at(1.0)]);

        let err = session.detect(&pipeline, b"").unwrap_err();
        assert!(matches!(err, SessionError::MultipleFacesDetected { count: 2 }));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.identities().is_empty());
        assert!(session.records().is_empty());
        assert!(gateway.blob(ATTENDANCE_RECORDS_KEY).is_none());
    }

    #[test]
    fn test_no_face_returns_to_idle() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);
        let err = session.detect(&FixedPipeline::new(Vec::new()), b"").unwrap_err();
        assert!(matches!(err, SessionError::NoFaceDetected));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_pipeline_unavailable_returns_to_idle() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);
        let err = session.detect(&OfflinePipeline, b"").unwrap_err();
        assert!(matches!(err, SessionError::PipelineUnavailable(_)));
        assert_eq!(session.state(), SessionState::Idle);

        // Recoverable: the next attempt is accepted.
        assert!(session.begin_detection().is_ok());
    }

    #[test]
    fn test_invalid_pipeline_output_returns_to_idle() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);

        session.begin_detection().unwrap();
        let bad = Descriptor::new(vec![0.5; 3]).unwrap_err();
        let err = session
            .complete_detection(Err(PipelineError::InvalidDescriptor(bad)))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidDescriptor(DescriptorError::WrongLength(3))
        ));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.identities().is_empty());
        assert!(session.records().is_empty());
        assert!(gateway.blob(KNOWN_FACES_KEY).is_none());
    }

    #[test]
    fn test_second_detect_rejected_while_in_flight() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);

        session.begin_detection().unwrap();
        assert!(matches!(
            session.begin_detection(),
            Err(SessionError::DetectionInFlight)
        ));
        assert_eq!(session.state(), SessionState::Detecting);

        let pipeline = FixedPipeline::new(vec![at(0.0)]);
        assert!(matches!(
            session.detect(&pipeline, b""),
            Err(SessionError::DetectionInFlight)
        ));
        assert_eq!(pipeline.calls.load(Ordering::SeqCst), 0);

        let outcome = session.complete_detection(Ok(vec![at(0.0)])).unwrap();
        assert!(matches!(outcome, DetectionOutcome::RegistrationRequired));
    }

    #[test]
    fn test_complete_without_begin_is_rejected() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);
        assert!(matches!(
            session.complete_detection(Ok(vec![at(0.0)])),
            Err(SessionError::NotDetecting)
        ));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_blank_name_is_a_no_op() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);
        session.detect(&FixedPipeline::new(vec![at(0.0)]), b"").unwrap();

        for blank in ["", "   ", "\t\n"] {
            assert!(matches!(
                session.submit_registration(blank).unwrap(),
                RegistrationOutcome::BlankName
            ));
            assert_eq!(session.state(), SessionState::AwaitingRegistration);
        }
        assert!(session.identities().is_empty());

        session.submit_registration("  Dee  ").unwrap();
        assert_eq!(session.identities()[0].name, "Dee");
        assert_eq!(session.records()[0].name, "Dee");
    }

    #[test]
    fn test_cancel_discards_pending_face() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);
        assert!(!session.cancel_registration());

        session.detect(&FixedPipeline::new(vec![at(0.0)]), b"").unwrap();
        assert!(session.cancel_registration());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(matches!(
            session.submit_registration("Eve"),
            Err(SessionError::NotAwaitingRegistration)
        ));
        assert!(session.identities().is_empty());
        assert!(session.records().is_empty());
    }

    #[test]
    fn test_detect_rejected_while_awaiting_registration() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);
        session.detect(&FixedPipeline::new(vec![at(0.0)]), b"").unwrap();

        assert!(matches!(
            session.begin_detection(),
            Err(SessionError::AwaitingRegistration)
        ));
        assert_eq!(session.state(), SessionState::AwaitingRegistration);
        session.submit_registration("Fay").unwrap();
        assert_eq!(session.identities().len(), 1);
    }

    #[test]
    fn test_state_survives_restart() {
        let gateway = Arc::new(MemoryGateway::new());
        {
            let mut session = open(&gateway);
            session.detect(&FixedPipeline::new(vec![at(0.0)]), b"").unwrap();
            session.submit_registration("Gus").unwrap();
            session.detect(&FixedPipeline::new(vec![at(5.0)]), b"").unwrap();
            session.submit_registration("Hal").unwrap();
            session.detect(&FixedPipeline::new(vec![at(0.2)]), b"").unwrap();
        }

        let session = open(&gateway);
        let names: Vec<&str> = session.identities().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Gus", "Hal"]);
        let records: Vec<String> = session.records().into_iter().map(|r| r.name).collect();
        assert_eq!(records, ["Gus", "Hal", "Gus"]);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_failed_save_keeps_memory_and_retries() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);
        gateway.set_fail_writes(true);

        session.detect(&FixedPipeline::new(vec![at(0.0)]), b"").unwrap();
        let RegistrationOutcome::Registered { save_failures, .. } =
            session.submit_registration("Ivy").unwrap()
        else {
            panic!("expected registration");
        };
        assert_eq!(save_failures.len(), 2);
        assert_eq!(session.identities().len(), 1);
        assert_eq!(session.records().len(), 1);
        assert!(gateway.blob(KNOWN_FACES_KEY).is_none());

        // The next mutation only touches the ledger but re-saves the registry too.
        gateway.set_fail_writes(false);
        let DetectionOutcome::Marked { save_failures, .. } = session
            .detect(&FixedPipeline::new(vec![at(0.0)]), b"")
            .unwrap()
        else {
            panic!("expected a match");
        };
        assert!(save_failures.is_empty());

        let reopened = open(&gateway);
        assert_eq!(reopened.identities().len(), 1);
        assert_eq!(reopened.records().len(), 2);
    }

    #[test]
    fn test_corrupt_state_fails_open() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.save(ATTENDANCE_RECORDS_KEY, b"not json").unwrap();
        assert!(matches!(
            Session::open(Arc::clone(&gateway), SessionConfig::default()),
            Err(SessionError::Load(_))
        ));
    }

    /// Registry where the probe `at(0.0)` qualifies against both entries
    /// but is closer to the second.
    fn seed_far_then_near(gateway: &MemoryGateway) {
        let mut registry = IdentityRegistry::new();
        registry.insert("far", at(0.5));
        registry.insert("near", at(0.05));
        gateway
            .save(KNOWN_FACES_KEY, &persistence::encode_identities(registry.all()).unwrap())
            .unwrap();
    }

    #[test]
    fn test_first_qualifying_policy_ignores_closer_entry() {
        let gateway = Arc::new(MemoryGateway::new());
        seed_far_then_near(&gateway);
        let mut session = open(&gateway);

        let DetectionOutcome::Marked { record, .. } =
            session.detect(&FixedPipeline::new(vec![at(0.0)]), b"").unwrap()
        else {
            panic!("expected a match");
        };
        assert_eq!(record.name, "far");
        assert!((record.confidence - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_nearest_policy_is_swappable() {
        let gateway = Arc::new(MemoryGateway::new());
        seed_far_then_near(&gateway);
        let config = SessionConfig {
            policy: MatchPolicy::Nearest,
            ..SessionConfig::default()
        };
        let mut session = Session::open(Arc::clone(&gateway), config).unwrap();

        let DetectionOutcome::Marked { record, .. } =
            session.detect(&FixedPipeline::new(vec![at(0.0)]), b"").unwrap()
        else {
            panic!("expected a match");
        };
        assert_eq!(record.name, "near");
    }

    #[test]
    fn test_snapshot_lists_newest_first() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open(&gateway);
        session.detect(&FixedPipeline::new(vec![at(0.0)]), b"").unwrap();
        session.submit_registration("Jo").unwrap();
        session.detect(&FixedPipeline::new(vec![at(3.0)]), b"").unwrap();
        session.submit_registration("Kim").unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, SessionState::Idle);
        assert_eq!(snapshot.identities.len(), 2);
        assert_eq!(snapshot.records[0].name, "Kim");
        assert_eq!(snapshot.records[1].name, "Jo");
    }
}

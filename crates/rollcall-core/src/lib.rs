//! rollcall-core: Face-descriptor matching and attendance bookkeeping.
//!
//! Matches a descriptor from an external embedding pipeline against a
//! registry of known faces, records attendance events, and keeps both
//! collections durable through an injected persistence gateway.

pub mod descriptor;
pub mod ledger;
pub mod matcher;
pub mod persistence;
pub mod pipeline;
pub mod registry;
pub mod session;

pub use descriptor::{Descriptor, DescriptorError, DESCRIPTOR_DIM};
pub use ledger::{AttendanceLedger, AttendanceRecord, ConfidenceBand};
pub use matcher::{
    Candidate, FirstQualifyingMatcher, MatchPolicy, MatchResult, Matcher, NearestMatcher,
    DEFAULT_MATCH_THRESHOLD,
};
pub use persistence::{MemoryGateway, PersistenceError, PersistenceGateway};
pub use pipeline::{DetectionPipeline, PipelineError};
pub use registry::{IdentityId, IdentityRegistry, KnownIdentity};
pub use session::{
    DetectionOutcome, IdentitySummary, RegistrationOutcome, Session, SessionConfig, SessionError,
    SessionSnapshot, SessionState,
};

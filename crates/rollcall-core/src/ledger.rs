//! Append-only attendance log.
//!
//! Records are stored in append order (which is also the durable order) and
//! presented newest-first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confidence above which a record is shown as a strong match.
pub const HIGH_CONFIDENCE: f32 = 80.0;

/// One attendance event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    /// Match confidence in [0, 100].
    pub confidence: f32,
}

/// Coarse confidence bucket for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Low,
}

impl AttendanceRecord {
    /// Build a record, clamping `confidence` into [0, 100].
    pub fn new(name: impl Into<String>, timestamp: DateTime<Utc>, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 100.0)
        };
        Self {
            name: name.into(),
            timestamp,
            confidence,
        }
    }

    /// e.g. `"70% match"`.
    pub fn confidence_label(&self) -> String {
        format!("{}% match", self.confidence.round() as u32)
    }

    pub fn band(&self) -> ConfidenceBand {
        if self.confidence > HIGH_CONFIDENCE {
            ConfidenceBand::High
        } else {
            ConfidenceBand::Low
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceLedger {
    records: Vec<AttendanceRecord>,
}

impl AttendanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from records in append order (oldest first).
    pub fn from_records(records: Vec<AttendanceRecord>) -> Self {
        Self { records }
    }

    /// Unconditionally append. Repeated detections of the same person
    /// produce repeated records.
    pub fn append(&mut self, record: AttendanceRecord) {
        self.records.push(record);
        tracing::debug!(total = self.records.len(), "attendance ledger updated");
    }

    /// Snapshot, newest first.
    pub fn all(&self) -> Vec<AttendanceRecord> {
        self.records.iter().rev().cloned().collect()
    }

    /// Records in append order, as persisted.
    pub fn in_append_order(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&AttendanceRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

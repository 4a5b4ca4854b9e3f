//! Probe-vs-registry matching under a Euclidean distance threshold.

use crate::descriptor::Descriptor;
use crate::registry::{IdentityId, KnownIdentity};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default distance threshold for a positive match.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.6;

/// Convert a match distance into a confidence score in [0, 100].
///
/// The raw score is `(1 - distance) * 100`, which goes negative for
/// distances above 1; it is clamped rather than reported verbatim.
pub fn confidence_from_distance(distance: f32) -> f32 {
    ((1.0 - distance) * 100.0).clamp(0.0, 100.0)
}

/// The registry entry a probe was matched to.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Position of the entry in registry scan order.
    pub index: usize,
    pub id: IdentityId,
    pub name: String,
    pub distance: f32,
}

impl Candidate {
    fn from_entry(index: usize, entry: &KnownIdentity, distance: f32) -> Self {
        Self {
            index,
            id: entry.id,
            name: entry.name.clone(),
            distance,
        }
    }

    pub fn confidence(&self) -> f32 {
        confidence_from_distance(self.distance)
    }
}

/// Result of matching a probe descriptor against the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Matched(Candidate),
    NoMatch,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched(_))
    }
}

/// Strategy for comparing a probe against the registry.
///
/// Implementations must only report entries whose distance is strictly
/// below `threshold`; a non-positive threshold therefore never matches.
pub trait Matcher: Send + Sync {
    fn find(&self, probe: &Descriptor, gallery: &[KnownIdentity], threshold: f32) -> MatchResult;
}

/// Scans in registry order and returns the first entry under threshold,
/// even if a later entry is closer.
pub struct FirstQualifyingMatcher;

impl Matcher for FirstQualifyingMatcher {
    fn find(&self, probe: &Descriptor, gallery: &[KnownIdentity], threshold: f32) -> MatchResult {
        gallery
            .iter()
            .enumerate()
            .find_map(|(i, entry)| {
                let distance = probe.distance(&entry.descriptor);
                (distance < threshold).then(|| Candidate::from_entry(i, entry, distance))
            })
            .map_or(MatchResult::NoMatch, MatchResult::Matched)
    }
}

/// Compares against every entry and returns the closest one under threshold.
/// Ties go to the earlier entry.
pub struct NearestMatcher;

impl Matcher for NearestMatcher {
    fn find(&self, probe: &Descriptor, gallery: &[KnownIdentity], threshold: f32) -> MatchResult {
        let mut best: Option<(usize, f32)> = None;

        for (i, entry) in gallery.iter().enumerate() {
            let distance = probe.distance(&entry.descriptor);
            let closer = best.map_or(true, |(_, best_distance)| distance < best_distance);
            if closer {
                best = Some((i, distance));
            }
        }

        match best {
            Some((i, distance)) if distance < threshold => {
                MatchResult::Matched(Candidate::from_entry(i, &gallery[i], distance))
            }
            _ => MatchResult::NoMatch,
        }
    }
}

/// Which matcher the session uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    #[default]
    FirstQualifying,
    Nearest,
}

impl MatchPolicy {
    pub fn matcher(self) -> Box<dyn Matcher> {
        match self {
            MatchPolicy::FirstQualifying => Box::new(FirstQualifyingMatcher),
            MatchPolicy::Nearest => Box::new(NearestMatcher),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchPolicy::FirstQualifying => "first",
            MatchPolicy::Nearest => "nearest",
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first_qualifying" => Ok(MatchPolicy::FirstQualifying),
            "nearest" => Ok(MatchPolicy::Nearest),
            other => Err(format!("unknown match policy: {other}")),
        }
    }
}

use crate::gallery::domain::gallery_index::NearestMatch;

pub const DEFAULT_ABSOLUTE_THRESHOLD: f64 = 0.20;
pub const DEFAULT_RELATIVE_GAP: f64 = 0.05;

/// Outcome of recognizing one face crop. Distances are reported as-is
/// (lower is better); callers display them rather than converting to a
/// similarity percentage.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Match { identity: String, distance: f64 },
    Unknown { distance: f64 },
}

impl Verdict {
    pub fn distance(&self) -> f64 {
        match self {
            Verdict::Match { distance, .. } | Verdict::Unknown { distance } => *distance,
        }
    }

    pub fn identity(&self) -> Option<&str> {
        match self {
            Verdict::Match { identity, .. } => Some(identity),
            Verdict::Unknown { .. } => None,
        }
    }
}

/// Two-stage accept/reject rule over nearest-neighbor distances.
///
/// An absolute threshold alone lets two visually similar enrolled
/// identities cross-contaminate matches; the gap check adds a
/// discriminability requirement on top of proximity.
#[derive(Clone, Copy, Debug)]
pub struct DecisionPolicy {
    pub absolute_threshold: f64,
    pub relative_gap: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            absolute_threshold: DEFAULT_ABSOLUTE_THRESHOLD,
            relative_gap: DEFAULT_RELATIVE_GAP,
        }
    }
}

impl DecisionPolicy {
    /// Converts a nearest-neighbor outcome into a verdict.
    ///
    /// Rejects when the best distance exceeds the absolute threshold, or
    /// when a runner-up identity sits closer than the required gap
    /// (ambiguity rejection). An absent match (empty gallery) maps to
    /// `Unknown` at maximum useful distance.
    pub fn decide(&self, nearest: Option<&NearestMatch>) -> Verdict {
        let Some(m) = nearest else {
            return Verdict::Unknown { distance: 1.0 };
        };

        if m.distance > self.absolute_threshold {
            log::debug!(
                "reject '{}': distance {:.4} > threshold {:.2}",
                m.identity,
                m.distance,
                self.absolute_threshold
            );
            return Verdict::Unknown {
                distance: m.distance,
            };
        }

        if let Some(runner_up) = m.runner_up {
            let gap = runner_up - m.distance;
            if gap < self.relative_gap {
                log::debug!(
                    "reject '{}': gap {:.4} < required {:.2} (ambiguous)",
                    m.identity,
                    gap,
                    self.relative_gap
                );
                return Verdict::Unknown {
                    distance: m.distance,
                };
            }
        }

        Verdict::Match {
            identity: m.identity.clone(),
            distance: m.distance,
        }
    }
}

//! Single-subject motion tracking inside the batting zone.
//!
//! [`MotionTracker`] remembers the centre of the last person it saw inside
//! the zone and reports how far that centre moved *vertically* at the next
//! in-zone sighting. Horizontal movement is ignored: a bat swing shows up as
//! the batter's centre dipping and rising, while walking between creases is
//! lateral.

use crate::{
    detection::{Detection, Point},
    zone::BattingZone,
};

/// How the tracker treats a remembered centre after frames with no sighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalenessPolicy {
    /// Keep the last centre indefinitely. A sighting after a long gap is
    /// compared against the old position.
    #[default]
    CarryForward,
    /// Only compare against a centre seen at most `max_age` seconds ago.
    /// Older centres count as "no baseline" and are replaced.
    AdjacentOnly {
        /// Maximum age in seconds of a usable previous centre.
        max_age: u64,
    },
}

/// Outcome of feeding one frame's detections to the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// No candidate was inside the zone; tracker state is unchanged.
    NoObservation,
    /// A candidate was inside the zone but there was no usable previous
    /// centre to measure against.
    FirstObservation {
        /// Centre that is now remembered.
        center: Point,
    },
    /// A candidate was inside the zone and a displacement was measured.
    Moved {
        /// Centre that is now remembered.
        center: Point,
        /// `|center.y - previous.y|` in pixels.
        displacement: f64,
    },
}

impl Observation {
    /// The measured displacement, if any.
    pub fn displacement(&self) -> Option<f64> {
        match self {
            Observation::Moved { displacement, .. } => Some(*displacement),
            _ => None,
        }
    }
}

/// Tracks the first in-zone person across sampled frames.
#[derive(Debug, Clone)]
pub struct MotionTracker<'z> {
    zone: &'z BattingZone,
    policy: StalenessPolicy,
    previous: Option<(Point, u64)>,
}

impl<'z> MotionTracker<'z> {
    /// Create a tracker for `zone` with no remembered centre.
    pub fn new(zone: &'z BattingZone, policy: StalenessPolicy) -> Self {
        Self {
            zone,
            policy,
            previous: None,
        }
    }

    /// The remembered centre, if any.
    pub fn previous_center(&self) -> Option<Point> {
        self.previous.map(|(center, _)| center)
    }

    /// Feed the candidate detections of the frame sampled at `timestamp`.
    ///
    /// Candidates are scanned in the given order and the **first** one whose
    /// centre lies in the zone is taken; the rest are ignored. Callers pass
    /// person-class detections only.
    pub fn observe<'d, I>(&mut self, timestamp: u64, candidates: I) -> Observation
    where
        I: IntoIterator<Item = &'d Detection>,
    {
        let Some(center) = candidates
            .into_iter()
            .map(Detection::center)
            .find(|center| self.zone.contains(center.x, center.y))
        else {
            return Observation::NoObservation;
        };

        let baseline = self.previous.and_then(|(previous, seen_at)| match self.policy {
            StalenessPolicy::CarryForward => Some(previous),
            StalenessPolicy::AdjacentOnly { max_age } => {
                (timestamp.saturating_sub(seen_at) <= max_age).then_some(previous)
            }
        });

        self.previous = Some((center, timestamp));

        match baseline {
            Some(previous) => Observation::Moved {
                center,
                displacement: (center.y - previous.y).abs(),
            },
            None => Observation::FirstObservation { center },
        }
    }
}

//! Object detections and the detection-provider seam.
//!
//! The object-detection model is an external collaborator. The pipeline only
//! depends on [`DetectionProvider`], which turns a [`SampledFrame`] into an
//! ordered list of [`Detection`]s. Order is significant: the tracker takes
//! the *first* in-zone person, not the most confident one.
//!
//! [`DetectionTrack`] is a provider backed by pre-computed detections stored
//! as JSON, for running the pipeline against the output of any external
//! detector.

use std::{collections::BTreeMap, fs, path::Path};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::ShotError;

/// Class label the tracker follows.
pub const PERSON_LABEL: &str = "person";

/// Bounding box corners `(xA, yA)`–`(xB, yB)` in source-frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x_a: f64,
    /// Top edge.
    pub y_a: f64,
    /// Right edge.
    pub x_b: f64,
    /// Bottom edge.
    pub y_b: f64,
}

impl BoundingBox {
    /// Create a box from two corners.
    pub fn new(x_a: f64, y_a: f64, x_b: f64, y_b: f64) -> Self {
        Self { x_a, y_a, x_b, y_b }
    }

    /// Centre point `((xA + xB) / 2, (yA + yB) / 2)`.
    pub fn center(&self) -> Point {
        Point {
            x: (self.x_a + self.x_b) / 2.0,
            y: (self.y_a + self.y_b) / 2.0,
        }
    }
}

/// A point in source-frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate (grows downward).
    pub y: f64,
}

/// One object reported by the detection provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class name, e.g. `"person"`.
    pub label: String,
    /// Bounding box, serialized as `[xA, yA, xB, yB]`.
    #[serde(with = "box_as_array")]
    pub bbox: BoundingBox,
    /// Model confidence in `[0, 1]`.
    pub confidence: f32,
}

impl Detection {
    /// Create a detection.
    pub fn new(label: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            label: label.into(),
            bbox,
            confidence,
        }
    }

    /// Shorthand for a `"person"` detection.
    pub fn person(bbox: BoundingBox, confidence: f32) -> Self {
        Self::new(PERSON_LABEL, bbox, confidence)
    }

    /// Centre of the bounding box.
    pub fn center(&self) -> Point {
        self.bbox.center()
    }

    /// Whether this detection belongs to the tracked class.
    pub fn is_person(&self) -> bool {
        self.label == PERSON_LABEL
    }
}

mod box_as_array {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::BoundingBox;

    pub fn serialize<S: Serializer>(bbox: &BoundingBox, serializer: S) -> Result<S::Ok, S::Error> {
        [bbox.x_a, bbox.y_a, bbox.x_b, bbox.y_b].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BoundingBox, D::Error> {
        let [x_a, y_a, x_b, y_b] = <[f64; 4]>::deserialize(deserializer)?;
        Ok(BoundingBox { x_a, y_a, x_b, y_b })
    }
}

/// A decoded frame handed to the detection provider.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// Whole second the frame was sampled at.
    pub timestamp: u64,
    /// Decoded RGB frame.
    pub image: DynamicImage,
}

/// Black-box object detector.
///
/// Implementations return detections in their native order; the pipeline
/// treats that order as significant.
pub trait DetectionProvider {
    /// Detect objects in one frame.
    ///
    /// # Errors
    ///
    /// Any error aborts the run. Implementations typically return
    /// [`ShotError::Detection`].
    fn detect(&mut self, frame: &SampledFrame) -> Result<Vec<Detection>, ShotError>;
}

impl<F> DetectionProvider for F
where
    F: FnMut(&SampledFrame) -> Result<Vec<Detection>, ShotError>,
{
    fn detect(&mut self, frame: &SampledFrame) -> Result<Vec<Detection>, ShotError> {
        self(frame)
    }
}

/// On-disk entry: every detection reported for one sampled second.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrackEntry {
    timestamp: u64,
    detections: Vec<Detection>,
}

/// Detections pre-computed by an external model, keyed by whole second.
///
/// The JSON layout is a list of `{ "timestamp": <secs>, "detections": [...] }`
/// entries, where each detection is
/// `{ "label": "person", "bbox": [xA, yA, xB, yB], "confidence": 0.91 }`.
/// Seconds with no entry yield no detections.
///
/// # Example
///
/// ```no_run
/// use shotreel::{DetectionTrack, ShotError};
///
/// let track = DetectionTrack::load("detections.json")?;
/// println!("{} sampled seconds with detections", track.len());
/// # Ok::<(), ShotError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DetectionTrack {
    frames: BTreeMap<u64, Vec<Detection>>,
}

impl DetectionTrack {
    /// Create an empty track.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a track from a JSON file.
    ///
    /// Repeated timestamps are concatenated in file order.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ShotError> {
        let path = path.as_ref();
        log::debug!("Loading detection track from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a track from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ShotError> {
        let entries: Vec<TrackEntry> = serde_json::from_str(json)?;
        let mut track = Self::new();
        for entry in entries {
            track
                .frames
                .entry(entry.timestamp)
                .or_default()
                .extend(entry.detections);
        }
        Ok(track)
    }

    /// Append detections for a second.
    pub fn insert(&mut self, timestamp: u64, detections: Vec<Detection>) {
        self.frames.entry(timestamp).or_default().extend(detections);
    }

    /// Number of seconds that carry at least one entry.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if the track holds no entries.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Serialize back to the on-disk JSON layout.
    pub fn to_json(&self) -> Result<String, ShotError> {
        let entries: Vec<TrackEntry> = self
            .frames
            .iter()
            .map(|(&timestamp, detections)| TrackEntry {
                timestamp,
                detections: detections.clone(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }
}

impl DetectionProvider for DetectionTrack {
    fn detect(&mut self, frame: &SampledFrame) -> Result<Vec<Detection>, ShotError> {
        Ok(self.frames.get(&frame.timestamp).cloned().unwrap_or_default())
    }
}

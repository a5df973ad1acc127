//! The batting zone: a fixed rectangle in source-frame pixel space.
//!
//! Only subjects whose bounding-box centre falls inside the zone are
//! tracked. The zone is persisted as a small JSON record
//! (`{"x1": .., "y1": .., "x2": .., "y2": ..}`) written by whatever tool the
//! user draws it with, and loaded once before a run.
//!
//! # Example
//!
//! ```no_run
//! use shotreel::{BattingZone, ShotError};
//!
//! let zone = BattingZone::load("batting_zone.json")?;
//! assert!(zone.contains(zone.x1() as f64, zone.y1() as f64));
//! # Ok::<(), ShotError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs,
    io::ErrorKind,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::error::ShotError;

/// Default file name of the persisted zone record.
pub const DEFAULT_ZONE_FILE: &str = "batting_zone.json";

/// Axis-aligned rectangle, inclusive on all four edges.
///
/// Constructed through [`BattingZone::new`] (or [`load`](BattingZone::load)),
/// which rejects inverted corners, so every value of this type satisfies
/// `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ZoneRecord")]
pub struct BattingZone {
    x1: i64,
    y1: i64,
    x2: i64,
    y2: i64,
}

/// Unvalidated on-disk shape of a zone.
#[derive(Deserialize)]
struct ZoneRecord {
    x1: i64,
    y1: i64,
    x2: i64,
    y2: i64,
}

impl TryFrom<ZoneRecord> for BattingZone {
    type Error = ShotError;

    fn try_from(record: ZoneRecord) -> Result<Self, Self::Error> {
        BattingZone::new(record.x1, record.y1, record.x2, record.y2)
    }
}

impl BattingZone {
    /// Create a zone from its top-left and bottom-right corners.
    ///
    /// # Errors
    ///
    /// Returns [`ShotError::InvalidZone`] if `x1 > x2` or `y1 > y2`.
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Result<Self, ShotError> {
        if x1 > x2 || y1 > y2 {
            return Err(ShotError::InvalidZone { x1, y1, x2, y2 });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Map a rectangle drawn on a downscaled preview back to source pixels.
    ///
    /// `scale` is `preview_width / source_width`. Coordinates are truncated
    /// toward zero after unscaling.
    ///
    /// # Errors
    ///
    /// Returns [`ShotError::InvalidConfig`] if `scale` is not positive, or
    /// [`ShotError::InvalidZone`] if the selection has negative extent.
    pub fn from_selection(
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        scale: f64,
    ) -> Result<Self, ShotError> {
        if !(scale > 0.0) {
            return Err(ShotError::InvalidConfig(format!(
                "preview scale must be positive, got {scale}"
            )));
        }
        Self::new(
            (x / scale) as i64,
            (y / scale) as i64,
            ((x + width) / scale) as i64,
            ((y + height) / scale) as i64,
        )
    }

    /// Load a zone record from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`ShotError::ZoneNotFound`] if the file does not exist.
    /// - [`ShotError::JsonError`] if it is not a zone record.
    /// - [`ShotError::InvalidZone`] if the corners are inverted.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ShotError> {
        let path = path.as_ref();
        log::debug!("Loading batting zone from {}", path.display());

        let contents = fs::read_to_string(path).map_err(|error| match error.kind() {
            ErrorKind::NotFound => ShotError::ZoneNotFound {
                path: path.to_path_buf(),
            },
            _ => ShotError::IoError(error),
        })?;

        // Parse the raw record first so bad corners surface as InvalidZone.
        let record: ZoneRecord = serde_json::from_str(&contents)?;
        BattingZone::try_from(record)
    }

    /// Write the zone record as JSON, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ShotError> {
        let path = path.as_ref();
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        log::info!("Batting zone saved to {}: {self}", path.display());
        Ok(())
    }

    /// Inclusive membership test: `x1 <= cx <= x2 && y1 <= cy <= y2`.
    pub fn contains(&self, cx: f64, cy: f64) -> bool {
        self.x1 as f64 <= cx && cx <= self.x2 as f64 && self.y1 as f64 <= cy && cy <= self.y2 as f64
    }

    /// Left edge.
    pub fn x1(&self) -> i64 {
        self.x1
    }

    /// Top edge.
    pub fn y1(&self) -> i64 {
        self.y1
    }

    /// Right edge.
    pub fn x2(&self) -> i64 {
        self.x2
    }

    /// Bottom edge.
    pub fn y2(&self) -> i64 {
        self.y2
    }

    /// Width in pixels (`x2 - x1`).
    pub fn width(&self) -> i64 {
        self.x2 - self.x1
    }

    /// Height in pixels (`y2 - y1`).
    pub fn height(&self) -> i64 {
        self.y2 - self.y1
    }
}

impl Display for BattingZone {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "({}, {})-({}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

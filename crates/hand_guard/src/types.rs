use geo_types::{Coord, LineString, Polygon};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{GuardError, Result};

/// Maximum hue value on the 0-179 scale used by [`Hsv`]
pub const HUE_MAX: u8 = 179;

/// A color in hue-saturation-value space.
///
/// Hue uses the half-degree scale (0-179) so a full circle fits in a byte;
/// saturation and value span 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// Inclusive HSV bounds describing the foreground color.
///
/// When `lower.h > upper.h` the hue interval wraps through 0, so
/// `lower.h = 170, upper.h = 10` accepts 170..=179 and 0..=10.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColorRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl Default for ColorRange {
    /// Generic skin tone range that holds up under most indoor lighting
    fn default() -> Self {
        Self {
            lower: Hsv::new(0, 30, 60),
            upper: Hsv::new(25, 255, 255),
        }
    }
}

impl ColorRange {
    pub fn new(lower: Hsv, upper: Hsv) -> Result<Self> {
        let range = Self { lower, upper };
        range.validate()?;
        Ok(range)
    }

    /// Whether the hue interval straddles the hue origin
    pub fn wraps_hue(&self) -> bool {
        self.lower.h > self.upper.h
    }

    pub fn contains(&self, color: Hsv) -> bool {
        let hue_ok = if self.wraps_hue() {
            color.h >= self.lower.h || color.h <= self.upper.h
        } else {
            color.h >= self.lower.h && color.h <= self.upper.h
        };

        hue_ok
            && color.s >= self.lower.s
            && color.s <= self.upper.s
            && color.v >= self.lower.v
            && color.v <= self.upper.v
    }

    pub fn validate(&self) -> Result<()> {
        if self.lower.h > HUE_MAX || self.upper.h > HUE_MAX {
            return Err(GuardError::invalid_config(format!(
                "hue bounds must be within 0..={HUE_MAX}, got {}..{}",
                self.lower.h, self.upper.h
            )));
        }
        if self.lower.s > self.upper.s {
            return Err(GuardError::invalid_config(format!(
                "saturation range is inverted: {} > {}",
                self.lower.s, self.upper.s
            )));
        }
        if self.lower.v > self.upper.v {
            return Err(GuardError::invalid_config(format!(
                "value range is inverted: {} > {}",
                self.lower.v, self.upper.v
            )));
        }
        Ok(())
    }
}

/// One connected foreground region of the refined mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    /// Outer boundary, in tracing order
    pub boundary: Vec<[f32; 2]>,
    /// Number of foreground pixels in the region
    pub area: u32,
    /// Mean position of the region's pixels
    pub centroid: [f32; 2],
}

impl Blob {
    pub fn distance_to(&self, point: [f32; 2]) -> f32 {
        let dx = self.centroid[0] - point[0];
        let dy = self.centroid[1] - point[1];
        (dx * dx + dy * dy).sqrt()
    }
}

/// Convex outline of the candidate hand, counter-clockwise and not closed.
///
/// Holds one or two points when the blob boundary was degenerate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hull {
    pub points: Vec<[f32; 2]>,
}

impl Hull {
    pub fn new(points: Vec<[f32; 2]>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A point or a segment rather than a polygon
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3
    }

    /// Convert to geo-types Polygon for geometric operations
    pub fn to_geo_polygon(&self) -> Polygon<f32> {
        Polygon::new(to_line_string(&self.points), vec![])
    }

    /// Shift every vertex by the given offset
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            points: self.points.iter().map(|&[x, y]| [x + dx, y + dy]).collect(),
        }
    }

    pub fn area(&self) -> f32 {
        use geo::Area;
        if self.is_degenerate() {
            return 0.0;
        }
        self.to_geo_polygon().unsigned_area()
    }
}

/// The static region the hand must stay away from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HazardZone {
    /// Axis-aligned rectangle with its top-left corner at (x, y)
    Rectangle {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// Simple polygon given by its vertices (closing vertex optional)
    Polygon { points: Vec<[f32; 2]> },
}

impl HazardZone {
    pub fn rectangle(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::Rectangle {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two opposite corners
    pub fn from_corners(a: [f32; 2], b: [f32; 2]) -> Self {
        Self::rectangle(
            a[0].min(b[0]),
            a[1].min(b[1]),
            (a[0] - b[0]).abs(),
            (a[1] - b[1]).abs(),
        )
    }

    /// Default 200x200 zone on the right-hand side of a frame,
    /// shrunk where the frame is too small to hold it.
    pub fn default_for_frame(width: u32, height: u32) -> Self {
        let x = (width as u64 * 65 / 100) as u32;
        let y = height / 4;
        Self::rectangle(
            x as f32,
            y as f32,
            200.min(width - x) as f32,
            200.min(height - y) as f32,
        )
    }

    /// Vertices in order, without a closing duplicate
    pub fn vertices(&self) -> Vec<[f32; 2]> {
        match self {
            Self::Rectangle {
                x,
                y,
                width,
                height,
            } => vec![
                [*x, *y],
                [x + width, *y],
                [x + width, y + height],
                [*x, y + height],
            ],
            Self::Polygon { points } => {
                let mut points = points.clone();
                if points.len() > 1 && points.first() == points.last() {
                    points.pop();
                }
                points
            }
        }
    }

    pub fn to_geo_polygon(&self) -> Polygon<f32> {
        Polygon::new(to_line_string(&self.vertices()), vec![])
    }

    pub fn area(&self) -> f32 {
        use geo::Area;
        self.to_geo_polygon().unsigned_area()
    }

    pub fn validate(&self) -> Result<()> {
        let vertices = self.vertices();
        if vertices.len() < 3 {
            return Err(GuardError::invalid_config(format!(
                "hazard zone needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if vertices
            .iter()
            .any(|&[x, y]| !x.is_finite() || !y.is_finite())
        {
            return Err(GuardError::invalid_config(
                "hazard zone has non-finite coordinates",
            ));
        }
        let area = self.area();
        if !(area > 0.0) {
            return Err(GuardError::invalid_config(format!(
                "hazard zone must have non-zero area, got {area}"
            )));
        }
        Ok(())
    }
}

/// Ordered alert severity
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum AlertLevel {
    #[default]
    Safe,
    Warning,
    Danger,
}

/// Distance between hull and zone, with the pair of points realising it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Proximity {
    pub distance: f32,
    /// Closest point on the hand
    pub hand_point: [f32; 2],
    /// Closest point on the hazard zone
    pub zone_point: [f32; 2],
}

impl Proximity {
    pub fn is_contact(&self) -> bool {
        self.distance <= 0.0
    }
}

/// What happened to a frame before it reached the alert state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FrameStatus {
    /// A hand candidate was found and measured
    Detected,
    /// The frame was processed but no blob passed the area threshold
    NoHand,
    /// The frame could not be processed (malformed or not delivered)
    Skipped,
}

/// Per-frame record handed to rendering and logging sinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub sequence: u64,
    pub status: FrameStatus,
    pub hull: Option<Hull>,
    pub distance: Option<f32>,
    pub hand_point: Option<[f32; 2]>,
    pub zone_point: Option<[f32; 2]>,
    pub level: AlertLevel,
    pub transitioned: bool,
}

impl FrameResult {
    pub fn hand_detected(&self) -> bool {
        self.status == FrameStatus::Detected
    }
}

pub(crate) fn to_line_string(points: &[[f32; 2]]) -> LineString<f32> {
    let coords: Vec<Coord<f32>> = points.iter().map(|&[x, y]| Coord { x, y }).collect();
    LineString::new(coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_range_plain_interval() {
        let range = ColorRange::default();
        assert!(range.contains(Hsv::new(10, 120, 200)));
        assert!(!range.contains(Hsv::new(40, 120, 200)));
        assert!(!range.contains(Hsv::new(10, 10, 200)));
        assert!(!range.contains(Hsv::new(10, 120, 20)));
    }

    #[test]
    fn test_color_range_hue_wrap() {
        let range = ColorRange::new(Hsv::new(170, 50, 50), Hsv::new(10, 255, 255))
            .expect("wrapping hue is valid");
        assert!(range.wraps_hue());
        assert!(range.contains(Hsv::new(175, 100, 100)));
        assert!(range.contains(Hsv::new(0, 100, 100)));
        assert!(range.contains(Hsv::new(10, 100, 100)));
        assert!(!range.contains(Hsv::new(90, 100, 100)));
    }

    #[test]
    fn test_color_range_rejects_inverted_saturation() {
        let result = ColorRange::new(Hsv::new(0, 200, 0), Hsv::new(20, 100, 255));
        assert!(matches!(result, Err(GuardError::InvalidConfig(_))));
    }

    #[test]
    fn test_color_range_rejects_hue_out_of_scale() {
        let result = ColorRange::new(Hsv::new(0, 0, 0), Hsv::new(200, 255, 255));
        assert!(result.is_err());
    }

    #[test]
    fn test_zone_validation() {
        assert!(HazardZone::rectangle(400.0, 200.0, 100.0, 100.0).validate().is_ok());
        assert!(HazardZone::rectangle(400.0, 200.0, 0.0, 100.0).validate().is_err());
        assert!(HazardZone::Polygon {
            points: vec![[0.0, 0.0], [10.0, 10.0], [20.0, 20.0]]
        }
        .validate()
        .is_err());
        assert!(HazardZone::Polygon {
            points: vec![[0.0, 0.0], [10.0, 0.0]]
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_zone_from_corners() {
        let zone = HazardZone::from_corners([500.0, 300.0], [400.0, 200.0]);
        assert_eq!(zone, HazardZone::rectangle(400.0, 200.0, 100.0, 100.0));
        assert_eq!(zone.area(), 10_000.0);
    }

    #[test]
    fn test_default_zone_fits_frame() {
        let zone = HazardZone::default_for_frame(640, 480);
        assert_eq!(zone, HazardZone::rectangle(416.0, 120.0, 200.0, 200.0));

        let small = HazardZone::default_for_frame(100, 100);
        assert_eq!(small, HazardZone::rectangle(65.0, 25.0, 35.0, 75.0));
    }

    #[test]
    fn test_default_zone_for_huge_frame() {
        let zone = HazardZone::default_for_frame(u32::MAX, u32::MAX);
        match zone {
            HazardZone::Rectangle { x, width, height, .. } => {
                assert!(x > 0.0 && x < u32::MAX as f32);
                assert_eq!((width, height), (200.0, 200.0));
            }
            other => panic!("expected rectangle, got {other:?}"),
        }
    }

    #[test]
    fn test_polygon_zone_drops_closing_vertex() {
        let zone = HazardZone::Polygon {
            points: vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 0.0]],
        };
        assert_eq!(zone.vertices().len(), 3);
        assert!(zone.validate().is_ok());
    }

    #[test]
    fn test_alert_level_names() {
        assert_eq!(AlertLevel::Danger.to_string(), "DANGER");
        assert_eq!("warning".parse::<AlertLevel>().unwrap(), AlertLevel::Warning);
        assert_eq!(serde_json::to_string(&AlertLevel::Safe).unwrap(), "\"SAFE\"");
        assert!(AlertLevel::Danger > AlertLevel::Warning);
    }
}

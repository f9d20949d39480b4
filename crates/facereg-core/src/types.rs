use serde::{Deserialize, Serialize};
use std::fmt;

/// Share of the viewport width covered by the target region.
const TARGET_WIDTH_RATIO: f32 = 0.4;
/// Share of the viewport height covered by the target region.
const TARGET_HEIGHT_RATIO: f32 = 0.3;

/// Axis-aligned rectangle in frame coordinates (e.g. screen pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The four scalar attributes in matcher order: x, y, width, height.
    pub fn attributes(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

/// Opaque identifier the detector keeps stable for one physical face across frames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceId(String);

impl FaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FaceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A detected face: identifier plus bounding region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub face_id: FaceId,
    pub bounds: Rect,
}

impl Face {
    pub fn new(face_id: impl Into<String>, bounds: Rect) -> Self {
        Self {
            face_id: FaceId::new(face_id),
            bounds,
        }
    }
}

/// Detector output for a single camera frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub faces: Vec<Face>,
}

impl DetectionResult {
    /// A frame with no faces.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A frame with exactly one face.
    pub fn single(face: Face) -> Self {
        Self { faces: vec![face] }
    }

    /// The only face the session evaluates. Additional faces in the same
    /// frame are ignored.
    pub fn primary(&self) -> Option<&Face> {
        self.faces.first()
    }
}

/// The fixed rectangle a user aligns their face with.
///
/// Computed once per session; there are no setters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetRegion(Rect);

impl TargetRegion {
    pub const fn new(rect: Rect) -> Self {
        Self(rect)
    }

    /// Region covering 40% of the viewport width and 30% of its height,
    /// centered in the viewport.
    pub fn centered(viewport_width: f32, viewport_height: f32) -> Self {
        let width = viewport_width * TARGET_WIDTH_RATIO;
        let height = viewport_height * TARGET_HEIGHT_RATIO;
        Self(Rect {
            x: (viewport_width - width) / 2.0,
            y: (viewport_height - height) / 2.0,
            width,
            height,
        })
    }

    pub fn rect(&self) -> &Rect {
        &self.0
    }
}

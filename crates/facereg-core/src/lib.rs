//! facereg-core — Face registration decision engine.
//!
//! Decides whether a detected face is aligned with a fixed target region,
//! looks the face up in a registry of named faces, and drives the
//! registration session (idle → scanning → awaiting name → matched).
//! Camera capture and rendering live outside this crate.

pub mod geometry;
pub mod registry;
pub mod session;
pub mod types;

pub use geometry::{matches, GeometryError, DEFAULT_TOLERANCE};
pub use registry::{FaceRegistry, InMemoryRegistry, Registration, RegistryError};
pub use session::{Effect, Event, Session, SessionError, SessionState, Transition};
pub use types::{DetectionResult, Face, FaceId, Rect, TargetRegion};

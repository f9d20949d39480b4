//! Registration session state machine.
//!
//! Frames and user commands arrive as [`Event`]s. [`transition`] is a pure
//! function from the current state and one event to the next state plus the
//! side effects the UI layer should perform. [`Session`] owns the state and
//! the registry and applies transitions one at a time.

use crate::geometry;
use crate::registry::{FaceRegistry, RegistryError};
use crate::types::{DetectionResult, Face, FaceId, Rect, TargetRegion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MISALIGNED_MESSAGE: &str = "Face detected but not accurately inside the capture box";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Please enter a name for the face.")]
    EmptyName,
    #[error("{event} is not accepted while {state}")]
    UnexpectedEvent {
        event: &'static str,
        state: &'static str,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Scanning inactive.
    Idle,
    /// Evaluating incoming frames against the target region.
    Scanning,
    /// An aligned, unregistered face is waiting for the user to name it.
    AwaitingName { pending_face: Face },
    /// An aligned face was found in the registry.
    Matched { name: String },
    /// Scanning stopped because the target region is unusable.
    Rejected { reason: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::AwaitingName { .. } => "awaiting_name",
            Self::Matched { .. } => "matched",
            Self::Rejected { .. } => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// The user pressed "Register": reset and start scanning.
    StartScan,
    /// One camera frame's detection result.
    DetectionTick(DetectionResult),
    /// The user confirmed a name in the dialog.
    SubmitName { text: String },
    /// The user dismissed the dialog.
    Cancel,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartScan => "start_scan",
            Self::DetectionTick(_) => "detection_tick",
            Self::SubmitName { .. } => "submit_name",
            Self::Cancel => "cancel",
        }
    }
}

/// Side-effect intent for the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", content = "value", rename_all = "snake_case")]
pub enum Effect {
    ClearBox,
    DrawBox(Rect),
    ShowInfo(String),
    ShowError(String),
    StopScanning,
    OpenNameDialog,
    CloseNameDialog,
}

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: SessionState,
    pub effects: Vec<Effect>,
    /// Registry write to apply before `next` becomes current.
    pub registration: Option<(FaceId, String)>,
}

impl Transition {
    fn to(next: SessionState, effects: Vec<Effect>) -> Self {
        Self {
            next,
            effects,
            registration: None,
        }
    }
}

/// Compute the next state and effects for `event` without mutating anything.
///
/// Errors are recoverable: the caller keeps `state` as it was.
pub fn transition(
    state: &SessionState,
    event: Event,
    target: &TargetRegion,
    tolerance: f32,
    registry: &dyn FaceRegistry,
) -> Result<Transition, SessionError> {
    match (state, event) {
        (current, Event::StartScan) => {
            let mut effects = Vec::with_capacity(2);
            if matches!(current, SessionState::AwaitingName { .. }) {
                effects.push(Effect::CloseNameDialog);
            }
            effects.push(Effect::ClearBox);
            Ok(Transition::to(SessionState::Scanning, effects))
        }

        (SessionState::Scanning, Event::DetectionTick(result)) => {
            evaluate_frame(&result, target, tolerance, registry)
        }

        // Frames still in flight after scanning stopped.
        (current, Event::DetectionTick(_)) => {
            tracing::trace!(state = current.name(), "dropping stale frame");
            Ok(Transition::to(current.clone(), Vec::new()))
        }

        (SessionState::AwaitingName { pending_face }, Event::SubmitName { text }) => {
            let name = text.trim();
            if name.is_empty() {
                return Err(SessionError::EmptyName);
            }
            Ok(Transition {
                next: SessionState::Idle,
                effects: vec![
                    Effect::ShowInfo(format!("Face registered: {name}")),
                    Effect::CloseNameDialog,
                ],
                registration: Some((pending_face.face_id.clone(), name.to_string())),
            })
        }

        (SessionState::AwaitingName { .. }, Event::Cancel) => Ok(Transition::to(
            SessionState::Idle,
            vec![Effect::CloseNameDialog],
        )),

        (current, event) => Err(SessionError::UnexpectedEvent {
            event: event.name(),
            state: current.name(),
        }),
    }
}

fn evaluate_frame(
    result: &DetectionResult,
    target: &TargetRegion,
    tolerance: f32,
    registry: &dyn FaceRegistry,
) -> Result<Transition, SessionError> {
    let Some(face) = result.primary() else {
        return Ok(Transition::to(SessionState::Scanning, vec![Effect::ClearBox]));
    };

    let mut effects = vec![Effect::DrawBox(face.bounds)];

    let aligned = match geometry::matches(&face.bounds, target.rect(), tolerance) {
        Ok(aligned) => aligned,
        Err(err) => {
            let reason = err.to_string();
            effects.push(Effect::StopScanning);
            effects.push(Effect::ShowError(reason.clone()));
            return Ok(Transition::to(SessionState::Rejected { reason }, effects));
        }
    };

    if !aligned {
        tracing::debug!(face_id = %face.face_id, "face outside target region");
        effects.push(Effect::ShowInfo(MISALIGNED_MESSAGE.to_string()));
        return Ok(Transition::to(SessionState::Scanning, effects));
    }

    effects.push(Effect::StopScanning);
    let next = match registry.lookup(&face.face_id)? {
        Some(name) => {
            effects.push(Effect::ShowInfo(format!("Face detected: {name}")));
            SessionState::Matched { name }
        }
        None => {
            effects.push(Effect::OpenNameDialog);
            SessionState::AwaitingName {
                pending_face: face.clone(),
            }
        }
    };
    Ok(Transition::to(next, effects))
}

/// One registration session: current state, fixed target region and the registry.
pub struct Session<R> {
    state: SessionState,
    target: TargetRegion,
    tolerance: f32,
    registry: R,
}

impl<R: FaceRegistry> Session<R> {
    pub fn new(target: TargetRegion, registry: R) -> Self {
        Self {
            state: SessionState::Idle,
            target,
            tolerance: geometry::DEFAULT_TOLERANCE,
            registry,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn target(&self) -> &TargetRegion {
        &self.target
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// Apply one event. On error the state is left unchanged.
    pub fn handle(&mut self, event: Event) -> Result<Vec<Effect>, SessionError> {
        let step = transition(&self.state, event, &self.target, self.tolerance, &self.registry)?;

        if let Some((face_id, name)) = &step.registration {
            self.registry.register(face_id, name)?;
            tracing::info!(%face_id, name = name.as_str(), "face registered");
        }

        match &step.next {
            SessionState::Matched { name } => tracing::info!(name = name.as_str(), "registered face matched"),
            SessionState::Rejected { reason } => tracing::warn!(reason = reason.as_str(), "scan rejected"),
            _ => {}
        }
        if step.next.name() != self.state.name() {
            tracing::debug!(from = self.state.name(), to = step.next.name(), "session transition");
        }

        self.state = step.next;
        Ok(step.effects)
    }

    /// Apply one event, reporting recoverable errors as a [`Effect::ShowError`].
    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        let event_name = event.name();
        match self.handle(event) {
            Ok(effects) => effects,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    event = event_name,
                    state = self.state.name(),
                    "event rejected"
                );
                vec![Effect::ShowError(err.to_string())]
            }
        }
    }
}

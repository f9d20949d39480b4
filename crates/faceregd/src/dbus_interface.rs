use crate::engine::{EngineError, EngineHandle};
use facereg_core::{DetectionResult, Event, FaceId, TargetRegion};
use serde::Serialize;
use zbus::interface;

pub const BUS_NAME: &str = "org.freedesktop.FaceReg1";
pub const OBJECT_PATH: &str = "/org/freedesktop/FaceReg1";

/// D-Bus interface for the facereg session daemon.
///
/// Results are JSON strings: `{"state": {...}, "effects": [...]}` for
/// session commands, so the UI layer can apply the effects in order.
pub struct FaceRegService {
    engine: EngineHandle,
    target: TargetRegion,
    tolerance: f32,
}

impl FaceRegService {
    pub fn new(engine: EngineHandle, target: TargetRegion, tolerance: f32) -> Self {
        Self {
            engine,
            target,
            tolerance,
        }
    }

    async fn run(&self, event: Event) -> zbus::fdo::Result<String> {
        let step = self.engine.dispatch(event).await.map_err(engine_error)?;
        to_json(&step)
    }
}

fn engine_error(err: EngineError) -> zbus::fdo::Error {
    tracing::error!(error = %err, "engine request failed");
    zbus::fdo::Error::Failed(err.to_string())
}

fn to_json<T: Serialize>(value: &T) -> zbus::fdo::Result<String> {
    serde_json::to_string(value).map_err(|e| zbus::fdo::Error::Failed(format!("serialize: {e}")))
}

#[interface(name = "org.freedesktop.FaceReg1")]
impl FaceRegService {
    /// Reset the session and start evaluating frames.
    async fn start_scan(&self) -> zbus::fdo::Result<String> {
        tracing::info!("start_scan requested");
        self.run(Event::StartScan).await
    }

    /// Evaluate one frame. `detection` is a JSON `DetectionResult`.
    async fn detection_tick(&self, detection: &str) -> zbus::fdo::Result<String> {
        let result: DetectionResult = serde_json::from_str(detection)
            .map_err(|e| zbus::fdo::Error::InvalidArgs(format!("detection: {e}")))?;
        self.run(Event::DetectionTick(result)).await
    }

    /// Name the face awaiting registration.
    async fn submit_name(&self, name: &str) -> zbus::fdo::Result<String> {
        tracing::info!("submit_name requested");
        self.run(Event::SubmitName {
            text: name.to_string(),
        })
        .await
    }

    /// Dismiss the name dialog without registering.
    async fn cancel(&self) -> zbus::fdo::Result<String> {
        tracing::info!("cancel requested");
        self.run(Event::Cancel).await
    }

    /// Current session state as JSON.
    async fn state(&self) -> zbus::fdo::Result<String> {
        let state = self.engine.state().await.map_err(engine_error)?;
        to_json(&state)
    }

    /// All registered faces as JSON.
    async fn list_faces(&self) -> zbus::fdo::Result<String> {
        tracing::info!("list_faces requested");
        let faces = self.engine.list_faces().await.map_err(engine_error)?;
        to_json(&faces)
    }

    /// Remove a registration by face ID.
    async fn remove_face(&self, face_id: &str) -> zbus::fdo::Result<bool> {
        tracing::info!(face_id, "remove_face requested");
        self.engine
            .remove_face(FaceId::new(face_id))
            .await
            .map_err(engine_error)
    }

    /// Return daemon status information.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let state = self.engine.state().await.map_err(engine_error)?;
        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "state": state.name(),
            "target": self.target,
            "tolerance": self.tolerance,
        })
        .to_string())
    }
}

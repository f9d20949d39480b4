use facereg_core::{Effect, Event, FaceId, FaceRegistry, Registration, RegistryError, Session, SessionState};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// State and effects after one event.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

/// Messages sent from D-Bus handlers to the engine thread.
enum EngineRequest {
    Dispatch {
        event: Event,
        reply: oneshot::Sender<Step>,
    },
    State {
        reply: oneshot::Sender<SessionState>,
    },
    ListFaces {
        reply: oneshot::Sender<Result<Vec<Registration>, EngineError>>,
    },
    RemoveFace {
        face_id: FaceId,
        reply: oneshot::Sender<Result<bool, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineRequest,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Feed one event to the session. Recoverable session errors come back
    /// as a `ShowError` effect, not as an `Err`.
    pub async fn dispatch(&self, event: Event) -> Result<Step, EngineError> {
        self.request(|reply| EngineRequest::Dispatch { event, reply })
            .await
    }

    pub async fn state(&self) -> Result<SessionState, EngineError> {
        self.request(|reply| EngineRequest::State { reply }).await
    }

    pub async fn list_faces(&self) -> Result<Vec<Registration>, EngineError> {
        self.request(|reply| EngineRequest::ListFaces { reply })
            .await?
    }

    pub async fn remove_face(&self, face_id: FaceId) -> Result<bool, EngineError> {
        self.request(|reply| EngineRequest::RemoveFace { face_id, reply })
            .await?
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// The thread exclusively owns the session and its registry, so events from
/// concurrent callers are applied one at a time and at most one face is ever
/// awaiting a name.
pub fn spawn_engine<R>(mut session: Session<R>) -> Result<EngineHandle, EngineError>
where
    R: FaceRegistry + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(16);

    std::thread::Builder::new()
        .name("facereg-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Dispatch { event, reply } => {
                        let effects = session.dispatch(event);
                        let _ = reply.send(Step {
                            state: session.state().clone(),
                            effects,
                        });
                    }
                    EngineRequest::State { reply } => {
                        let _ = reply.send(session.state().clone());
                    }
                    EngineRequest::ListFaces { reply } => {
                        let _ = reply.send(session.registry().entries().map_err(EngineError::from));
                    }
                    EngineRequest::RemoveFace { face_id, reply } => {
                        let result = session.registry_mut().remove(&face_id);
                        if let Ok(true) = result {
                            tracing::info!(%face_id, "registration removed");
                        }
                        let _ = reply.send(result.map_err(EngineError::from));
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })?;

    Ok(EngineHandle { tx })
}

use rollcall_core::{
    Descriptor, DetectionOutcome, DetectionPipeline, PipelineError, RegistrationOutcome, Session,
    SessionError, SessionSnapshot,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

type DetectReply = oneshot::Sender<Result<DetectionOutcome, EngineError>>;

/// Messages handled by the engine thread.
enum EngineRequest {
    Detect {
        frame: Vec<u8>,
        reply: DetectReply,
    },
    /// Sent by the pipeline worker, never by handles.
    DetectionFinished {
        detected: Result<Vec<Descriptor>, PipelineError>,
    },
    Register {
        name: String,
        reply: oneshot::Sender<Result<RegistrationOutcome, EngineError>>,
    },
    Cancel {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Run one detection on `frame`. Rejected immediately if another
    /// detection is still outstanding.
    pub async fn detect(&self, frame: Vec<u8>) -> Result<DetectionOutcome, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Detect {
                frame,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    /// Name the face left pending by the last detection.
    pub async fn register(&self, name: String) -> Result<RegistrationOutcome, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Register {
                name,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    /// Discard a pending registration. `false` if none was pending.
    pub async fn cancel(&self) -> Result<bool, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Cancel { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// The thread owns the session; every mutation and its persistence happen
/// there, one request at a time. Pipeline calls run on a short-lived worker
/// thread and report back through the same queue.
pub fn spawn_engine(
    session: Session,
    pipeline: Arc<dyn DetectionPipeline>,
) -> Result<EngineHandle, EngineError> {
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(16);
    // Weak, so dropping every handle still ends the loop.
    let loopback = tx.downgrade();

    std::thread::Builder::new()
        .name("rollcall-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            let mut session = session;
            let mut pending: Option<DetectReply> = None;

            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Detect { frame, reply } => {
                        if let Err(e) = session.begin_detection() {
                            let _ = reply.send(Err(e.into()));
                            continue;
                        }
                        pending = Some(reply);
                        if let Err(e) = start_pipeline(&pipeline, &loopback, frame) {
                            finish(&mut session, &mut pending, Err(e));
                        }
                    }
                    EngineRequest::DetectionFinished { detected } => {
                        finish(&mut session, &mut pending, detected);
                    }
                    EngineRequest::Register { name, reply } => {
                        let _ = reply.send(session.submit_registration(&name).map_err(Into::into));
                    }
                    EngineRequest::Cancel { reply } => {
                        let _ = reply.send(session.cancel_registration());
                    }
                    EngineRequest::Snapshot { reply } => {
                        let _ = reply.send(session.snapshot());
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx })
}

fn finish(
    session: &mut Session,
    pending: &mut Option<DetectReply>,
    detected: Result<Vec<Descriptor>, PipelineError>,
) {
    let result = session.complete_detection(detected).map_err(EngineError::from);
    match pending.take() {
        Some(reply) => {
            let _ = reply.send(result);
        }
        None => tracing::warn!("detection finished with no caller waiting"),
    }
}

/// Run the pipeline on a worker thread; the result comes back as
/// `DetectionFinished`.
fn start_pipeline(
    pipeline: &Arc<dyn DetectionPipeline>,
    loopback: &mpsc::WeakSender<EngineRequest>,
    frame: Vec<u8>,
) -> Result<(), PipelineError> {
    let tx = loopback
        .upgrade()
        .ok_or_else(|| PipelineError::Unavailable("engine shutting down".into()))?;
    let pipeline = Arc::clone(pipeline);

    std::thread::Builder::new()
        .name("rollcall-pipeline".into())
        .spawn(move || {
            let detected = pipeline.detect(&frame);
            if tx
                .blocking_send(EngineRequest::DetectionFinished { detected })
                .is_err()
            {
                tracing::warn!("engine gone before detection finished");
            }
        })
        .map_err(|e| PipelineError::Unavailable(format!("failed to start pipeline worker: {e}")))?;
    Ok(())
}

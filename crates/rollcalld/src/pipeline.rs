//! Detection pipelines available to the daemon.
//!
//! Face detection and embedding run outside this process. The daemon either
//! hands each frame to an embedder command, or accepts frames that are
//! already descriptor documents: a JSON array of 128-float arrays, one per
//! detected face.

use rollcall_core::pipeline::descriptors_from_raw;
use rollcall_core::{Descriptor, DetectionPipeline, PipelineError};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::Handle;

/// Parse a descriptor document.
pub fn parse_descriptors(document: &[u8]) -> Result<Vec<Descriptor>, PipelineError> {
    let raw: Vec<Vec<f32>> = serde_json::from_slice(document)
        .map_err(|e| PipelineError::Unavailable(format!("unreadable descriptor document: {e}")))?;
    descriptors_from_raw(raw)
}

/// Frames are descriptor documents produced upstream.
pub struct PrecomputedPipeline;

impl DetectionPipeline for PrecomputedPipeline {
    fn detect(&self, frame: &[u8]) -> Result<Vec<Descriptor>, PipelineError> {
        parse_descriptors(frame)
    }
}

/// Runs an embedder via `sh -c`, frame on stdin, descriptor document on stdout.
///
/// The embedder gets its own process group. Feeding the frame, collecting
/// output and waiting for exit share one timeout; on expiry the whole group
/// is killed. Spawn failure, a non-zero exit, unreadable output or a timeout
/// all surface as [`PipelineError::Unavailable`].
///
/// `detect` blocks on `runtime`, so it must be called from a thread outside
/// the async runtime (the engine's pipeline worker).
pub struct CommandPipeline {
    command: String,
    timeout: Duration,
    runtime: Handle,
}

impl CommandPipeline {
    pub fn new(command: impl Into<String>, timeout: Duration, runtime: Handle) -> Self {
        Self {
            command: command.into(),
            timeout,
            runtime,
        }
    }

    async fn run(&self, frame: &[u8]) -> Result<Vec<u8>, PipelineError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .process_group(0)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| unavailable(format!("failed to start `{}`: {e}", self.command)))?;

        let pgid = child.id();
        let Some(mut stdin) = child.stdin.take() else {
            return Err(unavailable("embedder stdin not captured"));
        };

        let exchange = async move {
            let feed = async move {
                if let Err(e) = stdin.write_all(frame).await {
                    // Commands that ignore stdin close the pipe early.
                    tracing::debug!(error = %e, "embedder did not consume the whole frame");
                }
                drop(stdin);
            };
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(unavailable(format!("waiting for embedder: {e}"))),
            Err(_) => {
                if let Some(pgid) = pgid {
                    kill_process_group(pgid);
                }
                tracing::warn!(command = %self.command, timeout = ?self.timeout, "embedder timed out");
                return Err(unavailable(format!("embedder timed out after {:?}", self.timeout)));
            }
        };

        if !output.status.success() {
            return Err(unavailable(format!("embedder exited with {}", output.status)));
        }
        Ok(output.stdout)
    }
}

impl DetectionPipeline for CommandPipeline {
    fn detect(&self, frame: &[u8]) -> Result<Vec<Descriptor>, PipelineError> {
        let output = self.runtime.block_on(self.run(frame))?;
        let descriptors = parse_descriptors(&output)?;
        tracing::debug!(faces = descriptors.len(), bytes = frame.len(), "embedder finished");
        Ok(descriptors)
    }
}

/// SIGKILL every process left in the embedder's group.
fn kill_process_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: kill(2) only delivers a signal; a negative pid targets the
    // group created for this embedder by `process_group(0)`.
    let ret = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if ret < 0 {
        tracing::debug!(
            pgid,
            error = %std::io::Error::last_os_error(),
            "embedder process group already gone"
        );
    }
}

fn unavailable(reason: impl Into<String>) -> PipelineError {
    PipelineError::Unavailable(reason.into())
}

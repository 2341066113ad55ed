//! Model subprocesses with a deadline.
//!
//! Piper and the translator are external programs; a wedged one must not hold the
//! talk flow. Each call runs on its own current-thread runtime and the child is killed
//! when the deadline passes.

use crate::error::{VoiceError, VoiceResult};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Used when no deadline is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Spawn `command`, write `input` to its stdin and collect its output.
///
/// Start failures and an expired `deadline` are reported through `fail`, which picks
/// the error variant of the calling adapter.
pub(crate) fn run_with_deadline(
    command: &mut Command,
    input: &[u8],
    deadline: Duration,
    fail: fn(String) -> VoiceError,
) -> VoiceResult<Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(command, input, deadline, fail))
}

async fn run(
    command: &mut Command,
    input: &[u8],
    deadline: Duration,
    fail: fn(String) -> VoiceError,
) -> VoiceResult<Output> {
    let program = command
        .as_std()
        .get_program()
        .to_string_lossy()
        .into_owned();
    let mut child = command
        .stdin(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| fail(format!("failed to start {}: {}", program, e)))?;

    let stdin = child.stdin.take();
    let label = program.clone();
    let finished = async move {
        if let Some(mut stdin) = stdin {
            // an early exit surfaces through the exit status
            if let Err(e) = stdin.write_all(input).await {
                debug!("{} closed stdin early: {}", label, e);
            }
        }
        child.wait_with_output().await
    };

    match tokio::time::timeout(deadline, finished).await {
        Ok(output) => Ok(output?),
        Err(_) => {
            warn!(program = %program, "Killed after {:?}", deadline);
            Err(fail(format!("{} did not finish within {:?}", program, deadline)))
        }
    }
}

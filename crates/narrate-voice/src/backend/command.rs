//! On-device speech by spawning a speech program per utterance.
//!
//! Defaults to `espeak-ng` (or `say` on macOS). Each utterance is one child
//! process; cancelling kills it.

use std::process::Stdio;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::{UtteranceOutcome, UtterancePrimitive};
use crate::error::PlaybackError;

/// Speaks utterances through an external program.
pub struct CommandUtterancePrimitive {
    program: String,
    args: Vec<String>,
    /// Token of the latest utterance. Cancelling a finished one is harmless.
    current: Mutex<Option<CancellationToken>>,
}

impl CommandUtterancePrimitive {
    /// Speak with `program`, passing `args` before the utterance text.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            current: Mutex::new(None),
        }
    }

    /// Speak with `program` at `rate_wpm`, using the rate flag the program
    /// understands (`-r` for `say`, `-s` for espeak and friends).
    pub fn with_rate(program: impl Into<String>, rate_wpm: u32) -> Self {
        let program = program.into();
        let flag = if program.rsplit('/').next() == Some("say") {
            "-r"
        } else {
            "-s"
        };
        let args = vec![flag.to_string(), rate_wpm.to_string()];
        Self::new(program, args)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn replace_token(&self, token: Option<CancellationToken>) -> Option<CancellationToken> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, token)
    }
}

#[async_trait]
impl UtterancePrimitive for CommandUtterancePrimitive {
    async fn speak(&self, utterance: &str) -> Result<UtteranceOutcome, PlaybackError> {
        let token = CancellationToken::new();
        if let Some(previous) = self.replace_token(Some(token.clone())) {
            previous.cancel();
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(utterance)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PlaybackError::Synthesis(format!("failed to start '{}': {e}", self.program))
            })?;

        tracing::trace!(program = %self.program, chars = utterance.len(), "Utterance started");

        let outcome = tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| {
                    PlaybackError::Synthesis(format!("'{}' did not exit cleanly: {e}", self.program))
                })?;
                if !status.success() {
                    return Err(PlaybackError::Synthesis(format!(
                        "'{}' exited with {status}",
                        self.program
                    )));
                }
                UtteranceOutcome::Finished
            }
            () = token.cancelled() => {
                if let Err(e) = child.kill().await {
                    tracing::debug!(error = %e, "Speech process already gone");
                }
                UtteranceOutcome::Cancelled
            }
        };

        Ok(outcome)
    }

    fn cancel(&self) {
        if let Some(token) = self.replace_token(None) {
            token.cancel();
        }
    }
}

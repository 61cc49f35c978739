//! Dictation input via an external speech-to-text helper.
//!
//! The helper is any command that records one utterance and prints the final
//! transcript on stdout (e.g. a whisper CLI wrapper). Availability is probed
//! once at startup; without a configured, resolvable command the voice
//! control stays disabled and the UI says so. There is no fallback path.

use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::{info, warn};

use crate::error::{ChatError, Result};

pub struct DictationEngine {
    program: String,
    args: Vec<String>,
}

impl DictationEngine {
    /// Build the engine from the configured command line. Returns `None`
    /// when dictation is unconfigured or the binary cannot be found.
    pub fn from_config(command: Option<&str>) -> Option<Self> {
        let command = command?.trim();
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        let args: Vec<String> = parts.collect();

        match which::which(&program) {
            Ok(path) => {
                info!("dictation helper: {}", path.display());
                Some(Self { program, args })
            }
            Err(e) => {
                warn!("dictation disabled, `{program}` not found: {e}");
                None
            }
        }
    }

    /// Run the helper once and return the final transcript.
    ///
    /// # Errors
    ///
    /// Returns an error if the helper fails to run, exits non-zero, or
    /// prints no transcript.
    pub async fn listen(&self) -> Result<String> {
        let started = Instant::now();
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| ChatError::Dictation(format!("failed to run helper: {e}")))?;

        if !output.status.success() {
            return Err(ChatError::Dictation(format!(
                "helper exited with {}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let transcript = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| ChatError::Dictation("helper produced no transcript".into()))?;

        info!(
            "dictated in {:.0}ms: \"{transcript}\"",
            started.elapsed().as_millis()
        );
        Ok(transcript.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_command_disables_dictation() {
        assert!(DictationEngine::from_config(None).is_none());
        assert!(DictationEngine::from_config(Some("")).is_none());
        assert!(DictationEngine::from_config(Some("   ")).is_none());
    }

    #[test]
    fn missing_binary_disables_dictation() {
        let engine = DictationEngine::from_config(Some("charla-no-such-helper --once"));
        assert!(engine.is_none());
    }

    #[tokio::test]
    async fn listen_returns_first_nonempty_stdout_line() {
        let engine = DictationEngine::from_config(Some("echo hello world"))
            .expect("echo should be on PATH");
        let transcript = engine.listen().await.unwrap();
        assert_eq!(transcript, "hello world");
    }

    #[tokio::test]
    async fn failing_helper_is_an_error() {
        let engine =
            DictationEngine::from_config(Some("false")).expect("false should be on PATH");
        assert!(engine.listen().await.is_err());
    }
}

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::{
    process::{Child, Command},
    sync::Mutex,
};
use tracing::debug;

/// Text-to-speech through a platform synthesizer command
/// (`espeak-ng`, `say`, ...). At most one utterance is in flight:
/// starting a new one kills the previous child first.
///
/// `is_active` may be polled at arbitrary times; it has no side effect
/// beyond reaping a child that already exited.
pub struct CommandSpeech {
    program: String,
    current: Mutex<Option<Child>>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            current: Mutex::new(None),
        }
    }

    pub async fn speak(&self, text: &str, locale: Option<&str>) -> Result<()> {
        let mut current = self.current.lock().await;
        if let Some(mut previous) = current.take() {
            let _ = previous.kill().await;
        }

        let mut command = Command::new(&self.program);
        if let Some(locale) = locale {
            command.arg("-v").arg(locale);
        }
        command.arg(text).stdout(Stdio::null()).stderr(Stdio::null());

        let child = command
            .spawn()
            .with_context(|| format!("failed to spawn speech command '{}'", self.program))?;
        debug!(program = %self.program, "speech: utterance started");
        *current = Some(child);
        Ok(())
    }

    pub async fn stop(&self) {
        let mut current = self.current.lock().await;
        if let Some(mut child) = current.take() {
            let _ = child.kill().await;
            debug!(program = %self.program, "speech: utterance stopped");
        }
    }

    pub async fn is_active(&self) -> bool {
        let mut current = self.current.lock().await;
        match current.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                _ => {
                    *current = None;
                    false
                }
            },
            None => false,
        }
    }
}

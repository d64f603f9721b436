//! SystemSpeech - text-to-speech through a platform speech command.
//!
//! Looks for `say` (macOS), `espeak-ng` or `espeak` on `PATH` once, at
//! construction. Playback runs the command as a child process; cancelling
//! kills it. Speech recognition has no portable command-line equivalent and
//! is reported as unsupported.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use carebot_core::speech::{
    SpeechCapabilities, SpeechError, SpeechEvent, SpeechEventSink, SpeechIo, Utterance,
};
use tokio::process::Command;
use tokio::sync::oneshot;

/// Words per minute both `say` and `espeak` use at rate 1.0.
const BASE_WORDS_PER_MINUTE: f32 = 175.0;
/// `espeak` pitch at 1.0 on its 0-99 scale.
const BASE_ESPEAK_PITCH: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgramKind {
    Say,
    Espeak,
}

#[derive(Debug, Clone)]
struct SpeechProgram {
    kind: ProgramKind,
    path: PathBuf,
}

impl SpeechProgram {
    fn command(&self, utterance: &Utterance) -> Command {
        let words_per_minute = (BASE_WORDS_PER_MINUTE * utterance.voice.rate).round().max(80.0);
        let mut command = Command::new(&self.path);
        match self.kind {
            ProgramKind::Say => {
                command.arg("-r").arg(format!("{words_per_minute}"));
            }
            ProgramKind::Espeak => {
                let pitch = (BASE_ESPEAK_PITCH * utterance.voice.pitch).round().clamp(0.0, 99.0);
                command
                    .arg("-v")
                    .arg(espeak_voice(&utterance.voice.language))
                    .arg("-s")
                    .arg(format!("{words_per_minute}"))
                    .arg("-p")
                    .arg(format!("{pitch}"));
            }
        }
        command.arg("--").arg(&utterance.text);
        command.kill_on_drop(true);
        command
    }
}

/// `en-IN` -> `en`; espeak voices are keyed by language, not region.
fn espeak_voice(language: &str) -> String {
    language
        .split(['-', '_'])
        .next()
        .filter(|lang| !lang.is_empty())
        .unwrap_or("en")
        .to_lowercase()
}

struct ActivePlayback {
    utterance_id: u64,
    cancel: oneshot::Sender<()>,
}

/// [`SpeechIo`] backed by a platform speech command.
#[derive(Clone)]
pub struct SystemSpeech {
    program: Option<SpeechProgram>,
    active: Arc<Mutex<Option<ActivePlayback>>>,
}

impl SystemSpeech {
    /// Probes the process `PATH`.
    pub fn probe() -> Self {
        let path = std::env::var_os("PATH").unwrap_or_default();
        Self::probe_in(&path)
    }

    /// Probes a `PATH`-style list of directories.
    pub fn probe_in(search_path: &OsStr) -> Self {
        let dirs: Vec<PathBuf> = std::env::split_paths(search_path).collect();
        let candidates = [
            ("say", ProgramKind::Say),
            ("espeak-ng", ProgramKind::Espeak),
            ("espeak", ProgramKind::Espeak),
        ];

        let program = candidates.iter().find_map(|(name, kind)| {
            dirs.iter()
                .map(|dir| dir.join(name))
                .find(|candidate| is_executable(candidate))
                .map(|path| SpeechProgram { kind: *kind, path })
        });

        match &program {
            Some(p) => tracing::info!(program = %p.path.display(), "Text-to-speech available"),
            None => tracing::info!("No text-to-speech command found; playback disabled"),
        }

        Self {
            program,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Removes the active playback, if any, and signals it to stop.
    fn take_active(&self) -> Option<u64> {
        lock_active(&self.active).take().map(|playback| {
            // The receiver may already be gone if the child just exited.
            let _ = playback.cancel.send(());
            playback.utterance_id
        })
    }
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

fn lock_active(active: &Mutex<Option<ActivePlayback>>) -> MutexGuard<'_, Option<ActivePlayback>> {
    match active.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn owns_playback(active: &Option<ActivePlayback>, utterance_id: u64) -> bool {
    active.as_ref().map(|p| p.utterance_id) == Some(utterance_id)
}

/// Clears `active` if it still belongs to `utterance_id`. Returns whether it did.
fn finish_playback(active: &Mutex<Option<ActivePlayback>>, utterance_id: u64) -> bool {
    let mut guard = lock_active(active);
    if owns_playback(&guard, utterance_id) {
        *guard = None;
        true
    } else {
        false
    }
}

#[async_trait]
impl SpeechIo for SystemSpeech {
    fn capabilities(&self) -> SpeechCapabilities {
        SpeechCapabilities {
            can_listen: false,
            can_speak: self.program.is_some(),
        }
    }

    async fn listen_once(&self) -> Result<String, SpeechError> {
        Err(SpeechError::Unsupported)
    }

    fn stop_listening(&self) {}

    fn speak(&self, utterance: Utterance, sink: SpeechEventSink) {
        if let Some(previous) = self.take_active() {
            tracing::debug!(utterance_id = previous, "Cancelled playback before restart");
        }

        let Some(program) = self.program.clone() else {
            sink(SpeechEvent::Failed(utterance.id));
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("Speech playback requested outside a tokio runtime");
            sink(SpeechEvent::Failed(utterance.id));
            return;
        };

        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        *lock_active(&self.active) = Some(ActivePlayback {
            utterance_id: utterance.id,
            cancel: cancel_tx,
        });

        let active = self.active.clone();
        let utterance_id = utterance.id;
        let mut command = program.command(&utterance);
        runtime.spawn(async move {
            // Superseded before the task first ran.
            if cancel_rx.try_recv().is_ok() || !owns_playback(&lock_active(&active), utterance_id) {
                return;
            }
            let mut child = match command.spawn() {
                Ok(child) => child,
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to start speech command");
                    if finish_playback(&active, utterance_id) {
                        sink(SpeechEvent::Failed(utterance_id));
                    }
                    return;
                }
            };
            {
                // Started is sent under the lock so a cancel either precedes
                // it and silences this child, or follows it.
                let guard = lock_active(&active);
                if !owns_playback(&guard, utterance_id) {
                    drop(guard);
                    if let Err(err) = child.start_kill() {
                        tracing::debug!(error = %err, "Speech command already exited");
                    }
                    return;
                }
                sink(SpeechEvent::Started(utterance_id));
            }

            let finished = tokio::select! {
                status = child.wait() => Some(status),
                _ = &mut cancel_rx => None,
            };

            let Some(status) = finished else {
                if let Err(err) = child.kill().await {
                    tracing::debug!(error = %err, "Speech command already exited");
                }
                return;
            };
            if !finish_playback(&active, utterance_id) {
                return;
            }
            match status {
                Ok(status) if status.success() => sink(SpeechEvent::Ended(utterance_id)),
                Ok(status) => {
                    tracing::warn!(%status, "Speech command exited unsuccessfully");
                    sink(SpeechEvent::Failed(utterance_id));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to wait for speech command");
                    sink(SpeechEvent::Failed(utterance_id));
                }
            }
        });
    }

    fn cancel(&self) {
        if let Some(utterance_id) = self.take_active() {
            tracing::debug!(utterance_id, "Playback cancelled");
        }
    }
}

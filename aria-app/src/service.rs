use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use anyhow::Context;
use aria_audio::{CaptureError, CapturedAudio, Recorder, UPLOAD_MIME_TYPE, encode_wav_16k};
use aria_core::{AppConfig, ComposeBuffer, EditOutcome, UserId};
use aria_engine::engine::{EngineError, SessionController};
use aria_engine::playback::PlaybackArbiter;
use aria_engine::session::{FinalizeOutcome, Session};
use aria_engine::traits::{AudioArtifact, CompanionApi, SpeechSynth, Transcriber};

/// Binds the session controller, capture pipeline, transcription gateway,
/// and playback arbiter behind one surface, so typed and spoken input
/// converge on the same send path.
pub struct AppService {
    controller: Arc<SessionController>,
    playback: Arc<PlaybackArbiter>,
    transcriber: Arc<dyn Transcriber>,

    // Composition buffer, owned here rather than by the controller so
    // failed submissions can hand text back.
    compose: StdMutex<ComposeBuffer>,

    recorder: Arc<tokio::sync::Mutex<Option<Recorder>>>,
    microphone_device: Option<String>,
}

impl AppService {
    pub fn new(
        config: &AppConfig,
        user_id: UserId,
        api: Arc<dyn CompanionApi>,
        transcriber: Arc<dyn Transcriber>,
        synth: Arc<dyn SpeechSynth>,
    ) -> Self {
        let playback = Arc::new(PlaybackArbiter::new(
            synth,
            config.defaults.preferred_voice.clone(),
            config.defaults.voice_enabled,
        ));

        let controller =
            Arc::new(SessionController::new(user_id, api).with_playback(playback.clone()));

        Self {
            controller,
            playback,
            transcriber,
            compose: StdMutex::new(ComposeBuffer::new()),
            recorder: Arc::new(tokio::sync::Mutex::new(None)),
            microphone_device: config.defaults.microphone_device.clone(),
        }
    }

    pub async fn session(&self) -> Session {
        self.controller.snapshot().await
    }

    /// Start (or restart) a session and return the welcome text.
    pub async fn initialize(&self) -> Result<Option<String>, EngineError> {
        self.controller.initialize().await?;
        Ok(self.controller.snapshot().await.welcome)
    }

    pub fn edit_compose(&self, edited: &str) -> EditOutcome {
        let outcome = self.lock_compose().apply_edit(edited);
        if outcome == EditOutcome::Truncated {
            log::warn!("word limit reached; input truncated to 200 words");
        }
        outcome
    }

    pub fn compose_text(&self) -> String {
        self.lock_compose().text().to_string()
    }

    /// Submit the composition buffer as one turn. The buffer clears on
    /// success and is handed back untouched on failure so the user can
    /// retry.
    pub async fn send_composed(&self) -> Result<String, EngineError> {
        let text = self.lock_compose().take();

        match self.controller.submit_text(&text).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                self.lock_compose().restore(text);
                Err(e)
            }
        }
    }

    /// Finalize the current chat and land in a fresh one.
    pub async fn new_chat(&self) -> Result<FinalizeOutcome, EngineError> {
        self.controller.finalize().await
    }

    pub async fn start_recording(&self) -> Result<(), CaptureError> {
        let mut recorder = self.recorder.lock().await;
        if recorder.is_none() {
            *recorder = Some(Recorder::open_named(self.microphone_device.as_deref())?);
        }
        recorder
            .as_ref()
            .ok_or(CaptureError::NoInputDevice)?
            .start()
    }

    /// Finish the recording gesture, transcribe the artifact, and send the
    /// transcript down the same path as typed input.
    pub async fn stop_recording_and_send(&self) -> anyhow::Result<String> {
        let captured = {
            let recorder = self.recorder.lock().await;
            let r = recorder.as_ref().ok_or(CaptureError::NotRecording)?;
            let samples = r.stop()?;
            CapturedAudio {
                sample_rate_hz: r.sample_rate_hz(),
                samples,
            }
        };

        self.forward_capture(captured).await
    }

    /// Completion hook for a finished capture: encode, transcribe, submit.
    ///
    /// A zero-sample capture never reaches the transcription endpoint, and a
    /// transcription failure is surfaced without retrying; the composition
    /// buffer is not involved in either case.
    pub async fn forward_capture(&self, captured: CapturedAudio) -> anyhow::Result<String> {
        if captured.samples.is_empty() {
            return Err(CaptureError::EmptyCapture.into());
        }

        let bytes = encode_wav_16k(&captured).context("encode capture for upload")?;
        let artifact = AudioArtifact {
            filename: "capture.wav".into(),
            mime_type: UPLOAD_MIME_TYPE.into(),
            bytes,
        };

        let transcript = self
            .transcriber
            .transcribe(&artifact)
            .await
            .context("voice transcription failed")?;

        let reply = self.controller.submit_transcript(&transcript).await?;
        Ok(reply)
    }

    pub async fn set_voice_enabled(&self, enabled: bool) {
        self.playback.set_enabled(enabled).await;
    }

    pub async fn voice_enabled(&self) -> bool {
        self.playback.is_enabled().await
    }

    /// Replay a message (or toggle it off when it is already playing).
    pub async fn replay(&self, text: &str) {
        self.controller.replay(text).await;
    }

    fn lock_compose(&self) -> std::sync::MutexGuard<'_, ComposeBuffer> {
        self.compose.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Short, actionable strings for microphone failures; details go to logs.
pub fn user_facing_capture_error(e: &CaptureError) -> String {
    match e {
        CaptureError::PermissionDenied => {
            "Microphone access appears blocked. Allow microphone access in your system settings."
                .into()
        }
        CaptureError::NoInputDevice => {
            "No microphone detected. Check your mic and choose the device in the app.".into()
        }
        CaptureError::EmptyCapture => {
            "No audio was captured from the microphone. Try recording again.".into()
        }
        CaptureError::AlreadyRecording => "Recording is already in progress.".into(),
        CaptureError::NotRecording => "Not recording.".into(),
        _ => "Audio recording failed. Check the logs for details.".into(),
    }
}

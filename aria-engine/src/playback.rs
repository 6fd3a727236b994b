use crate::traits::{SpeechSynth, VoiceProfile};
use std::sync::Arc;
use tokio::sync::Mutex;

struct LiveToken {
    text: String,
    generation: u64,
}

struct Inner {
    live: Option<LiveToken>,
    generation: u64,
    enabled: bool,
}

/// Single-flight, toggleable text-to-speech.
///
/// At most one utterance is live at a time. Speaking the text that is
/// already live cancels it (toggle-off); speaking anything else cancels the
/// current utterance and replaces it. Natural completion clears the live
/// token; a generation counter keeps a superseded utterance's completion
/// from clearing its replacement.
pub struct PlaybackArbiter {
    synth: Arc<dyn SpeechSynth>,
    preferred_voice: Option<String>,
    inner: Arc<Mutex<Inner>>,
}

impl PlaybackArbiter {
    pub fn new(synth: Arc<dyn SpeechSynth>, preferred_voice: Option<String>, enabled: bool) -> Self {
        Self {
            synth,
            preferred_voice,
            inner: Arc::new(Mutex::new(Inner {
                live: None,
                generation: 0,
                enabled,
            })),
        }
    }

    pub async fn set_enabled(&self, enabled: bool) {
        self.inner.lock().await.enabled = enabled;
    }

    pub async fn is_enabled(&self) -> bool {
        self.inner.lock().await.enabled
    }

    /// The text currently being spoken, if any.
    pub async fn live_text(&self) -> Option<String> {
        self.inner
            .lock()
            .await
            .live
            .as_ref()
            .map(|t| t.text.clone())
    }

    pub async fn speak(&self, text: &str) {
        let generation = {
            let mut inner = self.inner.lock().await;

            // Disabled output still acts as a stop-all.
            if !inner.enabled {
                inner.live = None;
                self.synth.cancel();
                return;
            }

            // Toggle-off: asking for the live text again stops it.
            if inner.live.as_ref().is_some_and(|t| t.text == text) {
                inner.live = None;
                self.synth.cancel();
                return;
            }

            if inner.live.is_some() {
                self.synth.cancel();
            }

            inner.generation = inner.generation.wrapping_add(1);
            inner.live = Some(LiveToken {
                text: text.to_string(),
                generation: inner.generation,
            });
            inner.generation
        };

        let voice = self.pick_voice();
        let synth = self.synth.clone();
        let inner = self.inner.clone();
        let text = text.to_string();

        tokio::spawn(async move {
            if let Err(e) = synth.speak(&text, voice.as_ref()).await {
                log::warn!("speech synthesis failed: {e}");
            }

            // Only the utterance that is still live may clear the token.
            let mut inner = inner.lock().await;
            if inner
                .live
                .as_ref()
                .is_some_and(|t| t.generation == generation)
            {
                inner.live = None;
            }
        });
    }

    /// Stop whatever is playing and clear the live token.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        inner.live = None;
        self.synth.cancel();
    }

    /// Best-effort voice selection: substring match against the enumerated
    /// voices, platform default otherwise. Never an error.
    fn pick_voice(&self) -> Option<VoiceProfile> {
        let preferred = self.preferred_voice.as_deref()?;
        self.synth
            .voices()
            .into_iter()
            .find(|v| v.name.contains(preferred))
    }
}

use aria_engine::traits::{SpeechSynth, VoiceProfile};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Notify;

/// Terminal stand-in for platform speech synthesis.
///
/// Announces each utterance on the log and "plays" for a duration scaled to
/// the word count, so toggle and cancel behave the way they do against a
/// real voice instead of completing instantly.
pub struct LogSpeech {
    interrupt: Notify,
}

impl LogSpeech {
    pub fn new() -> Self {
        Self {
            interrupt: Notify::new(),
        }
    }
}

impl Default for LogSpeech {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynth for LogSpeech {
    fn voices(&self) -> Vec<VoiceProfile> {
        Vec::new()
    }

    async fn speak(&self, text: &str, _voice: Option<&VoiceProfile>) -> anyhow::Result<()> {
        log::info!("speaking: {text}");

        let words = text.split_whitespace().count().max(1) as u64;
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(words * 300)) => {}
            _ = self.interrupt.notified() => {
                log::debug!("speech interrupted");
            }
        }
        Ok(())
    }

    fn cancel(&self) {
        self.interrupt.notify_waiters();
    }
}

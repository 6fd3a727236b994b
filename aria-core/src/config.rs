use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalDefaults {
    pub api_base_url: String,

    /// Whether agent replies (and the welcome message) are spoken aloud.
    pub voice_enabled: bool,

    /// Soft preference; playback falls back to the platform default voice
    /// when no enumerated voice matches.
    pub preferred_voice: Option<String>,

    pub microphone_device: Option<String>,
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".into(),
            voice_enabled: false,
            preferred_voice: None,
            microphone_device: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub defaults: GlobalDefaults,
}

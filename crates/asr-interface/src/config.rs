/// Read-only configuration captured at `start_listening` (§4.1, §6.3, §9).
/// Language changes require a full restart; nothing in the core mutates this
/// after construction.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct SessionConfig {
    pub source_lang: String,
    pub target_lang: String,
    /// Vendor-opaque model identifier; the core never branches on it.
    pub model: Option<String>,
    /// Vendor endpointing hint in ms. Default 800 per §6.3.
    pub endpointing_ms: u32,
    /// After this many ms of silence following the last interim, `finalize`
    /// promotes the pending interim to a final even without a vendor final.
    /// Default 1000 per §6.3.
    pub utterance_end_ms: u32,
    /// Whether to request interim results from the vendor at all. Default
    /// true.
    pub interim: bool,
}

impl SessionConfig {
    pub fn new(source_lang: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            model: None,
            endpointing_ms: 800,
            utterance_end_ms: 1000,
            interim: true,
        }
    }
}

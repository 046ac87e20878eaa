/// Selects model/token budget externally; the core never parses
/// provider-specific fields (§6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateProfile {
    Realtime,
    Quality,
    Report,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslateRequest {
    pub source_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub profile: TranslateProfile,
}

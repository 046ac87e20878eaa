use std::fmt;

macro_rules! opaque_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
            specta::Type,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(SessionId, "Identifies one user-visible session across restarts.");
opaque_id!(
    CorrelationId,
    "Scopes every event emitted during a single `start_listening`..`stop_listening` run. \
     Minted fresh by the orchestrator on start; preserved across ASR reconnects."
);
opaque_id!(SegmentId, "Identifies one ASR segment, interim or final, within a session.");
opaque_id!(SentenceId, "Identifies one combined sentence produced by the sentence combiner.");
opaque_id!(ParagraphId, "Identifies one paragraph produced by the paragraph builder.");
opaque_id!(JobId, "Identifies one translation or summarization job in the queue.");

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use uuid::Uuid;

/// Identifier for a follow-up conversation opened by one analysis.
///
/// Shape: `{source-hash:016x}-{created-at-ms}-{8 random hex}`. Not meant to be
/// unguessable, only to keep collisions negligible within one process.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Derive a fresh id from the identity of the analysed source and the time
    /// the analysis started.
    pub fn derive(source_identity: &str, created_at: DateTime<Utc>) -> Self {
        let mut hasher = DefaultHasher::new();
        source_identity.hash(&mut hasher);
        let suffix = Uuid::new_v4().simple().to_string();

        Self(format!(
            "{:016x}-{}-{}",
            hasher.finish(),
            created_at.timestamp_millis(),
            &suffix[..8]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_embeds_timestamp() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let id = SessionId::derive("https://youtu.be/dQw4w9WgXcQ", at);
        let parts: Vec<&str> = id.as_str().split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 16);
        assert_eq!(parts[1], "1700000000123");
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn test_same_source_same_instant_still_differs() {
        let at = Utc::now();
        let a = SessionId::derive("clip.mp4", at);
        let b = SessionId::derive("clip.mp4", at);
        assert_ne!(a, b);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = SessionId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}

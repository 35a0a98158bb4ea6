//! Turns the model's free-form replies into typed shot and lip-flap records.
//! Malformed output is reported as data, never as an error.
pub mod repair;
mod records;

use reelscope_common::config::RecordPolicy;
use reelscope_common::types::{LipFlapRecord, ShotRecord};
use reelscope_common::ReelscopeError;
use serde_json::Value;

pub use records::RecordRejection;
pub use repair::repair_json;

/// Array field holding shot records.
pub const SHOTS_FIELD: &str = "shots";
/// Array field holding lip-flap records.
pub const LIP_FLAPS_FIELD: &str = "lipFlaps";

/// Why a structured reply produced no records at all.
///
/// Expected and frequent: this is returned as data, never raised.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NormalizationFailure {
    #[error("no JSON object found")]
    NoJsonObject,

    #[error("repaired JSON did not parse: {0}")]
    Parse(String),

    #[error("field `{0}` is missing")]
    MissingField(String),

    #[error("field `{0}` is not an array")]
    NotAnArray(String),
}

impl NormalizationFailure {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NoJsonObject => "no_json_object",
            Self::Parse(_) => "parse",
            Self::MissingField(_) => "missing_field",
            Self::NotAnArray(_) => "not_an_array",
        }
    }
}

impl From<NormalizationFailure> for ReelscopeError {
    fn from(e: NormalizationFailure) -> Self {
        ReelscopeError::Normalization(e.to_string())
    }
}

/// Outcome of normalizing one structured reply.
///
/// Either `failure` is set and `records` is empty, or the array was found and
/// `records` holds every element that survived the record policy.
#[derive(Clone, Debug, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub failure: Option<NormalizationFailure>,
    pub rejected: Vec<RecordRejection>,
}

impl<T> Normalized<T> {
    fn failed(failure: NormalizationFailure) -> Self {
        Self {
            records: Vec::new(),
            failure: Some(failure),
            rejected: Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Records for the result record: `None` when nothing usable came back.
    pub fn into_records(self) -> Option<Vec<T>> {
        (!self.records.is_empty()).then_some(self.records)
    }
}

/// Locate, repair and parse the JSON object in `raw`, then return its array
/// field `field`.
pub fn extract_array(raw: &str, field: &str) -> Result<Vec<Value>, NormalizationFailure> {
    let repaired = repair_json(raw).ok_or(NormalizationFailure::NoJsonObject)?;

    let parsed: Value = serde_json::from_str(&repaired).map_err(|e| {
        tracing::debug!(raw, repaired = repaired.as_str(), "Unparseable model JSON");
        NormalizationFailure::Parse(e.to_string())
    })?;

    match parsed.get(field) {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(NormalizationFailure::NotAnArray(field.to_string())),
        None => Err(NormalizationFailure::MissingField(field.to_string())),
    }
}

/// Normalize a shot-analysis reply.
pub fn normalize_shots(raw: &str, policy: RecordPolicy) -> Normalized<ShotRecord> {
    normalize(raw, SHOTS_FIELD, policy, records::shot_from_value)
}

/// Normalize a lip-flap-analysis reply.
pub fn normalize_lip_flaps(raw: &str, policy: RecordPolicy) -> Normalized<LipFlapRecord> {
    normalize(raw, LIP_FLAPS_FIELD, policy, records::lip_flap_from_value)
}

fn normalize<T>(
    raw: &str,
    field: &str,
    policy: RecordPolicy,
    convert: fn(&Value, RecordPolicy) -> Result<T, String>,
) -> Normalized<T> {
    let items = match extract_array(raw, field) {
        Ok(items) => items,
        Err(failure) => {
            tracing::warn!(
                field,
                reason = failure.reason(),
                error = %failure,
                raw_len = raw.len(),
                "Structured reply normalized to nothing"
            );
            tracing::debug!(field, raw, "Raw structured reply");
            metrics::counter!("normalizer.failures", "field" => field.to_string(), "reason" => failure.reason())
                .increment(1);
            return Normalized::failed(failure);
        }
    };

    let mut records = Vec::with_capacity(items.len());
    let mut rejected = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match convert(item, policy) {
            Ok(record) => records.push(record),
            Err(reason) => {
                tracing::warn!(field, index, reason = reason.as_str(), "Rejected structured record");
                rejected.push(RecordRejection { index, reason });
            }
        }
    }

    if !rejected.is_empty() {
        metrics::counter!("normalizer.records_rejected", "field" => field.to_string())
            .increment(rejected.len() as u64);
    }

    Normalized {
        records,
        failure: None,
        rejected,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use reelscope_common::types::{CameraMovement, CharacterActivity, Eyeline, ShotType};

    const CLEAN_SHOTS: &str = r#"{
        "shots": [
            {
                "id": "shot-1",
                "timestamp": "[00:00-00:04]",
                "shotType": "establishing",
                "frameSize": "extreme-wide",
                "movement": "crane",
                "cameraRig": "drone",
                "angle": "birds-eye",
                "lensDepth": "deep",
                "eyeline": "none",
                "primaryCharacter": "none",
                "characters": []
            },
            {
                "id": "shot-2",
                "timestamp": "[00:04-00:09]",
                "shotType": "over-the-shoulder",
                "frameSize": "medium-close-up",
                "movement": "static",
                "cameraRig": "tripod",
                "angle": "eye-level",
                "lensDepth": "shallow",
                "eyeline": "left-of-lens",
                "primaryCharacter": "Ana",
                "characters": [
                    {"character": "Ana", "action": "talking-onscreen"},
                    {"character": "Ben", "action": "listening"}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_clean_json_parses_unchanged() {
        let out = normalize_shots(CLEAN_SHOTS, RecordPolicy::RejectRecord);
        assert!(out.failure.is_none());
        assert!(out.rejected.is_empty());
        assert_eq!(out.records.len(), 2);

        let expected: Value = serde_json::from_str(CLEAN_SHOTS).unwrap();
        let actual = serde_json::to_value(&out.records).unwrap();
        assert_eq!(actual, expected["shots"]);
    }

    #[test]
    fn test_fenced_json_matches_unfenced() {
        let plain = normalize_shots(CLEAN_SHOTS, RecordPolicy::RejectRecord);
        let tagged = normalize_shots(
            &format!("```json\n{}\n```", CLEAN_SHOTS),
            RecordPolicy::RejectRecord,
        );
        let untagged = normalize_shots(
            &format!("Here is the analysis:\n```\n{}\n```", CLEAN_SHOTS),
            RecordPolicy::RejectRecord,
        );
        assert_eq!(plain, tagged);
        assert_eq!(plain, untagged);
    }

    #[test]
    fn test_unquoted_enum_values_are_repaired() {
        let raw = CLEAN_SHOTS
            .replace(r#""movement": "static""#, r#""movement": static"#)
            .replace(r#""shotType": "establishing""#, "shotType: establishing");
        let out = normalize_shots(&raw, RecordPolicy::RejectRecord);

        assert!(out.failure.is_none());
        assert_eq!(out.records[0].shot_type, ShotType::Establishing);
        assert_eq!(out.records[1].movement, CameraMovement::Static);
    }

    #[test]
    fn test_trailing_commas_are_repaired() {
        let raw = r#"{"lipFlaps": [
            {"timestamp": "[00:01-00:03]", "character": "Ana", "confidence": 92,},
            {"timestamp": "[00:05-00:06]", "character": "Ben", "confidence": 40, "note": "dubbed, late",},
        ],}"#;
        let out = normalize_lip_flaps(raw, RecordPolicy::RejectRecord);

        assert!(out.failure.is_none());
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[1].note.as_deref(), Some("dubbed, late"));
    }

    #[test]
    fn test_no_object_fails_closed() {
        for raw in ["", "Sorry, I cannot help with that.", "{ never closed", "closed }"] {
            let out = normalize_shots(raw, RecordPolicy::RejectRecord);
            assert!(out.records.is_empty());
            assert_eq!(out.failure, Some(NormalizationFailure::NoJsonObject));
        }
    }

    #[test]
    fn test_unparseable_json_fails_closed() {
        let out = normalize_shots("{\"shots\": [ {\"id\" \"x\"} ]}", RecordPolicy::RejectRecord);
        assert!(out.records.is_empty());
        assert!(matches!(out.failure, Some(NormalizationFailure::Parse(_))));
    }

    #[test]
    fn test_missing_or_mistyped_array_fails_closed() {
        let out = normalize_shots(r#"{"scenes": []}"#, RecordPolicy::RejectRecord);
        assert_eq!(
            out.failure,
            Some(NormalizationFailure::MissingField("shots".into()))
        );

        let out = normalize_lip_flaps(r#"{"lipFlaps": "none"}"#, RecordPolicy::RejectRecord);
        assert_eq!(
            out.failure,
            Some(NormalizationFailure::NotAnArray("lipFlaps".into()))
        );
    }

    #[test]
    fn test_extract_array_is_shared_by_field_name() {
        let raw = r#"{shots: [1], lipFlaps: [2, 3]}"#;
        assert_eq!(extract_array(raw, "shots").unwrap().len(), 1);
        assert_eq!(extract_array(raw, "lipFlaps").unwrap().len(), 2);
    }

    #[test]
    fn test_reject_policy_drops_only_bad_records() {
        let raw = CLEAN_SHOTS.replace(r#""movement": "crane""#, r#""movement": "teleport""#);
        let out = normalize_shots(&raw, RecordPolicy::RejectRecord);

        assert!(out.failure.is_none());
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].id, "shot-2");
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].index, 0);
        assert!(out.rejected[0].reason.contains("teleport"));
    }

    #[test]
    fn test_overflowing_timestamp_rejects_record() {
        let raw = CLEAN_SHOTS.replace("[00:00-00:04]", "[99999999:00-99999999:00]");
        let out = normalize_shots(&raw, RecordPolicy::RejectRecord);

        assert!(out.failure.is_none());
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].id, "shot-2");
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].index, 0);
        assert!(out.rejected[0].reason.contains("timestamp"));
    }

    #[test]
    fn test_coerce_policy_keeps_records_with_sentinel() {
        let raw = CLEAN_SHOTS
            .replace(r#""movement": "crane""#, r#""movement": "teleport""#)
            .replace(r#""action": "listening""#, r#""action": "sleeping""#);
        let out = normalize_shots(&raw, RecordPolicy::CoerceUnknown);

        assert!(out.rejected.is_empty());
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].movement, CameraMovement::Unknown);
        assert_eq!(out.records[0].eyeline, Eyeline::Absent);
        assert_eq!(
            out.records[1].characters[1].action,
            CharacterActivity::Unknown
        );
    }

    #[test]
    fn test_into_records_is_none_when_empty() {
        let out = normalize_shots(r#"{"shots": []}"#, RecordPolicy::RejectRecord);
        assert!(!out.is_failed());
        assert_eq!(out.into_records(), None);
    }
}

use reelscope_common::config::RecordPolicy;
use reelscope_common::types::{
    format_time_range, parse_time_range, CameraAngle, CameraMovement, CameraRig, CharacterAction,
    CharacterActivity, Eyeline, FrameSize, LensDepth, LipFlapRecord, ShotRecord, ShotType,
};
use serde_json::{Map, Value};

/// One array element that did not become a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordRejection {
    /// Position in the model's array.
    pub index: usize,
    pub reason: String,
}

/// Field reader that gathers every problem with a record instead of stopping
/// at the first one. Under `CoerceUnknown` problems are tolerated and the
/// offending field falls back to a sentinel.
struct Fields<'a> {
    object: &'a Map<String, Value>,
    problems: Vec<String>,
}

impl<'a> Fields<'a> {
    fn of(value: &'a Value) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| format!("expected an object, got {}", kind(value)))?;
        Ok(Self {
            object,
            problems: Vec::new(),
        })
    }

    /// Look a field up by its camelCase name, falling back to snake_case.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.object
            .get(key)
            .or_else(|| self.object.get(&to_snake_case(key)))
            .filter(|v| !v.is_null())
    }

    fn text(&mut self, key: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                self.problems
                    .push(format!("`{}` should be text, got {}", key, kind(other)));
                String::new()
            }
            None => {
                self.problems.push(format!("missing `{}`", key));
                String::new()
            }
        }
    }

    fn optional_text(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    fn vocab<T: Copy>(&mut self, key: &str, parse: fn(&str) -> Option<T>, unknown: T) -> T {
        match self.get(key) {
            Some(Value::String(s)) => parse(s).unwrap_or_else(|| {
                self.problems
                    .push(format!("unrecognized `{}` value \"{}\"", key, s));
                unknown
            }),
            Some(other) => {
                self.problems
                    .push(format!("`{}` should be text, got {}", key, kind(other)));
                unknown
            }
            None => {
                self.problems.push(format!("missing `{}`", key));
                unknown
            }
        }
    }

    fn finish<T>(self, record: T, policy: RecordPolicy) -> Result<T, String> {
        if self.problems.is_empty() {
            return Ok(record);
        }

        match policy {
            RecordPolicy::RejectRecord => Err(self.problems.join("; ")),
            RecordPolicy::CoerceUnknown => {
                tracing::debug!(problems = %self.problems.join("; "), "Coerced structured record");
                Ok(record)
            }
        }
    }
}

pub(super) fn shot_from_value(value: &Value, policy: RecordPolicy) -> Result<ShotRecord, String> {
    let mut fields = Fields::of(value)?;

    let id = fields.text("id");
    let timestamp = fields.text("timestamp");
    let timestamp = match parse_time_range(&timestamp) {
        Some((start, end)) => format_time_range(start, end),
        None => {
            fields
                .problems
                .push(format!("`timestamp` \"{}\" is not [MM:SS-MM:SS]", timestamp));
            timestamp
        }
    };

    let shot_type = fields.vocab("shotType", ShotType::parse, ShotType::Unknown);
    let frame_size = fields.vocab("frameSize", FrameSize::parse, FrameSize::Unknown);
    let movement = fields.vocab("movement", CameraMovement::parse, CameraMovement::Unknown);
    let camera_rig = fields.vocab("cameraRig", CameraRig::parse, CameraRig::Unknown);
    let angle = fields.vocab("angle", CameraAngle::parse, CameraAngle::Unknown);
    let lens_depth = fields.vocab("lensDepth", LensDepth::parse, LensDepth::Unknown);
    let eyeline = fields.vocab("eyeline", Eyeline::parse, Eyeline::Unknown);
    let primary_character = fields.text("primaryCharacter");
    let characters = characters(&mut fields);

    let record = ShotRecord {
        id,
        timestamp,
        shot_type,
        frame_size,
        movement,
        camera_rig,
        angle,
        lens_depth,
        eyeline,
        primary_character,
        characters,
    };
    fields.finish(record, policy)
}

fn characters(fields: &mut Fields<'_>) -> Vec<CharacterAction> {
    let items = match fields.get("characters") {
        None => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            fields
                .problems
                .push(format!("`characters` should be an array, got {}", kind(other)));
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let mut entry = match Fields::of(item) {
            Ok(entry) => entry,
            Err(reason) => {
                fields.problems.push(format!("characters[{}]: {}", i, reason));
                continue;
            }
        };

        let character = entry.text("character");
        let action = entry.vocab(
            "action",
            CharacterActivity::parse,
            CharacterActivity::Unknown,
        );
        fields.problems.extend(
            entry
                .problems
                .into_iter()
                .map(|p| format!("characters[{}]: {}", i, p)),
        );
        out.push(CharacterAction { character, action });
    }
    out
}

pub(super) fn lip_flap_from_value(
    value: &Value,
    policy: RecordPolicy,
) -> Result<LipFlapRecord, String> {
    let mut fields = Fields::of(value)?;

    let timestamp = fields.text("timestamp");
    let character = fields.text("character");
    let confidence = confidence(&mut fields);
    let note = fields.optional_text("note");

    let record = LipFlapRecord {
        timestamp,
        character,
        confidence,
        note,
    };
    fields.finish(record, policy)
}

/// Integer 0-100. Fractions round; numeric strings and `"85%"` are accepted.
/// Out-of-range values are a problem, clamped when coerced.
fn confidence(fields: &mut Fields<'_>) -> u8 {
    let max = f64::from(LipFlapRecord::MAX_CONFIDENCE);

    let raw = match fields.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };

    let Some(raw) = raw.filter(|v| v.is_finite()) else {
        fields.problems.push("missing or non-numeric `confidence`".into());
        return 0;
    };

    let rounded = raw.round();
    if !(0.0..=max).contains(&rounded) {
        fields
            .problems
            .push(format!("`confidence` {} is outside 0-100", raw));
    }
    rounded.clamp(0.0, max) as u8
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shot() -> Value {
        json!({
            "id": 3,
            "timestamp": "0:05-0:10",
            "shot_type": "Two Shot",
            "frameSize": "CLOSE_UP",
            "movement": "pan",
            "cameraRig": "gimbal",
            "angle": "low",
            "lensDepth": "rack focus",
            "eyeline": "into-lens",
            "primaryCharacter": "Ana",
        })
    }

    #[test]
    fn test_lenient_spelling_and_aliases() {
        let record = shot_from_value(&shot(), RecordPolicy::RejectRecord).unwrap();
        assert_eq!(record.id, "3");
        assert_eq!(record.timestamp, "[00:05-00:10]");
        assert_eq!(record.shot_type, ShotType::TwoShot);
        assert_eq!(record.frame_size, FrameSize::CloseUp);
        assert_eq!(record.lens_depth, LensDepth::RackFocus);
        assert!(record.characters.is_empty());
    }

    #[test]
    fn test_reject_reports_every_problem() {
        let mut value = shot();
        value["angle"] = json!("sideways");
        value["timestamp"] = json!("opening");
        value["characters"] = json!([{"character": "Ana", "action": "dancing"}, "Ben"]);

        let reason = shot_from_value(&value, RecordPolicy::RejectRecord).unwrap_err();
        assert!(reason.contains("sideways"));
        assert!(reason.contains("opening"));
        assert!(reason.contains("characters[0]"));
        assert!(reason.contains("characters[1]: expected an object"));
    }

    #[test]
    fn test_unknown_is_not_a_vocabulary_value() {
        let mut value = shot();
        value["movement"] = json!("unknown");
        assert!(shot_from_value(&value, RecordPolicy::RejectRecord).is_err());

        let coerced = shot_from_value(&value, RecordPolicy::CoerceUnknown).unwrap();
        assert_eq!(coerced.movement, CameraMovement::Unknown);
    }

    #[test]
    fn test_non_object_dropped_under_both_policies() {
        assert!(shot_from_value(&json!("shot"), RecordPolicy::CoerceUnknown).is_err());
        assert!(lip_flap_from_value(&json!(7), RecordPolicy::CoerceUnknown).is_err());
    }

    #[test]
    fn test_confidence_parsing() {
        let parse = |c: Value, policy| {
            lip_flap_from_value(
                &json!({"timestamp": "00:03", "character": "Ana", "confidence": c}),
                policy,
            )
        };

        assert_eq!(parse(json!(87.6), RecordPolicy::RejectRecord).unwrap().confidence, 88);
        assert_eq!(parse(json!("85%"), RecordPolicy::RejectRecord).unwrap().confidence, 85);
        assert!(parse(json!(140), RecordPolicy::RejectRecord).is_err());
        assert!(parse(json!("high"), RecordPolicy::RejectRecord).is_err());
        assert_eq!(parse(json!(140), RecordPolicy::CoerceUnknown).unwrap().confidence, 100);
        assert_eq!(parse(json!(-5), RecordPolicy::CoerceUnknown).unwrap().confidence, 0);
    }

    #[test]
    fn test_blank_note_is_dropped() {
        let record = lip_flap_from_value(
            &json!({"timestamp": "00:03", "character": "Ana", "confidence": 50, "note": "  "}),
            RecordPolicy::RejectRecord,
        )
        .unwrap();
        assert_eq!(record.note, None);
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("primaryCharacter"), "primary_character");
        assert_eq!(to_snake_case("id"), "id");
    }
}

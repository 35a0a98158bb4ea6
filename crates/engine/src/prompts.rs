use std::collections::HashMap;

use reelscope_common::types::{
    CameraAngle, CameraMovement, CameraRig, CharacterActivity, Eyeline, Facet, FrameSize,
    LensDepth, ShotType,
};

use crate::normalizer::{LIP_FLAPS_FIELD, SHOTS_FIELD};

const SUMMARY: &str = "Provide a concise summary of this video. Describe the main subject, \
the key events in order, and the overall tone. Answer in plain prose.";

const TRANSCRIPTION: &str = "Transcribe all spoken words in this video. Label each speaker \
when more than one person speaks and prefix each line with its [MM:SS] timestamp. If nothing \
is spoken, say so.";

const VISUAL_DESCRIPTION: &str = "Describe the visual content of this video in detail: \
settings, people, objects, colours, lighting, on-screen text and notable visual changes over \
time.";

/// Instruction text for every facet.
///
/// Built-in instructions can be replaced per facet from configuration. The
/// per-request custom prompt only ever replaces the summary instruction.
#[derive(Clone, Debug)]
pub struct PromptCatalog {
    instructions: HashMap<Facet, String>,
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptCatalog {
    pub fn builtin() -> Self {
        let instructions = Facet::ORDER
            .into_iter()
            .map(|facet| (facet, builtin_instruction(facet)))
            .collect();
        Self { instructions }
    }

    /// Built-ins with configured replacements layered on top.
    pub fn with_overrides(overrides: &HashMap<Facet, String>) -> Self {
        let mut catalog = Self::builtin();
        for (facet, text) in overrides {
            if text.trim().is_empty() {
                continue;
            }
            tracing::debug!(facet = %facet, "Using configured instruction");
            catalog.instructions.insert(*facet, text.clone());
        }
        catalog
    }

    /// The instruction to send for `facet`.
    pub fn instruction<'a>(&'a self, facet: Facet, custom_prompt: Option<&'a str>) -> &'a str {
        if facet == Facet::Summary {
            if let Some(custom) = custom_prompt.map(str::trim).filter(|c| !c.is_empty()) {
                return custom;
            }
        }
        self.instructions
            .get(&facet)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

fn builtin_instruction(facet: Facet) -> String {
    match facet {
        Facet::Summary => SUMMARY.to_string(),
        Facet::Transcription => TRANSCRIPTION.to_string(),
        Facet::VisualDescription => VISUAL_DESCRIPTION.to_string(),
        Facet::ShotAnalysis => shot_contract(),
        Facet::LipFlapAnalysis => lip_flap_contract(),
    }
}

fn allowed(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("\"{}\"", v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shot instruction. The allowed values come from the vocabularies the
/// Normalizer validates against.
fn shot_contract() -> String {
    format!(
        r#"Break this video into individual camera shots and tag each one.

Respond with ONLY a JSON object, no prose before or after it and no code fences. Use double quotes for every key and every string value and no trailing commas. The object has exactly one key, "{field}", holding the shots in playback order:

{{"{field}": [{{
  "id": "shot-1",
  "timestamp": "[MM:SS-MM:SS]",
  "shotType": one of [{shot_type}],
  "frameSize": one of [{frame_size}],
  "movement": one of [{movement}],
  "cameraRig": one of [{camera_rig}],
  "angle": one of [{angle}],
  "lensDepth": one of [{lens_depth}],
  "eyeline": one of [{eyeline}],
  "primaryCharacter": "name of the main character in frame, or \"none\"",
  "characters": [{{"character": "name", "action": one of [{action}]}}]
}}]}}

Use only the listed values for the tagged fields."#,
        field = SHOTS_FIELD,
        shot_type = allowed(ShotType::wire_values()),
        frame_size = allowed(FrameSize::wire_values()),
        movement = allowed(CameraMovement::wire_values()),
        camera_rig = allowed(CameraRig::wire_values()),
        angle = allowed(CameraAngle::wire_values()),
        lens_depth = allowed(LensDepth::wire_values()),
        eyeline = allowed(Eyeline::wire_values()),
        action = allowed(CharacterActivity::wire_values()),
    )
}

fn lip_flap_contract() -> String {
    format!(
        r#"Analyze lip sync in this video: for each stretch where a character's mouth is visible while speech is heard, judge how well the audio matches the mouth movement.

Respond with ONLY a JSON object, no prose and no code fences, double-quoted keys and strings, no trailing commas:

{{"{field}": [{{"timestamp": "[MM:SS-MM:SS]", "character": "name", "confidence": integer 0-100 where 100 means a perfect match, "note": "optional remark"}}]}}"#,
        field = LIP_FLAPS_FIELD,
    )
}

use serde::{Deserialize, Serialize};

use crate::vocabulary::define_vocabulary;

define_vocabulary!(ShotType, "Editorial role of a shot.", {
    Establishing => "establishing",
    Master => "master",
    Single => "single",
    Clean => "clean",
    Dirty => "dirty",
    TwoShot => "two-shot",
    Group => "group",
    OverTheShoulder => "over-the-shoulder",
    Pov => "pov",
    Insert => "insert",
    Cutaway => "cutaway",
    Reaction => "reaction",
});

define_vocabulary!(FrameSize, "How much of the subject the frame holds.", {
    ExtremeWide => "extreme-wide",
    Wide => "wide",
    Full => "full",
    MediumWide => "medium-wide",
    Medium => "medium",
    MediumCloseUp => "medium-close-up",
    CloseUp => "close-up",
    ExtremeCloseUp => "extreme-close-up",
});

define_vocabulary!(CameraMovement, "Camera motion during the shot.", {
    Static => "static",
    Pan => "pan",
    Tilt => "tilt",
    Dolly => "dolly",
    Truck => "truck",
    Pedestal => "pedestal",
    Zoom => "zoom",
    Tracking => "tracking",
    Crane => "crane",
    Handheld => "handheld",
    Arc => "arc",
});

define_vocabulary!(CameraRig, "What the camera is mounted on.", {
    Tripod => "tripod",
    Handheld => "handheld",
    Shoulder => "shoulder",
    Steadicam => "steadicam",
    Gimbal => "gimbal",
    Dolly => "dolly",
    Slider => "slider",
    Crane => "crane",
    Drone => "drone",
    Vehicle => "vehicle",
});

define_vocabulary!(CameraAngle, "Vertical relationship between camera and subject.", {
    EyeLevel => "eye-level",
    High => "high",
    Low => "low",
    Overhead => "overhead",
    BirdsEye => "birds-eye",
    WormsEye => "worms-eye",
    Dutch => "dutch",
});

define_vocabulary!(LensDepth, "Depth of field.", {
    Shallow => "shallow",
    Medium => "medium",
    Deep => "deep",
    RackFocus => "rack-focus",
});

define_vocabulary!(Eyeline, "Where the primary character looks relative to the lens.", {
    LeftOfLens => "left-of-lens",
    RightOfLens => "right-of-lens",
    IntoLens => "into-lens",
    AboveLens => "above-lens",
    BelowLens => "below-lens",
    OffScreen => "off-screen",
    Absent => "none",
});

define_vocabulary!(CharacterActivity, "What a character is doing in the shot.", {
    TalkingOnscreen => "talking-onscreen",
    TalkingOffscreen => "talking-offscreen",
    Listening => "listening",
    Silent => "silent",
});

/// A character visible or audible in a shot and what they are doing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterAction {
    pub character: String,
    pub action: CharacterActivity,
}

/// One detected camera shot with its cinematography tags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotRecord {
    pub id: String,
    /// Bracketed `[MM:SS-MM:SS]` range.
    pub timestamp: String,
    pub shot_type: ShotType,
    pub frame_size: FrameSize,
    pub movement: CameraMovement,
    pub camera_rig: CameraRig,
    pub angle: CameraAngle,
    pub lens_depth: LensDepth,
    pub eyeline: Eyeline,
    pub primary_character: String,
    #[serde(default)]
    pub characters: Vec<CharacterAction>,
}

impl ShotRecord {
    /// Start and end in seconds, when the timestamp is well formed.
    pub fn time_range(&self) -> Option<(u32, u32)> {
        parse_time_range(&self.timestamp)
    }
}

/// Parse `[MM:SS-MM:SS]` (brackets optional) into start/end seconds.
/// The end must not precede the start.
pub fn parse_time_range(raw: &str) -> Option<(u32, u32)> {
    let inner = raw.trim();
    let inner = inner.strip_prefix('[').unwrap_or(inner);
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    let (start, end) = inner.split_once('-')?;

    let start = parse_clock(start)?;
    let end = parse_clock(end)?;
    (end >= start).then_some((start, end))
}

/// Render seconds as a bracketed `[MM:SS-MM:SS]` range.
pub fn format_time_range(start: u32, end: u32) -> String {
    format!("[{}-{}]", format_clock(start), format_clock(end))
}

fn parse_clock(raw: &str) -> Option<u32> {
    let (mins, secs) = raw.trim().split_once(':')?;
    let mins: u32 = mins.parse().ok()?;
    let secs: u32 = secs.parse().ok()?;
    if secs >= 60 {
        return None;
    }
    mins.checked_mul(60)?.checked_add(secs)
}

fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

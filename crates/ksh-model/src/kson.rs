// KSON document data structures (serde serialization)
//
// Optional fields follow the format's presence rules: omitted entirely
// rather than serialized as null/zero.

use serde::{Deserialize, Serialize};

use crate::chart::{BT_LANES, FX_LANES, LASER_LANES};

/// Root KSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kson {
    /// `"ksh <version>"`, or `"ksh"` when the source carries no version
    pub version: String,
    pub meta: MetaInfo,
    pub beat: BeatInfo,
    pub note: NoteInfo,
    pub audio: AudioInfo,
    pub camera: CameraInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gauge: Option<GaugeInfo>,
}

/// Chart information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub chart_author: String,
    pub difficulty: DifficultyInfo,
    /// 1-20
    pub level: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub disp_bpm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_bpm: Option<f64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jacket_filename: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jacket_author: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub information: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DifficultyInfo {
    /// Raw difficulty name from the source, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 0 light, 1 challenge, 2 extended, 3 infinite
    pub idx: u8,
}

/// Tick timeline: BPM and time-signature breakpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatInfo {
    #[serde(default)]
    pub bpm: Vec<BpmEvent>,
    #[serde(default)]
    pub time_sig: Vec<TimeSigEvent>,
    /// Ticks per quarter note
    pub resolution: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BpmEvent {
    /// Absolute tick
    pub y: u32,
    /// BPM
    pub v: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSigEvent {
    /// Originating measure index
    pub idx: usize,
    pub v: TimeSig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSig {
    pub n: u32,
    pub d: u32,
}

/// Per-lane note data: 4 BT + 2 FX button lists, 2 laser section lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteInfo {
    pub bt: [Vec<ButtonNote>; BT_LANES],
    pub fx: [Vec<ButtonNote>; FX_LANES],
    pub laser: [Vec<LaserSection>; LASER_LANES],
}

/// Chip (`l == 0`) or hold (`l > 0`) button note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonNote {
    /// Absolute tick
    pub y: u32,
    /// Hold length in ticks
    #[serde(default, skip_serializing_if = "is_zero")]
    pub l: u32,
}

impl ButtonNote {
    pub fn chip(y: u32) -> Self {
        Self { y, l: 0 }
    }

    pub fn hold(y: u32, l: u32) -> Self {
        Self { y, l }
    }

    pub fn is_hold(&self) -> bool {
        self.l > 0
    }
}

/// One continuous laser motion.
///
/// The section's `y` is the absolute tick of its first point (whose `ry` is
/// 0); later points carry offsets from `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserSection {
    /// Absolute start tick
    pub y: u32,
    pub v: Vec<LaserPoint>,
    /// True when a 2x laser-range modifier was active at section start
    #[serde(default, skip_serializing_if = "is_false")]
    pub wide: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserPoint {
    /// Tick offset from the section start
    pub ry: u32,
    /// Position in [0, 1]
    pub v: f64,
    /// Slam end position, present only for collapsed near-instant glides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vf: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub bgm: BgmInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BgmInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filename: String,
    /// Present only when != 100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vol: Option<i32>,
    /// Present only when != 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i32>,
    /// Present only when >= 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_offset: Option<i32>,
    /// Present only when >= 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_duration: Option<i32>,
}

/// Reserved; rotation tags are parsed but not yet emitted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeInfo {
    /// Gauge total percentage, floor-clamped to 100
    pub total: i64,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Ticks per quarter note.
pub const KSON_RESOLUTION: u32 = 48;

/// Ticks in one 4/4 measure.
pub const TICKS_PER_MEASURE: u32 = KSON_RESOLUTION * 4;

pub const BT_LANES: usize = 4;
pub const FX_LANES: usize = 2;
pub const LASER_LANES: usize = 2;

/// A `key=value` option line attached to the note line that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub key: String,
    pub value: String,
}

/// Lane spin triggered by a laser slam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinKind {
    /// `@(` — full spin, counterclockwise
    CircleLeft,
    /// `@)` — full spin, clockwise
    CircleRight,
    /// `@<` — half spin, counterclockwise
    HalfLeft,
    /// `@>` — half spin, clockwise
    HalfRight,
    /// `S<` — swing, counterclockwise
    SwingLeft,
    /// `S>` — swing, clockwise
    SwingRight,
}

/// Rotation tag trailing a note line: spin kind plus its length parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinTag {
    pub kind: SpinKind,
    pub length: u32,
}

/// One note line of a measure.
///
/// `tick` and `len` are derived annotations: the classifier leaves them at
/// zero and the timing resolver fills them exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KshLine {
    /// BT glyphs, one byte per lane (`0` empty, `1` press, `2` hold)
    pub bt: [u8; BT_LANES],
    /// FX glyphs, one byte per lane (`0` empty, `1` hold, `2` press)
    pub fx: [u8; FX_LANES],
    /// Laser glyphs (`-` off, `:` continue, else alphabet position)
    pub laser: [u8; LASER_LANES],
    pub spin: Option<SpinTag>,
    pub mods: Vec<Modifier>,
    /// Absolute tick, assigned by the timing resolver
    pub tick: u32,
    /// Tick length of this line, assigned by the timing resolver
    pub len: u32,
}

impl KshLine {
    pub fn new(
        bt: [u8; BT_LANES],
        fx: [u8; FX_LANES],
        laser: [u8; LASER_LANES],
        spin: Option<SpinTag>,
        mods: Vec<Modifier>,
    ) -> Self {
        Self {
            bt,
            fx,
            laser,
            spin,
            mods,
            tick: 0,
            len: 0,
        }
    }
}

/// One measure: an ordered run of note lines subdividing its tick span evenly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub lines: Vec<KshLine>,
}

/// Chart as produced by the line classifier: header table plus body measures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KshChart {
    pub meta: HashMap<String, String>,
    pub measures: Vec<Measure>,
}

impl KshChart {
    /// Header value lookup, empty string when absent.
    pub fn meta_str(&self, key: &str) -> &str {
        self.meta.get(key).map(String::as_str).unwrap_or("")
    }
}

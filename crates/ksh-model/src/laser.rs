use crate::chart::{KshChart, LASER_LANES};
use crate::error::ConvertError;
use crate::kson::{LaserPoint, LaserSection};

/// The 55 laser position glyphs in ascending order.
pub const LASER_ALPHABET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrs";

/// Samples closer than this to the previous recorded point collapse into it
/// as a slam.
pub const SLAM_WINDOW: u32 = 6;

/// Open laser section accumulator for one lane.
#[derive(Debug, Clone)]
struct OpenSection {
    start: u32,
    points: Vec<LaserPoint>,
    wide: bool,
    /// Absolute tick of the last recorded (non-collapsed) point
    last_tick: u32,
}

impl OpenSection {
    fn new(tick: u32, v: f64, wide: bool) -> Self {
        Self {
            start: tick,
            points: vec![LaserPoint { ry: 0, v, vf: None }],
            wide,
            last_tick: tick,
        }
    }

    fn sample(&mut self, tick: u32, v: f64) {
        if tick - self.last_tick <= SLAM_WINDOW {
            // near-instant glide: fold into the previous point's final value
            if let Some(last) = self.points.last_mut() {
                last.vf = Some(v);
            }
        } else {
            self.points.push(LaserPoint {
                ry: tick - self.start,
                v,
                vf: None,
            });
            self.last_tick = tick;
        }
    }

    fn finish(self) -> LaserSection {
        LaserSection {
            y: self.start,
            v: self.points,
            wide: self.wide,
        }
    }
}

/// Decode laser glyphs into per-lane compressed section lists.
///
/// `-` closes the lane's open section, `:` holds the previous value, any
/// alphabet glyph records a sample (subject to slam collapse). The width
/// multiplier set by `laserrange_l`/`laserrange_r` modifiers is latched at
/// section start.
pub fn build_lasers(chart: &KshChart) -> Result<[Vec<LaserSection>; LASER_LANES], ConvertError> {
    let mut out: [Vec<LaserSection>; LASER_LANES] = Default::default();
    let mut open: [Option<OpenSection>; LASER_LANES] = [None, None];
    let mut wide = [false; LASER_LANES];

    for measure in &chart.measures {
        for line in &measure.lines {
            for m in &line.mods {
                match m.key.as_str() {
                    "laserrange_l" => wide[0] = m.value == "2x",
                    "laserrange_r" => wide[1] = m.value == "2x",
                    _ => {}
                }
            }

            for lane in 0..LASER_LANES {
                match line.laser[lane] {
                    b'-' => {
                        if let Some(section) = open[lane].take() {
                            out[lane].push(section.finish());
                        }
                    }
                    b':' => {}
                    glyph => {
                        let v = glyph_value(glyph, line.tick)?;
                        match &mut open[lane] {
                            Some(section) => section.sample(line.tick, v),
                            None => open[lane] = Some(OpenSection::new(line.tick, v, wide[lane])),
                        }
                    }
                }
            }
        }
    }

    for lane in 0..LASER_LANES {
        if let Some(section) = open[lane].take() {
            out[lane].push(section.finish());
        }
    }

    Ok(out)
}

/// Normalized position of an alphabet glyph.
fn glyph_value(glyph: u8, tick: u32) -> Result<f64, ConvertError> {
    let index = LASER_ALPHABET
        .bytes()
        .position(|b| b == glyph)
        .ok_or(ConvertError::Decode {
            tick,
            glyph: glyph as char,
        })?;
    Ok(index as f64 / (LASER_ALPHABET.len() - 1) as f64)
}

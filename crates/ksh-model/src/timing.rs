use log::debug;

use crate::chart::{KshChart, TICKS_PER_MEASURE};
use crate::error::ConvertError;
use crate::kson::{BpmEvent, TimeSig, TimeSigEvent};

/// Resolved tick timeline for a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub bpm: Vec<BpmEvent>,
    pub time_sig: Vec<TimeSigEvent>,
    /// Sum of all measure lengths
    pub total_ticks: u32,
}

/// Running state of the measure fold: tick offset plus active signature.
#[derive(Debug, Clone, Copy)]
struct TimingState {
    offset: u32,
    sig: TimeSig,
}

/// Assign every line its absolute tick and tick length, collecting BPM and
/// time-signature breakpoints along the way.
///
/// Left-to-right fold over measures: each measure's offset depends on all
/// prior measure lengths, so the walk is inherently sequential.
pub fn resolve(chart: &mut KshChart) -> Result<Timeline, ConvertError> {
    let mut state = TimingState {
        offset: 0,
        sig: TimeSig { n: 4, d: 4 },
    };
    let mut bpm: Vec<BpmEvent> = Vec::new();
    let mut time_sig: Vec<TimeSigEvent> = Vec::new();

    // Header-level overrides apply at tick 0.
    if let Some(value) = chart.meta.get("beat") {
        state.sig = parse_time_sig(value, 0)?;
    }
    time_sig.push(TimeSigEvent {
        idx: 0,
        v: state.sig,
    });
    if let Some(value) = chart.meta.get("t")
        && let Ok(v) = value.parse::<f64>()
        && v.is_finite()
        && v > 0.0
    {
        bpm.push(BpmEvent { y: 0, v });
    }

    for (measure_idx, measure) in chart.measures.iter_mut().enumerate() {
        // Time-signature modifiers are legal only on the first line.
        for (i, line) in measure.lines.iter().enumerate() {
            for m in line.mods.iter().filter(|m| m.key == "beat") {
                if i != 0 {
                    return Err(ConvertError::Timing {
                        measure: measure_idx,
                        message: format!("time signature {:?} not on first line of measure", m.value),
                    });
                }
                state.sig = parse_time_sig(&m.value, measure_idx)?;
                match time_sig.last_mut() {
                    Some(last) if last.idx == measure_idx => last.v = state.sig,
                    _ => time_sig.push(TimeSigEvent {
                        idx: measure_idx,
                        v: state.sig,
                    }),
                }
            }
        }

        let measure_len = (TICKS_PER_MEASURE / state.sig.d) * state.sig.n;
        let line_count = measure.lines.len() as u32;
        if line_count == 0 {
            // empty measure still occupies its tick span
            state.offset += measure_len;
            continue;
        }
        if measure_len % line_count != 0 {
            return Err(ConvertError::Timing {
                measure: measure_idx,
                message: format!("{line_count} lines cannot divide {measure_len} ticks evenly"),
            });
        }
        let tick_per_line = measure_len / line_count;

        for (i, line) in measure.lines.iter_mut().enumerate() {
            line.tick = state.offset + i as u32 * tick_per_line;
            line.len = tick_per_line;

            for m in &line.mods {
                match m.key.as_str() {
                    "t" => {
                        let v = parse_positive(&m.key, &m.value)?;
                        match bpm.last_mut() {
                            Some(last) if last.y == line.tick => last.v = v,
                            _ => bpm.push(BpmEvent { y: line.tick, v }),
                        }
                    }
                    "stop" => {
                        // validated but not carried into the document
                        let ticks = parse_positive(&m.key, &m.value)?;
                        debug!("tick {}: dropping stop of {ticks} ticks", line.tick);
                    }
                    _ => {}
                }
            }
        }

        state.offset += measure_len;
    }

    Ok(Timeline {
        bpm,
        time_sig,
        total_ticks: state.offset,
    })
}

/// Parse `n/d`: two positive integers, `d` dividing the whole-measure span.
fn parse_time_sig(value: &str, measure: usize) -> Result<TimeSig, ConvertError> {
    let malformed = || ConvertError::Timing {
        measure,
        message: format!("malformed time signature {value:?}"),
    };
    let (n, d) = value.split_once('/').ok_or_else(malformed)?;
    let n: u32 = n.trim().parse().map_err(|_| malformed())?;
    let d: u32 = d.trim().parse().map_err(|_| malformed())?;
    if n == 0 || d == 0 {
        return Err(malformed());
    }
    if TICKS_PER_MEASURE % d != 0 {
        return Err(ConvertError::Timing {
            measure,
            message: format!("denominator {d} does not divide {TICKS_PER_MEASURE}"),
        });
    }
    Ok(TimeSig { n, d })
}

/// Parse a modifier value that must be a finite number > 0.
fn parse_positive(key: &str, value: &str) -> Result<f64, ConvertError> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(ConvertError::Value {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

use crate::chart::{KshChart, BT_LANES, FX_LANES};
use crate::kson::ButtonNote;

/// Decoded button lanes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteLanes {
    pub bt: [Vec<ButtonNote>; BT_LANES],
    pub fx: [Vec<ButtonNote>; FX_LANES],
}

/// Open hold accumulator for one lane.
#[derive(Debug, Clone, Copy)]
struct Hold {
    start: u32,
    len: u32,
}

/// Decode button glyphs into per-lane chip/hold event lists.
///
/// One forward pass; each lane's accumulator is private to that lane, so the
/// output lists are ordered by construction. Holds are maximal: consecutive
/// hold glyphs extend the open hold, anything else closes it.
pub fn decode_notes(chart: &KshChart) -> NoteLanes {
    let mut lanes = NoteLanes::default();
    let mut bt_hold: [Option<Hold>; BT_LANES] = [None; BT_LANES];
    let mut fx_hold: [Option<Hold>; FX_LANES] = [None; FX_LANES];

    for measure in &chart.measures {
        for line in &measure.lines {
            for lane in 0..BT_LANES {
                match line.bt[lane] {
                    b'2' => extend(&mut bt_hold[lane], line.tick, line.len),
                    b'1' => {
                        close(&mut bt_hold[lane], &mut lanes.bt[lane]);
                        lanes.bt[lane].push(ButtonNote::chip(line.tick));
                    }
                    _ => close(&mut bt_hold[lane], &mut lanes.bt[lane]),
                }
            }
            for lane in 0..FX_LANES {
                match line.fx[lane] {
                    b'1' => extend(&mut fx_hold[lane], line.tick, line.len),
                    b'2' => {
                        close(&mut fx_hold[lane], &mut lanes.fx[lane]);
                        lanes.fx[lane].push(ButtonNote::chip(line.tick));
                    }
                    _ => close(&mut fx_hold[lane], &mut lanes.fx[lane]),
                }
            }
        }
    }

    for lane in 0..BT_LANES {
        close(&mut bt_hold[lane], &mut lanes.bt[lane]);
    }
    for lane in 0..FX_LANES {
        close(&mut fx_hold[lane], &mut lanes.fx[lane]);
    }

    lanes
}

fn extend(hold: &mut Option<Hold>, tick: u32, len: u32) {
    match hold {
        Some(h) => h.len += len,
        None => *hold = Some(Hold { start: tick, len }),
    }
}

fn close(hold: &mut Option<Hold>, out: &mut Vec<ButtonNote>) {
    if let Some(h) = hold.take() {
        out.push(ButtonNote::hold(h.start, h.len));
    }
}

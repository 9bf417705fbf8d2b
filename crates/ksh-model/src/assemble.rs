use log::debug;

use crate::chart::{KshChart, KSON_RESOLUTION, LASER_LANES};
use crate::error::ConvertError;
use crate::kson::{
    AudioInfo, BeatInfo, BgmInfo, CameraInfo, DifficultyInfo, GaugeInfo, Kson, LaserSection,
    MetaInfo, NoteInfo,
};
use crate::note::NoteLanes;
use crate::timing::Timeline;

/// Merge the resolved pieces into one KSON document.
///
/// Pure assembly: all grid/value validation already happened in the earlier
/// passes, except for the header-only numeric fields checked here.
pub fn assemble(
    chart: &KshChart,
    timeline: Timeline,
    notes: NoteLanes,
    lasers: [Vec<LaserSection>; LASER_LANES],
) -> Result<Kson, ConvertError> {
    Ok(Kson {
        version: version_tag(chart.meta_str("ver")),
        meta: assemble_meta(chart)?,
        beat: BeatInfo {
            bpm: timeline.bpm,
            time_sig: timeline.time_sig,
            resolution: KSON_RESOLUTION,
        },
        note: NoteInfo {
            bt: notes.bt,
            fx: notes.fx,
            laser: lasers,
        },
        audio: AudioInfo {
            bgm: assemble_bgm(chart),
        },
        camera: CameraInfo {},
        gauge: assemble_gauge(chart)?,
    })
}

fn version_tag(ver: &str) -> String {
    match ver.trim() {
        "" => "ksh".to_string(),
        v => format!("ksh {v}"),
    }
}

fn assemble_meta(chart: &KshChart) -> Result<MetaInfo, ConvertError> {
    let std_bpm = match chart.meta.get("to") {
        Some(value) => match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                return Err(ConvertError::Value {
                    key: "to".to_string(),
                    value: value.clone(),
                });
            }
        },
        None => None,
    };

    Ok(MetaInfo {
        title: chart.meta_str("title").to_string(),
        artist: chart.meta_str("artist").to_string(),
        chart_author: chart.meta_str("effect").to_string(),
        difficulty: difficulty_info(chart.meta.get("difficulty")),
        level: chart
            .meta_str("level")
            .parse::<i32>()
            .map(|l| l.clamp(1, 20))
            .unwrap_or(1),
        disp_bpm: chart.meta_str("t").to_string(),
        std_bpm,
        jacket_filename: chart.meta_str("jacket").to_string(),
        jacket_author: chart.meta_str("illustrator").to_string(),
        information: chart.meta_str("information").to_string(),
    })
}

fn difficulty_info(name: Option<&String>) -> DifficultyInfo {
    let idx = match name.map(|n| n.to_ascii_lowercase()).as_deref() {
        Some("light") => 0,
        Some("challenge") => 1,
        Some("extended") => 2,
        _ => 3,
    };
    DifficultyInfo {
        name: name.cloned(),
        idx,
    }
}

fn assemble_bgm(chart: &KshChart) -> BgmInfo {
    // "a.ogg;b.ogg" keeps only the first filename
    let filename = chart
        .meta_str("m")
        .split(';')
        .next()
        .unwrap_or("")
        .to_string();

    BgmInfo {
        filename,
        vol: parse_header_int(chart, "mvol").filter(|&v| v != 100),
        offset: parse_header_int(chart, "o").filter(|&v| v != 0),
        preview_offset: parse_header_int(chart, "po").filter(|&v| v >= 0),
        preview_duration: parse_header_int(chart, "plength").filter(|&v| v >= 0),
    }
}

fn parse_header_int(chart: &KshChart, key: &str) -> Option<i32> {
    let value = chart.meta.get(key)?;
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            debug!("ignoring non-numeric header {key}={value:?}");
            None
        }
    }
}

fn assemble_gauge(chart: &KshChart) -> Result<Option<GaugeInfo>, ConvertError> {
    let Some(value) = chart.meta.get("total") else {
        return Ok(None);
    };
    let total: i64 = value.trim().parse().map_err(|_| ConvertError::Value {
        key: "total".to_string(),
        value: value.clone(),
    })?;
    Ok(Some(GaugeInfo {
        total: total.max(100),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert;

    fn minimal(header: &str) -> Kson {
        let src = format!("{header}\n--\n0000|00|--\n--\n");
        convert(&src).unwrap()
    }

    #[test]
    fn test_version_tag() {
        assert_eq!(minimal("ver=171").version, "ksh 171");
        assert_eq!(minimal("title=x").version, "ksh");
        assert_eq!(minimal("ver= ").version, "ksh");
    }

    #[test]
    fn test_level_clamped() {
        assert_eq!(minimal("level=0").meta.level, 1);
        assert_eq!(minimal("level=99").meta.level, 20);
        assert_eq!(minimal("level=7").meta.level, 7);
        assert_eq!(minimal("level=abc").meta.level, 1);
        assert_eq!(minimal("title=x").meta.level, 1);
    }

    #[test]
    fn test_difficulty_index() {
        assert_eq!(minimal("difficulty=light").meta.difficulty.idx, 0);
        assert_eq!(minimal("difficulty=Challenge").meta.difficulty.idx, 1);
        assert_eq!(minimal("difficulty=EXTENDED").meta.difficulty.idx, 2);
        assert_eq!(minimal("difficulty=infinite").meta.difficulty.idx, 3);
        assert_eq!(minimal("difficulty=custom").meta.difficulty.idx, 3);
        let doc = minimal("title=x");
        assert_eq!(doc.meta.difficulty.idx, 3);
        assert!(doc.meta.difficulty.name.is_none());
        assert_eq!(
            minimal("difficulty=light").meta.difficulty.name.as_deref(),
            Some("light")
        );
    }

    #[test]
    fn test_std_bpm() {
        assert_eq!(minimal("to=148").meta.std_bpm, Some(148.0));
        assert!(minimal("title=x").meta.std_bpm.is_none());
        let err = convert("to=fast\n--\n0000|00|--\n--\n").unwrap_err();
        assert_eq!(err.kind(), "value");
    }

    #[test]
    fn test_bgm_filename_truncated() {
        let doc = minimal("m=song.ogg;song_fx.ogg");
        assert_eq!(doc.audio.bgm.filename, "song.ogg");
    }

    #[test]
    fn test_bgm_defaults_omitted() {
        let doc = minimal("m=song.ogg\nmvol=100\no=0");
        assert!(doc.audio.bgm.vol.is_none());
        assert!(doc.audio.bgm.offset.is_none());
        let doc = minimal("mvol=75\no=-20\npo=4500\nplength=10000");
        assert_eq!(doc.audio.bgm.vol, Some(75));
        assert_eq!(doc.audio.bgm.offset, Some(-20));
        assert_eq!(doc.audio.bgm.preview_offset, Some(4500));
        assert_eq!(doc.audio.bgm.preview_duration, Some(10000));
    }

    #[test]
    fn test_negative_preview_omitted() {
        let doc = minimal("po=-1\nplength=-1");
        assert!(doc.audio.bgm.preview_offset.is_none());
        assert!(doc.audio.bgm.preview_duration.is_none());
    }

    #[test]
    fn test_gauge_total() {
        assert!(minimal("title=x").gauge.is_none());
        assert_eq!(minimal("total=250").gauge, Some(GaugeInfo { total: 250 }));
        assert_eq!(minimal("total=20").gauge, Some(GaugeInfo { total: 100 }));
        let err = convert("total=lots\n--\n0000|00|--\n--\n").unwrap_err();
        assert_eq!(err.kind(), "value");
    }

    #[test]
    fn test_resolution_constant() {
        assert_eq!(minimal("title=x").beat.resolution, 48);
    }
}

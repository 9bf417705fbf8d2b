use log::warn;

use crate::chart::{KshChart, KshLine, Measure, Modifier, SpinKind, SpinTag};
use crate::error::ConvertError;

/// Conversion policy knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Skip unrecognized body lines with a warning instead of failing.
    pub lenient: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Body,
}

/// Split raw chart text into the header table and the measure list.
///
/// Header section: `key=value` lines until a `--` bar. Body section: measures
/// of note lines separated by `--` bars, with `#` comments and pending
/// modifier lines in between. An unterminated trailing measure is flushed at
/// end of input.
pub fn classify(input: &str, opts: &ConvertOptions) -> Result<KshChart, ConvertError> {
    let mut chart = KshChart::default();
    let mut section = Section::Header;
    let mut current = Measure::default();
    let mut pending: Vec<Modifier> = Vec::new();

    for (index, raw) in input.lines().enumerate() {
        let line = raw.trim().trim_start_matches('\u{feff}');
        if line.is_empty() {
            continue;
        }

        match section {
            Section::Header => {
                if line == "--" {
                    section = Section::Body;
                } else if let Some((key, value)) = split_option(line) {
                    chart.meta.insert(key.to_string(), value.to_string());
                }
                // anything else in the header is ignored
            }
            Section::Body => {
                if line == "--" {
                    chart.measures.push(std::mem::take(&mut current));
                } else if line.starts_with('#') {
                    // comment
                } else if let Some((key, value)) = split_option(line) {
                    pending.push(Modifier {
                        key: key.to_string(),
                        value: value.to_string(),
                    });
                } else if let Some((bt, fx, laser, spin)) = parse_note_line(line) {
                    current
                        .lines
                        .push(KshLine::new(bt, fx, laser, spin, std::mem::take(&mut pending)));
                } else if opts.lenient {
                    warn!("line {}: skipping unrecognized chart line {line:?}", index + 1);
                } else {
                    return Err(ConvertError::Parse {
                        line: index + 1,
                        text: line.to_string(),
                    });
                }
            }
        }
    }

    if !current.lines.is_empty() {
        // tolerated: final measure without a closing bar
        chart.measures.push(current);
    }

    Ok(chart)
}

/// Split `key=value` at the first `=`; both sides must be non-empty.
fn split_option(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

type NoteFields = ([u8; 4], [u8; 2], [u8; 2], Option<SpinTag>);

/// Fixed-field note line: `bbbb|ff|ll` plus an optional rotation tag.
fn parse_note_line(line: &str) -> Option<NoteFields> {
    let b = line.as_bytes();
    if b.len() < 10 || b[4] != b'|' || b[7] != b'|' {
        return None;
    }
    if !b[0..4].iter().all(u8::is_ascii_digit) || !b[5..7].iter().all(u8::is_ascii_digit) {
        return None;
    }
    if !b[8..10].iter().all(|&g| is_laser_glyph(g)) {
        return None;
    }

    let spin = match &b[10..] {
        [] => None,
        rest => Some(parse_spin(rest)?),
    };

    Some((
        [b[0], b[1], b[2], b[3]],
        [b[5], b[6]],
        [b[8], b[9]],
        spin,
    ))
}

/// Shape-level check only; alphabet membership is enforced by the laser
/// decoder so that a bad glyph reports as a decode error, not a parse error.
fn is_laser_glyph(g: u8) -> bool {
    g.is_ascii_alphanumeric() || g == b'-' || g == b':'
}

fn parse_spin(rest: &[u8]) -> Option<SpinTag> {
    if rest.len() < 3 {
        return None;
    }
    let kind = match &rest[0..2] {
        b"@(" => SpinKind::CircleLeft,
        b"@)" => SpinKind::CircleRight,
        b"@<" => SpinKind::HalfLeft,
        b"@>" => SpinKind::HalfRight,
        b"S<" => SpinKind::SwingLeft,
        b"S>" => SpinKind::SwingRight,
        _ => return None,
    };
    let digits = std::str::from_utf8(&rest[2..]).ok()?;
    if !digits.bytes().all(|d| d.is_ascii_digit()) {
        return None;
    }
    let length = digits.parse().ok()?;
    Some(SpinTag { kind, length })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> ConvertOptions {
        ConvertOptions::default()
    }

    #[test]
    fn test_header_options() {
        let chart = classify("title=Test\nartist=Someone\n--\n", &strict()).unwrap();
        assert_eq!(chart.meta_str("title"), "Test");
        assert_eq!(chart.meta_str("artist"), "Someone");
        assert!(chart.measures.is_empty());
    }

    #[test]
    fn test_header_junk_ignored() {
        let chart = classify("title=Test\nnot an option\n--\n", &strict()).unwrap();
        assert_eq!(chart.meta.len(), 1);
    }

    #[test]
    fn test_value_may_contain_equals() {
        let chart = classify("information=a=b\n--\n", &strict()).unwrap();
        assert_eq!(chart.meta_str("information"), "a=b");
    }

    #[test]
    fn test_measures_split_on_bar() {
        let src = "--\n0000|00|--\n--\n0000|00|--\n0000|00|--\n--\n";
        let chart = classify(src, &strict()).unwrap();
        assert_eq!(chart.measures.len(), 2);
        assert_eq!(chart.measures[0].lines.len(), 1);
        assert_eq!(chart.measures[1].lines.len(), 2);
    }

    #[test]
    fn test_unterminated_measure_flushed() {
        let chart = classify("--\n0000|00|--\n", &strict()).unwrap();
        assert_eq!(chart.measures.len(), 1);
    }

    #[test]
    fn test_modifiers_attach_to_next_line() {
        let src = "--\nt=150\nbeat=3/4\n1000|00|--\n0000|00|--\n--\n";
        let chart = classify(src, &strict()).unwrap();
        let lines = &chart.measures[0].lines;
        assert_eq!(lines[0].mods.len(), 2);
        assert_eq!(lines[0].mods[0].key, "t");
        assert_eq!(lines[0].mods[1].value, "3/4");
        assert!(lines[1].mods.is_empty());
    }

    #[test]
    fn test_comment_skipped() {
        let chart = classify("--\n# comment\n0000|00|--\n--\n", &strict()).unwrap();
        assert_eq!(chart.measures[0].lines.len(), 1);
    }

    #[test]
    fn test_note_line_fields() {
        let chart = classify("--\n1201|12|0:\n--\n", &strict()).unwrap();
        let line = &chart.measures[0].lines[0];
        assert_eq!(line.bt, [b'1', b'2', b'0', b'1']);
        assert_eq!(line.fx, [b'1', b'2']);
        assert_eq!(line.laser, [b'0', b':']);
        assert!(line.spin.is_none());
    }

    #[test]
    fn test_spin_tag() {
        let chart = classify("--\n0000|00|0o@(192\n--\n", &strict()).unwrap();
        let spin = chart.measures[0].lines[0].spin.unwrap();
        assert_eq!(spin.kind, SpinKind::CircleLeft);
        assert_eq!(spin.length, 192);
    }

    #[test]
    fn test_spin_without_length_is_parse_error() {
        let err = classify("--\n0000|00|0oS<\n--\n", &strict()).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_malformed_body_line_fatal() {
        let err = classify("--\n000|00|--\n--\n", &strict()).unwrap_err();
        assert_eq!(
            err,
            ConvertError::Parse {
                line: 2,
                text: "000|00|--".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_body_line_lenient() {
        let opts = ConvertOptions { lenient: true };
        let chart = classify("--\n000|00|--\n0000|00|--\n--\n", &opts).unwrap();
        assert_eq!(chart.measures[0].lines.len(), 1);
    }
}

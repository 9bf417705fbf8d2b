// kshconv — chart format converter CLI.
//
// Reads a KSH chart, runs the conversion core, writes the KSON document as
// JSON. The reverse direction is not implemented.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use ksh_model::ConvertOptions;
use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Ksh,
    Kson,
}

impl Format {
    fn opposite(self) -> Self {
        match self {
            Self::Ksh => Self::Kson,
            Self::Kson => Self::Ksh,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Ksh => "ksh",
            Self::Kson => "kson",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "kshconv", about = "Convert KSH charts to KSON")]
struct Args {
    /// Chart file to convert.
    filename: PathBuf,

    /// Input file format (default: guess from filename).
    #[arg(short, long)]
    from: Option<Format>,

    /// Output file format (default: opposite of the input).
    #[arg(short, long)]
    to: Option<Format>,

    /// Output file name (default: input with the output extension).
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Skip unrecognized body lines instead of failing.
    #[arg(long)]
    lenient: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(Args::parse())
}

fn run(args: Args) -> Result<()> {
    let from = match args.from.or_else(|| guess_format(&args.filename)) {
        Some(f) => f,
        None => bail!(
            "cannot guess the format of {}; pass --from",
            args.filename.display()
        ),
    };
    let to = args.to.unwrap_or_else(|| from.opposite());
    if from == to {
        bail!("input and output formats are both {}", from.extension());
    }
    if from == Format::Kson {
        bail!("conversion to ksh is not implemented");
    }

    let raw = fs::read(&args.filename)
        .with_context(|| format!("failed to read {}", args.filename.display()))?;
    let text = decode_text(&raw);

    let opts = ConvertOptions {
        lenient: args.lenient,
    };
    let doc = match ksh_model::convert_with_options(&text, &opts) {
        Ok(doc) => doc,
        Err(e) => bail!("{} error: {e}", e.kind()),
    };

    let out_path = args
        .out
        .unwrap_or_else(|| args.filename.with_extension(to.extension()));
    let json = serde_json::to_string_pretty(&doc)?;
    fs::write(&out_path, json)
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    info!("wrote {}", out_path.display());
    Ok(())
}

fn guess_format(path: &Path) -> Option<Format> {
    let ext = path.extension()?;
    if ext.eq_ignore_ascii_case("ksh") {
        Some(Format::Ksh)
    } else if ext.eq_ignore_ascii_case("kson") {
        Some(Format::Kson)
    } else {
        None
    }
}

/// Decode chart bytes to text: UTF-8 BOM, then UTF-8, then Shift_JIS, then
/// EUC-JP, with a lossy Shift_JIS fallback.
fn decode_text(raw: &[u8]) -> String {
    if raw.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(&raw[3..]).into_owned();
    }
    if let Ok(s) = std::str::from_utf8(raw) {
        return s.to_string();
    }
    let (decoded, _, had_errors) = encoding_rs::SHIFT_JIS.decode(raw);
    if !had_errors {
        return decoded.into_owned();
    }
    let (decoded, _, had_errors) = encoding_rs::EUC_JP.decode(raw);
    if !had_errors {
        return decoded.into_owned();
    }
    let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(raw);
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_format() {
        assert_eq!(guess_format(Path::new("chart.ksh")), Some(Format::Ksh));
        assert_eq!(guess_format(Path::new("CHART.KSON")), Some(Format::Kson));
        assert_eq!(guess_format(Path::new("chart.txt")), None);
        assert_eq!(guess_format(Path::new("chart")), None);
    }

    #[test]
    fn test_decode_text_bom() {
        let mut raw = vec![0xEF, 0xBB, 0xBF];
        raw.extend_from_slice("title=x".as_bytes());
        assert_eq!(decode_text(&raw), "title=x");
    }

    #[test]
    fn test_decode_text_sjis() {
        let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode("title=テスト");
        assert!(decode_text(&encoded).contains("テスト"));
    }

    #[test]
    fn test_run_converts_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("chart.ksh");
        fs::write(&input, "title=T\nt=150\n--\n1000|00|--\n--\n").unwrap();

        run(Args {
            filename: input.clone(),
            from: None,
            to: None,
            out: None,
            lenient: false,
        })
        .unwrap();

        let json = fs::read_to_string(dir.path().join("chart.kson")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(doc["meta"]["title"], "T");
        assert_eq!(doc["beat"]["bpm"][0]["v"], 150.0);
    }

    #[test]
    fn test_run_reports_error_kind_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.ksh");
        fs::write(&input, "--\ngarbage line\n--\n").unwrap();

        let err = run(Args {
            filename: input,
            from: None,
            to: None,
            out: None,
            lenient: false,
        })
        .unwrap_err();
        assert!(err.to_string().starts_with("parse error"));
        assert!(!dir.path().join("bad.kson").exists());
    }

    #[test]
    fn test_kson_to_ksh_unimplemented() {
        let err = run(Args {
            filename: PathBuf::from("chart.kson"),
            from: None,
            to: None,
            out: None,
            lenient: false,
        })
        .unwrap_err();
        assert!(err.to_string().contains("not implemented"));
    }
}

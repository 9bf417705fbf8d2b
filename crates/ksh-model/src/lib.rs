// KSH chart conversion core: classifier, timing resolver, note/laser decoders,
// KSON document assembler

pub mod assemble;
pub mod chart;
pub mod classify;
pub mod error;
pub mod kson;
pub mod laser;
pub mod note;
pub mod timing;

pub use chart::{KshChart, KshLine, Measure, Modifier, KSON_RESOLUTION, TICKS_PER_MEASURE};
pub use classify::ConvertOptions;
pub use error::ConvertError;
pub use kson::Kson;

/// Convert KSH chart text to a KSON document with default (strict) options.
pub fn convert(input: &str) -> Result<Kson, ConvertError> {
    convert_with_options(input, &ConvertOptions::default())
}

/// Convert KSH chart text to a KSON document.
///
/// The passes run strictly forward: classify raw text into a parsed chart,
/// resolve measure positions onto the tick timeline, decode button and laser
/// lanes, then merge everything into one immutable document.
pub fn convert_with_options(input: &str, opts: &ConvertOptions) -> Result<Kson, ConvertError> {
    let mut parsed = classify::classify(input, opts)?;
    let timeline = timing::resolve(&mut parsed)?;
    let notes = note::decode_notes(&parsed);
    let lasers = laser::build_lasers(&parsed)?;
    assemble::assemble(&parsed, timeline, notes, lasers)
}

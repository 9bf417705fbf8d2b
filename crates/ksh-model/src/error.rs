use thiserror::Error;

/// Conversion failure. Every kind is fatal: the converter never emits a
/// partial document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    /// A body line matched none of the comment/modifier/bar/note-line forms.
    #[error("line {line}: unrecognized chart line {text:?}")]
    Parse { line: usize, text: String },

    /// Malformed or misplaced time signature, or a line grid that cannot
    /// divide its measure's tick span evenly.
    #[error("measure {measure}: {message}")]
    Timing { measure: usize, message: String },

    /// A numeric header or modifier value outside its domain.
    #[error("invalid value {value:?} for {key}")]
    Value { key: String, value: String },

    /// A laser glyph outside the 55-symbol alphabet.
    #[error("tick {tick}: laser glyph {glyph:?} outside alphabet")]
    Decode { tick: u32, glyph: char },
}

impl ConvertError {
    /// Short kind name for caller-side reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::Timing { .. } => "timing",
            Self::Value { .. } => "value",
            Self::Decode { .. } => "decode",
        }
    }
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<Segment>,
    pub language: String,
}

/// One timestamped span of speech, threaded through the whole pipeline.
///
/// `translated` stays empty until the translation stage runs and is
/// non-empty afterwards (identity fallback included). `audio_path` stays
/// `None` until speech synthesis runs; the assembler treats a missing
/// clip as "no audio for this segment".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub id: u32,
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub translated: String,
    #[serde(default)]
    pub audio_path: Option<PathBuf>,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

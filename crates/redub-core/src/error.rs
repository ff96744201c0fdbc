use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DubError {
    #[error("Audio extraction failed for {video_path}: {reason}")]
    AudioExtractionFailed { video_path: PathBuf, reason: String },

    #[error("Transcription failed for {audio_path}: {reason}")]
    TranscriptFailed { audio_path: PathBuf, reason: String },

    #[error("Translation request failed: {reason}")]
    TranslationFailed { reason: String },

    #[error("Speech synthesis failed: {reason}")]
    SynthesisFailed { reason: String },

    #[error("Audio decode failed for {path}: {reason}")]
    DecodeFailed { path: PathBuf, reason: String },

    #[error("Probe failed for {path}: {reason}")]
    ProbeFailed { path: PathBuf, reason: String },

    #[error("Muxing failed for {video_path}: {reason}")]
    MuxFailed { video_path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("WAV error: {0}")]
    WavError(#[from] hound::Error),

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },
}

pub type Result<T> = std::result::Result<T, DubError>;

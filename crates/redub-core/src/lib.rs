//! Redub Core Library
//!
//! Core functionality for dubbing videos into another language: Whisper
//! transcription, dubbing-safe segment merging, batched LLM translation
//! with identity fallback, speech synthesis and audio track assembly.

pub mod audio;
pub mod cache;
pub mod error;
pub mod format;
pub mod merge;
pub mod mux;
pub mod pipeline;
pub mod provider;
pub mod subtitle;
pub mod translate;
pub mod tts;
pub mod types;

// Re-export commonly used items at crate root
pub use audio::assemble_dubbed_track;
pub use cache::{
    get_audio_path, get_cache_dir, get_clips_dir, get_dub_path, get_segments_path,
    get_transcript_path,
};
pub use error::{DubError, Result};
pub use format::{format_segments_readable, format_timecode_range, format_timestamp};
pub use merge::{DEFAULT_GAP_THRESHOLD, DEFAULT_MIN_DURATION, merge_segments};
pub use mux::{check_ffmpeg, mux_video, probe_duration};
pub use pipeline::{
    ExportOptions, export_video, extract_audio, load_segments, load_transcript, save_segments,
    transcribe_audio,
};
pub use provider::{Provider, ProviderConfig, estimate_cost};
pub use subtitle::write_srt;
pub use translate::{DEFAULT_BATCH_SIZE, translate_segments, translate_single};
pub use tts::{Synthesizer, TtsProvider, synthesize_segments};
pub use types::{Segment, Transcript};

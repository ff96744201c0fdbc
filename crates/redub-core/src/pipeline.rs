use std::path::{Path, PathBuf};

use tokio::{fs, process::Command};

use crate::{
    audio::assemble_dubbed_track,
    error::{DubError, Result},
    merge::reindex,
    mux::{mux_video, probe_duration},
    subtitle::write_srt,
    types::{Segment, Transcript},
};

/// Extract a mono 16 kHz audio track from a video using ffmpeg
pub async fn extract_audio(video_path: &Path, audio_path: &Path) -> Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(video_path)
        .arg("-vn")
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-ar")
        .arg("16000")
        .arg("-ac")
        .arg("1")
        .arg(audio_path)
        .output()
        .await?;

    if !output.status.success() {
        return Err(DubError::AudioExtractionFailed {
            video_path: video_path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

/// Transcribe audio using the Whisper CLI
pub async fn transcribe_audio(
    audio_path: &Path,
    output_path: &Path,
    language: &str,
) -> Result<Transcript> {
    let output_dir = output_path.parent().unwrap_or(Path::new("."));

    let output = Command::new("whisper")
        .arg(audio_path)
        .arg("--model")
        .arg("base")
        .arg("--language")
        .arg(language)
        .arg("--output_format")
        .arg("json")
        .arg("--output_dir")
        .arg(output_dir)
        .output()
        .await?;

    if !output.status.success() {
        return Err(DubError::TranscriptFailed {
            audio_path: audio_path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    // Whisper names output based on input filename
    let stem = audio_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let whisper_output = output_dir.join(format!("{stem}.json"));

    // Rename to our expected path if different
    if whisper_output != output_path {
        fs::rename(&whisper_output, output_path).await?;
    }

    let json_content = fs::read_to_string(output_path).await?;
    let mut transcript: Transcript = serde_json::from_str(&json_content)?;

    for seg in &mut transcript.segments {
        seg.text = seg.text.trim().to_string();
        seg.translated.clear();
        seg.audio_path = None;
    }
    reindex(&mut transcript.segments);

    Ok(transcript)
}

/// Load a transcript from a cached file
pub async fn load_transcript(path: &Path) -> Result<Transcript> {
    let json_content = fs::read_to_string(path).await?;
    let transcript: Transcript = serde_json::from_str(&json_content)?;
    Ok(transcript)
}

/// Load cached segments from a file
pub async fn load_segments(path: &Path) -> Result<Vec<Segment>> {
    let json_content = fs::read_to_string(path).await?;
    let segments: Vec<Segment> = serde_json::from_str(&json_content)?;
    Ok(segments)
}

/// Save segments to a file
pub async fn save_segments(segments: &[Segment], path: &Path) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(segments)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}

pub struct ExportOptions {
    pub original_volume: f64,
    pub dubbed_volume: f64,
    pub burn_subtitles: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            original_volume: 0.1,
            dubbed_volume: 1.0,
            burn_subtitles: true,
        }
    }
}

/// Full export: mix the dubbed track over the video's duration, write
/// subtitles, mux everything into `output_path`.
///
/// The mixed track and the SRT are temporaries and are deleted even when
/// muxing fails; the failure itself is returned to the caller.
pub async fn export_video(
    video_path: &Path,
    segments: &[Segment],
    output_path: &Path,
    original_audio: Option<&Path>,
    opts: &ExportOptions,
) -> Result<()> {
    let total_duration = probe_duration(video_path).await?;

    let mixed_path = assemble_dubbed_track(
        segments,
        total_duration,
        original_audio,
        opts.original_volume,
        opts.dubbed_volume,
    )
    .await?;

    let srt_path = if opts.burn_subtitles {
        match create_temp_srt(segments).await {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("subtitle generation failed, muxing without subtitles: {e}");
                None
            }
        }
    } else {
        None
    };

    let result = mux_video(
        video_path,
        &mixed_path,
        output_path,
        srt_path.as_deref(),
        opts.burn_subtitles,
    )
    .await;

    for path in [Some(mixed_path.as_path()), srt_path.as_deref()]
        .into_iter()
        .flatten()
    {
        if let Err(e) = fs::remove_file(path).await {
            log::warn!("failed to remove temporary file {}: {e}", path.display());
        }
    }

    result
}

async fn create_temp_srt(segments: &[Segment]) -> Result<PathBuf> {
    let path = tempfile::Builder::new()
        .prefix("redub-subs-")
        .suffix(".srt")
        .tempfile()?
        .keep()
        .map_err(|e| DubError::IoError(e.error))?
        .1;
    write_srt(segments, &path).await?;
    Ok(path)
}

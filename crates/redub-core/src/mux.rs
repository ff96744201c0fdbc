use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{DubError, Result};

const MUX_TIMEOUT: Duration = Duration::from_secs(600);

/// Probe a media file's duration in seconds using ffprobe.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(path)
        .output()
        .await?;

    if !output.status.success() {
        return Err(DubError::ProbeFailed {
            path: path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout.trim().parse().map_err(|_| DubError::ProbeFailed {
        path: path.to_path_buf(),
        reason: format!("unparseable duration: {}", stdout.trim()),
    })
}

/// Replace the video's audio track with `audio_path` using ffmpeg,
/// optionally burning subtitles into the frames. Bounded by a 10-minute
/// timeout; a non-zero exit or timeout is an export failure, not a crash.
pub async fn mux_video(
    video_path: &Path,
    audio_path: &Path,
    output_path: &Path,
    subtitle_path: Option<&Path>,
    burn_subtitles: bool,
) -> Result<()> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y")
        .arg("-i")
        .arg(video_path)
        .arg("-i")
        .arg(audio_path);

    match subtitle_path.filter(|p| burn_subtitles && p.exists()) {
        Some(srt) => {
            let escaped = escape_filter_path(srt);
            cmd.arg("-filter_complex")
                .arg(format!(
                    "[0:v]subtitles='{escaped}':force_style='FontSize=24,PrimaryColour=&HFFFFFF,OutlineColour=&H000000,Outline=2'[v]"
                ))
                .arg("-map")
                .arg("[v]")
                .arg("-map")
                .arg("1:a");
        }
        None => {
            cmd.arg("-map").arg("0:v").arg("-map").arg("1:a");
        }
    }

    cmd.arg("-c:v")
        .arg("libx264")
        .arg("-preset")
        .arg("medium")
        .arg("-crf")
        .arg("23")
        .arg("-c:a")
        .arg("aac")
        .arg("-b:a")
        .arg("192k")
        .arg("-shortest")
        .arg(output_path);

    let output = timeout(MUX_TIMEOUT, cmd.output())
        .await
        .map_err(|_| DubError::MuxFailed {
            video_path: video_path.to_path_buf(),
            reason: "ffmpeg timed out".to_string(),
        })??;

    if !output.status.success() {
        return Err(DubError::MuxFailed {
            video_path: video_path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

/// Whether an ffmpeg binary is reachable on PATH.
pub async fn check_ffmpeg() -> bool {
    let probe = timeout(
        Duration::from_secs(5),
        Command::new("ffmpeg").arg("-version").output(),
    )
    .await;

    matches!(probe, Ok(Ok(output)) if output.status.success())
}

/// Escape a subtitle path for use inside an ffmpeg filter expression.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\").replace(':', "\\:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn filter_path_escapes_colons_and_backslashes() {
        let path = PathBuf::from("C:\\subs\\out.srt");
        assert_eq!(escape_filter_path(&path), "C\\:\\\\subs\\\\out.srt");
    }
}

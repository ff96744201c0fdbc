use std::fmt::Write as _;
use std::path::Path;

use crate::error::Result;
use crate::types::Segment;

/// Format seconds as an SRT timestamp: `HH:MM:SS,mmm`, zero-padded,
/// milliseconds truncated rather than rounded.
pub fn format_srt_timestamp(seconds: f64) -> String {
    // One f64 -> integer conversion; deriving each field with a separate
    // float modulo loses a millisecond on values like 1.2.
    let total_ms = (seconds * 1000.0) as u64;
    let hours = total_ms / 3_600_000;
    let minutes = total_ms / 60_000 % 60;
    let secs = total_ms / 1000 % 60;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// Render segments as SRT: numbered entries, timestamp range, translated
/// text (source text when no translation is present), blank separator.
pub fn format_srt(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        let text = if seg.translated.is_empty() {
            &seg.text
        } else {
            &seg.translated
        };
        let _ = writeln!(
            out,
            "{}\n{} --> {}\n{}\n",
            i + 1,
            format_srt_timestamp(seg.start),
            format_srt_timestamp(seg.end),
            text
        );
    }
    out
}

/// Write segments as an SRT file.
pub async fn write_srt(segments: &[Segment], path: &Path) -> Result<()> {
    tokio::fs::write(path, format_srt(segments)).await?;
    Ok(())
}

use std::fmt::Write as _;

use crate::types::Segment;

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Format a timecode range
pub fn format_timecode_range(start: f64, end: f64) -> String {
    format!("{} - {}", format_timestamp(start), format_timestamp(end))
}

/// Format segments as a human-readable preview, one line per segment with
/// the translation when present.
pub fn format_segments_readable(segments: &[Segment]) -> String {
    let mut out = String::new();
    for seg in segments {
        let _ = writeln!(
            out,
            "[{}] {}",
            format_timecode_range(seg.start, seg.end),
            seg.text.trim()
        );
        if !seg.translated.is_empty() {
            let _ = writeln!(out, "    {}", seg.translated.trim());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_minute_second() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(75.4), "01:15");
        assert_eq!(format_timecode_range(60.0, 125.0), "01:00 - 02:05");
    }

    #[test]
    fn readable_preview_includes_translation_when_present() {
        let seg = Segment {
            id: 1,
            start: 0.0,
            end: 2.0,
            text: "hello".to_string(),
            translated: "xin chào".to_string(),
            audio_path: None,
        };
        let preview = format_segments_readable(&[seg]);
        assert_eq!(preview, "[00:00 - 00:02] hello\n    xin chào\n");
    }

    #[test]
    fn readable_preview_is_one_line_without_translation() {
        let seg = Segment {
            id: 1,
            start: 0.0,
            end: 2.0,
            text: "hello".to_string(),
            translated: String::new(),
            audio_path: None,
        };
        assert_eq!(format_segments_readable(&[seg]), "[00:00 - 00:02] hello\n");
    }
}

use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tokio::process::Command;

use crate::error::{DubError, Result};
use crate::types::Segment;

pub const CANVAS_SAMPLE_RATE: u32 = 44_100;

const CANVAS_SPEC: WavSpec = WavSpec {
    channels: 1,
    sample_rate: CANVAS_SAMPLE_RATE,
    bits_per_sample: 16,
    sample_format: SampleFormat::Int,
};

/// Silent fixed-duration buffer the dubbed clips are overlaid onto.
///
/// Mono f32 at 44.1 kHz. The canvas owns the final mix; clips are
/// read-only inputs, mixed additively and discarded after overlay.
pub struct Canvas {
    samples: Vec<f32>,
}

impl Canvas {
    /// Allocate `duration_secs` of silence, truncated to whole
    /// milliseconds.
    pub fn silent(duration_secs: f64) -> Self {
        let total_ms = (duration_secs * 1000.0) as u64;
        let len = (total_ms * CANVAS_SAMPLE_RATE as u64 / 1000) as usize;
        Self {
            samples: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / CANVAS_SAMPLE_RATE as f64
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Additively mix `clip` into the canvas starting at `position_secs`.
    /// Samples running past the end of the canvas are dropped.
    pub fn overlay(&mut self, clip: &[f32], position_secs: f64) {
        let offset = (position_secs * CANVAS_SAMPLE_RATE as f64) as usize;
        for (i, sample) in clip.iter().enumerate() {
            let Some(slot) = self.samples.get_mut(offset + i) else {
                break;
            };
            *slot = (*slot + sample).clamp(-1.0, 1.0);
        }
    }

    /// Write the mix as 16-bit PCM WAV.
    pub fn export_wav(&self, path: &Path) -> Result<()> {
        let mut writer = WavWriter::create(path, CANVAS_SPEC)?;
        for &sample in &self.samples {
            writer.write_sample((sample * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

/// Gain offset in dB for a volume around the unity point: 1.0 is 0 dB,
/// values below attenuate, values above boost. The same formula serves
/// the dubbed clips (`20 * (v - 1)`) and the original-track ducking
/// (`-20 * (1 - v)`).
pub fn volume_gain_db(volume: f64) -> f64 {
    20.0 * (volume - 1.0)
}

/// Scale a clip by a dB offset. 0 dB leaves the clip untouched.
pub fn apply_gain(clip: &mut [f32], db: f64) {
    if db == 0.0 {
        return;
    }
    let factor = 10f64.powf(db / 20.0) as f32;
    for sample in clip.iter_mut() {
        *sample = (*sample * factor).clamp(-1.0, 1.0);
    }
}

/// Fit a track to exactly `len` samples: truncate when longer, pad with
/// trailing silence when shorter.
pub fn fit_length(track: &mut Vec<f32>, len: usize) {
    track.resize(len, 0.0);
}

/// Load a clip as canvas-spec samples. WAVs already in the canvas spec
/// are read directly; everything else is decoded through ffmpeg.
pub async fn load_clip(path: &Path) -> Result<Vec<f32>> {
    if let Some(samples) = read_native_wav(path) {
        return Ok(samples);
    }
    decode_via_ffmpeg(path).await
}

fn read_native_wav(path: &Path) -> Option<Vec<f32>> {
    let mut reader = WavReader::open(path).ok()?;
    if reader.spec() != CANVAS_SPEC {
        return None;
    }
    reader
        .samples::<i16>()
        .map(|sample| sample.map(|s| s as f32 / i16::MAX as f32))
        .collect::<std::result::Result<Vec<_>, _>>()
        .ok()
}

async fn decode_via_ffmpeg(path: &Path) -> Result<Vec<f32>> {
    let tmp = tempfile::Builder::new()
        .prefix("redub-clip-")
        .suffix(".wav")
        .tempfile()?;

    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(path)
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-ar")
        .arg(CANVAS_SAMPLE_RATE.to_string())
        .arg("-ac")
        .arg("1")
        .arg(tmp.path())
        .output()
        .await?;

    if !output.status.success() {
        return Err(DubError::DecodeFailed {
            path: path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    read_native_wav(tmp.path()).ok_or_else(|| DubError::DecodeFailed {
        path: path.to_path_buf(),
        reason: "decoded WAV is not in the canvas spec".to_string(),
    })
}

/// Mix every segment's clip onto a silent canvas of `total_duration`
/// seconds, then duck the original track underneath.
///
/// A segment with a missing or unreadable clip is skipped and logged,
/// never fatal. The original track is mixed only when present and
/// `original_volume > 0`; it is attenuated, then truncated or padded to
/// the canvas length before the overlay. Returns the path of the
/// exported mixed WAV; the caller deletes it after muxing.
pub async fn assemble_dubbed_track(
    segments: &[Segment],
    total_duration: f64,
    original_audio: Option<&Path>,
    original_volume: f64,
    dubbed_volume: f64,
) -> Result<PathBuf> {
    let mut canvas = Canvas::silent(total_duration);

    for seg in segments {
        let Some(path) = seg.audio_path.as_deref() else {
            continue;
        };
        if !path.exists() {
            continue;
        }

        match load_clip(path).await {
            Ok(mut clip) => {
                if dubbed_volume != 1.0 {
                    apply_gain(&mut clip, volume_gain_db(dubbed_volume));
                }
                canvas.overlay(&clip, seg.start);
            }
            Err(e) => log::warn!("skipping clip for segment {}: {e}", seg.id),
        }
    }

    if let Some(path) = original_audio
        && original_volume > 0.0
        && path.exists()
    {
        match load_clip(path).await {
            Ok(mut original) => {
                apply_gain(&mut original, volume_gain_db(original_volume));
                fit_length(&mut original, canvas.len());
                canvas.overlay(&original, 0.0);
            }
            Err(e) => log::warn!("skipping original track mix: {e}"),
        }
    }

    let mixed_path = tempfile::Builder::new()
        .prefix("redub-mix-")
        .suffix(".wav")
        .tempfile()?
        .keep()
        .map_err(|e| DubError::IoError(e.error))?
        .1;
    canvas.export_wav(&mixed_path)?;

    Ok(mixed_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_clip(path: &Path, samples: &[f32]) {
        let mut writer = WavWriter::create(path, CANVAS_SPEC).unwrap();
        for &sample in samples {
            writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn seg(id: u32, start: f64, end: f64, audio_path: Option<PathBuf>) -> Segment {
        Segment {
            id,
            start,
            end,
            text: "text".to_string(),
            translated: "translated".to_string(),
            audio_path,
        }
    }

    #[test]
    fn canvas_duration_is_truncated_to_milliseconds() {
        let canvas = Canvas::silent(1.2345);
        assert_eq!(canvas.len(), (1234 * CANVAS_SAMPLE_RATE as usize) / 1000);
    }

    #[test]
    fn unity_volume_is_zero_db() {
        assert_eq!(volume_gain_db(1.0), 0.0);
        assert!(volume_gain_db(0.5) < 0.0);
        assert!(volume_gain_db(1.5) > 0.0);
    }

    #[test]
    fn zero_db_gain_leaves_samples_untouched() {
        let mut clip = vec![0.1, -0.4, 0.9];
        let before = clip.clone();
        apply_gain(&mut clip, volume_gain_db(1.0));
        assert_eq!(clip, before);
    }

    #[test]
    fn negative_gain_attenuates() {
        let mut clip = vec![0.8];
        apply_gain(&mut clip, -20.0);
        assert!((clip[0] - 0.08).abs() < 1e-3);
    }

    #[test]
    fn overlay_is_additive_at_offset() {
        let mut canvas = Canvas::silent(1.0);
        canvas.overlay(&[0.25, 0.25], 0.5);
        canvas.overlay(&[0.25], 0.5);

        let offset = CANVAS_SAMPLE_RATE as usize / 2;
        assert_eq!(canvas.samples()[offset], 0.5);
        assert_eq!(canvas.samples()[offset + 1], 0.25);
        assert_eq!(canvas.samples()[offset - 1], 0.0);
    }

    #[test]
    fn overlay_drops_samples_past_the_end() {
        let mut canvas = Canvas::silent(0.001);
        let len = canvas.len();
        canvas.overlay(&vec![0.5; len * 4], 0.0);
        assert_eq!(canvas.len(), len);
    }

    #[test]
    fn overlay_clamps_to_valid_range() {
        let mut canvas = Canvas::silent(0.01);
        canvas.overlay(&[0.9], 0.0);
        canvas.overlay(&[0.9], 0.0);
        assert_eq!(canvas.samples()[0], 1.0);
    }

    #[test]
    fn fit_length_truncates_and_pads() {
        let mut long = vec![0.5; 10];
        fit_length(&mut long, 4);
        assert_eq!(long.len(), 4);

        let mut short = vec![0.5; 2];
        fit_length(&mut short, 5);
        assert_eq!(short.len(), 5);
        assert_eq!(short[4], 0.0);
    }

    #[tokio::test]
    async fn assembled_track_has_requested_duration() {
        let dir = tempfile::tempdir().unwrap();
        let clip_path = dir.path().join("clip.wav");
        write_clip(&clip_path, &vec![0.5; CANVAS_SAMPLE_RATE as usize / 10]);

        let segments = vec![seg(1, 0.5, 0.6, Some(clip_path))];
        let mixed = assemble_dubbed_track(&segments, 2.0, None, 0.1, 1.0)
            .await
            .unwrap();

        let reader = WavReader::open(&mixed).unwrap();
        let duration = reader.duration() as f64 / reader.spec().sample_rate as f64;
        assert!((duration - 2.0).abs() < 0.05);

        std::fs::remove_file(mixed).unwrap();
    }

    #[tokio::test]
    async fn missing_clips_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let segments = vec![
            seg(1, 0.0, 1.0, None),
            seg(2, 1.0, 2.0, Some(dir.path().join("does-not-exist.wav"))),
        ];

        let mixed = assemble_dubbed_track(&segments, 1.0, None, 0.0, 1.0)
            .await
            .unwrap();

        let mut reader = WavReader::open(&mixed).unwrap();
        assert!(reader.samples::<i16>().all(|s| s.unwrap() == 0));

        std::fs::remove_file(mixed).unwrap();
    }

    #[tokio::test]
    async fn zero_original_volume_leaves_original_out_of_the_mix() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("original.wav");
        write_clip(&original, &vec![0.9; CANVAS_SAMPLE_RATE as usize]);

        let mixed = assemble_dubbed_track(&[], 1.0, Some(original.as_path()), 0.0, 1.0)
            .await
            .unwrap();

        let mut reader = WavReader::open(&mixed).unwrap();
        assert!(reader.samples::<i16>().all(|s| s.unwrap() == 0));

        std::fs::remove_file(mixed).unwrap();
    }

    #[tokio::test]
    async fn original_track_is_ducked_and_padded() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("original.wav");
        // half a second of full-scale-ish signal under a one second canvas
        write_clip(&original, &vec![0.8; CANVAS_SAMPLE_RATE as usize / 2]);

        let mixed = assemble_dubbed_track(&[], 1.0, Some(original.as_path()), 0.1, 1.0)
            .await
            .unwrap();

        let mut reader = WavReader::open(&mixed).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), CANVAS_SAMPLE_RATE as usize);

        // 0.1 volume is -18 dB, roughly an eighth of the amplitude
        let expected = 0.8 * 10f32.powf(volume_gain_db(0.1) as f32 / 20.0);
        let got = samples[100] as f32 / i16::MAX as f32;
        assert!((got - expected).abs() < 0.01);

        // padded tail stays silent
        assert!(samples[samples.len() - 100] == 0);

        std::fs::remove_file(mixed).unwrap();
    }
}

use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

/// Get the cache directory for a given input video
pub fn get_cache_dir(input: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    input.hash(&mut hasher);
    let input_hash = hasher.finish();

    get_root_cache_dir().join(input_hash.to_string())
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("redub")
}

/// Get the path for the extracted audio track
pub fn get_audio_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("audio.wav")
}

/// Get the path for the cached raw transcript
pub fn get_transcript_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("transcript.json")
}

/// Get the path for the cached translated segments (language aware)
pub fn get_segments_path(cache_dir: &Path, lang: &str) -> PathBuf {
    cache_dir.join(format!("segments_{lang}.json"))
}

/// Get the path for the cached synthesized segments (language aware)
pub fn get_dub_path(cache_dir: &Path, lang: &str) -> PathBuf {
    cache_dir.join(format!("dub_{lang}.json"))
}

/// Get the directory the synthesized clips are written to
pub fn get_clips_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join("clips")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_hashes_to_same_dir() {
        assert_eq!(get_cache_dir("/videos/a.mp4"), get_cache_dir("/videos/a.mp4"));
        assert_ne!(get_cache_dir("/videos/a.mp4"), get_cache_dir("/videos/b.mp4"));
    }

    #[test]
    fn artifact_paths_live_under_the_cache_dir() {
        let dir = PathBuf::from("/cache/123");
        assert_eq!(get_audio_path(&dir), dir.join("audio.wav"));
        assert_eq!(get_segments_path(&dir, "vi"), dir.join("segments_vi.json"));
        assert_eq!(get_dub_path(&dir, "vi"), dir.join("dub_vi.json"));
        assert_eq!(get_clips_dir(&dir), dir.join("clips"));
    }
}

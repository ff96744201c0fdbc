use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;

use redub_core::{
    DEFAULT_BATCH_SIZE, DEFAULT_GAP_THRESHOLD, DEFAULT_MIN_DURATION, ExportOptions, Provider,
    TtsProvider, check_ffmpeg, estimate_cost, export_video, extract_audio,
    format_segments_readable, format_timecode_range, get_audio_path, get_cache_dir, get_clips_dir,
    get_dub_path,
    get_segments_path, get_transcript_path, load_segments, load_transcript, merge_segments,
    save_segments, synthesize_segments, transcribe_audio, translate_segments,
};

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    OpenRouter,
    Openai,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::OpenRouter => Provider::OpenRouter,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

/// CLI wrapper for TtsProvider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliTts {
    #[default]
    ElevenLabs,
    Openai,
    Fpt,
}

impl From<CliTts> for TtsProvider {
    fn from(cli: CliTts) -> Self {
        match cli {
            CliTts::ElevenLabs => TtsProvider::ElevenLabs,
            CliTts::Openai => TtsProvider::Openai,
            CliTts::Fpt => TtsProvider::Fpt,
        }
    }
}

#[derive(Parser)]
#[command(name = "redub")]
#[command(
    about = "Transcribe a video with Whisper, translate it with an LLM and dub it with synthesized speech"
)]
struct Cli {
    /// Input video file
    video: PathBuf,

    /// Target language for the dub (e.g. "vi", "es")
    #[arg(short, long, default_value = "vi")]
    lang: String,

    /// Source audio language for transcription
    #[arg(long, default_value = "en")]
    source_lang: String,

    /// LLM provider for translation
    #[arg(short, long, default_value = "open-router")]
    provider: CliProvider,

    /// Speech synthesis backend
    #[arg(short, long, default_value = "eleven-labs")]
    tts: CliTts,

    /// Voice id for the synthesis backend (backend default when omitted)
    #[arg(long)]
    voice: Option<String>,

    /// Speech speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Original track volume in the mix (0 removes it entirely)
    #[arg(long, default_value_t = 0.1)]
    original_volume: f64,

    /// Dubbed clips volume
    #[arg(long, default_value_t = 1.0)]
    dubbed_volume: f64,

    /// Skip burning subtitles into the frames
    #[arg(long)]
    no_subtitles: bool,

    /// Print the translated segments with timecodes
    #[arg(long)]
    show_segments: bool,

    /// Output file (defaults to <video>_dubbed.mp4 next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force re-processing even if cached files exist
    #[arg(short, long)]
    force: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let provider: Provider = cli.provider.into();
    let tts: TtsProvider = cli.tts.into();

    // Validate API keys early, before any work
    if let Err(e) = provider.validate_api_key() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
    if let Err(e) = tts.validate_api_key() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
    if !check_ffmpeg().await {
        eprintln!(
            "{} ffmpeg not found on PATH",
            style("Error:").red().bold()
        );
        std::process::exit(1);
    }

    let video = cli.video;
    let output_path = cli.output.unwrap_or_else(|| {
        let stem = video
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        video.with_file_name(format!("{stem}_dubbed.mp4"))
    });

    // Setup cache directory
    let cache_dir = get_cache_dir(&video.to_string_lossy());
    fs::create_dir_all(&cache_dir).await?;

    println!(
        "\n{}  {}\n",
        style("redub").cyan().bold(),
        style("Video Dubber").dim()
    );

    // Step 1: Extract audio (check cache)
    let audio_file = get_audio_path(&cache_dir);
    if !cli.force && audio_file.exists() {
        println!(
            "{} Audio extracted {}",
            style("✓").green().bold(),
            style("(cached)").dim()
        );
    } else {
        let spinner = create_spinner("Extracting audio...");
        extract_audio(&video, &audio_file).await?;
        spinner.finish_with_message(format!("{} Audio extracted", style("✓").green().bold()));
    }

    // Step 2: Transcribe (check cache)
    let transcript_path = get_transcript_path(&cache_dir);
    let transcript = if !cli.force && transcript_path.exists() {
        let transcript = load_transcript(&transcript_path).await?;
        println!(
            "{} Transcribed: {} segments, {} {}",
            style("✓").green().bold(),
            transcript.segments.len(),
            style(&transcript.language).yellow(),
            style("(cached)").dim()
        );
        transcript
    } else {
        let spinner = create_spinner("Transcribing with Whisper...");
        let transcript = transcribe_audio(&audio_file, &transcript_path, &cli.source_lang).await?;
        spinner.finish_with_message(format!(
            "{} Transcribed: {} segments, {}",
            style("✓").green().bold(),
            transcript.segments.len(),
            style(&transcript.language).yellow()
        ));
        transcript
    };

    // Step 3: Merge into dubbing-safe segments
    let merged = merge_segments(
        transcript.segments,
        DEFAULT_MIN_DURATION,
        DEFAULT_GAP_THRESHOLD,
    );
    let span = merged
        .last()
        .map(|seg| format_timecode_range(0.0, seg.end))
        .unwrap_or_default();
    println!(
        "{} Merged into {} dubbing-safe segments ({span})",
        style("✓").green().bold(),
        merged.len()
    );
    let cost = estimate_cost(&merged, &provider);
    if cost > 0.0 {
        println!(
            "  {}",
            style(format!("Estimated translation cost: ~${cost:.4}")).dim()
        );
    }

    // Step 4: Translate (check cache with target lang)
    let segments_path = get_segments_path(&cache_dir, &cli.lang);
    let translated = if !cli.force && segments_path.exists() {
        let segments = load_segments(&segments_path).await?;
        println!(
            "{} Translated to {} ({}) {}",
            style("✓").green().bold(),
            cli.lang,
            provider.name(),
            style("(cached)").dim()
        );
        segments
    } else {
        let spinner = create_spinner(&format!(
            "Translating to {} with {}...",
            cli.lang,
            provider.name()
        ));
        let mut segments = merged;
        translate_segments(&mut segments, &provider, &cli.lang, DEFAULT_BATCH_SIZE).await?;
        save_segments(&segments, &segments_path).await?;
        spinner.finish_with_message(format!(
            "{} Translated to {} ({})",
            style("✓").green().bold(),
            cli.lang,
            provider.name()
        ));
        segments
    };
    if cli.show_segments {
        print!("{}", style(format_segments_readable(&translated)).dim());
    }

    // Step 5: Synthesize speech (check cache with target lang)
    let dub_path = get_dub_path(&cache_dir, &cli.lang);
    let dubbed = if !cli.force && dub_path.exists() {
        let segments = load_segments(&dub_path).await?;
        println!(
            "{} Speech synthesized ({}) {}",
            style("✓").green().bold(),
            tts.name(),
            style("(cached)").dim()
        );
        segments
    } else {
        let voice = cli
            .voice
            .clone()
            .unwrap_or_else(|| tts.default_voice().to_string());
        let spinner = create_spinner(&format!(
            "Synthesizing speech with {} ({voice})...",
            tts.name()
        ));
        let mut segments = translated;
        synthesize_segments(
            &mut segments,
            &tts,
            &voice,
            cli.speed,
            &get_clips_dir(&cache_dir),
        )
        .await?;
        save_segments(&segments, &dub_path).await?;
        let rendered = segments.iter().filter(|s| s.audio_path.is_some()).count();
        spinner.finish_with_message(format!(
            "{} Speech synthesized: {}/{} clips ({})",
            style("✓").green().bold(),
            rendered,
            segments.len(),
            tts.name()
        ));
        segments
    };

    // Step 6: Mix and mux
    let spinner = create_spinner("Rendering dubbed video...");
    let opts = ExportOptions {
        original_volume: cli.original_volume,
        dubbed_volume: cli.dubbed_volume,
        burn_subtitles: !cli.no_subtitles,
    };
    export_video(&video, &dubbed, &output_path, Some(audio_file.as_path()), &opts).await?;
    spinner.finish_with_message(format!("{} Dubbed video rendered", style("✓").green().bold()));

    println!(
        "\n{} {}\n",
        style("Saved:").dim(),
        style(output_path.display()).cyan()
    );

    Ok(())
}

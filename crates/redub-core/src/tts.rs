use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DubError, Result};
use crate::types::Segment;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug, Default)]
pub enum TtsProvider {
    #[default]
    ElevenLabs,
    Openai,
    Fpt,
}

impl TtsProvider {
    pub fn name(&self) -> &'static str {
        match self {
            TtsProvider::ElevenLabs => "ElevenLabs",
            TtsProvider::Openai => "OpenAI TTS",
            TtsProvider::Fpt => "FPT.AI",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            TtsProvider::ElevenLabs => "ELEVENLABS_API_KEY",
            TtsProvider::Openai => "OPENAI_API_KEY",
            TtsProvider::Fpt => "FPT_API_KEY",
        }
    }

    pub fn default_voice(&self) -> &'static str {
        match self {
            TtsProvider::ElevenLabs => "21m00Tcm4TlvDq8ikWAM",
            TtsProvider::Openai => "alloy",
            TtsProvider::Fpt => "banmai",
        }
    }

    /// Known voices as (id, label) pairs.
    pub fn voices(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            TtsProvider::ElevenLabs => &[
                ("21m00Tcm4TlvDq8ikWAM", "Rachel (Female)"),
                ("AZnzlk1XvdvUeBnXmlld", "Domi (Female)"),
                ("EXAVITQu4vr4xnSDxMaL", "Bella (Female)"),
                ("ErXwobaYiN019PkySvjV", "Antoni (Male)"),
                ("MF3mGyEYCl7XYWbV9V6O", "Elli (Female)"),
                ("TxGEqnHWrfWFTfGW9XjX", "Josh (Male)"),
            ],
            TtsProvider::Openai => &[
                ("alloy", "Alloy (Neutral)"),
                ("echo", "Echo (Male)"),
                ("fable", "Fable (British)"),
                ("onyx", "Onyx (Male Deep)"),
                ("nova", "Nova (Female)"),
                ("shimmer", "Shimmer (Female)"),
            ],
            TtsProvider::Fpt => &[
                ("banmai", "Ban Mai (Northern Female)"),
                ("leminh", "Le Minh (Northern Male)"),
                ("thuminh", "Thu Minh (Northern Female)"),
                ("giahuy", "Gia Huy (Northern Male)"),
                ("myan", "My An (Southern Female)"),
                ("lannhi", "Lan Nhi (Southern Female)"),
                ("linhsan", "Linh San (Central Female)"),
                ("minhquang", "Minh Quang (Central Male)"),
            ],
        }
    }

    /// Validate that the API key is set for this backend
    pub fn validate_api_key(&self) -> Result<String> {
        std::env::var(self.env_var()).map_err(|_| DubError::MissingApiKey {
            env_var: self.env_var().to_string(),
        })
    }

    pub fn synthesizer(&self, api_key: String) -> Box<dyn Synthesizer> {
        match self {
            TtsProvider::ElevenLabs => Box::new(ElevenLabsSynthesizer { api_key }),
            TtsProvider::Openai => Box::new(OpenaiSynthesizer { api_key }),
            TtsProvider::Fpt => Box::new(FptSynthesizer { api_key }),
        }
    }
}

/// One speech-synthesis backend: renders text as a clip file at
/// `out_path`. Backends are interchangeable behind this trait.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(
        &self,
        client: &reqwest::Client,
        text: &str,
        voice: &str,
        speed: f64,
        out_path: &Path,
    ) -> Result<()>;
}

/// Fill `audio_path` for every segment.
///
/// Segments are rendered one at a time; a failed segment is logged and
/// left with `audio_path = None`, which the assembler treats as "no
/// audio", not an error. The missing-credential check runs before any
/// request.
pub async fn synthesize_segments(
    segments: &mut [Segment],
    provider: &TtsProvider,
    voice: &str,
    speed: f64,
    clips_dir: &Path,
) -> Result<()> {
    let api_key = provider.validate_api_key()?;
    let backend = provider.synthesizer(api_key);
    let client = reqwest::Client::new();

    tokio::fs::create_dir_all(clips_dir).await?;

    for seg in segments.iter_mut() {
        let text = if seg.translated.is_empty() {
            &seg.text
        } else {
            &seg.translated
        };
        let out_path = clips_dir.join(format!("segment_{:04}.mp3", seg.id));

        match backend
            .synthesize(&client, text, voice, speed, &out_path)
            .await
        {
            Ok(()) => seg.audio_path = Some(out_path),
            Err(e) => {
                log::warn!("synthesis failed for segment {}: {e}", seg.id);
                seg.audio_path = None;
            }
        }
    }

    Ok(())
}

struct ElevenLabsSynthesizer {
    api_key: String,
}

#[async_trait]
impl Synthesizer for ElevenLabsSynthesizer {
    async fn synthesize(
        &self,
        client: &reqwest::Client,
        text: &str,
        voice: &str,
        speed: f64,
        out_path: &Path,
    ) -> Result<()> {
        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{voice}");
        let bytes = client
            .post(url)
            .timeout(REQUEST_TIMEOUT)
            .header("xi-api-key", &self.api_key)
            .json(&serde_json::json!({
                "text": text,
                "model_id": "eleven_multilingual_v2",
                "voice_settings": {
                    "stability": 0.5,
                    "similarity_boost": 0.75,
                    "speed": speed,
                },
            }))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        tokio::fs::write(out_path, &bytes).await?;
        Ok(())
    }
}

struct OpenaiSynthesizer {
    api_key: String,
}

#[async_trait]
impl Synthesizer for OpenaiSynthesizer {
    async fn synthesize(
        &self,
        client: &reqwest::Client,
        text: &str,
        voice: &str,
        speed: f64,
        out_path: &Path,
    ) -> Result<()> {
        let bytes = client
            .post("https://api.openai.com/v1/audio/speech")
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": "tts-1",
                "input": text,
                "voice": voice,
                "speed": speed,
                "response_format": "mp3",
            }))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        tokio::fs::write(out_path, &bytes).await?;
        Ok(())
    }
}

struct FptSynthesizer {
    api_key: String,
}

#[async_trait]
impl Synthesizer for FptSynthesizer {
    async fn synthesize(
        &self,
        client: &reqwest::Client,
        text: &str,
        voice: &str,
        speed: f64,
        out_path: &Path,
    ) -> Result<()> {
        // FPT renders asynchronously: the first call returns a URL that
        // serves the clip once rendering finishes.
        let response = client
            .post("https://api.fpt.ai/hmi/tts/v5")
            .timeout(REQUEST_TIMEOUT)
            .header("api-key", &self.api_key)
            .header("voice", voice)
            .header("speed", format!("{speed}"))
            .body(text.to_string())
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let clip_url = response["async"]
            .as_str()
            .ok_or_else(|| DubError::SynthesisFailed {
                reason: format!("unexpected FPT response: {response}"),
            })?
            .to_string();

        for _ in 0..10 {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let reply = client.get(&clip_url).timeout(REQUEST_TIMEOUT).send().await?;
            if reply.status().is_success() {
                let bytes = reply.bytes().await?;
                tokio::fs::write(out_path, &bytes).await?;
                return Ok(());
            }
        }

        Err(DubError::SynthesisFailed {
            reason: format!("clip never became available at {clip_url}"),
        })
    }
}

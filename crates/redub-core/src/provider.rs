use crate::error::{DubError, Result};
use crate::types::Segment;

#[derive(Clone, Debug, Default)]
pub enum Provider {
    #[default]
    OpenRouter,
    Openai,
    Gemini,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
    /// Approximate blended price per 1M tokens in USD, for the
    /// informational cost estimate only.
    pub price_per_mtok: f64,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::OpenRouter => ProviderConfig {
                api_url: "https://openrouter.ai/api/v1/chat/completions",
                model: "meta-llama/llama-3.3-70b-instruct:free",
                env_var: "OPENROUTER_API_KEY",
                price_per_mtok: 0.0,
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-4o-mini",
                env_var: "OPENAI_API_KEY",
                price_per_mtok: 0.15,
            },
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-2.0-flash",
                env_var: "GEMINI_API_KEY",
                price_per_mtok: 0.0,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "OpenRouter",
            Provider::Openai => "OpenAI",
            Provider::Gemini => "Gemini",
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String> {
        let config = self.config();
        std::env::var(config.env_var).map_err(|_| DubError::MissingApiKey {
            env_var: config.env_var.to_string(),
        })
    }
}

/// Rough translation cost estimate in USD.
///
/// Informational only: roughly 1.3 tokens per word, doubled for the
/// response, against the provider's blended rate. Nothing in the pipeline
/// consults this value.
pub fn estimate_cost(segments: &[Segment], provider: &Provider) -> f64 {
    let total_words: usize = segments
        .iter()
        .map(|s| s.text.split_whitespace().count())
        .sum();
    let estimated_tokens = total_words as f64 * 1.3 * 2.0;

    let cost = estimated_tokens / 1_000_000.0 * provider.config().price_per_mtok;
    (cost * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str) -> Segment {
        Segment {
            id: 1,
            start: 0.0,
            end: 1.0,
            text: text.to_string(),
            translated: String::new(),
            audio_path: None,
        }
    }

    #[test]
    fn free_model_costs_nothing() {
        let segments = vec![seg("hello world"), seg("more words here")];
        assert_eq!(estimate_cost(&segments, &Provider::OpenRouter), 0.0);
    }

    #[test]
    fn paid_model_scales_with_word_count() {
        let segments: Vec<Segment> = (0..1000).map(|_| seg("ten words of text repeated to make the estimate visible")).collect();
        let cost = estimate_cost(&segments, &Provider::Openai);
        assert!(cost > 0.0);
    }
}

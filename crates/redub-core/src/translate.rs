use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::error::{DubError, Result};
use crate::provider::{Provider, ProviderConfig};
use crate::types::Segment;

pub const DEFAULT_BATCH_SIZE: usize = 20;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str =
    "You are a professional translator for video dubbing. Always reply with valid JSON.";

/// Id keys probed in priority order; models vary the casing.
const ID_KEYS: &[&str] = &["id", "Id", "ID"];

/// Translation keys probed in priority order; models pick different names
/// for the same logical field.
const TRANSLATION_KEYS: &[&str] = &["translated", "translation", "text", "target"];

/// Outcome of one translation batch. `Fallback` carries the reason the
/// batch degraded; its members get their source text as the translation.
#[derive(Debug)]
pub enum BatchOutcome {
    Translated(HashMap<u32, String>),
    Fallback(String),
}

/// Translate segments in batches, mutating `translated` in place.
///
/// Batches run strictly sequentially with a single attempt each. A failed
/// request or unparseable reply degrades that batch to identity fallback;
/// every segment is guaranteed a non-empty `translated` on return. The
/// only fatal error is a missing API key, raised before any network
/// activity.
pub async fn translate_segments(
    segments: &mut [Segment],
    provider: &Provider,
    target_lang: &str,
    batch_size: usize,
) -> Result<()> {
    let config = provider.config();
    let api_key = provider.validate_api_key()?;

    let client = reqwest::Client::new();

    for batch in segments.chunks_mut(batch_size.max(1)) {
        let outcome = match request_batch(&client, &config, &api_key, batch, target_lang).await {
            Ok(reply) => parse_batch_reply(&reply),
            Err(e) => BatchOutcome::Fallback(format!("request failed: {e}")),
        };
        apply_outcome(batch, outcome);
    }

    Ok(())
}

/// Translate one sentence outside the batch protocol. Returns the input
/// text unchanged on any failure.
pub async fn translate_single(text: &str, provider: &Provider, target_lang: &str) -> String {
    let config = provider.config();
    let api_key = match provider.validate_api_key() {
        Ok(key) => key,
        Err(e) => {
            log::warn!("single translation skipped: {e}");
            return text.to_string();
        }
    };

    let prompt = format!(
        "Translate the following sentence into {target_lang} naturally. Reply with the translation only:\n\n{text}"
    );

    let client = reqwest::Client::new();
    match request_completion(&client, &config, &api_key, &prompt).await {
        Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
        Ok(_) => text.to_string(),
        Err(e) => {
            log::warn!("single translation failed: {e}");
            text.to_string()
        }
    }
}

fn batch_prompt(batch: &[Segment], target_lang: &str) -> Result<String> {
    let pairs: Vec<Value> = batch
        .iter()
        .map(|seg| serde_json::json!({ "id": seg.id, "text": seg.text }))
        .collect();

    Ok(format!(
        r#"You are a professional translator. Translate the following sentences into {lang}, naturally and fitting the context of a video.

Rules:
1. Keep the meaning and emotion of the original sentence
2. Translate the way a native speaker talks, not word-by-word
3. Keep it concise so the dub fits the original timing
4. Keep proper names and technical terms unchanged

Return a JSON array with the format: [{{"id": 1, "translated": "..."}}]

Sentences to translate:
{segments}"#,
        lang = target_lang,
        segments = serde_json::to_string_pretty(&pairs)?
    ))
}

async fn request_batch(
    client: &reqwest::Client,
    config: &ProviderConfig,
    api_key: &str,
    batch: &[Segment],
    target_lang: &str,
) -> Result<String> {
    let prompt = batch_prompt(batch, target_lang)?;
    request_completion(client, config, api_key, &prompt).await
}

/// One chat-completions round trip; returns the assistant message text.
async fn request_completion(
    client: &reqwest::Client,
    config: &ProviderConfig,
    api_key: &str,
    prompt: &str,
) -> Result<String> {
    let response = client
        .post(config.api_url)
        .timeout(REQUEST_TIMEOUT)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&serde_json::json!({
            "model": config.model,
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT,
                },
                {
                    "role": "user",
                    "content": prompt,
                },
            ],
            "temperature": 0.3,
        }))
        .send()
        .await?
        .json::<Value>()
        .await?;

    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| DubError::TranslationFailed {
            reason: format!("unexpected response envelope: {response}"),
        })?;

    Ok(content.to_string())
}

/// Parse a free-text model reply into an id -> translation map.
///
/// The reply may carry the JSON array verbatim, inside a fenced code
/// block, or surrounded by prose. Unusable replies become `Fallback`.
pub fn parse_batch_reply(reply: &str) -> BatchOutcome {
    let candidate = extract_json_array(reply);

    let items = match parse_array(&candidate) {
        Some(items) => items,
        None => match parse_array(&repair_array(&candidate)) {
            Some(items) => items,
            None => return BatchOutcome::Fallback("reply is not a parseable JSON array".into()),
        },
    };

    let mut map = HashMap::new();
    for item in &items {
        let Some(id) = normalize_id(pick_field(item, ID_KEYS)) else {
            continue;
        };
        let Some(text) = pick_field(item, TRANSLATION_KEYS).and_then(Value::as_str) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        map.insert(id, text.to_string());
    }

    if map.is_empty() {
        BatchOutcome::Fallback("no usable translations in reply".into())
    } else {
        BatchOutcome::Translated(map)
    }
}

/// Fill `translated` for every segment of a batch.
///
/// Found ids take the mapped value; missing ids fall back to the source
/// text only when `translated` is still empty, so a value set by an
/// earlier attempt is never overwritten by a later fallback.
pub fn apply_outcome(batch: &mut [Segment], outcome: BatchOutcome) {
    let map = match outcome {
        BatchOutcome::Translated(map) => map,
        BatchOutcome::Fallback(reason) => {
            log::warn!("translation batch degraded to source text: {reason}");
            HashMap::new()
        }
    };

    for seg in batch.iter_mut() {
        match map.get(&seg.id) {
            Some(text) => seg.translated = text.clone(),
            None if seg.translated.is_empty() => seg.translated = seg.text.clone(),
            None => {}
        }
    }
}

fn parse_array(candidate: &str) -> Option<Vec<Value>> {
    match serde_json::from_str(candidate) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// Pull the most plausible JSON array span out of a reply: fenced block
/// interior first, then the first `[` .. last `]` span.
fn extract_json_array(reply: &str) -> String {
    if let Some(inner) = fenced_block_interior(reply) {
        return inner.trim().to_string();
    }

    if let (Some(start), Some(end)) = (reply.find('['), reply.rfind(']'))
        && start < end
    {
        return reply[start..=end].to_string();
    }

    reply.trim().to_string()
}

/// Interior of the first ``` fence, skipping an optional language tag on
/// the opening line.
fn fenced_block_interior(reply: &str) -> Option<&str> {
    let open = reply.find("```")?;
    let after_open = &reply[open + 3..];
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}

/// Bounded repair: ensure the candidate starts with `[` and ends with `]`,
/// giving strict parsing one more chance.
fn repair_array(candidate: &str) -> String {
    let mut repaired = candidate.trim().to_string();
    if !repaired.starts_with('[') {
        repaired.insert(0, '[');
    }
    if !repaired.ends_with(']') {
        repaired.push(']');
    }
    repaired
}

/// Probe candidate keys in priority order, returning the first present.
fn pick_field<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| item.get(key))
}

/// Canonicalize an id that may arrive as a JSON number or its string
/// form. Ids that fit neither representation are dropped; they could not
/// match any segment anyway.
fn normalize_id(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

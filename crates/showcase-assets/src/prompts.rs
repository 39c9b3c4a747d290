//! Image prompt requests and tolerant parsing of the model's JSON answer.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use showcase_descriptor::{Descriptor, Placeholder};

use crate::ollama::{GenerateRequest, TextGenerator};

/// Prompt used when the model gives nothing usable for an image.
pub const FALLBACK_PROMPT: &str = "warm animal shelter, cinematic lighting, ultra detailed photo";

/// Negative prompt used when the model gives nothing usable for an image.
pub const FALLBACK_NEGATIVE_PROMPT: &str = "text, letters, watermark, logo, brand, blurry";

const SYSTEM_INSTRUCTION: &str = "You write prompts for Stable Diffusion. \
Return ONLY valid JSON. No additional text. No markdown.";

const STRICT_JSON_SUFFIX: &str = "Respond ONLY with valid JSON. No extra text.";

/// Errors from the prompt request.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Text generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Text generation endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model response is not valid JSON after retry: {0}")]
    MalformedResponse(String),

    #[error("Failed to encode prompt request: {0}")]
    Encode(String),
}

/// Fixed visual direction shared by every image.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StyleDirective {
    pub look: String,
    pub avoid: String,
}

/// Product summary sent along with the placeholder list.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationContext {
    pub title: String,
    pub category: String,
    pub slug: String,
    pub value_proposition: String,
    pub subtitle: String,
    pub style: StyleDirective,
}

impl GenerationContext {
    /// Build the context from the descriptor's `meta` and `hero` fields.
    pub fn from_descriptor(descriptor: &Descriptor, style: StyleDirective) -> Self {
        Self {
            title: descriptor.text("meta/title"),
            category: descriptor.text("meta/category"),
            slug: descriptor.text("meta/slug"),
            value_proposition: descriptor.text("hero/valueProposition"),
            subtitle: descriptor.text("hero/subtitle"),
            style,
        }
    }
}

/// Positive/negative prompt pair for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRecord {
    pub prompt: String,
    pub negative_prompt: String,
}

impl PromptRecord {
    /// The record used for images the model skipped.
    pub fn fallback() -> Self {
        Self {
            prompt: FALLBACK_PROMPT.to_string(),
            negative_prompt: FALLBACK_NEGATIVE_PROMPT.to_string(),
        }
    }
}

/// Top-level shape of the model's answer.
///
/// Entries stay untyped so a single malformed entry cannot fail the batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptResponse {
    #[serde(default)]
    pub images: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct PromptEntry {
    #[serde(deserialize_with = "numeric_id")]
    id: u64,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default, alias = "negativePrompt")]
    negative_prompt: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Float(f64),
    Text(String),
}

/// Accepts `1`, `1.0` and `"1"`.
fn numeric_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Float(f) => whole_number(f)
            .ok_or_else(|| serde::de::Error::custom(format!("id {} is not a whole number", f))),
        RawId::Text(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
                .ok_or_else(|| serde::de::Error::custom(format!("invalid id {:?}", s)))
        }
    }
}

fn whole_number(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

#[derive(Serialize)]
struct RequestItem<'a> {
    id: usize,
    section: &'a str,
    alt: &'a str,
}

/// Prompt entries indexed by their numeric ID.
#[derive(Debug, Default)]
pub struct PromptBook {
    entries: HashMap<u64, PromptEntry>,
}

impl PromptBook {
    /// Index the usable entries of a response. Later duplicates win.
    pub fn from_response(response: &PromptResponse) -> Self {
        let mut entries = HashMap::new();

        for value in &response.images {
            match PromptEntry::deserialize(value) {
                Ok(entry) => {
                    entries.insert(entry.id, entry);
                }
                Err(e) => tracing::debug!("Ignoring prompt entry {}: {}", value, e),
            }
        }

        Self { entries }
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry was usable.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The record for `id`, with fallback values for anything missing or blank.
    pub fn record_for(&self, id: u64) -> PromptRecord {
        let entry = self.entries.get(&id);

        PromptRecord {
            prompt: non_blank_or(entry.and_then(|e| e.prompt.as_deref()), FALLBACK_PROMPT),
            negative_prompt: non_blank_or(
                entry.and_then(|e| e.negative_prompt.as_deref()),
                FALLBACK_NEGATIVE_PROMPT,
            ),
        }
    }
}

fn non_blank_or(value: Option<&str>, default: &str) -> String {
    value
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Slice from the first `{` to the last `}`, or the whole text if there is none.
pub fn extract_json_object(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => raw,
    }
}

/// Decode a model answer that may wrap its JSON in prose or code fences.
pub fn parse_prompt_response(raw: &str) -> Result<PromptResponse, serde_json::Error> {
    serde_json::from_str(extract_json_object(raw.trim()))
}

fn user_message(
    context: &GenerationContext,
    placeholders: &[Placeholder],
) -> Result<String, PromptError> {
    let items: Vec<RequestItem<'_>> = placeholders
        .iter()
        .enumerate()
        .map(|(i, p)| RequestItem {
            id: i + 1,
            section: &p.section,
            alt: &p.alt,
        })
        .collect();

    let context_json =
        serde_json::to_string_pretty(context).map_err(|e| PromptError::Encode(e.to_string()))?;
    let items_json =
        serde_json::to_string_pretty(&items).map_err(|e| PromptError::Encode(e.to_string()))?;

    Ok(format!(
        "Context:\n{context_json}\n\n\
         Return JSON in this format:\n\
         {{\"images\":[{{\"id\":1,\"prompt\":\"...\",\"negative_prompt\":\"...\"}}]}}\n\n\
         List:\n{items_json}\n\n\
         Write prompts in English. Negative prompts must strongly exclude text, logos and watermarks.\n\
         Return ONLY JSON."
    ))
}

/// Ask the model for one prompt per placeholder.
///
/// Always returns exactly `placeholders.len()` records in placeholder order.
/// A response that is not valid JSON is retried once at temperature 0.
pub async fn request_prompts<G: TextGenerator + ?Sized>(
    generator: &G,
    context: &GenerationContext,
    placeholders: &[Placeholder],
    temperature: f64,
) -> Result<Vec<PromptRecord>, PromptError> {
    if placeholders.is_empty() {
        tracing::info!("No image placeholders, skipping prompt request");
        return Ok(Vec::new());
    }

    let prompt = user_message(context, placeholders)?;

    let first = generator
        .generate(&GenerateRequest {
            system: SYSTEM_INSTRUCTION.to_string(),
            prompt: prompt.clone(),
            temperature,
        })
        .await?;

    let response = match parse_prompt_response(&first) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Model answer is not valid JSON ({}), retrying strictly", e);

            let retry = generator
                .generate(&GenerateRequest {
                    system: SYSTEM_INSTRUCTION.to_string(),
                    prompt: format!("{}\n\n{}", prompt, STRICT_JSON_SUFFIX),
                    temperature: 0.0,
                })
                .await?;

            parse_prompt_response(&retry)
                .map_err(|e| PromptError::MalformedResponse(e.to_string()))?
        }
    };

    let book = PromptBook::from_response(&response);
    if book.len() < placeholders.len() {
        tracing::warn!(
            "Model returned {} of {} prompts, using defaults for the rest",
            book.len(),
            placeholders.len()
        );
    }

    Ok((1..=placeholders.len())
        .map(|id| book.record_for(id as u64))
        .collect())
}

use super::options::OptionsReader;
use super::types::{ExecutionResult, Metadata, ToolInput};
use crate::config::Translate;
use crate::error::ToolError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

pub const TOOL_ID: &str = "text-translator";

const SYSTEM_PROMPT: &str = "You are a professional translation engine. Translate the user content into the target language only. Do not add explanations or quotes, respond with translated text only.";
const LLM_FAILED: &str = "AI translation request failed";
const CUSTOM_FAILED: &str = "Translation service request failed";

#[derive(Debug, Clone)]
pub struct TextTranslatorOptions {
    pub source_lang: String,
    pub target_lang: String,
    pub target_lang2: Option<String>,
}

impl TextTranslatorOptions {
    /// Non-blank targets, first occurrence wins.
    pub fn targets(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for lang in std::iter::once(&self.target_lang).chain(self.target_lang2.as_ref()) {
            if !lang.trim().is_empty() && !out.contains(lang) {
                out.push(lang.clone());
            }
        }
        out
    }
}

/// Translation backend picked once from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// OpenAI-compatible chat completion endpoint.
    Chat {
        vendor: &'static str,
        base_url: String,
        model: String,
        api_key: String,
    },
    /// Generic `{q, source, target, format}` endpoint returning `translatedText`.
    Custom { url: String, api_key: Option<String> },
    /// No service configured: echo the input.
    Identity,
}

impl Provider {
    /// DeepSeek key, then OpenAI key, then a generic endpoint URL, else identity.
    /// `lookup` returns the value of an environment variable; blank values count as unset.
    pub fn resolve<F>(cfg: &Translate, lookup: F) -> Provider
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(api_key) = var(&cfg.deepseek_key_env) {
            return Provider::Chat {
                vendor: "deepseek",
                base_url: var("DEEPSEEK_API_BASE_URL").unwrap_or_else(|| cfg.deepseek_base_url.clone()),
                model: var("DEEPSEEK_TRANSLATE_MODEL").unwrap_or_else(|| cfg.deepseek_model.clone()),
                api_key,
            };
        }
        if let Some(api_key) = var(&cfg.openai_key_env) {
            return Provider::Chat {
                vendor: "openai",
                base_url: cfg.openai_base_url.clone(),
                model: var("OPENAI_TRANSLATE_MODEL").unwrap_or_else(|| cfg.openai_model.clone()),
                api_key,
            };
        }
        if let Some(url) = var(&cfg.custom_url_env) {
            return Provider::Custom {
                url,
                api_key: var(&cfg.custom_key_env),
            };
        }
        Provider::Identity
    }

    pub fn from_env(cfg: &Translate) -> Provider {
        Self::resolve(cfg, |name| std::env::var(name).ok())
    }

    /// `deepseek:<model>`, `openai:<model>`, `custom-api`, or none.
    pub fn service_name(&self) -> Option<String> {
        match self {
            Provider::Chat { vendor, model, .. } => Some(format!("{vendor}:{model}")),
            Provider::Custom { .. } => Some("custom-api".into()),
            Provider::Identity => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    pub lang: String,
    pub text: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Serialize)]
struct CustomRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Deserialize)]
struct CustomResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TextTranslator {
    provider: Provider,
    temperature: f32,
    http: Client,
}

impl TextTranslator {
    pub fn new(provider: Provider, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
            http: Client::new(),
        }
    }

    pub fn validate(&self, raw: &Value) -> Result<TextTranslatorOptions, ToolError> {
        let opts = OptionsReader::new(TOOL_ID, raw)?;
        Ok(TextTranslatorOptions {
            source_lang: opts.string("sourceLang", "auto")?,
            target_lang: opts.string("targetLang", "zh")?,
            target_lang2: opts.optional_string("targetLang2")?,
        })
    }

    pub async fn process(&self, input: ToolInput, opts: TextTranslatorOptions) -> Result<ExecutionResult, ToolError> {
        let form = input.into_form("Text Translator")?;
        let text = form
            .text("text")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ToolError::processing("No text provided"))?;

        let targets = opts.targets();
        if targets.is_empty() {
            return Err(ToolError::processing("No target language provided"));
        }

        let source = if opts.source_lang.is_empty() { "auto" } else { opts.source_lang.as_str() };
        let service_name = self.provider.service_name();

        let mut results = Vec::with_capacity(targets.len());
        for target in &targets {
            let translated = match &self.provider {
                Provider::Chat {
                    base_url,
                    model,
                    api_key,
                    ..
                } => self.chat(base_url, model, api_key, source, target, text).await?,
                Provider::Custom { url, api_key } => {
                    self.custom(url, api_key.as_deref(), source, target, text).await?
                }
                Provider::Identity => text.to_string(),
            };
            results.push(Translation {
                lang: target.clone(),
                text: translated,
            });
        }

        let used_external = !matches!(self.provider, Provider::Identity);
        if !used_external {
            debug!("no translation service configured, echoing input");
        }

        let payload = serde_json::to_vec(&json!({ "results": results, "sourceLang": source }))
            .map_err(|e| ToolError::failed("Failed to encode translations", e))?;

        info!(
            "translated {} chars into {:?} via {}",
            text.chars().count(),
            targets,
            service_name.as_deref().unwrap_or("identity")
        );

        let mut metadata = Metadata::new();
        metadata.insert("originalTextLength".into(), json!(utf16_len(text)));
        metadata.insert(
            "translatedTextLength".into(),
            json!(results.iter().map(|r| utf16_len(&r.text)).sum::<usize>()),
        );
        metadata.insert("sourceLang".into(), json!(opts.source_lang));
        metadata.insert("targetLangs".into(), json!(targets));
        metadata.insert("mimeType".into(), json!("application/json; charset=utf-8"));
        metadata.insert("fileName".into(), json!("translations.json"));
        metadata.insert("usedExternalService".into(), json!(used_external));
        metadata.insert("serviceConfigured".into(), json!(service_name.is_some()));
        metadata.insert("serviceName".into(), json!(service_name));

        Ok(ExecutionResult::buffered(payload, metadata))
    }

    async fn chat(
        &self,
        base_url: &str,
        model: &str,
        api_key: &str,
        source: &str,
        target: &str,
        text: &str,
    ) -> Result<String, ToolError> {
        let user = format!("Source language: {source}\nTarget language: {target}\nText:\n{text}");
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: self.temperature,
        };
        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));

        let response: ChatResponse = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| upstream(LLM_FAILED, e))?
            .error_for_status()
            .map_err(|e| upstream(LLM_FAILED, e))?
            .json()
            .await
            .map_err(|e| upstream(LLM_FAILED, e))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(content.unwrap_or_else(|| text.to_string()))
    }

    async fn custom(
        &self,
        url: &str,
        api_key: Option<&str>,
        source: &str,
        target: &str,
        text: &str,
    ) -> Result<String, ToolError> {
        let body = CustomRequest {
            q: text,
            source,
            target,
            format: "text",
        };
        let mut request = self.http.post(url).json(&body);
        if let Some(key) = api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response: CustomResponse = request
            .send()
            .await
            .map_err(|e| upstream(CUSTOM_FAILED, e))?
            .error_for_status()
            .map_err(|e| upstream(CUSTOM_FAILED, e))?
            .json()
            .await
            .map_err(|e| upstream(CUSTOM_FAILED, e))?;

        Ok(response
            .translated_text
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| text.to_string()))
    }
}

fn upstream(label: &str, e: reqwest::Error) -> ToolError {
    warn!("{label}: {e}");
    ToolError::failed(label, e)
}

/// Length in UTF-16 code units, matching what browser clients report for the same text.
fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

//! Best-effort spelling/grammar correction of recognized text.
//!
//! The backend is checked once when the [`TextCorrector`] is built. If it is
//! absent, or fails on a particular request, text passes through untouched.
//! Correction never fails the pipeline.

use std::time::Duration;

use serde::Deserialize;

use crate::config::CorrectionConfig;
use crate::error::CorrectionError;

pub trait CorrectionBackend {
    fn name(&self) -> &str;
    fn correct(&self, text: &str) -> Result<String, CorrectionError>;
}

pub struct TextCorrector {
    backend: Option<Box<dyn CorrectionBackend>>,
}

impl TextCorrector {
    /// Corrector with no backend: `correct` is the identity.
    pub fn passthrough() -> Self {
        Self { backend: None }
    }

    pub fn with_backend(backend: Box<dyn CorrectionBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Checks the configured LanguageTool server once. An unreachable or
    /// disabled backend yields a passthrough corrector.
    pub fn detect(config: &CorrectionConfig) -> Self {
        if !config.enabled {
            tracing::info!("Text correction disabled");
            return Self::passthrough();
        }

        match LanguageToolClient::connect(config) {
            Ok(client) => {
                tracing::info!(url = %config.url, "Text correction backend available");
                Self::with_backend(Box::new(client))
            }
            Err(e) => {
                tracing::info!("Text correction unavailable, passing text through: {}", e);
                Self::passthrough()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn correct(&self, text: &str) -> String {
        let Some(backend) = self.backend.as_ref() else {
            return text.to_string();
        };
        if text.trim().is_empty() {
            return text.to_string();
        }

        match backend.correct(text) {
            Ok(corrected) => corrected,
            Err(e) => {
                tracing::debug!(backend = backend.name(), "Correction skipped: {}", e);
                text.to_string()
            }
        }
    }
}

/// Client for the LanguageTool HTTP API (`/v2/check`).
pub struct LanguageToolClient {
    client: reqwest::blocking::Client,
    base_url: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<RuleMatch>,
}

/// One finding from the checker. Offsets count characters.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleMatch {
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub replacements: Vec<Replacement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Replacement {
    pub value: String,
}

impl LanguageToolClient {
    pub fn connect(config: &CorrectionConfig) -> Result<Self, CorrectionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CorrectionError::Unavailable(e.to_string()))?;

        let base_url = config.url.trim_end_matches('/').to_string();
        client
            .get(format!("{}/v2/languages", base_url))
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| CorrectionError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            language: config.language.clone(),
        })
    }
}

impl CorrectionBackend for LanguageToolClient {
    fn name(&self) -> &str {
        "languagetool"
    }

    fn correct(&self, text: &str) -> Result<String, CorrectionError> {
        let response: CheckResponse = self
            .client
            .post(format!("{}/v2/check", self.base_url))
            .form(&[("text", text), ("language", self.language.as_str())])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| CorrectionError::Request(e.to_string()))?;

        Ok(apply_corrections(text, &response.matches))
    }
}

/// Applies the first suggested replacement of every match. Matches without
/// suggestions, out of range, or overlapping an earlier match are skipped.
pub fn apply_corrections(text: &str, matches: &[RuleMatch]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut ordered: Vec<&RuleMatch> = matches.iter().collect();
    ordered.sort_by_key(|m| m.offset);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for m in ordered {
        let Some(replacement) = m.replacements.first() else {
            continue;
        };
        let end = m.offset.saturating_add(m.length);
        if m.offset < cursor || end > chars.len() {
            continue;
        }
        out.extend(&chars[cursor..m.offset]);
        out.push_str(&replacement.value);
        cursor = end;
    }
    out.extend(&chars[cursor..]);
    out
}

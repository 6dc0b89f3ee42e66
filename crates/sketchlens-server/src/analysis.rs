//! Sketch analysis: remote collaborators and the orchestration around them.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use sketchlens_core::{AnalysisReport, DetailLevel, Language, PromptError, PromptSelection, PromptStyle};
use thiserror::Error;
use tracing::{info, warn};

/// Creativity used when the request leaves it out.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Analysis errors.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Message reported by the remote service, verbatim.
    #[error("{0}")]
    Remote(String),
    #[error("Sketch analysis is not configured; set OPENAI_API_KEY")]
    NotConfigured,
}

/// Speech synthesis errors.
#[derive(Debug, Error)]
#[error("Speech synthesis failed: {0}")]
pub struct SynthesisError(pub String);

/// A vision model that describes an image given an instruction.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Returns the model's text; empty when it produced none.
    async fn analyze(
        &self,
        prompt: &str,
        image_base64: &str,
        temperature: f32,
    ) -> Result<String, AnalysisError>;
}

/// A text-to-speech service returning MP3 audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<Vec<u8>, SynthesisError>;
}

/// Analysis request as received over HTTP.
///
/// Selections arrive as free text and are validated before anything is
/// composed or sent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub style: String,
    pub language: String,
    #[serde(default = "default_detail")]
    pub detail: u8,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub extra_context: Option<String>,
    /// Also synthesize speech for the result.
    #[serde(default)]
    pub speak: bool,
}

fn default_detail() -> u8 {
    DetailLevel::default().get()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl AnalysisRequest {
    /// Validate the selections.
    pub fn selection(&self) -> Result<PromptSelection, PromptError> {
        Ok(PromptSelection {
            style: self.style.parse::<PromptStyle>()?,
            language: self.language.parse::<Language>()?,
            detail: DetailLevel::new(self.detail)?,
            extra_context: self.extra_context.clone(),
        })
    }

    /// Temperature, checked against `0.0..=1.0`.
    pub fn checked_temperature(&self) -> Result<f32, PromptError> {
        if (0.0..=1.0).contains(&self.temperature) {
            Ok(self.temperature)
        } else {
            Err(PromptError::InvalidSelection {
                field: "temperature",
                value: self.temperature.to_string(),
            })
        }
    }
}

/// Everything an analysis produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub prompt: String,
    pub text: String,
    /// Markdown report, also kept on the session for download.
    pub report: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    /// Non-fatal problems, e.g. speech that could not be produced.
    pub notices: Vec<String>,
}

/// Run one analysis.
///
/// Speech only runs once the text exists, and its failure is reported as a
/// notice next to the successful result.
pub async fn run_analysis(
    analyzer: &dyn VisionAnalyzer,
    speech: Option<&dyn SpeechSynthesizer>,
    selection: &PromptSelection,
    temperature: f32,
    speak: bool,
    image_base64: &str,
) -> Result<(AnalysisOutcome, AnalysisReport), AnalysisError> {
    let prompt = selection.compose();
    let language = selection.language;

    let text = analyzer.analyze(&prompt, image_base64, temperature).await?;
    let text = if text.trim().is_empty() {
        language.no_response_text().to_string()
    } else {
        text
    };
    info!(style = %selection.style, language = language.code(), chars = text.len(), "analysis complete");

    let mut notices = Vec::new();
    let mut audio_base64 = None;
    if speak {
        match speech {
            Some(synth) => match synth.synthesize(&text, language.code()).await {
                Ok(mp3) => audio_base64 = Some(STANDARD.encode(mp3)),
                Err(e) => {
                    warn!("speech synthesis failed: {e}");
                    notices.push(e.to_string());
                }
            },
            None => notices.push("Speech synthesis is not available".to_string()),
        }
    }

    let report = AnalysisReport::new(language, prompt.clone(), text.clone());
    let outcome = AnalysisOutcome {
        prompt,
        text,
        report: report.to_markdown(),
        audio_base64,
        notices,
    };
    Ok((outcome, report))
}

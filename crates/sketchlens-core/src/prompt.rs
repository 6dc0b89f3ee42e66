//! Analysis prompt composition.
//!
//! The prompt is a pure function of the UI selections: an instruction chosen
//! by output style and language, a detail clause carrying the level as
//! `n/5`, and an optional extra-context clause.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prompt errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Invalid {field} selection: {value:?}")]
    InvalidSelection { field: &'static str, value: String },
}

impl PromptError {
    fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        PromptError::InvalidSelection {
            field,
            value: value.into(),
        }
    }
}

/// Output style requested from the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum PromptStyle {
    Brief,
    BulletSummary,
    CritiqueAndSuggestions,
    Tags,
}

impl PromptStyle {
    pub const ALL: [PromptStyle; 4] = [
        PromptStyle::Brief,
        PromptStyle::BulletSummary,
        PromptStyle::CritiqueAndSuggestions,
        PromptStyle::Tags,
    ];

    /// Stable identifier used on the wire.
    pub fn id(self) -> &'static str {
        match self {
            PromptStyle::Brief => "brief",
            PromptStyle::BulletSummary => "bullet-summary",
            PromptStyle::CritiqueAndSuggestions => "critique-and-suggestions",
            PromptStyle::Tags => "tags",
        }
    }

    /// Label shown in the selector for `language`.
    pub fn label(self, language: Language) -> &'static str {
        match (self, language) {
            (PromptStyle::Brief, Language::Spanish) => "Descripción breve",
            (PromptStyle::BulletSummary, Language::Spanish) => "Resumen con viñetas",
            (PromptStyle::CritiqueAndSuggestions, Language::Spanish) => "Crítica y mejoras",
            (PromptStyle::Tags, Language::Spanish) => "Etiquetas (tags)",
            (PromptStyle::Brief, Language::English) => "Brief description",
            (PromptStyle::BulletSummary, Language::English) => "Bullet summary",
            (PromptStyle::CritiqueAndSuggestions, Language::English) => "Critique and improvements",
            (PromptStyle::Tags, Language::English) => "Tags",
        }
    }
}

impl FromStr for PromptStyle {
    type Err = PromptError;

    /// Accepts the wire identifiers and the selector labels of both languages.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        PromptStyle::ALL
            .into_iter()
            .find(|style| {
                trimmed.eq_ignore_ascii_case(style.id())
                    || Language::ALL.iter().any(|&lang| trimmed == style.label(lang))
            })
            .ok_or_else(|| PromptError::invalid("style", s))
    }
}

impl TryFrom<String> for PromptStyle {
    type Error = PromptError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Language of the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Language {
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "en")]
    English,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Spanish, Language::English];

    /// ISO 639-1 code, also used for speech synthesis.
    pub fn code(self) -> &'static str {
        match self {
            Language::Spanish => "es",
            Language::English => "en",
        }
    }

    /// Name of the language in itself.
    pub fn name(self) -> &'static str {
        match self {
            Language::Spanish => "Español",
            Language::English => "English",
        }
    }

    /// Placeholder shown when the analysis comes back empty.
    pub fn no_response_text(self) -> &'static str {
        match self {
            Language::Spanish => "(Sin respuesta)",
            Language::English => "(No response)",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            Language::Spanish => "Analiza el boceto y devuelve",
            Language::English => "Analyze the sketch and return",
        }
    }

    fn detail_label(self) -> &'static str {
        match self {
            Language::Spanish => "Nivel de detalle:",
            Language::English => "Detail level:",
        }
    }

    fn extra_label(self) -> &'static str {
        match self {
            Language::Spanish => "Contexto adicional:",
            Language::English => "Extra context:",
        }
    }
}

impl FromStr for Language {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "es" | "español" | "espanol" | "spanish" => Ok(Language::Spanish),
            "en" | "english" | "inglés" | "ingles" => Ok(Language::English),
            _ => Err(PromptError::invalid("language", s)),
        }
    }
}

impl TryFrom<String> for Language {
    type Error = PromptError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Requested level of detail, 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DetailLevel(u8);

impl DetailLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(level: u8) -> Result<Self, PromptError> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(PromptError::invalid("detail level", level.to_string()))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for DetailLevel {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for DetailLevel {
    type Error = PromptError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DetailLevel> for u8 {
    fn from(level: DetailLevel) -> Self {
        level.0
    }
}

/// What the analysis should return, per style and language.
fn goal(style: PromptStyle, language: Language) -> &'static str {
    match (style, language) {
        (PromptStyle::Brief, Language::Spanish) => "una descripción breve y clara en español",
        (PromptStyle::BulletSummary, Language::Spanish) => {
            "un resumen con viñetas (bullet points) en español, conciso y estructurado"
        }
        (PromptStyle::CritiqueAndSuggestions, Language::Spanish) => {
            "una crítica constructiva en español con 3–5 sugerencias de mejora"
        }
        (PromptStyle::Tags, Language::Spanish) => {
            "una lista de 5–10 etiquetas (tags) en español, separadas por comas"
        }
        (PromptStyle::Brief, Language::English) => "a brief, clear description in English",
        (PromptStyle::BulletSummary, Language::English) => {
            "a concise, structured bullet list in English"
        }
        (PromptStyle::CritiqueAndSuggestions, Language::English) => {
            "constructive critique in English with 3–5 improvement suggestions"
        }
        (PromptStyle::Tags, Language::English) => "a list of 5–10 tags in English, comma-separated",
    }
}

/// Build the analysis instruction.
///
/// `extra_context` is trimmed; when nothing remains the extra-context clause
/// is left out entirely.
pub fn compose_prompt(
    style: PromptStyle,
    language: Language,
    detail: DetailLevel,
    extra_context: Option<&str>,
) -> String {
    let mut prompt = format!(
        "{} {}. {} {}/5.",
        language.instruction(),
        goal(style, language),
        language.detail_label(),
        detail.get()
    );
    if let Some(extra) = extra_context.map(str::trim).filter(|e| !e.is_empty()) {
        prompt.push(' ');
        prompt.push_str(language.extra_label());
        prompt.push(' ');
        prompt.push_str(extra);
    }
    prompt
}

/// A complete set of prompt selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptSelection {
    pub style: PromptStyle,
    pub language: Language,
    #[serde(default)]
    pub detail: DetailLevel,
    #[serde(default)]
    pub extra_context: Option<String>,
}

impl PromptSelection {
    pub fn compose(&self) -> String {
        compose_prompt(
            self.style,
            self.language,
            self.detail,
            self.extra_context.as_deref(),
        )
    }
}

//! Markdown reports of a sketch analysis.

use crate::prompt::Language;
use chrono::{Local, NaiveDateTime};

/// MIME type of exported reports.
pub const REPORT_MIME: &str = "text/markdown";

/// Suggested download name for exported reports.
pub const REPORT_FILE_NAME: &str = "sketch_analysis.md";

/// The result of one analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Local wall-clock time the analysis finished.
    pub created_at: NaiveDateTime,
    pub language: Language,
    pub prompt: String,
    pub text: String,
}

impl AnalysisReport {
    /// Create a report stamped with the current local time.
    pub fn new(language: Language, prompt: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_timestamp(Local::now().naive_local(), language, prompt, text)
    }

    pub fn with_timestamp(
        created_at: NaiveDateTime,
        language: Language,
        prompt: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            created_at,
            language,
            prompt: prompt.into(),
            text: text.into(),
        }
    }

    /// Timestamp as ISO 8601 with seconds precision.
    pub fn timestamp(&self) -> String {
        self.created_at.format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    /// Render the downloadable Markdown report.
    pub fn to_markdown(&self) -> String {
        let (title, date) = match self.language {
            Language::Spanish => ("Análisis del boceto", "Fecha"),
            Language::English => ("Sketch analysis", "Date"),
        };
        format!(
            "# {title}\n\n**{date}:** {}\n\n**Prompt:** {}\n\n---\n\n{}\n",
            self.timestamp(),
            self.prompt,
            self.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .and_then(|d| d.and_hms_milli_opt(9, 3, 7, 450))
            .unwrap()
    }

    #[test]
    fn test_spanish_report() {
        let report = AnalysisReport::with_timestamp(stamp(), Language::Spanish, "P", "- uno\n- dos");
        assert_eq!(
            report.to_markdown(),
            "# Análisis del boceto\n\n**Fecha:** 2024-05-17T09:03:07\n\n**Prompt:** P\n\n---\n\n- uno\n- dos\n"
        );
    }

    #[test]
    fn test_english_report() {
        let report = AnalysisReport::with_timestamp(stamp(), Language::English, "Analyze", "A house.");
        let md = report.to_markdown();
        assert!(md.starts_with("# Sketch analysis\n\n**Date:** 2024-05-17T09:03:07"));
        assert!(md.contains("**Prompt:** Analyze"));
        assert!(md.ends_with("---\n\nA house.\n"));
    }
}

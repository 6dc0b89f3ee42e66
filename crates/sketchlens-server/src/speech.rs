//! Text-to-speech through Google Translate's public TTS endpoint.

use crate::analysis::{SpeechSynthesizer, SynthesisError};
use crate::config::ServerConfig;
use async_trait::async_trait;
use tracing::debug;

const TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// The endpoint rejects longer queries.
pub const MAX_CHUNK_CHARS: usize = 100;

/// Speech synthesizer producing MP3 audio.
pub struct GoogleTts {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTts {
    pub fn from_config(config: &ServerConfig) -> Result<Self, SynthesisError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sketchlens/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SynthesisError(format!("HTTP client error: {e}")))?;
        Ok(Self {
            client,
            endpoint: TTS_ENDPOINT.to_string(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<Vec<u8>, SynthesisError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SynthesisError("nothing to read aloud".to_string()));
        }

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let total = chunks.len().to_string();
            let idx = idx.to_string();
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", language_code),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                ])
                .send()
                .await
                .map_err(|e| SynthesisError(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(SynthesisError(format!("TTS service returned {status}")));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| SynthesisError(e.to_string()))?;
            audio.extend_from_slice(&bytes);
        }
        debug!(chunks = chunks.len(), bytes = audio.len(), "synthesized speech");
        Ok(audio)
    }
}

/// Split `text` into chunks of at most `max_chars` characters, breaking at
/// whitespace where possible. Words longer than a chunk are split.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(chunk_text("  hola   mundo ", 100), vec!["hola mundo"]);
        assert!(chunk_text("   ", 100).is_empty());
    }

    #[test]
    fn test_chunks_respect_limit() {
        let text = "análisis ".repeat(40);
        let chunks = chunk_text(&text, MAX_CHUNK_CHARS);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_CHUNK_CHARS));
        assert_eq!(chunks.join(" "), text.trim());
    }

    #[test]
    fn test_long_word_is_split() {
        let word = "x".repeat(250);
        let chunks = chunk_text(&format!("a {word} b"), 100);
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[0], "a");
        assert_eq!(chunks[1].len(), 100);
        assert_eq!(chunks[3].len(), 50);
        assert_eq!(chunks[4], "b");
    }
}

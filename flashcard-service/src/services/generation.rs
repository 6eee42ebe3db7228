//! Flashcard generation from extracted study material.

use crate::models::Card;
use crate::services::metrics;
use crate::services::providers::{GenerationParams, TextProvider};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

/// Content beyond this many characters is not sent to the model.
pub const MAX_CONTENT_CHARS: usize = 4000;

const SYSTEM_INSTRUCTION: &str = "You are an expert educational content creator. Generate \
high-quality flashcards from the provided content.

Rules:
1. Create concise, clear questions that test understanding
2. Provide comprehensive but not overly long answers
3. Focus on key concepts, definitions, and important facts
4. Vary question types (what, how, why, when, where)
5. {count}
6. Ensure the response is valid JSON

Format your response as a JSON array of objects with \"question\" and \"answer\" fields only.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSource {
    /// Uploaded file: exactly 10 cards.
    File,
    /// Pasted text: 5 to 15 cards depending on length.
    Text,
}

impl GenerationSource {
    fn count_rule(&self) -> &'static str {
        match self {
            GenerationSource::File => "Return exactly 10 flashcards in JSON format",
            GenerationSource::Text => {
                "Return between 5 and 15 flashcards in JSON format, depending on how much \
                 material there is"
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            GenerationSource::File => "file",
            GenerationSource::Text => "text",
        }
    }
}

pub struct GeneratedCards {
    pub cards: Vec<Card>,
    /// True when the model failed and generic cards were substituted.
    pub fallback: bool,
}

#[derive(Debug, Deserialize)]
struct RawCard {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Clone)]
pub struct FlashcardGenerator {
    provider: Arc<dyn TextProvider>,
}

impl FlashcardGenerator {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate(&self, content: &str, source: GenerationSource) -> GeneratedCards {
        let now = Utc::now();
        let excerpt = truncate_chars(content, MAX_CONTENT_CHARS);

        let params = GenerationParams {
            system_instruction: Some(SYSTEM_INSTRUCTION.replace("{count}", source.count_rule())),
            json_output: true,
            ..Default::default()
        };
        let prompt = format!("Generate flashcards from this content:\n\n{}", excerpt);

        tracing::info!(
            content_length = content.len(),
            source = source.label(),
            provider = self.provider.name(),
            "Generating flashcards"
        );

        let started = Instant::now();
        let result = self.provider.generate(&prompt, &[], &params).await;
        metrics::record_ai_request("flashcards", result.is_ok(), started.elapsed());

        let parsed = match result {
            Ok(response) => {
                metrics::record_ai_tokens("flashcards", response.input_tokens, response.output_tokens);
                let text = response.text.unwrap_or_default();
                let pairs = parse_flashcards(&text);
                if pairs.is_empty() {
                    tracing::warn!(
                        response_preview = %truncate_chars(&text, 200),
                        "AI response contained no usable flashcards"
                    );
                }
                pairs
            }
            Err(e) => {
                tracing::warn!(error = %e, "Flashcard generation failed");
                Vec::new()
            }
        };

        let fallback = parsed.is_empty();
        let cards = if fallback {
            fallback_cards(now)
        } else {
            number_cards(parsed, now)
        };

        metrics::record_cards_generated(source.label(), cards.len(), fallback);
        tracing::info!(count = cards.len(), fallback, "Flashcards generated");

        GeneratedCards { cards, fallback }
    }
}

/// Cut `s` to at most `max` characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Remove a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Question/answer pairs from a model response. Blank entries are dropped.
pub fn parse_flashcards(text: &str) -> Vec<(String, String)> {
    let body = strip_code_fences(text);

    let raw: Vec<RawCard> = serde_json::from_str(body)
        .ok()
        .or_else(|| {
            let start = body.find('[')?;
            let end = body.rfind(']')?;
            if end <= start {
                return None;
            }
            serde_json::from_str(&body[start..=end]).ok()
        })
        .unwrap_or_default();

    raw.into_iter()
        .filter_map(|c| {
            let question = c.question?.trim().to_string();
            let answer = c.answer?.trim().to_string();
            (!question.is_empty() && !answer.is_empty()).then_some((question, answer))
        })
        .collect()
}

fn number_cards(pairs: Vec<(String, String)>, now: DateTime<Utc>) -> Vec<Card> {
    pairs
        .into_iter()
        .zip(1u32..)
        .map(|((question, answer), id)| Card::new(id, question, answer, now))
        .collect()
}

pub fn fallback_cards(now: DateTime<Utc>) -> Vec<Card> {
    number_cards(
        vec![
            (
                "What is the main topic of this content?".to_string(),
                "Based on the uploaded content, this appears to cover key educational concepts \
                 that would benefit from spaced repetition learning."
                    .to_string(),
            ),
            (
                "What learning technique does this content support?".to_string(),
                "This content supports spaced repetition learning, which helps improve \
                 long-term retention of information."
                    .to_string(),
            ),
        ],
        now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use crate::services::providers::MockTextProvider;

    #[test]
    fn parses_plain_json_array() {
        let cards = parse_flashcards(
            r#"[{"question":"What is 2+2?","answer":"4"},{"question":"Capital of France?","answer":"Paris"}]"#,
        );
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1], ("Capital of France?".to_string(), "Paris".to_string()));
    }

    #[test]
    fn parses_fenced_json() {
        let text = "```json\n[{\"question\":\"Q\",\"answer\":\"A\"}]\n```";
        assert_eq!(parse_flashcards(text).len(), 1);
    }

    #[test]
    fn parses_array_embedded_in_prose() {
        let text = "Here you go:\n[{\"question\":\"Q\",\"answer\":\"A\"}]\nHope this helps!";
        assert_eq!(parse_flashcards(text).len(), 1);
    }

    #[test]
    fn drops_blank_or_missing_fields() {
        let text = r#"[{"question":"Q1","answer":"A1"},{"question":"  ","answer":"A2"},{"answer":"A3"}]"#;
        assert_eq!(parse_flashcards(text), vec![("Q1".to_string(), "A1".to_string())]);
    }

    #[test]
    fn unparseable_text_yields_nothing() {
        assert!(parse_flashcards("I cannot help with that").is_empty());
        assert!(parse_flashcards("] nonsense [").is_empty());
        assert!(parse_flashcards(r#"{"question":"Q","answer":"A"}"#).is_empty());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let s = "héllo wörld";
        assert_eq!(truncate_chars(s, 2), "hé");
        assert_eq!(truncate_chars(s, 100), s);
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn strip_code_fences_leaves_plain_text() {
        assert_eq!(strip_code_fences("  [1]  "), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
    }

    #[tokio::test]
    async fn generated_cards_are_numbered_and_due() {
        let generator = FlashcardGenerator::new(Arc::new(MockTextProvider::with_response(
            r#"[{"question":"Q1","answer":"A1"},{"question":"Q2","answer":"A2"},{"question":"Q3","answer":"A3"}]"#,
        )));

        let before = Utc::now();
        let result = generator.generate("some notes", GenerationSource::Text).await;

        assert!(!result.fallback);
        let ids: Vec<u32> = result.cards.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        for card in &result.cards {
            assert_eq!(card.difficulty, Difficulty::Medium);
            assert_eq!(card.review_count, 0);
            assert!(card.next_review >= before);
            assert!(card.last_reviewed.is_none());
        }
    }

    #[tokio::test]
    async fn provider_failure_uses_fallback_cards() {
        let generator = FlashcardGenerator::new(Arc::new(MockTextProvider::new(false)));
        let result = generator.generate("notes", GenerationSource::File).await;

        assert!(result.fallback);
        assert_eq!(result.cards.len(), 2);
        assert_eq!(result.cards[0].question, "What is the main topic of this content?");
    }

    #[tokio::test]
    async fn garbage_response_uses_fallback_cards() {
        let generator =
            FlashcardGenerator::new(Arc::new(MockTextProvider::with_response("not json at all")));
        let result = generator.generate("notes", GenerationSource::File).await;
        assert!(result.fallback);
        assert_eq!(result.cards.len(), 2);
    }
}

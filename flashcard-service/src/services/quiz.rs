//! Quiz generation and scoring.

use crate::{
    dtos::quiz::{
        CompleteQuizRequest, CompleteQuizResponse, QuestionType, QuizAnswer, QuizQuestion,
        QuizType,
    },
    models::{study_day_key, Deck, Difficulty},
    services::{
        gamification, metrics,
        generation::strip_code_fences,
        providers::{GenerationParams, TextProvider},
        MongoDb, ServiceError,
    },
};
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

pub const MAX_QUESTIONS: usize = 10;
pub const RECENT_WINDOW_DAYS: i64 = 7;
pub const DIFFICULT_ACCURACY: f64 = 0.6;

const SYSTEM_INSTRUCTION: &str = "You are a quiz generator. Create a quiz question based on \
the provided flashcard content.

Generate either:
1. Multiple choice with 4 options (mark correct answer)
2. Fill-in-the-blank
3. True/false

Return JSON format:
{
  \"question\": \"question text\",
  \"type\": \"multiple-choice|fill-in-blank|true-false\",
  \"correct_answer\": \"correct answer\",
  \"options\": [\"option1\", \"option2\", \"option3\", \"option4\"]
}
Only include \"options\" for multiple-choice questions.";

/// A card picked for a quiz, with the deck it came from.
#[derive(Debug, Clone)]
pub struct QuizCard {
    pub question: String,
    pub answer: String,
    pub deck_name: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
struct AiQuestion {
    question: String,
    #[serde(rename = "type")]
    question_type: QuestionType,
    #[serde(alias = "correctAnswer")]
    correct_answer: String,
    #[serde(default)]
    options: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct QuizService {
    db: MongoDb,
    provider: Arc<dyn TextProvider>,
}

impl QuizService {
    pub fn new(db: MongoDb, provider: Arc<dyn TextProvider>) -> Self {
        Self { db, provider }
    }

    pub async fn generate(
        &self,
        user_id: &str,
        quiz_type: QuizType,
    ) -> Result<Vec<QuizQuestion>, ServiceError> {
        let decks = self.db.list_decks_for_user(user_id, "updated_at").await?;
        if decks.is_empty() {
            return Err(ServiceError::NoDecks);
        }

        let mut cards = select_cards(&decks, quiz_type, Utc::now());
        cards.shuffle(&mut rand::thread_rng());
        cards.truncate(MAX_QUESTIONS);

        tracing::info!(
            user_id = %user_id,
            quiz_type = ?quiz_type,
            card_count = cards.len(),
            "Generating quiz"
        );

        let questions = join_all(
            cards
                .into_iter()
                .zip(1u32..)
                .map(|(card, id)| self.question_for(id, card)),
        )
        .await;

        Ok(questions)
    }

    async fn question_for(&self, id: u32, card: QuizCard) -> QuizQuestion {
        let params = GenerationParams {
            system_instruction: Some(SYSTEM_INSTRUCTION.to_string()),
            json_output: true,
            ..Default::default()
        };
        let prompt = format!(
            "Flashcard Question: {}\nFlashcard Answer: {}",
            card.question, card.answer
        );

        let started = Instant::now();
        let result = self.provider.generate(&prompt, &[], &params).await;
        metrics::record_ai_request("quiz_question", result.is_ok(), started.elapsed());

        let parsed = match result {
            Ok(response) => {
                metrics::record_ai_tokens(
                    "quiz_question",
                    response.input_tokens,
                    response.output_tokens,
                );
                response.text.as_deref().and_then(parse_ai_question)
            }
            Err(e) => {
                tracing::warn!(error = %e, question_id = id, "Quiz question generation failed");
                None
            }
        };

        match parsed {
            Some(ai) => QuizQuestion {
                id,
                question: ai.question,
                question_type: ai.question_type,
                correct_answer: ai.correct_answer,
                options: ai.options,
                deck_name: card.deck_name,
                difficulty: card.difficulty,
            },
            None => fallback_question(id, card),
        }
    }

    pub async fn complete(
        &self,
        user_id: &str,
        req: CompleteQuizRequest,
    ) -> Result<CompleteQuizResponse, ServiceError> {
        check_results(&req.results)?;

        let user = self
            .db
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let total = req.results.len();
        let correct = req
            .results
            .iter()
            .filter(|r| is_correct(&r.user_answer, &r.correct_answer))
            .count();

        let accuracy = gamification::accuracy_percent(correct, total);
        let xp_earned = gamification::xp_for_quiz(correct, total);
        let new_badges = gamification::earned_badges(correct, total, &user.badges);

        let now = Utc::now();
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .db
            .users()
            .find_one_and_update(
                doc! { "_id": &user.id },
                doc! {
                    "$inc": { "xp": xp_earned },
                    "$addToSet": {
                        "badges": { "$each": &new_badges },
                        "study_days": study_day_key(now),
                    },
                    "$set": {
                        "last_login": now.timestamp_millis(),
                        "updated_at": now.timestamp_millis(),
                    },
                },
                options,
            )
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        // Level follows the stored total, which includes concurrent completions.
        let total_xp = updated.xp;
        let new_level = gamification::level_for_xp(total_xp).max(updated.level);
        if new_level > updated.level {
            self.db
                .users()
                .update_one(
                    doc! { "_id": &user.id },
                    doc! { "$max": { "level": new_level } },
                    None,
                )
                .await?;
        }

        metrics::record_quiz_completed(correct, total);
        tracing::info!(
            user_id = %user.id,
            correct,
            total,
            xp_earned,
            new_level,
            total_time_ms = req.total_time_ms,
            "Quiz completed"
        );

        Ok(CompleteQuizResponse {
            message: "Quiz completed successfully".to_string(),
            correct,
            total,
            accuracy,
            xp_earned,
            new_level,
            new_badges,
            total_xp,
        })
    }
}

/// Results must describe a single quiz: one to `MAX_QUESTIONS` answers, each
/// question answered once.
pub fn check_results(results: &[QuizAnswer]) -> Result<(), ServiceError> {
    if results.is_empty() {
        return Err(ServiceError::Validation("Quiz results are required".to_string()));
    }
    if results.len() > MAX_QUESTIONS {
        return Err(ServiceError::Validation("Too many quiz results".to_string()));
    }

    let mut seen = HashSet::with_capacity(results.len());
    if let Some(dup) = results.iter().find(|r| !seen.insert(r.question_id)) {
        return Err(ServiceError::Validation(format!(
            "Duplicate result for question {}",
            dup.question_id
        )));
    }
    Ok(())
}

/// Cards eligible for a quiz of the given type.
pub fn select_cards(decks: &[Deck], quiz_type: QuizType, now: DateTime<Utc>) -> Vec<QuizCard> {
    let recent_cutoff = now - Duration::days(RECENT_WINDOW_DAYS);

    decks
        .iter()
        .flat_map(|deck| deck.cards.iter().map(move |card| (deck, card)))
        .filter(|(_, card)| match quiz_type {
            QuizType::Mixed => true,
            QuizType::Recent => card.last_reviewed.is_some_and(|at| at >= recent_cutoff),
            QuizType::Difficult => card.review_count > 0 && card.accuracy() < DIFFICULT_ACCURACY,
        })
        .map(|(deck, card)| QuizCard {
            question: card.question.clone(),
            answer: card.answer.clone(),
            deck_name: deck.name.clone(),
            difficulty: card.difficulty,
        })
        .collect()
}

/// Case-insensitive comparison ignoring surrounding and repeated whitespace.
pub fn is_correct(user_answer: &str, correct_answer: &str) -> bool {
    normalize_answer(user_answer) == normalize_answer(correct_answer)
}

fn normalize_answer(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn parse_ai_question(text: &str) -> Option<AiQuestion> {
    let body = strip_code_fences(text);
    let parsed: AiQuestion = serde_json::from_str(body)
        .ok()
        .or_else(|| {
            let start = body.find('{')?;
            let end = body.rfind('}')?;
            if end <= start {
                return None;
            }
            serde_json::from_str(&body[start..=end]).ok()
        })?;

    if parsed.question.trim().is_empty() || parsed.correct_answer.trim().is_empty() {
        return None;
    }

    match parsed.question_type {
        QuestionType::MultipleChoice => {
            let options = parsed.options.as_ref()?;
            if options.len() < 2 || !options.iter().any(|o| is_correct(o, &parsed.correct_answer)) {
                return None;
            }
            Some(parsed)
        }
        _ => Some(AiQuestion {
            options: None,
            ..parsed
        }),
    }
}

fn fallback_question(id: u32, card: QuizCard) -> QuizQuestion {
    QuizQuestion {
        id,
        question: card.question,
        question_type: QuestionType::FillInBlank,
        correct_answer: card.answer,
        options: None,
        deck_name: card.deck_name,
        difficulty: card.difficulty,
    }
}

use crate::models::Difficulty;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuizType {
    #[default]
    Mixed,
    Recent,
    Difficult,
}

impl std::str::FromStr for QuizType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mixed" => Ok(QuizType::Mixed),
            "recent" => Ok(QuizType::Recent),
            "difficult" => Ok(QuizType::Difficult),
            _ => Err(format!("Invalid quiz type: {}", s)),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct QuizQuery {
    /// `mixed` (default), `recent` or `difficult`
    #[serde(rename = "type")]
    #[param(rename = "type", example = "mixed")]
    pub quiz_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    FillInBlank,
    TrueFalse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizQuestion {
    pub id: u32,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub deck_name: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuizResponse {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct QuizAnswer {
    pub question_id: u32,
    pub user_answer: String,
    pub correct_answer: String,
    #[serde(default)]
    pub time_spent_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CompleteQuizRequest {
    /// One entry per generated question, so at most ten.
    #[validate(length(min = 1, max = 10, message = "Quiz results must hold 1 to 10 answers"))]
    pub results: Vec<QuizAnswer>,
    #[serde(default)]
    pub total_time_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompleteQuizResponse {
    #[schema(example = "Quiz completed successfully")]
    pub message: String,
    pub correct: usize,
    pub total: usize,
    /// Percentage, 0 to 100.
    pub accuracy: f64,
    pub xp_earned: i64,
    pub new_level: i32,
    pub new_badges: Vec<String>,
    pub total_xp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_type_parses_known_values() {
        assert_eq!("Recent".parse::<QuizType>().unwrap(), QuizType::Recent);
        assert_eq!("difficult".parse::<QuizType>().unwrap(), QuizType::Difficult);
        assert!("hardest".parse::<QuizType>().is_err());
    }

    #[test]
    fn question_type_uses_kebab_case() {
        assert_eq!(
            serde_json::to_value(QuestionType::FillInBlank).unwrap(),
            "fill-in-blank"
        );
        assert_eq!(
            serde_json::to_value(QuestionType::MultipleChoice).unwrap(),
            "multiple-choice"
        );
    }

    fn answer(question_id: u32) -> QuizAnswer {
        QuizAnswer {
            question_id,
            user_answer: "a".into(),
            correct_answer: "a".into(),
            time_spent_ms: 0,
        }
    }

    #[test]
    fn results_are_capped_at_one_quiz() {
        let max = crate::services::quiz::MAX_QUESTIONS as u32;

        let full = CompleteQuizRequest {
            results: (1..=max).map(answer).collect(),
            total_time_ms: 0,
        };
        assert!(full.validate().is_ok());

        let padded = CompleteQuizRequest {
            results: (1..=max + 1).map(answer).collect(),
            total_time_ms: 0,
        };
        assert!(padded.validate().is_err());
    }

    #[test]
    fn empty_results_fail_validation() {
        let req = CompleteQuizRequest {
            results: vec![],
            total_time_ms: 0,
        };
        assert!(req.validate().is_err());
    }
}

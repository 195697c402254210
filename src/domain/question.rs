use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Text,
    Number,
    SingleChoice,
    MultipleChoice,
    Rating,
    YesNo,
    Date,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::Number => "number",
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Rating => "rating",
            QuestionType::YesNo => "yes_no",
            QuestionType::Date => "date",
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::MultipleChoice)
    }
}

/// Type-specific payload: choice lists for choice questions, scale bounds for ratings.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct QuestionSettings {
    #[serde(default)]
    pub choices: Vec<String>,
    pub scale_min: Option<i32>,
    pub scale_max: Option<i32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub settings: QuestionSettings,
    pub position: i32,
    pub required: bool,
    pub created_at: DateTime<Utc>,
}

impl Question {
    pub fn scale_bounds(&self) -> (i32, i32) {
        (
            self.settings.scale_min.unwrap_or(1),
            self.settings.scale_max.unwrap_or(5),
        )
    }
}

/// Publish-readiness rules for a single question. Returns every violation,
/// empty when the question is valid.
pub fn question_issues(question: &Question) -> Vec<String> {
    let mut issues = Vec::new();

    if question.text.trim().is_empty() {
        issues.push("question text is empty".to_string());
    }

    if question.question_type.is_choice() {
        let filled = question
            .settings
            .choices
            .iter()
            .filter(|c| !c.trim().is_empty())
            .count();
        if filled < 2 {
            issues.push("choice question needs at least 2 non-empty options".to_string());
        }
    }

    if question.question_type == QuestionType::Rating {
        let (min, max) = question.scale_bounds();
        if min >= max {
            issues.push(format!("rating scale bounds are invalid ({min}..{max})"));
        }
    }

    issues
}

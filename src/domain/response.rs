use crate::domain::question::{Question, QuestionType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    InProgress,
    Completed,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::InProgress => "in_progress",
            ResponseStatus::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for ResponseStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "in_progress" => Ok(ResponseStatus::InProgress),
            "completed" => Ok(ResponseStatus::Completed),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Respondent {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
}

impl Respondent {
    pub fn display_name(&self) -> String {
        if self.anonymous {
            return "Anonymous".to_string();
        }
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Anonymous")
            .to_string()
    }
}

/// Exactly one payload kind per answer; the kind must match the question type.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    Choice(Vec<String>),
}

impl AnswerValue {
    pub fn kind(&self) -> &'static str {
        match self {
            AnswerValue::Text(_) => "text",
            AnswerValue::Number(_) => "number",
            AnswerValue::Boolean(_) => "boolean",
            AnswerValue::Date(_) => "date",
            AnswerValue::Choice(_) => "choice",
        }
    }

    pub fn matches_question(&self, question_type: QuestionType) -> bool {
        matches!(
            (question_type, self),
            (QuestionType::Text, AnswerValue::Text(_))
                | (QuestionType::Number, AnswerValue::Number(_))
                | (QuestionType::Rating, AnswerValue::Number(_))
                | (QuestionType::YesNo, AnswerValue::Boolean(_))
                | (QuestionType::Date, AnswerValue::Date(_))
                | (QuestionType::SingleChoice, AnswerValue::Choice(_))
                | (QuestionType::MultipleChoice, AnswerValue::Choice(_))
        )
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.trim().is_empty(),
            AnswerValue::Choice(selected) => selected.is_empty(),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: Uuid,
    pub value: AnswerValue,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub status: ResponseStatus,
    pub respondent: Respondent,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub device: Option<String>,
    pub location: Option<String>,
    pub answers: Vec<Answer>,
}

/// Validates one answer against its question. Returns every violation,
/// empty when the answer is acceptable.
pub fn answer_issues(question: &Question, value: &AnswerValue) -> Vec<String> {
    let mut issues = Vec::new();

    if !value.matches_question(question.question_type) {
        issues.push(format!(
            "answer kind '{}' does not match question type '{}'",
            value.kind(),
            question.question_type.as_str()
        ));
        return issues;
    }

    match value {
        AnswerValue::Choice(selected) => {
            if question.question_type == QuestionType::SingleChoice && selected.len() > 1 {
                issues.push("single-choice question allows exactly one selection".to_string());
            }
            for choice in selected {
                if !question.settings.choices.iter().any(|c| c == choice) {
                    issues.push(format!("'{choice}' is not one of the question's options"));
                }
            }
        }
        AnswerValue::Number(n) if question.question_type == QuestionType::Rating => {
            let (min, max) = question.scale_bounds();
            if *n < min as f64 || *n > max as f64 {
                issues.push(format!("rating {n} is outside the scale {min}..{max}"));
            }
        }
        _ => {}
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::question::QuestionSettings;

    fn question(question_type: QuestionType) -> Question {
        Question {
            id: Uuid::new_v4(),
            survey_id: Uuid::new_v4(),
            text: "Q".to_string(),
            question_type,
            settings: QuestionSettings::default(),
            position: 1,
            required: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_kind_must_match_question_type() {
        let q = question(QuestionType::Text);
        assert!(answer_issues(&q, &AnswerValue::Text("fine".into())).is_empty());

        let issues = answer_issues(&q, &AnswerValue::Number(3.0));
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("does not match"));
    }

    #[test]
    fn test_choice_membership() {
        let mut q = question(QuestionType::MultipleChoice);
        q.settings.choices = vec!["Email".to_string(), "Phone".to_string()];

        let ok = AnswerValue::Choice(vec!["Email".to_string(), "Phone".to_string()]);
        assert!(answer_issues(&q, &ok).is_empty());

        let unknown = AnswerValue::Choice(vec!["Fax".to_string()]);
        assert_eq!(answer_issues(&q, &unknown).len(), 1);
    }

    #[test]
    fn test_single_choice_cardinality() {
        let mut q = question(QuestionType::SingleChoice);
        q.settings.choices = vec!["Yes".to_string(), "No".to_string()];

        let two = AnswerValue::Choice(vec!["Yes".to_string(), "No".to_string()]);
        assert_eq!(answer_issues(&q, &two).len(), 1);
    }

    #[test]
    fn test_rating_in_bounds() {
        let q = question(QuestionType::Rating);
        assert!(answer_issues(&q, &AnswerValue::Number(5.0)).is_empty());
        assert_eq!(answer_issues(&q, &AnswerValue::Number(6.0)).len(), 1);
    }

    #[test]
    fn test_anonymous_display_name() {
        let respondent = Respondent {
            name: Some("Olha K.".to_string()),
            anonymous: true,
            ..Respondent::default()
        };
        assert_eq!(respondent.display_name(), "Anonymous");

        let named = Respondent {
            name: Some("Olha K.".to_string()),
            ..Respondent::default()
        };
        assert_eq!(named.display_name(), "Olha K.");
    }
}

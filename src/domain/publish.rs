use crate::domain::question::{question_issues, Question};
use crate::domain::survey::{Survey, SurveyType};
use serde::Serialize;

/// Every violation found on one question, addressed by its display index.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct QuestionRejection {
    pub question_index: usize,
    pub question_text: String,
    pub errors: Vec<String>,
}

/// Full publish-validation report. All violations are collected before the
/// survey is rejected so the caller can show a complete correction list.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct PublishRejection {
    pub survey_errors: Vec<String>,
    pub question_errors: Vec<QuestionRejection>,
}

impl PublishRejection {
    pub fn is_empty(&self) -> bool {
        self.survey_errors.is_empty() && self.question_errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.survey_errors.len()
            + self
                .question_errors
                .iter()
                .map(|q| q.errors.len())
                .sum::<usize>()
    }

    /// One consolidated line for logs and toast-style display.
    pub fn consolidated_message(&self) -> String {
        let mut parts: Vec<String> = self.survey_errors.clone();
        for q in &self.question_errors {
            for err in &q.errors {
                parts.push(format!("question {}: {}", q.question_index, err));
            }
        }
        parts.join("; ")
    }
}

/// Gate for the draft -> active transition. Questions are checked in display
/// order; indexes in the report are 1-based to match what the editor shows.
pub fn validate_for_publish(
    survey: &Survey,
    questions: &[Question],
) -> Result<(), PublishRejection> {
    let mut rejection = PublishRejection::default();

    if survey.title.trim().is_empty() {
        rejection.survey_errors.push("survey title is empty".to_string());
    }

    if survey.survey_type == SurveyType::External {
        let has_client = survey
            .client_name
            .as_deref()
            .map(|name| !name.trim().is_empty())
            .unwrap_or(false);
        if !has_client {
            rejection
                .survey_errors
                .push("external survey requires a client name".to_string());
        }
    }

    if questions.is_empty() {
        rejection
            .survey_errors
            .push("survey has no questions".to_string());
    }

    for (index, question) in questions.iter().enumerate() {
        let errors = question_issues(question);
        if !errors.is_empty() {
            rejection.question_errors.push(QuestionRejection {
                question_index: index + 1,
                question_text: question.text.clone(),
                errors,
            });
        }
    }

    if rejection.is_empty() {
        Ok(())
    } else {
        Err(rejection)
    }
}

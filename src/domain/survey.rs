use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SurveyType {
    Internal,
    External,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStatus {
    Draft,
    Active,
    Paused,
    Closed,
}

impl SurveyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyStatus::Draft => "draft",
            SurveyStatus::Active => "active",
            SurveyStatus::Paused => "paused",
            SurveyStatus::Closed => "closed",
        }
    }

    /// Lifecycle matrix: draft -> active, active <-> paused, closed is terminal.
    pub fn can_transition(self, to: SurveyStatus) -> bool {
        matches!(
            (self, to),
            (SurveyStatus::Draft, SurveyStatus::Active)
                | (SurveyStatus::Active, SurveyStatus::Paused)
                | (SurveyStatus::Active, SurveyStatus::Closed)
                | (SurveyStatus::Paused, SurveyStatus::Active)
                | (SurveyStatus::Paused, SurveyStatus::Closed)
        )
    }
}

impl TryFrom<&str> for SurveyStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "draft" => Ok(SurveyStatus::Draft),
            "active" => Ok(SurveyStatus::Active),
            "paused" => Ok(SurveyStatus::Paused),
            "closed" => Ok(SurveyStatus::Closed),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DurationPolicy {
    Unlimited,
    Limited { starts_on: NaiveDate, ends_on: NaiveDate },
}

impl Default for DurationPolicy {
    fn default() -> Self {
        DurationPolicy::Unlimited
    }
}

impl DurationPolicy {
    pub fn is_valid(&self) -> bool {
        match self {
            DurationPolicy::Unlimited => true,
            DurationPolicy::Limited { starts_on, ends_on } => starts_on <= ends_on,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Survey {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub survey_type: SurveyType,
    pub status: SurveyStatus,
    #[serde(default)]
    pub duration: DurationPolicy,
    pub client_name: Option<String>,
    pub owner_id: Uuid,
    pub responses_total: i64,
    pub responses_completed: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Survey {
    /// Share of completed responses, as a percentage with one decimal.
    pub fn completion_rate(&self) -> f64 {
        if self.responses_total <= 0 {
            return 0.0;
        }
        let rate = self.responses_completed as f64 / self.responses_total as f64 * 100.0;
        (rate * 10.0).round() / 10.0
    }
}

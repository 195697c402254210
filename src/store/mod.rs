pub mod seed;

use crate::domain::models::{Client, User};
use crate::domain::question::Question;
use crate::domain::response::{ResponseStatus, SurveyResponse};
use crate::domain::survey::{Survey, SurveyStatus};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Server-side session record for an opaque refresh token.
#[derive(Clone, Debug)]
pub struct RefreshSession {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub rotated: Option<RotatedPair>,
}

/// Recorded outcome of a rotation, replayed to late concurrent refreshers.
#[derive(Clone, Debug)]
pub struct RotatedPair {
    pub access_token: String,
    pub refresh_token: String,
    pub rotated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct RotationOutcome {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub replayed: bool,
}

/// In-memory tables behind async locks. Methods that touch several tables
/// take the locks in a fixed order: surveys -> questions -> responses.
#[derive(Default)]
pub struct Store {
    users: RwLock<HashMap<Uuid, User>>,
    clients: RwLock<HashMap<Uuid, Client>>,
    surveys: RwLock<HashMap<Uuid, Survey>>,
    questions: RwLock<HashMap<Uuid, Question>>,
    responses: RwLock<HashMap<Uuid, SurveyResponse>>,
    sessions: RwLock<HashMap<String, RefreshSession>>,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    // ---- users ----

    pub async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let email = user.email.to_lowercase();
        if users.values().any(|u| u.email.to_lowercase() == email) {
            return Err(StoreError::Conflict(format!(
                "email '{}' is already taken",
                user.email
            )));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: Uuid) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }

    pub async fn find_user_by_email(&self, email: &str) -> Option<User> {
        let email = email.trim().to_lowercase();
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email.to_lowercase() == email)
            .cloned()
    }

    pub async fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        users
    }

    pub async fn save_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(StoreError::NotFound);
        }
        let email = user.email.to_lowercase();
        if users
            .values()
            .any(|u| u.id != user.id && u.email.to_lowercase() == email)
        {
            return Err(StoreError::Conflict(format!(
                "email '{}' is already taken",
                user.email
            )));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    // ---- clients ----

    pub async fn insert_client(&self, client: Client) -> Client {
        self.clients.write().await.insert(client.id, client.clone());
        client
    }

    pub async fn find_client(&self, id: Uuid) -> Option<Client> {
        self.clients.read().await.get(&id).cloned()
    }

    pub async fn list_clients(&self) -> Vec<Client> {
        let mut clients: Vec<Client> = self.clients.read().await.values().cloned().collect();
        clients.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        clients
    }

    pub async fn save_client(&self, client: Client) -> StoreResult<Client> {
        let mut clients = self.clients.write().await;
        if !clients.contains_key(&client.id) {
            return Err(StoreError::NotFound);
        }
        clients.insert(client.id, client.clone());
        Ok(client)
    }

    pub async fn delete_client(&self, id: Uuid) -> StoreResult<()> {
        self.clients
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    // ---- surveys ----

    pub async fn insert_survey(&self, survey: Survey) -> Survey {
        self.surveys.write().await.insert(survey.id, survey.clone());
        survey
    }

    pub async fn find_survey(&self, id: Uuid) -> Option<Survey> {
        self.surveys.read().await.get(&id).cloned()
    }

    pub async fn list_surveys(&self) -> Vec<Survey> {
        let mut surveys: Vec<Survey> = self.surveys.read().await.values().cloned().collect();
        surveys.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        surveys
    }

    pub async fn save_survey(&self, survey: Survey) -> StoreResult<Survey> {
        let mut surveys = self.surveys.write().await;
        if !surveys.contains_key(&survey.id) {
            return Err(StoreError::NotFound);
        }
        surveys.insert(survey.id, survey.clone());
        Ok(survey)
    }

    /// Applies the lifecycle matrix; the publish gate runs before this.
    pub async fn transition_survey(
        &self,
        id: Uuid,
        to: SurveyStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Survey> {
        let mut surveys = self.surveys.write().await;
        let survey = surveys.get_mut(&id).ok_or(StoreError::NotFound)?;
        if !survey.status.can_transition(to) {
            return Err(StoreError::Conflict(format!(
                "cannot transition survey from {} to {}",
                survey.status.as_str(),
                to.as_str()
            )));
        }
        survey.status = to;
        survey.updated_at = now;
        Ok(survey.clone())
    }

    /// Removes the survey together with its questions and responses.
    pub async fn delete_survey(&self, id: Uuid) -> StoreResult<()> {
        let mut surveys = self.surveys.write().await;
        let mut questions = self.questions.write().await;
        let mut responses = self.responses.write().await;

        surveys.remove(&id).ok_or(StoreError::NotFound)?;
        questions.retain(|_, q| q.survey_id != id);
        responses.retain(|_, r| r.survey_id != id);
        Ok(())
    }

    /// Fresh draft copy of a survey and its questions; counters start at zero.
    pub async fn duplicate_survey(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<Survey> {
        let mut surveys = self.surveys.write().await;
        let mut questions = self.questions.write().await;

        let source = surveys.get(&id).ok_or(StoreError::NotFound)?.clone();
        let copy = Survey {
            id: Uuid::new_v4(),
            title: format!("{} (copy)", source.title),
            status: SurveyStatus::Draft,
            responses_total: 0,
            responses_completed: 0,
            created_at: now,
            updated_at: now,
            ..source
        };

        let copied_questions: Vec<Question> = questions
            .values()
            .filter(|q| q.survey_id == id)
            .cloned()
            .map(|q| Question {
                id: Uuid::new_v4(),
                survey_id: copy.id,
                created_at: now,
                ..q
            })
            .collect();
        for question in copied_questions {
            questions.insert(question.id, question);
        }

        surveys.insert(copy.id, copy.clone());
        Ok(copy)
    }

    // ---- questions ----

    pub async fn list_questions(&self, survey_id: Uuid) -> Vec<Question> {
        let mut questions: Vec<Question> = self
            .questions
            .read()
            .await
            .values()
            .filter(|q| q.survey_id == survey_id)
            .cloned()
            .collect();
        questions.sort_by(|a, b| a.position.cmp(&b.position).then(a.id.cmp(&b.id)));
        questions
    }

    pub async fn find_question(&self, id: Uuid) -> Option<Question> {
        self.questions.read().await.get(&id).cloned()
    }

    /// Appends at the end unless the caller picked an explicit position.
    pub async fn insert_question(&self, mut question: Question) -> StoreResult<Question> {
        let surveys = self.surveys.read().await;
        if !surveys.contains_key(&question.survey_id) {
            return Err(StoreError::NotFound);
        }
        drop(surveys);

        let mut questions = self.questions.write().await;
        if question.position <= 0 {
            let next = questions
                .values()
                .filter(|q| q.survey_id == question.survey_id)
                .map(|q| q.position)
                .max()
                .unwrap_or(0)
                + 1;
            question.position = next;
        }
        questions.insert(question.id, question.clone());
        Ok(question)
    }

    pub async fn save_question(&self, question: Question) -> StoreResult<Question> {
        let mut questions = self.questions.write().await;
        if !questions.contains_key(&question.id) {
            return Err(StoreError::NotFound);
        }
        questions.insert(question.id, question.clone());
        Ok(question)
    }

    /// Deletes and compacts the survey's ordering back to 1..n.
    pub async fn delete_question(&self, id: Uuid) -> StoreResult<()> {
        let mut questions = self.questions.write().await;
        let removed = questions.remove(&id).ok_or(StoreError::NotFound)?;

        let mut remaining: Vec<&mut Question> = questions
            .values_mut()
            .filter(|q| q.survey_id == removed.survey_id)
            .collect();
        remaining.sort_by(|a, b| a.position.cmp(&b.position));
        for (index, question) in remaining.into_iter().enumerate() {
            question.position = index as i32 + 1;
        }
        Ok(())
    }

    /// Reassigns positions 1..n following the given id order. The id list
    /// must be a permutation of the survey's question set.
    pub async fn reorder_questions(
        &self,
        survey_id: Uuid,
        ordered_ids: &[Uuid],
    ) -> StoreResult<Vec<Question>> {
        let mut questions = self.questions.write().await;

        let mut current: Vec<Uuid> = questions
            .values()
            .filter(|q| q.survey_id == survey_id)
            .map(|q| q.id)
            .collect();
        current.sort();
        let mut requested: Vec<Uuid> = ordered_ids.to_vec();
        requested.sort();
        if current != requested {
            return Err(StoreError::Conflict(
                "reorder list must contain every question of the survey exactly once".to_string(),
            ));
        }

        for (index, id) in ordered_ids.iter().enumerate() {
            if let Some(question) = questions.get_mut(id) {
                question.position = index as i32 + 1;
            }
        }

        let mut reordered: Vec<Question> = questions
            .values()
            .filter(|q| q.survey_id == survey_id)
            .cloned()
            .collect();
        reordered.sort_by(|a, b| a.position.cmp(&b.position));
        Ok(reordered)
    }

    // ---- responses ----

    pub async fn list_responses(&self, survey_id: Uuid) -> Vec<SurveyResponse> {
        let mut responses: Vec<SurveyResponse> = self
            .responses
            .read()
            .await
            .values()
            .filter(|r| r.survey_id == survey_id)
            .cloned()
            .collect();
        responses.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(a.id.cmp(&b.id)));
        responses
    }

    pub async fn find_response(&self, id: Uuid) -> Option<SurveyResponse> {
        self.responses.read().await.get(&id).cloned()
    }

    /// Stores the response and moves the survey counters in the same
    /// critical section, so counters always equal the stored facts.
    pub async fn insert_response(&self, response: SurveyResponse) -> StoreResult<SurveyResponse> {
        let mut surveys = self.surveys.write().await;
        let mut responses = self.responses.write().await;

        let survey = surveys
            .get_mut(&response.survey_id)
            .ok_or(StoreError::NotFound)?;
        survey.responses_total += 1;
        if response.status == ResponseStatus::Completed {
            survey.responses_completed += 1;
        }

        responses.insert(response.id, response.clone());
        Ok(response)
    }

    pub async fn delete_response(&self, id: Uuid) -> StoreResult<()> {
        let mut surveys = self.surveys.write().await;
        let mut responses = self.responses.write().await;
        Store::remove_response(&mut surveys, &mut responses, id)
    }

    /// Deletes every id it finds; returns how many were removed.
    pub async fn bulk_delete_responses(&self, ids: &[Uuid]) -> usize {
        let mut surveys = self.surveys.write().await;
        let mut responses = self.responses.write().await;

        let mut deleted = 0;
        for id in ids {
            if Store::remove_response(&mut surveys, &mut responses, *id).is_ok() {
                deleted += 1;
            }
        }
        deleted
    }

    fn remove_response(
        surveys: &mut HashMap<Uuid, Survey>,
        responses: &mut HashMap<Uuid, SurveyResponse>,
        id: Uuid,
    ) -> StoreResult<()> {
        let removed = responses.remove(&id).ok_or(StoreError::NotFound)?;
        if let Some(survey) = surveys.get_mut(&removed.survey_id) {
            survey.responses_total = (survey.responses_total - 1).max(0);
            if removed.status == ResponseStatus::Completed {
                survey.responses_completed = (survey.responses_completed - 1).max(0);
            }
        }
        Ok(())
    }

    // ---- sessions ----

    pub async fn create_session(
        &self,
        token: String,
        user_id: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) {
        let session = RefreshSession {
            user_id,
            created_at: now,
            expires_at: now + ttl,
            rotated: None,
        };
        self.sessions.write().await.insert(token, session);
    }

    pub async fn find_session(&self, token: &str, now: DateTime<Utc>) -> Option<RefreshSession> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|s| s.expires_at > now)
            .cloned()
    }

    /// Single-flight rotation. Concurrent refreshes of the same token
    /// serialize on the table lock: the first records the rotation and the
    /// rest receive the identical replacement pair instead of rotating
    /// again. A rotated token seen after the grace window is rejected.
    pub async fn rotate_session(
        &self,
        old_token: &str,
        candidate_access: String,
        candidate_refresh: String,
        now: DateTime<Utc>,
        refresh_ttl: Duration,
        replay_grace: Duration,
    ) -> StoreResult<RotationOutcome> {
        let mut sessions = self.sessions.write().await;

        let session = sessions.get(old_token).ok_or(StoreError::NotFound)?.clone();

        if let Some(rotated) = &session.rotated {
            if now - rotated.rotated_at <= replay_grace {
                return Ok(RotationOutcome {
                    user_id: session.user_id,
                    access_token: rotated.access_token.clone(),
                    refresh_token: rotated.refresh_token.clone(),
                    replayed: true,
                });
            }
            // token reuse outside the grace window is a stale session
            sessions.remove(old_token);
            return Err(StoreError::NotFound);
        }

        if session.expires_at <= now {
            sessions.remove(old_token);
            return Err(StoreError::NotFound);
        }

        sessions.insert(
            candidate_refresh.clone(),
            RefreshSession {
                user_id: session.user_id,
                created_at: now,
                expires_at: now + refresh_ttl,
                rotated: None,
            },
        );
        if let Some(old) = sessions.get_mut(old_token) {
            old.rotated = Some(RotatedPair {
                access_token: candidate_access.clone(),
                refresh_token: candidate_refresh.clone(),
                rotated_at: now,
            });
        }

        Ok(RotationOutcome {
            user_id: session.user_id,
            access_token: candidate_access,
            refresh_token: candidate_refresh,
            replayed: false,
        })
    }

    pub async fn revoke_session(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    pub async fn revoke_user_sessions(&self, user_id: Uuid) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        before - sessions.len()
    }
}

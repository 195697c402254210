use crate::domain::models::{Client, ClientStatus, User, UserRole};
use crate::domain::question::{Question, QuestionSettings, QuestionType};
use crate::domain::response::{
    Answer, AnswerValue, Respondent, ResponseStatus, SurveyResponse,
};
use crate::domain::survey::{DurationPolicy, Survey, SurveyStatus, SurveyType};
use crate::store::Store;
use anyhow::Result;
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand_core::OsRng;
use uuid::Uuid;

struct SeedUser<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
    phone: Option<&'a str>,
    role: UserRole,
}

struct SeedClient<'a> {
    name: &'a str,
    company: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    surveys_count: i64,
    rating: f64,
    status: ClientStatus,
}

/// Demo dataset so the dashboard is populated on first boot.
pub async fn seed_all(store: &Store) -> Result<()> {
    let admin_id = seed_users(store).await?;
    seed_clients(store).await;
    seed_surveys(store, admin_id).await?;
    tracing::info!("Demo data seeded");
    Ok(())
}

async fn seed_users(store: &Store) -> Result<Uuid> {
    let users = vec![
        SeedUser {
            email: "admin@surveylab.dev",
            password: "admin1234",
            name: "Daryna Melnyk",
            phone: Some("+380501112233"),
            role: UserRole::Admin,
        },
        SeedUser {
            email: "manager@surveylab.dev",
            password: "manager1234",
            name: "Pavlo Tkachenko",
            phone: Some("+380671234567"),
            role: UserRole::Manager,
        },
        SeedUser {
            email: "olena@surveylab.dev",
            password: "employee1234",
            name: "Olena Shevchenko",
            phone: None,
            role: UserRole::Employee,
        },
        SeedUser {
            email: "marko@surveylab.dev",
            password: "employee1234",
            name: "Marko Bondar",
            phone: None,
            role: UserRole::Employee,
        },
    ];

    let now = Utc::now();
    let mut admin_id = Uuid::new_v4();
    for seed in users {
        let salt = SaltString::generate(OsRng);
        let hash = Argon2::default()
            .hash_password(seed.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("failed to hash seed password: {e}"))?
            .to_string();

        let user = User {
            id: Uuid::new_v4(),
            email: seed.email.to_string(),
            name: seed.name.to_string(),
            phone: seed.phone.map(str::to_string),
            role: seed.role,
            hash,
            is_active: true,
            created_at: now,
            deactivated_at: None,
        };
        if seed.role == UserRole::Admin {
            admin_id = user.id;
        }
        store.insert_user(user).await?;
    }

    Ok(admin_id)
}

async fn seed_clients(store: &Store) {
    let clients = vec![
        SeedClient {
            name: "Iryna Kovalenko",
            company: "Acme Holding",
            email: "iryna@acme.ua",
            phone: Some("+380971234567"),
            surveys_count: 4,
            rating: 4.5,
            status: ClientStatus::Active,
        },
        SeedClient {
            name: "José Silva",
            company: "Globex",
            email: "jose@globex.com",
            phone: None,
            surveys_count: 1,
            rating: 3.0,
            status: ClientStatus::Active,
        },
        SeedClient {
            name: "Amira Haddad",
            company: "Initech",
            email: "amira@initech.ae",
            phone: Some("+971501234567"),
            surveys_count: 0,
            rating: 0.0,
            status: ClientStatus::Inactive,
        },
    ];

    let now = Utc::now();
    for seed in clients {
        store
            .insert_client(Client {
                id: Uuid::new_v4(),
                name: seed.name.to_string(),
                company: seed.company.to_string(),
                email: seed.email.to_string(),
                phone: seed.phone.map(str::to_string),
                surveys_count: seed.surveys_count,
                rating: seed.rating,
                status: seed.status,
                created_at: now,
            })
            .await;
    }
}

async fn seed_surveys(store: &Store, owner_id: Uuid) -> Result<()> {
    let now = Utc::now();

    // an active internal survey with a couple of completed responses
    let pulse = store
        .insert_survey(Survey {
            id: Uuid::new_v4(),
            title: "Quarterly team pulse".to_string(),
            description: "How the team is doing this quarter".to_string(),
            survey_type: SurveyType::Internal,
            status: SurveyStatus::Active,
            duration: DurationPolicy::Unlimited,
            client_name: None,
            owner_id,
            responses_total: 0,
            responses_completed: 0,
            created_at: now - Duration::days(14),
            updated_at: now - Duration::days(14),
        })
        .await;

    let mood = store
        .insert_question(Question {
            id: Uuid::new_v4(),
            survey_id: pulse.id,
            text: "How satisfied are you with your current workload?".to_string(),
            question_type: QuestionType::Rating,
            settings: QuestionSettings {
                choices: Vec::new(),
                scale_min: Some(1),
                scale_max: Some(10),
            },
            position: 0,
            required: true,
            created_at: now - Duration::days(14),
        })
        .await?;

    let channel = store
        .insert_question(Question {
            id: Uuid::new_v4(),
            survey_id: pulse.id,
            text: "Which channels do you use daily?".to_string(),
            question_type: QuestionType::MultipleChoice,
            settings: QuestionSettings {
                choices: vec![
                    "Email".to_string(),
                    "Chat".to_string(),
                    "Calls".to_string(),
                ],
                scale_min: None,
                scale_max: None,
            },
            position: 0,
            required: false,
            created_at: now - Duration::days(14),
        })
        .await?;

    store
        .insert_response(SurveyResponse {
            id: Uuid::new_v4(),
            survey_id: pulse.id,
            status: ResponseStatus::Completed,
            respondent: Respondent {
                name: Some("Olena Shevchenko".to_string()),
                email: Some("olena@surveylab.dev".to_string()),
                phone: None,
                anonymous: false,
            },
            started_at: now - Duration::days(2),
            completed_at: Some(now - Duration::days(2)),
            device: Some("desktop".to_string()),
            location: Some("Kyiv, UA".to_string()),
            answers: vec![
                Answer {
                    question_id: mood.id,
                    value: AnswerValue::Number(8.0),
                },
                Answer {
                    question_id: channel.id,
                    value: AnswerValue::Choice(vec!["Chat".to_string()]),
                },
            ],
        })
        .await?;

    store
        .insert_response(SurveyResponse {
            id: Uuid::new_v4(),
            survey_id: pulse.id,
            status: ResponseStatus::InProgress,
            respondent: Respondent {
                name: None,
                email: None,
                phone: None,
                anonymous: true,
            },
            started_at: now - Duration::hours(3),
            completed_at: None,
            device: Some("mobile".to_string()),
            location: None,
            answers: vec![Answer {
                question_id: mood.id,
                value: AnswerValue::Number(5.0),
            }],
        })
        .await?;

    // an external draft still waiting for its client details
    store
        .insert_survey(Survey {
            id: Uuid::new_v4(),
            title: "Acme onboarding feedback".to_string(),
            description: "Post-onboarding satisfaction for Acme Holding".to_string(),
            survey_type: SurveyType::External,
            status: SurveyStatus::Draft,
            duration: DurationPolicy::Unlimited,
            client_name: Some("Acme Holding".to_string()),
            owner_id,
            responses_total: 0,
            responses_completed: 0,
            created_at: now - Duration::days(3),
            updated_at: now - Duration::days(3),
        })
        .await;

    Ok(())
}

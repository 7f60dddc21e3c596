// src/storage/postgres.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, types::Json};
use uuid::Uuid;

use crate::{
    exam::{answers::Answer, scoring::BandScore},
    models::{
        exam_result::{ExamResult, NewExamResult, ResultOrder},
        profile::{NewProfile, Profile, ProfileUpdate},
        user::{NewUser, User},
    },
    storage::{FreeTestClaim, Storage, StorageError},
};

/// Postgres error code for unique violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Raw 'profiles' row; `subscription_status` is TEXT.
#[derive(FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    full_name: Option<String>,
    preferred_language: Option<String>,
    free_tests_used: i32,
    subscription_status: String,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StorageError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            preferred_language: row.preferred_language,
            free_tests_used: row.free_tests_used,
            subscription_status: row.subscription_status.parse().map_err(StorageError::Corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Raw 'exam_results' row; JSONB columns are decoded through `Json`.
#[derive(FromRow)]
struct ExamResultRow {
    id: Uuid,
    user_id: Uuid,
    exam_type: String,
    section_scores: Json<BTreeMap<String, BandScore>>,
    overall_score: f64,
    time_taken: i64,
    answers: Json<BTreeMap<String, Answer>>,
    completed_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<ExamResultRow> for ExamResult {
    type Error = StorageError;

    fn try_from(row: ExamResultRow) -> Result<Self, Self::Error> {
        Ok(ExamResult {
            id: row.id,
            user_id: row.user_id,
            exam_type: row.exam_type.parse().map_err(StorageError::Corrupt)?,
            section_scores: row.section_scores.0,
            overall_score: BandScore::new(row.overall_score),
            time_taken: row.time_taken,
            answers: row.answers.0,
            completed_at: row.completed_at,
        })
    }
}

const PROFILE_COLUMNS: &str = "id, email, full_name, preferred_language, free_tests_used, \
     subscription_status, created_at, updated_at";

const RESULT_COLUMNS: &str =
    "id, user_id, exam_type, section_scores, overall_score, time_taken, answers, completed_at";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

/// Storage backed by the Postgres schema in `migrations/`.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password)
            VALUES ($1, $2)
            RETURNING id, email, password, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::Conflict(format!("Email '{}' is already registered", user.email))
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                StorageError::from(e)
            }
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_profile(&self, profile: NewProfile) -> Result<Profile, StorageError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            INSERT INTO profiles (id, email, full_name, preferred_language, free_tests_used, subscription_status)
            VALUES ($1, $2, $3, 'en', 0, 'free')
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(profile.id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::Conflict("Profile already exists".to_string())
            } else {
                StorageError::from(e)
            }
        })?;

        row.try_into()
    }

    async fn read_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StorageError> {
        sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Profile::try_from)
        .transpose()
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Profile, StorageError> {
        // COALESCE keeps columns whose update field is NULL.
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            UPDATE profiles SET
                full_name = COALESCE($2, full_name),
                preferred_language = COALESCE($3, preferred_language),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(update.full_name)
        .bind(update.preferred_language)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::NotFound("Profile not found".to_string()))?;

        row.try_into()
    }

    async fn claim_free_test(
        &self,
        user_id: Uuid,
        limit: i32,
    ) -> Result<FreeTestClaim, StorageError> {
        // Check and increment in one statement so concurrent submissions cannot both pass.
        let claimed = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE profiles
            SET free_tests_used = free_tests_used + 1, updated_at = NOW()
            WHERE id = $1 AND subscription_status <> 'premium' AND free_tests_used < $2
            RETURNING free_tests_used
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_optional(&self.pool)
        .await?;

        if claimed.is_some() {
            return Ok(FreeTestClaim::Claimed);
        }

        match self.read_profile(user_id).await? {
            None => Err(StorageError::NotFound("Profile not found".to_string())),
            Some(profile) if profile.is_premium() => Ok(FreeTestClaim::Premium),
            Some(_) => Ok(FreeTestClaim::LimitReached),
        }
    }

    async fn release_free_test(&self, user_id: Uuid) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            UPDATE profiles
            SET free_tests_used = GREATEST(free_tests_used - 1, 0), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_result(&self, result: NewExamResult) -> Result<ExamResult, StorageError> {
        let row = sqlx::query_as::<_, ExamResultRow>(&format!(
            r#"
            INSERT INTO exam_results (user_id, exam_type, section_scores, overall_score, time_taken, answers)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RESULT_COLUMNS}
            "#
        ))
        .bind(result.user_id)
        .bind(result.exam_type.as_str())
        .bind(Json(&result.section_scores))
        .bind(result.overall_score.value())
        .bind(result.time_taken)
        .bind(Json(&result.answers))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert exam result: {:?}", e);
            StorageError::from(e)
        })?;

        row.try_into()
    }

    async fn list_results(
        &self,
        user_id: Uuid,
        limit: i64,
        order: ResultOrder,
    ) -> Result<Vec<ExamResult>, StorageError> {
        let direction = match order {
            ResultOrder::Newest => "DESC",
            ResultOrder::Oldest => "ASC",
        };

        let rows = sqlx::query_as::<_, ExamResultRow>(&format!(
            r#"
            SELECT {RESULT_COLUMNS}
            FROM exam_results
            WHERE user_id = $1
            ORDER BY completed_at {direction}
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ExamResult::try_from).collect()
    }
}

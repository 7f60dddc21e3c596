// src/storage/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    models::{
        exam_result::{ExamResult, NewExamResult, ResultOrder},
        profile::{NewProfile, Profile, ProfileUpdate, SubscriptionStatus},
        user::{NewUser, User},
    },
    storage::{FreeTestClaim, Storage, StorageError},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, Profile>,
    /// Insertion order doubles as completion order.
    results: Vec<ExamResult>,
}

/// Process-local storage with the same semantics as the Postgres tables.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Promotes a profile to premium. There is no HTTP route for this.
    pub async fn set_subscription(&self, user_id: Uuid, status: SubscriptionStatus) {
        if let Some(profile) = self.tables.write().await.profiles.get_mut(&user_id) {
            profile.subscription_status = status;
        }
    }

    pub async fn result_count(&self) -> usize {
        self.tables.read().await.results.len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StorageError::Conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            password: user.password_hash,
            created_at: Some(Utc::now()),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_profile(&self, profile: NewProfile) -> Result<Profile, StorageError> {
        let mut tables = self.tables.write().await;
        if tables.profiles.contains_key(&profile.id) {
            return Err(StorageError::Conflict("Profile already exists".to_string()));
        }

        let now = Utc::now();
        let profile = Profile {
            id: profile.id,
            email: profile.email,
            full_name: profile.full_name,
            preferred_language: Some("en".to_string()),
            free_tests_used: 0,
            subscription_status: SubscriptionStatus::Free,
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn read_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StorageError> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Profile, StorageError> {
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| StorageError::NotFound("Profile not found".to_string()))?;

        if let Some(full_name) = update.full_name {
            profile.full_name = Some(full_name);
        }
        if let Some(language) = update.preferred_language {
            profile.preferred_language = Some(language);
        }
        profile.updated_at = Some(Utc::now());

        Ok(profile.clone())
    }

    async fn claim_free_test(
        &self,
        user_id: Uuid,
        limit: i32,
    ) -> Result<FreeTestClaim, StorageError> {
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| StorageError::NotFound("Profile not found".to_string()))?;

        if profile.is_premium() {
            return Ok(FreeTestClaim::Premium);
        }
        if profile.free_tests_used >= limit {
            return Ok(FreeTestClaim::LimitReached);
        }
        profile.free_tests_used += 1;
        profile.updated_at = Some(Utc::now());
        Ok(FreeTestClaim::Claimed)
    }

    async fn release_free_test(&self, user_id: Uuid) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        if let Some(profile) = tables.profiles.get_mut(&user_id) {
            profile.free_tests_used = (profile.free_tests_used - 1).max(0);
        }
        Ok(())
    }

    async fn insert_result(&self, result: NewExamResult) -> Result<ExamResult, StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&result.user_id) {
            return Err(StorageError::NotFound(format!(
                "User {} not found",
                result.user_id
            )));
        }

        let result = ExamResult {
            id: Uuid::new_v4(),
            user_id: result.user_id,
            exam_type: result.exam_type,
            section_scores: result.section_scores,
            overall_score: result.overall_score,
            time_taken: result.time_taken,
            answers: result.answers,
            completed_at: Utc::now(),
        };
        tables.results.push(result.clone());
        Ok(result)
    }

    async fn list_results(
        &self,
        user_id: Uuid,
        limit: i64,
        order: ResultOrder,
    ) -> Result<Vec<ExamResult>, StorageError> {
        let tables = self.tables.read().await;
        let owned = tables.results.iter().filter(|r| r.user_id == user_id);
        let limit = usize::try_from(limit).unwrap_or(0);

        let results = match order {
            ResultOrder::Newest => owned.rev().take(limit).cloned().collect(),
            ResultOrder::Oldest => owned.take(limit).cloned().collect(),
        };
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{exam::scoring::BandScore, models::question::ExamCategory};
    use std::collections::BTreeMap;

    async fn seeded_user(storage: &MemoryStorage) -> User {
        storage
            .create_user(NewUser {
                email: "student@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    fn new_result(user_id: Uuid, band: f64) -> NewExamResult {
        NewExamResult {
            user_id,
            exam_type: ExamCategory::Reading,
            section_scores: BTreeMap::new(),
            overall_score: BandScore::new(band),
            time_taken: 60,
            answers: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let storage = MemoryStorage::new();
        seeded_user(&storage).await;

        let err = storage
            .create_user(NewUser {
                email: "student@example.com".to_string(),
                password_hash: "other".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_results_orders_and_limits() {
        let storage = MemoryStorage::new();
        let user = seeded_user(&storage).await;
        for band in [5.0, 6.0, 7.0] {
            storage.insert_result(new_result(user.id, band)).await.unwrap();
        }

        let newest = storage
            .list_results(user.id, 2, ResultOrder::Newest)
            .await
            .unwrap();
        let bands: Vec<f64> = newest.iter().map(|r| r.overall_score.value()).collect();
        assert_eq!(bands, vec![7.0, 6.0]);

        let oldest = storage
            .list_results(user.id, 10, ResultOrder::Oldest)
            .await
            .unwrap();
        assert_eq!(oldest[0].overall_score, BandScore::new(5.0));
        assert_eq!(oldest.len(), 3);

        let other = storage
            .list_results(Uuid::new_v4(), 10, ResultOrder::Newest)
            .await
            .unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_update_profile_is_partial() {
        let storage = MemoryStorage::new();
        let user = seeded_user(&storage).await;
        storage
            .create_profile(NewProfile {
                id: user.id,
                email: user.email.clone(),
                full_name: Some("Aziza".to_string()),
            })
            .await
            .unwrap();

        let updated = storage
            .update_profile(
                user.id,
                ProfileUpdate {
                    preferred_language: Some("uz".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.preferred_language.as_deref(), Some("uz"));
        assert_eq!(updated.full_name.as_deref(), Some("Aziza"));
        assert_eq!(updated.free_tests_used, 0);
    }

    #[tokio::test]
    async fn test_claim_free_test_stops_at_limit() {
        let storage = MemoryStorage::new();
        let user = seeded_user(&storage).await;
        storage
            .create_profile(NewProfile {
                id: user.id,
                email: user.email.clone(),
                full_name: None,
            })
            .await
            .unwrap();

        assert_eq!(
            storage.claim_free_test(user.id, 1).await.unwrap(),
            FreeTestClaim::Claimed
        );
        assert_eq!(
            storage.claim_free_test(user.id, 1).await.unwrap(),
            FreeTestClaim::LimitReached
        );
        let profile = storage.read_profile(user.id).await.unwrap().unwrap();
        assert_eq!(profile.free_tests_used, 1);

        storage.release_free_test(user.id).await.unwrap();
        let profile = storage.read_profile(user.id).await.unwrap().unwrap();
        assert_eq!(profile.free_tests_used, 0);

        storage
            .set_subscription(user.id, SubscriptionStatus::Premium)
            .await;
        assert_eq!(
            storage.claim_free_test(user.id, 1).await.unwrap(),
            FreeTestClaim::Premium
        );

        let err = storage.claim_free_test(Uuid::new_v4(), 1).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_missing_profile_is_not_found() {
        let storage = MemoryStorage::new();
        let err = storage
            .update_profile(Uuid::new_v4(), ProfileUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}

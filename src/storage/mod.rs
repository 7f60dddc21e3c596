// src/storage/mod.rs

//! Storage collaborator: users, profiles and exam results.
//!
//! Handlers and the exam session only see `Arc<dyn Storage>`; production runs
//! on [`postgres::PgStorage`], tests and local runs on [`memory::MemoryStorage`].

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    exam_result::{ExamResult, NewExamResult, ResultOrder},
    profile::{NewProfile, Profile, ProfileUpdate},
    user::{NewUser, User},
};

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

pub type SharedStorage = Arc<dyn Storage>;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Unique constraint violated (e.g. duplicate email).
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// A stored value could not be mapped back to its model.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Outcome of [`Storage::claim_free_test`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeTestClaim {
    /// One free test was used up.
    Claimed,
    /// Premium profiles are not counted.
    Premium,
    LimitReached,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    async fn create_profile(&self, profile: NewProfile) -> Result<Profile, StorageError>;

    async fn read_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StorageError>;

    /// Applies the set fields of `update`. Fails with `NotFound` if no profile exists.
    async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Profile, StorageError>;

    /// Uses up one free test if the profile is below `limit`, in a single
    /// atomic step. Fails with `NotFound` if no profile exists.
    async fn claim_free_test(
        &self,
        user_id: Uuid,
        limit: i32,
    ) -> Result<FreeTestClaim, StorageError>;

    /// Gives back a free test taken by `claim_free_test`.
    async fn release_free_test(&self, user_id: Uuid) -> Result<(), StorageError>;

    async fn insert_result(&self, result: NewExamResult) -> Result<ExamResult, StorageError>;

    /// At most `limit` results of `user_id`, ordered by completion time.
    async fn list_results(
        &self,
        user_id: Uuid,
        limit: i64,
        order: ResultOrder,
    ) -> Result<Vec<ExamResult>, StorageError>;
}

// src/models/profile.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::config::{FREE_TEST_LIMIT, SUPPORTED_LANGUAGES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Free,
    Premium,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Free => "free",
            SubscriptionStatus::Premium => "premium",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionStatus::Free),
            "premium" => Ok(SubscriptionStatus::Premium),
            other => Err(format!("unknown subscription status '{}'", other)),
        }
    }
}

/// Represents the 'profiles' table. One row per user, same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub preferred_language: Option<String>,
    pub free_tests_used: i32,
    pub subscription_status: SubscriptionStatus,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Profile {
    pub fn is_premium(&self) -> bool {
        self.subscription_status == SubscriptionStatus::Premium
    }
}

/// Whether a user may start another exam.
///
/// A missing profile does not block: it is created lazily.
pub fn can_take_test(profile: Option<&Profile>) -> bool {
    match profile {
        None => true,
        Some(p) => p.is_premium() || p.free_tests_used < FREE_TEST_LIMIT,
    }
}

/// Row to insert into 'profiles'.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub preferred_language: Option<String>,
}

/// DTO for the profile form.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
    #[validate(custom(function = validate_language))]
    pub preferred_language: Option<String>,
}

fn validate_language(language: &str) -> Result<(), validator::ValidationError> {
    if SUPPORTED_LANGUAGES.contains(&language) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("unsupported_language"))
    }
}

/// Response for `/api/exams/eligibility`.
#[derive(Debug, Serialize)]
pub struct Eligibility {
    pub can_take_test: bool,
    pub free_tests_used: i32,
    pub free_test_limit: i32,
    pub subscription_status: SubscriptionStatus,
}

impl Eligibility {
    pub fn for_profile(profile: Option<&Profile>) -> Self {
        Eligibility {
            can_take_test: can_take_test(profile),
            free_tests_used: profile.map(|p| p.free_tests_used).unwrap_or(0),
            free_test_limit: FREE_TEST_LIMIT,
            subscription_status: profile
                .map(|p| p.subscription_status)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(used: i32, status: SubscriptionStatus) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: "student@example.com".to_string(),
            full_name: None,
            preferred_language: Some("en".to_string()),
            free_tests_used: used,
            subscription_status: status,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_missing_profile_can_take_test() {
        assert!(can_take_test(None));
    }

    #[test]
    fn test_free_profile_is_limited() {
        assert!(can_take_test(Some(&profile(0, SubscriptionStatus::Free))));
        assert!(!can_take_test(Some(&profile(1, SubscriptionStatus::Free))));
    }

    #[test]
    fn test_premium_profile_is_unlimited() {
        assert!(can_take_test(Some(&profile(12, SubscriptionStatus::Premium))));
    }

    #[test]
    fn test_language_validation() {
        let ok = UpdateProfileRequest {
            full_name: Some("Aziza".to_string()),
            preferred_language: Some("uz".to_string()),
        };
        assert!(ok.validate().is_ok());

        let bad = UpdateProfileRequest {
            full_name: None,
            preferred_language: Some("fr".to_string()),
        };
        assert!(bad.validate().is_err());
    }
}

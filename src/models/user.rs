use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::ModelError;
use crate::security::{password, validation};

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct User {
    pub user_id: Uuid,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Canonical factory: validate credentials, hash, assign a fresh id.
    pub fn create_from_credentials(login: &str, password: &str) -> Result<Self, ModelError> {
        if !validation::login_valid(login) {
            return Err(ModelError::InvalidLogin);
        }
        if !validation::password_valid(password) {
            return Err(ModelError::WeakPassword);
        }
        let password_hash =
            password::hash_password(password, "").map_err(|_| ModelError::WeakPassword)?;

        Ok(Self {
            user_id: Uuid::new_v4(),
            login: login.to_string(),
            password_hash,
            created_at: Utc::now(),
        })
    }

    pub fn is_valid(&self) -> bool {
        !self.user_id.is_nil()
            && validation::login_valid(&self.login)
            && !self.password_hash.is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub login: Option<String>,
    pub password: Option<String>,
}

/// Public user view; never carries password material.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub login: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            login: u.login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_assigns_id_and_hashes() {
        let user = User::create_from_credentials("alice", "Secret1").unwrap();
        assert!(!user.user_id.is_nil());
        assert_eq!(user.login, "alice");
        assert!(!user.password_hash.is_empty());
        assert_ne!(user.password_hash, "Secret1");
        assert!(user.is_valid());
    }

    #[test]
    fn factory_rejects_bad_credentials() {
        assert_eq!(
            User::create_from_credentials("a!", "Secret1"),
            Err(ModelError::InvalidLogin)
        );
        assert_eq!(
            User::create_from_credentials("alice", "short"),
            Err(ModelError::WeakPassword)
        );
        assert_eq!(
            User::create_from_credentials("alice", "lettersonly"),
            Err(ModelError::WeakPassword)
        );
    }

    #[test]
    fn serialization_never_exposes_password_material() {
        let user = User::create_from_credentials("alice", "Secret1").unwrap();
        let as_json = serde_json::to_string(&user).unwrap();
        assert!(!as_json.contains("password"));
        assert!(!as_json.contains(&user.password_hash));
        assert!(as_json.contains("\"login\":\"alice\""));

        let response = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(response.get("password_hash").is_none());
        assert_eq!(response["login"], "alice");
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user_id: Uuid,
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_shape() {
        let response = AuthResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
            token_type: "Bearer",
            expires_in: 900,
            user_id: Uuid::new_v4(),
            login: "alice".into(),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["token_type"], "Bearer");
        assert_eq!(value["expires_in"], 900);
        assert_eq!(value["login"], "alice");
    }

    #[test]
    fn requests_tolerate_missing_fields() {
        let req: LoginRequest = serde_json::from_str("{}").unwrap();
        assert!(req.login.is_none());
        assert!(req.password.is_none());

        let req: RefreshRequest = serde_json::from_str("{}").unwrap();
        assert!(req.refresh_token.is_none());
    }
}

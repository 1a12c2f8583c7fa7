use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::{Identity, Role};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `member` when absent.
    pub role: Option<Role>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client. Never carries the
/// password hash.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<Identity> for PublicUser {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name,
            email: identity.email,
            role: identity.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_serializes_role_lowercase() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role: Role::Owner,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"role\":\"owner\""));
        assert!(json.contains("ada@example.com"));
    }

    #[test]
    fn register_request_accepts_optional_role() {
        let body = r#"{"name":"Ada","email":"a@b.co","password":"hunter22","role":"owner"}"#;
        let req: RegisterRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.role, Some(Role::Owner));

        let body = r#"{"name":"Ada","email":"a@b.co","password":"hunter22"}"#;
        let req: RegisterRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.role, None);
    }
}

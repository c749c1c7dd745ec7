use serde::{Deserialize, Serialize};
use validator::Validate;

pub const ANONYMOUS_NAME: &str = "Anonymous";

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub created_at: String, // RFC 3339
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct CreateUserRequest {
    email: String,
    display_name: String,
    password_hash: String,
    created_at: String,
}

impl CreateUserRequest {
    pub fn new(
        email: &str,
        display_name: Option<String>,
        password_hash: String,
        created_at: String,
    ) -> Result<Self, String> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err("Email cannot be empty".to_string());
        }

        let display_name = display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| ANONYMOUS_NAME.to_string());

        Ok(Self {
            email,
            display_name,
            password_hash,
            created_at,
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

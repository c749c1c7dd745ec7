use crate::models::{normalize_email, CreateUserRequest, RegisterForm, User};
use crate::repository::UserRepository;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use database::{Database, RepositoryError};
use rand::rngs::OsRng;
use tracing::instrument;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already registered")]
    Conflict(String),
    #[error("User not found")]
    NotFound,
    #[error("Database error: {0}")]
    Infrastructure(String),
}

impl From<RepositoryError> for UserError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => UserError::NotFound,
            RepositoryError::UniqueViolation(msg) => UserError::Conflict(msg),
            RepositoryError::Infrastructure(e) => UserError::Infrastructure(e.to_string()),
            _ => UserError::Infrastructure(err.to_string()),
        }
    }
}

fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::Infrastructure(format!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

pub struct UserService;

impl UserService {
    #[instrument(skip(db, form), fields(email = %form.email))]
    pub async fn register(db: &Database, form: RegisterForm) -> Result<User, UserError> {
        form.validate().map_err(|e| {
            let msg = e
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .filter_map(|err| err.message.as_ref().map(|m| m.to_string()))
                .collect::<Vec<_>>()
                .join("; ");
            UserError::InvalidInput(msg)
        })?;

        let password_hash = hash_password(&form.password)?;
        let created_at = chrono::Utc::now().to_rfc3339();
        let req = CreateUserRequest::new(&form.email, form.display_name, password_hash, created_at)
            .map_err(UserError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let mut repo = UserRepository::new(uow.connection());

        let id = repo.create(&req).await?;
        let user = repo.find_by_id(id).await?.ok_or(UserError::NotFound)?;

        uow.commit().await?;

        tracing::info!(user_id = user.id, "Registered new user");
        Ok(user)
    }

    #[instrument(skip(db, password))]
    pub async fn authenticate(db: &Database, email: &str, password: &str) -> Result<User, UserError> {
        let mut uow = db.begin().await?;
        let mut repo = UserRepository::new(uow.connection());

        let creds = repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !verify_password(password, &creds.password_hash) {
            return Err(UserError::InvalidCredentials);
        }

        Ok(creds.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::get_test_db;

    fn form(email: &str, password: &str) -> RegisterForm {
        RegisterForm {
            email: email.to_string(),
            password: password.to_string(),
            display_name: Some("Lin".to_string()),
        }
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn test_verify_against_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let db = get_test_db().await;

        let user = UserService::register(&db, form("Lin@Example.com", "secret1")).await.unwrap();
        assert_eq!(user.email, "lin@example.com");
        assert_eq!(user.display_name, "Lin");

        let authed = UserService::authenticate(&db, "lin@example.com", "secret1").await.unwrap();
        assert_eq!(authed.id, user.id);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let db = get_test_db().await;
        UserService::register(&db, form("lin@example.com", "secret1")).await.unwrap();

        let err = UserService::authenticate(&db, "lin@example.com", "wrong!!").await.unwrap_err();
        assert!(matches!(err, UserError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let db = get_test_db().await;
        let err = UserService::authenticate(&db, "ghost@example.com", "secret1").await.unwrap_err();
        assert!(matches!(err, UserError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let db = get_test_db().await;
        UserService::register(&db, form("lin@example.com", "secret1")).await.unwrap();

        let err = UserService::register(&db, form("LIN@example.com", "secret2")).await.unwrap_err();
        assert!(matches!(err, UserError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let db = get_test_db().await;
        let err = UserService::register(&db, form("lin@example.com", "123")).await.unwrap_err();
        assert!(matches!(err, UserError::InvalidInput(_)));
    }
}

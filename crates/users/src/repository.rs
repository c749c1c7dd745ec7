use crate::models::{CreateUserRequest, User};
use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    email: String,
    display_name: String,
    password_hash: String,
    created_at: String,
}

/// A user row together with its stored password hash.
pub(crate) struct Credentials {
    pub user: User,
    pub password_hash: String,
}

impl From<UserRecord> for Credentials {
    fn from(record: UserRecord) -> Self {
        Credentials {
            user: User {
                id: record.id,
                email: record.email,
                display_name: record.display_name,
                created_at: record.created_at,
            },
            password_hash: record.password_hash,
        }
    }
}

pub(crate) struct UserRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> UserRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, req: &CreateUserRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, display_name, password_hash, created_at) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(req.email())
        .bind(req.display_name())
        .bind(req.password_hash())
        .bind(req.created_at())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn find_by_email(&mut self, email: &str) -> Result<Option<Credentials>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, display_name, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(record.map(|r| r.into()))
    }

    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, display_name, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(record.map(|r| Credentials::from(r).user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::get_test_db;

    fn request(email: &str) -> CreateUserRequest {
        CreateUserRequest::new(email, Some("Tester".into()), "$argon2id$fake".into(), "2026-01-01T00:00:00Z".into()).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = UserRepository::new(uow.connection());

        let id = repo.create(&request("tester@example.com")).await.unwrap();
        assert!(id > 0);

        let creds = repo.find_by_email("tester@example.com").await.unwrap().unwrap();
        assert_eq!(creds.user.id, id);
        assert_eq!(creds.user.display_name, "Tester");
        assert_eq!(creds.password_hash, "$argon2id$fake");

        let user = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.email, "tester@example.com");
    }

    #[tokio::test]
    async fn test_find_missing_user() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = UserRepository::new(uow.connection());

        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(repo.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = UserRepository::new(uow.connection());

        repo.create(&request("dup@example.com")).await.unwrap();
        let err = repo.create(&request("dup@example.com")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueViolation(_)));
    }
}

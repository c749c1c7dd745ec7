use crate::models::{Category, ExpensePatch, ExpenseRecord, NewExpense};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use database::{self, Database, RepositoryError};
use sqlx::FromRow;

/// Storage contract for expense records.
///
/// Every call is scoped to the owning user; ids belonging to someone else
/// behave as if they did not exist.
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// All of the owner's expenses, oldest first.
    async fn list(&self, owner: i64) -> Result<Vec<ExpenseRecord>, RepositoryError>;

    /// Stores the expense and returns its newly assigned id.
    async fn create(&self, owner: i64, expense: &NewExpense) -> Result<String, RepositoryError>;

    async fn delete(&self, owner: i64, id: &str) -> Result<(), RepositoryError>;

    /// Applies only the fields present in `patch`.
    async fn update(&self, owner: i64, id: &str, patch: &ExpensePatch) -> Result<(), RepositoryError>;
}

#[derive(FromRow)]
struct ExpenseRow {
    id: String,
    amount: f64,
    category: String,
    created_at: String,
}

impl TryFrom<ExpenseRow> for ExpenseRecord {
    type Error = RepositoryError;

    fn try_from(row: ExpenseRow) -> Result<Self, Self::Error> {
        let category = row
            .category
            .parse::<Category>()
            .map_err(RepositoryError::Malformed)?;
        let timestamp = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| RepositoryError::Malformed(format!("expense {}: {}", row.id, e)))?
            .with_timezone(&Utc);

        Ok(ExpenseRecord {
            id: row.id,
            amount: row.amount,
            category,
            timestamp,
        })
    }
}

fn encode_timestamp(ts: DateTime<Utc>) -> String {
    // Fixed width so the TEXT column sorts chronologically
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) struct ExpenseQueries<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> ExpenseQueries<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, id: &str, owner: i64, expense: &NewExpense) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO expenses (id, user_id, amount, category, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(owner)
        .bind(expense.amount())
        .bind(expense.category().key())
        .bind(encode_timestamp(expense.timestamp()))
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn list_for_owner(&mut self, owner: i64) -> Result<Vec<ExpenseRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, ExpenseRow>(
            "SELECT id, amount, category, created_at FROM expenses WHERE user_id = $1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(owner)
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(ExpenseRecord::try_from).collect()
    }

    pub async fn update(&mut self, owner: i64, id: &str, patch: &ExpensePatch) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE expenses SET amount = COALESCE($1, amount), category = COALESCE($2, category) WHERE id = $3 AND user_id = $4",
        )
        .bind(patch.amount)
        .bind(patch.category.map(|c| c.key()))
        .bind(id)
        .bind(owner)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn delete(&mut self, owner: i64, id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// [`ExpenseRepository`] backed by the application's SQLite database.
#[derive(Clone)]
pub struct SqlExpenseRepository {
    db: Database,
}

impl SqlExpenseRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExpenseRepository for SqlExpenseRepository {
    async fn list(&self, owner: i64) -> Result<Vec<ExpenseRecord>, RepositoryError> {
        let mut uow = self.db.begin().await?;
        let mut queries = ExpenseQueries::new(uow.connection());

        queries.list_for_owner(owner).await
    }

    async fn create(&self, owner: i64, expense: &NewExpense) -> Result<String, RepositoryError> {
        let id = uuid::Uuid::new_v4().to_string();

        let mut uow = self.db.begin().await?;
        let mut queries = ExpenseQueries::new(uow.connection());
        queries.create(&id, owner, expense).await?;
        uow.commit().await?;

        Ok(id)
    }

    async fn delete(&self, owner: i64, id: &str) -> Result<(), RepositoryError> {
        let mut uow = self.db.begin().await?;
        let mut queries = ExpenseQueries::new(uow.connection());
        queries.delete(owner, id).await?;
        uow.commit().await
    }

    async fn update(&self, owner: i64, id: &str, patch: &ExpensePatch) -> Result<(), RepositoryError> {
        let mut uow = self.db.begin().await?;
        let mut queries = ExpenseQueries::new(uow.connection());
        queries.update(owner, id, patch).await?;
        uow.commit().await
    }
}

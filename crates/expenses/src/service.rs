use crate::models::{ExpensePatch, NewExpense};
use crate::repository::ExpenseRepository;
use crate::state::{DashboardState, Notice};
use chrono::{DateTime, Utc};
use common::i18n::Locale;
use database::RepositoryError;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Expense not found")]
    NotFound,
}

impl From<RepositoryError> for ExpenseError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ExpenseError::NotFound,
            RepositoryError::CheckViolation(msg) => ExpenseError::InvalidInput(msg),
            RepositoryError::Infrastructure(e) => ExpenseError::Infrastructure(e.to_string()),
            _ => ExpenseError::Infrastructure(err.to_string()),
        }
    }
}

/// Drives a [`DashboardState`] against the expense store.
///
/// Local state only changes after the store confirms a write. Every
/// successful mutation is followed by a fresh listing, and any store failure
/// leaves a [`Notice`] on the state.
#[derive(Clone)]
pub struct ExpenseService {
    repo: Arc<dyn ExpenseRepository>,
}

impl ExpenseService {
    pub fn new(repo: Arc<dyn ExpenseRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, state))]
    pub async fn refresh(
        &self,
        owner: i64,
        state: &mut DashboardState,
        locale: Locale,
    ) -> Result<(), ExpenseError> {
        match self.repo.list(owner).await {
            Ok(expenses) => {
                state.apply_listing(expenses, locale);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Listing expenses failed, keeping cached data: {}", e);
                state.notice = Some(Notice::ListFailed);
                Err(e.into())
            }
        }
    }

    /// Saves the typed amount under the selected category.
    ///
    /// Returns `Ok(None)` without touching the store when the buffer holds no
    /// usable amount. The buffer is cleared only once the store accepted the
    /// expense.
    #[instrument(skip(self, state))]
    pub async fn submit(
        &self,
        owner: i64,
        state: &mut DashboardState,
        locale: Locale,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, ExpenseError> {
        let amount = match state.buffer.amount() {
            Ok(amount) => amount,
            Err(e) => {
                tracing::debug!("Submit ignored: {}", e);
                return Ok(None);
            }
        };

        let expense = NewExpense::new(amount, state.category, now)
            .map_err(ExpenseError::InvalidInput)?;

        match self.repo.create(owner, &expense).await {
            Ok(id) => {
                tracing::info!(expense_id = %id, amount, category = %state.category, "Expense saved");
                state.buffer.reset();
                // the save stands even if the follow-up listing fails
                let _ = self.refresh(owner, state, locale).await;
                Ok(Some(id))
            }
            Err(e) => {
                tracing::error!("Saving expense failed: {}", e);
                state.notice = Some(Notice::CreateFailed);
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self, state))]
    pub async fn delete(
        &self,
        owner: i64,
        state: &mut DashboardState,
        locale: Locale,
        id: &str,
    ) -> Result<(), ExpenseError> {
        if let Err(e) = self.repo.delete(owner, id).await {
            tracing::error!("Deleting expense failed: {}", e);
            state.notice = Some(Notice::DeleteFailed);
            return Err(e.into());
        }

        let _ = self.refresh(owner, state, locale).await;
        Ok(())
    }

    #[instrument(skip(self, state))]
    pub async fn update(
        &self,
        owner: i64,
        state: &mut DashboardState,
        locale: Locale,
        id: &str,
        patch: ExpensePatch,
    ) -> Result<(), ExpenseError> {
        if let Err(msg) = patch.validate() {
            state.notice = Some(Notice::UpdateFailed);
            return Err(ExpenseError::InvalidInput(msg));
        }

        if let Err(e) = self.repo.update(owner, id, &patch).await {
            tracing::error!("Updating expense failed: {}", e);
            state.notice = Some(Notice::UpdateFailed);
            return Err(e.into());
        }

        let _ = self.refresh(owner, state, locale).await;
        Ok(())
    }
}

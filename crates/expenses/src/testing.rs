//! In-memory repository with switchable failures, for service tests.

use crate::models::{ExpensePatch, ExpenseRecord, NewExpense};
use crate::repository::ExpenseRepository;
use async_trait::async_trait;
use database::RepositoryError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryRepository {
    rows: Mutex<Vec<(i64, ExpenseRecord)>>,
    next_id: AtomicU64,
    pub created: Mutex<Vec<NewExpense>>,
    pub fail_list: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_update: AtomicBool,
}

fn unavailable() -> RepositoryError {
    RepositoryError::Infrastructure(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl ExpenseRepository for MemoryRepository {
    async fn list(&self, owner: i64) -> Result<Vec<ExpenseRecord>, RepositoryError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|(o, _)| *o == owner)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn create(&self, owner: i64, expense: &NewExpense) -> Result<String, RepositoryError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let id = format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.created.lock().unwrap().push(expense.clone());
        self.rows.lock().unwrap().push((
            owner,
            ExpenseRecord {
                id: id.clone(),
                amount: expense.amount(),
                category: expense.category(),
                timestamp: expense.timestamp(),
            },
        ));
        Ok(id)
    }

    async fn delete(&self, owner: i64, id: &str) -> Result<(), RepositoryError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|(o, r)| !(*o == owner && r.id == id));
        if rows.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update(&self, owner: i64, id: &str, patch: &ExpensePatch) -> Result<(), RepositoryError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut rows = self.rows.lock().unwrap();
        let (_, record) = rows
            .iter_mut()
            .find(|(o, r)| *o == owner && r.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if let Some(amount) = patch.amount {
            record.amount = amount;
        }
        if let Some(category) = patch.category {
            record.category = category;
        }
        Ok(())
    }
}

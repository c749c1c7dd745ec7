use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Food,
    Transport,
    Shopping,
    Utilities,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Transport,
        Category::Shopping,
        Category::Utilities,
        Category::Other,
    ];

    /// Stored value, also the translation key for the label.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Shopping => "shopping",
            Category::Utilities => "utilities",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: String,
    pub amount: f64,
    pub category: Category,
    pub timestamp: DateTime<Utc>,
}

/// An expense that has not been stored yet; the repository assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    amount: f64,
    category: Category,
    timestamp: DateTime<Utc>,
}

impl NewExpense {
    pub fn new(amount: f64, category: Category, timestamp: DateTime<Utc>) -> Result<Self, String> {
        if !amount.is_finite() || amount < 0.0 {
            return Err("Amount must be a finite, non-negative number".to_string());
        }

        Ok(Self {
            amount,
            category,
            timestamp,
        })
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Partial update of a stored expense. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpensePatch {
    pub amount: Option<f64>,
    pub category: Option<Category>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.category.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("Nothing to update".to_string());
        }
        if let Some(amount) = self.amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err("Amount must be a finite, non-negative number".to_string());
            }
        }
        Ok(())
    }
}

//! Fixed translation tables for the two supported UI languages.
//!
//! Labels are looked up by key. Unknown keys fall back to the key itself so a
//! missing entry shows up on screen instead of failing the render.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tower_sessions::Session;

pub const LOCALE_SESSION_KEY: &str = "locale";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Cn,
}

#[derive(Debug, thiserror::Error)]
#[error("Unsupported locale: {0}")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "cn" | "zh" => Ok(Locale::Cn),
            other => Err(UnknownLocale(other.to_string())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Cn => write!(f, "cn"),
        }
    }
}

const EN_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const CN_MONTHS: [&str; 12] = [
    "1月", "2月", "3月", "4月", "5月", "6月", "7月", "8月", "9月", "10月", "11月", "12月",
];

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Cn, Locale::En];

    pub fn translate<'a>(&self, key: &'a str) -> &'a str {
        match self {
            Locale::En => match key {
                "welcome" => "Welcome",
                "signOut" => "Sign Out",
                "update" => "Update",
                "delete" => "Delete",
                "food" => "Food & Dining",
                "transport" => "Transportation",
                "shopping" => "Shopping",
                "utilities" => "Utilities",
                "other" => "Other",
                "addExpense" => "Add Expense",
                "summary" => "Summary",
                "input" => "Input",
                _ => key,
            },
            Locale::Cn => match key {
                "welcome" => "欢迎",
                "signOut" => "登出",
                "update" => "更新",
                "delete" => "删除",
                "food" => "餐饮",
                "transport" => "交通",
                "shopping" => "购物",
                "utilities" => "日用",
                "other" => "其他",
                "addExpense" => "记账",
                "summary" => "明细",
                "input" => "记账",
                _ => key,
            },
        }
    }

    /// Short month name for a 1-based calendar month.
    pub fn short_month(&self, month: u32) -> &'static str {
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            Locale::En => EN_MONTHS[idx],
            Locale::Cn => CN_MONTHS[idx],
        }
    }

    /// Name shown in the language picker
    pub fn native_name(&self) -> &'static str {
        match self {
            Locale::En => "EN",
            Locale::Cn => "中文",
        }
    }
}

/// Locale picked by this browser session, or `default` if none was chosen yet.
pub async fn session_locale(session: &Session, default: Locale) -> Locale {
    session
        .get::<Locale>(LOCALE_SESSION_KEY)
        .await
        .unwrap_or(None)
        .unwrap_or(default)
}

use crate::keypad::{AmountBuffer, Key};
use crate::models::{Category, ExpenseRecord};
use crate::summary::{monthly_summary, MonthlyBucket};
use common::i18n::Locale;
use serde::{Deserialize, Serialize};

/// Failures shown to the user once, on the next page render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    ListFailed,
    CreateFailed,
    DeleteFailed,
    UpdateFailed,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::ListFailed => "Could not load expenses. Showing the last known data.",
            Notice::CreateFailed => "Add expense failed. Your amount is kept, try again.",
            Notice::DeleteFailed => "Delete failed.",
            Notice::UpdateFailed => "Update failed.",
        }
    }
}

/// Everything one browser session has on screen for one signed-in user: the
/// amount being typed, the selected category and the chart of the last listing
/// that loaded successfully.
///
/// The listing itself is never written to the session; only `buckets` carry
/// over between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    pub owner: i64,
    pub buffer: AmountBuffer,
    pub category: Category,
    #[serde(skip)]
    pub expenses: Vec<ExpenseRecord>,
    pub buckets: Vec<MonthlyBucket>,
    pub notice: Option<Notice>,
}

impl DashboardState {
    pub fn new(owner: i64, max_digits: usize) -> Self {
        Self {
            owner,
            buffer: AmountBuffer::with_max_digits(max_digits),
            category: Category::default(),
            expenses: Vec::new(),
            buckets: Vec::new(),
            notice: None,
        }
    }

    /// Picks up the state saved in the session, unless it belongs to another
    /// account, in which case `owner` starts from scratch.
    pub fn restore(stored: Option<DashboardState>, owner: i64, max_digits: usize) -> Self {
        match stored {
            Some(state) if state.owner == owner => state,
            _ => Self::new(owner, max_digits),
        }
    }

    pub fn press(&mut self, key: Key) {
        self.buffer.press(key);
    }

    pub fn select_category(&mut self, category: Category) {
        self.category = category;
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Replaces the cached listing and recomputes the chart from it.
    pub fn apply_listing(&mut self, expenses: Vec<ExpenseRecord>, locale: Locale) {
        self.buckets = monthly_summary(&expenses, locale);
        self.expenses = expenses;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_new_state_is_empty_with_food_selected() {
        let state = DashboardState::new(1, 12);
        assert!(state.buffer.is_empty());
        assert_eq!(state.category, Category::Food);
        assert!(state.buckets.is_empty());
        assert!(state.notice.is_none());
    }

    #[test]
    fn test_take_notice_clears_it() {
        let mut state = DashboardState::new(1, 12);
        state.notice = Some(Notice::DeleteFailed);
        assert_eq!(state.take_notice(), Some(Notice::DeleteFailed));
        assert_eq!(state.take_notice(), None);
    }

    #[test]
    fn test_apply_listing_recomputes_buckets() {
        let mut state = DashboardState::new(1, 12);
        let records = vec![ExpenseRecord {
            id: "a".into(),
            amount: 4.0,
            category: Category::Shopping,
            timestamp: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
        }];
        state.apply_listing(records, Locale::En);
        assert_eq!(state.expenses.len(), 1);
        assert_eq!(state.buckets, vec![MonthlyBucket { month: "Aug".into(), total: 4.0 }]);
    }

    #[test]
    fn test_state_survives_session_serialization() {
        let mut state = DashboardState::new(1, 5);
        state.press(Key::Digit(3));
        state.press(Key::DecimalPoint);
        state.select_category(Category::Utilities);

        let json = serde_json::to_value(&state).unwrap();
        let back: DashboardState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.buffer.current_value(), "3.");
    }

    #[test]
    fn test_listing_is_not_serialized_but_chart_is() {
        let mut state = DashboardState::new(1, 12);
        state.apply_listing(
            vec![ExpenseRecord {
                id: "a".into(),
                amount: 9.0,
                category: Category::Food,
                timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap(),
            }],
            Locale::En,
        );

        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("expenses").is_none());
        let back: DashboardState = serde_json::from_value(json).unwrap();
        assert!(back.expenses.is_empty());
        assert_eq!(back.buckets, vec![MonthlyBucket { month: "Mar".into(), total: 9.0 }]);
    }

    #[test]
    fn test_restore_keeps_own_state() {
        let mut state = DashboardState::new(7, 12);
        state.press(Key::Digit(4));
        let restored = DashboardState::restore(Some(state.clone()), 7, 12);
        assert_eq!(restored, state);
    }

    #[test]
    fn test_restore_discards_other_accounts_state() {
        let mut state = DashboardState::new(7, 12);
        state.press(Key::Digit(9));
        state.select_category(Category::Shopping);
        state.buckets = vec![MonthlyBucket { month: "Jan".into(), total: 9.0 }];

        let restored = DashboardState::restore(Some(state), 8, 12);
        assert_eq!(restored.owner, 8);
        assert!(restored.buffer.is_empty());
        assert_eq!(restored.category, Category::Food);
        assert!(restored.buckets.is_empty());
    }

    #[test]
    fn test_restore_without_saved_state() {
        let restored = DashboardState::restore(None, 3, 4);
        assert_eq!(restored, DashboardState::new(3, 4));
    }
}

use crate::keypad::Key;
use crate::models::{Category, ExpensePatch};
use crate::repository::ExpenseRepository;
use crate::service::{ExpenseError, ExpenseService};
use crate::state::DashboardState;
use crate::summary::MonthlyBucket;
use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post, put},
    Extension, Form, Json, Router,
};
use common::{auth::CurrentUser, i18n::{session_locale, Locale}, AppState};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_sessions::Session;

pub const DASHBOARD_SESSION_KEY: &str = "dashboard";

impl IntoResponse for ExpenseError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ExpenseError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ExpenseError::NotFound => (StatusCode::NOT_FOUND, "Expense not found".to_string()),
            ExpenseError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Clone)]
pub struct ExpensesState {
    pub app: Arc<AppState>,
    pub service: ExpenseService,
}

pub fn expenses_router(state: Arc<AppState>, repo: Arc<dyn ExpenseRepository>) -> Router<Arc<AppState>> {
    let state = ExpensesState {
        app: state,
        service: ExpenseService::new(repo),
    };

    Router::new()
        .route("/", get(input_view).post(submit_expense))
        .route("/keypad", post(press_key))
        .route("/category", post(select_category))
        .route("/summary", get(summary_view))
        .route("/summary.json", get(summary_json))
        .route("/{id}", put(update_expense).delete(delete_expense))
        .route("/{id}/update", post(update_expense_form))
        .route("/{id}/delete", post(delete_expense_form))
        .with_state(state)
}

// --- Session plumbing ---

struct Ctx {
    session: Session,
    locale: Locale,
    dashboard: DashboardState,
}

impl Ctx {
    async fn load(state: &ExpensesState, session: Session, owner: i64) -> Self {
        let config = &state.app.config;
        let locale = session_locale(&session, config.default_locale).await;
        let stored = session
            .get::<DashboardState>(DASHBOARD_SESSION_KEY)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Discarding unreadable dashboard state: {}", e);
                None
            });
        let dashboard = DashboardState::restore(stored, owner, config.max_amount_digits);
        Self { session, locale, dashboard }
    }

    async fn save(&self) -> Result<(), ExpenseError> {
        self.session
            .insert(DASHBOARD_SESSION_KEY, &self.dashboard)
            .await
            .map_err(|e| ExpenseError::Infrastructure(e.to_string()))
    }
}

// --- View models ---

pub struct HeaderView {
    pub display_name: String,
    pub email: String,
    pub locales: Vec<LocaleOption>,
}

pub struct LocaleOption {
    pub code: String,
    pub name: String,
    pub selected: bool,
}

pub struct Labels {
    pub welcome: String,
    pub sign_out: String,
    pub add_expense: String,
    pub summary: String,
    pub input: String,
    pub delete: String,
    pub update: String,
}

pub struct CategoryOption {
    pub key: String,
    pub label: String,
    pub selected: bool,
}

pub struct KeyView {
    pub value: String,
    pub label: String,
}

pub struct BarView {
    pub month: String,
    pub total: String,
    pub percent: String,
}

pub struct ExpenseRowView {
    pub id: String,
    pub category_label: String,
    pub amount: String,
    pub date: String,
}

#[derive(Template)]
#[template(path = "input.html")]
pub struct InputTemplate {
    pub header: HeaderView,
    pub labels: Labels,
    pub notice: Option<String>,
    pub amount_display: String,
    pub can_submit: bool,
    pub categories: Vec<CategoryOption>,
    pub keys: Vec<KeyView>,
}

#[derive(Template)]
#[template(path = "summary.html")]
pub struct SummaryTemplate {
    pub header: HeaderView,
    pub labels: Labels,
    pub notice: Option<String>,
    pub bars: Vec<BarView>,
    pub rows: Vec<ExpenseRowView>,
}

const KEYPAD_LAYOUT: [&str; 12] = ["1", "2", "3", "4", "5", "6", "7", "8", "9", ".", "0", "backspace"];

fn header_view(user: &CurrentUser, locale: Locale) -> HeaderView {
    HeaderView {
        display_name: user.display_name.clone(),
        email: user.email.clone(),
        locales: Locale::ALL
            .iter()
            .map(|l| LocaleOption {
                code: l.to_string(),
                name: l.native_name().to_string(),
                selected: *l == locale,
            })
            .collect(),
    }
}

fn labels(locale: Locale) -> Labels {
    Labels {
        welcome: locale.translate("welcome").to_string(),
        sign_out: locale.translate("signOut").to_string(),
        add_expense: locale.translate("addExpense").to_string(),
        summary: locale.translate("summary").to_string(),
        input: locale.translate("input").to_string(),
        delete: locale.translate("delete").to_string(),
        update: locale.translate("update").to_string(),
    }
}

pub fn chart_bars(buckets: &[MonthlyBucket]) -> Vec<BarView> {
    let max = buckets.iter().map(|b| b.total).fold(0.0_f64, f64::max);
    buckets
        .iter()
        .map(|b| {
            let percent = if max > 0.0 { b.total / max * 100.0 } else { 0.0 };
            BarView {
                month: b.month.clone(),
                total: format!("{:.2}", b.total),
                percent: format!("{:.0}", percent),
            }
        })
        .collect()
}

fn render<T: Template>(template: T) -> Result<Html<String>, ExpenseError> {
    template
        .render()
        .map(Html)
        .map_err(|e| ExpenseError::Infrastructure(e.to_string()))
}

// --- Handlers ---

async fn input_view(
    State(state): State<ExpensesState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
) -> Result<impl IntoResponse, ExpenseError> {
    let mut ctx = Ctx::load(&state, session, user.id).await;
    let notice = ctx.dashboard.take_notice().map(|n| n.message().to_string());
    ctx.save().await?;

    let locale = ctx.locale;
    let buffer = &ctx.dashboard.buffer;
    let template = InputTemplate {
        header: header_view(&user, locale),
        labels: labels(locale),
        notice,
        amount_display: if buffer.is_empty() {
            "0".to_string()
        } else {
            buffer.current_value().to_string()
        },
        can_submit: buffer.is_submittable(),
        categories: Category::ALL
            .iter()
            .map(|c| CategoryOption {
                key: c.key().to_string(),
                label: locale.translate(c.key()).to_string(),
                selected: *c == ctx.dashboard.category,
            })
            .collect(),
        keys: KEYPAD_LAYOUT
            .iter()
            .map(|k| KeyView {
                value: k.to_string(),
                label: if *k == "backspace" { "←".to_string() } else { k.to_string() },
            })
            .collect(),
    };

    render(template)
}

#[derive(Deserialize)]
pub struct KeyForm {
    pub key: String,
}

async fn press_key(
    State(state): State<ExpensesState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Form(payload): Form<KeyForm>,
) -> Result<Redirect, ExpenseError> {
    let key: Key = payload
        .key
        .parse()
        .map_err(|e: crate::keypad::UnknownKey| ExpenseError::InvalidInput(e.to_string()))?;

    let mut ctx = Ctx::load(&state, session, user.id).await;
    ctx.dashboard.press(key);
    ctx.save().await?;

    Ok(Redirect::to("/expenses"))
}

#[derive(Deserialize)]
pub struct CategoryForm {
    pub category: String,
}

async fn select_category(
    State(state): State<ExpensesState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Form(payload): Form<CategoryForm>,
) -> Result<Redirect, ExpenseError> {
    let category: Category = payload.category.parse().map_err(ExpenseError::InvalidInput)?;

    let mut ctx = Ctx::load(&state, session, user.id).await;
    ctx.dashboard.select_category(category);
    ctx.save().await?;

    Ok(Redirect::to("/expenses"))
}

async fn submit_expense(
    State(state): State<ExpensesState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
) -> Result<Redirect, ExpenseError> {
    let mut ctx = Ctx::load(&state, session, user.id).await;
    let now = chrono::Utc::now();

    // failures are already recorded as a notice for the next render
    if let Err(e) = state.service.submit(user.id, &mut ctx.dashboard, ctx.locale, now).await {
        tracing::warn!("submit_expense error: {:?}", e);
    }
    ctx.save().await?;

    Ok(Redirect::to("/expenses"))
}

async fn summary_view(
    State(state): State<ExpensesState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
) -> Result<impl IntoResponse, ExpenseError> {
    let mut ctx = Ctx::load(&state, session, user.id).await;
    let locale = ctx.locale;
    let _ = state.service.refresh(user.id, &mut ctx.dashboard, locale).await;
    let notice = ctx.dashboard.take_notice().map(|n| n.message().to_string());
    ctx.save().await?;

    let rows = ctx
        .dashboard
        .expenses
        .iter()
        .map(|e| ExpenseRowView {
            id: e.id.clone(),
            category_label: locale.translate(e.category.key()).to_string(),
            amount: format!("{:.2}", e.amount),
            date: e.timestamp.format("%e %b %Y").to_string(),
        })
        .collect();

    let template = SummaryTemplate {
        header: header_view(&user, locale),
        labels: labels(locale),
        notice,
        bars: chart_bars(&ctx.dashboard.buckets),
        rows,
    };

    render(template)
}

/// Chart data for the current user. Serves the last good data if the store is
/// unreachable.
async fn summary_json(
    State(state): State<ExpensesState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
) -> Result<Json<Vec<MonthlyBucket>>, ExpenseError> {
    let mut ctx = Ctx::load(&state, session, user.id).await;
    let _ = state.service.refresh(user.id, &mut ctx.dashboard, ctx.locale).await;
    ctx.save().await?;

    Ok(Json(ctx.dashboard.buckets.clone()))
}

async fn update_expense(
    State(state): State<ExpensesState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<String>,
    Json(patch): Json<ExpensePatch>,
) -> Result<impl IntoResponse, ExpenseError> {
    let mut ctx = Ctx::load(&state, session, user.id).await;
    let result = state
        .service
        .update(user.id, &mut ctx.dashboard, ctx.locale, &id, patch)
        .await;
    ctx.save().await?;
    result?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct UpdateAmountForm {
    pub amount: String,
}

async fn update_expense_form(
    State(state): State<ExpensesState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<String>,
    Form(payload): Form<UpdateAmountForm>,
) -> Result<Redirect, ExpenseError> {
    let amount = payload
        .amount
        .trim()
        .parse::<f64>()
        .map_err(|e| ExpenseError::InvalidInput(format!("Invalid amount: {}", e)))?;
    let patch = ExpensePatch {
        amount: Some(amount),
        category: None,
    };

    let mut ctx = Ctx::load(&state, session, user.id).await;

    if let Err(e) = state
        .service
        .update(user.id, &mut ctx.dashboard, ctx.locale, &id, patch)
        .await
    {
        tracing::warn!("update_expense_form error: {:?}", e);
    }
    ctx.save().await?;

    Ok(Redirect::to("/expenses/summary"))
}

async fn delete_expense(
    State(state): State<ExpensesState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ExpenseError> {
    let mut ctx = Ctx::load(&state, session, user.id).await;
    let result = state
        .service
        .delete(user.id, &mut ctx.dashboard, ctx.locale, &id)
        .await;
    ctx.save().await?;
    result?;

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_expense_form(
    State(state): State<ExpensesState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect, ExpenseError> {
    let mut ctx = Ctx::load(&state, session, user.id).await;
    if let Err(e) = state
        .service
        .delete(user.id, &mut ctx.dashboard, ctx.locale, &id)
        .await
    {
        tracing::warn!("delete_expense_form error: {:?}", e);
    }
    ctx.save().await?;

    Ok(Redirect::to("/expenses/summary"))
}

//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its request body or query parameters, works through
//! the repositories and completion client held in AppState, and returns a
//! JSON response (or an SSE stream for chat).

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;
use tracing::{info, warn};

use parley_completion::Completion;
use parley_core::types;

use crate::error::ApiError;
use crate::extract::Payload;
use crate::state::AppState;
use crate::stream::char_events;

// =============================================================================
// Request types
// =============================================================================

/// Request body for POST /chat/.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: Option<String>,
}

/// Query parameters for GET /cates/.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryParams {
    pub title: Option<String>,
}

/// Request body for POST /questions/.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AskRequest {
    pub ask: Option<String>,
    pub cateid: Option<String>,
}

/// Query parameters for GET /questions/. `page` stays a string so that a
/// malformed value falls back to the first page instead of a 400.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionParams {
    pub cateid: Option<String>,
    pub page: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCategoryResponse {
    pub code: u16,
    pub cateid: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryItem {
    pub code: String,
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub code: u16,
    pub clist: Vec<CategoryItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub code: u16,
    /// Title given to the category by this question, or empty.
    pub catename: String,
    pub answer: String,
    /// Category the question was stored under.
    pub cateid: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionItem {
    pub ask: Option<String>,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionListResponse {
    pub code: u16,
    pub qlist: Vec<QuestionItem>,
    pub current_page: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub total_categories: u64,
}

// =============================================================================
// Helpers
// =============================================================================

/// Require a non-blank string field.
fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!("'{}' is required", name))),
    }
}

/// Ask the completion endpoint, turning failures and empty replies into
/// upstream errors.
async fn answer_for(state: &AppState, question: &str) -> Result<String, ApiError> {
    match state.completion.complete(question).await {
        Ok(Completion::Answer(text)) => Ok(text),
        Ok(Completion::Empty) => {
            warn!("Completion endpoint returned no choices");
            Err(ApiError::Upstream("no completion available".to_string()))
        }
        Err(e) => {
            warn!(error = %e, "Completion request failed");
            Err(e.into())
        }
    }
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /chat/ - answer a single question as a character stream.
///
/// Nothing is stored.
pub async fn chat(
    State(state): State<AppState>,
    Payload(body): Payload<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + Send>, ApiError> {
    let question = required(body.question.as_deref(), "question")?;
    let answer = answer_for(&state, question).await?;

    Ok(Sse::new(char_events(&answer, state.stream_delay())))
}

/// POST /cates/ - return an open category, creating one if needed.
pub async fn create_category(
    State(state): State<AppState>,
) -> Result<Json<CreateCategoryResponse>, ApiError> {
    let category = state.categories.ensure_open()?;
    Ok(Json(CreateCategoryResponse {
        code: 200,
        cateid: category.code,
    }))
}

/// GET /cates/ - list titled categories, newest first.
pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<CategoryParams>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let clist = state
        .categories
        .list(params.title.as_deref())?
        .into_iter()
        .map(|c| CategoryItem {
            code: c.code,
            title: c.title,
        })
        .collect();

    Ok(Json(CategoryListResponse { code: 200, clist }))
}

/// POST /questions/ - answer a question and record it under a category.
///
/// An unknown `cateid` is replaced by an open category; the response
/// reports the code actually used.
pub async fn ask_question(
    State(state): State<AppState>,
    Payload(body): Payload<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let ask = required(body.ask.as_deref(), "ask")?;
    let cateid = required(body.cateid.as_deref(), "cateid")?;

    let category = state.categories.get_or_create_by_code(Some(cateid))?;
    let answer = answer_for(&state, ask).await?;

    let (question, title) = state.questions.record(ask, &answer, &category.code)?;
    info!(id = question.id, code = %category.code, "Question recorded");

    Ok(Json(AskResponse {
        code: 200,
        catename: title.unwrap_or_default(),
        answer,
        cateid: category.code,
    }))
}

/// GET /questions/ - one page of a category's history, newest first.
pub async fn list_questions(
    State(state): State<AppState>,
    Query(params): Query<QuestionParams>,
) -> Result<Json<QuestionListResponse>, ApiError> {
    let cateid = required(params.cateid.as_deref(), "cateid")?;

    if state.categories.find_by_code(cateid)?.is_none() {
        return Err(ApiError::NotFound(format!("Category not found: {}", cateid)));
    }

    let requested = types::parse_page(params.page.as_deref());
    let page = state.questions.list_page(cateid, requested)?;

    Ok(Json(QuestionListResponse {
        code: 200,
        qlist: page
            .items
            .into_iter()
            .map(|q| QuestionItem {
                ask: q.ask,
                answer: q.answer,
            })
            .collect(),
        current_page: page.page,
        total_pages: page.total_pages,
    }))
}

/// GET /health - health check endpoint.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let total_categories = state.categories.count().unwrap_or(0);

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        total_categories,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_accepts_text() {
        assert_eq!(required(Some("hello"), "ask").unwrap(), "hello");
    }

    #[test]
    fn test_required_rejects_missing_and_blank() {
        for value in [None, Some(""), Some("   \n")] {
            match required(value, "ask") {
                Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "'ask' is required"),
                other => panic!("expected BadRequest, got {:?}", other),
            }
        }
    }
}

use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;

use crate::constants::pagination;
use crate::entities::diary_entries;
use crate::services::{Sentiment, classify};

use super::auth::CurrentUser;
use super::types::{
    DiaryContentRequest, DiaryDto, DiaryListDto, DiaryStatsDto, ListQuery, MessageDto,
};
use super::validation::validate_content;
use super::{ApiError, AppState};

// ============================================================================
// Helpers
// ============================================================================

/// Parse a pagination parameter, falling back to the default when the
/// value is missing or not a number.
fn parse_page_param(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|value| value.parse().ok()).unwrap_or(default)
}

/// A path segment that is not a valid id gets the generic 404, same as
/// any unknown route.
fn parse_entry_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(_) => Err(ApiError::NotFound("Resource not found".to_string())),
    }
}

/// Fetch an entry and enforce ownership. Existence is always answered
/// first: an id that does not exist is a 404 even for the wrong user,
/// and only an existing entry owned by someone else is a 403.
async fn load_owned_entry(
    state: &AppState,
    id: i32,
    user_id: i32,
    action: &str,
) -> Result<diary_entries::Model, ApiError> {
    let Some(entry) = state.store().get_diary_entry(id).await? else {
        return Err(ApiError::DiaryNotFound);
    };

    if entry.user_id != user_id {
        return Err(ApiError::forbidden(action));
    }

    Ok(entry)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /diaries
/// Page through the authenticated user's entries, newest first.
pub async fn list_diaries(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<DiaryListDto>, ApiError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();

    let page = parse_page_param(query.page, pagination::DEFAULT_PAGE).max(1);
    let per_page = parse_page_param(query.per_page, pagination::DEFAULT_PER_PAGE)
        .clamp(1, pagination::MAX_PER_PAGE);

    let (entries, total, pages) = state
        .store()
        .list_diary_entries(current.id, page, per_page)
        .await?;

    Ok(Json(DiaryListDto {
        items: entries.into_iter().map(DiaryDto::from).collect(),
        page,
        per_page,
        total,
        pages,
    }))
}

/// POST /diaries
/// Create an entry. Annotation runs synchronously and degrades to a
/// neutral result rather than failing the write.
pub async fn create_diary(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<DiaryContentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DiaryDto>), ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let content = payload
        .content
        .ok_or_else(|| ApiError::validation("Content is required"))?;

    validate_content(&content)?;

    let annotation = state.annotator().annotate(&content).await;

    let entry = state
        .store()
        .create_diary_entry(
            current.id,
            &content,
            Some(annotation.analyzed_content),
            annotation.positive_count,
            annotation.negative_count,
        )
        .await?;

    tracing::info!("User {} created diary entry {}", current.id, entry.id);

    Ok((StatusCode::CREATED, Json(DiaryDto::from(entry))))
}

/// GET /diaries/{id}
pub async fn get_diary(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<DiaryDto>, ApiError> {
    let id = parse_entry_id(path)?;
    let entry = load_owned_entry(&state, id, current.id, "access").await?;

    Ok(Json(DiaryDto::from(entry)))
}

/// PUT /diaries/{id}
/// Replace the content and recompute the annotation.
pub async fn update_diary(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<DiaryContentRequest>, JsonRejection>,
) -> Result<Json<DiaryDto>, ApiError> {
    let id = parse_entry_id(path)?;
    let Json(payload) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let content = payload
        .content
        .ok_or_else(|| ApiError::validation("Content is required"))?;

    validate_content(&content)?;

    let entry = load_owned_entry(&state, id, current.id, "update").await?;

    let annotation = state.annotator().annotate(&content).await;

    let updated = state
        .store()
        .update_diary_entry(
            entry,
            &content,
            Some(annotation.analyzed_content),
            annotation.positive_count,
            annotation.negative_count,
        )
        .await?;

    tracing::info!("User {} updated diary entry {}", current.id, updated.id);

    Ok(Json(DiaryDto::from(updated)))
}

/// DELETE /diaries/{id}
pub async fn delete_diary(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageDto>, ApiError> {
    let id = parse_entry_id(path)?;
    let entry = load_owned_entry(&state, id, current.id, "delete").await?;

    if !state.store().remove_diary_entry(entry.id).await? {
        return Err(ApiError::DiaryNotFound);
    }

    tracing::info!("User {} deleted diary entry {}", current.id, entry.id);

    Ok(Json(MessageDto {
        message: "Diary entry deleted successfully",
    }))
}

/// GET /diaries/stats
/// Aggregate sentiment counts over every entry the user owns.
pub async fn get_diary_stats(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<DiaryStatsDto>, ApiError> {
    let counts = state.store().diary_sentiment_counts(current.id).await?;

    let mut stats = DiaryStatsDto {
        total_entries: counts.len(),
        positive_entries: 0,
        negative_entries: 0,
        neutral_entries: 0,
    };

    for (positive, negative) in counts {
        match classify(positive, negative) {
            Sentiment::Positive => stats.positive_entries += 1,
            Sentiment::Negative => stats.negative_entries += 1,
            Sentiment::Neutral => stats.neutral_entries += 1,
        }
    }

    Ok(Json(stats))
}

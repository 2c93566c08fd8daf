//! TLS surface for remote clients. Mirrors the plain query set behind
//! token authentication and adds the archive download endpoint.
//!
//! Contract: `POST /registration` trades credentials for a session token;
//! every other endpoint requires the `authorization` header to match the
//! stored token of the user named in the JSON body.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use infrastructure::exchange;

use crate::api::{self, PageParams, PageResponse, StatusResponse};
use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/registration", post(registration))
        .route("/status", get(status))
        .route("/cntstr", get(count_for_date))
        .route("/partdatadb", get(archive_page))
        .route("/datadb", get(archive_day))
        .route("/xlsx", get(archive_download))
        .with_state(state)
}

/// Checks the `authorization` header against the stored token of `name`.
/// Missing token, unknown user and mismatch are indistinguishable to the
/// client: all answer 400.
async fn authorize(state: &AppState, headers: &HeaderMap, name: &str) -> Result<(), ApiError> {
    let Some(token) = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .filter(|token| !token.is_empty())
    else {
        warn!(user = name, "request without a token");
        return Err(ApiError::BadRequest);
    };

    let Some(stored) = state
        .users
        .token(name)
        .await
        .map_err(ApiError::internal)?
    else {
        warn!(user = name, "token check for unknown user");
        return Err(ApiError::BadRequest);
    };

    if stored != token {
        warn!(user = name, "token mismatch");
        return Err(ApiError::BadRequest);
    }
    Ok(())
}

/// Splits a `"<name> <password>"` login body. Exactly one separating
/// space; both halves non-empty.
fn split_credentials(body: &str) -> Option<(&str, &str)> {
    let mut parts = body.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(password), None) if !name.is_empty() && !password.is_empty() => {
            Some((name, password))
        }
        _ => None,
    }
}

/// Body `"<name> <password>"`. On a hash match a fresh token is stored and
/// returned; the password itself is never logged.
async fn registration(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let _serial = state.gate.lock().await;

    let Some((name, password)) = split_credentials(&body) else {
        warn!("malformed registration body");
        return Err(ApiError::BadRequest);
    };

    let Some(stored_hash) = state
        .users
        .password_hash(name)
        .await
        .map_err(ApiError::internal)?
    else {
        warn!(user = name, "login attempt for unknown user");
        return Err(ApiError::BadRequest);
    };

    if stored_hash != auth::hash_password(password) {
        warn!(user = name, "login attempt with wrong password");
        return Err(ApiError::Forbidden);
    }

    let token = auth::generate_token(name, password, Utc::now().timestamp());
    state
        .users
        .save_token(name, &token)
        .await
        .map_err(ApiError::internal)?;

    info!(user = name, "user logged in");
    Ok(Json(json!({ "token": token })))
}

#[derive(Deserialize)]
struct NamedBody {
    name: String,
}

#[derive(Deserialize)]
struct DatedBody {
    date: String,
    name: String,
}

async fn status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NamedBody>,
) -> Result<Json<StatusResponse>, ApiError> {
    let _serial = state.gate.lock().await;
    authorize(&state, &headers, &body.name).await?;
    info!(user = %body.name, "status requested");
    Ok(Json(api::build_status(&state)))
}

async fn count_for_date(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<DatedBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let _serial = state.gate.lock().await;
    authorize(&state, &headers, &body.name).await?;
    let date = api::parse_date(&body.date)?;
    let count = state
        .archive
        .count_for_date(date)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(json!({ "cntstr": count })))
}

async fn archive_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
    Json(body): Json<DatedBody>,
) -> Result<Json<PageResponse>, ApiError> {
    let _serial = state.gate.lock().await;
    authorize(&state, &headers, &body.name).await?;
    let date = api::parse_date(&body.date)?;
    let page = api::read_archive_page(&state, &params, date).await?;
    info!(user = %body.name, date = %body.date, rows = page.data.len(), "archive page served");
    Ok(Json(page))
}

async fn archive_day(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<DatedBody>,
) -> Result<Json<api::DayResponse>, ApiError> {
    let _serial = state.gate.lock().await;
    authorize(&state, &headers, &body.name).await?;
    let day = api::read_archive_day(&state, &body.date).await?;
    info!(user = %body.name, date = %body.date, rows = day.datadb.len(), "archive day served");
    Ok(Json(day))
}

/// Streams one day's archive as a spreadsheet attachment. The row count
/// travels in the `Count-Strings` header so paging clients can size their
/// loops without parsing the body.
async fn archive_download(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<DatedBody>,
) -> Result<Response, ApiError> {
    let _serial = state.gate.lock().await;
    authorize(&state, &headers, &body.name).await?;

    let date = api::parse_date(&body.date)?;
    let rows = state
        .archive
        .rows_for_date_asc(date)
        .await
        .map_err(ApiError::internal)?;
    let row_count = rows.len();
    let content = exchange::render_archive_csv(&rows).map_err(ApiError::internal)?;
    let filename = state.settings.export_file_basename();

    info!(user = %body.name, date = %body.date, rows = row_count, "archive download served");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE.as_str(), "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION.as_str(),
                format!("attachment; filename={filename}"),
            ),
            ("Count-Strings", row_count.to_string()),
        ],
        content,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_name_space_password() {
        assert_eq!(split_credentials("admin pwd"), Some(("admin", "pwd")));
        assert_eq!(split_credentials("a b c"), None);
        assert_eq!(split_credentials("admin"), None);
        assert_eq!(split_credentials("admin "), None);
        assert_eq!(split_credentials(" pwd"), None);
        assert_eq!(split_credentials(""), None);
    }
}

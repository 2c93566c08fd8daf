//! Plain HTTP surface for local clients. No authentication; the TLS
//! surface in [`crate::remote`] mirrors these queries behind token auth.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use infrastructure::logging::{self, LogSizes};
use infrastructure::ArchiveRow;

use crate::error::ApiError;
use crate::state::{AppState, RtuLinkInfo, TcpLinkInfo};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/cntstr", get(count_for_date))
        .route("/partdatadb", get(archive_page))
        .route("/datadb", get(archive_day))
        .with_state(state)
}

#[derive(Serialize)]
pub struct StatusResponse {
    #[serde(rename = "timeStart")]
    pub time_start: String,
    #[serde(rename = "mbRTU")]
    pub mb_rtu: Vec<RtuLinkInfo>,
    #[serde(rename = "mbTCP")]
    pub mb_tcp: Vec<TcpLinkInfo>,
    #[serde(rename = "sizeFiles")]
    pub size_files: LogSizes,
}

#[derive(Serialize)]
pub struct DataElement {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Qual")]
    pub qual: String,
    #[serde(rename = "TimeStamp")]
    pub timestamp: String,
}

impl From<ArchiveRow> for DataElement {
    fn from(row: ArchiveRow) -> Self {
        Self {
            name: row.name,
            value: row.value,
            qual: row.qual,
            timestamp: row.timestamp,
        }
    }
}

/// `YYYY-MM-DD`, the only date format the surfaces accept.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        warn!(date = raw, "rejected malformed date");
        ApiError::BadRequest
    })
}

pub fn build_status(state: &AppState) -> StatusResponse {
    let size_files = logging::log_file_sizes(&state.settings.log_path).unwrap_or_else(|error| {
        warn!(%error, "log sizes unavailable");
        LogSizes::default()
    });
    StatusResponse {
        time_start: state.started_at.clone(),
        mb_rtu: state.links.rtu.clone(),
        mb_tcp: state.links.tcp.clone(),
        size_files,
    }
}

async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    let _serial = state.gate.lock().await;
    info!("status requested");
    Ok(Json(build_status(&state)))
}

#[derive(Deserialize)]
struct DateParams {
    date: String,
}

async fn count_for_date(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let _serial = state.gate.lock().await;
    let date = parse_date(&params.date)?;
    let count = state
        .archive
        .count_for_date(date)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(json!({ "cntstr": count })))
}

#[derive(Deserialize)]
pub struct PageParams {
    #[serde(rename = "numbReg", default)]
    pub numb_reg: Option<String>,
    #[serde(rename = "strLimit")]
    pub str_limit: String,
    #[serde(rename = "strOffSet")]
    pub str_offset: String,
}

#[derive(Deserialize)]
struct PageQuery {
    #[serde(rename = "numbReg", default)]
    numb_reg: Option<String>,
    #[serde(rename = "strLimit")]
    str_limit: String,
    #[serde(rename = "strOffSet")]
    str_offset: String,
    #[serde(rename = "dateDB")]
    date_db: String,
}

#[derive(Serialize)]
pub struct PageResponse {
    pub numbreq: String,
    pub data: Vec<DataElement>,
}

/// Shared by the plain and TLS variants of `/partdatadb`.
pub async fn read_archive_page(
    state: &AppState,
    params: &PageParams,
    date: NaiveDate,
) -> Result<PageResponse, ApiError> {
    let limit: i64 = params.str_limit.parse().map_err(|_| ApiError::BadRequest)?;
    if limit < 1 {
        warn!(limit, "rejected non-positive page limit");
        return Err(ApiError::BadRequest);
    }
    let offset: i64 = params.str_offset.parse().map_err(|_| ApiError::BadRequest)?;
    if offset < 0 {
        warn!(offset, "rejected negative page offset");
        return Err(ApiError::BadRequest);
    }

    let rows = state
        .archive
        .page_for_date(date, limit, offset)
        .await
        .map_err(ApiError::internal)?;

    Ok(PageResponse {
        numbreq: params.numb_reg.clone().unwrap_or_default(),
        data: rows.into_iter().map(DataElement::from).collect(),
    })
}

async fn archive_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse>, ApiError> {
    let _serial = state.gate.lock().await;
    let date = parse_date(&query.date_db)?;
    let params = PageParams {
        numb_reg: query.numb_reg,
        str_limit: query.str_limit,
        str_offset: query.str_offset,
    };
    let page = read_archive_page(&state, &params, date).await?;
    Ok(Json(page))
}

#[derive(Deserialize)]
struct StartDateParams {
    startdate: String,
}

#[derive(Serialize)]
pub struct DayResponse {
    pub startdate: String,
    pub datadb: Vec<DataElement>,
}

/// Shared by the plain and TLS variants of `/datadb`.
pub async fn read_archive_day(state: &AppState, raw_date: &str) -> Result<DayResponse, ApiError> {
    let date = parse_date(raw_date)?;
    let rows = state
        .archive
        .rows_for_date_desc(date)
        .await
        .map_err(ApiError::internal)?;
    Ok(DayResponse {
        startdate: raw_date.to_string(),
        datadb: rows.into_iter().map(DataElement::from).collect(),
    })
}

async fn archive_day(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StartDateParams>,
) -> Result<Json<DayResponse>, ApiError> {
    let _serial = state.gate.lock().await;
    let day = read_archive_day(&state, &params.startdate).await?;
    Ok(Json(day))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_iso_dates_only() {
        assert!(parse_date("2025-05-17").is_ok());
        for bad in ["17-05-2025", "2025/05/17", "2025-13-01", "yesterday", ""] {
            assert!(parse_date(bad).is_err(), "`{bad}` must be rejected");
        }
    }
}

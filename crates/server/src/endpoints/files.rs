//! # 一時ファイル配信・ダウンロード
//!
//! - `GET /api/temp/{filename}` — アップロード済みファイルをそのまま返す
//! - `GET /api/download?file=` — 署名済みファイルを添付ファイルとして返す
//!
//! いずれもファイルIDの検証をファイルシステムへのアクセスより先に行う。

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::config::AppState;
use crate::error::ApiError;
use crate::mime::FALLBACK_CONTENT_TYPE;
use crate::storage::FileIdentifier;

use super::parse_file_id;

/// 一時ファイル配信のキャッシュ指定
const TEMP_CACHE_CONTROL: &str = "public, max-age=300";

/// GET /api/download のクエリ
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// ファイルID
    pub file: Option<String>,
}

fn content_type(state: &AppState, id: &FileIdentifier) -> String {
    state
        .mime
        .mime_for_identifier(id)
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string()
}

/// GET /api/temp/{filename} — 一時ファイル配信。
pub async fn handle_temp_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_file_id(Some(&filename))?;
    let bytes = state.storage.load(&id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type(&state, &id)),
            (header::CACHE_CONTROL, TEMP_CACHE_CONTROL.to_string()),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/download?file= — 署名済みファイルのダウンロード。
pub async fn handle_download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let id = parse_file_id(query.file.as_deref())?;
    let bytes = state.storage.load(&id).await?;

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let disposition = format!(
        "attachment; filename=\"c2pa_signed_{millis}.{}\"",
        id.extension()
    );

    tracing::info!(file_id = %id, size = bytes.len(), "ダウンロード");

    Ok((
        [
            (header::CONTENT_TYPE, content_type(&state, &id)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

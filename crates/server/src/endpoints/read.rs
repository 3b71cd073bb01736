//! # POST /api/c2pa/read
//!
//! アップロード済み画像のC2PAマニフェストストアを読み取る。
//!
//! ライブラリの読み取りエラーは失敗レスポンスにせず、
//! `hasC2pa: false` と `readError` で返す。

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use c2pa_web_types::{FileIdRequest, ReadResponse};

use crate::config::AppState;
use crate::error::ApiError;

use super::{json_body, load_asset, parse_file_id, run_engine};

/// POST /api/c2pa/read — C2PAマニフェスト読み取り。
pub async fn handle_read(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FileIdRequest>, JsonRejection>,
) -> Result<Json<ReadResponse>, ApiError> {
    let request = json_body(body)?;
    let file_id = parse_file_id(request.file_id.as_deref())?;
    let asset = load_asset(&state, file_id).await?;

    let file_id = asset.id.clone();
    let result = run_engine(&state, move |engine| engine.read(&asset.bytes, &asset.mime_type)).await?;

    let response = match result {
        Ok(Some(manifest)) => ReadResponse {
            success: true,
            has_c2pa: true,
            manifest: Some(manifest),
            read_error: None,
        },
        Ok(None) => ReadResponse {
            success: true,
            has_c2pa: false,
            manifest: None,
            read_error: None,
        },
        Err(e) => {
            tracing::warn!(file_id = %file_id, error = %e, "C2PAデータを読み取れませんでした");
            ReadResponse {
                success: true,
                has_c2pa: false,
                manifest: None,
                read_error: Some(e.to_string()),
            }
        }
    };
    Ok(Json(response))
}

//! # POST /api/c2pa/verify
//!
//! アップロード済み画像のC2PA署名を検証する。
//!
//! 検証結果はライブラリが算出した検証状態から導出する。
//! ライブラリの読み取りエラーは「C2PAデータなし」として扱い、エラー内容を `errors` に追加する。

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use c2pa_web_core::normalize_verification;
use c2pa_web_types::{FileIdRequest, VerifyResponse};

use crate::config::AppState;
use crate::error::ApiError;

use super::{json_body, load_asset, parse_file_id, run_engine};

/// POST /api/c2pa/verify — C2PA検証。
pub async fn handle_verify(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FileIdRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let request = json_body(body)?;
    let file_id = parse_file_id(request.file_id.as_deref())?;
    let asset = load_asset(&state, file_id).await?;

    let file_id = asset.id.clone();
    let report = run_engine(&state, move |engine| engine.verify(&asset.bytes, &asset.mime_type)).await?;

    let response = match report {
        Ok(report) => {
            let has_c2pa = report.is_some();
            let result = normalize_verification(report.as_ref());
            tracing::info!(file_id = %file_id, has_c2pa, status = ?result.status, "検証しました");
            VerifyResponse::from_result(has_c2pa, result)
        }
        Err(e) => {
            tracing::warn!(file_id = %file_id, error = %e, "C2PAデータを読み取れませんでした");
            let mut result = normalize_verification(None);
            result.errors.push(e.to_string());
            VerifyResponse::from_result(false, result)
        }
    };
    Ok(Json(response))
}

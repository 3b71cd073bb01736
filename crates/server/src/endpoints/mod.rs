//! # APIエンドポイント
//!
//! - `POST /api/c2pa/upload` — 画像アップロード
//! - `POST /api/c2pa/read` — C2PAマニフェスト読み取り
//! - `POST /api/c2pa/sign` — マニフェスト付与・署名
//! - `POST /api/c2pa/verify` — C2PA検証
//! - `GET /api/temp/{filename}` — 一時ファイル配信
//! - `GET /api/download?file=` — 署名済みファイルのダウンロード

pub mod files;
pub mod read;
pub mod sign;
pub mod upload;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use files::{handle_download, handle_temp_file};
pub use read::handle_read;
pub use sign::handle_sign;
pub use upload::handle_upload;
pub use verify::handle_verify;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use c2pa_web_core::{CoreError, ProvenanceEngine};

use crate::config::AppState;
use crate::error::ApiError;
use crate::storage::FileIdentifier;

/// 保存済みのアセット
pub(crate) struct StoredAsset {
    pub id: FileIdentifier,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// JSONボディの抽出結果を `ApiError` に揃える。
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(ApiError::from)
}

/// ファイルIDを検証する。未指定・形式不正はいずれも `InvalidInput`。
pub(crate) fn parse_file_id(raw: Option<&str>) -> Result<FileIdentifier, ApiError> {
    match raw {
        Some(raw) if !raw.is_empty() => FileIdentifier::parse(raw),
        _ => Err(ApiError::InvalidInput("ファイルIDが指定されていません".to_string())),
    }
}

/// ファイルを読み込み、C2PA処理に対応した形式か確認する。
///
/// 順序: 存在確認（404） → 形式確認（400）
pub(crate) async fn load_asset(
    state: &AppState,
    id: FileIdentifier,
) -> Result<StoredAsset, ApiError> {
    let bytes = state.storage.load(&id).await?;
    let mime_type = state
        .mime
        .mime_for_identifier(&id)
        .ok_or_else(|| {
            ApiError::InvalidInput(format!("サポートされていないファイル形式です: .{}", id.extension()))
        })?
        .to_string();
    Ok(StoredAsset {
        id,
        bytes,
        mime_type,
    })
}

/// 同期的なC2PA処理をブロッキングスレッドで実行する。
pub(crate) async fn run_engine<T, F>(state: &AppState, f: F) -> Result<Result<T, CoreError>, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn ProvenanceEngine) -> Result<T, CoreError> + Send + 'static,
{
    let engine: Arc<dyn ProvenanceEngine> = Arc::clone(&state.engine);
    tokio::task::spawn_blocking(move || f(engine.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("C2PA処理タスクの実行に失敗: {e}")))
}

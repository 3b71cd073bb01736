//! # POST /api/c2pa/sign
//!
//! アップロード済み画像にマニフェストを付与して署名し、署名済み画像を保存する。
//!
//! 検証順序: ファイルID → manifestData → 署名者 → 存在確認 → 形式確認。
//! 署名者の指定が不完全な場合はライブラリを呼び出す前に拒否する。

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use c2pa_web_core::SignerConfig;
use c2pa_web_types::{SignRequest, SignResponse};

use crate::config::AppState;
use crate::error::ApiError;
use crate::storage::FileIdentifier;

use super::{json_body, load_asset, parse_file_id, run_engine};

/// 署名済みファイルの識別子の接頭辞
const SIGNED_PREFIX: &str = "signed_";

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// リクエストから署名者を決定する。
///
/// `useLocalSigner: true` の場合は証明書と秘密鍵の両方が必須。
/// それ以外は組み込みテスト署名者を使う。
fn signer_from_request(
    use_local_signer: Option<bool>,
    certificate: Option<String>,
    private_key: Option<String>,
) -> Result<SignerConfig, ApiError> {
    if use_local_signer != Some(true) {
        if certificate.is_some() || private_key.is_some() {
            tracing::warn!("useLocalSignerが指定されていないため、証明書と秘密鍵は使用しません");
        }
        return Ok(SignerConfig::TestSigner);
    }

    match (non_blank(certificate), non_blank(private_key)) {
        (Some(certificate_pem), Some(private_key_pem)) => Ok(SignerConfig::LocalSigner {
            certificate_pem,
            private_key_pem,
        }),
        _ => Err(ApiError::InvalidInput(
            "ローカル署名には証明書と秘密鍵の両方が必要です".to_string(),
        )),
    }
}

/// POST /api/c2pa/sign — マニフェスト付与・署名。
pub async fn handle_sign(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SignRequest>, JsonRejection>,
) -> Result<Json<SignResponse>, ApiError> {
    let request = json_body(body)?;
    let file_id = parse_file_id(request.file_id.as_deref())?;
    let manifest = request
        .manifest_data
        .ok_or_else(|| ApiError::InvalidInput("マニフェストデータが指定されていません".to_string()))?;
    let signer = signer_from_request(
        request.use_local_signer,
        request.certificate,
        request.private_key,
    )?;
    let asset = load_asset(&state, file_id).await?;

    let signed_id = FileIdentifier::generate(SIGNED_PREFIX, asset.id.extension())?;
    let source_id = asset.id.clone();
    let local = matches!(signer, SignerConfig::LocalSigner { .. });

    let signed = run_engine(&state, move |engine| {
        engine.sign(&asset.bytes, &asset.mime_type, &manifest, &signer)
    })
    .await??;

    state.storage.save(&signed_id, &signed).await?;

    tracing::info!(
        source_file_id = %source_id,
        file_id = %signed_id,
        local_signer = local,
        "署名済みファイルを保存しました"
    );

    Ok(Json(SignResponse {
        success: true,
        download_url: format!("{}/api/download?file={}", state.public_base_url, signed_id),
        file_id: signed_id.to_string(),
    }))
}

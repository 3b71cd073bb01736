//! # POST /api/c2pa/upload
//!
//! multipartの `file` フィールドで画像を受け取り、一時ストレージに保存する。
//!
//! 検証順序: ファイルの有無 → サイズ → MIMEタイプ。
//! いずれかの検証に失敗した場合、ファイルは書き込まれない。

use std::path::Path;
use std::sync::Arc;

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::Json;
use c2pa_web_types::UploadResponse;

use crate::config::AppState;
use crate::error::ApiError;
use crate::mime::MimeRegistry;
use crate::storage::{sanitize_filename, FileIdentifier};

/// multipartのファイルフィールド名
const FILE_FIELD: &str = "file";

fn multipart_err(e: MultipartError) -> ApiError {
    ApiError::InvalidInput(format!("multipartデータの読み込みに失敗しました: {}", e.body_text()))
}

/// 受信したファイルフィールド
struct ReceivedFile {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// `file` フィールドを探し、サイズ上限を確認しながら読み込む。
async fn receive_file(
    multipart: &mut Multipart,
    max_size: u64,
) -> Result<Option<ReceivedFile>, ApiError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_err)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_err)? {
            if (bytes.len() + chunk.len()) as u64 > max_size {
                return Err(ApiError::InvalidInput(format!(
                    "ファイルサイズが大きすぎます。最大{}MBまでのファイルを選択してください。",
                    max_size / (1024 * 1024)
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(Some(ReceivedFile {
            file_name,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

/// 保存時の拡張子を決める。
///
/// 無害化したファイル名の拡張子が対応表にあればそれを使い、
/// なければMIMEタイプの正規の拡張子を使う。
fn stored_extension(registry: &MimeRegistry, sanitized_name: &str, mime_type: &str) -> Option<String> {
    Path::new(sanitized_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| registry.mime_for_extension(ext).is_some())
        .map(str::to_ascii_lowercase)
        .or_else(|| registry.extension_for_mime(mime_type).map(str::to_string))
}

/// POST /api/c2pa/upload — 画像アップロード。
pub async fn handle_upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        ApiError::InvalidInput(format!("multipart/form-dataで送信してください: {}", e.body_text()))
    })?;

    let file = receive_file(&mut multipart, state.max_upload_size)
        .await?
        .ok_or_else(|| ApiError::InvalidInput("ファイルが選択されていません".to_string()))?;

    if !state.mime.is_supported_mime(&file.content_type) {
        return Err(ApiError::InvalidInput(format!(
            "サポートされていないファイル形式です。対応形式: {}",
            state.mime.supported_mime_types().join(", ")
        )));
    }

    let file_name = sanitize_filename(&file.file_name);
    let extension = stored_extension(&state.mime, &file_name, &file.content_type)
        .ok_or_else(|| ApiError::Internal("保存用の拡張子を決定できません".to_string()))?;
    let file_id = FileIdentifier::generate("", &extension)?;

    state.storage.save(&file_id, &file.bytes).await?;

    tracing::info!(
        file_id = %file_id,
        file_type = %file.content_type,
        file_size = file.bytes.len(),
        "ファイルをアップロードしました"
    );

    Ok(Json(UploadResponse {
        success: true,
        url: format!("{}/api/temp/{}", state.public_base_url, file_id),
        file_id: file_id.to_string(),
        file_name,
        file_type: file.content_type,
        file_size: file.bytes.len() as u64,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::test_helpers::*;

    fn jpeg_part(bytes: Vec<u8>, name: &str, mime: &str) -> reqwest::multipart::Form {
        reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(bytes)
                .file_name(name.to_string())
                .mime_str(mime)
                .unwrap(),
        )
    }

    #[test]
    fn test_stored_extension() {
        let registry = MimeRegistry::default();
        assert_eq!(stored_extension(&registry, "photo.JPEG", "image/jpeg").as_deref(), Some("jpeg"));
        assert_eq!(stored_extension(&registry, "photo", "image/png").as_deref(), Some("png"));
        assert_eq!(stored_extension(&registry, "photo.exe", "image/webp").as_deref(), Some("webp"));
        assert_eq!(stored_extension(&registry, "photo.exe", "text/plain"), None);
    }

    #[tokio::test]
    async fn test_upload_then_serve_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_app(test_state(dir.path())).await;
        let image = test_jpeg();

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{base}/api/c2pa/upload"))
            .multipart(jpeg_part(image.clone(), "my photo.jpg", "image/jpeg"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: UploadResponse = response.json().await.unwrap();
        assert!(body.success);
        assert_eq!(body.file_name, "my_photo.jpg");
        assert_eq!(body.file_type, "image/jpeg");
        assert_eq!(body.file_size, image.len() as u64);
        assert!(body.file_id.ends_with(".jpg"));
        assert_eq!(body.url, format!("{TEST_BASE_URL}/api/temp/{}", body.file_id));

        let served = client
            .get(format!("{base}/api/temp/{}", body.file_id))
            .send()
            .await
            .unwrap();
        assert_eq!(served.status(), 200);
        assert_eq!(served.headers()["content-type"], "image/jpeg");
        assert_eq!(served.headers()["cache-control"], "public, max-age=300");
        assert_eq!(served.bytes().await.unwrap().to_vec(), image);
    }

    #[tokio::test]
    async fn test_upload_uses_canonical_extension_for_unknown_name() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_app(test_state(dir.path())).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/api/c2pa/upload"))
            .multipart(jpeg_part(test_jpeg(), "capture", "image/jpeg"))
            .send()
            .await
            .unwrap();
        let body: UploadResponse = response.json().await.unwrap();
        assert!(body.file_id.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_upload_too_large_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage_dir = dir.path().join("uploads");
        let mut state = test_state_owned(&storage_dir);
        state.max_upload_size = 1024;
        let base = spawn_app(Arc::new(state)).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/api/c2pa/upload"))
            .multipart(jpeg_part(vec![0u8; 4096], "big.jpg", "image/jpeg"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("大きすぎます"));
        assert_eq!(count_files(&storage_dir), 0);
    }

    #[tokio::test]
    async fn test_upload_size_checked_before_type() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state_owned(dir.path());
        state.max_upload_size = 16;
        let base = spawn_app(Arc::new(state)).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/api/c2pa/upload"))
            .multipart(jpeg_part(vec![0u8; 64], "notes.txt", "text/plain"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("大きすぎます"));
    }

    #[tokio::test]
    async fn test_upload_unsupported_type_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage_dir = dir.path().join("uploads");
        let base = spawn_app(test_state(&storage_dir)).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/api/c2pa/upload"))
            .multipart(jpeg_part(b"%PDF-1.4".to_vec(), "doc.pdf", "application/pdf"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("image/jpeg"));
        assert_eq!(count_files(&storage_dir), 0);
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_app(test_state(dir.path())).await;

        let form = reqwest::multipart::Form::new().text("note", "no file here");
        let response = reqwest::Client::new()
            .post(format!("{base}/api/c2pa/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "ファイルが選択されていません");
    }

    #[tokio::test]
    async fn test_upload_requires_multipart() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_app(test_state(dir.path())).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/api/c2pa/upload"))
            .json(&serde_json::json!({"file": "abc"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }
}

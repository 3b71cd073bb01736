//! # APIエラー型
//!
//! 全エンドポイント共通のエラー。レスポンスは `{success:false, error, hint?}` のJSON。

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use c2pa_web_core::CoreError;
use c2pa_web_types::ErrorResponse;

/// APIエラー型。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 不正なリクエスト（識別子、ファイル、JSONボディ等）
    #[error("{0}")]
    InvalidInput(String),
    /// ファイルが存在しない
    #[error("{0}")]
    NotFound(String),
    /// C2PAライブラリ処理の失敗
    #[error("{message}")]
    ExternalService {
        /// エラーメッセージ
        message: String,
        /// 診断ヒント
        hint: Option<String>,
    },
    /// 内部エラー（I/O、タスク結合等）
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ExternalService { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "リクエスト処理に失敗しました");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "リクエストを拒否しました");
        }

        let hint = match &self {
            ApiError::ExternalService { hint, .. } => hint.clone(),
            _ => None,
        };
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            hint,
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(format!("リクエストボディが不正です: {}", rejection.body_text()))
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Signing { message, hint } => ApiError::ExternalService {
                message: format!("署名処理に失敗しました: {message}"),
                hint,
            },
            other => ApiError::ExternalService {
                message: other.to_string(),
                hint: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_input_response() {
        let response = ApiError::InvalidInput("無効なファイルIDです".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "無効なファイルIDです");
        assert!(body.get("hint").is_none());
    }

    #[tokio::test]
    async fn test_signing_error_carries_hint() {
        let err = ApiError::from(CoreError::Signing {
            message: "bad PEM".to_string(),
            hint: Some("PEMを確認してください".to_string()),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("bad PEM"));
        assert_eq!(body["hint"], "PEMを確認してください");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

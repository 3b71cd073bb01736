//! # C2PA Web App Server
//!
//! 画像へのC2PAマニフェストの付与・読み取り・検証を行うWeb UI向けAPIサーバー。
//!
//! ## 役割
//! - 画像アップロードと一時ファイル配信
//! - C2PAマニフェストの読み取り
//! - マニフェスト付与・署名（組み込みテスト署名者、または利用者提供の証明書）
//! - C2PA署名の検証
//!
//! ## API エンドポイント
//! - `POST /api/c2pa/upload` — 画像アップロード（multipart）
//! - `POST /api/c2pa/read` — マニフェスト読み取り
//! - `POST /api/c2pa/sign` — マニフェスト付与・署名
//! - `POST /api/c2pa/verify` — 検証
//! - `GET /api/temp/{filename}` — 一時ファイル配信
//! - `GET /api/download?file=` — 署名済みファイルのダウンロード

mod config;
mod endpoints;
mod error;
mod mime;
mod storage;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use c2pa_web_core::C2paEngine;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::{AppState, ServerConfig};
use endpoints::*;
use mime::MimeRegistry;
use storage::LocalTempStorage;

/// ルーターを構築する。
pub(crate) fn app(state: Arc<AppState>, max_body_size: usize) -> axum::Router {
    axum::Router::new()
        .route("/api/c2pa/upload", post(handle_upload))
        .route("/api/c2pa/read", post(handle_read))
        .route("/api/c2pa/sign", post(handle_sign))
        .route("/api/c2pa/verify", post(handle_verify))
        .route("/api/temp/{filename}", get(handle_temp_file))
        .route("/api/download", get(handle_download))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 期限切れの一時ファイルを定期的に削除するタスクを起動する。
fn spawn_retention_sweeper(state: Arc<AppState>, ttl: Duration, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match state.storage.sweep_expired(ttl).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "期限切れの一時ファイルを削除しました"),
                Err(e) => tracing::warn!(error = %e, "一時ファイルの削除に失敗しました"),
            }
        }
    });
}

// ---------------------------------------------------------------------------
// エントリポイント
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env()?;

    let engine = C2paEngine::new(config.engine.clone())?;
    let storage = LocalTempStorage::new(&config.temp_dir);
    tracing::info!(
        temp_dir = %storage.base_dir().display(),
        max_upload_size = config.max_upload_size,
        public_base_url = %config.public_base_url,
        "一時ファイルの保存先"
    );

    let state = Arc::new(AppState {
        storage: Box::new(storage),
        engine: Arc::new(engine),
        mime: MimeRegistry::default(),
        public_base_url: config.public_base_url.clone(),
        max_upload_size: config.max_upload_size,
    });

    if let Some(ttl) = config.temp_file_ttl {
        tracing::info!(
            ttl_secs = ttl.as_secs(),
            interval_secs = config.sweep_interval.as_secs(),
            "一時ファイルの定期削除を有効にします"
        );
        spawn_retention_sweeper(Arc::clone(&state), ttl, config.sweep_interval);
    }

    let app = app(state, config.max_body_size);

    let addr = config.bind_addr();
    tracing::info!("C2PA Web App Server を {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------

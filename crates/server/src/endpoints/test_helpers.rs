//! テスト共通ヘルパー。

use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use c2pa_web_core::{
    C2paEngine, CoreError, EngineConfig, ProvenanceEngine, ProvenanceReport, SignerConfig,
};
use c2pa_web_types::ManifestData;

use crate::config::AppState;
use crate::error::ApiError;
use crate::mime::MimeRegistry;
use crate::storage::{FileIdentifier, LocalTempStorage, TempStorage};

/// テスト用の公開ベースURL
pub const TEST_BASE_URL: &str = "http://localhost:3001";

/// テスト用のリクエストボディ上限
const TEST_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

fn encode(format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_fn(16, 16, |x, y| {
        image::Rgb([(x * 16) as u8, (y * 16) as u8, 96])
    });
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

/// C2PAデータを含まない小さなJPEG画像
pub fn test_jpeg() -> Vec<u8> {
    encode(image::ImageFormat::Jpeg)
}

/// C2PAデータを含まない小さなPNG画像
pub fn test_png() -> Vec<u8> {
    encode(image::ImageFormat::Png)
}

/// タイムスタンプ局を使わない実エンジン
pub fn test_engine() -> Arc<dyn ProvenanceEngine> {
    Arc::new(
        C2paEngine::new(EngineConfig {
            tsa_url: None,
            ..Default::default()
        })
        .unwrap(),
    )
}

/// 指定ディレクトリをストレージとするAppState
pub fn test_state_owned(dir: &Path) -> AppState {
    AppState {
        storage: Box::new(LocalTempStorage::new(dir)),
        engine: test_engine(),
        mime: MimeRegistry::default(),
        public_base_url: TEST_BASE_URL.to_string(),
        max_upload_size: 1024 * 1024,
    }
}

pub fn test_state(dir: &Path) -> Arc<AppState> {
    Arc::new(test_state_owned(dir))
}

pub fn test_state_with_engine(dir: &Path, engine: Arc<dyn ProvenanceEngine>) -> Arc<AppState> {
    Arc::new(AppState {
        engine,
        ..test_state_owned(dir)
    })
}

/// ファイルを指定IDで保存し、IDを返す
pub async fn store_file(state: &AppState, id: &str, bytes: &[u8]) -> String {
    let id = FileIdentifier::parse(id).unwrap();
    state.storage.save(&id, bytes).await.unwrap();
    id.to_string()
}

/// ディレクトリ内のファイル数（ディレクトリがなければ0）
pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// ルーターを127.0.0.1の空きポートで起動し、ベースURLを返す
pub async fn spawn_app(state: Arc<AppState>) -> String {
    let app = crate::app(state, TEST_MAX_BODY_SIZE);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{port}")
}

/// 呼び出されるとパニックするエンジン。検証がライブラリ呼び出しより先に行われることの確認用。
pub struct UnreachableEngine;

impl ProvenanceEngine for UnreachableEngine {
    fn read(&self, _: &[u8], _: &str) -> Result<Option<serde_json::Value>, CoreError> {
        panic!("C2PAエンジンが呼び出されました (read)")
    }

    fn sign(
        &self,
        _: &[u8],
        _: &str,
        _: &ManifestData,
        _: &SignerConfig,
    ) -> Result<Vec<u8>, CoreError> {
        panic!("C2PAエンジンが呼び出されました (sign)")
    }

    fn verify(&self, _: &[u8], _: &str) -> Result<Option<ProvenanceReport>, CoreError> {
        panic!("C2PAエンジンが呼び出されました (verify)")
    }
}

/// 呼び出しを記録するモックストレージ。常に空として振る舞う。
pub struct RecordingStorage {
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl TempStorage for RecordingStorage {
    async fn save(&self, id: &FileIdentifier, _bytes: &[u8]) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(format!("save {id}"));
        Ok(())
    }

    async fn load(&self, id: &FileIdentifier) -> Result<Vec<u8>, ApiError> {
        self.calls.lock().unwrap().push(format!("load {id}"));
        Err(ApiError::NotFound("ファイルが見つかりません".to_string()))
    }

    async fn sweep_expired(&self, _ttl: Duration) -> Result<usize, ApiError> {
        Ok(0)
    }
}

/// `RecordingStorage` を使うAppStateと、その呼び出し記録
pub fn recording_state(dir: &Path) -> (Arc<AppState>, Arc<Mutex<Vec<String>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let state = Arc::new(AppState {
        storage: Box::new(RecordingStorage {
            calls: Arc::clone(&calls),
        }),
        engine: Arc::new(UnreachableEngine),
        ..test_state_owned(dir)
    });
    (state, calls)
}

//! ローカルディレクトリによる一時ファイルストレージ実装。

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::ApiError;

use super::{FileIdentifier, TempStorage};

/// 設定されたディレクトリ直下にファイルを保存するストレージ。
pub struct LocalTempStorage {
    base_dir: PathBuf,
}

impl LocalTempStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 識別子に対応するファイルパス
    pub fn resolve_path(&self, id: &FileIdentifier) -> PathBuf {
        self.base_dir.join(id.as_str())
    }
}

fn io_err(context: &str, e: std::io::Error) -> ApiError {
    ApiError::Internal(format!("{context}: {e}"))
}

#[async_trait::async_trait]
impl TempStorage for LocalTempStorage {
    async fn save(&self, id: &FileIdentifier, bytes: &[u8]) -> Result<(), ApiError> {
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| io_err("保存先ディレクトリの作成に失敗", e))?;
        tokio::fs::write(self.resolve_path(id), bytes)
            .await
            .map_err(|e| io_err("ファイルの書き込みに失敗", e))?;
        tracing::debug!(file_id = %id, size = bytes.len(), "ファイルを保存しました");
        Ok(())
    }

    async fn load(&self, id: &FileIdentifier) -> Result<Vec<u8>, ApiError> {
        match tokio::fs::read(self.resolve_path(id)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ApiError::NotFound("ファイルが見つかりません".to_string()))
            }
            Err(e) => Err(io_err("ファイルの読み込みに失敗", e)),
        }
    }

    async fn sweep_expired(&self, ttl: Duration) -> Result<usize, ApiError> {
        let mut entries = match tokio::fs::read_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(io_err("保存先ディレクトリの読み込みに失敗", e)),
        };

        let now = SystemTime::now();
        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_err("保存先ディレクトリの読み込みに失敗", e))?
        {
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let expired = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age >= ttl);
            if !expired {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(path = %entry.path().display(), error = %e, "期限切れファイルの削除に失敗"),
            }
        }
        Ok(removed)
    }
}

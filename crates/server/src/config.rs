//! # サーバー設定・共有状態
//!
//! 環境変数からの設定読み込みとサーバーの共有状態の定義。
//! 設定は起動時に一度だけ読み込み、`AppState` として各ハンドラに渡す。

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use c2pa::SigningAlg;
use c2pa_web_core::{EngineConfig, ProvenanceEngine, DEFAULT_CLAIM_GENERATOR};

use crate::mime::MimeRegistry;
use crate::storage::TempStorage;

/// アップロード最大サイズの既定値（10MB）
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// multipartのヘッダ等に許容するボディサイズの余裕
const BODY_SIZE_MARGIN: u64 = 1024 * 1024;

const DEFAULT_TSA_URL: &str = "http://timestamp.digicert.com";

/// 環境変数から読み込むサーバー設定。
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 待ち受けホスト
    pub host: String,
    /// 待ち受けポート
    pub port: u16,
    /// レスポンスのURLに使う公開ベースURL
    pub public_base_url: String,
    /// 一時ファイルの保存先
    pub temp_dir: PathBuf,
    /// アップロード最大サイズ（バイト）
    pub max_upload_size: u64,
    /// リクエストボディ最大サイズ（バイト）
    pub max_body_size: usize,
    /// C2PAエンジン設定
    pub engine: EngineConfig,
    /// 一時ファイルの保持期間（`None` の場合は削除しない）
    pub temp_file_ttl: Option<Duration>,
    /// 期限切れファイルの削除間隔
    pub sweep_interval: Duration,
}

/// 環境変数を読み込む。未設定または空文字列の場合は `None`。
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// 環境変数を型変換して読み込む。未設定の場合は既定値。
fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key}の値が不正です ({raw}): {e}")),
        None => Ok(default),
    }
}

impl ServerConfig {
    /// 環境変数から設定を読み込む。
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env_opt("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = env_parse("PORT", 3001)?;
        let public_base_url = env_opt("PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{port}"));
        let temp_dir = env_opt("TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("c2pa-web"));

        let max_upload_size: u64 = env_parse("MAX_UPLOAD_SIZE", DEFAULT_MAX_UPLOAD_SIZE)?;
        let max_body_size: u64 =
            env_parse("MAX_BODY_SIZE", max_upload_size.saturating_add(BODY_SIZE_MARGIN))?;
        let max_body_size = usize::try_from(max_body_size)
            .context("MAX_BODY_SIZEがこのプラットフォームで扱える範囲を超えています")?;

        let local_signing_alg: SigningAlg = env_parse("C2PA_SIGNING_ALG", SigningAlg::Es256)?;
        // 明示的に空文字列が設定された場合はタイムスタンプを付与しない
        let tsa_url = match std::env::var("C2PA_TSA_URL") {
            Ok(url) if url.trim().is_empty() => None,
            Ok(url) => Some(url.trim().to_string()),
            Err(_) => Some(DEFAULT_TSA_URL.to_string()),
        };
        let trust_anchors_pem = match env_opt("C2PA_TRUST_ANCHORS") {
            Some(path) => Some(
                std::fs::read_to_string(&path)
                    .with_context(|| format!("信頼アンカーの読み込みに失敗: {path}"))?,
            ),
            None => None,
        };
        let claim_generator = env_opt("C2PA_CLAIM_GENERATOR")
            .unwrap_or_else(|| DEFAULT_CLAIM_GENERATOR.to_string());

        let ttl_secs: u64 = env_parse("TEMP_FILE_TTL_SECS", 0)?;
        let sweep_secs: u64 = env_parse("TEMP_SWEEP_INTERVAL_SECS", 300)?;
        if ttl_secs > 0 && sweep_secs == 0 {
            anyhow::bail!("TEMP_SWEEP_INTERVAL_SECSは1以上である必要があります");
        }

        Ok(Self {
            host,
            port,
            public_base_url,
            temp_dir,
            max_upload_size,
            max_body_size,
            engine: EngineConfig {
                local_signing_alg,
                tsa_url,
                trust_anchors_pem,
                claim_generator,
            },
            temp_file_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            sweep_interval: Duration::from_secs(sweep_secs),
        })
    }

    /// 待ち受けアドレス（`host:port`）
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// サーバーの共有状態。
pub struct AppState {
    /// 一時ファイルストレージ
    pub storage: Box<dyn TempStorage>,
    /// C2PA処理エンジン
    pub engine: Arc<dyn ProvenanceEngine>,
    /// 拡張子とMIMEタイプの対応表
    pub mime: MimeRegistry,
    /// レスポンスのURLに使う公開ベースURL（末尾スラッシュなし）
    pub public_base_url: String,
    /// アップロード最大サイズ（バイト）
    pub max_upload_size: u64,
}

//! # 一時ファイルストレージ
//!
//! アップロード画像と署名済み画像を保持するストレージの抽象インターフェース。
//! ローカルディレクトリ実装は `local` サブモジュールを参照。
//!
//! ファイルは `{識別子}.{拡張子}` のフラットな名前で保存される。
//! 識別子の検証はパス導出より必ず先に行う（`FileIdentifier` の生成時に検証済み）。

pub mod local;

pub use local::LocalTempStorage;

use std::fmt;
use std::time::Duration;

use crate::error::ApiError;

/// ファイル名として安全でない文字
const UNSAFE_FILENAME_CHARS: &[char] = &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// 検証済みのファイル識別子。
///
/// `^[A-Za-z0-9_.-]+\.[A-Za-z0-9]+$` に一致する文字列のみ保持する。
/// パス区切り文字を含まないため、ストレージディレクトリの外を指すことはない。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentifier(String);

impl FileIdentifier {
    /// 文字列を検証して識別子に変換する。
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        if is_valid_identifier(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ApiError::InvalidInput("無効なファイルIDです".to_string()))
        }
    }

    /// ランダムな識別子を生成する（`{prefix}{hex}.{extension}`）。
    pub fn generate(prefix: &str, extension: &str) -> Result<Self, ApiError> {
        Self::parse(&format!("{prefix}{}.{extension}", generate_identifier()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 最後のドット以降の拡張子
    pub fn extension(&self) -> &str {
        self.0.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default()
    }
}

impl fmt::Display for FileIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ファイル識別子の形式検証。
pub fn is_valid_identifier(id: &str) -> bool {
    let Some((stem, ext)) = id.rsplit_once('.') else {
        return false;
    };
    !stem.is_empty()
        && !ext.is_empty()
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

/// 16バイトの乱数を小文字16進数（32文字）で返す。
pub fn generate_identifier() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// 利用者が指定したファイル名を無害化する。
///
/// 安全でない文字と空白の連続を `_` に、ドットの連続を1つのドットに置き換える。
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;

        let c = if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c };
        if c == '.' && out.ends_with('.') {
            continue;
        }
        out.push(c);
    }
    out.trim().to_string()
}

/// 一時ファイルストレージの抽象インターフェース。
///
/// ローカルディレクトリ以外のバックエンドもこのトレイトで差し替えられる。
#[async_trait::async_trait]
pub trait TempStorage: Send + Sync {
    /// ファイルを保存する。保存先が存在しない場合は作成する。
    async fn save(&self, id: &FileIdentifier, bytes: &[u8]) -> Result<(), ApiError>;

    /// ファイルを読み込む。存在しない場合は `ApiError::NotFound`。
    async fn load(&self, id: &FileIdentifier) -> Result<Vec<u8>, ApiError>;

    /// 最終更新から `ttl` 以上経過したファイルを削除し、削除件数を返す。
    async fn sweep_expired(&self, ttl: Duration) -> Result<usize, ApiError>;
}

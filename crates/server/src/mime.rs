//! # MIMEタイプレジストリ
//!
//! 拡張子とMIMEタイプの対応表。アップロード検証、配信時のContent-Type、
//! C2PA処理前の形式判定に使う。

use crate::storage::FileIdentifier;

/// 配信時のフォールバックContent-Type
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// 既定の対応表。同じMIMEタイプの拡張子は先頭のものを正規の拡張子とする。
const DEFAULT_ENTRIES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("avif", "image/avif"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
];

/// 拡張子 → MIMEタイプの対応表。
#[derive(Debug, Clone)]
pub struct MimeRegistry {
    entries: Vec<(String, String)>,
}

impl Default for MimeRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRIES.iter().copied())
    }
}

impl MimeRegistry {
    /// `(拡張子, MIMEタイプ)` の組から構築する。拡張子は小文字で保持する。
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(ext, mime)| (ext.to_ascii_lowercase(), mime.to_string()))
                .collect(),
        }
    }

    /// 拡張子からMIMEタイプを引く。大文字小文字を区別せず、先頭のドットは無視する。
    pub fn mime_for_extension(&self, ext: &str) -> Option<&str> {
        let ext = ext.strip_prefix('.').unwrap_or(ext).to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, mime)| mime.as_str())
    }

    pub fn mime_for_identifier(&self, id: &FileIdentifier) -> Option<&str> {
        self.mime_for_extension(id.extension())
    }

    pub fn is_supported_mime(&self, mime: &str) -> bool {
        self.entries.iter().any(|(_, m)| m == mime)
    }

    /// MIMEタイプの正規の拡張子
    pub fn extension_for_mime(&self, mime: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, m)| m == mime)
            .map(|(ext, _)| ext.as_str())
    }

    /// 対応するMIMEタイプの一覧（重複なし、登録順）
    pub fn supported_mime_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for (_, mime) in &self.entries {
            if !types.contains(&mime.as_str()) {
                types.push(mime);
            }
        }
        types
    }
}

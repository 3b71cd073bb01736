//! # C2PA Web App Core
//!
//! C2PAライブラリ（`c2pa` クレート）への読み取り・署名・検証の境界。
//!
//! ## 処理フロー
//! 1. 読み取り: アセットからマニフェストストアを読み込み、JSONとして返す
//! 2. 署名: UIのマニフェスト記述からマニフェスト定義を組み立て、署名済みアセットを返す
//! 3. 検証: ライブラリが算出した検証状態・ステータスコードを取り出し、UI向けに整形する
//!
//! 暗号検証そのものは行わない。検証結果はすべてライブラリの出力から導出する。

mod credentials;
mod engine;
mod manifest;
mod report;

pub use credentials::BuiltinCredentials;
pub use engine::{C2paEngine, EngineConfig};
pub use manifest::{
    build_manifest_definition, signing_hint, DEFAULT_CLAIM_GENERATOR, DEFAULT_DIGITAL_SOURCE_TYPE,
};
pub use report::{
    normalize_verification, ProvenanceReport, SignatureState, SignatureSummary, StatusEntry,
    NO_C2PA_MESSAGE, SIGNING_CREDENTIAL_UNTRUSTED,
};

use c2pa_web_types::ManifestData;

/// Coreモジュールのエラー型
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// C2PAデータの読み取りに失敗
    #[error("C2PAデータの読み取りに失敗しました: {0}")]
    Read(String),
    /// 署名処理に失敗
    #[error("署名処理に失敗しました: {message}")]
    Signing {
        /// ライブラリのエラーメッセージ
        message: String,
        /// エラーメッセージから推定した診断ヒント
        hint: Option<String>,
    },
    /// 組み込みテスト署名者の証明書生成に失敗
    #[error("テスト署名用証明書の生成に失敗しました: {0}")]
    Credentials(String),
    /// C2PA設定の適用に失敗
    #[error("C2PA設定の適用に失敗しました: {0}")]
    Settings(String),
    /// マニフェスト定義の構築に失敗
    #[error("マニフェスト定義の構築に失敗しました: {0}")]
    ManifestDefinition(String),
}

/// 署名に使う資格情報。ハンドラ境界で一度だけ決定する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerConfig {
    /// 起動時に生成した組み込みテスト署名者
    TestSigner,
    /// 利用者が提供したPEM形式の証明書チェーンと秘密鍵
    LocalSigner {
        /// PEM形式の証明書チェーン（署名証明書が先頭）
        certificate_pem: String,
        /// PEM形式の秘密鍵
        private_key_pem: String,
    },
}

/// C2PA処理の抽象インターフェース。
///
/// 実装は同期的に動作する。非同期ハンドラからは `spawn_blocking` 経由で呼び出す。
/// テストではモック実装に差し替えられる。
pub trait ProvenanceEngine: Send + Sync {
    /// アセットのマニフェストストアを読み取る。
    ///
    /// C2PAデータが含まれない場合は `Ok(None)`。
    fn read(&self, bytes: &[u8], mime_type: &str)
        -> Result<Option<serde_json::Value>, CoreError>;

    /// マニフェストを付与して署名し、署名済みアセットのバイト列を返す。
    fn sign(
        &self,
        bytes: &[u8],
        mime_type: &str,
        manifest: &ManifestData,
        signer: &SignerConfig,
    ) -> Result<Vec<u8>, CoreError>;

    /// アセットを検証し、ライブラリが算出した検証情報を返す。
    ///
    /// C2PAデータが含まれない場合は `Ok(None)`。
    fn verify(&self, bytes: &[u8], mime_type: &str)
        -> Result<Option<ProvenanceReport>, CoreError>;
}

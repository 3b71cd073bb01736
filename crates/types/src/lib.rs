//! # C2PA Web App 共有型定義
//!
//! APIサーバーとC2PAコアで共有するリクエスト/レスポンスとデータ構造。
//!
//! ## エンコーディング規則
//! - ワイヤ上のJSONはcamelCase（フロントエンドとの互換性のため）
//! - アサーションデータ・マニフェストストアは任意のJSON値（`serde_json::Value`）

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// マニフェスト入力
// ---------------------------------------------------------------------------

/// マニフェスト内の1件のアサーション（ラベル付きの主張）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    /// アサーションラベル (例: "stds.schema-org.CreativeWork")
    pub label: String,
    /// アサーション本体。スキーマはC2PA仕様とライブラリ側が決める。
    pub data: serde_json::Value,
}

/// 署名時にUIから渡されるマニフェスト記述。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestData {
    /// アセットのタイトル
    #[serde(default)]
    pub title: String,
    /// 作成者
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// 著作権表示
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    /// 説明文
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// クレーム生成者 ("name/version" 形式)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_generator: Option<String>,
    /// 追加アサーション
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

// ---------------------------------------------------------------------------
// 検証結果
// ---------------------------------------------------------------------------

/// UI向けの検証ステータス。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// 署名が有効で、証明書が信頼リストで確認できた
    Valid,
    /// 署名が無効、またはC2PAデータが存在しない
    Invalid,
    /// 署名は構造的に有効だが警告がある（信頼リスト外の証明書など）
    Warning,
}

/// 署名証明書の信頼情報。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateTrustInfo {
    /// 信頼リストで確認できたか
    pub is_trusted: bool,
    /// 証明書の発行者
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// 証明書のコモンネーム
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    /// 署名時刻（TSAまたはクレーム記録値）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// 信頼できない場合の理由
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// ライブラリ出力をUI向けに整形した検証結果。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// 署名が有効か（`warning` を含む）
    pub is_valid: bool,
    /// 検証ステータス
    pub status: VerificationStatus,
    /// エラーメッセージ一覧
    pub errors: Vec<String>,
    /// 警告メッセージ一覧
    pub warnings: Vec<String>,
    /// 検証詳細（検証状態、Active Manifestのラベル、マニフェスト本体）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// 署名証明書の信頼情報
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateTrustInfo>,
}

// ---------------------------------------------------------------------------
// APIリクエスト/レスポンス
// ---------------------------------------------------------------------------

/// POST /api/c2pa/upload のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// 常にtrue
    pub success: bool,
    /// 保存されたファイルの識別子 (`{hex}.{ext}`)
    pub file_id: String,
    /// サニタイズ済みの元ファイル名
    pub file_name: String,
    /// 宣言されたMIMEタイプ
    pub file_type: String,
    /// バイト数
    pub file_size: u64,
    /// プレビュー用URL
    pub url: String,
}

/// fileIdのみを持つリクエスト（read / verify）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIdRequest {
    /// 対象ファイルの識別子
    #[serde(default)]
    pub file_id: Option<String>,
}

/// POST /api/c2pa/read のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResponse {
    /// 常にtrue
    pub success: bool,
    /// C2PAデータが読み取れたか
    pub has_c2pa: bool,
    /// マニフェストストア（ライブラリ出力そのまま）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<serde_json::Value>,
    /// ライブラリが読み取りに失敗した場合のエラー内容
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_error: Option<String>,
}

/// POST /api/c2pa/sign のリクエスト。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    /// 署名対象ファイルの識別子
    #[serde(default)]
    pub file_id: Option<String>,
    /// マニフェスト記述
    #[serde(default)]
    pub manifest_data: Option<ManifestData>,
    /// 利用者の証明書・秘密鍵で署名するか
    #[serde(default)]
    pub use_local_signer: Option<bool>,
    /// PEM形式の証明書チェーン
    #[serde(default)]
    pub certificate: Option<String>,
    /// PEM形式の秘密鍵
    #[serde(default)]
    pub private_key: Option<String>,
}

/// POST /api/c2pa/sign のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
    /// 常にtrue
    pub success: bool,
    /// 署名済みファイルの識別子 (`signed_{hex}.{ext}`)
    pub file_id: String,
    /// ダウンロードURL
    pub download_url: String,
}

/// POST /api/c2pa/verify のレスポンス内の検証詳細。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    /// 検証ステータス
    pub status: VerificationStatus,
    /// 検証詳細
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// エラーメッセージ一覧
    pub errors: Vec<String>,
    /// 警告メッセージ一覧
    pub warnings: Vec<String>,
    /// 署名証明書の信頼情報
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateTrustInfo>,
}

/// POST /api/c2pa/verify のレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// 常にtrue
    pub success: bool,
    /// C2PAデータが存在したか
    pub has_c2pa: bool,
    /// 署名が有効か
    pub is_valid: bool,
    /// 検証詳細
    pub validation_details: ValidationDetails,
}

impl VerifyResponse {
    /// 検証結果からレスポンスを組み立てる。
    pub fn from_result(has_c2pa: bool, result: VerificationResult) -> Self {
        Self {
            success: true,
            has_c2pa,
            is_valid: result.is_valid,
            validation_details: ValidationDetails {
                status: result.status,
                details: result.details,
                errors: result.errors,
                warnings: result.warnings,
                certificate: result.certificate,
            },
        }
    }
}

/// 全エンドポイント共通のエラーレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// 常にfalse
    pub success: bool,
    /// 人間が読めるエラーメッセージ
    pub error: String,
    /// 署名失敗時の診断ヒント
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

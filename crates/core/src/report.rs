//! 検証情報の抽出とUI向けの整形。
//!
//! マニフェストストアJSONのうち、ライブラリが算出済みのフィールド
//! （`validation_results`、`validation_status`、`signature_info`）だけを読み取る。

use c2pa_web_types::{CertificateTrustInfo, VerificationResult, VerificationStatus};
use serde::Deserialize;
use serde_json::json;

/// C2PAデータが存在しない場合のエラーメッセージ
pub const NO_C2PA_MESSAGE: &str = "このファイルにはC2PA情報が含まれていません。";

/// 署名証明書が信頼リストにない場合のステータスコード
pub const SIGNING_CREDENTIAL_UNTRUSTED: &str = "signingCredential.untrusted";

const INVALID_SIGNATURE_MESSAGE: &str = "C2PA署名が無効です。";
const UNTRUSTED_MESSAGE: &str = "C2PA署名に警告があります。署名証明書が信頼リストで確認できません。";

/// ライブラリが算出したマニフェストストアの検証状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureState {
    /// 検証エラーあり
    Invalid,
    /// エラーはないが、署名証明書は信頼リストで確認できない
    Valid,
    /// 検証エラーがなく、署名証明書が信頼されている
    Trusted,
}

impl From<c2pa::validation_results::ValidationState> for SignatureState {
    fn from(state: c2pa::validation_results::ValidationState) -> Self {
        use c2pa::validation_results::ValidationState;
        match state {
            ValidationState::Invalid => SignatureState::Invalid,
            ValidationState::Valid => SignatureState::Valid,
            ValidationState::Trusted => SignatureState::Trusted,
        }
    }
}

impl SignatureState {
    fn as_str(self) -> &'static str {
        match self {
            SignatureState::Invalid => "Invalid",
            SignatureState::Valid => "Valid",
            SignatureState::Trusted => "Trusted",
        }
    }
}

/// 1件の検証ステータス（コードと説明）。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusEntry {
    /// ステータスコード (例: "claimSignature.mismatch")
    pub code: String,
    /// 説明文
    #[serde(default)]
    pub explanation: Option<String>,
}

impl StatusEntry {
    fn describe(&self) -> String {
        match &self.explanation {
            Some(explanation) => format!("{}: {}", self.code, explanation),
            None => self.code.clone(),
        }
    }
}

/// Active Manifestの署名情報。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SignatureSummary {
    /// 証明書の発行者
    #[serde(default)]
    pub issuer: Option<String>,
    /// 証明書のコモンネーム
    #[serde(default)]
    pub common_name: Option<String>,
    /// 署名時刻
    #[serde(default)]
    pub time: Option<String>,
    /// 署名アルゴリズム
    #[serde(default)]
    pub alg: Option<String>,
}

/// ライブラリが算出した検証情報。
#[derive(Debug, Clone)]
pub struct ProvenanceReport {
    /// 検証状態
    pub state: SignatureState,
    /// Active Manifestのラベル
    pub active_manifest: Option<String>,
    /// Active Manifestの失敗ステータス
    pub failures: Vec<StatusEntry>,
    /// Active Manifestの情報ステータス
    pub informational: Vec<StatusEntry>,
    /// Active Manifestの署名情報
    pub signature: Option<SignatureSummary>,
    /// マニフェストストア全体（ライブラリのJSON出力）
    pub manifest_store: serde_json::Value,
}

#[derive(Deserialize, Default)]
struct StatusCodes {
    #[serde(default)]
    informational: Vec<StatusEntry>,
    #[serde(default)]
    failure: Vec<StatusEntry>,
}

#[derive(Deserialize, Default)]
struct ValidationResults {
    #[serde(rename = "activeManifest", default)]
    active_manifest: Option<StatusCodes>,
}

#[derive(Deserialize, Default)]
struct StoreFields {
    #[serde(default)]
    active_manifest: Option<String>,
    #[serde(default)]
    validation_results: Option<ValidationResults>,
    #[serde(default)]
    validation_status: Option<Vec<StatusEntry>>,
}

impl ProvenanceReport {
    /// 検証状態とマニフェストストアJSONから検証情報を組み立てる。
    ///
    /// `validation_results` がない旧形式のストアでは `validation_status` を失敗一覧として扱う。
    pub fn from_store(state: SignatureState, manifest_store: serde_json::Value) -> Self {
        let fields: StoreFields = serde_json::from_value(manifest_store.clone()).unwrap_or_default();

        let (failures, informational) = match fields.validation_results.and_then(|r| r.active_manifest)
        {
            Some(codes) => (codes.failure, codes.informational),
            None => (fields.validation_status.unwrap_or_default(), Vec::new()),
        };

        let signature = fields.active_manifest.as_deref().and_then(|label| {
            manifest_store
                .get("manifests")?
                .get(label)?
                .get("signature_info")
                .and_then(|info| serde_json::from_value(info.clone()).ok())
        });

        Self {
            state,
            active_manifest: fields.active_manifest,
            failures,
            informational,
            signature,
            manifest_store,
        }
    }

    /// Active Manifest本体
    pub fn active_manifest_json(&self) -> Option<&serde_json::Value> {
        let label = self.active_manifest.as_deref()?;
        self.manifest_store.get("manifests")?.get(label)
    }

    fn untrusted_only(&self) -> bool {
        self.failures
            .iter()
            .all(|f| f.code == SIGNING_CREDENTIAL_UNTRUSTED)
    }
}

/// 検証情報をUI向けの検証結果に整形する。
///
/// - 検証情報なし → invalid（C2PAデータなし）
/// - Trusted → valid
/// - Valid、または失敗が `signingCredential.untrusted` のみのInvalid → warning
/// - それ以外のInvalid → invalid
pub fn normalize_verification(report: Option<&ProvenanceReport>) -> VerificationResult {
    let Some(report) = report else {
        return VerificationResult {
            is_valid: false,
            status: VerificationStatus::Invalid,
            errors: vec![NO_C2PA_MESSAGE.to_string()],
            warnings: Vec::new(),
            details: None,
            certificate: None,
        };
    };

    let informational: Vec<String> = report.informational.iter().map(StatusEntry::describe).collect();

    let (status, errors, warnings) = match report.state {
        SignatureState::Trusted => (VerificationStatus::Valid, Vec::new(), informational),
        SignatureState::Invalid if report.failures.is_empty() || !report.untrusted_only() => {
            let mut errors = vec![INVALID_SIGNATURE_MESSAGE.to_string()];
            errors.extend(
                report
                    .failures
                    .iter()
                    .filter(|f| f.code != SIGNING_CREDENTIAL_UNTRUSTED)
                    .map(StatusEntry::describe),
            );
            (VerificationStatus::Invalid, errors, informational)
        }
        SignatureState::Valid | SignatureState::Invalid => {
            let mut warnings = vec![UNTRUSTED_MESSAGE.to_string()];
            warnings.extend(report.failures.iter().map(StatusEntry::describe));
            warnings.extend(informational);
            (VerificationStatus::Warning, Vec::new(), warnings)
        }
    };

    let is_trusted = report.state == SignatureState::Trusted;
    let certificate = report.signature.as_ref().map(|sig| CertificateTrustInfo {
        is_trusted,
        issuer: sig.issuer.clone(),
        common_name: sig.common_name.clone(),
        timestamp: sig.time.clone(),
        error_message: (!is_trusted).then(|| match status {
            VerificationStatus::Invalid => INVALID_SIGNATURE_MESSAGE.to_string(),
            _ => "署名証明書が信頼リストで確認できません。".to_string(),
        }),
    });

    VerificationResult {
        is_valid: status != VerificationStatus::Invalid,
        status,
        errors,
        warnings,
        details: Some(json!({
            "validationState": report.state.as_str(),
            "activeManifest": report.active_manifest,
            "manifest": report.active_manifest_json(),
        })),
        certificate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(failures: serde_json::Value) -> serde_json::Value {
        json!({
            "active_manifest": "urn:c2pa:1234",
            "manifests": {
                "urn:c2pa:1234": {
                    "title": "photo.jpg",
                    "signature_info": {
                        "issuer": "c2pa-web",
                        "common_name": "c2pa-web Test Signer",
                        "time": "2025-01-01T00:00:00+00:00"
                    }
                }
            },
            "validation_results": {
                "activeManifest": {
                    "success": [{"code": "claimSignature.validated"}],
                    "informational": [{"code": "timeStamp.untrusted", "explanation": "no TSA"}],
                    "failure": failures
                }
            }
        })
    }

    #[test]
    fn test_no_report_is_invalid() {
        let result = normalize_verification(None);
        assert!(!result.is_valid);
        assert_eq!(result.status, VerificationStatus::Invalid);
        assert_eq!(result.errors, vec![NO_C2PA_MESSAGE.to_string()]);
        assert!(result.certificate.is_none());
    }

    #[test]
    fn test_trusted_is_valid() {
        let report = ProvenanceReport::from_store(SignatureState::Trusted, store(json!([])));
        let result = normalize_verification(Some(&report));

        assert!(result.is_valid);
        assert_eq!(result.status, VerificationStatus::Valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings, vec!["timeStamp.untrusted: no TSA".to_string()]);

        let cert = result.certificate.unwrap();
        assert!(cert.is_trusted);
        assert_eq!(cert.issuer.as_deref(), Some("c2pa-web"));
        assert!(cert.error_message.is_none());

        let details = result.details.unwrap();
        assert_eq!(details["validationState"], "Trusted");
        assert_eq!(details["activeManifest"], "urn:c2pa:1234");
        assert_eq!(details["manifest"]["title"], "photo.jpg");
    }

    #[test]
    fn test_valid_untrusted_is_warning() {
        let report = ProvenanceReport::from_store(SignatureState::Valid, store(json!([])));
        let result = normalize_verification(Some(&report));

        assert!(result.is_valid);
        assert_eq!(result.status, VerificationStatus::Warning);
        assert_eq!(result.warnings[0], UNTRUSTED_MESSAGE);
        assert!(!result.certificate.unwrap().is_trusted);
    }

    #[test]
    fn test_untrusted_only_failure_is_warning() {
        let report = ProvenanceReport::from_store(
            SignatureState::Invalid,
            store(json!([{"code": SIGNING_CREDENTIAL_UNTRUSTED, "explanation": "not on list"}])),
        );
        let result = normalize_verification(Some(&report));

        assert_eq!(result.status, VerificationStatus::Warning);
        assert!(result.errors.is_empty());
        assert!(result
            .warnings
            .contains(&"signingCredential.untrusted: not on list".to_string()));
    }

    #[test]
    fn test_failures_are_invalid() {
        let report = ProvenanceReport::from_store(
            SignatureState::Invalid,
            store(json!([
                {"code": "assertion.dataHash.mismatch", "explanation": "hash differs"},
                {"code": SIGNING_CREDENTIAL_UNTRUSTED}
            ])),
        );
        let result = normalize_verification(Some(&report));

        assert!(!result.is_valid);
        assert_eq!(result.status, VerificationStatus::Invalid);
        assert_eq!(
            result.errors,
            vec![
                INVALID_SIGNATURE_MESSAGE.to_string(),
                "assertion.dataHash.mismatch: hash differs".to_string()
            ]
        );
        assert_eq!(
            result.certificate.unwrap().error_message.as_deref(),
            Some(INVALID_SIGNATURE_MESSAGE)
        );
    }

    #[test]
    fn test_invalid_without_listed_failures_stays_invalid() {
        let report = ProvenanceReport::from_store(SignatureState::Invalid, store(json!([])));
        let result = normalize_verification(Some(&report));
        assert_eq!(result.status, VerificationStatus::Invalid);
    }

    #[test]
    fn test_legacy_validation_status_is_used_as_failures() {
        let legacy = json!({
            "active_manifest": "urn:c2pa:legacy",
            "manifests": {"urn:c2pa:legacy": {}},
            "validation_status": [{"code": "claimSignature.mismatch"}]
        });
        let report = ProvenanceReport::from_store(SignatureState::Invalid, legacy);

        assert_eq!(report.failures.len(), 1);
        assert!(report.informational.is_empty());
        assert!(report.signature.is_none());
    }
}

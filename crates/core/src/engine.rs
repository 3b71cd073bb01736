//! `c2pa` クレートによる `ProvenanceEngine` 実装。

use std::io::Cursor;

use c2pa::SigningAlg;
use c2pa_web_types::ManifestData;

use crate::credentials::BuiltinCredentials;
use crate::manifest::{build_manifest_definition, signing_hint, DEFAULT_CLAIM_GENERATOR};
use crate::report::{ProvenanceReport, SignatureState};
use crate::{CoreError, ProvenanceEngine, SignerConfig};

/// エンジン設定。
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 利用者提供の証明書で署名する際のアルゴリズム
    pub local_signing_alg: SigningAlg,
    /// 利用者提供の証明書で署名する際のタイムスタンプ局URL
    pub tsa_url: Option<String>,
    /// 信頼アンカー（PEM形式の証明書バンドル）
    pub trust_anchors_pem: Option<String>,
    /// claimGenerator省略時のクレーム生成者
    pub claim_generator: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            local_signing_alg: SigningAlg::Es256,
            tsa_url: Some("http://timestamp.digicert.com".to_string()),
            trust_anchors_pem: None,
            claim_generator: DEFAULT_CLAIM_GENERATOR.to_string(),
        }
    }
}

/// `c2pa` クレートを呼び出すエンジン。
pub struct C2paEngine {
    config: EngineConfig,
    /// 組み込みテスト署名者の資格情報
    builtin: BuiltinCredentials,
    /// 各呼び出しの前に適用するC2PA設定（JSON）
    settings_json: String,
}

/// C2PAデータが存在しないことを示すライブラリエラーか
fn is_missing_manifest(e: &c2pa::Error) -> bool {
    matches!(e, c2pa::Error::JumbfNotFound | c2pa::Error::ProvenanceMissing)
}

fn signing_err(e: c2pa::Error) -> CoreError {
    let message = e.to_string();
    CoreError::Signing {
        hint: signing_hint(&message),
        message,
    }
}

impl C2paEngine {
    /// 設定からエンジンを構築する。組み込みテスト署名者の証明書はここで生成する。
    pub fn new(config: EngineConfig) -> Result<Self, CoreError> {
        let builtin = BuiltinCredentials::generate(SigningAlg::Ed25519, "c2pa-web")?;

        // 信頼アンカーがない場合、信頼リスト検査は行わない（署名は Valid 止まり）
        let mut settings = serde_json::json!({
            "verify": {
                "verify_after_sign": false,
                "verify_trust": config.trust_anchors_pem.is_some(),
            }
        });
        if let Some(anchors) = &config.trust_anchors_pem {
            settings["trust"] = serde_json::json!({ "trust_anchors": anchors });
        }

        tracing::info!(
            local_signing_alg = %config.local_signing_alg,
            tsa_url = ?config.tsa_url,
            trust_list = config.trust_anchors_pem.is_some(),
            "C2PAエンジンを初期化しました"
        );

        Ok(Self {
            config,
            builtin,
            settings_json: settings.to_string(),
        })
    }

    /// 組み込みテスト署名者の資格情報
    pub fn builtin_credentials(&self) -> &BuiltinCredentials {
        &self.builtin
    }

    /// C2PA設定はスレッド単位で保持されるため、呼び出しごとに適用する。
    fn apply_settings(&self) -> Result<(), CoreError> {
        c2pa::settings::Settings::from_string(&self.settings_json, "json")
            .map(|_| ())
            .map_err(|e| CoreError::Settings(e.to_string()))
    }

    fn open_reader(&self, bytes: &[u8], mime_type: &str) -> Result<Option<c2pa::Reader>, CoreError> {
        self.apply_settings()?;
        match c2pa::Reader::from_stream(mime_type, Cursor::new(bytes)) {
            Ok(reader) => Ok(Some(reader)),
            Err(e) if is_missing_manifest(&e) => Ok(None),
            Err(e) => Err(CoreError::Read(e.to_string())),
        }
    }

    fn create_signer(
        &self,
        signer: &SignerConfig,
    ) -> Result<Box<dyn c2pa::Signer + Send + Sync>, CoreError> {
        match signer {
            SignerConfig::TestSigner => c2pa::create_signer::from_keys(
                self.builtin.cert_chain_pem.as_bytes(),
                self.builtin.private_key_pem.as_bytes(),
                self.builtin.alg,
                None,
            ),
            SignerConfig::LocalSigner {
                certificate_pem,
                private_key_pem,
            } => c2pa::create_signer::from_keys(
                certificate_pem.as_bytes(),
                private_key_pem.as_bytes(),
                self.config.local_signing_alg,
                self.config.tsa_url.clone(),
            ),
        }
        .map_err(signing_err)
    }
}

impl ProvenanceEngine for C2paEngine {
    fn read(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<Option<serde_json::Value>, CoreError> {
        let Some(reader) = self.open_reader(bytes, mime_type)? else {
            return Ok(None);
        };
        serde_json::from_str(&reader.json())
            .map(Some)
            .map_err(|e| CoreError::Read(format!("マニフェストJSONの解析に失敗: {e}")))
    }

    fn sign(
        &self,
        bytes: &[u8],
        mime_type: &str,
        manifest: &ManifestData,
        signer: &SignerConfig,
    ) -> Result<Vec<u8>, CoreError> {
        self.apply_settings()?;

        let definition =
            build_manifest_definition(manifest, mime_type, &self.config.claim_generator);
        let mut builder = c2pa::Builder::from_json(&definition.to_string())
            .map_err(|e| CoreError::ManifestDefinition(e.to_string()))?;

        let signer = self.create_signer(signer)?;

        let mut source = Cursor::new(bytes);
        let mut dest = Cursor::new(Vec::new());
        builder
            .sign(signer.as_ref(), mime_type, &mut source, &mut dest)
            .map_err(signing_err)?;
        Ok(dest.into_inner())
    }

    fn verify(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<Option<ProvenanceReport>, CoreError> {
        let Some(reader) = self.open_reader(bytes, mime_type)? else {
            return Ok(None);
        };
        let state = SignatureState::from(reader.validation_state());
        let store: serde_json::Value = serde_json::from_str(&reader.json())
            .map_err(|e| CoreError::Read(format!("マニフェストJSONの解析に失敗: {e}")))?;
        Ok(Some(ProvenanceReport::from_store(state, store)))
    }
}

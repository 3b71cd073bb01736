//! 組み込みテスト署名者の資格情報。
//!
//! 起動時にルートCAとエンドエンティティ証明書を生成する。
//! C2PAの証明書プロファイル検査を通すため、署名証明書には
//! EKU (emailProtection)、AKI、digitalSignatureのKeyUsageを付与する。
//! 自己署名のCA証明書は署名証明書として使えないため、必ずCAから発行する。

use c2pa::SigningAlg;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, KeyPair, KeyUsagePurpose,
};

use crate::CoreError;

/// 証明書チェーンと秘密鍵（いずれもPEM）。
#[derive(Clone)]
pub struct BuiltinCredentials {
    /// 署名アルゴリズム
    pub alg: SigningAlg,
    /// 署名証明書 + ルートCA証明書
    pub cert_chain_pem: String,
    /// 署名証明書の秘密鍵（PKCS#8）
    pub private_key_pem: String,
    /// ルートCA証明書（信頼アンカーとして登録する場合に使用）
    pub root_cert_pem: String,
}

impl std::fmt::Debug for BuiltinCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinCredentials")
            .field("alg", &self.alg)
            .field("private_key_pem", &"<redacted>")
            .finish_non_exhaustive()
    }
}

fn rcgen_alg(alg: SigningAlg) -> Result<&'static rcgen::SignatureAlgorithm, CoreError> {
    match alg {
        SigningAlg::Ed25519 => Ok(&rcgen::PKCS_ED25519),
        SigningAlg::Es256 => Ok(&rcgen::PKCS_ECDSA_P256_SHA256),
        SigningAlg::Es384 => Ok(&rcgen::PKCS_ECDSA_P384_SHA384),
        other => Err(CoreError::Credentials(format!(
            "未対応の署名アルゴリズムです: {other}"
        ))),
    }
}

fn credentials_err(e: rcgen::Error) -> CoreError {
    CoreError::Credentials(e.to_string())
}

impl BuiltinCredentials {
    /// 指定アルゴリズムでルートCAと署名証明書を生成する。
    pub fn generate(alg: SigningAlg, organization: &str) -> Result<Self, CoreError> {
        let key_alg = rcgen_alg(alg)?;

        // ルートCA
        let ca_key = KeyPair::generate_for(key_alg).map_err(credentials_err)?;
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).map_err(credentials_err)?;
        let mut ca_dn = DistinguishedName::new();
        ca_dn.push(DnType::CommonName, format!("{organization} Test Root CA"));
        ca_dn.push(DnType::OrganizationName, organization);
        ca_params.distinguished_name = ca_dn;
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let ca_cert = ca_params.self_signed(&ca_key).map_err(credentials_err)?;

        // 署名証明書（エンドエンティティ）
        let ee_key = KeyPair::generate_for(key_alg).map_err(credentials_err)?;
        let mut ee_params = CertificateParams::new(Vec::<String>::new()).map_err(credentials_err)?;
        let mut ee_dn = DistinguishedName::new();
        ee_dn.push(DnType::CommonName, format!("{organization} Test Signer"));
        ee_dn.push(DnType::OrganizationName, organization);
        ee_params.distinguished_name = ee_dn;
        ee_params.is_ca = IsCa::ExplicitNoCa;
        ee_params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
        ee_params.extended_key_usages = vec![ExtendedKeyUsagePurpose::EmailProtection];
        ee_params.use_authority_key_identifier_extension = true;
        let ee_cert = ee_params
            .signed_by(&ee_key, &ca_cert, &ca_key)
            .map_err(credentials_err)?;

        let root_cert_pem = ca_cert.pem();
        Ok(Self {
            alg,
            cert_chain_pem: format!("{}{}", ee_cert.pem(), root_cert_pem),
            private_key_pem: ee_key.serialize_pem(),
            root_cert_pem,
        })
    }
}

//! マニフェスト定義の構築と署名エラーの診断。

use c2pa_web_types::ManifestData;
use serde_json::json;

/// claimGenerator省略時のクレーム生成者
pub const DEFAULT_CLAIM_GENERATOR: &str = "c2pa-web-app/1.0.0";

/// "name/version" 形式のクレーム生成者を `claim_generator_info` の要素に変換する。
fn claim_generator_info(claim_generator: &str) -> serde_json::Value {
    match claim_generator.split_once('/') {
        Some((name, version)) if !name.is_empty() && !version.is_empty() => {
            json!({ "name": name, "version": version })
        }
        _ => json!({ "name": claim_generator }),
    }
}

/// 空白のみの値を未指定として扱う
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// アクションアサーションのラベル
const ACTIONS_LABEL: &str = "c2pa.actions";

/// 作成アクションに付与する既定のデジタルソース種別（IPTC）
pub const DEFAULT_DIGITAL_SOURCE_TYPE: &str =
    "http://cv.iptc.org/newscodes/digitalsourcetype/digitalCapture";

fn is_actions_label(label: &str) -> bool {
    label == ACTIONS_LABEL || label.starts_with("c2pa.actions.")
}

fn created_action() -> serde_json::Value {
    json!({
        "action": "c2pa.created",
        "digitalSourceType": DEFAULT_DIGITAL_SOURCE_TYPE,
    })
}

/// アクションアサーションの先頭を作成（または開封）アクションにする。
///
/// 先頭が `c2pa.created` / `c2pa.opened` でなければ作成アクションを挿入し、
/// 作成アクションに `digitalSourceType` がなければ既定値を補う。
fn complete_actions(data: &mut serde_json::Value) {
    if !data.is_object() {
        *data = json!({});
    }
    if !data["actions"].is_array() {
        data["actions"] = json!([]);
    }
    let Some(actions) = data["actions"].as_array_mut() else {
        return;
    };

    let first = actions
        .first()
        .and_then(|a| a.get("action"))
        .and_then(|a| a.as_str());
    if !matches!(first, Some("c2pa.created" | "c2pa.opened")) {
        actions.insert(0, created_action());
    }
    if let Some(first) = actions.first_mut().and_then(|a| a.as_object_mut()) {
        if first.get("action").and_then(|a| a.as_str()) == Some("c2pa.created") {
            first
                .entry("digitalSourceType")
                .or_insert_with(|| json!(DEFAULT_DIGITAL_SOURCE_TYPE));
        }
    }
}

/// UIのマニフェスト記述から `c2pa::Builder` 用のマニフェスト定義JSONを構築する。
///
/// - 先頭は常にアクションアサーション（リクエストのものを補完するか、生成する）
/// - リクエストのアサーションの後に、作成者・著作権・説明のアサーションを追加する
/// - `format` はアセットのMIMEタイプ（ライブラリは署名時のアセット形式を使う）
pub fn build_manifest_definition(
    manifest: &ManifestData,
    mime_type: &str,
    default_claim_generator: &str,
) -> serde_json::Value {
    let generator = non_blank(&manifest.claim_generator).unwrap_or(default_claim_generator);

    let mut actions = None;
    let mut assertions: Vec<serde_json::Value> = Vec::with_capacity(manifest.assertions.len() + 4);
    for a in &manifest.assertions {
        if actions.is_none() && is_actions_label(&a.label) {
            let mut data = a.data.clone();
            complete_actions(&mut data);
            actions = Some(json!({ "label": a.label, "data": data }));
        } else {
            assertions.push(json!({ "label": a.label, "data": a.data }));
        }
    }
    let actions = actions.unwrap_or_else(|| {
        json!({ "label": ACTIONS_LABEL, "data": { "actions": [created_action()] } })
    });
    assertions.insert(0, actions);

    for (label, value) in [
        ("dc.creator", &manifest.creator),
        ("dc.rights", &manifest.copyright),
        ("dc.description", &manifest.description),
    ] {
        if let Some(text) = non_blank(value) {
            assertions.push(json!({ "label": label, "data": { "value": text } }));
        }
    }

    let mut definition = json!({
        "format": mime_type,
        "claim_generator_info": [claim_generator_info(generator)],
        "assertions": assertions,
    });
    let title = manifest.title.trim();
    if !title.is_empty() {
        definition["title"] = json!(title);
    }
    definition
}

/// ライブラリの署名エラーメッセージから診断ヒントを推定する。
pub fn signing_hint(message: &str) -> Option<String> {
    let lower = message.to_lowercase();
    if lower.contains("pem") {
        Some("証明書または秘密鍵のPEM形式が正しくない可能性があります。BEGIN/ENDの行を含めて貼り付けてください。".to_string())
    } else if lower.contains("private key") || lower.contains("pkcs8") {
        Some("秘密鍵を読み込めませんでした。PKCS#8形式の秘密鍵か、証明書と対応する鍵かを確認してください。".to_string())
    } else if lower.contains("certificate") || lower.contains("cert") {
        Some("署名証明書がC2PAの要件（EKU、KeyUsage、有効期限）を満たしているか確認してください。".to_string())
    } else if lower.contains("alg") {
        Some("秘密鍵の種類が設定された署名アルゴリズムと一致していない可能性があります。".to_string())
    } else {
        None
    }
}

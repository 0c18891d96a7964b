//! Edge cases cutting across the client and reconciler.

use serde_json::json;

use crate::client::{PayChanguClient, PayChanguConfig, PaymentMeta};
use crate::webhooks::{classify_status, GatewayStatus, WebhookEvent};

fn test_client() -> PayChanguClient {
    PayChanguClient::new(PayChanguConfig {
        secret_key: "sec-test-key".to_string(),
        webhook_secret: "whsec-test-secret".to_string(),
        base_url: "https://api.paychangu.test".to_string(),
    })
}

fn sign(body: &[u8], secret: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

// ---- signature edge cases ----

#[test]
fn large_payload_with_valid_signature_is_accepted() {
    let client = test_client();
    let payload = format!("{{\"data\":\"{}\"}}", "x".repeat(100_000));
    let signature = sign(payload.as_bytes(), "whsec-test-secret");

    assert!(client.verify_webhook_signature(payload.as_bytes(), &signature));
}

#[test]
fn binary_payload_with_valid_signature_is_accepted() {
    let client = test_client();
    let payload = &[0x00, 0x01, 0x02, 0xFF, 0xFE, 0xFD];
    let signature = sign(payload, "whsec-test-secret");

    assert!(client.verify_webhook_signature(payload, &signature));
}

#[test]
fn unicode_payload_with_valid_signature_is_accepted() {
    let client = test_client();
    let payload = "{\"customer_name\":\"Chilungamo Phiri \u{1F389}\"}".as_bytes();
    let signature = sign(payload, "whsec-test-secret");

    assert!(client.verify_webhook_signature(payload, &signature));
}

#[test]
fn reserialized_body_does_not_verify() {
    // Whitespace differences between raw and re-serialized JSON must break
    // the check: the signature covers exact bytes, nothing semantic.
    let client = test_client();
    let raw = br#"{ "tx_ref": "INV-1-AB12CD34" }"#;
    let reserialized = br#"{"tx_ref":"INV-1-AB12CD34"}"#;
    let signature = sign(raw, "whsec-test-secret");

    assert!(client.verify_webhook_signature(raw, &signature));
    assert!(!client.verify_webhook_signature(reserialized, &signature));
}

#[test]
fn uppercase_hex_signature_still_verifies() {
    let client = test_client();
    let body = b"{}";
    let signature = sign(body, "whsec-test-secret").to_uppercase();

    assert!(client.verify_webhook_signature(body, &signature));
}

// ---- event parsing edge cases ----

#[test]
fn numeric_tx_ref_is_not_silently_coerced() {
    // A number where a string belongs fails the whole parse; the boundary
    // treats that as a discardable event rather than guessing.
    let result = serde_json::from_value::<WebhookEvent>(json!({"tx_ref": 12345}));
    assert!(result.is_err());
}

#[test]
fn status_classification_never_promotes_unknown_values() {
    for status in ["pending", "reversed", "refunded", "0", "null"] {
        assert_eq!(classify_status(Some(status)), GatewayStatus::Other);
    }
}

#[test]
fn meta_with_wrong_field_types_is_rejected() {
    assert!(PaymentMeta::from_value(&json!({"invoice_id": "one"})).is_none());
    assert!(PaymentMeta::from_value(&json!(null)).is_none());
    assert!(PaymentMeta::from_value(&json!([1, 2, 3])).is_none());
}

//! Webhook security tests
//!
//! Signatures are computed here independently of caja-core, the way the
//! payment processor computes them, and fed to the verifier.

use caja_core::{PaymentEventType, PaymentWebhookVerifier, WebhookError};
use caja_types::SubscriptionId;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

const SECRET: &str = "whsec_test_secret_key";

/// Generate a processor-style signature header
fn processor_signature(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signed_payload = format!("{}.{}", timestamp, std::str::from_utf8(payload).unwrap());

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(signed_payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    format!("t={},v1={}", timestamp, signature)
}

/// Generate a webhook payload for testing
fn test_webhook_payload(event_type: &str, subscription_id: &str) -> Vec<u8> {
    let payload = serde_json::json!({
        "id": "evt_test_123",
        "type": event_type,
        "created": Utc::now().timestamp(),
        "data": {
            "subscription_id": subscription_id,
            "status": "approved"
        }
    });
    serde_json::to_vec(&payload).unwrap()
}

fn verifier() -> PaymentWebhookVerifier {
    PaymentWebhookVerifier::new(SECRET)
}

#[test]
fn test_processor_signature_is_accepted() {
    let id = SubscriptionId::new();
    let payload = test_webhook_payload("payment.approved", &id.to_string());
    let header = processor_signature(&payload, SECRET, Utc::now().timestamp());

    let event = verifier().verify_and_parse(&payload, &header).unwrap();

    assert_eq!(event.id, "evt_test_123");
    assert_eq!(event.event_type, PaymentEventType::PaymentApproved);
    assert_eq!(event.subscription_id, Some(id));
}

#[test]
fn test_header_with_spaces_and_extra_parts() {
    let payload = test_webhook_payload("payment.approved", &SubscriptionId::new().to_string());
    let now = Utc::now().timestamp();
    let header = processor_signature(&payload, SECRET, now).replace(',', ", ") + ",v0=legacy";

    assert!(verifier().verify_signature(&payload, &header, now).is_ok());
}

#[test]
fn test_wrong_secret_is_rejected() {
    let payload = test_webhook_payload("payment.approved", &SubscriptionId::new().to_string());
    let now = Utc::now().timestamp();
    let header = processor_signature(&payload, "whsec_attacker", now);

    assert_eq!(
        verifier().verify_signature(&payload, &header, now),
        Err(WebhookError::InvalidSignature)
    );
}

#[test]
fn test_modified_body_is_rejected() {
    let original = test_webhook_payload("payment.rejected", &SubscriptionId::new().to_string());
    let now = Utc::now().timestamp();
    let header = processor_signature(&original, SECRET, now);

    // Attacker flips the event type but replays the signature
    let forged = String::from_utf8(original)
        .unwrap()
        .replace("payment.rejected", "payment.approved");

    assert_eq!(
        verifier().verify_signature(forged.as_bytes(), &header, now),
        Err(WebhookError::InvalidSignature)
    );
}

#[test]
fn test_replay_attack_prevention() {
    let payload = test_webhook_payload("payment.approved", &SubscriptionId::new().to_string());
    let now = Utc::now().timestamp();

    // Signed ten minutes ago
    let old = processor_signature(&payload, SECRET, now - 600);
    assert_eq!(
        verifier().verify_signature(&payload, &old, now),
        Err(WebhookError::StaleTimestamp)
    );

    // Too far in the future
    let future = processor_signature(&payload, SECRET, now + 400);
    assert_eq!(
        verifier().verify_signature(&payload, &future, now),
        Err(WebhookError::StaleTimestamp)
    );

    // Within five minutes
    let fresh = processor_signature(&payload, SECRET, now - 60);
    assert!(verifier().verify_signature(&payload, &fresh, now).is_ok());
}

#[test]
fn test_tolerance_is_configurable() {
    let payload = test_webhook_payload("payment.approved", &SubscriptionId::new().to_string());
    let now = Utc::now().timestamp();
    let header = processor_signature(&payload, SECRET, now - 60);

    let strict = PaymentWebhookVerifier::new(SECRET).with_tolerance_secs(30);
    assert_eq!(
        strict.verify_signature(&payload, &header, now),
        Err(WebhookError::StaleTimestamp)
    );
}

#[test]
fn test_malformed_signature_rejection() {
    let payload = b"{}";
    let v = verifier();

    assert_eq!(
        v.verify_signature(payload, "v1=abc123", 0),
        Err(WebhookError::MissingTimestamp)
    );
    assert_eq!(
        v.verify_signature(payload, "t=1234567890", 0),
        Err(WebhookError::MissingSignature)
    );
    assert_eq!(v.verify_signature(payload, "", 0), Err(WebhookError::MissingTimestamp));
    assert_eq!(
        v.verify_signature(payload, "invalid_format", 0),
        Err(WebhookError::MissingTimestamp)
    );
    assert_eq!(
        v.verify_signature(payload, "t=soon,v1=abc", 0),
        Err(WebhookError::InvalidTimestamp)
    );
}

#[test]
fn test_signed_garbage_is_invalid_payload() {
    let payload = b"not json";
    let header = processor_signature(payload, SECRET, Utc::now().timestamp());

    assert!(matches!(
        verifier().verify_and_parse(payload, &header),
        Err(WebhookError::InvalidPayload(_))
    ));
}

#[test]
fn test_event_types() {
    let cases = [
        ("payment.approved", PaymentEventType::PaymentApproved),
        ("payment.rejected", PaymentEventType::PaymentRejected),
        (
            "payment.refunded",
            PaymentEventType::Unknown("payment.refunded".to_string()),
        ),
    ];

    for (event_type, expected) in cases {
        let payload = test_webhook_payload(event_type, &SubscriptionId::new().to_string());
        let header = processor_signature(&payload, SECRET, Utc::now().timestamp());
        let event = verifier().verify_and_parse(&payload, &header).unwrap();
        assert_eq!(event.event_type, expected);
    }
}

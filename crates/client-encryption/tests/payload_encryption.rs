mod support;

use bytes::Bytes;
use client_encryption::{
    field_level, jwe, DecryptionKey, EncryptionError, FieldLevelEncryptionInterceptor, FieldValueEncoding, JweConfigBuilder,
    JweInterceptor, PayloadInterceptor,
};
use http::{Request, Response};
use serde_json::{json, Value};

fn parse(payload: &str) -> Value {
    serde_json::from_str(payload).unwrap()
}

#[test]
fn field_level_round_trip_for_both_encodings() {
    for encoding in [FieldValueEncoding::Hex, FieldValueEncoding::Base64] {
        let config = support::field_level_builder(encoding)
            .with_encryption_path("$.card", "$.encryptedCard")
            .with_decryption_path("$.encryptedCard", "$.card")
            .build()
            .unwrap();
        let payload = json!({"card": {"number": "5123456789012346", "expiry": "12/30"}, "amount": 10});

        let encrypted = parse(&field_level::encrypt_payload(&payload.to_string(), &config, None).unwrap());
        assert!(encrypted.get("card").is_none());
        assert_eq!(encrypted["encryptedCard"]["oaepHashingAlgorithm"], "SHA512");

        let decrypted = field_level::decrypt_payload(&encrypted.to_string(), &config, None).unwrap();
        assert_eq!(parse(&decrypted), payload);
    }
}

#[test]
fn field_level_decrypts_reference_payload() {
    let config = support::field_level_builder(FieldValueEncoding::Hex)
        .with_decryption_path("$.data", "$.data")
        .build()
        .unwrap();
    let vectors = support::vectors();
    let decrypted = field_level::decrypt_payload(&vectors["field_level"]["payload"].to_string(), &config, None).unwrap();
    assert_eq!(parse(&decrypted), json!({"data": vectors["field_level"]["cleartext"]}));
}

#[test]
fn key_from_pkcs12_container_decrypts_payloads() {
    let key = DecryptionKey::load(
        support::resource("test_key_container-2048.p12"),
        Some("mykeyalias"),
        Some("Password1"),
    )
    .unwrap();
    assert_eq!(key.alias(), Some("mykeyalias"));

    let config = JweConfigBuilder::new().with_decryption_key(key).build().unwrap();
    let payload = json!({"encryptedData": support::vectors()["jwe"]["a256gcm"]}).to_string();
    assert_eq!(jwe::decrypt_payload(&payload, &config).unwrap(), r#"{"foo":"bar"}"#);
}

#[test]
fn jwe_round_trip_with_default_paths() {
    let config = JweConfigBuilder::new()
        .with_encryption_certificate(support::certificate())
        .with_decryption_key(support::decryption_key())
        .build()
        .unwrap();

    for payload in [r#"{"foo":"bar"}"#, "[{},{}]", r#"{"a":{"b":[1,2,{"c":null}]}}"#] {
        let encrypted = jwe::encrypt_payload(payload, &config).unwrap();
        assert!(parse(&encrypted)["encryptedData"].is_string());
        assert_eq!(jwe::decrypt_payload(&encrypted, &config).unwrap(), payload);
    }
}

#[test]
fn jwe_decrypt_only_config() {
    let config = JweConfigBuilder::new()
        .with_decryption_key(support::decryption_key())
        .build()
        .unwrap();
    let token = support::vectors()["jwe"]["a128cbc_hs256"].clone();

    let decrypted = jwe::decrypt_payload(&json!({"encryptedData": token}).to_string(), &config);
    // A bare string cannot replace the root document.
    assert!(matches!(decrypted, Err(EncryptionError::InvalidArgument(_))));

    let err = jwe::encrypt_payload(r#"{"a":1}"#, &config).unwrap_err();
    assert_eq!(err.to_string(), "No encryption certificate configured!");
}

#[test]
fn interceptors_round_trip_http_messages() {
    let jwe_config = JweConfigBuilder::new()
        .with_encryption_certificate(support::certificate())
        .with_decryption_key(support::decryption_key())
        .build()
        .unwrap();
    let field_level_config = support::field_level_builder(FieldValueEncoding::Base64)
        .with_encryption_path("$", "$")
        .with_decryption_path("$", "$")
        .build()
        .unwrap();
    let interceptors: Vec<Box<dyn PayloadInterceptor>> = vec![
        Box::new(JweInterceptor::new(jwe_config)),
        Box::new(FieldLevelEncryptionInterceptor::new(field_level_config)),
    ];

    for interceptor in interceptors {
        let body = r#"{"account":"12345","currency":"EUR"}"#;
        let request = Request::put("https://api.example.com/accounts")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap();
        let request = interceptor.intercept_request(request).unwrap();
        assert_ne!(request.body(), &Bytes::from_static(body.as_bytes()));

        let response = Response::new(request.into_body());
        let response = interceptor.intercept_response(response).unwrap();
        assert_eq!(response.body(), &Bytes::from_static(body.as_bytes()));
        assert_eq!(response.headers()[http::header::CONTENT_LENGTH], body.len().to_string().as_str());
    }
}

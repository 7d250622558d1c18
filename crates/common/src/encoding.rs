//! Byte/text encodings used on the wire: hex, base64, base64url and PEM.

use std::fmt;
use std::str::FromStr;

use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD},
        DecodePaddingMode,
    },
    Engine as _,
};

use crate::error::{EncryptionError, Result};

/// Standard alphabet, padding optional on decode.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// URL-safe alphabet, unpadded on encode, padding optional on decode.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encoding applied to binary field and header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldValueEncoding {
    Hex,
    Base64,
}

impl fmt::Display for FieldValueEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValueEncoding::Hex => f.write_str("HEX"),
            FieldValueEncoding::Base64 => f.write_str("BASE64"),
        }
    }
}

impl FromStr for FieldValueEncoding {
    type Err = EncryptionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HEX" => Ok(FieldValueEncoding::Hex),
            "BASE64" => Ok(FieldValueEncoding::Base64),
            other => Err(EncryptionError::configuration(format!(
                "Unsupported field value encoding: {other}!"
            ))),
        }
    }
}

/// Encode `bytes` with the given encoding.
pub fn encode_bytes(bytes: &[u8], encoding: FieldValueEncoding) -> String {
    match encoding {
        FieldValueEncoding::Hex => hex_encode(bytes),
        FieldValueEncoding::Base64 => STANDARD.encode(bytes),
    }
}

/// Decode a field or header value with the given encoding.
///
/// # Errors
///
/// Returns [`EncryptionError::InvalidArgument`] if `value` is not valid for
/// the encoding.
pub fn decode_value(value: &str, encoding: FieldValueEncoding) -> Result<Vec<u8>> {
    match encoding {
        FieldValueEncoding::Hex => hex_decode(value),
        FieldValueEncoding::Base64 => STANDARD_LENIENT
            .decode(value.trim())
            .map_err(|e| EncryptionError::invalid_argument(format!("The provided value is not a base64 string: {e}"))),
    }
}

/// Lowercase hex; the empty slice encodes to the empty string.
pub fn hex_encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a hex string. The empty string decodes to no bytes.
pub fn hex_decode(value: &str) -> Result<Vec<u8>> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(EncryptionError::invalid_argument(
            "The provided value is not an hex string!",
        ));
    }
    hex::decode(value).map_err(|e| {
        EncryptionError::invalid_argument(format!("The provided value is not an hex string: {e}"))
    })
}

/// Base64url without padding.
pub fn base64_url_encode(bytes: &[u8]) -> String {
    URL_SAFE_LENIENT.encode(bytes)
}

/// Base64url decode, tolerating padding and the standard `+`/`/` alphabet.
pub fn base64_url_decode(value: &str) -> Result<Vec<u8>> {
    let normalised: String = value
        .trim()
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    URL_SAFE_LENIENT
        .decode(normalised)
        .map_err(|e| EncryptionError::invalid_argument(format!("The provided value is not a base64url string: {e}")))
}

/// Strip the PEM `header`/`footer` lines and decode the base64 body.
pub fn pem_to_der(pem: &str, header: &str, footer: &str) -> Result<Vec<u8>> {
    let body: String = pem
        .replace(header, "")
        .replace(footer, "")
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD_LENIENT
        .decode(body)
        .map_err(|e| EncryptionError::invalid_argument(format!("Invalid PEM content: {e}")))
}

/// Wrap `der` as PEM: base64 body at 64 columns, CRLF line endings.
pub fn der_to_pem(der: &[u8], header: &str, footer: &str) -> String {
    let body = STANDARD.encode(der);
    let mut pem = String::with_capacity(header.len() + footer.len() + body.len() * 66 / 64 + 4);
    pem.push_str(header);
    pem.push_str("\r\n");
    for chunk in body.as_bytes().chunks(64) {
        // base64 output is ASCII
        pem.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        pem.push_str("\r\n");
    }
    pem.push_str(footer);
    pem
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_empty_round_trip() {
        assert_eq!(hex_encode(&[]), "");
        assert!(hex_decode("").unwrap().is_empty());
    }

    #[test]
    fn hex_rejects_non_hex_digits() {
        let err = hex_decode("not hex").unwrap_err();
        assert!(matches!(err, EncryptionError::InvalidArgument(_)));
    }

    #[test]
    fn hex_is_lowercase() {
        assert_eq!(encode_bytes(&[0xAB, 0x01], FieldValueEncoding::Hex), "ab01");
        assert_eq!(decode_value("AB01", FieldValueEncoding::Hex).unwrap(), vec![0xAB, 0x01]);
    }

    #[test]
    fn base64_field_values() {
        assert_eq!(encode_bytes(b"data", FieldValueEncoding::Base64), "ZGF0YQ==");
        assert_eq!(decode_value("ZGF0YQ==", FieldValueEncoding::Base64).unwrap(), b"data");
        assert_eq!(decode_value("ZGF0YQ", FieldValueEncoding::Base64).unwrap(), b"data");
    }

    #[test]
    fn base64_url_strips_padding_and_swaps_alphabet() {
        let bytes = [0xFB, 0xFF, 0xBF, 0x01];
        let encoded = base64_url_encode(&bytes);
        assert_eq!(encoded, "-_-_AQ");
        assert_eq!(base64_url_decode(&encoded).unwrap(), bytes);
        assert_eq!(base64_url_decode("-_-_AQ==").unwrap(), bytes);
        assert_eq!(base64_url_decode("+/+/AQ").unwrap(), bytes);
    }

    #[test]
    fn base64_url_rejects_garbage() {
        assert!(base64_url_decode("!!!").is_err());
    }

    #[test]
    fn pem_der_round_trip() {
        let der: Vec<u8> = (0u8..=200).collect();
        let pem = der_to_pem(&der, "-----BEGIN TEST-----", "-----END TEST-----");
        assert!(pem.starts_with("-----BEGIN TEST-----\r\n"));
        assert!(pem.ends_with("\r\n-----END TEST-----"));
        assert!(pem.lines().all(|l| l.trim_end().len() <= 64 || l.starts_with("-----")));
        let back = pem_to_der(&pem, "-----BEGIN TEST-----", "-----END TEST-----").unwrap();
        assert_eq!(back, der);
    }

    #[test]
    fn encoding_parses_case_insensitively() {
        assert_eq!("hex".parse::<FieldValueEncoding>().unwrap(), FieldValueEncoding::Hex);
        assert_eq!("BASE64".parse::<FieldValueEncoding>().unwrap(), FieldValueEncoding::Base64);
        assert!("base32".parse::<FieldValueEncoding>().is_err());
    }
}

//! Record codec: values to opaque payloads and back
//!
//! A payload is a JSON string literal holding the base64 form of a bincode
//! envelope. The envelope carries a format version and the value's
//! classification next to the value itself, so a payload can be classified
//! without the caller supplying a type.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use regstore_core::{Classification, Error, Result, Value};
use serde::{Deserialize, Serialize};

/// Envelope layout version written by this codec
pub const FORMAT_VERSION: u16 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format: u16,
    classification: Classification,
    value: &'a Value,
}

#[derive(Deserialize)]
struct Envelope {
    format: u16,
    classification: Classification,
    value: Value,
}

/// Encode a value into a record payload
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let envelope = EnvelopeRef {
        format: FORMAT_VERSION,
        classification: value.classification(),
        value,
    };
    let raw = bincode::serialize(&envelope).map_err(|e| Error::encode(e.to_string()))?;
    let transport = STANDARD.encode(raw);
    serde_json::to_vec(&transport).map_err(|e| Error::encode(e.to_string()))
}

/// Decode a record payload back into its value
pub fn decode(bytes: &[u8]) -> Result<Value> {
    Ok(open_envelope(bytes)?.value)
}

/// Read the classification tag carried by a record payload
pub fn classify(bytes: &[u8]) -> Result<Classification> {
    Ok(open_envelope(bytes)?.classification)
}

fn open_envelope(bytes: &[u8]) -> Result<Envelope> {
    let transport: String = serde_json::from_slice(bytes)
        .map_err(|e| Error::decode(format!("payload is not a JSON string: {e}")))?;
    let raw = STANDARD
        .decode(transport.as_bytes())
        .map_err(|e| Error::decode(format!("payload is not base64: {e}")))?;

    match bincode::deserialize::<Envelope>(&raw) {
        Ok(envelope) if envelope.format == FORMAT_VERSION => Ok(envelope),
        Ok(envelope) => Err(unsupported_format(envelope.format)),
        // A different layout may not parse at all; report its version if the
        // header is readable
        Err(e) => match bincode::deserialize::<u16>(&raw) {
            Ok(format) if format != FORMAT_VERSION => Err(unsupported_format(format)),
            _ => Err(Error::decode(format!("corrupt envelope: {e}"))),
        },
    }
}

fn unsupported_format(format: u16) -> Error {
    Error::decode(format!(
        "unsupported record format {format} (expected {FORMAT_VERSION})"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_record() -> Value {
        Value::record(
            "app::User",
            [
                ("name", Value::from("Ada")),
                ("age", Value::Integer(36)),
                (
                    "langs",
                    Value::Array(vec![Value::from("en"), Value::from("fr")]),
                ),
            ],
        )
    }

    #[test]
    fn test_roundtrip_preserves_every_kind() {
        let mut nested = BTreeMap::new();
        nested.insert("inner".to_string(), Value::Array(vec![Value::Null]));

        let values = [
            Value::Null,
            Value::Bool(false),
            Value::Integer(i64::MIN),
            Value::Float(-0.25),
            Value::from(""),
            Value::Map(nested),
            sample_record(),
        ];

        for value in values {
            let bytes = encode(&value).unwrap();
            assert_eq!(decode(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_payload_is_a_quoted_transport_blob() {
        let bytes = encode(&Value::from("hello")).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with('"') && text.ends_with('"'));
        assert!(!text.contains("hello"));
    }

    #[test]
    fn test_classify_reads_carried_tag() {
        let bytes = encode(&sample_record()).unwrap();
        assert_eq!(classify(&bytes).unwrap().as_str(), "app::User");

        let bytes = encode(&Value::Integer(3)).unwrap();
        assert_eq!(classify(&bytes).unwrap().as_str(), "integer");
    }

    #[test]
    fn test_malformed_payloads_are_decode_errors() {
        for garbage in [
            &b""[..],
            b"not json",
            b"\"%%%not-base64%%%\"",
            b"\"AAAA\"",
            b"42",
        ] {
            let err = decode(garbage).unwrap_err();
            assert!(matches!(err, Error::Decode { .. }), "{garbage:?} -> {err}");
        }
    }

    #[test]
    fn test_unknown_format_version_is_rejected() {
        let raw = bincode::serialize(&(7u16, Classification::new("integer"), Value::Integer(1)))
            .unwrap();
        let payload = serde_json::to_vec(&STANDARD.encode(raw)).unwrap();

        let err = decode(&payload).unwrap_err();
        assert!(err.to_string().contains("unsupported record format 7"));
    }

    #[test]
    fn test_foreign_layout_reports_its_version() {
        let mut raw = bincode::serialize(&9u16).unwrap();
        raw.push(0xff);
        let payload = serde_json::to_vec(&STANDARD.encode(&raw)).unwrap();
        let err = decode(&payload).unwrap_err();
        assert!(err.to_string().contains("unsupported record format 9"), "{err}");

        let mut raw = bincode::serialize(&FORMAT_VERSION).unwrap();
        raw.push(0xff);
        let payload = serde_json::to_vec(&STANDARD.encode(&raw)).unwrap();
        let err = decode(&payload).unwrap_err();
        assert!(err.to_string().contains("corrupt envelope"), "{err}");
    }

    #[test]
    fn test_nan_survives_roundtrip() {
        let bytes = encode(&Value::Float(f64::NAN)).unwrap();
        match decode(&bytes).unwrap() {
            Value::Float(f) => assert!(f.is_nan()),
            other => panic!("unexpected value {other:?}"),
        }
    }
}

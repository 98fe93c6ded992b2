//! Mapping between envelopes and NATS headers plus payload.

use std::collections::HashMap;

use async_nats::HeaderMap;
use bytes::Bytes;

use regwatch_core::types::{Envelope, HEADER_CONTENT_TYPE, HEADER_FILENAME};

/// Split an envelope into NATS headers and payload.
pub fn envelope_to_parts(envelope: &Envelope) -> (HeaderMap, Bytes) {
    let mut headers = HeaderMap::new();
    for (name, value) in envelope.header_pairs() {
        headers.insert(name, value);
    }
    (headers, Bytes::from(envelope.body.clone()))
}

/// Rebuild an envelope from delivered NATS headers and payload.
///
/// Missing headers fall back to the envelope defaults. A payload that is not
/// UTF-8 is carried through lossily; the codec rejects it later.
pub fn envelope_from_parts(headers: Option<&HeaderMap>, payload: &[u8]) -> Envelope {
    let mut fields = HashMap::new();
    if let Some(headers) = headers {
        for name in [HEADER_FILENAME, HEADER_CONTENT_TYPE] {
            if let Some(value) = headers.get(name) {
                fields.insert(name.to_string(), value.as_str().to_string());
            }
        }
    }
    Envelope::from_headers(&fields, String::from_utf8_lossy(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regwatch_core::types::{Document, FALLBACK_FILENAME};

    #[test]
    fn test_parts_carry_headers_and_body() {
        let envelope = Envelope::encode(&Document::pdf("reg1.pdf", b"%PDF-1.4".to_vec()));
        let (headers, payload) = envelope_to_parts(&envelope);

        assert_eq!(headers.get("filename").unwrap().as_str(), "reg1.pdf");
        assert_eq!(
            headers.get("contentType").unwrap().as_str(),
            "application/pdf"
        );

        let rebuilt = envelope_from_parts(Some(&headers), &payload);
        assert_eq!(rebuilt, envelope);
        assert_eq!(rebuilt.decode_body().unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn test_missing_headers_fall_back() {
        let envelope = envelope_from_parts(None, b"JVBERi0=");
        assert_eq!(envelope.filename(), FALLBACK_FILENAME);
        assert_eq!(envelope.content_type(), "application/pdf");
        assert_eq!(envelope.body, "JVBERi0=");
    }

    #[test]
    fn test_non_utf8_payload_fails_decode() {
        let mut headers = HeaderMap::new();
        headers.insert("filename", "bad.pdf");

        let envelope = envelope_from_parts(Some(&headers), &[0xff, 0xfe, 0x41]);
        assert_eq!(envelope.filename(), "bad.pdf");
        assert!(envelope.decode_body().is_err());
    }
}
